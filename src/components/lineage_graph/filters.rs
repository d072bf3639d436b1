use log::debug;

use super::types::{Graph, LinkType};

/// Independent visibility toggles driven by the page controls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
	pub hide_priests: bool,
	pub backbone_only: bool,
}

/// Counts from the last recompute, for logging and the status line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterSummary {
	pub hidden_nodes: usize,
	pub hidden_links: usize,
}

/// Owns the merged `filtered` flag on every node and link.
#[derive(Clone, Debug)]
pub struct FilterEngine {
	pub criteria: FilterCriteria,
	hidden_ranks: Vec<String>,
}

impl FilterEngine {
	pub fn new(hidden_ranks: &[String]) -> Self {
		Self {
			criteria: FilterCriteria::default(),
			hidden_ranks: hidden_ranks.iter().map(|r| r.trim().to_lowercase()).collect(),
		}
	}

	/// Exact, case-insensitive rank match. A missing rank never matches.
	pub fn is_hidden_rank(&self, rank: Option<&str>) -> bool {
		let Some(rank) = rank else {
			return false;
		};
		let rank = rank.trim().to_lowercase();
		self.hidden_ranks.iter().any(|r| *r == rank)
	}

	/// Rewrite every node and link flag from the current criteria.
	pub fn recompute(&self, graph: &mut Graph) -> FilterSummary {
		let hide_rank = self.criteria.hide_priests;
		let mut summary = FilterSummary::default();

		let rank_hidden: Vec<bool> = graph
			.nodes
			.iter()
			.map(|n| self.is_hidden_rank(n.rank.as_deref()))
			.collect();

		for (node, &matches) in graph.nodes.iter_mut().zip(&rank_hidden) {
			node.filtered = hide_rank && matches;
			summary.hidden_nodes += node.filtered as usize;
		}

		for link in graph.links.iter_mut() {
			link.rank_filtered = hide_rank
				&& link.link_type == LinkType::Ordination
				&& (rank_hidden[link.source] || rank_hidden[link.target]);
			link.backbone_filtered =
				self.criteria.backbone_only && link.link_type == LinkType::CoConsecration;
			link.filtered = link.rank_filtered || link.backbone_filtered;
			summary.hidden_links += link.filtered as usize;
		}

		debug!(
			"filters {:?}: {} nodes and {} links hidden",
			self.criteria, summary.hidden_nodes, summary.hidden_links
		);
		summary
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::lineage_graph::model::load_graph;

	fn sample() -> Graph {
		load_graph(
			&json!([
				{ "id": 1, "rank": "Bishop" },
				{ "id": 2, "rank": "Archbishop" },
				{ "id": 3, "rank": "priest" },
				{ "id": 4 }
			]),
			&json!([
				{ "source": 1, "target": 2, "type": "consecration" },
				{ "source": 2, "target": 1, "type": "co-consecration" },
				{ "source": 2, "target": 3, "type": "ordination" },
				{ "source": 1, "target": 4, "type": "ordination" }
			]),
			8.0,
		)
		.expect("valid payload")
	}

	fn engine() -> FilterEngine {
		FilterEngine::new(&["Priest".to_string()])
	}

	#[test]
	fn hide_priests_hides_priest_and_its_ordination() {
		let mut graph = sample();
		let mut filters = engine();
		filters.criteria.hide_priests = true;
		let summary = filters.recompute(&mut graph);

		let hidden: Vec<bool> = graph.nodes.iter().map(|n| n.filtered).collect();
		assert_eq!(hidden, vec![false, false, true, false]);
		let hidden: Vec<bool> = graph.links.iter().map(|l| l.filtered).collect();
		assert_eq!(hidden, vec![false, false, true, false]);
		assert_eq!(summary, FilterSummary { hidden_nodes: 1, hidden_links: 1 });
	}

	#[test]
	fn node_without_rank_stays_visible() {
		let mut graph = sample();
		let mut filters = engine();
		filters.criteria.hide_priests = true;
		filters.recompute(&mut graph);
		assert!(!graph.nodes[3].filtered);
		assert!(!graph.links[3].filtered);
	}

	#[test]
	fn backbone_only_hides_co_consecrations() {
		let mut graph = sample();
		let mut filters = engine();
		filters.criteria.backbone_only = true;
		filters.recompute(&mut graph);
		assert!(graph.links[1].backbone_filtered);
		assert!(graph.links[1].filtered);
		assert!(!graph.links[0].filtered);
		assert!(graph.nodes.iter().all(|n| !n.filtered));
	}

	#[test]
	fn criteria_merge_with_or() {
		let mut graph = sample();
		let mut filters = engine();
		filters.criteria = FilterCriteria {
			hide_priests: true,
			backbone_only: true,
		};
		filters.recompute(&mut graph);
		let hidden: Vec<bool> = graph.links.iter().map(|l| l.filtered).collect();
		assert_eq!(hidden, vec![false, true, true, false]);
	}

	#[test]
	fn recompute_is_idempotent() {
		let mut graph = sample();
		let mut filters = engine();
		filters.criteria.hide_priests = true;
		filters.recompute(&mut graph);
		let once = graph.clone();
		filters.recompute(&mut graph);
		assert_eq!(graph, once);
	}

	#[test]
	fn hide_priests_toggle_restores_flags() {
		let mut graph = sample();
		let mut filters = engine();
		filters.criteria.backbone_only = true;
		filters.recompute(&mut graph);
		let before = graph.clone();

		filters.criteria.hide_priests = true;
		filters.recompute(&mut graph);
		assert_ne!(graph, before);

		filters.criteria.hide_priests = false;
		filters.recompute(&mut graph);
		assert_eq!(graph, before);
	}

	#[test]
	fn empty_graph_is_fine() {
		let mut graph = Graph::default();
		let summary = engine().recompute(&mut graph);
		assert_eq!(summary, FilterSummary::default());
	}
}
