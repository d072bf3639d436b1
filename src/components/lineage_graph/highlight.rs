use std::collections::{HashMap, HashSet};

use log::debug;

use super::lineage::{LineageChain, trace_lineage};
use super::types::{CONSECRATION_COLOR, Graph, LinkType, Marker, NodeId, ORDINATION_COLOR};

pub const HIGHLIGHT_COLOR: &str = "#f1c40f";
pub const NODE_STROKE_WIDTH: f64 = 2.0;
pub const LINK_STROKE_WIDTH: f64 = 1.5;
const HIGHLIGHT_NODE_STROKE_WIDTH: f64 = 4.0;
const HIGHLIGHT_LINK_STROKE_WIDTH: f64 = 3.5;

#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	pub stroke: String,
	pub stroke_width: f64,
	pub glow: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkStyle {
	pub stroke: String,
	pub stroke_width: f64,
	pub marker: Marker,
	pub glow: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerDef {
	pub marker: Marker,
	pub color: &'static str,
}

/// Arrowhead definitions shared by every rendered link. Ids are unique.
#[derive(Clone, Debug)]
pub struct MarkerRegistry {
	defs: Vec<MarkerDef>,
}

impl Default for MarkerRegistry {
	fn default() -> Self {
		Self {
			defs: vec![
				MarkerDef {
					marker: Marker::ArrowBlack,
					color: ORDINATION_COLOR,
				},
				MarkerDef {
					marker: Marker::ArrowGreen,
					color: CONSECRATION_COLOR,
				},
			],
		}
	}
}

impl MarkerRegistry {
	/// Define the highlight arrowhead unless it already exists.
	pub fn ensure_highlight(&mut self) -> bool {
		if self.get(Marker::ArrowHighlight).is_some() {
			return false;
		}
		self.defs.push(MarkerDef {
			marker: Marker::ArrowHighlight,
			color: HIGHLIGHT_COLOR,
		});
		debug!("defined marker {}", Marker::ArrowHighlight.id());
		true
	}

	pub fn get(&self, marker: Marker) -> Option<&MarkerDef> {
		self.defs.iter().find(|d| d.marker == marker)
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.defs.len()
	}
}

/// Presentation overlay for lineage highlights.
///
/// Holds one style handle per rendered node and link, addressed through id
/// maps rather than by scanning. Never touches filter flags, so a hidden
/// element stays hidden while highlighted and reappears with its highlight
/// once unfiltered.
#[derive(Clone, Debug, Default)]
pub struct HighlightRenderer {
	node_styles: Vec<NodeStyle>,
	node_rank_colors: Vec<String>,
	node_slots: HashMap<NodeId, usize>,
	link_styles: Vec<LinkStyle>,
	link_types: Vec<LinkType>,
	link_markers: Vec<Marker>,
	link_slots: HashMap<(NodeId, NodeId, LinkType), Vec<usize>>,
	saved_markers: HashMap<usize, Marker>,
	highlighted_nodes: HashSet<NodeId>,
	highlighted_links: HashSet<usize>,
	pub markers: MarkerRegistry,
}

impl HighlightRenderer {
	/// Create one handle per node and link of a freshly loaded graph.
	pub fn new(graph: &Graph) -> Self {
		let mut renderer = Self::default();
		for (slot, node) in graph.nodes.iter().enumerate() {
			renderer.node_slots.insert(node.id, slot);
			renderer.node_rank_colors.push(node.rank_color.clone());
			renderer.node_styles.push(NodeStyle {
				stroke: node.rank_color.clone(),
				stroke_width: NODE_STROKE_WIDTH,
				glow: false,
			});
		}
		for (slot, link) in graph.links.iter().enumerate() {
			let key = (graph.source_id(link), graph.target_id(link), link.link_type);
			renderer.link_slots.entry(key).or_default().push(slot);
			renderer.link_types.push(link.link_type);
			renderer.link_markers.push(link.marker());
			renderer.link_styles.push(LinkStyle {
				stroke: link.link_type.canonical_color().to_string(),
				stroke_width: LINK_STROKE_WIDTH,
				marker: link.marker(),
				glow: false,
			});
		}
		renderer
	}

	pub fn node_style(&self, slot: usize) -> Option<&NodeStyle> {
		self.node_styles.get(slot)
	}

	pub fn link_style(&self, slot: usize) -> Option<&LinkStyle> {
		self.link_styles.get(slot)
	}

	pub fn is_node_highlighted(&self, id: NodeId) -> bool {
		self.highlighted_nodes.contains(&id)
	}

	pub fn highlighted_node_count(&self) -> usize {
		self.highlighted_nodes.len()
	}

	pub fn highlighted_link_slots(&self) -> impl Iterator<Item = usize> + '_ {
		self.highlighted_links.iter().copied()
	}

	pub fn has_highlight(&self) -> bool {
		!self.highlighted_nodes.is_empty() || !self.highlighted_links.is_empty()
	}

	/// Return every handle to its canonical look.
	pub fn clear_highlight(&mut self) {
		for (style, rank_color) in self.node_styles.iter_mut().zip(&self.node_rank_colors) {
			style.stroke.clone_from(rank_color);
			style.stroke_width = NODE_STROKE_WIDTH;
			style.glow = false;
		}
		let links = self.link_styles.iter_mut().zip(&self.link_types).zip(&self.link_markers);
		for (slot, ((style, link_type), &marker)) in links.enumerate() {
			style.marker = self.saved_markers.get(&slot).copied().unwrap_or(marker);
			style.stroke = link_type.canonical_color().to_string();
			style.stroke_width = LINK_STROKE_WIDTH;
			style.glow = false;
		}
		self.saved_markers.clear();
		self.highlighted_nodes.clear();
		self.highlighted_links.clear();
	}

	pub fn highlight_node(&mut self, id: NodeId) -> bool {
		let Some(&slot) = self.node_slots.get(&id) else {
			return false;
		};
		let style = &mut self.node_styles[slot];
		style.stroke = HIGHLIGHT_COLOR.to_string();
		style.stroke_width = HIGHLIGHT_NODE_STROKE_WIDTH;
		style.glow = true;
		self.highlighted_nodes.insert(id);
		true
	}

	/// Highlight every link matching the triple. Returns how many matched.
	pub fn highlight_link(&mut self, source: NodeId, target: NodeId, link_type: LinkType) -> usize {
		let Some(slots) = self.link_slots.get(&(source, target, link_type)) else {
			return 0;
		};
		self.markers.ensure_highlight();
		for &slot in slots {
			let style = &mut self.link_styles[slot];
			self.saved_markers.entry(slot).or_insert(style.marker);
			style.marker = Marker::ArrowHighlight;
			style.stroke = HIGHLIGHT_COLOR.to_string();
			style.stroke_width = HIGHLIGHT_LINK_STROKE_WIDTH;
			style.glow = true;
			self.highlighted_links.insert(slot);
		}
		slots.len()
	}
}

/// Clear the current overlay and paint the lineage of `id`.
///
/// The overlay is cleared even when `id` names no node.
pub fn highlight_lineage_chain(
	renderer: &mut HighlightRenderer,
	graph: &Graph,
	id: NodeId,
) -> Option<LineageChain> {
	renderer.clear_highlight();
	let chain = trace_lineage(graph, id)?;
	for &node in &chain.nodes {
		renderer.highlight_node(node);
	}
	for edge in chain.edges() {
		renderer.highlight_link(edge.source, edge.target, edge.link_type);
	}
	Some(chain)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::lineage_graph::model::load_graph;

	fn scenario() -> Graph {
		load_graph(
			&json!([
				{ "id": 1, "rank": "Bishop", "rank_color": "#800080" },
				{ "id": 2, "rank": "Bishop", "rank_color": "#800080" },
				{ "id": 3, "rank": "Bishop", "rank_color": "#800080" },
				{ "id": 4, "rank": "Priest", "rank_color": "#4169e1" }
			]),
			&json!([
				{ "source": 1, "target": 2, "type": "consecration" },
				{ "source": 2, "target": 3, "type": "consecration" },
				{ "source": 2, "target": 3, "type": "co-consecration" },
				{ "source": 3, "target": 4, "type": "ordination" }
			]),
			8.0,
		)
		.expect("valid payload")
	}

	fn snapshot(r: &HighlightRenderer) -> (Vec<NodeStyle>, Vec<LinkStyle>) {
		(r.node_styles.clone(), r.link_styles.clone())
	}

	#[test]
	fn priest_lineage_highlights_four_nodes_three_edges() {
		let graph = scenario();
		let mut renderer = HighlightRenderer::new(&graph);
		highlight_lineage_chain(&mut renderer, &graph, NodeId(4)).expect("known node");

		assert_eq!(renderer.highlighted_node_count(), 4);
		let mut links: Vec<usize> = renderer.highlighted_link_slots().collect();
		links.sort();
		assert_eq!(links, vec![0, 1, 3]);
		assert_eq!(renderer.link_style(2).map(|s| s.glow), Some(false));
		assert_eq!(
			renderer.link_style(3).map(|s| s.marker),
			Some(Marker::ArrowHighlight)
		);
	}

	#[test]
	fn clear_is_idempotent() {
		let graph = scenario();
		let mut renderer = HighlightRenderer::new(&graph);
		let pristine = snapshot(&renderer);
		highlight_lineage_chain(&mut renderer, &graph, NodeId(4));

		renderer.clear_highlight();
		let once = snapshot(&renderer);
		renderer.clear_highlight();
		assert_eq!(snapshot(&renderer), once);
		assert_eq!(once, pristine);
		assert!(!renderer.has_highlight());
	}

	#[test]
	fn double_highlight_restores_original_marker() {
		let graph = load_graph(
			&json!([{ "id": 1 }, { "id": 2 }]),
			&json!([{ "source": 1, "target": 2, "type": "consecration", "color": "#1c1c1c" }]),
			8.0,
		)
		.expect("valid payload");
		let mut renderer = HighlightRenderer::new(&graph);
		assert_eq!(renderer.link_style(0).map(|s| s.marker), Some(Marker::ArrowBlack));

		renderer.highlight_link(NodeId(1), NodeId(2), LinkType::Consecration);
		renderer.highlight_link(NodeId(1), NodeId(2), LinkType::Consecration);
		renderer.clear_highlight();

		assert_eq!(renderer.link_style(0).map(|s| s.marker), Some(Marker::ArrowBlack));
	}

	#[test]
	fn highlight_marker_is_created_once() {
		let graph = scenario();
		let mut renderer = HighlightRenderer::new(&graph);
		assert_eq!(renderer.markers.len(), 2);
		highlight_lineage_chain(&mut renderer, &graph, NodeId(4));
		highlight_lineage_chain(&mut renderer, &graph, NodeId(3));
		assert_eq!(renderer.markers.len(), 3);
		assert!(!renderer.markers.ensure_highlight());
	}

	#[test]
	fn new_highlight_replaces_previous() {
		let graph = scenario();
		let mut renderer = HighlightRenderer::new(&graph);
		highlight_lineage_chain(&mut renderer, &graph, NodeId(4));
		highlight_lineage_chain(&mut renderer, &graph, NodeId(2));
		assert!(!renderer.is_node_highlighted(NodeId(4)));
		assert!(renderer.is_node_highlighted(NodeId(1)));
		assert_eq!(renderer.highlighted_link_slots().collect::<Vec<_>>(), vec![0]);
	}

	#[test]
	fn unknown_node_clears_previous_highlight() {
		let graph = scenario();
		let mut renderer = HighlightRenderer::new(&graph);
		let pristine = snapshot(&renderer);
		highlight_lineage_chain(&mut renderer, &graph, NodeId(4));
		assert!(highlight_lineage_chain(&mut renderer, &graph, NodeId(77)).is_none());
		assert!(!renderer.has_highlight());
		assert_eq!(snapshot(&renderer), pristine);
	}

	#[test]
	fn highlighting_leaves_filter_flags_alone() {
		let mut graph = scenario();
		graph.nodes[3].filtered = true;
		graph.links[3].filtered = true;
		let before = graph.clone();
		let mut renderer = HighlightRenderer::new(&graph);
		highlight_lineage_chain(&mut renderer, &graph, NodeId(4));
		assert_eq!(graph, before);
		assert!(renderer.is_node_highlighted(NodeId(4)));
	}
}
