use std::collections::HashSet;

use log::debug;

use super::types::{Graph, LinkType, NodeId};

/// A directed edge picked out for highlighting, consecrator or bishop first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChainEdge {
	pub source: NodeId,
	pub target: NodeId,
	pub link_type: LinkType,
}

/// Everything a lineage highlight paints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineageChain {
	/// Clicked node first, then its ancestors.
	pub nodes: Vec<NodeId>,
	pub consecration_edges: Vec<ChainEdge>,
	/// The ordaining edge when the clicked node is below bishop rank.
	pub ordination_edge: Option<ChainEdge>,
}

impl LineageChain {
	pub fn edges(&self) -> impl Iterator<Item = &ChainEdge> {
		self.ordination_edge.iter().chain(self.consecration_edges.iter())
	}
}

/// Source of the first link of `link_type` that targets `id`, in link order.
fn find_incoming(graph: &Graph, id: NodeId, link_type: LinkType) -> Option<NodeId> {
	graph
		.links
		.iter()
		.find(|l| l.link_type == link_type && graph.target_id(l) == id)
		.map(|l| graph.source_id(l))
}

/// The principal consecrator of `id`. With several candidates the first link wins.
pub fn find_consecrator(graph: &Graph, id: NodeId) -> Option<NodeId> {
	find_incoming(graph, id, LinkType::Consecration)
}

pub fn find_ordaining_bishop(graph: &Graph, id: NodeId) -> Option<NodeId> {
	find_incoming(graph, id, LinkType::Ordination)
}

/// Walk consecrator back-edges from `start`. A repeated node ends the walk.
pub fn traverse_consecration_chain(graph: &Graph, start: NodeId) -> Vec<NodeId> {
	let mut chain = Vec::new();
	let mut visited = HashSet::new();
	let mut current = Some(start);

	while let Some(id) = current {
		if !visited.insert(id) {
			debug!("consecration cycle at {id}, chain truncated");
			break;
		}
		chain.push(id);
		current = find_consecrator(graph, id);
	}
	chain
}

/// Consecrator to consecrated edges for each adjacent pair of `chain`.
fn consecration_edges(chain: &[NodeId]) -> Vec<ChainEdge> {
	chain
		.windows(2)
		.map(|pair| ChainEdge {
			source: pair[1],
			target: pair[0],
			link_type: LinkType::Consecration,
		})
		.collect()
}

/// Compute the lineage of `id`, or `None` when no such node is loaded.
pub fn trace_lineage(graph: &Graph, id: NodeId) -> Option<LineageChain> {
	let node = graph.node(id)?;

	if node.is_bishop_or_above() {
		let nodes = traverse_consecration_chain(graph, id);
		return Some(LineageChain {
			consecration_edges: consecration_edges(&nodes),
			nodes,
			ordination_edge: None,
		});
	}

	let mut chain = LineageChain {
		nodes: vec![id],
		..LineageChain::default()
	};
	if let Some(bishop) = find_ordaining_bishop(graph, id) {
		let ancestry = traverse_consecration_chain(graph, bishop);
		chain.ordination_edge = Some(ChainEdge {
			source: bishop,
			target: id,
			link_type: LinkType::Ordination,
		});
		chain.consecration_edges = consecration_edges(&ancestry);
		chain.nodes.extend(ancestry.into_iter().filter(|&n| n != id));
	}
	Some(chain)
}
