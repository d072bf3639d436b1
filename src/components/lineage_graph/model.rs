use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{GraphError, GraphResult};
use super::types::{Graph, Link, Node, NodeId, RawLink, RawNode};

const SEED_RADIUS: f64 = 100.0;

/// Decode the top-level `nodes` and `links` values of a lineage payload.
pub fn parse_payload(nodes: &Value, links: &Value) -> GraphResult<(Vec<RawNode>, Vec<RawLink>)> {
	Ok((decode_array(nodes, "nodes")?, decode_array(links, "links")?))
}

/// Only a non-array is fatal. Records that fail to decode are skipped one by one.
fn decode_array<T: DeserializeOwned>(value: &Value, field: &'static str) -> GraphResult<Vec<T>> {
	let Some(items) = value.as_array() else {
		return Err(GraphError::MalformedPayload {
			field,
			reason: "expected an array".to_string(),
		});
	};
	let mut decoded = Vec::with_capacity(items.len());
	for (i, item) in items.iter().enumerate() {
		match serde_json::from_value::<T>(item.clone()) {
			Ok(record) => decoded.push(record),
			Err(e) => warn!("skipping {field}[{i}]: {e}"),
		}
	}
	Ok(decoded)
}

/// Copy the raw records into a graph whose links point at node slots.
///
/// Links with an endpoint that names no node are dropped with a warning.
/// Nodes are seeded on a ring around the origin so the simulation has
/// distinct starting positions.
pub fn build_graph(raw_nodes: &[RawNode], raw_links: &[RawLink]) -> Graph {
	let mut graph = Graph::default();
	let mut id_to_idx: HashMap<NodeId, usize> = HashMap::new();

	let count = raw_nodes.len().max(1) as f64;
	for raw in raw_nodes {
		if id_to_idx.contains_key(&raw.id) {
			warn!("duplicate clergy id {}, keeping the first record", raw.id);
			continue;
		}
		let mut node = Node::from_raw(raw);
		let angle = (graph.nodes.len() as f64) * 2.0 * PI / count;
		node.x = SEED_RADIUS * angle.cos();
		node.y = SEED_RADIUS * angle.sin();
		id_to_idx.insert(raw.id, graph.nodes.len());
		graph.nodes.push(node);
	}

	for raw in raw_links {
		let endpoint = |id: Option<NodeId>| id.and_then(|id| id_to_idx.get(&id).copied());
		let (Some(source), Some(target)) = (endpoint(raw.source), endpoint(raw.target)) else {
			warn!(
				"dropping {:?} link {:?} -> {:?}: endpoint not found",
				raw.link_type, raw.source, raw.target
			);
			continue;
		};
		graph.links.push(Link {
			source,
			target,
			link_type: raw.link_type,
			color: raw
				.color
				.clone()
				.unwrap_or_else(|| raw.link_type.canonical_color().to_string()),
			parallel_offset: 0.0,
			rank_filtered: false,
			backbone_filtered: false,
			filtered: false,
		});
	}

	debug!(
		"built lineage graph: {} nodes, {} links",
		graph.nodes.len(),
		graph.links.len()
	);
	graph
}

/// Spread links that share an endpoint pair so they do not draw on top of each other.
pub fn assign_parallel_offsets(graph: &mut Graph, spacing: f64) {
	let mut groups: BTreeMap<(NodeId, NodeId), Vec<usize>> = BTreeMap::new();
	for (i, link) in graph.links.iter().enumerate() {
		let (a, b) = (graph.nodes[link.source].id, graph.nodes[link.target].id);
		groups.entry((a.min(b), a.max(b))).or_default().push(i);
	}

	for mut members in groups.into_values() {
		if members.len() == 1 {
			graph.links[members[0]].parallel_offset = 0.0;
			continue;
		}
		members.sort_by_key(|&i| graph.links[i].link_type.precedence());
		let half = (members.len() - 1) as f64 * spacing / 2.0;
		for (pos, i) in members.into_iter().enumerate() {
			graph.links[i].parallel_offset = pos as f64 * spacing - half;
		}
	}
}

/// Decode, resolve and space a payload in one step.
pub fn load_graph(nodes: &Value, links: &Value, spacing: f64) -> GraphResult<Graph> {
	let (raw_nodes, raw_links) = parse_payload(nodes, links)?;
	let mut graph = build_graph(&raw_nodes, &raw_links);
	assign_parallel_offsets(&mut graph, spacing);
	Ok(graph)
}
