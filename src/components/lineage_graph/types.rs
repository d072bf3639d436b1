use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical stroke for ordination edges.
pub const ORDINATION_COLOR: &str = "#1c1c1c";
/// Canonical stroke for consecration and co-consecration edges.
pub const CONSECRATION_COLOR: &str = "#27ae60";
/// Stroke used for nodes that carry no rank color of their own.
pub const DEFAULT_RANK_COLOR: &str = "#888888";

const BISHOP_RANKS: &[&str] = &["bishop", "archbishop", "cardinal", "pope", "patriarch"];

/// Identifier of a clergy record, as issued by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Relationship kind carried by a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkType {
	/// Ordaining bishop to ordinand.
	Ordination,
	/// Principal consecrator to consecrated bishop.
	Consecration,
	/// Assisting consecrator; hidden in backbone-only mode.
	CoConsecration,
}

impl LinkType {
	/// Sort precedence used to order parallel links.
	pub fn precedence(self) -> u8 {
		match self {
			LinkType::Ordination => 0,
			LinkType::Consecration => 1,
			LinkType::CoConsecration => 2,
		}
	}

	/// The canonical stroke color of the type's broad category.
	pub fn canonical_color(self) -> &'static str {
		match self {
			LinkType::Ordination => ORDINATION_COLOR,
			LinkType::Consecration | LinkType::CoConsecration => CONSECRATION_COLOR,
		}
	}

	/// The arrowhead marker matching the canonical color.
	pub fn canonical_marker(self) -> Marker {
		match self {
			LinkType::Ordination => Marker::ArrowBlack,
			LinkType::Consecration | LinkType::CoConsecration => Marker::ArrowGreen,
		}
	}
}

/// Arrowhead definitions available to rendered links.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Marker {
	/// Ordination arrowhead.
	ArrowBlack,
	/// Consecration arrowhead.
	ArrowGreen,
	/// Arrowhead drawn on highlighted lineage edges.
	ArrowHighlight,
}

impl Marker {
	/// Stable marker id, unique per view.
	pub fn id(self) -> &'static str {
		match self {
			Marker::ArrowBlack => "arrowhead-black",
			Marker::ArrowGreen => "arrowhead-green",
			Marker::ArrowHighlight => "arrowhead-highlight",
		}
	}
}

/// A clergy record exactly as it arrives over the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
	pub id: NodeId,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub rank: Option<String>,
	#[serde(default)]
	pub organization: Option<String>,
	#[serde(default)]
	pub ordination_date: Option<String>,
	#[serde(default)]
	pub consecration_date: Option<String>,
	#[serde(default)]
	pub rank_color: Option<String>,
	#[serde(default)]
	pub org_color: Option<String>,
}

/// A relationship record exactly as it arrives over the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawLink {
	#[serde(default)]
	pub source: Option<NodeId>,
	#[serde(default)]
	pub target: Option<NodeId>,
	#[serde(rename = "type")]
	pub link_type: LinkType,
	#[serde(default)]
	pub color: Option<String>,
}

/// A clergy member inside the live view.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: NodeId,
	pub name: String,
	pub rank: Option<String>,
	pub organization: Option<String>,
	pub ordination_date: Option<String>,
	pub consecration_date: Option<String>,
	pub rank_color: String,
	pub org_color: Option<String>,
	pub x: f64,
	pub y: f64,
	/// Pinned position while the node is being dragged.
	pub fx: Option<f64>,
	pub fy: Option<f64>,
	/// Written only by the filter engine.
	pub filtered: bool,
}

impl Node {
	pub fn from_raw(raw: &RawNode) -> Self {
		Self {
			id: raw.id,
			name: raw.name.clone().unwrap_or_default(),
			rank: raw.rank.clone(),
			organization: raw.organization.clone(),
			ordination_date: raw.ordination_date.clone(),
			consecration_date: raw.consecration_date.clone(),
			rank_color: raw
				.rank_color
				.clone()
				.unwrap_or_else(|| DEFAULT_RANK_COLOR.to_string()),
			org_color: raw.org_color.clone(),
			x: 0.0,
			y: 0.0,
			fx: None,
			fy: None,
			filtered: false,
		}
	}

	pub fn is_bishop_or_above(&self) -> bool {
		is_bishop_or_above(self.rank.as_deref(), self.consecration_date.as_deref())
	}
}

/// True for bishops and higher ranks, or anyone with a recorded consecration.
pub fn is_bishop_or_above(rank: Option<&str>, consecration_date: Option<&str>) -> bool {
	if consecration_date.is_some_and(|d| !d.is_empty()) {
		return true;
	}
	let Some(rank) = rank else {
		return false;
	};
	let rank = rank.to_lowercase();
	BISHOP_RANKS.iter().any(|r| rank.contains(r))
}

/// A relationship edge with both endpoints resolved to node slots.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	/// Index of the source node in `Graph::nodes`.
	pub source: usize,
	/// Index of the target node in `Graph::nodes`.
	pub target: usize,
	pub link_type: LinkType,
	pub color: String,
	pub parallel_offset: f64,
	/// Set by the rank criterion.
	pub rank_filtered: bool,
	/// Set by the backbone-only criterion.
	pub backbone_filtered: bool,
	/// Merge of every active criterion. Written only by the filter engine.
	pub filtered: bool,
}

impl Link {
	/// Arrowhead chosen by the link's color category.
	pub fn marker(&self) -> Marker {
		if self.color.eq_ignore_ascii_case(ORDINATION_COLOR) {
			Marker::ArrowBlack
		} else if self.color.eq_ignore_ascii_case(CONSECRATION_COLOR) {
			Marker::ArrowGreen
		} else {
			self.link_type.canonical_marker()
		}
	}
}

/// The in-memory lineage graph. Links always reference valid node slots.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
	pub nodes: Vec<Node>,
	pub links: Vec<Link>,
}

impl Graph {
	pub fn index_of(&self, id: NodeId) -> Option<usize> {
		self.nodes.iter().position(|n| n.id == id)
	}

	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.index_of(id).map(|i| &self.nodes[i])
	}

	pub fn source_id(&self, link: &Link) -> NodeId {
		self.nodes[link.source].id
	}

	pub fn target_id(&self, link: &Link) -> NodeId {
		self.nodes[link.target].id
	}

	/// Case-insensitive name search, in node order.
	pub fn search_nodes(&self, query: &str) -> Vec<NodeId> {
		let query = query.trim().to_lowercase();
		if query.is_empty() {
			return Vec::new();
		}
		self.nodes
			.iter()
			.filter(|n| n.name.to_lowercase().contains(&query))
			.map(|n| n.id)
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bishop_classification_uses_rank_substrings() {
		assert!(is_bishop_or_above(Some("Auxiliary Bishop"), None));
		assert!(is_bishop_or_above(Some("ARCHBISHOP"), None));
		assert!(is_bishop_or_above(Some("Cardinal"), None));
		assert!(is_bishop_or_above(Some("Pope"), None));
		assert!(is_bishop_or_above(Some("Patriarch"), None));
		assert!(!is_bishop_or_above(Some("Priest"), None));
		assert!(!is_bishop_or_above(None, None));
	}

	#[test]
	fn consecration_date_makes_a_bishop() {
		assert!(is_bishop_or_above(Some("Priest"), Some("1950-03-19")));
		assert!(is_bishop_or_above(Some("Priest"), Some("  ")));
		assert!(!is_bishop_or_above(Some("Priest"), Some("")));
	}

	#[test]
	fn link_type_reads_kebab_case() {
		let t: LinkType = serde_json::from_str("\"co-consecration\"").expect("decode");
		assert_eq!(t, LinkType::CoConsecration);
		assert_eq!(t.canonical_color(), CONSECRATION_COLOR);
		assert_eq!(LinkType::Ordination.canonical_marker(), Marker::ArrowBlack);
	}

	#[test]
	fn search_is_case_insensitive() {
		let mut graph = Graph::default();
		for (id, name) in [(1, "John Smith"), (2, "Mary Jones"), (3, "Johann Bach")] {
			graph.nodes.push(Node::from_raw(&RawNode {
				id: NodeId(id),
				name: Some(name.to_string()),
				rank: None,
				organization: None,
				ordination_date: None,
				consecration_date: None,
				rank_color: None,
				org_color: None,
			}));
		}
		assert_eq!(graph.search_nodes("joh"), vec![NodeId(1), NodeId(3)]);
		assert!(graph.search_nodes("   ").is_empty());
	}
}
