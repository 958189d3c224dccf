//! Graph data structures exchanged with the page and the storage service.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node. Unique within a graph and never reassigned.
pub type NodeId = String;

/// Id given to the synthetic root introduced by the hierarchy builder.
pub const VIRTUAL_ROOT_ID: &str = "virtual-root";

/// The kind of integration element a node stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
	/// An integration channel.
	Channel,
	/// A delivery destination.
	Destination,
	/// A message transformer.
	Transformer,
	/// Anything else, named by the payload.
	Custom,
	/// Synthetic entry point of a derived tree. Never part of a persisted graph.
	Root,
}

impl NodeKind {
	/// Kinds a user may create through the add-node operation.
	pub const USER_KINDS: [NodeKind; 4] = [
		NodeKind::Channel,
		NodeKind::Destination,
		NodeKind::Transformer,
		NodeKind::Custom,
	];

	/// Wire name of the kind.
	pub fn as_str(self) -> &'static str {
		match self {
			NodeKind::Channel => "Channel",
			NodeKind::Destination => "Destination",
			NodeKind::Transformer => "Transformer",
			NodeKind::Custom => "Custom",
			NodeKind::Root => "Root",
		}
	}

	/// Whether nodes of this kind carry a deployment status adornment.
	pub fn has_status(self) -> bool {
		self == NodeKind::Destination
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A node in the graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	/// Unique identifier for this node. Used to reference nodes in links.
	pub id: NodeId,
	/// Display name.
	pub name: String,
	/// What the node represents.
	#[serde(rename = "type")]
	pub kind: NodeKind,
}

impl Node {
	/// Node with the given id, name and kind.
	pub fn new(id: impl Into<NodeId>, name: impl Into<String>, kind: NodeKind) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			kind,
		}
	}

	/// The synthetic root placed above zero or several natural roots.
	pub fn virtual_root() -> Self {
		Self::new(VIRTUAL_ROOT_ID, "Root", NodeKind::Root)
	}
}

/// A directed edge between two nodes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
	/// Source node ID.
	pub source: NodeId,
	/// Target node ID.
	pub target: NodeId,
}

impl Link {
	/// Link from `source` to `target`.
	pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}
}

/// Classification of a link by the kinds of its endpoints, used to pick arrow colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
	/// From a channel to a destination.
	ChannelToDestination,
	/// From a destination to a transformer.
	DestinationToTransformer,
	/// Any other pairing.
	Other,
}

impl LinkKind {
	/// Classifies an edge by its endpoint kinds.
	pub fn between(source: NodeKind, target: NodeKind) -> Self {
		match (source, target) {
			(NodeKind::Channel, NodeKind::Destination) => LinkKind::ChannelToDestination,
			(NodeKind::Destination, NodeKind::Transformer) => LinkKind::DestinationToTransformer,
			_ => LinkKind::Other,
		}
	}
}

/// Complete persisted graph document: nodes, links and the view/annotation state
/// saved alongside them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
	/// Every node.
	#[serde(default)]
	pub nodes: Vec<Node>,
	/// Directed links between nodes.
	#[serde(default)]
	pub links: Vec<Link>,
	/// Ids folded in the collapsible tree.
	#[serde(default)]
	pub collapsed_nodes: Vec<NodeId>,
	/// Comments keyed by node id.
	#[serde(default)]
	pub comments: HashMap<NodeId, String>,
	/// Raw status codes; unknown codes are kept here but render as "no status".
	#[serde(default)]
	pub statuses: HashMap<NodeId, String>,
}

impl GraphDocument {
	/// Parses a document.
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Serialises the document.
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string_pretty(self)
	}
}

/// The visual style a graph is presented in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
	/// Layered tree whose subtrees can be folded away.
	#[default]
	CollapsibleTree,
	/// Full tree in a selectable orientation.
	HierarchicalTree,
	/// One force simulation over the whole graph.
	ForceDirected,
	/// Force simulation with extra centring so components stay together.
	DisjointForce,
}

impl LayoutMode {
	/// Every mode, in menu order.
	pub const ALL: [LayoutMode; 4] = [
		LayoutMode::CollapsibleTree,
		LayoutMode::HierarchicalTree,
		LayoutMode::ForceDirected,
		LayoutMode::DisjointForce,
	];

	/// Stable identifier, used as a storage key.
	pub fn as_str(self) -> &'static str {
		match self {
			LayoutMode::CollapsibleTree => "collapsible-tree",
			LayoutMode::HierarchicalTree => "hierarchical-tree",
			LayoutMode::ForceDirected => "force-directed",
			LayoutMode::DisjointForce => "disjoint-force",
		}
	}

	/// Menu label.
	pub fn label(self) -> &'static str {
		match self {
			LayoutMode::CollapsibleTree => "Collapsible Tree",
			LayoutMode::HierarchicalTree => "Hierarchical Tree",
			LayoutMode::ForceDirected => "Force Directed",
			LayoutMode::DisjointForce => "Disjoint Force",
		}
	}

	/// Whether the mode draws a tree.
	pub fn is_tree(self) -> bool {
		matches!(self, LayoutMode::CollapsibleTree | LayoutMode::HierarchicalTree)
	}

	/// Whether folding has a visible effect.
	pub fn supports_collapse(self) -> bool {
		self == LayoutMode::CollapsibleTree
	}

	/// Upper zoom bound. The collapsible tree keeps labels readable by stopping early.
	pub fn max_zoom(self) -> f64 {
		match self {
			LayoutMode::CollapsibleTree => 3.0,
			_ => 10.0,
		}
	}
}

/// The id-keyed comment and status maps, stored separately from the graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationDocument {
	/// Comments keyed by node id.
	#[serde(default)]
	pub comments: HashMap<NodeId, String>,
	/// Raw status codes keyed by node id.
	#[serde(default)]
	pub statuses: HashMap<NodeId, String>,
	/// Folded node ids.
	#[serde(default)]
	pub collapsed_nodes: Vec<NodeId>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_document_with_type_field() {
		let doc = GraphDocument::from_json(
			r#"{
				"nodes": [
					{"id": "C1", "name": "ADT", "type": "Channel"},
					{"id": "D1", "name": "Lab", "type": "Destination"}
				],
				"links": [{"source": "C1", "target": "D1"}],
				"collapsedNodes": ["C1"],
				"statuses": {"D1": "reception-2"}
			}"#,
		)
		.unwrap();

		assert_eq!(doc.nodes.len(), 2);
		assert_eq!(doc.nodes[1].kind, NodeKind::Destination);
		assert_eq!(doc.links[0], Link::new("C1", "D1"));
		assert_eq!(doc.collapsed_nodes, vec!["C1".to_string()]);
		assert!(doc.comments.is_empty());
		assert_eq!(doc.statuses["D1"], "reception-2");
	}

	#[test]
	fn missing_sections_default_to_empty() {
		let doc = GraphDocument::from_json("{}").unwrap();
		assert_eq!(doc, GraphDocument::default());
	}

	#[test]
	fn serializes_kind_as_type() {
		let json = serde_json::to_string(&Node::new("x", "X", NodeKind::Custom)).unwrap();
		assert!(json.contains(r#""type":"Custom""#));
	}

	#[test]
	fn classifies_links_by_endpoint_kinds() {
		assert_eq!(
			LinkKind::between(NodeKind::Channel, NodeKind::Destination),
			LinkKind::ChannelToDestination
		);
		assert_eq!(
			LinkKind::between(NodeKind::Destination, NodeKind::Transformer),
			LinkKind::DestinationToTransformer
		);
		assert_eq!(
			LinkKind::between(NodeKind::Channel, NodeKind::Transformer),
			LinkKind::Other
		);
	}
}
