//! The canonical node/link store.
//!
//! `GraphModel` owns the flat graph and keeps it referentially sound: every link
//! it holds resolves to two existing nodes. Data loaded from outside is repaired
//! (dangling links and duplicate ids are dropped with a warning); user mutations
//! are validated up front and rejected with a [`GraphError`] without side effects.

use std::collections::HashMap;

use log::warn;

use super::error::GraphError;
use super::types::{GraphDocument, Link, Node, NodeId, NodeKind, VIRTUAL_ROOT_ID};

/// The authoritative node and link lists with an id index.
///
/// Mutations validate their input and leave the model untouched on error.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	nodes: Vec<Node>,
	links: Vec<Link>,
	index: HashMap<NodeId, usize>,
	/// Counter mixed into generated ids.
	serial: u64,
}

impl GraphModel {
	/// An empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a model from untrusted parts, dropping anything that would break
	/// referential integrity.
	pub fn from_parts(nodes: Vec<Node>, links: Vec<Link>) -> Self {
		let mut model = Self::new();
		for node in nodes {
			if let Err(e) = model.insert_node(node) {
				warn!("channel-graph: dropping node: {}", e);
			}
		}
		for link in links {
			if !model.contains(&link.source) || !model.contains(&link.target) {
				warn!(
					"channel-graph: link references missing node: {} -> {}",
					link.source, link.target
				);
				continue;
			}
			model.links.push(link);
		}
		model
	}

	/// Builds a model from `doc`, dropping links whose endpoints are missing.
	pub fn from_document(doc: &GraphDocument) -> Self {
		Self::from_parts(doc.nodes.clone(), doc.links.clone())
	}

	/// The graph portion of a persisted document. View and annotation state are
	/// filled in by the coordinator.
	pub fn to_document(&self) -> GraphDocument {
		GraphDocument {
			nodes: self.nodes.clone(),
			links: self.links.clone(),
			..Default::default()
		}
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Links in insertion order.
	pub fn links(&self) -> &[Link] {
		&self.links
	}

	/// The node with `id`.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	/// Whether a node with `id` exists.
	pub fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	/// Whether the graph has no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Whether `source -> target` is already linked.
	pub fn has_link(&self, source: &str, target: &str) -> bool {
		self.links
			.iter()
			.any(|l| l.source == source && l.target == target)
	}

	/// Inserts a fully formed node.
	pub fn insert_node(&mut self, node: Node) -> Result<(), GraphError> {
		if node.kind == NodeKind::Root || node.id == VIRTUAL_ROOT_ID {
			return Err(GraphError::ReservedId(node.id));
		}
		if node.name.trim().is_empty() {
			return Err(GraphError::EmptyName);
		}
		if self.contains(&node.id) {
			return Err(GraphError::DuplicateNode(node.id));
		}
		self.index.insert(node.id.clone(), self.nodes.len());
		self.nodes.push(node);
		Ok(())
	}

	/// Creates a node with a generated id and optionally links it under `parent`.
	///
	/// Ids take the form `{Kind}-{name}-{serial}`; the serial is bumped past any
	/// id already in use.
	pub fn add_node(
		&mut self,
		kind: NodeKind,
		name: &str,
		parent: Option<&str>,
	) -> Result<NodeId, GraphError> {
		let name = name.trim();
		if name.is_empty() {
			return Err(GraphError::EmptyName);
		}
		if kind == NodeKind::Root {
			return Err(GraphError::ReservedId(VIRTUAL_ROOT_ID.to_string()));
		}
		if let Some(parent) = parent {
			if !self.contains(parent) {
				return Err(GraphError::UnknownNode(parent.to_string()));
			}
		}

		let id = loop {
			let candidate = format!("{}-{}-{}", kind, name, self.serial);
			self.serial += 1;
			if !self.contains(&candidate) {
				break candidate;
			}
		};

		self.insert_node(Node::new(id.clone(), name, kind))?;
		if let Some(parent) = parent {
			self.links.push(Link::new(parent, id.clone()));
		}
		Ok(id)
	}

	/// Adds the link `source -> target`, the manual "connect two nodes" operation.
	pub fn connect(&mut self, source: &str, target: &str) -> Result<(), GraphError> {
		if source == target {
			return Err(GraphError::SelfLink(source.to_string()));
		}
		for id in [source, target] {
			if !self.contains(id) {
				return Err(GraphError::UnknownNode(id.to_string()));
			}
		}
		if self.has_link(source, target) {
			return Err(GraphError::DuplicateLink {
				from: source.to_string(),
				to: target.to_string(),
			});
		}
		self.links.push(Link::new(source, target));
		Ok(())
	}

	/// Removes every node and link. The id counter keeps counting.
	pub fn clear(&mut self) {
		self.nodes.clear();
		self.links.clear();
		self.index.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> GraphModel {
		GraphModel::from_parts(
			vec![
				Node::new("C1", "ADT", NodeKind::Channel),
				Node::new("D1", "Lab", NodeKind::Destination),
			],
			vec![Link::new("C1", "D1")],
		)
	}

	#[test]
	fn drops_dangling_links_and_duplicate_nodes() {
		let model = GraphModel::from_parts(
			vec![
				Node::new("a", "A", NodeKind::Channel),
				Node::new("a", "A again", NodeKind::Custom),
				Node::new("virtual-root", "Root", NodeKind::Root),
			],
			vec![Link::new("a", "ghost"), Link::new("ghost", "a")],
		);

		assert_eq!(model.nodes().len(), 1);
		assert_eq!(model.node("a").unwrap().name, "A");
		assert!(model.links().is_empty());
	}

	#[test]
	fn add_node_generates_unique_ids_and_links_parent() {
		let mut model = sample();
		let first = model.add_node(NodeKind::Transformer, "  Map  ", Some("D1")).unwrap();
		let second = model.add_node(NodeKind::Transformer, "Map", Some("D1")).unwrap();

		assert_ne!(first, second);
		assert!(first.starts_with("Transformer-Map-"));
		assert_eq!(model.node(&first).unwrap().name, "Map");
		assert!(model.has_link("D1", &first));
		assert!(model.has_link("D1", &second));
	}

	#[test]
	fn add_node_rejects_bad_input_without_mutating() {
		let mut model = sample();

		assert_eq!(
			model.add_node(NodeKind::Custom, "   ", None),
			Err(GraphError::EmptyName)
		);
		assert_eq!(
			model.add_node(NodeKind::Custom, "X", Some("nope")),
			Err(GraphError::UnknownNode("nope".into()))
		);
		assert!(matches!(
			model.add_node(NodeKind::Root, "X", None),
			Err(GraphError::ReservedId(_))
		));
		assert_eq!(model.nodes().len(), 2);
		assert_eq!(model.links().len(), 1);
	}

	#[test]
	fn connect_rejects_self_duplicate_and_unknown() {
		let mut model = sample();

		assert_eq!(model.connect("C1", "C1"), Err(GraphError::SelfLink("C1".into())));
		assert_eq!(
			model.connect("C1", "D1"),
			Err(GraphError::DuplicateLink {
				from: "C1".into(),
				to: "D1".into()
			})
		);
		assert_eq!(
			model.connect("C1", "zz"),
			Err(GraphError::UnknownNode("zz".into()))
		);

		model.connect("D1", "C1").unwrap();
		assert_eq!(model.links().len(), 2);
	}
}
