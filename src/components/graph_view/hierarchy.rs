//! Flat graph to rooted tree conversion.
//!
//! Links are read as parent -> child edges. A node is a root candidate when no
//! link targets it. One candidate becomes the tree root directly; zero or several
//! candidates are gathered under a synthetic [`Node::virtual_root`].
//!
//! A node reachable through several parents appears once under each of them,
//! but only its first occurrence carries its subtree; later ones are leaves.
//! Cycles are cut where a node would become its own descendant. The derived
//! tree therefore has at most one entry per node plus one per link.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use super::types::{Link, Node, NodeId};

/// A read-only tree view over the graph, rebuilt wholesale on every change.
#[derive(Clone, Debug, PartialEq)]
pub struct HierarchyNode {
	/// The graph node this tree entry stands for.
	pub node: Node,
	/// Children in link order.
	pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
	/// A tree entry without children.
	pub fn leaf(node: Node) -> Self {
		Self {
			node,
			children: Vec::new(),
		}
	}

	/// Id of the underlying node.
	pub fn id(&self) -> &str {
		&self.node.id
	}

	/// All nodes in pre-order, root first.
	pub fn descendants(&self) -> Vec<&HierarchyNode> {
		let mut out = Vec::new();
		let mut stack = vec![self];
		while let Some(n) = stack.pop() {
			out.push(n);
			stack.extend(n.children.iter().rev());
		}
		out
	}

	/// First entry with `id`, in pre-order.
	pub fn find(&self, id: &str) -> Option<&HierarchyNode> {
		self.descendants().into_iter().find(|n| n.id() == id)
	}

	/// Ids of every node with at least one child, in pre-order without repeats.
	pub fn collapsible_ids(&self) -> Vec<NodeId> {
		let mut seen = HashSet::new();
		self.descendants()
			.into_iter()
			.filter(|n| !n.children.is_empty())
			.filter(|n| seen.insert(n.id()))
			.map(|n| n.node.id.clone())
			.collect()
	}
}

/// Builds the display tree for `nodes`/`links`. Returns `None` for an empty graph.
///
/// Links whose endpoints do not resolve are skipped with a warning.
pub fn build_hierarchy(nodes: &[Node], links: &[Link]) -> Option<HierarchyNode> {
	if nodes.is_empty() {
		return None;
	}

	let by_id: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
	let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
	let mut has_parent: HashSet<&str> = HashSet::new();

	for link in links {
		let (Some(&source), Some(&target)) = (
			by_id.get(link.source.as_str()),
			by_id.get(link.target.as_str()),
		) else {
			warn!(
				"channel-graph: link references missing node: {} -> {}",
				link.source, link.target
			);
			continue;
		};
		children
			.entry(source.id.as_str())
			.or_default()
			.push(target.id.as_str());
		has_parent.insert(target.id.as_str());
	}

	let roots: Vec<&Node> = nodes
		.iter()
		.filter(|n| !has_parent.contains(n.id.as_str()))
		.collect();

	let builder = Builder {
		by_id,
		children,
		expanded: RefCell::new(HashSet::new()),
	};
	let mut path = Vec::new();

	if let [single] = roots.as_slice() {
		return Some(builder.expand(single, &mut path));
	}

	let tops: Vec<&Node> = if roots.is_empty() {
		debug!(
			"channel-graph: no root candidates, placing all {} nodes under virtual root",
			nodes.len()
		);
		nodes.iter().collect()
	} else {
		debug!(
			"channel-graph: {} root candidates, adding virtual root",
			roots.len()
		);
		roots
	};
	Some(HierarchyNode {
		node: Node::virtual_root(),
		children: tops
			.into_iter()
			.map(|n| builder.expand(n, &mut path))
			.collect(),
	})
}

struct Builder<'a> {
	by_id: HashMap<&'a str, &'a Node>,
	children: HashMap<&'a str, Vec<&'a str>>,
	/// Nodes whose subtree has already been emitted during this build.
	expanded: RefCell<HashSet<&'a str>>,
}

impl<'a> Builder<'a> {
	/// Expands `node` depth-first. `path` holds the ids from the root down to the
	/// parent of `node`; a child already on it would close a cycle and is skipped.
	/// A node expanded earlier in the build is emitted as a leaf.
	fn expand(&self, node: &'a Node, path: &mut Vec<&'a str>) -> HierarchyNode {
		let mut out = HierarchyNode::leaf(node.clone());
		if !self.expanded.borrow_mut().insert(node.id.as_str()) {
			return out;
		}
		path.push(node.id.as_str());
		for &child_id in self.children.get(node.id.as_str()).into_iter().flatten() {
			if path.contains(&child_id) {
				debug!("channel-graph: cycle cut at {} -> {}", node.id, child_id);
				continue;
			}
			if let Some(&child) = self.by_id.get(child_id) {
				out.children.push(self.expand(child, path));
			}
		}
		path.pop();
		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::types::{NodeKind, VIRTUAL_ROOT_ID};
	use proptest::prelude::*;

	fn node(id: &str, kind: NodeKind) -> Node {
		Node::new(id, id, kind)
	}

	fn ids(tree: &HierarchyNode) -> Vec<&str> {
		tree.children.iter().map(|c| c.id()).collect()
	}

	#[test]
	fn empty_graph_has_no_tree() {
		assert!(build_hierarchy(&[], &[]).is_none());
	}

	#[test]
	fn single_root_is_not_wrapped() {
		let nodes = [node("C1", NodeKind::Channel), node("D1", NodeKind::Destination)];
		let links = [Link::new("C1", "D1")];

		let tree = build_hierarchy(&nodes, &links).unwrap();

		assert_eq!(tree.id(), "C1");
		assert_eq!(ids(&tree), vec!["D1"]);
		assert!(tree.children[0].children.is_empty());
	}

	#[test]
	fn unlinked_nodes_go_under_virtual_root_in_input_order() {
		let nodes = [
			node("b", NodeKind::Custom),
			node("a", NodeKind::Channel),
			node("c", NodeKind::Transformer),
		];

		let tree = build_hierarchy(&nodes, &[]).unwrap();

		assert_eq!(tree.id(), VIRTUAL_ROOT_ID);
		assert_eq!(tree.node.kind, NodeKind::Root);
		assert_eq!(ids(&tree), vec!["b", "a", "c"]);
	}

	#[test]
	fn fully_cyclic_graph_lists_every_node_and_terminates() {
		let nodes = [
			node("a", NodeKind::Channel),
			node("b", NodeKind::Destination),
		];
		let links = [Link::new("a", "b"), Link::new("b", "a")];

		let tree = build_hierarchy(&nodes, &links).unwrap();

		assert_eq!(tree.id(), VIRTUAL_ROOT_ID);
		assert_eq!(ids(&tree), vec!["a", "b"]);
		assert_eq!(ids(&tree.children[0]), vec!["b"]);
		assert!(tree.children[0].children[0].children.is_empty());
	}

	#[test]
	fn shared_child_is_duplicated_under_each_parent() {
		let nodes = [
			node("c1", NodeKind::Channel),
			node("c2", NodeKind::Channel),
			node("d", NodeKind::Destination),
		];
		let links = [Link::new("c1", "d"), Link::new("c2", "d")];

		let tree = build_hierarchy(&nodes, &links).unwrap();

		assert_eq!(ids(&tree), vec!["c1", "c2"]);
		assert_eq!(ids(&tree.children[0]), vec!["d"]);
		assert_eq!(ids(&tree.children[1]), vec!["d"]);
	}

	#[test]
	fn dangling_links_are_skipped() {
		let nodes = [node("a", NodeKind::Channel), node("b", NodeKind::Custom)];
		let links = [Link::new("a", "ghost"), Link::new("a", "b")];

		let tree = build_hierarchy(&nodes, &links).unwrap();

		assert_eq!(tree.id(), "a");
		assert_eq!(ids(&tree), vec!["b"]);
	}

	#[test]
	fn collapsible_ids_skip_leaves_and_repeats() {
		let nodes = [
			node("c1", NodeKind::Channel),
			node("c2", NodeKind::Channel),
			node("d", NodeKind::Destination),
			node("t", NodeKind::Transformer),
		];
		let links = [
			Link::new("c1", "d"),
			Link::new("c2", "d"),
			Link::new("d", "t"),
		];
		let tree = build_hierarchy(&nodes, &links).unwrap();

		// The second `d` is a leaf: vroot, c1, d, t, c2, d.
		assert_eq!(tree.descendants().len(), 6);
		assert!(tree.children[1].children[0].children.is_empty());
		assert_eq!(
			tree.collapsible_ids(),
			vec![
				VIRTUAL_ROOT_ID.to_string(),
				"c1".to_string(),
				"d".to_string(),
				"c2".to_string()
			]
		);
	}

	#[test]
	fn dense_cycles_stay_linear_in_links() {
		let n = 12;
		let nodes: Vec<Node> = (0..n)
			.map(|i| node(&format!("n{i}"), NodeKind::Custom))
			.collect();
		let links: Vec<Link> = (0..n)
			.flat_map(|s| (0..n).filter(move |&t| t != s).map(move |t| (s, t)))
			.map(|(s, t)| Link::new(format!("n{s}"), format!("n{t}")))
			.collect();

		let tree = build_hierarchy(&nodes, &links).unwrap();

		assert_eq!(tree.id(), VIRTUAL_ROOT_ID);
		assert!(tree.descendants().len() <= 1 + nodes.len() + links.len());
		let mut seen: Vec<&str> = tree.descendants().into_iter().map(HierarchyNode::id).collect();
		seen.sort_unstable();
		seen.dedup();
		assert_eq!(seen.len(), n + 1);
	}

	fn graph_strategy() -> impl Strategy<Value = (Vec<Node>, Vec<Link>)> {
		(1usize..12).prop_flat_map(|n| {
			let links = proptest::collection::vec((0..n, 0..n), 0..n * 2);
			links.prop_map(move |pairs| {
				let nodes = (0..n)
					.map(|i| Node::new(format!("n{i}"), format!("N{i}"), NodeKind::Custom))
					.collect();
				let links = pairs
					.into_iter()
					.map(|(s, t)| Link::new(format!("n{s}"), format!("n{t}")))
					.collect();
				(nodes, links)
			})
		})
	}

	proptest! {
		#[test]
		fn rebuild_is_idempotent((nodes, links) in graph_strategy()) {
			let first = build_hierarchy(&nodes, &links);
			let second = build_hierarchy(&nodes, &links);
			prop_assert_eq!(first, second);
		}

		#[test]
		fn no_node_is_its_own_ancestor((nodes, links) in graph_strategy()) {
			fn check(n: &HierarchyNode, path: &mut Vec<String>) -> bool {
				if path.contains(&n.node.id) {
					return false;
				}
				path.push(n.node.id.clone());
				let ok = n.children.iter().all(|c| check(c, path));
				path.pop();
				ok
			}
			let tree = build_hierarchy(&nodes, &links).unwrap();
			prop_assert!(check(&tree, &mut Vec::new()));
		}

		#[test]
		fn tree_size_is_bounded_by_nodes_and_links((nodes, links) in graph_strategy()) {
			let tree = build_hierarchy(&nodes, &links).unwrap();
			prop_assert!(tree.descendants().len() <= 1 + nodes.len() + links.len());
		}
	}
}
