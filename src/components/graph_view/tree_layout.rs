//! Tidy tree layout in vertical, horizontal and radial orientation.
//!
//! Positions come from the Buchheim/Walker linear-time variant of the
//! Reingold-Tilford algorithm: subtrees are placed bottom-up, pushed apart along
//! their contours until neighbours at every depth keep the required separation,
//! and parents are centred over their outermost children.
//!
//! Breadth is measured in "separation units": siblings sit 1 unit apart, cousins
//! 2 units. The orientation decides how units and depth map onto the plane:
//!
//! - vertical: breadth * `node_separation` on X, depth * `level_separation` on Y
//! - horizontal: the same with the axes swapped
//! - radial: breadth spread over a full circle, depth scaled to `radius`; the unit
//!   separation is divided by depth so outer rings do not fan out without bound
//!
//! The computation is a pure function of its inputs.

use std::collections::HashSet;
use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::geometry::{EdgePath, Layout, Point, PositionedEdge, PositionedNode};
use super::hierarchy::HierarchyNode;
use super::types::{LinkKind, NodeId};

/// How depth and breadth map onto the plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
	/// Root on top, depth grows downwards.
	#[default]
	Vertical,
	/// Root on the left, depth grows to the right.
	Horizontal,
	/// Root in the centre, depth grows outwards in rings.
	Radial,
}

impl Orientation {
	/// Every orientation, in the order the control panel lists them.
	pub const ALL: [Orientation; 3] = [
		Orientation::Vertical,
		Orientation::Horizontal,
		Orientation::Radial,
	];

	/// Serialized name, also used as the option value.
	pub fn as_str(self) -> &'static str {
		match self {
			Orientation::Vertical => "vertical",
			Orientation::Horizontal => "horizontal",
			Orientation::Radial => "radial",
		}
	}

	/// Inverse of [`Orientation::as_str`].
	pub fn parse(value: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|o| o.as_str() == value)
	}

	/// Human readable name.
	pub fn label(self) -> &'static str {
		match self {
			Orientation::Vertical => "Vertical",
			Orientation::Horizontal => "Horizontal",
			Orientation::Radial => "Radial",
		}
	}
}

/// Spacing parameters for tree layouts.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeParams {
	/// Distance between adjacent siblings, in world units.
	pub node_separation: f64,
	/// Distance between consecutive depths, in world units.
	pub level_separation: f64,
	/// Outer radius of a radial tree.
	pub radius: f64,
}

impl Default for TreeParams {
	fn default() -> Self {
		Self {
			node_separation: 100.0,
			level_separation: 150.0,
			radius: 300.0,
		}
	}
}

/// Tidy tree layout engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeLayout {
	/// Axis mapping of the result.
	pub orientation: Orientation,
	/// Spacing in world units.
	pub params: TreeParams,
}

impl TreeLayout {
	/// Engine with the given orientation and spacing.
	pub fn new(orientation: Orientation, params: TreeParams) -> Self {
		Self {
			orientation,
			params,
		}
	}

	/// Positions `root` and its visible descendants. Nodes in `collapsed` are laid
	/// out as leaves; `root` itself is left untouched.
	pub fn layout(&self, root: &HierarchyNode, collapsed: &HashSet<NodeId>) -> Layout {
		let mut tidy = Tidy::new(root, collapsed, self.orientation);
		tidy.first_walk_all(0);
		let root_mod = -tidy.slots[0].prelim;
		tidy.second_walk(0, root_mod);

		let placed: Vec<(Point, Option<(f64, f64)>)> = match self.orientation {
			Orientation::Vertical => tidy
				.slots
				.iter()
				.map(|s| {
					let p = Point::new(
						s.x * self.params.node_separation,
						s.depth as f64 * self.params.level_separation,
					);
					(p, None)
				})
				.collect(),
			Orientation::Horizontal => tidy
				.slots
				.iter()
				.map(|s| {
					let p = Point::new(
						s.depth as f64 * self.params.level_separation,
						s.x * self.params.node_separation,
					);
					(p, None)
				})
				.collect(),
			Orientation::Radial => tidy.radial(self.params.radius),
		};

		let nodes = tidy
			.slots
			.iter()
			.zip(&placed)
			.map(|(s, &(position, polar))| PositionedNode {
				id: s.source.node.id.clone(),
				name: s.source.node.name.clone(),
				kind: s.source.node.kind,
				position,
				depth: s.depth,
				visible_children: s.children.len(),
				collapsed: s.children.is_empty() && !s.source.children.is_empty(),
				polar,
			})
			.collect();

		let edges = tidy
			.slots
			.iter()
			.enumerate()
			.filter_map(|(i, s)| s.parent.map(|p| (p, i)))
			.map(|(p, c)| {
				let (parent, child) = (&tidy.slots[p], &tidy.slots[c]);
				PositionedEdge {
					source: parent.source.node.id.clone(),
					target: child.source.node.id.clone(),
					kind: LinkKind::between(parent.source.node.kind, child.source.node.kind),
					path: self.edge_path(placed[p], placed[c]),
				}
			})
			.collect();

		Layout { nodes, edges }
	}

	fn edge_path(
		&self,
		(s, s_polar): (Point, Option<(f64, f64)>),
		(t, t_polar): (Point, Option<(f64, f64)>),
	) -> EdgePath {
		match (self.orientation, s_polar, t_polar) {
			(Orientation::Radial, Some((sa, sr)), Some((ta, tr))) => {
				let mid = (sr + tr) / 2.0;
				EdgePath {
					start: s,
					c1: Point::from_polar(sa, mid),
					c2: Point::from_polar(ta, mid),
					end: t,
				}
			}
			(Orientation::Horizontal, ..) => {
				let mid = (s.x + t.x) / 2.0;
				EdgePath {
					start: s,
					c1: Point::new(mid, s.y),
					c2: Point::new(mid, t.y),
					end: t,
				}
			}
			_ => {
				let mid = (s.y + t.y) / 2.0;
				EdgePath {
					start: s,
					c1: Point::new(s.x, mid),
					c2: Point::new(t.x, mid),
					end: t,
				}
			}
		}
	}
}

/// Per-node working state of the tidy tree walk.
struct Slot<'a> {
	source: &'a HierarchyNode,
	parent: Option<usize>,
	children: Vec<usize>,
	depth: usize,
	/// Index among siblings.
	number: usize,
	prelim: f64,
	modifier: f64,
	change: f64,
	shift: f64,
	thread: Option<usize>,
	ancestor: usize,
	/// Default ancestor handed between siblings during apportioning.
	sibling_ancestor: Option<usize>,
	x: f64,
}

struct Tidy<'a> {
	slots: Vec<Slot<'a>>,
	orientation: Orientation,
}

impl<'a> Tidy<'a> {
	fn new(root: &'a HierarchyNode, collapsed: &HashSet<NodeId>, orientation: Orientation) -> Self {
		let mut tidy = Tidy {
			slots: Vec::new(),
			orientation,
		};
		tidy.push(root, None, 0, 0, collapsed);
		tidy
	}

	fn push(
		&mut self,
		source: &'a HierarchyNode,
		parent: Option<usize>,
		depth: usize,
		number: usize,
		collapsed: &HashSet<NodeId>,
	) -> usize {
		let idx = self.slots.len();
		self.slots.push(Slot {
			source,
			parent,
			children: Vec::new(),
			depth,
			number,
			prelim: 0.0,
			modifier: 0.0,
			change: 0.0,
			shift: 0.0,
			thread: None,
			ancestor: idx,
			sibling_ancestor: None,
			x: 0.0,
		});
		if !collapsed.contains(source.id()) {
			for (i, child) in source.children.iter().enumerate() {
				let c = self.push(child, Some(idx), depth + 1, i, collapsed);
				self.slots[idx].children.push(c);
			}
		}
		idx
	}

	fn separation(&self, a: usize, b: usize) -> f64 {
		let base = if self.slots[a].parent == self.slots[b].parent {
			1.0
		} else {
			2.0
		};
		match self.orientation {
			Orientation::Radial => base / self.slots[a].depth.max(1) as f64,
			_ => base,
		}
	}

	fn next_left(&self, v: usize) -> Option<usize> {
		self.slots[v].children.first().copied().or(self.slots[v].thread)
	}

	fn next_right(&self, v: usize) -> Option<usize> {
		self.slots[v].children.last().copied().or(self.slots[v].thread)
	}

	fn left_sibling(&self, v: usize) -> Option<usize> {
		let slot = &self.slots[v];
		match (slot.parent, slot.number) {
			(Some(p), n) if n > 0 => Some(self.slots[p].children[n - 1]),
			_ => None,
		}
	}

	/// Post-order, left to right.
	fn first_walk_all(&mut self, v: usize) {
		for i in 0..self.slots[v].children.len() {
			let c = self.slots[v].children[i];
			self.first_walk_all(c);
		}
		self.first_walk(v);
	}

	fn first_walk(&mut self, v: usize) {
		let w = self.left_sibling(v);
		let (first, last) = (
			self.slots[v].children.first().copied(),
			self.slots[v].children.last().copied(),
		);

		if let (Some(first), Some(last)) = (first, last) {
			self.execute_shifts(v);
			let midpoint = (self.slots[first].prelim + self.slots[last].prelim) / 2.0;
			if let Some(w) = w {
				self.slots[v].prelim = self.slots[w].prelim + self.separation(v, w);
				self.slots[v].modifier = self.slots[v].prelim - midpoint;
			} else {
				self.slots[v].prelim = midpoint;
			}
		} else if let Some(w) = w {
			self.slots[v].prelim = self.slots[w].prelim + self.separation(v, w);
		}

		if let Some(p) = self.slots[v].parent {
			let ancestor = self.slots[p]
				.sibling_ancestor
				.unwrap_or(self.slots[p].children[0]);
			let ancestor = self.apportion(v, w, ancestor);
			self.slots[p].sibling_ancestor = Some(ancestor);
		}
	}

	fn apportion(&mut self, v: usize, w: Option<usize>, mut ancestor: usize) -> usize {
		let (Some(w), Some(p)) = (w, self.slots[v].parent) else {
			return ancestor;
		};

		// Inner/outer contour cursors on the right (`ip`, `op`) and left (`im`,
		// `om`) side, with their accumulated modifier sums.
		let (mut vip, mut vop, mut vim) = (v, v, w);
		let mut vom = self.slots[p].children[0];
		let mut sip = self.slots[vip].modifier;
		let mut sop = self.slots[vop].modifier;
		let mut sim = self.slots[vim].modifier;
		let mut som = self.slots[vom].modifier;

		let mut next_im = self.next_right(vim);
		let mut next_ip = self.next_left(vip);
		while let (Some(im), Some(ip)) = (next_im, next_ip) {
			let (Some(om), Some(op)) = (self.next_left(vom), self.next_right(vop)) else {
				break;
			};
			(vim, vip, vom, vop) = (im, ip, om, op);
			self.slots[vop].ancestor = v;

			let shift = self.slots[vim].prelim + sim - self.slots[vip].prelim - sip
				+ self.separation(vim, vip);
			if shift > 0.0 {
				let wm = self.next_ancestor(vim, v, ancestor);
				self.move_subtree(wm, v, shift);
				sip += shift;
				sop += shift;
			}

			sim += self.slots[vim].modifier;
			sip += self.slots[vip].modifier;
			som += self.slots[vom].modifier;
			sop += self.slots[vop].modifier;

			next_im = self.next_right(vim);
			next_ip = self.next_left(vip);
		}

		if let Some(im) = next_im {
			if self.next_right(vop).is_none() {
				self.slots[vop].thread = Some(im);
				self.slots[vop].modifier += sim - sop;
			}
		}
		if let Some(ip) = next_ip {
			if self.next_left(vom).is_none() {
				self.slots[vom].thread = Some(ip);
				self.slots[vom].modifier += sip - som;
				ancestor = v;
			}
		}
		ancestor
	}

	fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
		let a = self.slots[vim].ancestor;
		if self.slots[a].parent == self.slots[v].parent {
			a
		} else {
			ancestor
		}
	}

	fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
		let subtrees = self.slots[wp].number as f64 - self.slots[wm].number as f64;
		let change = shift / subtrees;
		self.slots[wp].change -= change;
		self.slots[wp].shift += shift;
		self.slots[wm].change += change;
		self.slots[wp].prelim += shift;
		self.slots[wp].modifier += shift;
	}

	fn execute_shifts(&mut self, v: usize) {
		let (mut shift, mut change) = (0.0, 0.0);
		for i in (0..self.slots[v].children.len()).rev() {
			let w = self.slots[v].children[i];
			let slot = &mut self.slots[w];
			slot.prelim += shift;
			slot.modifier += shift;
			change += slot.change;
			shift += slot.shift + change;
		}
	}

	fn second_walk(&mut self, v: usize, parent_mod: f64) {
		let slot = &mut self.slots[v];
		slot.x = slot.prelim + parent_mod;
		slot.modifier += parent_mod;
		let m = slot.modifier;
		for i in 0..self.slots[v].children.len() {
			let c = self.slots[v].children[i];
			self.second_walk(c, m);
		}
	}

	/// Maps breadth onto `[0, TAU)` and depth onto `[0, radius]`.
	fn radial(&self, radius: f64) -> Vec<(Point, Option<(f64, f64)>)> {
		let (mut left, mut right, mut bottom) = (0, 0, 0);
		for (i, s) in self.slots.iter().enumerate() {
			if s.x < self.slots[left].x {
				left = i;
			}
			if s.x > self.slots[right].x {
				right = i;
			}
			if s.depth > self.slots[bottom].depth {
				bottom = i;
			}
		}

		let s = if left == right {
			1.0
		} else {
			self.separation(left, right) / 2.0
		};
		let tx = s - self.slots[left].x;
		let kx = TAU / (self.slots[right].x + s + tx);
		let ky = radius / self.slots[bottom].depth.max(1) as f64;

		self.slots
			.iter()
			.map(|slot| {
				let angle = (slot.x + tx) * kx;
				let r = slot.depth as f64 * ky;
				(Point::from_polar(angle, r), Some((angle, r)))
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::hierarchy::build_hierarchy;
	use crate::components::graph_view::types::{Link, Node, NodeKind};
	use proptest::prelude::*;

	fn tree(edges: &[(&str, &str)], extra: &[&str]) -> HierarchyNode {
		let mut ids: Vec<&str> = Vec::new();
		for (s, t) in edges {
			for id in [*s, *t] {
				if !ids.contains(&id) {
					ids.push(id);
				}
			}
		}
		ids.extend(extra.iter().copied());
		let nodes: Vec<Node> = ids
			.iter()
			.map(|id| Node::new(*id, *id, NodeKind::Custom))
			.collect();
		let links: Vec<Link> = edges.iter().map(|(s, t)| Link::new(*s, *t)).collect();
		build_hierarchy(&nodes, &links).unwrap()
	}

	fn pos(layout: &Layout, id: &str) -> Point {
		layout.node(id).unwrap().position
	}

	#[test]
	fn vertical_places_siblings_around_parent() {
		let root = tree(&[("r", "a"), ("r", "b")], &[]);
		let layout = TreeLayout::default().layout(&root, &HashSet::new());

		assert_eq!(pos(&layout, "r"), Point::new(0.0, 0.0));
		assert_eq!(pos(&layout, "a"), Point::new(-50.0, 150.0));
		assert_eq!(pos(&layout, "b"), Point::new(50.0, 150.0));
		assert_eq!(layout.edges.len(), 2);
	}

	#[test]
	fn horizontal_swaps_axes() {
		let root = tree(&[("r", "a"), ("r", "b")], &[]);
		let layout = TreeLayout::new(Orientation::Horizontal, TreeParams::default())
			.layout(&root, &HashSet::new());

		assert_eq!(pos(&layout, "a"), Point::new(150.0, -50.0));
		assert_eq!(pos(&layout, "b"), Point::new(150.0, 50.0));
	}

	#[test]
	fn cousins_sit_further_apart_than_siblings() {
		let root = tree(&[("r", "a"), ("r", "b"), ("a", "a1"), ("b", "b1")], &[]);
		let layout = TreeLayout::default().layout(&root, &HashSet::new());

		let gap = pos(&layout, "b1").x - pos(&layout, "a1").x;
		assert!((gap - 200.0).abs() < 1e-9, "gap = {gap}");
	}

	#[test]
	fn radial_puts_root_at_centre_and_leaves_on_rim() {
		let root = tree(&[("r", "a"), ("r", "b"), ("r", "c"), ("a", "a1")], &[]);
		let params = TreeParams {
			radius: 200.0,
			..Default::default()
		};
		let layout = TreeLayout::new(Orientation::Radial, params).layout(&root, &HashSet::new());

		assert_eq!(pos(&layout, "r").distance(Point::default()), 0.0);
		let rim = pos(&layout, "a1").distance(Point::default());
		assert!((rim - 200.0).abs() < 1e-9);
		for n in &layout.nodes {
			let (angle, _) = n.polar.unwrap();
			assert!((0.0..TAU).contains(&angle));
		}
	}

	#[test]
	fn collapsed_node_is_laid_out_as_leaf() {
		let root = tree(&[("C1", "D1")], &[]);
		let collapsed: HashSet<NodeId> = ["C1".to_string()].into();

		let layout = TreeLayout::default().layout(&root, &collapsed);

		assert_eq!(layout.nodes.len(), 1);
		assert!(layout.edges.is_empty());
		assert!(layout.nodes[0].collapsed);
		assert_eq!(layout.nodes[0].visible_children, 0);
		assert_eq!(root.children.len(), 1);
	}

	#[test]
	fn expanding_restores_previous_layout() {
		let root = tree(&[("r", "a"), ("r", "b"), ("a", "a1"), ("a", "a2")], &[]);
		let engine = TreeLayout::default();
		let before = engine.layout(&root, &HashSet::new());

		let collapsed: HashSet<NodeId> = ["a".to_string()].into();
		let folded = engine.layout(&root, &collapsed);
		assert_eq!(folded.nodes.len(), 3);

		assert_eq!(engine.layout(&root, &HashSet::new()), before);
	}

	#[test]
	fn vertical_edges_bend_at_mid_depth() {
		let root = tree(&[("r", "a"), ("r", "b")], &[]);
		let layout = TreeLayout::default().layout(&root, &HashSet::new());

		let path = layout.edges[0].path;
		assert_eq!(path.c1.y, 75.0);
		assert_eq!(path.c2.y, 75.0);
		assert_eq!(path.c1.x, path.start.x);
		assert_eq!(path.c2.x, path.end.x);
	}

	fn angle(layout: &Layout, id: &str) -> f64 {
		layout.node(id).and_then(|n| n.polar).map_or(f64::NAN, |(a, _)| a)
	}

	fn radial(root: &HierarchyNode) -> Layout {
		TreeLayout::new(Orientation::Radial, TreeParams::default()).layout(root, &HashSet::new())
	}

	#[test]
	fn radial_sibling_gap_shrinks_with_depth() {
		let root = tree(&[("r", "a"), ("r", "b"), ("b", "b1"), ("b", "b2")], &[]);
		let layout = radial(&root);

		let shallow = angle(&layout, "b") - angle(&layout, "a");
		let deep = angle(&layout, "b2") - angle(&layout, "b1");
		assert!(shallow > 0.0);
		assert!((shallow - 2.0 * deep).abs() < 1e-9, "{shallow} vs {deep}");
	}

	#[test]
	fn radial_siblings_get_half_the_cousin_gap() {
		let root = tree(
			&[("r", "a"), ("r", "b"), ("a", "a1"), ("a", "a2"), ("b", "b1")],
			&[],
		);
		let layout = radial(&root);

		let siblings = angle(&layout, "a2") - angle(&layout, "a1");
		let cousins = angle(&layout, "b1") - angle(&layout, "a2");
		assert!(siblings > 0.0);
		assert!((cousins - 2.0 * siblings).abs() < 1e-9, "{siblings} vs {cousins}");
	}

	#[test]
	fn horizontal_edges_bend_at_mid_depth() {
		let root = tree(&[("r", "a"), ("r", "b")], &[]);
		let layout = TreeLayout::new(Orientation::Horizontal, TreeParams::default())
			.layout(&root, &HashSet::new());

		let edge = layout.edges.iter().find(|e| e.target == "a").unwrap();
		let path = edge.path;
		assert_eq!(path.start, Point::new(0.0, 0.0));
		assert_eq!(path.end, Point::new(150.0, -50.0));
		assert_eq!(path.c1, Point::new(75.0, 0.0));
		assert_eq!(path.c2, Point::new(75.0, -50.0));
	}

	#[test]
	fn radial_edges_bend_on_the_middle_ring() {
		let root = tree(&[("r", "a"), ("r", "b"), ("r", "c")], &[]);
		let params = TreeParams {
			radius: 200.0,
			..Default::default()
		};
		let layout = TreeLayout::new(Orientation::Radial, params).layout(&root, &HashSet::new());

		for edge in &layout.edges {
			let path = edge.path;
			let (root_angle, _) = layout.node("r").and_then(|n| n.polar).unwrap();
			assert!(path.start.distance(Point::default()) < 1e-9);
			assert!((path.c1.distance(Point::default()) - 100.0).abs() < 1e-9);
			assert!((path.c2.distance(Point::default()) - 100.0).abs() < 1e-9);
			assert!(path.c1.distance(Point::from_polar(root_angle, 100.0)) < 1e-9);
			// The second control point lies on the ray towards the child.
			let halfway = Point::new(path.end.x / 2.0, path.end.y / 2.0);
			assert!(path.c2.distance(halfway) < 1e-9);
		}
	}

	fn random_tree() -> impl Strategy<Value = HierarchyNode> {
		proptest::collection::vec(any::<prop::sample::Index>(), 1..40).prop_map(|parents| {
			let mut nodes = vec![Node::new("n0", "n0", NodeKind::Channel)];
			let mut links = Vec::new();
			for (i, parent) in parents.iter().enumerate() {
				let id = format!("n{}", i + 1);
				links.push(Link::new(format!("n{}", parent.index(i + 1)), id.clone()));
				nodes.push(Node::new(id.clone(), id, NodeKind::Custom));
			}
			build_hierarchy(&nodes, &links).unwrap()
		})
	}

	fn orientation() -> impl Strategy<Value = Orientation> {
		prop_oneof![
			Just(Orientation::Vertical),
			Just(Orientation::Horizontal),
			Just(Orientation::Radial),
		]
	}

	proptest! {
		#[test]
		fn layout_is_deterministic(root in random_tree(), orientation in orientation()) {
			let engine = TreeLayout::new(orientation, TreeParams::default());
			let first = engine.layout(&root, &HashSet::new());
			let second = engine.layout(&root, &HashSet::new());
			prop_assert_eq!(first, second);
		}

		#[test]
		fn nodes_on_a_level_keep_their_separation(root in random_tree()) {
			let layout = TreeLayout::default().layout(&root, &HashSet::new());
			let mut levels: std::collections::BTreeMap<usize, Vec<f64>> = Default::default();
			for n in &layout.nodes {
				levels.entry(n.depth).or_default().push(n.position.x);
			}
			for xs in levels.values_mut() {
				xs.sort_by(|a, b| a.total_cmp(b));
				for pair in xs.windows(2) {
					prop_assert!(pair[1] - pair[0] >= 100.0 - 1e-6);
				}
			}
		}
	}
}
