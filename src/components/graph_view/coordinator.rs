//! Application state and the render pipeline.
//!
//! `RenderCoordinator` owns everything the canvas shows: the graph, the tree
//! derived from it, the active layout, view state, annotations and selection.
//! Every mutation goes through it so the derived pieces never go stale:
//!
//! ```text
//! GraphModel -> build_hierarchy -> TreeLayout | ForceSimulation -> Layout -> Scene
//!                                                        ViewState wraps each render
//! ```
//!
//! Layout computation is pure; drawing the resulting [`Scene`] is left to the
//! presentation layer.

use log::{debug, info, warn};

use super::annotations::{AnnotationStore, Status};
use super::error::{GraphError, StorageError};
use super::geometry::{Layout, Point, PositionedEdge, PositionedNode};
use super::hierarchy::{HierarchyNode, build_hierarchy};
use super::model::GraphModel;
use super::settings::ViewSettings;
use super::simulation::ForceSimulation;
use super::storage::GraphStorage;
use super::tree_layout::TreeLayout;
use super::types::{AnnotationDocument, GraphDocument, LayoutMode, NodeId, NodeKind};
use super::view::{ViewState, ViewTransform};

/// What a click on a node did.
#[derive(Clone, Debug, PartialEq)]
pub enum ClickOutcome {
	/// The node's subtree was folded (`true`) or unfolded (`false`).
	Toggled(bool),
	/// The node became the pending link source.
	Selected(NodeId),
	/// The pending selection was dropped.
	Deselected,
	/// A link from the previous selection to the clicked node was added.
	Linked { source: NodeId, target: NodeId },
	/// Nothing to do for this node.
	Ignored,
}

/// A node as drawn, with its adornments.
#[derive(Clone, Debug)]
pub struct SceneNode<'a> {
	/// Layout entry to draw.
	pub node: &'a PositionedNode,
	/// Whether to draw the comment dot.
	pub has_comment: bool,
	/// Only set for kinds that carry a status.
	pub status: Option<Status>,
	/// Whether the node is the current selection.
	pub selected: bool,
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug)]
pub struct Scene<'a> {
	/// Active layout style.
	pub mode: LayoutMode,
	/// World to screen transform for this frame.
	pub transform: ViewTransform,
	/// Configured node size in world units.
	pub node_size: f64,
	/// Nodes with their adornments, in drawing order.
	pub nodes: Vec<SceneNode<'a>>,
	/// Edges of the current layout.
	pub edges: &'a [PositionedEdge],
}

/// Single owner of the graph, its derived layouts and the view.
///
/// Created on load, mutated by user actions and emptied on reset. Each
/// mutation re-derives whatever depends on it before returning.
pub struct RenderCoordinator {
	mode: LayoutMode,
	settings: ViewSettings,
	model: GraphModel,
	hierarchy: Option<HierarchyNode>,
	view: ViewState,
	annotations: AnnotationStore,
	simulation: Option<ForceSimulation>,
	layout: Layout,
	selected: Option<NodeId>,
}

impl RenderCoordinator {
	/// Empty coordinator for a `width` x `height` canvas.
	pub fn new(mode: LayoutMode, settings: ViewSettings, width: f64, height: f64) -> Self {
		Self {
			mode,
			settings,
			model: GraphModel::new(),
			hierarchy: None,
			view: ViewState::new(width, height).with_scale_extent(0.1, mode.max_zoom()),
			annotations: AnnotationStore::new(),
			simulation: None,
			layout: Layout::default(),
			selected: None,
		}
	}

	/// Active layout style.
	pub fn mode(&self) -> LayoutMode {
		self.mode
	}

	/// The graph being shown.
	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	/// Display tree of the graph, while a tree layout is active.
	pub fn hierarchy(&self) -> Option<&HierarchyNode> {
		self.hierarchy.as_ref()
	}

	/// Pan/zoom and fold state.
	pub fn view(&self) -> &ViewState {
		&self.view
	}

	/// Comments and statuses.
	pub fn annotations(&self) -> &AnnotationStore {
		&self.annotations
	}

	/// Positions from the most recent render or tick.
	pub fn layout(&self) -> &Layout {
		&self.layout
	}

	/// Control values of the active layout.
	pub fn settings(&self) -> &ViewSettings {
		&self.settings
	}

	/// Currently selected node.
	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Replaces the graph, annotations and collapse set with `doc` and renders
	/// from a fresh transform.
	pub fn load(&mut self, doc: &GraphDocument) {
		self.model = GraphModel::from_document(doc);
		self.annotations = AnnotationStore::from_maps(doc.comments.clone(), doc.statuses.clone());
		let model = &self.model;
		self.annotations.retain_nodes(|id| model.contains(id));
		self.view.set_collapsed(doc.collapsed_nodes.iter().cloned());
		self.view.set_preserve(false);
		self.selected = None;
		self.simulation = None;
		info!(
			"channel-graph: loaded {} nodes, {} links",
			self.model.nodes().len(),
			self.model.links().len()
		);
		self.rebuild();
	}

	/// Applies annotation state saved separately from the graph.
	pub fn load_annotations(&mut self, doc: &AnnotationDocument) {
		self.annotations = AnnotationStore::from_document(doc);
		if !doc.collapsed_nodes.is_empty() {
			self.view.set_collapsed(doc.collapsed_nodes.iter().cloned());
			self.view.set_preserve(true);
			self.render();
		}
	}

	/// Drops the graph, collapse set, annotations and selection.
	pub fn reset(&mut self) {
		self.model.clear();
		self.annotations.clear();
		self.view.set_collapsed(std::iter::empty());
		self.view.set_preserve(false);
		self.selected = None;
		self.simulation = None;
		info!("channel-graph: graph reset");
		self.rebuild();
	}

	/// The complete persisted form of the current state.
	pub fn document(&self) -> GraphDocument {
		let mut collapsed: Vec<NodeId> = self.view.collapsed().iter().cloned().collect();
		collapsed.sort();
		GraphDocument {
			collapsed_nodes: collapsed,
			comments: self.annotations.comments().clone(),
			statuses: self.annotations.statuses().clone(),
			..self.model.to_document()
		}
	}

	fn annotation_document(&self) -> AnnotationDocument {
		let doc = self.document();
		self.annotations.to_document(doc.collapsed_nodes)
	}

	/// Loads graph and annotations from `storage`. Leaves the current state alone
	/// when the storage fails or holds nothing.
	pub fn load_from(&mut self, storage: &dyn GraphStorage) -> Result<(), StorageError> {
		let loaded = storage.load().and_then(|doc| Ok((doc, storage.load_annotations()?)));
		match loaded {
			Ok((doc, annotations)) => {
				if let Some(doc) = doc {
					self.load(&doc);
				}
				if let Some(annotations) = annotations {
					self.load_annotations(&annotations);
				}
				Ok(())
			}
			Err(e) => {
				warn!("channel-graph: load failed: {}", e);
				Err(e)
			}
		}
	}

	/// Writes graph and annotations. In-memory state is unchanged either way.
	pub fn save(&self, storage: &mut dyn GraphStorage) -> Result<(), StorageError> {
		let result = storage
			.save(&self.document())
			.and_then(|()| storage.save_annotations(&self.annotation_document()));
		match &result {
			Ok(()) => debug!("channel-graph: saved {} nodes", self.model.nodes().len()),
			Err(e) => warn!("channel-graph: save failed: {}", e),
		}
		result
	}

	/// Writes only the annotation document, which carries the collapse set. Called
	/// after every fold change so the tree reopens the way it was left.
	pub fn save_view_state(&self, storage: &mut dyn GraphStorage) -> Result<(), StorageError> {
		storage.save_annotations(&self.annotation_document()).inspect_err(|e| {
			warn!("channel-graph: saving collapse state failed: {}", e);
		})
	}

	/// Clears the stored documents, then the in-memory state.
	pub fn reset_storage(&mut self, storage: &mut dyn GraphStorage) -> Result<(), StorageError> {
		if let Err(e) = storage.reset() {
			warn!("channel-graph: reset failed: {}", e);
			return Err(e);
		}
		self.reset();
		Ok(())
	}

	/// Adds a node and links it under `parent` if given. Returns the generated id.
	pub fn add_node(
		&mut self,
		kind: NodeKind,
		name: &str,
		parent: Option<&str>,
	) -> Result<NodeId, GraphError> {
		let id = self.model.add_node(kind, name, parent).inspect_err(|e| {
			warn!("channel-graph: add node rejected: {}", e);
		})?;
		self.view.set_preserve(true);
		self.rebuild();
		Ok(id)
	}

	/// Links `source -> target` and re-lays out in place.
	pub fn connect(&mut self, source: &str, target: &str) -> Result<(), GraphError> {
		self.model.connect(source, target).inspect_err(|e| {
			warn!("channel-graph: link rejected: {}", e);
		})?;
		self.view.set_preserve(true);
		self.rebuild();
		Ok(())
	}

	/// Sets the comment on `id`. Blank text removes it.
	pub fn set_comment(&mut self, id: &str, text: &str) {
		self.annotations.set_comment(id, text);
	}

	/// Sets the deployment status of a node whose kind carries one.
	pub fn set_status(&mut self, id: &str, status: Option<Status>) -> bool {
		match self.model.node(id) {
			Some(node) if node.kind.has_status() => {
				self.annotations.set_status(id, status);
				true
			}
			_ => false,
		}
	}

	/// Switches the visual style. The view starts over from the default transform.
	pub fn set_mode(&mut self, mode: LayoutMode, settings: ViewSettings) {
		info!("channel-graph: layout {} -> {}", self.mode.as_str(), mode.as_str());
		self.mode = mode;
		self.settings = settings;
		let (w, h) = self.view.viewport();
		let collapsed: Vec<NodeId> = self.view.collapsed().iter().cloned().collect();
		self.view = ViewState::new(w, h).with_scale_extent(0.1, mode.max_zoom());
		self.view.set_collapsed(collapsed);
		self.simulation = None;
		self.selected = None;
		self.rebuild();
	}

	/// Applies new control values. Tree layouts are recomputed in place; a
	/// running simulation is re-energized with the new forces.
	pub fn set_settings(&mut self, settings: ViewSettings) {
		self.settings = settings;
		if self.mode.is_tree() {
			self.view.set_preserve(true);
			self.render();
		} else if let Some(sim) = &mut self.simulation {
			sim.set_params(self.settings.force_params(self.mode));
			self.layout = sim.layout();
		}
	}

	/// Re-derives the tree from the model. Force layouts never read it, so it is
	/// only built while a tree layout is active.
	fn rebuild(&mut self) {
		self.hierarchy = if self.mode.is_tree() {
			build_hierarchy(self.model.nodes(), self.model.links())
		} else {
			None
		};
		debug!(
			"channel-graph: hierarchy rebuilt ({} tree nodes)",
			self.hierarchy
				.as_ref()
				.map_or(0, |h| h.descendants().len())
		);
		self.render();
	}

	/// Recomputes the layout and reconciles the view transform.
	///
	/// With the preserve flag set the transform from before the render is put
	/// back verbatim; otherwise the view returns to its default transform.
	pub fn render(&mut self) {
		let captured = self.view.is_preserving().then(|| self.view.transform());

		self.layout = match self.mode {
			LayoutMode::CollapsibleTree | LayoutMode::HierarchicalTree => self.tree_layout(),
			LayoutMode::ForceDirected | LayoutMode::DisjointForce => self.force_layout(),
		};

		match captured {
			Some(t) => self.view.set_transform(t),
			None => {
				self.view.reset_transform();
				let (w, h) = self.view.viewport();
				self.view.zoom_by(self.settings.zoom, Point::new(w / 2.0, h / 2.0));
			}
		}

		// Tree layouts are final as soon as they are computed.
		if self.mode.is_tree() {
			self.view.set_preserve(false);
		}
	}

	fn tree_layout(&self) -> Layout {
		let Some(root) = &self.hierarchy else {
			return Layout::default();
		};
		let engine = TreeLayout::new(
			self.settings.orientation,
			self.settings.tree_params(self.view.viewport()),
		);
		if self.mode.supports_collapse() {
			engine.layout(root, self.view.collapsed())
		} else {
			engine.layout(root, &Default::default())
		}
	}

	fn force_layout(&mut self) -> Layout {
		let mut sim = ForceSimulation::new(
			self.model.nodes(),
			self.model.links(),
			self.settings.force_params(self.mode),
		);
		if let Some(previous) = &self.simulation {
			sim.carry_positions_from(previous);
		}
		let layout = sim.layout();
		self.simulation = Some(sim);
		layout
	}

	/// Advances a force layout by one step. Returns whether anything moved.
	pub fn tick(&mut self) -> bool {
		let Some(sim) = &mut self.simulation else {
			return false;
		};
		if !sim.tick() {
			return false;
		}
		self.layout = sim.layout();
		if sim.is_settled() {
			self.view.set_preserve(false);
			debug!("channel-graph: force layout settled");
		}
		true
	}

	/// Whether a force layout is still moving.
	pub fn is_animating(&self) -> bool {
		self.simulation.as_ref().is_some_and(|s| !s.is_settled())
	}

	/// Folds or unfolds the subtree under `id`. Returns the new collapse state,
	/// or `None` for nodes without children or layouts without folding.
	pub fn toggle_collapse(&mut self, id: &str) -> Option<bool> {
		if !self.mode.supports_collapse() {
			return None;
		}
		let has_children = self
			.hierarchy
			.as_ref()
			.and_then(|h| h.find(id))
			.is_some_and(|n| !n.children.is_empty());
		if !has_children {
			return None;
		}
		let collapsed = self.view.toggle_collapse(id);
		self.render();
		Some(collapsed)
	}

	/// Unfolds every node.
	pub fn expand_all(&mut self) {
		self.view.expand_all();
		self.render();
	}

	/// Collapses every node of the full tree that has at least one child.
	pub fn collapse_all(&mut self) {
		let ids = self
			.hierarchy
			.as_ref()
			.map(HierarchyNode::collapsible_ids)
			.unwrap_or_default();
		self.view.collapse_all(ids);
		self.render();
	}

	/// Zooms in one step around the canvas centre.
	pub fn zoom_in(&mut self) {
		self.view.zoom_in();
	}

	/// Zooms out one step around the canvas centre.
	pub fn zoom_out(&mut self) {
		self.view.zoom_out();
	}

	/// Wheel zoom keeping the world point under `cursor` fixed.
	pub fn zoom_at(&mut self, cursor: Point, delta_y: f64) {
		self.view.zoom_at(cursor, delta_y);
	}

	/// Moves the view by a screen-space delta.
	pub fn pan(&mut self, dx: f64, dy: f64) {
		self.view.pan(dx, dy);
	}

	/// Sets the transform, clamping its scale.
	pub fn set_transform(&mut self, t: ViewTransform) {
		self.view.set_transform(t);
	}

	/// Returns to the default transform.
	pub fn center(&mut self) {
		self.view.center();
	}

	/// Frames every positioned node.
	pub fn fit_to_screen(&mut self) {
		self.view.fit_to_screen(self.layout.bounds());
	}

	/// New canvas size. Radial trees are re-laid out for the new radius and a
	/// force layout is nudged to re-settle around the centre.
	pub fn resize(&mut self, width: f64, height: f64) {
		let old = self.view.viewport();
		self.view.resize(width, height);
		let t = self.view.transform();
		self.view.set_transform(ViewTransform {
			x: t.x + (width - old.0) / 2.0,
			y: t.y + (height - old.1) / 2.0,
			..t
		});
		if self.mode.is_tree() {
			self.view.set_preserve(true);
			self.render();
		} else if let Some(sim) = &mut self.simulation {
			sim.reheat();
		}
	}

	/// Maps a canvas point to world coordinates.
	pub fn screen_to_world(&self, screen: Point) -> Point {
		self.view.screen_to_world(screen)
	}

	/// The topmost node within `radius` world units of `world`.
	pub fn node_at(&self, world: Point, radius: f64) -> Option<&PositionedNode> {
		self.layout
			.nodes
			.iter()
			.rev()
			.find(|n| n.position.distance(world) <= radius)
	}

	/// Handles a click on node `id`.
	///
	/// Tree layouts fold the node where folding applies. Force layouts use the
	/// first click to select a link source and link it to the next clicked node.
	pub fn click_node(&mut self, id: &str) -> Result<ClickOutcome, GraphError> {
		if self.mode.is_tree() {
			return Ok(self
				.toggle_collapse(id)
				.map_or(ClickOutcome::Ignored, ClickOutcome::Toggled));
		}
		if !self.model.contains(id) {
			return Ok(ClickOutcome::Ignored);
		}
		match self.selected.take() {
			None => {
				self.selected = Some(id.to_string());
				Ok(ClickOutcome::Selected(id.to_string()))
			}
			Some(source) if source == id => Ok(ClickOutcome::Deselected),
			Some(source) => {
				self.connect(&source, id)?;
				Ok(ClickOutcome::Linked {
					source,
					target: id.to_string(),
				})
			}
		}
	}

	/// Makes `id` the current selection, the parent for new nodes and the target
	/// of annotation edits.
	pub fn select(&mut self, id: &str) -> bool {
		if !self.model.contains(id) {
			return false;
		}
		self.selected = Some(id.to_string());
		true
	}

	/// Clears the selection.
	pub fn click_background(&mut self) {
		self.selected = None;
	}

	/// Pins a node of a force layout under the pointer.
	pub fn drag_to(&mut self, id: &str, world: Point) -> bool {
		let Some(sim) = &mut self.simulation else {
			return false;
		};
		if !sim.pin(id, world) {
			return false;
		}
		self.view.set_preserve(true);
		true
	}

	/// Releases a node pinned by [`RenderCoordinator::drag_to`].
	pub fn drag_end(&mut self, id: &str) {
		if let Some(sim) = &mut self.simulation {
			sim.release(id);
		}
	}

	/// Snapshot of what to draw for the current frame.
	pub fn scene(&self) -> Scene<'_> {
		let nodes = self
			.layout
			.nodes
			.iter()
			.map(|n| SceneNode {
				node: n,
				has_comment: self.annotations.has_comment(&n.id),
				status: n
					.kind
					.has_status()
					.then(|| self.annotations.status(&n.id))
					.flatten(),
				selected: self.selected.as_deref() == Some(n.id.as_str()),
			})
			.collect();
		Scene {
			mode: self.mode,
			transform: self.view.transform(),
			node_size: self.settings.node_size,
			nodes,
			edges: &self.layout.edges,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::storage::MemoryStorage;
	use crate::components::graph_view::types::{Link, Node, VIRTUAL_ROOT_ID};

	fn sample_doc() -> GraphDocument {
		GraphDocument {
			nodes: vec![
				Node::new("C1", "ADT", NodeKind::Channel),
				Node::new("D1", "Lab", NodeKind::Destination),
				Node::new("T1", "Map", NodeKind::Transformer),
			],
			links: vec![Link::new("C1", "D1"), Link::new("D1", "T1")],
			..Default::default()
		}
	}

	fn coordinator(mode: LayoutMode) -> RenderCoordinator {
		let mut c = RenderCoordinator::new(mode, ViewSettings::for_mode(mode), 800.0, 600.0);
		c.load(&sample_doc());
		c
	}

	#[test]
	fn collapse_c1_leaves_one_node() {
		let mut c = RenderCoordinator::new(
			LayoutMode::CollapsibleTree,
			ViewSettings::default(),
			800.0,
			600.0,
		);
		c.load(&GraphDocument {
			nodes: vec![
				Node::new("C1", "C1", NodeKind::Channel),
				Node::new("D1", "D1", NodeKind::Destination),
			],
			links: vec![Link::new("C1", "D1")],
			..Default::default()
		});
		assert_eq!(c.hierarchy().unwrap().id(), "C1");

		assert_eq!(c.toggle_collapse("C1"), Some(true));
		assert_eq!(c.layout().nodes.len(), 1);
		assert!(c.layout().edges.is_empty());
	}

	#[test]
	fn collapse_preserves_transform_and_expand_restores_layout() {
		let mut c = coordinator(LayoutMode::CollapsibleTree);
		let before = c.layout().clone();
		c.pan(25.0, -40.0);
		c.zoom_in();
		let t = c.view().transform();

		c.toggle_collapse("D1");
		assert_eq!(c.view().transform(), t);
		assert!(!c.view().is_preserving());
		assert_eq!(c.layout().nodes.len(), 2);

		c.toggle_collapse("D1");
		assert_eq!(c.layout(), &before);
		assert_eq!(c.view().transform(), t);
	}

	#[test]
	fn unpreserved_render_resets_transform() {
		let mut c = coordinator(LayoutMode::CollapsibleTree);
		c.pan(100.0, 100.0);
		c.render();
		assert_eq!(c.view().transform(), c.view().default_transform());
	}

	#[test]
	fn leaves_do_not_toggle() {
		let mut c = coordinator(LayoutMode::CollapsibleTree);
		assert_eq!(c.toggle_collapse("T1"), None);
		assert_eq!(c.toggle_collapse("ghost"), None);
		assert!(c.view().collapsed().is_empty());
	}

	#[test]
	fn collapse_all_then_expand_all() {
		let mut c = coordinator(LayoutMode::CollapsibleTree);
		c.collapse_all();
		assert_eq!(c.layout().nodes.len(), 1);
		c.expand_all();
		assert_eq!(c.layout().nodes.len(), 3);
	}

	#[test]
	fn hierarchical_mode_ignores_collapse() {
		let mut doc = sample_doc();
		doc.collapsed_nodes = vec!["C1".into()];
		let mut c = RenderCoordinator::new(
			LayoutMode::HierarchicalTree,
			ViewSettings::default(),
			800.0,
			600.0,
		);
		c.load(&doc);
		assert_eq!(c.layout().nodes.len(), 3);
		assert_eq!(c.toggle_collapse("C1"), None);
	}

	#[test]
	fn add_node_rebuilds_and_keeps_view() {
		let mut c = coordinator(LayoutMode::CollapsibleTree);
		c.pan(10.0, 10.0);
		let t = c.view().transform();

		let id = c.add_node(NodeKind::Transformer, "Filter", Some("D1")).unwrap();
		assert!(c.layout().node(&id).is_some());
		assert_eq!(c.view().transform(), t);

		assert_eq!(
			c.add_node(NodeKind::Custom, "", None),
			Err(GraphError::EmptyName)
		);
		assert_eq!(c.layout().nodes.len(), 4);
	}

	#[test]
	fn unrooted_nodes_get_virtual_root() {
		let mut c = coordinator(LayoutMode::CollapsibleTree);
		c.add_node(NodeKind::Custom, "Loose", None).unwrap();
		assert_eq!(c.hierarchy().unwrap().id(), VIRTUAL_ROOT_ID);
	}

	#[test]
	fn force_mode_ticks_until_settled() {
		let mut c = coordinator(LayoutMode::ForceDirected);
		assert!(c.is_animating());
		let mut ticks = 0;
		while c.tick() {
			ticks += 1;
			assert!(ticks < 10_000);
		}
		assert!(!c.is_animating());
		assert_eq!(c.layout().nodes.len(), 3);
		assert_eq!(c.layout().edges.len(), 2);
	}

	#[test]
	fn settings_change_reheats_force_layout() {
		let mut c = coordinator(LayoutMode::DisjointForce);
		while c.tick() {}
		let mut settings = c.settings().clone();
		settings.charge_strength = -80.0;
		c.set_settings(settings);
		assert!(c.is_animating());
	}

	#[test]
	fn click_gesture_links_two_nodes() {
		let mut c = coordinator(LayoutMode::ForceDirected);

		assert_eq!(c.click_node("T1"), Ok(ClickOutcome::Selected("T1".into())));
		assert_eq!(c.selected(), Some("T1"));
		assert_eq!(
			c.click_node("C1"),
			Ok(ClickOutcome::Linked {
				source: "T1".into(),
				target: "C1".into()
			})
		);
		assert!(c.model().has_link("T1", "C1"));
		assert_eq!(c.selected(), None);

		c.click_node("C1").unwrap();
		assert_eq!(
			c.click_node("D1"),
			Err(GraphError::DuplicateLink {
				from: "C1".into(),
				to: "D1".into()
			})
		);
		assert_eq!(c.model().links().len(), 3);

		c.click_node("D1").unwrap();
		assert_eq!(c.click_node("D1"), Ok(ClickOutcome::Deselected));
		c.click_node("D1").unwrap();
		c.click_background();
		assert_eq!(c.selected(), None);
	}

	#[test]
	fn drag_pins_node_in_force_mode_only() {
		let mut c = coordinator(LayoutMode::ForceDirected);
		let at = Point::new(300.0, 0.0);
		assert!(c.drag_to("D1", at));
		c.tick();
		assert_eq!(c.layout().node("D1").unwrap().position, at);
		c.drag_end("D1");

		let mut tree = coordinator(LayoutMode::CollapsibleTree);
		assert!(!tree.drag_to("D1", at));
	}

	#[test]
	fn status_only_on_destinations() {
		let mut c = coordinator(LayoutMode::CollapsibleTree);
		assert!(c.set_status("D1", Some(Status::Ready)));
		assert!(!c.set_status("C1", Some(Status::Ready)));
		c.set_comment("C1", "owned by lab team");

		let scene = c.scene();
		let d1 = scene.nodes.iter().find(|n| n.node.id == "D1").unwrap();
		let c1 = scene.nodes.iter().find(|n| n.node.id == "C1").unwrap();
		assert_eq!(d1.status, Some(Status::Ready));
		assert!(!d1.has_comment);
		assert!(c1.has_comment);
		assert_eq!(c1.status, None);
	}

	#[test]
	fn save_and_reload_round_trip() {
		let mut storage = MemoryStorage::new();
		let mut c = coordinator(LayoutMode::CollapsibleTree);
		c.toggle_collapse("D1");
		c.set_status("D1", Some(Status::Production));
		c.save(&mut storage).unwrap();

		let mut other = RenderCoordinator::new(
			LayoutMode::CollapsibleTree,
			ViewSettings::default(),
			800.0,
			600.0,
		);
		other.load_from(&storage).unwrap();
		assert_eq!(other.model().nodes().len(), 3);
		assert!(other.view().is_collapsed("D1"));
		assert_eq!(other.annotations().status("D1"), Some(Status::Production));
		assert_eq!(other.layout().nodes.len(), 2);
	}

	#[test]
	fn failed_save_keeps_state() {
		let mut storage = MemoryStorage::new();
		storage.fail = true;
		let c = coordinator(LayoutMode::CollapsibleTree);
		let before = c.document();
		assert!(c.save(&mut storage).is_err());
		assert_eq!(c.document(), before);

		let mut c = c;
		assert!(c.load_from(&storage).is_err());
		assert_eq!(c.model().nodes().len(), 3);
		assert!(c.reset_storage(&mut storage).is_err());
		assert_eq!(c.model().nodes().len(), 3);
	}

	#[test]
	fn reset_clears_everything() {
		let mut storage = MemoryStorage::new();
		let mut c = coordinator(LayoutMode::CollapsibleTree);
		c.toggle_collapse("C1");
		c.set_comment("C1", "x");
		c.save(&mut storage).unwrap();

		c.reset_storage(&mut storage).unwrap();
		assert!(c.model().is_empty());
		assert!(c.hierarchy().is_none());
		assert!(c.layout().is_empty());
		assert!(c.view().collapsed().is_empty());
		assert!(c.annotations().comments().is_empty());
		assert!(storage.load().unwrap().is_none());
	}

	#[test]
	fn switching_mode_changes_zoom_extent() {
		let mut c = coordinator(LayoutMode::CollapsibleTree);
		assert_eq!(c.view().scale_extent(), (0.1, 3.0));
		c.set_mode(LayoutMode::ForceDirected, ViewSettings::for_mode(LayoutMode::ForceDirected));
		assert_eq!(c.view().scale_extent(), (0.1, 10.0));
		assert!(c.is_animating());
	}

	#[test]
	fn fit_to_screen_frames_layout() {
		let mut c = coordinator(LayoutMode::HierarchicalTree);
		c.fit_to_screen();
		let t = c.view().transform();
		for n in &c.layout().nodes {
			let p = t.apply(n.position);
			assert!((0.0..=800.0).contains(&p.x) && (0.0..=600.0).contains(&p.y));
		}
	}

	#[test]
	fn node_at_hits_within_radius() {
		let c = coordinator(LayoutMode::CollapsibleTree);
		let d1 = c.layout().node("D1").unwrap().position;
		assert_eq!(
			c.node_at(Point::new(d1.x + 5.0, d1.y), 10.0).map(|n| n.id.as_str()),
			Some("D1")
		);
		assert!(c.node_at(Point::new(d1.x + 50.0, d1.y), 10.0).is_none());
	}

	#[test]
	fn force_modes_skip_the_tree() {
		let mut c = coordinator(LayoutMode::ForceDirected);
		assert!(c.hierarchy().is_none());
		assert_eq!(c.layout().nodes.len(), 3);

		c.set_mode(LayoutMode::CollapsibleTree, ViewSettings::default());
		assert_eq!(c.hierarchy().map(HierarchyNode::id), Some("C1"));
	}

	#[test]
	fn densely_linked_graph_renders_as_tree() {
		let ids: Vec<String> = (0..14).map(|i| format!("n{i}")).collect();
		let mut c = RenderCoordinator::new(
			LayoutMode::CollapsibleTree,
			ViewSettings::default(),
			800.0,
			600.0,
		);
		c.load(&GraphDocument {
			nodes: ids
				.iter()
				.map(|id| Node::new(id.as_str(), id.as_str(), NodeKind::Custom))
				.collect(),
			links: ids
				.iter()
				.flat_map(|s| {
					ids.iter()
						.filter(move |t| *t != s)
						.map(move |t| Link::new(s.as_str(), t.as_str()))
				})
				.collect(),
			..Default::default()
		});

		let tree_size = c.hierarchy().map_or(0, |h| h.descendants().len());
		assert!(tree_size <= 1 + 14 + 14 * 13, "tree size = {tree_size}");
		assert_eq!(c.layout().nodes.len(), tree_size);
	}

	#[test]
	fn hierarchical_click_never_links() {
		let mut c = coordinator(LayoutMode::HierarchicalTree);
		assert_eq!(c.click_node("T1"), Ok(ClickOutcome::Ignored));
		assert_eq!(c.click_node("C1"), Ok(ClickOutcome::Ignored));
		assert_eq!(c.selected(), None);
		assert_eq!(c.model().links().len(), 2);
	}

	#[test]
	fn fold_changes_can_be_saved_alone() {
		let mut storage = MemoryStorage::new();
		let mut c = coordinator(LayoutMode::CollapsibleTree);
		c.toggle_collapse("D1");
		c.save_view_state(&mut storage).unwrap();

		assert!(storage.load().unwrap().is_none());
		let saved = storage.load_annotations().unwrap().unwrap();
		assert_eq!(saved.collapsed_nodes, vec!["D1".to_string()]);

		c.expand_all();
		c.save_view_state(&mut storage).unwrap();
		assert!(storage.load_annotations().unwrap().unwrap().collapsed_nodes.is_empty());
	}
}
