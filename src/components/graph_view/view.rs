//! Pan/zoom transform, collapse set and the preserve-across-redraw flag.
//!
//! `ViewState` is the only state that survives a re-layout. The coordinator
//! captures the transform before recomputing positions and puts it back
//! afterwards when [`ViewState::is_preserving`] is set.

use std::collections::HashSet;

use super::geometry::{Bounds, Point};
use super::types::NodeId;

/// Scale step used by the zoom buttons.
pub const ZOOM_FACTOR: f64 = 1.3;
/// Scale step used per wheel notch.
pub const WHEEL_FACTOR: f64 = 1.1;
/// Share of the canvas a fitted layout fills.
pub const FIT_RATIO: f64 = 0.8;

/// Pan and zoom transform applied to the entire graph view.
///
/// Screen position = world position * `k` + (`x`, `y`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal translation in screen pixels.
	pub x: f64,
	/// Vertical translation in screen pixels.
	pub y: f64,
	/// Zoom factor (1.0 = 100%).
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// World to screen.
	pub fn apply(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	/// Screen to world.
	pub fn invert(&self, screen: Point) -> Point {
		Point::new((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
	}
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanGesture {
	/// Whether a pan is under way.
	pub active: bool,
	/// Pointer position when the pan began.
	pub start: Point,
	/// Translation when the pan began.
	pub transform_start: Point,
}

/// Tracks an in-progress node drag.
#[derive(Clone, Debug, Default)]
pub struct DragGesture {
	/// The node being dragged, if any.
	pub node: Option<NodeId>,
	/// Whether the pointer moved far enough to count as a drag rather than a click.
	pub moved: bool,
	/// Pointer position when the drag began.
	pub start: Point,
}

/// Pan/zoom state of the canvas plus the fold set.
///
/// The preserve flag asks the next render to keep the current transform.
#[derive(Clone, Debug)]
pub struct ViewState {
	transform: ViewTransform,
	scale_extent: (f64, f64),
	viewport: (f64, f64),
	collapsed: HashSet<NodeId>,
	preserve: bool,
}

impl ViewState {
	/// A view over a `width` x `height` canvas with the origin in its centre.
	pub fn new(width: f64, height: f64) -> Self {
		let mut view = Self {
			transform: ViewTransform::default(),
			scale_extent: (0.1, 10.0),
			viewport: (width, height),
			collapsed: HashSet::new(),
			preserve: false,
		};
		view.reset_transform();
		view
	}

	/// Restricts zoom to `[min, max]`, clamping the current scale into it.
	pub fn with_scale_extent(mut self, min: f64, max: f64) -> Self {
		self.scale_extent = (min.min(max), max.max(min));
		self.transform.k = self.clamp(self.transform.k);
		self
	}

	/// Current transform.
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	/// Allowed zoom range.
	pub fn scale_extent(&self) -> (f64, f64) {
		self.scale_extent
	}

	/// Canvas size in pixels.
	pub fn viewport(&self) -> (f64, f64) {
		self.viewport
	}

	/// Sets the transform verbatim apart from scale clamping.
	pub fn set_transform(&mut self, t: ViewTransform) {
		self.transform = ViewTransform {
			k: self.clamp(t.k),
			..t
		};
	}

	/// Records a new canvas size.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport = (width, height);
	}

	/// The transform a fresh render starts from.
	pub fn default_transform(&self) -> ViewTransform {
		let (w, h) = self.viewport;
		ViewTransform {
			x: w / 2.0,
			y: h / 2.0,
			k: self.clamp(1.0),
		}
	}

	/// Restores the default transform centred on the origin.
	pub fn reset_transform(&mut self) {
		self.transform = self.default_transform();
	}

	fn clamp(&self, k: f64) -> f64 {
		let (min, max) = self.scale_extent;
		if k.is_finite() { k.clamp(min, max) } else { 1.0_f64.clamp(min, max) }
	}

	fn view_center(&self) -> Point {
		Point::new(self.viewport.0 / 2.0, self.viewport.1 / 2.0)
	}

	/// Multiplies the scale by `factor`, keeping the world point under `anchor`
	/// fixed on screen.
	pub fn zoom_by(&mut self, factor: f64, anchor: Point) {
		let world = self.transform.invert(anchor);
		let k = self.clamp(self.transform.k * factor);
		self.transform = ViewTransform {
			x: anchor.x - world.x * k,
			y: anchor.y - world.y * k,
			k,
		};
	}

	/// Zooms in one step around the canvas centre.
	pub fn zoom_in(&mut self) {
		self.zoom_by(ZOOM_FACTOR, self.view_center());
	}

	/// Zooms out one step around the canvas centre.
	pub fn zoom_out(&mut self) {
		self.zoom_by(1.0 / ZOOM_FACTOR, self.view_center());
	}

	/// Wheel zoom about the cursor. Positive `delta_y` zooms out.
	pub fn zoom_at(&mut self, cursor: Point, delta_y: f64) {
		let factor = if delta_y > 0.0 {
			1.0 / WHEEL_FACTOR
		} else {
			WHEEL_FACTOR
		};
		self.zoom_by(factor, cursor);
	}

	/// Moves the view by a screen-space delta.
	pub fn pan(&mut self, dx: f64, dy: f64) {
		self.transform.x += dx;
		self.transform.y += dy;
	}

	/// Moves the world origin to the canvas centre at scale 1.
	pub fn center(&mut self) {
		self.reset_transform();
	}

	/// Scales and translates so `bounds` fills [`FIT_RATIO`] of the canvas,
	/// centred. An axis with no extent is ignored; a single point gets scale
	/// `FIT_RATIO`.
	pub fn fit_to_screen(&mut self, bounds: Option<Bounds>) {
		let Some(bounds) = bounds else {
			self.reset_transform();
			return;
		};
		let (w, h) = self.viewport;
		let (bw, bh) = (bounds.width(), bounds.height());
		let fit = match (bw > 0.0, bh > 0.0) {
			(true, true) => (w / bw).min(h / bh),
			(true, false) => w / bw,
			(false, true) => h / bh,
			(false, false) => 1.0,
		};
		let k = self.clamp(fit * FIT_RATIO);
		let c = bounds.center();
		self.transform = ViewTransform {
			x: w / 2.0 - c.x * k,
			y: h / 2.0 - c.y * k,
			k,
		};
	}

	/// Maps a screen point into world coordinates.
	pub fn screen_to_world(&self, screen: Point) -> Point {
		self.transform.invert(screen)
	}

	/// Folded node ids.
	pub fn collapsed(&self) -> &HashSet<NodeId> {
		&self.collapsed
	}

	/// Whether `id` is folded.
	pub fn is_collapsed(&self, id: &str) -> bool {
		self.collapsed.contains(id)
	}

	/// Flips membership of `id` in the collapse set and asks the next render to
	/// keep the current transform. Returns whether the node is now collapsed.
	pub fn toggle_collapse(&mut self, id: &str) -> bool {
		self.preserve = true;
		if self.collapsed.remove(id) {
			false
		} else {
			self.collapsed.insert(id.to_string());
			true
		}
	}

	/// Unfolds everything.
	pub fn expand_all(&mut self) {
		self.preserve = true;
		self.collapsed.clear();
	}

	/// Collapses every id in `ids`, normally every node with children.
	pub fn collapse_all(&mut self, ids: impl IntoIterator<Item = NodeId>) {
		self.preserve = true;
		self.collapsed.extend(ids);
	}

	/// Replaces the fold set.
	pub fn set_collapsed(&mut self, ids: impl IntoIterator<Item = NodeId>) {
		self.collapsed = ids.into_iter().collect();
	}

	/// Whether the next render keeps the transform.
	pub fn is_preserving(&self) -> bool {
		self.preserve
	}

	/// Sets the preserve flag.
	pub fn set_preserve(&mut self, preserve: bool) {
		self.preserve = preserve;
	}
}
