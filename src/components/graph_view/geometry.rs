//! Positioned output shared by every layout strategy.
//!
//! Coordinates are world-space; the view transform maps them to the canvas.

use super::types::{LinkKind, NodeId, NodeKind};

/// A point or vector in world or screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate, growing downwards.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Cartesian point for a polar `(angle, radius)` pair, angle 0 pointing up.
	pub fn from_polar(angle: f64, radius: f64) -> Self {
		let a = angle - std::f64::consts::FRAC_PI_2;
		Self::new(radius * a.cos(), radius * a.sin())
	}

	/// Euclidean distance to `other`.
	pub fn distance(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	/// Smallest corner.
	pub min: Point,
	/// Largest corner.
	pub max: Point,
}

impl Bounds {
	/// Smallest box around `points`, or `None` when there are none.
	pub fn around(points: impl IntoIterator<Item = Point>) -> Option<Self> {
		let mut iter = points.into_iter();
		let first = iter.next()?;
		Some(iter.fold(
			Bounds {
				min: first,
				max: first,
			},
			|b, p| Bounds {
				min: Point::new(b.min.x.min(p.x), b.min.y.min(p.y)),
				max: Point::new(b.max.x.max(p.x), b.max.y.max(p.y)),
			},
		))
	}

	/// Extent along x.
	pub fn width(&self) -> f64 {
		self.max.x - self.min.x
	}

	/// Extent along y.
	pub fn height(&self) -> f64 {
		self.max.y - self.min.y
	}

	/// Middle of the box.
	pub fn center(&self) -> Point {
		Point::new(
			(self.min.x + self.max.x) / 2.0,
			(self.min.y + self.max.y) / 2.0,
		)
	}
}

/// Edge geometry as a cubic Bezier. Straight edges put the control points on the
/// chord.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgePath {
	/// Where the curve leaves the source node.
	pub start: Point,
	/// Control point near the source.
	pub c1: Point,
	/// Control point near the target.
	pub c2: Point,
	/// Where the curve reaches the target node.
	pub end: Point,
}

impl EdgePath {
	/// A straight segment expressed as a cubic.
	pub fn straight(start: Point, end: Point) -> Self {
		let lerp = |t: f64| {
			Point::new(
				start.x + (end.x - start.x) * t,
				start.y + (end.y - start.y) * t,
			)
		};
		Self {
			start,
			c1: lerp(1.0 / 3.0),
			c2: lerp(2.0 / 3.0),
			end,
		}
	}
}

/// A node placed by a layout.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedNode {
	/// Id of the underlying node.
	pub id: NodeId,
	/// Display name.
	pub name: String,
	/// Kind, for colouring.
	pub kind: NodeKind,
	/// World position.
	pub position: Point,
	/// Tree depth (0 at the root). Zero for force layouts.
	pub depth: usize,
	/// Number of children drawn below this node.
	pub visible_children: usize,
	/// Whether the node has children hidden by a collapse.
	pub collapsed: bool,
	/// `(angle, radius)` for radial trees.
	pub polar: Option<(f64, f64)>,
}

/// An edge placed by a layout.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedEdge {
	/// Parent or link source.
	pub source: NodeId,
	/// Child or link target.
	pub target: NodeId,
	/// Kind derived from the endpoint kinds.
	pub kind: LinkKind,
	/// Curve to stroke.
	pub path: EdgePath,
}

/// A positioned node/edge set ready for presentation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
	/// Positioned nodes.
	pub nodes: Vec<PositionedNode>,
	/// Positioned edges.
	pub edges: Vec<PositionedEdge>,
}

impl Layout {
	/// Whether nothing was placed.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Bounding box of every node position.
	pub fn bounds(&self) -> Option<Bounds> {
		Bounds::around(self.nodes.iter().map(|n| n.position))
	}

	/// The first positioned entry for `id`.
	pub fn node(&self, id: &str) -> Option<&PositionedNode> {
		self.nodes.iter().find(|n| n.id == id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bounds_cover_all_points() {
		let b = Bounds::around([
			Point::new(1.0, 5.0),
			Point::new(-3.0, 2.0),
			Point::new(4.0, -1.0),
		])
		.unwrap();

		assert_eq!(b.min, Point::new(-3.0, -1.0));
		assert_eq!(b.max, Point::new(4.0, 5.0));
		assert_eq!(b.center(), Point::new(0.5, 2.0));
		assert!(Bounds::around([]).is_none());
	}

	#[test]
	fn polar_zero_angle_points_up() {
		let p = Point::from_polar(0.0, 10.0);
		assert!(p.x.abs() < 1e-9);
		assert!((p.y + 10.0).abs() < 1e-9);
	}
}
