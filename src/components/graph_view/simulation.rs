//! Velocity Verlet force simulation with a cooling schedule.
//!
//! Each tick lowers the energy `alpha` toward `alpha_target`, lets every force
//! add to node velocities (or, for centring, shift positions directly), then
//! integrates: velocities are damped and added to positions. Pinned nodes stay
//! at their pin and lose their velocity.
//!
//! Forces:
//! - link: spring toward `link_distance`, weighted by endpoint degree
//! - charge: pairwise inverse-distance repulsion (or attraction when positive)
//! - center: translates the whole layout so its mean sits on the centre
//! - collide: keeps nodes at least two collision radii apart
//! - position (optional): per-axis pull toward the centre, scaled by alpha
//! - gravity (optional): a second centring translation
//!
//! The simulation is deterministic. Coincident nodes are separated with a tiny
//! offset from a fixed-seed linear congruential generator.

use std::collections::HashMap;
use std::f64::consts::PI;

use log::debug;

use super::geometry::{EdgePath, Layout, Point, PositionedEdge, PositionedNode};
use super::types::{Link, LinkKind, Node, NodeId};

/// Energy below which the layout counts as settled.
pub const ALPHA_MIN: f64 = 0.001;
/// Energy the schedule decays toward while a node is being dragged.
pub const DRAG_ALPHA_TARGET: f64 = 0.3;
/// Fraction of velocity removed at each tick.
pub const VELOCITY_DECAY: f64 = 0.4;

const INITIAL_RADIUS: f64 = 10.0;
/// Squared distance below which charge is computed as if at this distance.
const CHARGE_DISTANCE_MIN2: f64 = 1.0;

/// Force strengths and distances.
#[derive(Clone, Debug, PartialEq)]
pub struct ForceParams {
	/// Rest length of link springs.
	pub link_distance: f64,
	/// Pairwise charge. Negative values repel.
	pub charge_strength: f64,
	/// Strength of the centring translation, 1 keeps the mean exactly centred.
	pub center_strength: f64,
	/// Radius of every node for collision purposes.
	pub collision_radius: f64,
	/// Per-axis pull toward the centre, disabled when `None`.
	pub position_strength: Option<f64>,
	/// Additional centring translation, disabled when `None`.
	pub gravity_strength: Option<f64>,
}

impl ForceParams {
	/// One connected cloud of nodes.
	pub fn standard() -> Self {
		Self {
			link_distance: 250.0,
			charge_strength: -40.0,
			center_strength: 1.0,
			collision_radius: 50.0,
			position_strength: None,
			gravity_strength: None,
		}
	}

	/// Keeps disconnected components from drifting away from each other.
	pub fn disjoint() -> Self {
		Self {
			link_distance: 150.0,
			charge_strength: -30.0,
			center_strength: 1.5,
			collision_radius: 40.0,
			position_strength: Some(0.1),
			gravity_strength: Some(0.8),
		}
	}
}

impl Default for ForceParams {
	fn default() -> Self {
		Self::standard()
	}
}

/// Where the cooling schedule stands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimulationPhase {
	/// Nothing to simulate.
	Idle,
	/// Positions still move every tick.
	Running { alpha: f64 },
	/// Energy fell below [`ALPHA_MIN`]; ticks are no-ops until perturbed.
	Settled,
}

#[derive(Clone, Debug)]
struct Body {
	node: Node,
	x: f64,
	y: f64,
	vx: f64,
	vy: f64,
	pin: Option<Point>,
}

#[derive(Clone, Debug)]
struct Spring {
	source: usize,
	target: usize,
	kind: LinkKind,
	strength: f64,
	bias: f64,
}

/// Linear congruential generator with the constants from Numerical Recipes.
#[derive(Clone, Debug)]
struct Lcg(u64);

impl Lcg {
	fn next(&mut self) -> f64 {
		const M: u64 = 1 << 32;
		self.0 = (1_664_525 * self.0 + 1_013_904_223) % M;
		self.0 as f64 / M as f64
	}

	fn jiggle(&mut self) -> f64 {
		(self.next() - 0.5) * 1e-6
	}
}

/// Force-directed layout over a fixed node and link set.
///
/// Positions are advanced one [`ForceSimulation::tick`] at a time so the caller
/// can interleave input handling and drawing.
#[derive(Clone, Debug)]
pub struct ForceSimulation {
	bodies: Vec<Body>,
	springs: Vec<Spring>,
	index: HashMap<NodeId, usize>,
	params: ForceParams,
	center: Point,
	alpha: f64,
	alpha_target: f64,
	alpha_decay: f64,
	rng: Lcg,
}

impl ForceSimulation {
	/// Places `nodes` on a phyllotaxis spiral around the origin and starts the
	/// schedule at full energy. Links with unknown endpoints are ignored.
	pub fn new(nodes: &[Node], links: &[Link], params: ForceParams) -> Self {
		let golden = PI * (3.0 - 5f64.sqrt());
		let bodies: Vec<Body> = nodes
			.iter()
			.enumerate()
			.map(|(i, node)| {
				let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * golden;
				Body {
					node: node.clone(),
					x: radius * angle.cos(),
					y: radius * angle.sin(),
					vx: 0.0,
					vy: 0.0,
					pin: None,
				}
			})
			.collect();
		let index: HashMap<NodeId, usize> = bodies
			.iter()
			.enumerate()
			.map(|(i, b)| (b.node.id.clone(), i))
			.collect();

		let ends: Vec<(usize, usize)> = links
			.iter()
			.filter_map(|l| Some((*index.get(&l.source)?, *index.get(&l.target)?)))
			.collect();
		let mut degree = vec![0usize; bodies.len()];
		for &(s, t) in &ends {
			degree[s] += 1;
			degree[t] += 1;
		}
		let springs = ends
			.into_iter()
			.map(|(s, t)| Spring {
				source: s,
				target: t,
				kind: LinkKind::between(bodies[s].node.kind, bodies[t].node.kind),
				strength: 1.0 / degree[s].min(degree[t]) as f64,
				bias: degree[s] as f64 / (degree[s] + degree[t]) as f64,
			})
			.collect();

		Self {
			bodies,
			springs,
			index,
			params,
			center: Point::default(),
			alpha: 1.0,
			alpha_target: 0.0,
			alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / 300.0),
			rng: Lcg(1),
		}
	}

	/// Copies positions and velocities of nodes that also exist in `previous`,
	/// so a rebuilt simulation continues from where the old one left off.
	pub fn carry_positions_from(&mut self, previous: &ForceSimulation) {
		for body in &mut self.bodies {
			if let Some(&j) = previous.index.get(&body.node.id) {
				let old = &previous.bodies[j];
				body.x = old.x;
				body.y = old.y;
				body.vx = old.vx;
				body.vy = old.vy;
			}
		}
	}

	/// Current energy of the cooling schedule.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Where the cooling schedule stands.
	pub fn phase(&self) -> SimulationPhase {
		if self.bodies.is_empty() {
			SimulationPhase::Idle
		} else if self.alpha < ALPHA_MIN {
			SimulationPhase::Settled
		} else {
			SimulationPhase::Running { alpha: self.alpha }
		}
	}

	/// Whether alpha dropped below the settle threshold.
	pub fn is_settled(&self) -> bool {
		!matches!(self.phase(), SimulationPhase::Running { .. })
	}

	/// Resets the energy so the layout visibly re-settles.
	pub fn reheat(&mut self) {
		self.alpha = 1.0;
	}

	/// Replaces every force parameter and re-energizes the schedule.
	pub fn set_params(&mut self, params: ForceParams) {
		if params != self.params {
			debug!("channel-graph: force params changed, reheating");
		}
		self.params = params;
		self.reheat();
	}

	/// Fixes `id` at `at` and keeps the schedule warm until [`release`](Self::release).
	pub fn pin(&mut self, id: &str, at: Point) -> bool {
		let Some(&i) = self.index.get(id) else {
			return false;
		};
		self.bodies[i].pin = Some(at);
		self.alpha_target = DRAG_ALPHA_TARGET;
		if self.alpha < ALPHA_MIN {
			self.alpha = DRAG_ALPHA_TARGET;
		}
		true
	}

	/// Lets a pinned node move freely again and lets the schedule cool down.
	pub fn release(&mut self, id: &str) {
		if let Some(&i) = self.index.get(id) {
			self.bodies[i].pin = None;
		}
		if self.bodies.iter().all(|b| b.pin.is_none()) {
			self.alpha_target = 0.0;
		}
	}

	/// Current position of `id`.
	pub fn position(&self, id: &str) -> Option<Point> {
		self.index
			.get(id)
			.map(|&i| Point::new(self.bodies[i].x, self.bodies[i].y))
	}

	/// Advances one step. Returns `false` without touching anything when idle or
	/// settled.
	pub fn tick(&mut self) -> bool {
		if self.is_settled() {
			return false;
		}

		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

		self.apply_links();
		self.apply_charge();
		self.apply_center(self.params.center_strength);
		if let Some(strength) = self.params.gravity_strength {
			self.apply_center(strength);
		}
		self.apply_collide();
		if let Some(strength) = self.params.position_strength {
			self.apply_position(strength);
		}

		let damping = 1.0 - VELOCITY_DECAY;
		for b in &mut self.bodies {
			match b.pin {
				Some(p) => {
					b.x = p.x;
					b.y = p.y;
					b.vx = 0.0;
					b.vy = 0.0;
				}
				None => {
					b.vx *= damping;
					b.vy *= damping;
					b.x += b.vx;
					b.y += b.vy;
				}
			}
		}

		if self.alpha < ALPHA_MIN {
			debug!("channel-graph: simulation settled ({} nodes)", self.bodies.len());
		}
		true
	}

	/// Ticks until settled or `max_ticks` is reached, calling `on_tick` after each
	/// step. Returns the number of ticks taken.
	pub fn run_until_settled(&mut self, max_ticks: usize, mut on_tick: impl FnMut(&Self)) -> usize {
		let mut ticks = 0;
		while ticks < max_ticks && self.tick() {
			ticks += 1;
			on_tick(self);
		}
		ticks
	}

	fn apply_links(&mut self) {
		let alpha = self.alpha;
		let distance = self.params.link_distance;
		for i in 0..self.springs.len() {
			let Spring {
				source,
				target,
				strength,
				bias,
				..
			} = self.springs[i];
			let (s, t) = (&self.bodies[source], &self.bodies[target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = self.rng.jiggle();
			}
			if y == 0.0 {
				y = self.rng.jiggle();
			}
			let len = x.hypot(y);
			let l = (len - distance) / len * alpha * strength;
			let (x, y) = (x * l, y * l);

			let t = &mut self.bodies[target];
			t.vx -= x * bias;
			t.vy -= y * bias;
			let s = &mut self.bodies[source];
			s.vx += x * (1.0 - bias);
			s.vy += y * (1.0 - bias);
		}
	}

	fn apply_charge(&mut self) {
		let k = self.params.charge_strength * self.alpha;
		let n = self.bodies.len();
		for i in 0..n {
			let (mut dvx, mut dvy) = (0.0, 0.0);
			for j in 0..n {
				if i == j {
					continue;
				}
				let mut x = self.bodies[j].x - self.bodies[i].x;
				let mut y = self.bodies[j].y - self.bodies[i].y;
				let mut l = x * x + y * y;
				if x == 0.0 {
					x = self.rng.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = self.rng.jiggle();
					l += y * y;
				}
				if l < CHARGE_DISTANCE_MIN2 {
					l = (CHARGE_DISTANCE_MIN2 * l).sqrt();
				}
				let w = k / l;
				dvx += x * w;
				dvy += y * w;
			}
			self.bodies[i].vx += dvx;
			self.bodies[i].vy += dvy;
		}
	}

	fn apply_center(&mut self, strength: f64) {
		let n = self.bodies.len() as f64;
		let (sx, sy) = self
			.bodies
			.iter()
			.fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
		let dx = (sx / n - self.center.x) * strength;
		let dy = (sy / n - self.center.y) * strength;
		for b in &mut self.bodies {
			b.x -= dx;
			b.y -= dy;
		}
	}

	fn apply_collide(&mut self) {
		let r = self.params.collision_radius * 2.0;
		let n = self.bodies.len();
		for i in 0..n {
			let xi = self.bodies[i].x + self.bodies[i].vx;
			let yi = self.bodies[i].y + self.bodies[i].vy;
			for j in i + 1..n {
				let other = &self.bodies[j];
				let mut x = xi - other.x - other.vx;
				let mut y = yi - other.y - other.vy;
				let mut l = x * x + y * y;
				if l >= r * r {
					continue;
				}
				if x == 0.0 {
					x = self.rng.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = self.rng.jiggle();
					l += y * y;
				}
				let len = l.sqrt();
				let push = (r - len) / len;
				// Equal radii split the correction evenly.
				let (x, y) = (x * push * 0.5, y * push * 0.5);
				self.bodies[i].vx += x;
				self.bodies[i].vy += y;
				self.bodies[j].vx -= x;
				self.bodies[j].vy -= y;
			}
		}
	}

	fn apply_position(&mut self, strength: f64) {
		let k = strength * self.alpha;
		for b in &mut self.bodies {
			b.vx += (self.center.x - b.x) * k;
			b.vy += (self.center.y - b.y) * k;
		}
	}

	/// Current positions with straight edges.
	pub fn layout(&self) -> Layout {
		let nodes = self
			.bodies
			.iter()
			.map(|b| PositionedNode {
				id: b.node.id.clone(),
				name: b.node.name.clone(),
				kind: b.node.kind,
				position: Point::new(b.x, b.y),
				depth: 0,
				visible_children: 0,
				collapsed: false,
				polar: None,
			})
			.collect();
		let edges = self
			.springs
			.iter()
			.map(|s| {
				let (a, b) = (&self.bodies[s.source], &self.bodies[s.target]);
				PositionedEdge {
					source: a.node.id.clone(),
					target: b.node.id.clone(),
					kind: s.kind,
					path: EdgePath::straight(Point::new(a.x, a.y), Point::new(b.x, b.y)),
				}
			})
			.collect();
		Layout { nodes, edges }
	}
}
