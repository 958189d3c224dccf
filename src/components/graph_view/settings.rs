//! User-tunable control values, persisted per layout mode in `localStorage`.

use log::warn;
use serde::{Deserialize, Serialize};

use super::error::StorageError;
use super::simulation::ForceParams;
use super::tree_layout::{Orientation, TreeParams};
use super::types::LayoutMode;

/// Every slider/input value of the control panel.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSettings {
	/// Tree sibling spacing in world units.
	pub node_separation: f64,
	/// Tree depth spacing in world units.
	pub level_separation: f64,
	/// Node circle radius in world units.
	pub node_size: f64,
	/// Axis mapping of tree layouts.
	pub orientation: Orientation,
	/// Rest length of link springs.
	pub link_distance: f64,
	/// Many-body strength; negative repels.
	pub charge_strength: f64,
	/// Strength of the pull towards the centre.
	pub center_strength: f64,
	/// Minimum centre distance between nodes.
	pub collision_radius: f64,
	/// Second centring pull, disjoint layout only.
	pub gravity_strength: f64,
	/// Pull towards the centre axes, disjoint layout only.
	pub position_strength: f64,
	/// Zoom applied after a fresh render.
	pub zoom: f64,
}

impl Default for ViewSettings {
	fn default() -> Self {
		Self::for_mode(LayoutMode::default())
	}
}

/// Shape accepted when reading settings back; absent fields keep their default.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
	node_separation: Option<f64>,
	level_separation: Option<f64>,
	node_size: Option<f64>,
	orientation: Option<Orientation>,
	link_distance: Option<f64>,
	charge_strength: Option<f64>,
	center_strength: Option<f64>,
	collision_radius: Option<f64>,
	gravity_strength: Option<f64>,
	position_strength: Option<f64>,
	zoom: Option<f64>,
}

/// A numeric input of the control panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
	/// Tree sibling spacing.
	NodeSeparation,
	/// Tree depth spacing.
	LevelSeparation,
	/// Node circle size.
	NodeSize,
	/// Rest length of link springs.
	LinkDistance,
	/// Charge between every pair; negative repels.
	ChargeStrength,
	/// Pull towards the centre.
	CenterStrength,
	/// Minimum distance kept between nodes.
	CollisionRadius,
	/// Second centring pull of the disjoint layout.
	GravityStrength,
	/// Pull of each node towards the centre axes (disjoint layout).
	PositionStrength,
}

impl Control {
	/// Every control, in panel order.
	pub const ALL: [Control; 9] = [
		Control::NodeSeparation,
		Control::LevelSeparation,
		Control::NodeSize,
		Control::LinkDistance,
		Control::ChargeStrength,
		Control::CenterStrength,
		Control::CollisionRadius,
		Control::GravityStrength,
		Control::PositionStrength,
	];

	/// Label shown next to the input.
	pub fn label(self) -> &'static str {
		match self {
			Control::NodeSeparation => "Node separation",
			Control::LevelSeparation => "Level separation",
			Control::NodeSize => "Node size",
			Control::LinkDistance => "Link distance",
			Control::ChargeStrength => "Charge",
			Control::CenterStrength => "Center",
			Control::CollisionRadius => "Collision radius",
			Control::GravityStrength => "Gravity",
			Control::PositionStrength => "Position",
		}
	}

	/// Whether the control has any effect in `mode`.
	pub fn applies_to(self, mode: LayoutMode) -> bool {
		match self {
			Control::NodeSeparation | Control::LevelSeparation => mode.is_tree(),
			Control::NodeSize => true,
			Control::LinkDistance
			| Control::ChargeStrength
			| Control::CenterStrength
			| Control::CollisionRadius => !mode.is_tree(),
			Control::GravityStrength | Control::PositionStrength => mode == LayoutMode::DisjointForce,
		}
	}

	/// Increment of the number input.
	pub fn step(self) -> f64 {
		match self {
			Control::CenterStrength | Control::GravityStrength | Control::PositionStrength => 0.1,
			_ => 1.0,
		}
	}
}

fn positive(stored: Option<f64>, fallback: f64) -> f64 {
	stored.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(fallback)
}

impl ViewSettings {
	/// Defaults for `mode`.
	pub fn for_mode(mode: LayoutMode) -> Self {
		let tree = TreeParams::default();
		let force = match mode {
			LayoutMode::DisjointForce => ForceParams::disjoint(),
			_ => ForceParams::standard(),
		};
		Self {
			node_separation: tree.node_separation,
			level_separation: tree.level_separation,
			node_size: 22.0,
			orientation: Orientation::default(),
			link_distance: force.link_distance,
			charge_strength: force.charge_strength,
			center_strength: force.center_strength,
			collision_radius: force.collision_radius,
			gravity_strength: force.gravity_strength.unwrap_or(0.8),
			position_strength: force.position_strength.unwrap_or(0.1),
			zoom: 1.0,
		}
	}

	/// Parses stored JSON over the defaults for `mode`. Malformed input yields the
	/// defaults; unusable individual values fall back one by one.
	pub fn from_json(mode: LayoutMode, text: &str) -> Self {
		let defaults = Self::for_mode(mode);
		let stored: StoredSettings = match serde_json::from_str(text) {
			Ok(s) => s,
			Err(e) => {
				warn!("channel-graph: ignoring malformed settings for {}: {}", mode.as_str(), e);
				return defaults;
			}
		};
		Self {
			node_separation: positive(stored.node_separation, defaults.node_separation),
			level_separation: positive(stored.level_separation, defaults.level_separation),
			node_size: positive(stored.node_size, defaults.node_size),
			orientation: stored.orientation.unwrap_or(defaults.orientation),
			link_distance: positive(stored.link_distance, defaults.link_distance),
			charge_strength: stored
				.charge_strength
				.filter(|v| v.is_finite())
				.unwrap_or(defaults.charge_strength),
			center_strength: positive(stored.center_strength, defaults.center_strength),
			collision_radius: positive(stored.collision_radius, defaults.collision_radius),
			gravity_strength: positive(stored.gravity_strength, defaults.gravity_strength),
			position_strength: positive(stored.position_strength, defaults.position_strength),
			zoom: positive(stored.zoom, defaults.zoom),
		}
	}

	/// Current value of `control`.
	pub fn value(&self, control: Control) -> f64 {
		match control {
			Control::NodeSeparation => self.node_separation,
			Control::LevelSeparation => self.level_separation,
			Control::NodeSize => self.node_size,
			Control::LinkDistance => self.link_distance,
			Control::ChargeStrength => self.charge_strength,
			Control::CenterStrength => self.center_strength,
			Control::CollisionRadius => self.collision_radius,
			Control::GravityStrength => self.gravity_strength,
			Control::PositionStrength => self.position_strength,
		}
	}

	/// Sets `control` to `value`. Values that could not be read back from
	/// storage are refused and leave the settings unchanged: anything
	/// non-finite, and anything not positive except the charge.
	pub fn set(&mut self, control: Control, value: f64) -> bool {
		let accepted = match control {
			Control::ChargeStrength => value.is_finite(),
			_ => value.is_finite() && value > 0.0,
		};
		if !accepted {
			return false;
		}
		let slot = match control {
			Control::NodeSeparation => &mut self.node_separation,
			Control::LevelSeparation => &mut self.level_separation,
			Control::NodeSize => &mut self.node_size,
			Control::LinkDistance => &mut self.link_distance,
			Control::ChargeStrength => &mut self.charge_strength,
			Control::CenterStrength => &mut self.center_strength,
			Control::CollisionRadius => &mut self.collision_radius,
			Control::GravityStrength => &mut self.gravity_strength,
			Control::PositionStrength => &mut self.position_strength,
		};
		*slot = value;
		true
	}

	/// Compact JSON form written to `localStorage`.
	pub fn to_json(&self) -> Result<String, StorageError> {
		Ok(serde_json::to_string(self)?)
	}

	/// Tree spacing for a canvas of `viewport` size. The radial radius follows the canvas.
	pub fn tree_params(&self, viewport: (f64, f64)) -> TreeParams {
		TreeParams {
			node_separation: self.node_separation,
			level_separation: self.level_separation,
			radius: (viewport.0.min(viewport.1) / 2.0 - 100.0).max(self.level_separation),
		}
	}

	/// Forces for `mode`. Only the disjoint layout uses gravity and position.
	pub fn force_params(&self, mode: LayoutMode) -> ForceParams {
		let disjoint = mode == LayoutMode::DisjointForce;
		ForceParams {
			link_distance: self.link_distance,
			charge_strength: self.charge_strength,
			center_strength: self.center_strength,
			collision_radius: self.collision_radius,
			position_strength: disjoint.then_some(self.position_strength),
			gravity_strength: disjoint.then_some(self.gravity_strength),
		}
	}

	fn storage_key(mode: LayoutMode) -> String {
		format!("channel-graph.settings.{}", mode.as_str())
	}

	/// Reads the settings for `mode` from `localStorage`, falling back to defaults.
	pub fn load(mode: LayoutMode) -> Self {
		let stored = local_storage()
			.ok()
			.and_then(|s| s.get_item(&Self::storage_key(mode)).ok().flatten());
		match stored {
			Some(text) => Self::from_json(mode, &text),
			None => Self::for_mode(mode),
		}
	}

	/// Writes the settings for `mode` to `localStorage`.
	pub fn save(&self, mode: LayoutMode) -> Result<(), StorageError> {
		let text = self.to_json()?;
		local_storage()?
			.set_item(&Self::storage_key(mode), &text)
			.map_err(|e| StorageError::Unavailable(format!("{e:?}")))
	}
}

fn local_storage() -> Result<web_sys::Storage, StorageError> {
	web_sys::window()
		.and_then(|w| w.local_storage().ok().flatten())
		.ok_or_else(|| StorageError::Unavailable("localStorage".to_string()))
}
