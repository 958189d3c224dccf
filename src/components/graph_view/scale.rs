//! Zoom-dependent scaling of node, edge and adornment visuals.
//!
//! # Coordinate Spaces
//!
//! - **World-space**: layout coordinates. Sizes here grow when zooming in.
//! - **Screen-space**: canvas pixels. Sizes here stay fixed at every zoom level.
//!
//! Drawing happens after the view transform is applied, so every value
//! [`ScaledValues`] hands out is in world-space.

/// How a size reacts to the zoom level `k`.
#[derive(Clone, Debug)]
pub enum ScaleBehavior {
	/// Constant world-space size.
	World,
	/// Constant screen-space size.
	Screen,
	/// World-space size, kept within `[min_screen, max_screen]` pixels.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// World-space value for `base` at zoom `k`.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// How opacity reacts to the zoom level.
#[derive(Clone, Debug)]
pub enum AlphaBehavior {
	/// Always fully opaque.
	Constant,
	/// Invisible at or below `zero_alpha_k`, opaque at or above `full_alpha_k`.
	Fade { zero_alpha_k: f64, full_alpha_k: f64 },
}

impl AlphaBehavior {
	/// Opacity at zoom `k`.
	pub fn apply(&self, k: f64) -> f64 {
		match self {
			AlphaBehavior::Constant => 1.0,
			AlphaBehavior::Fade {
				zero_alpha_k,
				full_alpha_k,
			} => {
				if zero_alpha_k == full_alpha_k {
					return 1.0;
				}
				((k - zero_alpha_k) / (full_alpha_k - zero_alpha_k)).clamp(0.0, 1.0)
			}
		}
	}
}

/// Base sizes and zoom behaviour of every drawn element.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	/// Node radius as a share of the configured node size.
	pub node_radius_factor: f64,
	/// How the node radius reacts to zoom.
	pub node_behavior: ScaleBehavior,
	/// Extra pick tolerance around a node, in screen pixels.
	pub hit_padding: f64,
	/// Label font size in screen pixels.
	pub label_size: f64,
	/// How label opacity reacts to zoom.
	pub label_alpha: AlphaBehavior,
	/// Edge width in screen pixels.
	pub line_width: f64,
	/// How the edge width reacts to zoom.
	pub line_behavior: ScaleBehavior,
	/// Arrow head length in world units.
	pub arrow_size: f64,
	/// How arrow heads react to zoom.
	pub arrow_behavior: ScaleBehavior,
	/// Font size of child-count and status badges in screen pixels.
	pub badge_size: f64,
	/// How badge opacity reacts to zoom.
	pub badge_alpha: AlphaBehavior,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node_radius_factor: 0.5,
			node_behavior: ScaleBehavior::Clamped {
				min_screen: 3.0,
				max_screen: f64::INFINITY,
			},
			hit_padding: 4.0,
			label_size: 12.0,
			label_alpha: AlphaBehavior::Fade {
				zero_alpha_k: 0.25,
				full_alpha_k: 0.5,
			},
			line_width: 1.5,
			line_behavior: ScaleBehavior::Screen,
			arrow_size: 8.0,
			arrow_behavior: ScaleBehavior::World,
			badge_size: 10.0,
			badge_alpha: AlphaBehavior::Constant,
		}
	}
}

/// Scale values for one frame. All sizes are world-space.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	/// Node circle radius.
	pub node_radius: f64,
	/// Pick radius for pointer hits.
	pub hit_radius: f64,
	/// CSS font for node labels.
	pub label_font: String,
	/// Label opacity.
	pub label_alpha: f64,
	/// Edge stroke width.
	pub line_width: f64,
	/// Arrow head length.
	pub arrow_size: f64,
	/// CSS font for badges.
	pub badge_font: String,
	/// Badge opacity.
	pub badge_alpha: f64,
}

impl ScaledValues {
	/// Values for zoom `k` and the configured node size.
	pub fn new(config: &ScaleConfig, k: f64, node_size: f64) -> Self {
		let node_radius = config
			.node_behavior
			.apply(node_size * config.node_radius_factor, k);
		Self {
			node_radius,
			hit_radius: node_radius + config.hit_padding / k,
			label_font: format!("{}px sans-serif", config.label_size / k),
			label_alpha: config.label_alpha.apply(k),
			line_width: config.line_behavior.apply(config.line_width, k),
			arrow_size: config.arrow_behavior.apply(config.arrow_size, k),
			badge_font: format!("bold {}px sans-serif", config.badge_size / k),
			badge_alpha: config.badge_alpha.apply(k),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clamped_radius_keeps_minimum_screen_size() {
		let config = ScaleConfig::default();
		let near = ScaledValues::new(&config, 1.0, 22.0);
		let far = ScaledValues::new(&config, 0.1, 22.0);

		assert_eq!(near.node_radius, 11.0);
		assert!((far.node_radius * 0.1 - 3.0).abs() < 1e-9);
		assert!(far.hit_radius > far.node_radius);
	}

	#[test]
	fn labels_fade_out_when_zoomed_out() {
		let config = ScaleConfig::default();
		assert_eq!(ScaledValues::new(&config, 0.2, 22.0).label_alpha, 0.0);
		assert_eq!(ScaledValues::new(&config, 1.0, 22.0).label_alpha, 1.0);
	}
}
