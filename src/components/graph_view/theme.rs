//! Visual theming for the graph view.
//!
//! Colors for each node kind, link kind and deployment status, plus background
//! and adornment styling.

use super::annotations::Status;
use super::types::{LinkKind, NodeKind};

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Alpha in `0.0..=1.0`.
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with alpha.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same color at alpha `a`.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * f) as u8,
			g: (self.g as f64 * f) as u8,
			b: (self.b as f64 * f) as u8,
			a: self.a,
		}
	}

	/// CSS `rgba(...)` string.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Fill color per node kind.
#[derive(Clone, Debug)]
pub struct NodeColors {
	/// Fill for channels.
	pub channel: Color,
	/// Fill for destinations.
	pub destination: Color,
	/// Fill for transformers.
	pub transformer: Color,
	/// Fill for custom nodes.
	pub custom: Color,
	/// Fill for the virtual root.
	pub root: Color,
}

impl NodeColors {
	/// Fill for `kind`.
	pub fn get(&self, kind: NodeKind) -> Color {
		match kind {
			NodeKind::Channel => self.channel,
			NodeKind::Destination => self.destination,
			NodeKind::Transformer => self.transformer,
			NodeKind::Custom => self.custom,
			NodeKind::Root => self.root,
		}
	}
}

/// Stroke and arrow color per link kind.
#[derive(Clone, Debug)]
pub struct LinkColors {
	/// Channel to destination edges.
	pub channel_to_destination: Color,
	/// Destination to transformer edges.
	pub destination_to_transformer: Color,
	/// Every other edge.
	pub other: Color,
}

impl LinkColors {
	/// Stroke for `kind`.
	pub fn get(&self, kind: LinkKind) -> Color {
		match kind {
			LinkKind::ChannelToDestination => self.channel_to_destination,
			LinkKind::DestinationToTransformer => self.destination_to_transformer,
			LinkKind::Other => self.other,
		}
	}
}

/// Badge color per deployment stage.
#[derive(Clone, Debug)]
pub struct StatusColors {
	/// Indexed by stage.
	pub stages: [Color; 5],
}

impl StatusColors {
	/// Badge color for `status`.
	pub fn get(&self, status: Status) -> Color {
		self.stages[status as usize]
	}
}

/// Background style configuration.
#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	/// Solid fill, or the outer gradient stop.
	pub color: Color,
	/// Centre color of the radial gradient.
	pub color_secondary: Color,
	/// Draw a radial gradient instead of a flat fill.
	pub use_gradient: bool,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Display name.
	pub name: &'static str,
	/// Canvas background.
	pub background: BackgroundStyle,
	/// Node fills.
	pub nodes: NodeColors,
	/// Edge strokes.
	pub links: LinkColors,
	/// Status badges.
	pub statuses: StatusColors,
	/// Node outline.
	pub node_border: Color,
	/// Fill of collapsed nodes that hide children.
	pub collapsed_fill: Color,
	/// Label text.
	pub label: Color,
	/// Dot drawn next to nodes that carry a comment.
	pub comment: Color,
	/// Ring around the pending link source.
	pub selection: Color,
}

impl Theme {
	/// White canvas with the classic categorical palette (default).
	pub fn light() -> Self {
		Self {
			name: "light",
			background: BackgroundStyle {
				color: Color::rgb(255, 255, 255),
				color_secondary: Color::rgb(255, 255, 255),
				use_gradient: false,
			},
			nodes: NodeColors {
				channel: Color::rgb(31, 119, 180),
				destination: Color::rgb(255, 127, 14),
				transformer: Color::rgb(44, 160, 44),
				custom: Color::rgb(214, 39, 40),
				root: Color::rgb(148, 103, 189),
			},
			links: LinkColors {
				channel_to_destination: Color::rgb(31, 119, 180),
				destination_to_transformer: Color::rgb(255, 127, 14),
				other: Color::rgb(170, 170, 170),
			},
			statuses: StatusColors {
				stages: [
					Color::rgb(158, 158, 158),
					Color::rgb(33, 150, 243),
					Color::rgb(255, 193, 7),
					Color::rgb(156, 39, 176),
					Color::rgb(76, 175, 80),
				],
			},
			node_border: Color::rgb(255, 255, 255),
			collapsed_fill: Color::rgb(176, 196, 222),
			label: Color::rgb(33, 33, 33),
			comment: Color::rgb(255, 215, 0),
			selection: Color::rgb(229, 57, 53),
		}
	}

	/// Dark canvas with a subtle radial gradient.
	pub fn dark() -> Self {
		let light = Self::light();
		Self {
			name: "dark",
			background: BackgroundStyle {
				color: Color::rgb(22, 27, 34),
				color_secondary: Color::rgb(30, 35, 42),
				use_gradient: true,
			},
			links: LinkColors {
				other: Color::rgba(140, 160, 180, 0.6),
				..light.links
			},
			node_border: Color::rgb(22, 27, 34).lighten(0.1),
			collapsed_fill: Color::rgb(94, 129, 172).darken(0.2),
			label: Color::rgba(255, 255, 255, 0.85),
			..light
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::light()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn css_formats() {
		assert_eq!(Color::rgb(31, 119, 180).to_css(), "#1f77b4");
		assert_eq!(Color::rgb(0, 0, 0).with_alpha(0.5).to_css(), "rgba(0, 0, 0, 0.5)");
	}

	#[test]
	fn palette_covers_every_kind() {
		let theme = Theme::default();
		assert_eq!(theme.nodes.get(NodeKind::Destination).to_css(), "#ff7f0e");
		assert_eq!(theme.statuses.get(Status::Production), theme.statuses.stages[4]);
		assert_ne!(
			theme.links.get(LinkKind::ChannelToDestination),
			theme.links.get(LinkKind::Other)
		);
	}
}
