//! Canvas drawing of a [`Scene`].
//!
//! Rendering uses several passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Edge curves, then arrow heads (world space)
//! 3. Nodes, then badges, adornments and labels on top

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::coordinator::{Scene, SceneNode};
use super::geometry::{EdgePath, Point};
use super::scale::{ScaleConfig, ScaledValues};
use super::theme::Theme;

/// Renders the complete scene onto a `width` x `height` canvas.
pub fn render(
	scene: &Scene<'_>,
	ctx: &CanvasRenderingContext2d,
	width: f64,
	height: f64,
	config: &ScaleConfig,
	theme: &Theme,
) {
	let t = scene.transform;
	let scale = ScaledValues::new(config, t.k, scene.node_size);

	draw_background(ctx, width, height, theme);

	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);

	draw_edges(scene, ctx, &scale, theme);
	for node in &scene.nodes {
		draw_node(ctx, node, &scale, theme);
	}
	for node in &scene.nodes {
		draw_adornments(ctx, node, &scale, theme);
	}

	ctx.restore();
}

fn draw_background(ctx: &CanvasRenderingContext2d, width: f64, height: f64, theme: &Theme) {
	let bg = &theme.background;
	let gradient = bg
		.use_gradient
		.then(|| {
			ctx.create_radial_gradient(
				width / 2.0,
				height / 2.0,
				0.0,
				width / 2.0,
				height / 2.0,
				width.max(height) * 0.8,
			)
			.ok()
		})
		.flatten();

	match gradient {
		Some(gradient) => {
			let _ = gradient.add_color_stop(0.0, &bg.color_secondary.to_css());
			let _ = gradient.add_color_stop(1.0, &bg.color.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&bg.color.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, width, height);
}

/// Unit direction the curve arrives at its end with.
fn arrival_direction(path: &EdgePath) -> Option<Point> {
	[path.c2, path.c1, path.start].into_iter().find_map(|from| {
		let (dx, dy) = (path.end.x - from.x, path.end.y - from.y);
		let len = dx.hypot(dy);
		(len > 1e-6).then(|| Point::new(dx / len, dy / len))
	})
}

fn draw_edges(scene: &Scene<'_>, ctx: &CanvasRenderingContext2d, scale: &ScaledValues, theme: &Theme) {
	ctx.set_line_width(scale.line_width);

	for edge in scene.edges {
		let p = &edge.path;
		ctx.set_stroke_style_str(&theme.links.get(edge.kind).with_alpha(0.7).to_css());
		ctx.begin_path();
		ctx.move_to(p.start.x, p.start.y);
		ctx.bezier_curve_to(p.c1.x, p.c1.y, p.c2.x, p.c2.y, p.end.x, p.end.y);
		ctx.stroke();
	}

	for edge in scene.edges {
		let Some(u) = arrival_direction(&edge.path) else {
			continue;
		};
		let end = edge.path.end;
		let tip = Point::new(end.x - u.x * scale.node_radius, end.y - u.y * scale.node_radius);
		let back = Point::new(tip.x - u.x * scale.arrow_size, tip.y - u.y * scale.arrow_size);
		let (px, py) = (-u.y * scale.arrow_size * 0.5, u.x * scale.arrow_size * 0.5);

		ctx.set_fill_style_str(&theme.links.get(edge.kind).to_css());
		ctx.begin_path();
		ctx.move_to(tip.x, tip.y);
		ctx.line_to(back.x + px, back.y + py);
		ctx.line_to(back.x - px, back.y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_node(ctx: &CanvasRenderingContext2d, node: &SceneNode<'_>, scale: &ScaledValues, theme: &Theme) {
	let n = node.node;
	let Point { x, y } = n.position;
	let r = scale.node_radius;
	let fill = if n.collapsed {
		theme.collapsed_fill
	} else {
		theme.nodes.get(n.kind)
	};

	ctx.begin_path();
	let _ = ctx.arc(x, y, r, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&fill.to_css());
	ctx.fill();
	ctx.set_stroke_style_str(&theme.nodes.get(n.kind).darken(0.2).to_css());
	ctx.set_line_width(scale.line_width);
	ctx.stroke();

	if node.selected {
		ctx.begin_path();
		let _ = ctx.arc(x, y, r + 4.0 * scale.line_width, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str(&theme.selection.to_css());
		ctx.set_line_width(scale.line_width * 2.0);
		ctx.stroke();
	}
}

fn draw_adornments(
	ctx: &CanvasRenderingContext2d,
	node: &SceneNode<'_>,
	scale: &ScaledValues,
	theme: &Theme,
) {
	let n = node.node;
	let Point { x, y } = n.position;
	let r = scale.node_radius;

	if scale.badge_alpha > 0.0 {
		ctx.set_global_alpha(scale.badge_alpha);
		ctx.set_font(&scale.badge_font);

		if n.visible_children > 0 || n.collapsed {
			let text = if n.collapsed {
				"+".to_string()
			} else {
				n.visible_children.to_string()
			};
			ctx.set_fill_style_str(&theme.nodes.get(n.kind).darken(0.3).to_css());
			let _ = ctx.fill_text(&text, x + r * 0.8, y - r * 0.8);
		}

		if node.has_comment {
			ctx.begin_path();
			let _ = ctx.arc(x - r * 0.8, y - r * 0.8, r * 0.3, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(&theme.comment.to_css());
			ctx.fill();
			ctx.set_stroke_style_str(&theme.node_border.to_css());
			ctx.set_line_width(scale.line_width * 0.5);
			ctx.stroke();
		}

		if let Some(status) = node.status {
			ctx.set_fill_style_str(&theme.statuses.get(status).to_css());
			let _ = ctx.fill_text(status.label(), x - r, y + r * 2.0);
		}
		ctx.set_global_alpha(1.0);
	}

	if scale.label_alpha > 0.0 {
		ctx.set_global_alpha(scale.label_alpha);
		ctx.set_fill_style_str(&theme.label.to_css());
		ctx.set_font(&scale.label_font);
		let _ = ctx.fill_text(&n.name, x + r + 4.0 * scale.line_width, y + r * 0.3);
		ctx.set_global_alpha(1.0);
	}
}
