use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::highlight::HIGHLIGHT_COLOR;
use super::state::GraphViewContext;

pub const NODE_RADIUS: f64 = 7.0;
const GLOW_BLUR: f64 = 10.0;

pub fn render(state: &GraphViewContext, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#fafafa");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn set_glow(ctx: &CanvasRenderingContext2d, on: bool) {
	if on {
		ctx.set_shadow_color(HIGHLIGHT_COLOR);
		ctx.set_shadow_blur(GLOW_BLUR);
	} else {
		ctx.set_shadow_blur(0.0);
	}
}

fn draw_links(state: &GraphViewContext, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let arrow_size = 8.0 / k.max(0.5);

	for (slot, frame) in state.frame.links.iter().enumerate() {
		if frame.opacity == 0.0 || !frame.pointer_events {
			continue;
		}
		let Some(style) = state.highlight.link_style(slot) else {
			continue;
		};
		let (dx, dy) = (frame.x2 - frame.x1, frame.y2 - frame.y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let (ux, uy) = (dx / dist, dy / dist);

		ctx.set_global_alpha(frame.opacity);
		set_glow(ctx, style.glow);
		ctx.set_stroke_style_str(&style.stroke);
		ctx.set_line_width(style.stroke_width / k.max(0.5));
		ctx.begin_path();
		ctx.move_to(frame.x1 + ux * NODE_RADIUS, frame.y1 + uy * NODE_RADIUS);
		ctx.line_to(
			frame.x2 - ux * (NODE_RADIUS + arrow_size),
			frame.y2 - uy * (NODE_RADIUS + arrow_size),
		);
		ctx.stroke();

		let color = state
			.highlight
			.markers
			.get(style.marker)
			.map(|m| m.color)
			.unwrap_or(style.stroke.as_str());
		ctx.set_fill_style_str(color);
		let (tip_x, tip_y) = (frame.x2 - ux * NODE_RADIUS, frame.y2 - uy * NODE_RADIUS);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	set_glow(ctx, false);
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &GraphViewContext, ctx: &CanvasRenderingContext2d) {
	let Some(graph) = state.graph.as_ref() else {
		return;
	};
	let k = state.transform.k;

	for (slot, frame) in state.frame.nodes.iter().enumerate() {
		if frame.opacity == 0.0 {
			continue;
		}
		let (Some(node), Some(style)) = (graph.nodes.get(slot), state.highlight.node_style(slot))
		else {
			continue;
		};

		ctx.set_global_alpha(frame.opacity);
		set_glow(ctx, style.glow);
		ctx.begin_path();
		let _ = ctx.arc(frame.x, frame.y, NODE_RADIUS, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.org_color.as_deref().unwrap_or(&node.rank_color));
		ctx.fill();
		ctx.set_stroke_style_str(&style.stroke);
		ctx.set_line_width(style.stroke_width / k.max(0.5));
		ctx.stroke();
		set_glow(ctx, false);

		let hovered = state.hovered == Some(frame.id);
		if k > 0.6 || hovered || state.highlight.is_node_highlighted(frame.id) {
			ctx.set_fill_style_str("#222222");
			ctx.set_font(&format!("{}px sans-serif", 11.0 / k.max(0.5)));
			let _ = ctx.fill_text(&node.name, frame.x + NODE_RADIUS + 3.0, frame.y + 3.0);
		}
	}
	ctx.set_global_alpha(1.0);
}
