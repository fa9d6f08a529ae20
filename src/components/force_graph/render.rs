use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::camera::Projected;
use super::color::with_alpha;
use super::frame::{EdgeFrame, FrameSnapshot, NodeFrame};
use super::lod::Material;
use super::state::{ForceGraphState, NODE_RADIUS};
use super::style::Marker;
use crate::config::GraphTheme;

const ARROW_SIZE: f64 = 7.0;

/// Draw a snapshot. Projection happens here, after styles were resolved.
pub fn render(state: &ForceGraphState, frame: &FrameSnapshot, ctx: &CanvasRenderingContext2d) {
	let theme = &state.config().theme;
	ctx.set_fill_style_str(&theme.background);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	let projected: Vec<Option<Projected>> = frame
		.nodes
		.iter()
		.map(|n| frame.camera.project(n.position, state.width, state.height))
		.collect();

	for edge in &frame.edges {
		if let (Some(a), Some(b)) = (projected[edge.source], projected[edge.target]) {
			draw_edge(edge, a, b, ctx);
		}
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	// Far nodes first.
	let mut order: Vec<usize> = (0..frame.nodes.len())
		.filter(|&i| projected[i].is_some())
		.collect();
	order.sort_by(|&a, &b| {
		let (da, db) = (projected[a].map_or(0.0, |p| p.depth), projected[b].map_or(0.0, |p| p.depth));
		db.total_cmp(&da)
	});
	for i in order {
		if let (Some(node), Some(p)) = (frame.nodes.get(i), projected[i]) {
			draw_node(state, node, p, theme, ctx);
		}
	}
	ctx.set_global_alpha(1.0);
}

fn dash_array(dash: Option<[f64; 2]>) -> js_sys::Array {
	match dash {
		Some([on, off]) => js_sys::Array::of2(&JsValue::from_f64(on), &JsValue::from_f64(off)),
		None => js_sys::Array::new(),
	}
}

fn draw_edge(edge: &EdgeFrame, a: Projected, b: Projected, ctx: &CanvasRenderingContext2d) {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let style = &edge.style;
	let (ra, rb) = (NODE_RADIUS * a.scale, NODE_RADIUS * b.scale);
	let (ux, uy) = (dx / dist, dy / dist);
	let color = with_alpha(&style.stroke, style.stroke_opacity);

	ctx.set_stroke_style_str(&color);
	ctx.set_line_width(style.stroke_width);
	let _ = ctx.set_line_dash(&dash_array(style.dash));
	ctx.begin_path();
	ctx.move_to(a.x + ux * ra, a.y + uy * ra);
	ctx.line_to(b.x - ux * (rb + ARROW_SIZE), b.y - uy * (rb + ARROW_SIZE));
	ctx.stroke();

	let _ = ctx.set_line_dash(&js_sys::Array::new());
	let (tip_x, tip_y) = (b.x - ux * rb, b.y - uy * rb);
	let (back_x, back_y) = (tip_x - ux * ARROW_SIZE, tip_y - uy * ARROW_SIZE);
	let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	match style.marker {
		Marker::ArrowSolid => {
			ctx.set_fill_style_str(&color);
			ctx.fill();
		}
		Marker::ArrowDashed => ctx.stroke(),
	}
}

fn draw_node(
	state: &ForceGraphState,
	node: &NodeFrame,
	p: Projected,
	theme: &GraphTheme,
	ctx: &CanvasRenderingContext2d,
) {
	let settings = node.lod.settings();
	let style = &node.style;
	let radius = (style.size * p.scale).max(1.0);

	ctx.set_global_alpha(style.opacity);
	ctx.begin_path();
	let _ = ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI);
	match settings.material {
		Material::Phong => {
			// Off-centre highlight stands in for a lit sphere.
			let (hx, hy) = (p.x - radius * 0.35, p.y - radius * 0.35);
			match ctx.create_radial_gradient(hx, hy, radius * 0.1, p.x, p.y, radius) {
				Ok(gradient) => {
					let _ = gradient.add_color_stop(0.0, "#FFFFFF");
					let _ = gradient.add_color_stop(0.35, &style.fill);
					let _ = gradient.add_color_stop(1.0, &with_alpha(&style.fill, 0.85));
					#[allow(deprecated)]
					ctx.set_fill_style(&gradient);
				}
				Err(_) => ctx.set_fill_style_str(&style.fill),
			}
		}
		Material::Basic => ctx.set_fill_style_str(&style.fill),
	}
	ctx.fill();

	if let Some(border) = &style.border_color {
		ctx.set_stroke_style_str(border);
		ctx.set_line_width(style.border_width);
		let _ = ctx.set_line_dash(&dash_array(style.border_dash));
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());
	}

	if style.highlighted && settings.show_highlight_ring {
		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, radius + 3.0, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str(&with_alpha(&theme.ring_color, 0.7));
		ctx.set_line_width(1.5);
		ctx.stroke();
	}

	if settings.show_label {
		if let Some(data) = state.node(node.index) {
			ctx.set_fill_style_str(&with_alpha(&theme.label_color, 0.85));
			ctx.set_font(&format!("{}px {}", theme.font_px, theme.font_family));
			let _ = ctx.fill_text(&data.label, p.x + radius + 3.0, p.y + 3.0);
		}
	}
	ctx.set_global_alpha(1.0);
}
