//! Canvas rendering for the topology editor.
//!
//! Draws in three passes for correct z-ordering:
//! 1. Background grid
//! 2. Links (curves, labels, arc handles)
//! 3. Nodes, with selection and pending-connect outlines on top

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::drag::DragSession;
use super::interaction::{InteractionMode, Selection};
use super::layout::{CurveGeometry, link_curves};
use super::state::TopologyEditorState;
use super::theme::{Color, Theme};
use super::types::{NodeKind, TopologyLink, TopologyNode};

const GRID_STEP: f64 = 40.0;
const LABEL_FONT: &str = "12px sans-serif";
const SMALL_FONT: &str = "10px sans-serif";

/// Renders the complete editor to the canvas.
pub fn render(state: &TopologyEditorState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	draw_background(state, ctx, theme);
	draw_links(state, ctx, theme);
	draw_nodes(state, ctx, theme);
}

fn draw_background(state: &TopologyEditorState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	ctx.set_fill_style_str(&theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	ctx.set_stroke_style_str(&theme.grid.to_css());
	ctx.set_line_width(1.0);
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.begin_path();
	let mut x = GRID_STEP;
	while x < state.width {
		ctx.move_to(x, 0.0);
		ctx.line_to(x, state.height);
		x += GRID_STEP;
	}
	let mut y = GRID_STEP;
	while y < state.height {
		ctx.move_to(0.0, y);
		ctx.line_to(state.width, y);
		y += GRID_STEP;
	}
	ctx.stroke();
}

fn draw_links(state: &TopologyEditorState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let selected = match state.interaction.selection() {
		Some(Selection::Link(id)) => Some(id.as_str()),
		_ => None,
	};
	let dragging = match state.drag.session() {
		Some(DragSession::Arc { link_id, .. }) => Some(link_id.as_str()),
		_ => None,
	};
	let show_handles = state.interaction.mode() == InteractionMode::Select;

	for curve in link_curves(&state.graph, &state.config.curve) {
		let Some(link) = state.graph.find_link(&curve.link_id) else {
			continue;
		};
		let is_selected = selected == Some(link.id.as_str()) || dragging == Some(link.id.as_str());
		draw_curve(ctx, theme, link, &curve.geometry, is_selected);
		draw_link_labels(ctx, theme, link, &curve.geometry);

		if show_handles && link.kind.has_editable_arc() {
			let style = theme.link_style(link.kind);
			let m = curve.geometry.midpoint;
			ctx.begin_path();
			let _ = ctx.arc(m.x, m.y, state.config.curve.handle_radius, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(&style.color.to_css());
			ctx.fill();
			ctx.set_stroke_style_str(&theme.handle.with_alpha(if is_selected { 1.0 } else { 0.6 }).to_css());
			ctx.set_line_width(1.5);
			ctx.stroke();
		}
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_curve(
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	link: &TopologyLink,
	curve: &CurveGeometry,
	selected: bool,
) {
	let style = theme.link_style(link.kind);

	if selected {
		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_stroke_style_str(&theme.selection.with_alpha(0.35).to_css());
		ctx.set_line_width(style.width * 4.0);
		trace_curve(ctx, curve);
		ctx.stroke();
	}

	match style.dash {
		Some((dash, gap)) => {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
		}
		None => {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}
	}
	ctx.set_stroke_style_str(&style.color.to_css());
	ctx.set_line_width(style.width);
	trace_curve(ctx, curve);
	ctx.stroke();
}

fn trace_curve(ctx: &CanvasRenderingContext2d, curve: &CurveGeometry) {
	ctx.begin_path();
	ctx.move_to(curve.start.x, curve.start.y);
	ctx.quadratic_curve_to(curve.control.x, curve.control.y, curve.end.x, curve.end.y);
}

fn draw_link_labels(
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	link: &TopologyLink,
	curve: &CurveGeometry,
) {
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	if let Some(label) = &link.label {
		let m = curve.midpoint;
		ctx.set_font(LABEL_FONT);
		ctx.set_fill_style_str(&theme.label.to_css());
		// Sit just above the handle so the two never overlap.
		let _ = ctx.fill_text(label, m.x, m.y - 14.0);
	}

	ctx.set_font(SMALL_FONT);
	ctx.set_fill_style_str(&theme.endpoint_label.to_css());
	for (text, t) in [(&link.source_label, 0.2), (&link.target_label, 0.8)] {
		if let Some(text) = text {
			let p = curve.point_at(t);
			let _ = ctx.fill_text(text, p.x, p.y - 8.0);
		}
	}
}

fn draw_nodes(state: &TopologyEditorState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let selected = match state.interaction.selection() {
		Some(Selection::Node(id)) => Some(id.as_str()),
		_ => None,
	};
	let pending = state.interaction.first_selected_for_link();
	let dragged = state.drag.dragged_node();

	for node in state.graph.nodes() {
		let outline = if pending == Some(node.id.as_str()) {
			Some(theme.pending)
		} else if selected == Some(node.id.as_str()) {
			Some(theme.selection)
		} else {
			None
		};
		let alpha = if dragged == Some(node.id.as_str()) { 0.85 } else { 1.0 };
		draw_node(state, ctx, theme, node, outline, alpha);
	}
}

fn draw_node(
	state: &TopologyEditorState,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	node: &TopologyNode,
	outline: Option<Color>,
	alpha: f64,
) {
	let extent = state.config.extents.for_kind(node.kind);
	let (x, y) = (node.position.x, node.position.y);
	let (w, h) = (extent.half_width * 2.0, extent.half_height * 2.0);
	let radius = match node.kind {
		NodeKind::Network => extent.half_height,
		_ => 8.0,
	};
	let base = theme.node_fill(node.kind, node.color.as_deref());

	ctx.set_global_alpha(alpha);

	let gradient = ctx.create_linear_gradient(x, y - extent.half_height, x, y + extent.half_height);
	let _ = gradient.add_color_stop(0.0, &base.lighten(0.25).to_css());
	let _ = gradient.add_color_stop(1.0, &base.darken(0.15).to_css());
	rounded_rect(ctx, x - extent.half_width, y - extent.half_height, w, h, radius);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();

	let _ = ctx.set_line_dash(&js_sys::Array::new());
	match outline {
		Some(color) => {
			ctx.set_stroke_style_str(&color.to_css());
			ctx.set_line_width(3.0);
		}
		None => {
			ctx.set_stroke_style_str(&base.darken(0.4).to_css());
			ctx.set_line_width(1.0);
		}
	}
	ctx.stroke();

	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str(&theme.label.to_css());
	ctx.set_font(LABEL_FONT);
	match node.asn {
		Some(asn) if node.kind == NodeKind::Daemon => {
			let _ = ctx.fill_text_with_max_width(&node.label, x, y - 7.0, w - 8.0);
			ctx.set_font(SMALL_FONT);
			let _ = ctx.fill_text(&format!("AS{}", asn), x, y + 10.0);
		}
		_ => {
			let _ = ctx.fill_text_with_max_width(&node.label, x, y, w - 8.0);
		}
	}

	ctx.set_global_alpha(1.0);
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	let r = r.min(w / 2.0).min(h / 2.0);
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}
