use indexmap::IndexMap;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::schema::geometry::{EdgeShape, NodeBox, Point, edge_geometry, label_position};
use crate::schema::graph::NodeId;
use crate::schema::layout::{HEADER_HEIGHT, PROPERTY_LINE_HEIGHT};
use crate::schema::path_state::path_color;
use crate::schema::uri::shorten_for_display;

use super::state::DiagramState;

const BACKGROUND: &str = "#f7f8fa";
const BOX_FILL: &str = "#ffffff";
const HEADER_FILL: &str = "#e8eef7";
const PLAIN_STROKE: &str = "#8a94a6";
const TEXT: &str = "#1f2933";
const MUTED_TEXT: &str = "#616e7c";
const ARROW_SIZE: f64 = 8.0;

pub fn render(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	let boxes = state.boxes();
	draw_edges(state, &boxes, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn trace(shape: &EdgeShape, ctx: &CanvasRenderingContext2d) {
	ctx.begin_path();
	match shape {
		EdgeShape::Polyline(points) => {
			let mut points = points.iter();
			if let Some(first) = points.next() {
				ctx.move_to(first.x, first.y);
			}
			for p in points {
				ctx.line_to(p.x, p.y);
			}
		}
		EdgeShape::Cubic { start, c1, c2, end } => {
			ctx.move_to(start.x, start.y);
			ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, end.x, end.y);
		}
	}
	ctx.stroke();
}

fn draw_arrow(tip: Point, ctx: &CanvasRenderingContext2d) {
	ctx.begin_path();
	ctx.move_to(tip.x, tip.y);
	ctx.line_to(tip.x - ARROW_SIZE * 0.5, tip.y - ARROW_SIZE);
	ctx.line_to(tip.x + ARROW_SIZE * 0.5, tip.y - ARROW_SIZE);
	ctx.close_path();
	ctx.fill();
}

fn draw_edges(state: &DiagramState, boxes: &IndexMap<NodeId, NodeBox>, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (dash, gap) = (8.0 / k, 4.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);

	// Plain edges first so highlighted ones stay on top.
	let (highlighted, plain): (Vec<_>, Vec<_>) = state
		.edges
		.iter()
		.partition(|e| state.paths.edge_highlight(e).is_some());

	for edge in plain.into_iter().chain(highlighted) {
		let (Some(source), Some(target)) = (boxes.get(&edge.source), boxes.get(&edge.target)) else {
			continue;
		};
		let geometry = edge_geometry(source, target, edge.edge_offset, state.edge_style);
		let highlight = state.paths.edge_highlight(edge);

		let (color, width) = match highlight {
			Some(h) => (path_color(h.color), 2.5),
			None => (PLAIN_STROKE, 1.2),
		};
		ctx.set_stroke_style_str(color);
		ctx.set_fill_style_str(color);
		ctx.set_line_width(width / k.max(0.5));
		if highlight.is_some() {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
		}
		trace(&geometry.shape, ctx);
		let _ = ctx.set_line_dash(&js_sys::Array::new());
		draw_arrow(geometry.arrow_tip, ctx);

		let at = label_position(&geometry, edge.edge_index, edge.edge_count);
		let label = if edge.label.is_empty() {
			shorten_for_display(&edge.property, &state.prefixes)
		} else {
			edge.label.clone()
		};
		ctx.set_font("11px sans-serif");
		ctx.set_text_align("center");
		ctx.set_fill_style_str(if highlight.is_some() { color } else { MUTED_TEXT });
		let _ = ctx.fill_text(&label, at.x, at.y - 3.0);
		ctx.set_text_align("start");
	}
}

fn draw_nodes(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	let width = state.node_width;
	state.graph.visit_nodes(|node| {
		let info = &node.data.user_data;
		let (x, y) = (node.x() as f64, node.y() as f64);
		let highlight = state.paths.node_highlight(&info.id);

		ctx.set_fill_style_str(BOX_FILL);
		ctx.fill_rect(x, y, width, info.height);
		ctx.set_fill_style_str(HEADER_FILL);
		ctx.fill_rect(x, y, width, HEADER_HEIGHT);

		let (stroke, line_width) = match highlight {
			Some(h) if h.is_start => (path_color(h.color), 4.0),
			Some(h) => (path_color(h.color), 2.5),
			None if state.hover == Some(node.index()) => (TEXT, 1.5),
			None => (PLAIN_STROKE, 1.0),
		};
		ctx.set_stroke_style_str(stroke);
		ctx.set_line_width(line_width);
		ctx.stroke_rect(x, y, width, info.height);

		ctx.set_fill_style_str(TEXT);
		ctx.set_font("bold 12px sans-serif");
		let _ = ctx.fill_text_with_max_width(&info.label, x + 8.0, y + 18.0, width - 16.0);

		ctx.set_fill_style_str(MUTED_TEXT);
		ctx.set_font("11px sans-serif");
		let mut row_y = y + HEADER_HEIGHT + PROPERTY_LINE_HEIGHT - 4.0;
		for property in &info.properties {
			let _ = ctx.fill_text_with_max_width(property, x + 8.0, row_y, width - 16.0);
			row_y += PROPERTY_LINE_HEIGHT;
		}
		if info.hidden_properties > 0 {
			let _ = ctx.fill_text(&format!("+{} more", info.hidden_properties), x + 8.0, row_y);
		}
	});
}
