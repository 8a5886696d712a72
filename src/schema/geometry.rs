//! Edge routing between class boxes.
//!
//! Paths leave the bottom-centre of the source and end just above the
//! top-centre of the target. Parallel and antiparallel edges are pushed
//! apart by their layout offset so neither lines nor labels overlap.

use serde::{Deserialize, Serialize};

use super::graph::Node;

/// Horizontal distance between neighbouring edges of one node-pair group.
pub const EDGE_SPACING: f64 = 14.0;
/// Gap left between the path end and the target box for the arrowhead.
pub const ARROW_CLEARANCE: f64 = 8.0;
/// How far a back edge swings out past the boxes it avoids.
pub const BACK_EDGE_MARGIN: f64 = 30.0;
pub const LABEL_LINE_HEIGHT: f64 = 14.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeStyle {
	#[default]
	Orthogonal,
	Curved,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeBox {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl NodeBox {
	pub fn of(node: &Node, width: f64) -> Self {
		Self {
			x: node.x,
			y: node.y,
			width,
			height: node.height,
		}
	}

	pub fn center_x(&self) -> f64 {
		self.x + self.width / 2.0
	}

	pub fn bottom(&self) -> f64 {
		self.y + self.height
	}

	pub fn right(&self) -> f64 {
		self.x + self.width
	}

	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum EdgeShape {
	Polyline(Vec<Point>),
	Cubic {
		start: Point,
		c1: Point,
		c2: Point,
		end: Point,
	},
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeGeometry {
	pub shape: EdgeShape,
	/// Where the arrowhead touches the target box.
	pub arrow_tip: Point,
	pub back_edge: bool,
}

impl EdgeGeometry {
	pub fn start(&self) -> Point {
		match &self.shape {
			EdgeShape::Polyline(points) => points.first().copied().unwrap_or_default(),
			EdgeShape::Cubic { start, .. } => *start,
		}
	}

	pub fn end(&self) -> Point {
		match &self.shape {
			EdgeShape::Polyline(points) => points.last().copied().unwrap_or_default(),
			EdgeShape::Cubic { end, .. } => *end,
		}
	}

	/// Point halfway along the path, where labels anchor.
	pub fn midpoint(&self) -> Point {
		match &self.shape {
			EdgeShape::Polyline(points) => polyline_midpoint(points),
			EdgeShape::Cubic { start, c1, c2, end } => cubic_at(*start, *c1, *c2, *end, 0.5),
		}
	}
}

fn cubic_at(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
	let u = 1.0 - t;
	let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
	Point::new(
		a * p0.x + b * p1.x + c * p2.x + d * p3.x,
		a * p0.y + b * p1.y + c * p2.y + d * p3.y,
	)
}

fn polyline_midpoint(points: &[Point]) -> Point {
	let lengths: Vec<f64> = points
		.windows(2)
		.map(|w| ((w[1].x - w[0].x).powi(2) + (w[1].y - w[0].y).powi(2)).sqrt())
		.collect();
	let mut remaining = lengths.iter().sum::<f64>() / 2.0;
	for (w, len) in points.windows(2).zip(&lengths) {
		if remaining <= *len && *len > 0.0 {
			let t = remaining / len;
			return Point::new(w[0].x + (w[1].x - w[0].x) * t, w[0].y + (w[1].y - w[0].y) * t);
		}
		remaining -= len;
	}
	points.first().copied().unwrap_or_default()
}

/// Distinct non-negative lane for every signed offset: 0, 1, -1, 2, -2 map
/// to 0, 2, 1, 4, 3.
fn back_edge_lane(edge_offset: i32) -> u32 {
	if edge_offset >= 0 {
		edge_offset.unsigned_abs() * 2
	} else {
		edge_offset.unsigned_abs() * 2 - 1
	}
}

/// Route one edge. `edge_offset` comes from
/// [`assign_edge_offsets`](super::layout::assign_edge_offsets).
pub fn edge_geometry(
	source: &NodeBox,
	target: &NodeBox,
	edge_offset: i32,
	style: EdgeStyle,
) -> EdgeGeometry {
	let shift = f64::from(edge_offset) * EDGE_SPACING;
	let start = Point::new(source.center_x() + shift, source.bottom());
	let arrow_tip = Point::new(target.center_x() + shift, target.y);
	let end = Point::new(arrow_tip.x, target.y - ARROW_CLEARANCE);
	let back_edge = target.y <= source.bottom();

	let shape = if back_edge {
		// Swing out to the right of both boxes, one lane per offset.
		let lane = f64::from(back_edge_lane(edge_offset)) * EDGE_SPACING;
		let side_x = source.right().max(target.right()) + BACK_EDGE_MARGIN + lane;
		let below = source.bottom() + BACK_EDGE_MARGIN / 2.0 + lane / 2.0;
		let above = target.y - BACK_EDGE_MARGIN / 2.0 - lane / 2.0;
		match style {
			EdgeStyle::Orthogonal => EdgeShape::Polyline(vec![
				start,
				Point::new(start.x, below),
				Point::new(side_x, below),
				Point::new(side_x, above),
				Point::new(end.x, above),
				end,
			]),
			EdgeStyle::Curved => EdgeShape::Cubic {
				start,
				c1: Point::new(side_x + BACK_EDGE_MARGIN, below + BACK_EDGE_MARGIN),
				c2: Point::new(side_x + BACK_EDGE_MARGIN, above - BACK_EDGE_MARGIN),
				end,
			},
		}
	} else {
		match style {
			EdgeStyle::Orthogonal => {
				let mid_y = (start.y + end.y) / 2.0 + shift / 2.0;
				EdgeShape::Polyline(vec![
					start,
					Point::new(start.x, mid_y),
					Point::new(end.x, mid_y),
					end,
				])
			}
			EdgeStyle::Curved => {
				let pull = ((end.y - start.y) / 2.0).max(40.0);
				EdgeShape::Cubic {
					start,
					c1: Point::new(start.x, start.y + pull),
					c2: Point::new(end.x, end.y - pull),
					end,
				}
			}
		}
	};

	EdgeGeometry {
		shape,
		arrow_tip,
		back_edge,
	}
}

/// Label anchor: path midpoint, stacked vertically inside a node-pair group.
pub fn label_position(geometry: &EdgeGeometry, edge_index: usize, edge_count: usize) -> Point {
	let mid = geometry.midpoint();
	let stack = edge_index as f64 - edge_count as f64 / 2.0;
	let stack = if edge_count > 1 { stack } else { 0.0 };
	Point::new(mid.x, mid.y + stack * LABEL_LINE_HEIGHT)
}
