use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use indexmap::{IndexMap, IndexSet};

use crate::schema::geometry::{EdgeStyle, NodeBox, Point};
use crate::schema::graph::{Edge, Graph, NodeId};
use crate::schema::layout::LayoutExtent;
use crate::schema::path_state::PathState;
use crate::schema::uri::{PrefixMap, well_known_prefixes};

/// Pointer travel (screen px) below which a press/release counts as a click.
pub const CLICK_SLOP: f64 = 4.0;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: NodeId,
	pub label: String,
	pub properties: Vec<String>,
	/// Property labels not shown on the box.
	pub hidden_properties: usize,
	pub height: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl ViewTransform {
	/// Largest zoom (at most 1) that shows the whole layout, centred.
	pub fn fit(extent: LayoutExtent, width: f64, height: f64) -> Self {
		if extent.width <= 0.0 || extent.height <= 0.0 {
			return Self { x: 0.0, y: 0.0, k: 1.0 };
		}
		let k = (width / extent.width).min(height / extent.height).clamp(0.1, 1.0);
		Self {
			x: (width - extent.width * k) / 2.0,
			y: (height - extent.height * k) / 2.0,
			k,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Everything the canvas needs between frames.
pub struct DiagramState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub edges: Vec<Edge>,
	pub paths: PathState,
	pub edge_style: EdgeStyle,
	pub node_width: f64,
	pub relax: bool,
	/// For edge labels that fall back to the property IRI.
	pub prefixes: PrefixMap,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: Option<DefaultNodeIdx>,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	index: IndexMap<NodeId, DefaultNodeIdx>,
}

fn simulation() -> ForceGraph<NodeInfo, ()> {
	ForceGraph::new(SimulationParameters {
		force_charge: 600.0,
		force_spring: 0.02,
		force_max: 60.0,
		node_speed: 1500.0,
		damping_factor: 0.85,
	})
}

impl DiagramState {
	pub fn new(graph: &Graph, node_width: f64, width: f64, height: f64) -> Self {
		let mut state = Self {
			graph: simulation(),
			edges: Vec::new(),
			paths: PathState::new(),
			edge_style: EdgeStyle::default(),
			node_width,
			relax: false,
			prefixes: well_known_prefixes(),
			transform: ViewTransform {
				x: 0.0,
				y: 0.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: None,
			width,
			height,
			flow_time: 0.0,
			index: IndexMap::new(),
		};
		state.load(graph);
		state
	}

	/// Replace the drawn graph, seeding positions from its layout. The view
	/// transform is kept.
	pub fn load(&mut self, graph: &Graph) {
		let mut sim = simulation();
		let mut index = IndexMap::new();
		for node in graph.nodes.values() {
			let idx = sim.add_node(NodeData {
				x: node.x as f32,
				y: node.y as f32,
				mass: 10.0,
				is_anchor: !self.relax,
				user_data: NodeInfo {
					id: node.id.clone(),
					label: node.label.clone(),
					properties: node.properties.clone(),
					hidden_properties: node.property_total.saturating_sub(node.properties.len()),
					height: node.height,
				},
			});
			index.insert(node.id.clone(), idx);
		}

		let mut linked = IndexSet::new();
		for edge in &graph.edges {
			let (a, b) = edge.pair_key();
			if !linked.insert((a.to_string(), b.to_string())) {
				continue;
			}
			if let (Some(&src), Some(&tgt)) = (index.get(a), index.get(b)) {
				sim.add_edge(src, tgt, EdgeData::default());
			}
		}

		self.graph = sim;
		self.index = index;
		self.edges = graph.edges.clone();
		self.drag = DragState::default();
		self.hover = None;
		log::debug!("Canvas loaded {} classes", self.index.len());
	}

	/// Let the simulation move nodes, or freeze them where they are.
	pub fn set_relax(&mut self, relax: bool) {
		if self.relax == relax {
			return;
		}
		self.relax = relax;
		self.graph.visit_nodes_mut(|node| {
			node.data.is_anchor = !relax;
		});
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Current box of every node, keyed by class id.
	pub fn boxes(&self) -> IndexMap<NodeId, NodeBox> {
		let mut boxes = IndexMap::new();
		self.graph.visit_nodes(|node| {
			let info = &node.data.user_data;
			boxes.insert(
				info.id.clone(),
				NodeBox {
					x: node.x() as f64,
					y: node.y() as f64,
					width: self.node_width,
					height: info.height,
				},
			);
		});
		boxes
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let point = Point::new(gx, gy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let bx = NodeBox {
				x: node.x() as f64,
				y: node.y() as f64,
				width: self.node_width,
				height: node.data.user_data.height,
			};
			if bx.contains(point) {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn node_id(&self, idx: DefaultNodeIdx) -> Option<&NodeId> {
		self.index
			.iter()
			.find(|(_, i)| **i == idx)
			.map(|(id, _)| id)
	}

	pub fn tick(&mut self, dt: f32) {
		if self.relax {
			self.graph.update(dt);
		}
		self.flow_time += dt as f64;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	pub fn fit_to(&mut self, extent: LayoutExtent) {
		self.transform = ViewTransform::fit(extent, self.width, self.height);
	}
}
