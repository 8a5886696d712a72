//! Accumulated paths and the highlight maps derived from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::graph::{Edge, NodeId};
use super::path_finder::EdgePath;

/// Colors handed out to successive path groups.
pub const PATH_COLORS: &[&str] = &[
	"#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#42d4f4", "#f032e6", "#9a6324",
	"#469990", "#808000",
];

pub fn path_color(index: usize) -> &'static str {
	PATH_COLORS[index % PATH_COLORS.len()]
}

/// One accumulated route. Immutable once added.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
	pub route: EdgePath,
	pub color_index: usize,
	/// 1-based position inside its color group.
	pub path_number: usize,
	pub total_paths: usize,
	pub from_label: String,
	pub to_label: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeHighlight {
	pub color: usize,
	pub is_start: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeHighlight {
	pub color: usize,
}

fn pair_key(a: &str, b: &str) -> String {
	format!("{a}|{b}")
}

fn property_key(edge: &Edge) -> String {
	format!("{}|{}|{}", edge.source, edge.target, edge.property)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathState {
	paths: Vec<Path>,
	next_color_index: usize,
	highlighted_nodes: BTreeMap<NodeId, NodeHighlight>,
	highlighted_edges: BTreeMap<String, EdgeHighlight>,
}

impl PathState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn paths(&self) -> &[Path] {
		&self.paths
	}

	pub fn is_empty(&self) -> bool {
		self.paths.is_empty()
	}

	pub fn next_color_index(&self) -> usize {
		self.next_color_index
	}

	pub fn highlighted_nodes(&self) -> &BTreeMap<NodeId, NodeHighlight> {
		&self.highlighted_nodes
	}

	pub fn highlighted_edges(&self) -> &BTreeMap<String, EdgeHighlight> {
		&self.highlighted_edges
	}

	/// Routes of every accumulated path, in order.
	pub fn routes(&self) -> impl Iterator<Item = &EdgePath> {
		self.paths.iter().map(|p| &p.route)
	}

	/// Append every route found by one search under a single fresh color.
	///
	/// An empty group consumes no color and returns `None`.
	pub fn add_path_group(&mut self, routes: Vec<EdgePath>, from_label: &str, to_label: &str) -> Option<usize> {
		if routes.is_empty() {
			return None;
		}
		let color_index = self.next_color_index;
		self.next_color_index += 1;

		let total_paths = routes.len();
		self.paths
			.extend(routes.into_iter().enumerate().map(|(i, route)| Path {
				route,
				color_index,
				path_number: i + 1,
				total_paths,
				from_label: from_label.to_string(),
				to_label: to_label.to_string(),
			}));
		self.rebuild_highlight_maps();
		Some(color_index)
	}

	pub fn remove_path(&mut self, index: usize) -> Option<Path> {
		if index >= self.paths.len() {
			return None;
		}
		let removed = self.paths.remove(index);
		if self.paths.is_empty() {
			self.clear_paths();
		} else {
			self.rebuild_highlight_maps();
		}
		Some(removed)
	}

	/// Drop every path of one color group.
	pub fn remove_group(&mut self, color_index: usize) -> usize {
		let before = self.paths.len();
		self.paths.retain(|p| p.color_index != color_index);
		let removed = before - self.paths.len();
		if self.paths.is_empty() {
			self.clear_paths();
		} else if removed > 0 {
			self.rebuild_highlight_maps();
		}
		removed
	}

	pub fn clear_paths(&mut self) {
		self.paths.clear();
		self.next_color_index = 0;
		self.highlighted_nodes.clear();
		self.highlighted_edges.clear();
	}

	/// Recompute both highlight maps from `paths`. The first path to touch a
	/// node or pair keeps its color.
	pub fn rebuild_highlight_maps(&mut self) {
		let mut nodes = BTreeMap::new();
		let mut edges = BTreeMap::new();

		for path in &self.paths {
			let color = path.color_index;
			for (i, id) in path.route.nodes.iter().enumerate() {
				nodes.entry(id.clone()).or_insert(NodeHighlight {
					color,
					is_start: i == 0,
				});
			}
			for (from, to, edge) in path.route.steps() {
				edges
					.entry(pair_key(from, to))
					.or_insert(EdgeHighlight { color });
				edges
					.entry(pair_key(to, from))
					.or_insert(EdgeHighlight { color });
				if !edge.property.is_empty() {
					edges
						.entry(property_key(edge))
						.or_insert(EdgeHighlight { color });
				}
			}
		}

		self.highlighted_nodes = nodes;
		self.highlighted_edges = edges;
	}

	pub fn node_highlight(&self, id: &str) -> Option<&NodeHighlight> {
		self.highlighted_nodes.get(id)
	}

	/// Highlight of this exact edge; other edges of the same pair stay plain.
	pub fn edge_highlight(&self, edge: &Edge) -> Option<&EdgeHighlight> {
		if edge.property.is_empty() {
			return self.pair_highlight(&edge.source, &edge.target);
		}
		self.highlighted_edges.get(&property_key(edge))
	}

	/// Highlight of any path step between `a` and `b`.
	pub fn pair_highlight(&self, a: &str, b: &str) -> Option<&EdgeHighlight> {
		self.highlighted_edges.get(&pair_key(a, b))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::graph::{Graph, build_graph};
	use crate::schema::graph::tests::row;
	use crate::schema::path_finder::PathFinder;
	use pretty_assertions::assert_eq;

	fn graph() -> Graph {
		build_graph(
			&[
				row("A", "p1", "B", 1, "d"),
				row("A", "p2", "B", 1, "d"),
				row("B", "q", "C", 1, "d"),
			],
			|_| false,
		)
	}

	fn routes(graph: &Graph, from: &str, to: &str) -> Vec<EdgePath> {
		let finder = PathFinder::new(graph);
		let nodes = finder.shortest_path(from, to).unwrap();
		finder.expand_to_edge_paths(&nodes)
	}

	#[test]
	fn test_group_shares_color_and_numbers_paths() {
		let graph = graph();
		let mut state = PathState::new();
		let color = state.add_path_group(routes(&graph, "A", "C"), "A", "C");

		assert_eq!(color, Some(0));
		assert_eq!(state.paths().len(), 2);
		assert_eq!(state.paths()[1].path_number, 2);
		assert!(state.paths().iter().all(|p| p.total_paths == 2 && p.color_index == 0));
		assert_eq!(state.next_color_index(), 1);
		assert_eq!(state.add_path_group(Vec::new(), "A", "C"), None);
		assert_eq!(state.next_color_index(), 1);
	}

	#[test]
	fn test_first_path_wins_node_color() {
		let graph = graph();
		let mut state = PathState::new();
		state.add_path_group(routes(&graph, "A", "B"), "A", "B");
		state.add_path_group(routes(&graph, "C", "B"), "C", "B");

		assert_eq!(
			state.node_highlight("B"),
			Some(&NodeHighlight {
				color: 0,
				is_start: false
			})
		);
		assert_eq!(
			state.node_highlight("C"),
			Some(&NodeHighlight {
				color: 1,
				is_start: true
			})
		);
	}

	#[test]
	fn test_edge_specific_and_pair_lookups() {
		let graph = graph();
		let finder = PathFinder::new(&graph);
		let only_p2 = finder
			.expand_to_edge_paths(&["A".to_string(), "B".to_string()])
			.into_iter()
			.filter(|p| p.edges[0].property == "p2")
			.collect();
		let mut state = PathState::new();
		state.add_path_group(only_p2, "A", "B");

		assert!(state.edge_highlight(&graph.edges[0]).is_none());
		assert!(state.edge_highlight(&graph.edges[1]).is_some());
		assert!(state.pair_highlight("B", "A").is_some());
		assert!(state.pair_highlight("B", "C").is_none());
	}

	#[test]
	fn test_rebuild_is_idempotent() {
		let graph = graph();
		let mut state = PathState::new();
		state.add_path_group(routes(&graph, "A", "C"), "A", "C");
		let before = state.clone();
		state.rebuild_highlight_maps();
		state.rebuild_highlight_maps();

		assert_eq!(state, before);
		assert_eq!(
			serde_json::to_string(state.highlighted_edges()).unwrap(),
			serde_json::to_string(before.highlighted_edges()).unwrap()
		);
	}

	#[test]
	fn test_removing_every_path_resets_state() {
		let graph = graph();
		let mut state = PathState::new();
		state.add_path_group(routes(&graph, "A", "C"), "A", "C");
		state.add_path_group(routes(&graph, "B", "C"), "B", "C");

		assert!(state.remove_path(99).is_none());
		while !state.is_empty() {
			state.remove_path(0);
		}
		assert_eq!(state, PathState::new());
	}

	#[test]
	fn test_remove_group() {
		let graph = graph();
		let mut state = PathState::new();
		state.add_path_group(routes(&graph, "A", "C"), "A", "C");
		state.add_path_group(routes(&graph, "B", "C"), "B", "C");

		assert_eq!(state.remove_group(0), 2);
		assert_eq!(state.paths().len(), 1);
		assert_eq!(state.next_color_index(), 2);
		assert_eq!(state.node_highlight("B").map(|h| h.color), Some(1));
	}
}
