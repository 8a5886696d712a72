//! Route discovery between two classes.
//!
//! Connectivity is direction-agnostic: edges are walked either way while
//! exploring. The concrete edges kept in each [`EdgePath`] still carry their
//! own direction, which query synthesis relies on.

use std::collections::{HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::graph::{Edge, Graph, NodeId};

pub const DEFAULT_MAX_PATHS: usize = 50;
pub const DEFAULT_MAX_DEPTH: usize = 6;

/// A route expressed as the concrete edges used between consecutive nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgePath {
	pub nodes: Vec<NodeId>,
	pub edges: Vec<Edge>,
}

impl EdgePath {
	pub fn start(&self) -> Option<&str> {
		self.nodes.first().map(String::as_str)
	}

	pub fn end(&self) -> Option<&str> {
		self.nodes.last().map(String::as_str)
	}

	/// `(from, to, edge)` for every step in traversal order.
	pub fn steps(&self) -> impl Iterator<Item = (&str, &str, &Edge)> {
		self.nodes
			.windows(2)
			.zip(&self.edges)
			.map(|(pair, edge)| (pair[0].as_str(), pair[1].as_str(), edge))
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchMode {
	#[default]
	Shortest,
	All,
}

pub struct PathFinder<'g> {
	graph: &'g Graph,
	adjacency: IndexMap<&'g str, IndexSet<&'g str>>,
}

impl<'g> PathFinder<'g> {
	pub fn new(graph: &'g Graph) -> Self {
		let mut adjacency: IndexMap<&str, IndexSet<&str>> = graph
			.nodes
			.keys()
			.map(|id| (id.as_str(), IndexSet::new()))
			.collect();
		for edge in &graph.edges {
			if let Some(n) = adjacency.get_mut(edge.source.as_str()) {
				n.insert(edge.target.as_str());
			}
			if let Some(n) = adjacency.get_mut(edge.target.as_str()) {
				n.insert(edge.source.as_str());
			}
		}
		Self { graph, adjacency }
	}

	fn neighbors(&self, id: &str) -> impl Iterator<Item = &'g str> + '_ {
		self.adjacency
			.get(id)
			.into_iter()
			.flat_map(|n| n.iter().copied())
	}

	fn is_searchable(&self, start: &str, end: &str) -> bool {
		start != end && self.adjacency.contains_key(start) && self.adjacency.contains_key(end)
	}

	/// Breadth-first shortest node sequence, endpoints included.
	pub fn shortest_path(&self, start: &str, end: &str) -> Option<Vec<NodeId>> {
		if !self.is_searchable(start, end) {
			return None;
		}
		let mut parent: IndexMap<&str, &str> = IndexMap::new();
		let mut seen: HashSet<&str> = HashSet::from([start]);
		let mut queue = VecDeque::from([start]);

		while let Some(current) = queue.pop_front() {
			for next in self.neighbors(current) {
				if !seen.insert(next) {
					continue;
				}
				parent.insert(next, current);
				if next == end {
					let mut path = vec![end.to_string()];
					let mut cursor = end;
					while let Some(&prev) = parent.get(cursor) {
						path.push(prev.to_string());
						cursor = prev;
					}
					path.reverse();
					return Some(path);
				}
				queue.push_back(next);
			}
		}
		None
	}

	/// Every simple route up to `max_depth` nodes long, at most `max_paths` of them.
	///
	/// Exponential on dense graphs; the caps are the only bound.
	pub fn all_paths(&self, start: &str, end: &str, max_paths: usize, max_depth: usize) -> Vec<Vec<NodeId>> {
		let mut found = Vec::new();
		if !self.is_searchable(start, end) || max_paths == 0 || max_depth < 2 {
			return found;
		}
		let mut current = vec![start];
		let mut on_path: HashSet<&str> = HashSet::from([start]);
		self.descend(end, max_paths, max_depth, &mut current, &mut on_path, &mut found);
		found
	}

	fn descend<'a>(
		&self,
		end: &str,
		max_paths: usize,
		max_depth: usize,
		current: &mut Vec<&'a str>,
		on_path: &mut HashSet<&'a str>,
		found: &mut Vec<Vec<NodeId>>,
	) where
		'g: 'a,
	{
		let Some(&tail) = current.last() else {
			return;
		};
		for next in self.neighbors(tail) {
			if found.len() >= max_paths {
				return;
			}
			if on_path.contains(next) {
				continue;
			}
			if next == end {
				let mut path: Vec<NodeId> = current.iter().map(|s| s.to_string()).collect();
				path.push(next.to_string());
				found.push(path);
				continue;
			}
			if current.len() + 1 >= max_depth {
				continue;
			}
			current.push(next);
			on_path.insert(next);
			self.descend(end, max_paths, max_depth, current, on_path, found);
			on_path.remove(next);
			current.pop();
		}
	}

	/// Every concrete edge sequence that realises `node_path`.
	///
	/// With `k` edges between some consecutive pair the result multiplies by `k`.
	pub fn expand_to_edge_paths(&self, node_path: &[NodeId]) -> Vec<EdgePath> {
		self.expand_limited(node_path, usize::MAX)
	}

	fn expand_limited(&self, node_path: &[NodeId], limit: usize) -> Vec<EdgePath> {
		if node_path.len() < 2 || limit == 0 {
			return Vec::new();
		}
		let choices: Vec<Vec<&Edge>> = node_path
			.windows(2)
			.map(|pair| self.graph.edges_between(&pair[0], &pair[1]).collect())
			.collect();
		if choices.iter().any(Vec::is_empty) {
			return Vec::new();
		}

		let mut combos: Vec<Vec<&Edge>> = vec![Vec::new()];
		for options in &choices {
			let mut next = Vec::new();
			'outer: for prefix in &combos {
				for &edge in options {
					if next.len() >= limit {
						break 'outer;
					}
					let mut combo = prefix.clone();
					combo.push(edge);
					next.push(combo);
				}
			}
			combos = next;
		}

		combos
			.into_iter()
			.map(|edges| EdgePath {
				nodes: node_path.to_vec(),
				edges: edges.into_iter().cloned().collect(),
			})
			.collect()
	}

	/// Search and expand in one go, stopping after `limit` edge paths.
	pub fn search(&self, start: &str, end: &str, mode: SearchMode, max_depth: usize, limit: usize) -> Vec<EdgePath> {
		let node_paths = match mode {
			SearchMode::Shortest => self.shortest_path(start, end).into_iter().collect(),
			SearchMode::All => self.all_paths(start, end, limit, max_depth),
		};

		let mut edge_paths = Vec::new();
		for node_path in &node_paths {
			let room = limit.saturating_sub(edge_paths.len());
			if room == 0 {
				break;
			}
			edge_paths.extend(self.expand_limited(node_path, room));
		}
		log::debug!(
			"{mode:?} search {start} -> {end}: {} node paths, {} edge paths",
			node_paths.len(),
			edge_paths.len()
		);
		edge_paths
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::graph::build_graph;
	use crate::schema::graph::tests::row;
	use pretty_assertions::assert_eq;

	fn ids(v: &[&str]) -> Vec<NodeId> {
		v.iter().map(|s| s.to_string()).collect()
	}

	fn diamond() -> Graph {
		build_graph(
			&[
				row("A", "p", "B", 1, "d"),
				row("A", "p", "C", 1, "d"),
				row("B", "p", "D", 1, "d"),
				row("D", "p", "C", 1, "d"),
				row("D", "p", "E", 1, "d"),
			],
			|_| false,
		)
	}

	#[test]
	fn test_shortest_path_ignores_direction() {
		let graph = diamond();
		let finder = PathFinder::new(&graph);

		assert_eq!(finder.shortest_path("E", "A"), Some(ids(&["E", "D", "B", "A"])));
		assert_eq!(finder.shortest_path("C", "B"), Some(ids(&["C", "A", "B"])));
	}

	#[test]
	fn test_shortest_path_is_stable() {
		let graph = diamond();
		let finder = PathFinder::new(&graph);
		assert_eq!(finder.shortest_path("A", "D"), finder.shortest_path("A", "D"));
	}

	#[test]
	fn test_no_route_cases() {
		let graph = build_graph(
			&[row("A", "p", "B", 1, "d"), row("X", "p", "Y", 1, "d")],
			|_| false,
		);
		let finder = PathFinder::new(&graph);

		assert_eq!(finder.shortest_path("A", "Y"), None);
		assert_eq!(finder.shortest_path("A", "A"), None);
		assert_eq!(finder.shortest_path("A", "missing"), None);
		assert!(finder.all_paths("A", "Y", 10, 6).is_empty());
	}

	#[test]
	fn test_all_paths_respects_caps() {
		let graph = diamond();
		let finder = PathFinder::new(&graph);

		let all = finder.all_paths("A", "D", 50, 6);
		assert_eq!(all, vec![ids(&["A", "B", "D"]), ids(&["A", "C", "D"])]);

		assert_eq!(finder.all_paths("A", "D", 1, 6).len(), 1);
		assert!(finder.all_paths("A", "E", 50, 3).is_empty());
		assert_eq!(finder.all_paths("A", "E", 50, 4).len(), 2);
	}

	#[test]
	fn test_expand_multi_edges_into_cartesian_product() {
		let graph = build_graph(
			&[
				row("A", "p1", "B", 1, "d"),
				row("B", "p2", "A", 1, "d"),
				row("B", "q1", "C", 1, "d"),
				row("B", "q2", "C", 1, "d"),
				row("B", "q3", "C", 1, "d"),
			],
			|_| false,
		);
		let finder = PathFinder::new(&graph);
		let paths = finder.expand_to_edge_paths(&ids(&["A", "B", "C"]));

		assert_eq!(paths.len(), 6);
		assert_eq!(paths[0].edges[0].property, "p1");
		assert_eq!(paths[0].edges[1].property, "q1");
		assert_eq!(paths[5].edges[0].property, "p2");
		assert_eq!(paths[5].edges[1].property, "q3");
		assert!(finder.expand_to_edge_paths(&ids(&["A", "C"])).is_empty());
	}

	#[test]
	fn test_search_limits_expansion() {
		let graph = build_graph(
			&[
				row("A", "p1", "B", 1, "d"),
				row("A", "p2", "B", 1, "d"),
				row("A", "p3", "B", 1, "d"),
			],
			|_| false,
		);
		let finder = PathFinder::new(&graph);

		assert_eq!(finder.search("A", "B", SearchMode::Shortest, 6, 2).len(), 2);
		assert_eq!(finder.search("A", "B", SearchMode::All, 6, 50).len(), 3);
	}
}
