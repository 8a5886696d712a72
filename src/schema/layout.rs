//! Deterministic hierarchical placement.
//!
//! Roots are the classes nothing points at. Each node is placed under the
//! first root whose depth-first descent reaches it, so cycles are broken by
//! placement order; the resulting forest says nothing about the data beyond
//! "reachable from here".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::graph::{Edge, Graph, Node};

pub const PADDING: f64 = 40.0;
pub const HORIZONTAL_GAP: f64 = 60.0;
pub const BASE_LEVEL_GAP: f64 = 180.0;
pub const HEADER_HEIGHT: f64 = 28.0;
pub const PROPERTY_LINE_HEIGHT: f64 = 16.0;
const BOX_BOTTOM_PADDING: f64 = 6.0;
/// Extra slots between neighbouring top-level trees.
const TREE_SEPARATION: f64 = 1.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
	pub node_width: f64,
	pub container_width: f64,
	pub container_height: f64,
	pub x_spacing: f64,
	pub y_spacing: f64,
}

impl Default for LayoutOptions {
	fn default() -> Self {
		Self {
			node_width: 180.0,
			container_width: 1200.0,
			container_height: 800.0,
			x_spacing: 1.0,
			y_spacing: 1.0,
		}
	}
}

/// Size of the laid-out drawing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutExtent {
	pub width: f64,
	pub height: f64,
}

/// Box height for a class: header plus one row per shown property.
pub fn node_height(node: &Node) -> f64 {
	let overflow = usize::from(node.property_total > node.properties.len());
	HEADER_HEIGHT + (node.properties.len() + overflow) as f64 * PROPERTY_LINE_HEIGHT + BOX_BOTTOM_PADDING
}

struct Forest {
	roots: Vec<usize>,
	children: Vec<Vec<usize>>,
	depth: Vec<Option<usize>>,
}

fn find_roots(n: usize, out: &[Vec<usize>], in_degree: &[usize]) -> Vec<usize> {
	let roots: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
	if !roots.is_empty() {
		return roots;
	}
	// Every node sits on a cycle: seed from the busiest nodes instead.
	let mut by_out: Vec<usize> = (0..n).collect();
	by_out.sort_by(|&a, &b| out[b].len().cmp(&out[a].len()));
	by_out.truncate(n.div_ceil(5));
	by_out
}

fn build_forest(n: usize, out: &[Vec<usize>], seeds: Vec<usize>) -> Forest {
	let mut forest = Forest {
		roots: Vec::new(),
		children: vec![Vec::new(); n],
		depth: vec![None; n],
	};
	let mut visited = vec![false; n];

	// Seeds first, then anything no seed reached.
	let entries = seeds.into_iter().chain(0..n);
	for root in entries {
		if visited[root] {
			continue;
		}
		visited[root] = true;
		forest.depth[root] = Some(0);
		forest.roots.push(root);

		let mut stack = vec![(root, 0usize)];
		while let Some(frame) = stack.last_mut() {
			let (node, cursor) = *frame;
			let Some(&child) = out[node].get(cursor) else {
				stack.pop();
				continue;
			};
			frame.1 += 1;
			if visited[child] {
				continue;
			}
			visited[child] = true;
			forest.depth[child] = forest.depth[node].map(|d| d + 1);
			forest.children[node].push(child);
			stack.push((child, 0));
		}
	}
	forest
}

/// Tidy-tree slots: leaves take consecutive slots, parents centre over children.
fn assign_slots(forest: &Forest, n: usize) -> Vec<Option<f64>> {
	let mut slots = vec![None; n];
	let mut next_slot = 0.0;

	for (t, &root) in forest.roots.iter().enumerate() {
		if t > 0 {
			next_slot += TREE_SEPARATION;
		}
		let mut preorder = Vec::new();
		let mut stack = vec![root];
		while let Some(node) = stack.pop() {
			preorder.push(node);
			stack.extend(forest.children[node].iter().rev());
		}
		for &node in &preorder {
			if forest.children[node].is_empty() {
				slots[node] = Some(next_slot);
				next_slot += 1.0;
			}
		}
		for &node in preorder.iter().rev() {
			let kids = &forest.children[node];
			if let (Some(&first), Some(&last)) = (kids.first(), kids.last()) {
				if let (Some(a), Some(b)) = (slots[first], slots[last]) {
					slots[node] = Some((a + b) / 2.0);
				}
			}
		}
	}
	slots
}

/// Place every node of `graph`; returns the drawing extent.
///
/// Width grows past the container when the widest level needs it; height
/// always fits the container.
pub fn compute_layout(graph: &mut Graph, opts: &LayoutOptions) -> LayoutExtent {
	let n = graph.nodes.len();
	if n == 0 {
		return LayoutExtent::default();
	}

	let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
	let mut in_degree = vec![0usize; n];
	for edge in &graph.edges {
		let (Some(s), Some(t)) = (
			graph.nodes.get_index_of(&edge.source),
			graph.nodes.get_index_of(&edge.target),
		) else {
			continue;
		};
		if !out[s].contains(&t) {
			out[s].push(t);
			in_degree[t] += 1;
		}
	}

	let roots = find_roots(n, &out, &in_degree);
	let forest = build_forest(n, &out, roots);
	let slots = assign_slots(&forest, n);

	let heights: Vec<f64> = graph.nodes.values().map(node_height).collect();
	let tallest = heights.iter().copied().fold(0.0, f64::max);
	let levels = forest.depth.iter().flatten().max().map_or(1, |d| d + 1);
	let slot_count = slots.iter().flatten().fold(0.0f64, |m, s| m.max(*s)) + 1.0;

	let slot_width = (opts.node_width + HORIZONTAL_GAP) * opts.x_spacing;
	let content_width = slot_count * slot_width - HORIZONTAL_GAP * opts.x_spacing;
	let inner_width = opts.container_width - 2.0 * PADDING;
	let x_offset = PADDING + ((inner_width - content_width) / 2.0).max(0.0);

	let available = (opts.container_height - 2.0 * PADDING - tallest).max(0.0);
	let level_gap = if levels > 1 {
		(BASE_LEVEL_GAP * opts.y_spacing).min(available / (levels - 1) as f64)
	} else {
		0.0
	};

	for (i, node) in graph.nodes.values_mut().enumerate() {
		node.height = heights[i];
		let (x, y) = match (slots[i], forest.depth[i]) {
			(Some(slot), Some(depth)) => (
				x_offset + slot * slot_width,
				PADDING + depth as f64 * level_gap,
			),
			_ => (PADDING, PADDING),
		};
		node.x = if x.is_finite() { x } else { PADDING };
		node.y = if y.is_finite() { y } else { PADDING };
	}

	let extent = LayoutExtent {
		width: opts.container_width.max(content_width + 2.0 * PADDING),
		height: opts.container_height,
	};
	log::debug!(
		"Laid out {n} classes on {levels} levels in {:.0}x{:.0}",
		extent.width,
		extent.height
	);
	extent
}

/// Rank edges inside their node-pair group and centre each group around 0.
///
/// `A -> B` and `B -> A` share a group.
pub fn assign_edge_offsets(edges: &mut [Edge]) {
	let mut sizes: HashMap<(String, String), usize> = HashMap::new();
	for edge in edges.iter() {
		let (a, b) = edge.pair_key();
		*sizes.entry((a.to_string(), b.to_string())).or_default() += 1;
	}

	let mut ranks: HashMap<(String, String), usize> = HashMap::new();
	for edge in edges.iter_mut() {
		let key = {
			let (a, b) = edge.pair_key();
			(a.to_string(), b.to_string())
		};
		let count = sizes.get(&key).copied().unwrap_or(1);
		let rank = ranks.entry(key).or_default();
		edge.edge_index = *rank;
		edge.edge_count = count;
		edge.edge_offset = *rank as i32 - (count / 2) as i32;
		*rank += 1;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::graph::build_graph;
	use crate::schema::graph::tests::row;

	fn layout(rows: &[crate::schema::coverage::CoverageRow]) -> Graph {
		let mut graph = build_graph(rows, |_| false);
		compute_layout(&mut graph, &LayoutOptions::default());
		graph
	}

	#[test]
	fn test_empty_graph_is_noop() {
		let mut graph = Graph::default();
		assert_eq!(
			compute_layout(&mut graph, &LayoutOptions::default()),
			LayoutExtent::default()
		);
	}

	#[test]
	fn test_chain_descends_levels() {
		let graph = layout(&[row("A", "p", "B", 1, "d"), row("B", "q", "C", 1, "d")]);
		let (a, b, c) = (
			graph.node("A").unwrap(),
			graph.node("B").unwrap(),
			graph.node("C").unwrap(),
		);

		assert!(a.y < b.y && b.y < c.y);
		assert_eq!(a.x, b.x);
		assert_eq!(b.x, c.x);
		assert!(c.y + c.height <= LayoutOptions::default().container_height);
	}

	#[test]
	fn test_siblings_do_not_overlap_and_parent_is_centred() {
		let graph = layout(&[
			row("Root", "p", "Left", 1, "d"),
			row("Root", "q", "Right", 1, "d"),
		]);
		let (root, left, right) = (
			graph.node("Root").unwrap(),
			graph.node("Left").unwrap(),
			graph.node("Right").unwrap(),
		);

		assert_eq!(left.y, right.y);
		assert!(right.x - left.x >= LayoutOptions::default().node_width);
		assert!((root.x - (left.x + right.x) / 2.0).abs() < 1e-9);
	}

	#[test]
	fn test_separate_trees_leave_one_empty_slot() {
		let graph = layout(&[row("A", "p", "B", 1, "d"), row("X", "q", "Y", 1, "d")]);
		let opts = LayoutOptions::default();
		let slot_width = (opts.node_width + HORIZONTAL_GAP) * opts.x_spacing;

		let gap = graph.node("Y").unwrap().x - graph.node("B").unwrap().x;
		assert!((gap - 2.0 * slot_width).abs() < 1e-9);
	}

	#[test]
	fn test_pure_cycle_places_every_node() {
		let graph = layout(&[
			row("A", "p", "B", 1, "d"),
			row("B", "p", "C", 1, "d"),
			row("C", "p", "A", 1, "d"),
		]);

		for node in graph.nodes.values() {
			assert!(node.x.is_finite() && node.y.is_finite());
		}
		let ys: Vec<f64> = graph.nodes.values().map(|n| n.y).collect();
		assert!(ys[0] < ys[1] && ys[1] < ys[2]);
	}

	#[test]
	fn test_wide_levels_expand_past_container() {
		let rows: Vec<_> = (0..20)
			.map(|i| row("Hub", &format!("p{i}"), &format!("Leaf{i}"), 1, "d"))
			.collect();
		let mut graph = build_graph(&rows, |_| false);
		let extent = compute_layout(&mut graph, &LayoutOptions::default());

		assert!(extent.width > LayoutOptions::default().container_width);
		assert_eq!(extent.height, LayoutOptions::default().container_height);
	}

	#[test]
	fn test_three_parallel_edges_are_centred() {
		let mut graph = build_graph(
			&[
				row("A", "p1", "B", 1, "d"),
				row("B", "p2", "A", 1, "d"),
				row("A", "p3", "B", 1, "d"),
				row("A", "p4", "C", 1, "d"),
			],
			|_| false,
		);
		assign_edge_offsets(&mut graph.edges);

		let mut offsets: Vec<i32> = graph.edges[..3].iter().map(|e| e.edge_offset).collect();
		offsets.sort();
		assert_eq!(offsets, vec![-1, 0, 1]);
		assert!(graph.edges[..3].iter().all(|e| e.edge_count == 3));
		assert_eq!(graph.edges[1].edge_index, 1);
		assert_eq!(graph.edges[3].edge_offset, 0);
		assert_eq!(graph.edges[3].edge_count, 1);
	}
}
