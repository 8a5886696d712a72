//! Class multi-graph assembled from coverage rows.

use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::coverage::CoverageRow;

/// Class URI, or [`UNKNOWN_NODE`](super::coverage::UNKNOWN_NODE).
pub type NodeId = String;

/// Distinct property labels kept on a node for display.
pub const MAX_DISPLAY_PROPERTIES: usize = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	pub id: NodeId,
	pub label: String,
	pub datasets: Vec<String>,
	/// First [`MAX_DISPLAY_PROPERTIES`] property labels seen with this class as subject.
	pub properties: Vec<String>,
	/// Distinct property labels before capping.
	pub property_total: usize,
	pub in_degree: usize,
	pub out_degree: usize,
	pub x: f64,
	pub y: f64,
	pub height: f64,
}

impl Node {
	pub fn degree(&self) -> usize {
		self.in_degree + self.out_degree
	}
}

/// One `(source, target, property)` relationship. Several edges may join the
/// same pair of classes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	pub source: NodeId,
	pub target: NodeId,
	pub property: String,
	pub label: String,
	pub datasets: Vec<String>,
	pub occurrences: u64,
	pub edge_offset: i32,
	pub edge_index: usize,
	pub edge_count: usize,
}

impl Edge {
	/// Unordered node-pair key shared by `A -> B` and `B -> A` edges.
	pub fn pair_key(&self) -> (&str, &str) {
		if self.source <= self.target {
			(self.source.as_str(), self.target.as_str())
		} else {
			(self.target.as_str(), self.source.as_str())
		}
	}

	/// Whether this edge joins `a` and `b`, in either direction.
	pub fn connects(&self, a: &str, b: &str) -> bool {
		(self.source == a && self.target == b) || (self.source == b && self.target == a)
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
	pub nodes: IndexMap<NodeId, Node>,
	pub edges: Vec<Edge>,
}

impl Graph {
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.get(id)
	}

	pub fn label(&self, id: &str) -> String {
		self.nodes
			.get(id)
			.map(|n| n.label.clone())
			.unwrap_or_else(|| super::uri::local_name(id).to_string())
	}

	/// Every edge joining `a` and `b`, either direction, in edge order.
	pub fn edges_between<'a>(&'a self, a: &'a str, b: &'a str) -> impl Iterator<Item = &'a Edge> {
		self.edges.iter().filter(move |e| e.connects(a, b))
	}

	/// Dataset labels in first-sight order.
	pub fn datasets(&self) -> Vec<String> {
		let mut seen = IndexSet::new();
		for node in self.nodes.values() {
			seen.extend(node.datasets.iter().cloned());
		}
		for edge in &self.edges {
			seen.extend(edge.datasets.iter().cloned());
		}
		seen.into_iter().collect()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}
}

#[derive(Default)]
struct NodeBuilder {
	label: String,
	datasets: IndexSet<String>,
	properties: IndexSet<String>,
	in_degree: usize,
	out_degree: usize,
}

struct EdgeBuilder {
	label: String,
	datasets: IndexSet<String>,
	occurrences: u64,
}

fn upsert_node<'m>(
	nodes: &'m mut IndexMap<NodeId, NodeBuilder>,
	uri: &str,
	label: &str,
) -> &'m mut NodeBuilder {
	nodes.entry(uri.to_string()).or_insert_with(|| NodeBuilder {
		label: label.to_string(),
		..NodeBuilder::default()
	})
}

/// Fold coverage rows into a graph, skipping classes rejected by `exclude`.
///
/// Degrees count every row that produced an edge use, not just unique edges.
pub fn build_graph<F>(rows: &[CoverageRow], exclude: F) -> Graph
where
	F: Fn(&str) -> bool,
{
	let mut nodes: IndexMap<NodeId, NodeBuilder> = IndexMap::new();
	let mut edges: IndexMap<(NodeId, NodeId, String), EdgeBuilder> = IndexMap::new();

	for row in rows {
		if row.subject_uri.is_empty() || row.object_uri.is_empty() {
			continue;
		}
		let subject_excluded = exclude(&row.subject_uri);
		let object_excluded = exclude(&row.object_uri);

		if !subject_excluded {
			let node = upsert_node(&mut nodes, &row.subject_uri, &row.subject_label);
			node.datasets.insert(row.source_dataset.clone());
			node.properties.insert(row.property_label.clone());
		}
		if !object_excluded {
			let node = upsert_node(&mut nodes, &row.object_uri, &row.object_label);
			node.datasets.insert(row.source_dataset.clone());
		}

		if subject_excluded || object_excluded || row.subject_uri == row.object_uri {
			continue;
		}

		let key = (
			row.subject_uri.clone(),
			row.object_uri.clone(),
			row.property_uri.clone(),
		);
		match edges.entry(key) {
			Entry::Occupied(mut entry) => {
				let edge = entry.get_mut();
				edge.datasets.insert(row.source_dataset.clone());
				edge.occurrences += row.occurrence_count;
			}
			Entry::Vacant(entry) => {
				entry.insert(EdgeBuilder {
					label: row.property_label.clone(),
					datasets: IndexSet::from([row.source_dataset.clone()]),
					occurrences: row.occurrence_count,
				});
			}
		}

		if let Some(source) = nodes.get_mut(&row.subject_uri) {
			source.out_degree += 1;
		}
		if let Some(target) = nodes.get_mut(&row.object_uri) {
			target.in_degree += 1;
		}
	}

	let nodes: IndexMap<NodeId, Node> = nodes
		.into_iter()
		.map(|(id, b)| {
			let property_total = b.properties.len();
			let node = Node {
				id: id.clone(),
				label: b.label,
				datasets: b.datasets.into_iter().collect(),
				properties: b
					.properties
					.into_iter()
					.take(MAX_DISPLAY_PROPERTIES)
					.collect(),
				property_total,
				in_degree: b.in_degree,
				out_degree: b.out_degree,
				x: 0.0,
				y: 0.0,
				height: 0.0,
			};
			(id, node)
		})
		.collect();

	let edges: Vec<Edge> = edges
		.into_iter()
		.map(|((source, target, property), b)| Edge {
			source,
			target,
			property,
			label: b.label,
			datasets: b.datasets.into_iter().collect(),
			occurrences: b.occurrences,
			edge_offset: 0,
			edge_index: 0,
			edge_count: 1,
		})
		.collect();

	log::info!(
		"Built schema graph: {} classes, {} relationships",
		nodes.len(),
		edges.len()
	);

	Graph { nodes, edges }
}
