//! Dataset-level connectivity of a merged graph.
//!
//! Two datasets are linked when they share a class or a relationship. A
//! selection that splits into several islands is rendered one island at a
//! time rather than as one misleading picture.

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};

use super::graph::Graph;

/// Which datasets to draw and which were left out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentSelection {
	pub shown: Vec<String>,
	pub excluded: Vec<String>,
}

impl ComponentSelection {
	pub fn is_partial(&self) -> bool {
		!self.excluded.is_empty()
	}
}

fn link_all<'a>(adjacency: &mut IndexMap<&'a str, IndexSet<&'a str>>, members: &[&'a str]) {
	for pair in members.windows(2) {
		let (a, b) = (pair[0], pair[1]);
		if a == b {
			continue;
		}
		if let Some(n) = adjacency.get_mut(a) {
			n.insert(b);
		}
		if let Some(n) = adjacency.get_mut(b) {
			n.insert(a);
		}
	}
}

/// Partition `active` into connected components, ordered by first member.
pub fn dataset_components(graph: &Graph, active: &[String]) -> Vec<Vec<String>> {
	let mut adjacency: IndexMap<&str, IndexSet<&str>> = active
		.iter()
		.map(|ds| (ds.as_str(), IndexSet::new()))
		.collect();

	let memberships = graph
		.nodes
		.values()
		.map(|n| &n.datasets)
		.chain(graph.edges.iter().map(|e| &e.datasets));
	for datasets in memberships {
		let members: Vec<&str> = datasets
			.iter()
			.map(String::as_str)
			.filter(|ds| adjacency.contains_key(ds))
			.collect();
		link_all(&mut adjacency, &members);
	}

	let mut seen: IndexSet<&str> = IndexSet::new();
	let mut components = Vec::new();
	for start in adjacency.keys().copied() {
		if !seen.insert(start) {
			continue;
		}
		let mut component = vec![start.to_string()];
		let mut queue = VecDeque::from([start]);
		while let Some(current) = queue.pop_front() {
			for &next in &adjacency[current] {
				if seen.insert(next) {
					component.push(next.to_string());
					queue.push_back(next);
				}
			}
		}
		components.push(component);
	}
	components
}

/// Keep the largest component; earlier components win ties.
pub fn select_largest_component(graph: &Graph, active: &[String]) -> ComponentSelection {
	let components = dataset_components(graph, active);
	let Some(best) = components
		.iter()
		.enumerate()
		.max_by(|(ia, a), (ib, b)| a.len().cmp(&b.len()).then(ib.cmp(ia)))
		.map(|(i, _)| i)
	else {
		return ComponentSelection::default();
	};

	let mut selection = ComponentSelection::default();
	for (i, component) in components.into_iter().enumerate() {
		if i == best {
			selection.shown = component;
		} else {
			selection.excluded.extend(component);
		}
	}
	if selection.is_partial() {
		log::warn!(
			"Dataset selection is disconnected; showing {:?}, hiding {:?}",
			selection.shown,
			selection.excluded
		);
	}
	selection
}
