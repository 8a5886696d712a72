//! One diagram session: loaded coverage, the visible graph and the paths
//! picked on it.

use indexmap::IndexMap;

use super::bubble::render_bubbles;
use super::config::DiagramConfig;
use super::connectivity::{ComponentSelection, select_largest_component};
use super::coverage::{CoverageRow, parse_coverage};
use super::error::Result;
use super::exclude::is_excluded;
use super::graph::{Graph, build_graph};
use super::layout::{LayoutExtent, assign_edge_offsets, compute_layout};
use super::path_finder::PathFinder;
use super::path_state::{Path, PathState};
use super::query::{CompiledQuery, QueryCompiler};
use super::sources::SourceRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
	/// `count` routes added under color group `color`.
	Found { color: usize, count: usize },
	NoPath,
}

pub struct DiagramSession {
	config: DiagramConfig,
	sources: SourceRegistry,
	rows: IndexMap<String, Vec<CoverageRow>>,
	selection: ComponentSelection,
	graph: Graph,
	extent: LayoutExtent,
	paths: PathState,
}

impl DiagramSession {
	pub fn new(config: DiagramConfig, sources: SourceRegistry) -> Self {
		Self {
			config,
			sources,
			rows: IndexMap::new(),
			selection: ComponentSelection::default(),
			graph: Graph::default(),
			extent: LayoutExtent::default(),
			paths: PathState::new(),
		}
	}

	/// Parse and store one dataset's coverage file, replacing any earlier one.
	///
	/// Nothing is rebuilt until the next [`select_datasets`](Self::select_datasets).
	pub fn add_coverage(&mut self, dataset: &str, text: &str) -> Result<usize> {
		let rows = parse_coverage(text, dataset)?;
		let count = rows.len();
		self.rows.insert(dataset.to_string(), rows);
		log::info!("Loaded {count} coverage rows for {dataset}");
		Ok(count)
	}

	/// Datasets with coverage loaded, in load order.
	pub fn datasets(&self) -> impl Iterator<Item = &str> {
		self.rows.keys().map(String::as_str)
	}

	/// Rebuild the visible graph from `active` datasets. Paths are cleared.
	///
	/// Only the largest group of datasets sharing classes is kept; the rest
	/// is reported in [`selection`](Self::selection).
	pub fn select_datasets(&mut self, active: &[String]) -> &ComponentSelection {
		let exclude_enabled = self.config.exclude_boilerplate;
		let exclude = |uri: &str| is_excluded(uri, exclude_enabled);

		let rows: Vec<CoverageRow> = active
			.iter()
			.filter_map(|ds| self.rows.get(ds))
			.flatten()
			.cloned()
			.collect();
		let full = build_graph(&rows, exclude);
		let loaded: Vec<String> = active
			.iter()
			.filter(|ds| self.rows.contains_key(ds.as_str()))
			.cloned()
			.collect();
		self.selection = select_largest_component(&full, &loaded);

		let mut graph = if self.selection.is_partial() {
			let kept: Vec<CoverageRow> = rows
				.into_iter()
				.filter(|r| self.selection.shown.contains(&r.source_dataset))
				.collect();
			build_graph(&kept, exclude)
		} else {
			full
		};

		self.extent = compute_layout(&mut graph, &self.config.layout);
		assign_edge_offsets(&mut graph.edges);
		self.graph = graph;
		self.paths.clear_paths();
		&self.selection
	}

	/// Search between two classes and keep every route found as one group.
	pub fn find_paths(&mut self, start: &str, end: &str) -> SearchOutcome {
		let limits = &self.config.search;
		let routes = PathFinder::new(&self.graph).search(
			start,
			end,
			limits.mode,
			limits.max_depth,
			limits.max_paths,
		);
		let count = routes.len();
		let from = self.graph.label(start);
		let to = self.graph.label(end);
		match self.paths.add_path_group(routes, &from, &to) {
			Some(color) => SearchOutcome::Found { color, count },
			None => {
				log::info!("No path found between {from} and {to}");
				SearchOutcome::NoPath
			}
		}
	}

	pub fn remove_path(&mut self, index: usize) -> Option<Path> {
		self.paths.remove_path(index)
	}

	pub fn clear_paths(&mut self) {
		self.paths.clear_paths();
	}

	pub fn compile_query(&self) -> CompiledQuery {
		QueryCompiler::new(&self.sources, self.config.query.clone())
			.with_graph(&self.graph)
			.compile_detailed(self.paths.routes(), &self.selection.shown)
	}

	pub fn query(&self) -> String {
		self.compile_query().text
	}

	pub fn bubbles(&self) -> String {
		render_bubbles(self.paths.paths(), &self.graph)
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	pub fn path_state(&self) -> &PathState {
		&self.paths
	}

	pub fn selection(&self) -> &ComponentSelection {
		&self.selection
	}

	pub fn extent(&self) -> LayoutExtent {
		self.extent
	}

	pub fn config(&self) -> &DiagramConfig {
		&self.config
	}

	/// Replace the settings. Layout-affecting changes apply on the next
	/// [`select_datasets`](Self::select_datasets).
	pub fn set_config(&mut self, config: DiagramConfig) {
		self.config = config;
	}

	pub fn sources(&self) -> &SourceRegistry {
		&self.sources
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::query::NO_PATHS_QUERY;
	use crate::schema::sources::DatasetSource;
	use pretty_assertions::assert_eq;

	const DS1: &str = "subject_uri,property_uri,object_uri,occurrence_count\n\
		http://ex.org/A,http://ex.org/p,http://ex.org/B,3\n\
		http://ex.org/B,http://ex.org/q,http://ex.org/C,2\n";
	const DS2: &str = "subject_uri,property_uri,object_uri,occurrence_count\n\
		http://ex.org/X,http://ex.org/r,http://ex.org/Y,1\n";

	fn session() -> DiagramSession {
		let mut sources = SourceRegistry::new();
		sources.insert("ds1", DatasetSource::endpoint("https://one.example/sparql"));
		let mut session = DiagramSession::new(DiagramConfig::default(), sources);
		session.add_coverage("ds1", DS1).unwrap();
		session.add_coverage("ds2", DS2).unwrap();
		session
	}

	fn active(v: &[&str]) -> Vec<String> {
		v.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn test_disconnected_dataset_is_reported() {
		let mut session = session();
		let selection = session.select_datasets(&active(&["ds1", "ds2"])).clone();

		assert_eq!(selection.shown, active(&["ds1"]));
		assert_eq!(selection.excluded, active(&["ds2"]));
		assert_eq!(session.graph().node_count(), 3);
		assert!(session.graph().node("http://ex.org/X").is_none());
	}

	#[test]
	fn test_find_query_and_clear() {
		let mut session = session();
		session.select_datasets(&active(&["ds1"]));
		assert_eq!(session.query(), NO_PATHS_QUERY);

		let outcome = session.find_paths("http://ex.org/C", "http://ex.org/A");
		assert_eq!(outcome, SearchOutcome::Found { color: 0, count: 1 });
		assert!(session.query().contains("?a <http://ex.org/p> ?b ."));
		assert!(session.bubbles().starts_with("Path 1/1: C → A"));

		assert_eq!(
			session.find_paths("http://ex.org/A", "http://ex.org/missing"),
			SearchOutcome::NoPath
		);
		assert_eq!(session.path_state().next_color_index(), 1);

		session.clear_paths();
		assert!(session.path_state().is_empty());
		assert_eq!(session.query(), NO_PATHS_QUERY);
	}

	#[test]
	fn test_reselecting_datasets_drops_paths() {
		let mut session = session();
		session.select_datasets(&active(&["ds1"]));
		session.find_paths("http://ex.org/A", "http://ex.org/B");
		session.select_datasets(&active(&["ds1"]));

		assert!(session.path_state().is_empty());
		assert!(session.graph().nodes.values().all(|n| n.x > 0.0 && n.height > 0.0));
	}

	#[test]
	fn test_extent_covers_every_laid_out_box() {
		let mut session = session();
		assert_eq!(session.extent(), LayoutExtent::default());

		session.select_datasets(&active(&["ds1"]));
		let (extent, width) = (session.extent(), session.config().layout.node_width);
		assert!(extent.width >= session.config().layout.container_width);
		assert!(
			session
				.graph()
				.nodes
				.values()
				.all(|n| n.x + width <= extent.width && n.y + n.height <= extent.height)
		);
	}

	#[test]
	fn test_bad_coverage_is_an_error() {
		let mut session = DiagramSession::new(DiagramConfig::default(), SourceRegistry::new());
		assert!(session.add_coverage("bad", "foo,bar\n1,2\n").is_err());
		assert_eq!(session.datasets().count(), 0);
	}
}
