//! Federated SPARQL synthesis from accumulated paths.
//!
//! Each relational pattern follows the edge's own `source -> target`
//! direction, whatever order the user clicked the classes in. Patterns are
//! placed on the endpoint (and named graph) of the dataset the edge came
//! from; the first selected endpoint is queried directly and every other one
//! through a `SERVICE` block.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use serde_json::json;

use super::config::{Placement, QueryOptions};
use super::coverage::UNKNOWN_NODE;
use super::graph::{Edge, Graph, NodeId};
use super::path_finder::EdgePath;
use super::sources::SourceRegistry;
use super::uri::{PrefixMap, local_name, sparql_iri, well_known_prefixes};

/// Returned instead of a query when nothing has been selected.
pub const NO_PATHS_QUERY: &str = "# No paths selected";

const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
const DC_TITLE: &str = "http://purl.org/dc/elements/1.1/title";

/// Orientation of a traversal step relative to the edge it used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	Forward,
	Reverse,
}

impl Direction {
	pub fn of(from: &str, to: &str, edge: &Edge) -> Self {
		if edge.source == to && edge.target == from {
			Direction::Reverse
		} else {
			Direction::Forward
		}
	}
}

/// `(subject, object)` of the triple an edge stands for.
///
/// Always the edge's intrinsic direction; `from`/`to` only tell which way
/// the step was walked.
pub fn oriented<'e>(from: &'e str, to: &'e str, edge: &'e Edge) -> (&'e str, &'e str) {
	if !edge.connects(from, to) {
		return (&edge.source, &edge.target);
	}
	match Direction::of(from, to, edge) {
		Direction::Forward => (from, to),
		Direction::Reverse => (to, from),
	}
}

/// Query text plus what each variable stands for.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompiledQuery {
	pub text: String,
	/// Variable name (without `?`) → class id.
	pub variables: IndexMap<String, NodeId>,
	/// Prefixes declared in `text`.
	pub prefixes: PrefixMap,
}

impl CompiledQuery {
	/// SHACL `SPARQLSelectExecutable` description of the query.
	pub fn to_jsonld(&self) -> serde_json::Value {
		json!({
			"@context": {
				"sh": "http://www.w3.org/ns/shacl#",
				"schema": "https://schema.org/",
			},
			"@type": ["sh:SPARQLExecutable", "sh:SPARQLSelectExecutable"],
			"sh:select": self.text,
			"sh:prefixes": self.prefixes,
			"schema:variableMeasured": self.variables,
		})
	}
}

/// Lower-camel variable stem for a class label.
pub fn variable_base(label: &str) -> String {
	let name = if label.contains("://") {
		local_name(label)
	} else {
		label.rsplit_once(':').map_or(label, |(_, local)| local)
	};

	let mut out = String::new();
	for word in name
		.split(|c: char| !c.is_ascii_alphanumeric())
		.filter(|w| !w.is_empty())
	{
		let mut chars = word.chars();
		if let Some(first) = chars.next() {
			if out.is_empty() {
				out.push(first.to_ascii_lowercase());
			} else {
				out.push(first.to_ascii_uppercase());
			}
			out.extend(chars);
		}
	}

	if out.is_empty() {
		return "node".to_string();
	}
	if out.starts_with(|c: char| c.is_ascii_digit()) {
		out.insert(0, 'n');
	}
	out
}

#[derive(Default)]
struct Variables {
	by_node: IndexMap<NodeId, String>,
	taken: HashSet<String>,
}

impl Variables {
	fn var_for(&mut self, id: &str, label: &str) -> String {
		if let Some(v) = self.by_node.get(id) {
			return v.clone();
		}
		let base = variable_base(label);
		let mut name = base.clone();
		let mut n = 0;
		while self.taken.contains(&name) {
			n += 1;
			name = format!("{base}_{n}");
		}
		self.taken.insert(name.clone());
		self.by_node.insert(id.to_string(), name.clone());
		name
	}
}

/// Patterns of one traversal step, still unplaced.
struct Step<'p> {
	edge: &'p Edge,
	patterns: Vec<String>,
}

/// endpoint → named graph → patterns; `None` endpoint means "primary".
type Blocks = IndexMap<Option<String>, IndexMap<Option<String>, IndexSet<String>>>;

pub struct QueryCompiler<'a> {
	sources: &'a SourceRegistry,
	options: QueryOptions,
	graph: Option<&'a Graph>,
	prefixes: PrefixMap,
}

impl<'a> QueryCompiler<'a> {
	pub fn new(sources: &'a SourceRegistry, options: QueryOptions) -> Self {
		let prefixes = if options.use_prefixes {
			well_known_prefixes()
		} else {
			PrefixMap::new()
		};
		Self {
			sources,
			options,
			graph: None,
			prefixes,
		}
	}

	/// Name variables after the graph's class labels instead of raw ids.
	pub fn with_graph(mut self, graph: &'a Graph) -> Self {
		self.graph = Some(graph);
		self
	}

	fn label(&self, id: &str) -> String {
		match self.graph {
			Some(graph) => graph.label(id),
			None => local_name(id).to_string(),
		}
	}

	fn iri(&self, uri: &str, used: &mut IndexSet<String>) -> String {
		let term = sparql_iri(uri, &self.prefixes);
		if !term.starts_with('<') {
			if let Some((prefix, _)) = term.split_once(':') {
				used.insert(prefix.to_string());
			}
		}
		term
	}

	pub fn compile<'p, I>(&self, paths: I, selected: &[String]) -> String
	where
		I: IntoIterator<Item = &'p EdgePath>,
	{
		self.compile_detailed(paths, selected).text
	}

	pub fn compile_detailed<'p, I>(&self, paths: I, selected: &[String]) -> CompiledQuery
	where
		I: IntoIterator<Item = &'p EdgePath>,
	{
		let mut vars = Variables::default();
		let mut used_prefixes = IndexSet::new();
		let mut steps = Vec::new();

		for route in paths {
			for (from, to, edge) in route.steps() {
				let (subject, object) = oriented(from, to, edge);
				let s = vars.var_for(subject, &self.label(subject));
				let o = vars.var_for(object, &self.label(object));

				let mut patterns = Vec::new();
				if self.options.require_type {
					for (var, class) in [(&s, subject), (&o, object)] {
						if class != UNKNOWN_NODE && class != "Literal" {
							patterns.push(format!("?{var} a {} .", self.iri(class, &mut used_prefixes)));
						}
					}
				}
				let predicate = self.iri(&edge.property, &mut used_prefixes);
				patterns.push(format!("?{s} {predicate} ?{o} ."));
				steps.push(Step { edge, patterns });
			}
		}

		if steps.is_empty() {
			return CompiledQuery {
				text: NO_PATHS_QUERY.to_string(),
				..CompiledQuery::default()
			};
		}

		let primary = self.primary_endpoint(&steps, selected);
		let mut blocks: Blocks = IndexMap::new();
		blocks.entry(primary.clone()).or_default();
		for step in &steps {
			for (endpoint, graph) in self.placements(step.edge, &primary) {
				blocks
					.entry(endpoint)
					.or_default()
					.entry(graph)
					.or_default()
					.extend(step.patterns.iter().cloned());
			}
		}

		let mut select: Vec<String> = vars.by_node.values().map(|v| format!("?{v}")).collect();
		let values = self.value_clauses(&vars, &mut used_prefixes);
		let mut label_clauses = Vec::new();
		if self.options.include_labels {
			let label = self.iri(RDFS_LABEL, &mut used_prefixes);
			let title = self.iri(DC_TITLE, &mut used_prefixes);
			for v in vars.by_node.values() {
				select.push(format!("?{v}Label"));
				label_clauses.push(format!("OPTIONAL {{ ?{v} {label} ?{v}Label . }}"));
				label_clauses.push(format!("OPTIONAL {{ ?{v} {title} ?{v}Label . }}"));
			}
		}

		let mut lines = Vec::new();
		let declared: PrefixMap = used_prefixes
			.iter()
			.filter_map(|p| self.prefixes.get(p).map(|ns| (p.clone(), ns.clone())))
			.collect();
		for (prefix, ns) in &declared {
			lines.push(format!("PREFIX {prefix}: <{ns}>"));
		}
		lines.push(format!("SELECT DISTINCT {} WHERE {{", select.join(" ")));
		lines.extend(values.iter().map(|clause| format!("  {clause}")));
		for (endpoint, graphs) in &blocks {
			if *endpoint == primary {
				emit_graphs(&mut lines, graphs, 1);
			}
		}
		for (endpoint, graphs) in &blocks {
			match endpoint {
				Some(url) if *endpoint != primary => {
					lines.push(format!("  SERVICE <{url}> {{"));
					emit_graphs(&mut lines, graphs, 2);
					lines.push("  }".to_string());
				}
				_ => {}
			}
		}
		for clause in &label_clauses {
			lines.push(format!("  {clause}"));
		}
		lines.push("}".to_string());
		if let Some(limit) = self.options.limit {
			lines.push(format!("LIMIT {limit}"));
		}

		log::info!(
			"Compiled query over {} patterns, {} endpoint(s)",
			steps.len(),
			blocks.len()
		);
		CompiledQuery {
			text: lines.join("\n"),
			variables: vars
				.by_node
				.into_iter()
				.map(|(id, v)| (v, id))
				.collect(),
			prefixes: declared,
		}
	}

	/// `VALUES` rows for bound variables that occur in the query.
	fn value_clauses(&self, vars: &Variables, used: &mut IndexSet<String>) -> Vec<String> {
		let mut clauses = Vec::new();
		for (var, iris) in &self.options.value_bindings {
			if iris.is_empty() {
				continue;
			}
			if !vars.taken.contains(var) {
				log::debug!("Ignoring VALUES binding for unknown variable ?{var}");
				continue;
			}
			let terms: Vec<String> = iris.iter().map(|iri| self.iri(iri, used)).collect();
			clauses.push(format!("VALUES ?{var} {{ {} }}", terms.join(" ")));
		}
		clauses
	}

	/// Datasets an edge's patterns are placed with.
	fn placement_datasets<'e>(&self, edge: &'e Edge) -> Vec<&'e str> {
		match self.options.placement {
			Placement::FirstDataset => edge.datasets.first().map(String::as_str).into_iter().collect(),
			Placement::EveryEndpoint => edge.datasets.iter().map(String::as_str).collect(),
		}
	}

	fn primary_endpoint(&self, steps: &[Step<'_>], selected: &[String]) -> Option<String> {
		let contributing: IndexSet<&str> = steps
			.iter()
			.flat_map(|s| self.placement_datasets(s.edge))
			.collect();
		selected
			.iter()
			.map(String::as_str)
			.filter(|ds| contributing.contains(ds))
			.chain(contributing.iter().copied())
			.find_map(|ds| self.sources.placement(ds))
			.map(|(endpoint, _)| endpoint.to_string())
	}

	fn placements(&self, edge: &Edge, primary: &Option<String>) -> IndexSet<(Option<String>, Option<String>)> {
		let mut out = IndexSet::new();
		for ds in self.placement_datasets(edge) {
			match self.sources.placement(ds) {
				Some((endpoint, graph)) => {
					out.insert((Some(endpoint.to_string()), graph.map(str::to_string)));
				}
				None => {
					out.insert((primary.clone(), None));
				}
			}
		}
		if out.is_empty() {
			out.insert((primary.clone(), None));
		}
		out
	}
}

fn emit_graphs(lines: &mut Vec<String>, graphs: &IndexMap<Option<String>, IndexSet<String>>, depth: usize) {
	let indent = "  ".repeat(depth);
	for (graph, patterns) in graphs {
		match graph {
			Some(uri) => {
				lines.push(format!("{indent}GRAPH <{uri}> {{"));
				lines.extend(patterns.iter().map(|p| format!("{indent}  {p}")));
				lines.push(format!("{indent}}}"));
			}
			None => lines.extend(patterns.iter().map(|p| format!("{indent}{p}"))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::graph::build_graph;
	use crate::schema::graph::tests::row;
	use crate::schema::path_finder::PathFinder;
	use crate::schema::sources::DatasetSource;
	use pretty_assertions::assert_eq;

	fn squash(text: &str) -> String {
		text.split_whitespace().collect::<Vec<_>>().join(" ")
	}

	fn one_endpoint() -> SourceRegistry {
		let mut sources = SourceRegistry::new();
		sources.insert("ds1", DatasetSource::endpoint("https://one.example/sparql"));
		sources
	}

	#[test]
	fn test_variable_base() {
		assert_eq!(variable_base("wp:DataNode"), "dataNode");
		assert_eq!(variable_base("Gene, human"), "geneHuman");
		assert_eq!(variable_base("http://ex.org/onto#Protein"), "protein");
		assert_eq!(variable_base("3prime UTR"), "n3primeUTR");
		assert_eq!(variable_base("::"), "node");
	}

	#[test]
	fn test_reverse_step_keeps_edge_direction() {
		let graph = build_graph(&[row("B", "http://ex.org/p", "A", 1, "ds1")], |_| false);
		let finder = PathFinder::new(&graph);
		let routes = finder.expand_to_edge_paths(&["A".to_string(), "B".to_string()]);
		let sources = one_endpoint();
		let query = QueryCompiler::new(&sources, QueryOptions::default())
			.with_graph(&graph)
			.compile(&routes, &["ds1".to_string()]);

		assert!(query.contains("?b <http://ex.org/p> ?a ."));
		assert!(!query.contains("?a <http://ex.org/p> ?b ."));
	}

	#[test]
	fn test_label_collisions_get_suffixes() {
		let mut graph = build_graph(&[row("http://x/A", "p", "http://y/A", 1, "ds1")], |_| false);
		for node in graph.nodes.values_mut() {
			node.label = "Protein".to_string();
		}
		let finder = PathFinder::new(&graph);
		let routes = finder.expand_to_edge_paths(&["http://x/A".to_string(), "http://y/A".to_string()]);
		let sources = one_endpoint();
		let compiled = QueryCompiler::new(&sources, QueryOptions::default())
			.with_graph(&graph)
			.compile_detailed(&routes, &[]);

		assert_eq!(
			compiled.variables.keys().cloned().collect::<Vec<_>>(),
			vec!["protein".to_string(), "protein_1".to_string()]
		);
		assert!(compiled.text.starts_with("SELECT DISTINCT ?protein ?protein_1 WHERE {"));
	}

	#[test]
	fn test_patterns_are_deduplicated_across_paths() {
		let graph = build_graph(
			&[row("A", "p", "B", 1, "ds1"), row("B", "q", "C", 1, "ds1")],
			|_| false,
		);
		let finder = PathFinder::new(&graph);
		let mut routes = finder.expand_to_edge_paths(&["A".to_string(), "B".to_string(), "C".to_string()]);
		routes.extend(finder.expand_to_edge_paths(&["A".to_string(), "B".to_string()]));
		let sources = one_endpoint();
		let query = QueryCompiler::new(&sources, QueryOptions::default()).compile(&routes, &[]);

		assert_eq!(query.matches("?a <p> ?b .").count(), 1);
		assert_eq!(query.matches("?b <q> ?c .").count(), 1);
	}

	#[test]
	fn test_named_graph_and_unregistered_dataset() {
		let graph = build_graph(
			&[row("A", "p", "B", 1, "ds1"), row("B", "q", "C", 1, "stray")],
			|_| false,
		);
		let mut sources = SourceRegistry::new();
		sources.insert(
			"ds1",
			DatasetSource::endpoint("https://one.example/sparql").with_graph("http://g/1"),
		);
		let finder = PathFinder::new(&graph);
		let routes = finder.expand_to_edge_paths(&["A".to_string(), "B".to_string(), "C".to_string()]);
		let query = QueryCompiler::new(&sources, QueryOptions::default()).compile(&routes, &[]);

		assert_eq!(
			squash(&query),
			"SELECT DISTINCT ?a ?b ?c WHERE { GRAPH <http://g/1> { ?a <p> ?b . } ?b <q> ?c . } LIMIT 100"
		);
	}

	#[test]
	fn test_every_endpoint_placement_duplicates_shared_edges() {
		let graph = build_graph(
			&[row("A", "p", "B", 1, "ds1"), row("A", "p", "B", 1, "ds2")],
			|_| false,
		);
		let mut sources = one_endpoint();
		sources.insert("ds2", DatasetSource::endpoint("https://two.example/sparql"));
		let finder = PathFinder::new(&graph);
		let routes = finder.expand_to_edge_paths(&["A".to_string(), "B".to_string()]);
		let selected = vec!["ds1".to_string(), "ds2".to_string()];

		let first = QueryCompiler::new(&sources, QueryOptions::default()).compile(&routes, &selected);
		assert!(!first.contains("SERVICE"));

		let options = QueryOptions {
			placement: Placement::EveryEndpoint,
			..QueryOptions::default()
		};
		let every = QueryCompiler::new(&sources, options).compile(&routes, &selected);
		assert_eq!(
			squash(&every),
			"SELECT DISTINCT ?a ?b WHERE { ?a <p> ?b . SERVICE <https://two.example/sparql> { ?a <p> ?b . } } LIMIT 100"
		);
	}

	#[test]
	fn test_prefixes_labels_and_jsonld() {
		let graph = build_graph(
			&[row("http://ex.org/A", "http://purl.org/dc/terms/isPartOf", "http://ex.org/B", 1, "ds1")],
			|_| false,
		);
		let finder = PathFinder::new(&graph);
		let routes = finder.expand_to_edge_paths(&["http://ex.org/A".to_string(), "http://ex.org/B".to_string()]);
		let sources = one_endpoint();
		let options = QueryOptions {
			use_prefixes: true,
			include_labels: true,
			limit: None,
			..QueryOptions::default()
		};
		let compiled = QueryCompiler::new(&sources, options).compile_detailed(&routes, &[]);

		assert!(compiled.text.starts_with("PREFIX dcterms: <http://purl.org/dc/terms/>\nPREFIX rdfs:"));
		assert!(compiled.text.contains("?a dcterms:isPartOf ?b ."));
		assert!(compiled.text.contains("OPTIONAL { ?b rdfs:label ?bLabel . }"));
		assert!(compiled.text.contains("OPTIONAL { ?b dc:title ?bLabel . }"));
		assert!(compiled.text.contains("PREFIX dc: <http://purl.org/dc/elements/1.1/>"));
		assert!(compiled.text.contains("SELECT DISTINCT ?a ?b ?aLabel ?bLabel WHERE {"));
		assert!(!compiled.text.contains("LIMIT"));

		let jsonld = compiled.to_jsonld();
		assert_eq!(jsonld["sh:select"], compiled.text.as_str());
		assert_eq!(jsonld["schema:variableMeasured"]["a"], "http://ex.org/A");
	}

	#[test]
	fn test_value_bindings_open_the_where_clause() {
		let graph = build_graph(&[row("Gene", "encodes", "Protein", 1, "ds1")], |_| false);
		let finder = PathFinder::new(&graph);
		let routes = finder.expand_to_edge_paths(&["Gene".to_string(), "Protein".to_string()]);
		let sources = one_endpoint();
		let mut options = QueryOptions::default();
		options
			.value_bindings
			.insert("gene".to_string(), vec!["http://ex.org/g1".to_string(), "http://ex.org/g2".to_string()]);
		options.value_bindings.insert("missing".to_string(), vec!["http://ex.org/x".to_string()]);
		options.value_bindings.insert("protein".to_string(), Vec::new());
		let query = QueryCompiler::new(&sources, options).with_graph(&graph).compile(&routes, &[]);

		assert_eq!(
			squash(&query),
			"SELECT DISTINCT ?gene ?protein WHERE { \
			 VALUES ?gene { <http://ex.org/g1> <http://ex.org/g2> } \
			 ?gene <encodes> ?protein . } LIMIT 100"
		);
	}

	#[test]
	fn test_no_paths_sentinel() {
		let sources = SourceRegistry::new();
		let routes: Vec<EdgePath> = Vec::new();
		assert_eq!(
			QueryCompiler::new(&sources, QueryOptions::default()).compile(&routes, &[]),
			NO_PATHS_QUERY
		);
	}
}
