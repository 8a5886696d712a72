//! Where each dataset lives: SPARQL endpoint and optional named graph.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::{DiagramError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSource {
	pub endpoint_url: String,
	#[serde(default)]
	pub graph_uri: Option<String>,
	#[serde(default)]
	pub use_graph: bool,
}

impl DatasetSource {
	pub fn endpoint(endpoint_url: impl Into<String>) -> Self {
		Self {
			endpoint_url: endpoint_url.into(),
			graph_uri: None,
			use_graph: false,
		}
	}

	pub fn with_graph(mut self, graph_uri: impl Into<String>) -> Self {
		self.graph_uri = Some(graph_uri.into());
		self.use_graph = true;
		self
	}

	/// Named graph to wrap patterns in, if the dataset asks for one.
	pub fn graph(&self) -> Option<&str> {
		self.graph_uri
			.as_deref()
			.filter(|g| self.use_graph && !g.is_empty())
	}
}

/// Dataset name → source, in registration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRegistry(IndexMap<String, DatasetSource>);

impl SourceRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse `{"dataset": {"endpointUrl": ..., "graphUri": ..., "useGraph": ...}}`.
	pub fn from_json(text: &str) -> Result<Self> {
		Ok(serde_json::from_str(text)?)
	}

	pub fn insert(&mut self, dataset: impl Into<String>, source: DatasetSource) {
		self.0.insert(dataset.into(), source);
	}

	pub fn get(&self, dataset: &str) -> Option<&DatasetSource> {
		self.0.get(dataset)
	}

	/// Like [`get`](Self::get) but an unknown dataset is an error.
	pub fn require(&self, dataset: &str) -> Result<&DatasetSource> {
		self.get(dataset)
			.ok_or_else(|| DiagramError::UnknownDataset(dataset.to_string()))
	}

	/// `(endpoint, graph)` placement for patterns of `dataset`.
	pub fn placement(&self, dataset: &str) -> Option<(&str, Option<&str>)> {
		self.get(dataset)
			.map(|s| (s.endpoint_url.as_str(), s.graph()))
	}

	pub fn datasets(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
