//! Diagram settings, loadable from JSON with per-field defaults.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::Result;
use super::geometry::EdgeStyle;
use super::layout::LayoutOptions;
use super::path_finder::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_PATHS, SearchMode};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchLimits {
	pub mode: SearchMode,
	pub max_paths: usize,
	pub max_depth: usize,
}

impl Default for SearchLimits {
	fn default() -> Self {
		Self {
			mode: SearchMode::Shortest,
			max_paths: DEFAULT_MAX_PATHS,
			max_depth: DEFAULT_MAX_DEPTH,
		}
	}
}

/// How a pattern whose edge belongs to several datasets is placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Placement {
	/// Only the endpoint of the edge's first dataset.
	#[default]
	FirstDataset,
	/// One copy per distinct endpoint among the edge's datasets.
	EveryEndpoint,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryOptions {
	pub require_type: bool,
	pub include_labels: bool,
	/// `None` drops the LIMIT clause.
	pub limit: Option<usize>,
	pub placement: Placement,
	/// Compact IRIs with the well-known prefixes and declare them.
	pub use_prefixes: bool,
	/// Variable name (without `?`) → IRIs it is pinned to with `VALUES`.
	pub value_bindings: IndexMap<String, Vec<String>>,
}

impl Default for QueryOptions {
	fn default() -> Self {
		Self {
			require_type: false,
			include_labels: false,
			limit: Some(100),
			placement: Placement::FirstDataset,
			use_prefixes: false,
			value_bindings: IndexMap::new(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagramConfig {
	pub layout: LayoutOptions,
	pub search: SearchLimits,
	pub exclude_boilerplate: bool,
	pub edge_style: EdgeStyle,
	pub query: QueryOptions,
}

impl Default for DiagramConfig {
	fn default() -> Self {
		Self {
			layout: LayoutOptions::default(),
			search: SearchLimits::default(),
			exclude_boilerplate: true,
			edge_style: EdgeStyle::Orthogonal,
			query: QueryOptions::default(),
		}
	}
}

impl DiagramConfig {
	pub fn from_json(text: &str) -> Result<Self> {
		Ok(serde_json::from_str(text)?)
	}
}
