//! Schema coverage engine: ingestion, the class graph, layout, path search
//! and SPARQL synthesis. Nothing in here touches the DOM.

pub mod bubble;
pub mod config;
pub mod connectivity;
pub mod coverage;
pub mod error;
pub mod exclude;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod path_finder;
pub mod path_state;
pub mod query;
pub mod session;
pub mod sources;
pub mod uri;

pub use config::{DiagramConfig, Placement, QueryOptions, SearchLimits};
pub use coverage::{CoverageRow, UNKNOWN_NODE, parse_coverage};
pub use error::{DiagramError, Result};
pub use graph::{Edge, Graph, Node, NodeId, build_graph};
pub use path_finder::{EdgePath, PathFinder, SearchMode};
pub use path_state::{Path, PathState};
pub use query::{CompiledQuery, QueryCompiler};
pub use session::{DiagramSession, SearchOutcome};
pub use sources::{DatasetSource, SourceRegistry};
