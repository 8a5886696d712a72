//! Plain-text path summaries shown beside the diagram.

use super::graph::Graph;
use super::path_state::Path;
use super::query::oriented;

/// `Path i/n: From → To` followed by one `subject  predicate  object` line
/// per step, each in the edge's own direction.
pub fn render_bubble(path: &Path, graph: &Graph) -> String {
	let mut lines = vec![format!(
		"Path {}/{}: {} → {}",
		path.path_number, path.total_paths, path.from_label, path.to_label
	)];
	for (from, to, edge) in path.route.steps() {
		let (subject, object) = oriented(from, to, edge);
		lines.push(format!(
			"{}  {}  {}",
			graph.label(subject),
			edge.label,
			graph.label(object)
		));
	}
	lines.join("\n")
}

pub fn render_bubbles(paths: &[Path], graph: &Graph) -> String {
	paths
		.iter()
		.map(|p| render_bubble(p, graph))
		.collect::<Vec<_>>()
		.join("\n\n")
}
