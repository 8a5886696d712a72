//! URI display helpers shared by ingestion, query synthesis and the renderer.

use indexmap::IndexMap;

/// Namespaces every coverage file is likely to mention.
pub const WELL_KNOWN_PREFIXES: &[(&str, &str)] = &[
	("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
	("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
	("owl", "http://www.w3.org/2002/07/owl#"),
	("xsd", "http://www.w3.org/2001/XMLSchema#"),
	("sh", "http://www.w3.org/ns/shacl#"),
	("skos", "http://www.w3.org/2004/02/skos/core#"),
	("dc", "http://purl.org/dc/elements/1.1/"),
	("dcterms", "http://purl.org/dc/terms/"),
	("foaf", "http://xmlns.com/foaf/0.1/"),
	("schema", "https://schema.org/"),
];

/// Prefix map in declaration order.
pub type PrefixMap = IndexMap<String, String>;

pub fn well_known_prefixes() -> PrefixMap {
	WELL_KNOWN_PREFIXES
		.iter()
		.map(|(p, ns)| (p.to_string(), ns.to_string()))
		.collect()
}

/// Segment after the last `#`, or after the last `/` when there is no `#`.
///
/// ```
/// use coverage_diagram::schema::uri::local_name;
/// assert_eq!(local_name("http://example.org/foo#Bar"), "Bar");
/// assert_eq!(local_name("http://example.org/foo/Bar/"), "Bar");
/// assert_eq!(local_name("Bar"), "Bar");
/// ```
pub fn local_name(uri: &str) -> &str {
	if let Some((_, tail)) = uri.rsplit_once('#') {
		return tail;
	}
	let trimmed = uri.trim_end_matches('/');
	match trimmed.rsplit_once('/') {
		Some((_, tail)) => tail,
		None => trimmed,
	}
}

/// `prefix:local` for the first namespace that matches, otherwise `None`.
pub fn compact_uri(uri: &str, prefixes: &PrefixMap) -> Option<String> {
	prefixes.iter().find_map(|(prefix, ns)| {
		uri.strip_prefix(ns.as_str())
			.filter(|local| !local.is_empty())
			.map(|local| format!("{prefix}:{local}"))
	})
}

/// CURIE when a prefix matches, local name otherwise.
pub fn shorten_for_display(uri: &str, prefixes: &PrefixMap) -> String {
	compact_uri(uri, prefixes).unwrap_or_else(|| local_name(uri).to_string())
}

/// SPARQL term for an IRI: compacted when the local part needs no
/// escaping, `<iri>` otherwise.
pub fn sparql_iri(uri: &str, prefixes: &PrefixMap) -> String {
	compact_uri(uri, prefixes)
		.filter(|curie| {
			curie.split_once(':').is_some_and(|(_, local)| {
				local
					.chars()
					.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
			})
		})
		.unwrap_or_else(|| format!("<{uri}>"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_local_name_variants() {
		assert_eq!(local_name("http://www.w3.org/2002/07/owl#Thing"), "Thing");
		assert_eq!(local_name("http://purl.org/dc/terms/title"), "title");
		assert_eq!(local_name("urn:x"), "urn:x");
	}

	#[test]
	fn test_compact_and_shorten() {
		let prefixes = well_known_prefixes();
		assert_eq!(
			compact_uri("http://purl.org/dc/terms/isPartOf", &prefixes).as_deref(),
			Some("dcterms:isPartOf")
		);
		assert_eq!(compact_uri("http://purl.org/dc/terms/", &prefixes), None);
		assert_eq!(
			shorten_for_display("http://vocabularies.wikipathways.org/wp#DataNode", &prefixes),
			"DataNode"
		);
		assert_eq!(
			sparql_iri("http://example.org/p1", &prefixes),
			"<http://example.org/p1>"
		);
		assert_eq!(
			sparql_iri("http://purl.org/dc/terms/a/b", &prefixes),
			"<http://purl.org/dc/terms/a/b>"
		);
	}
}
