use super::uri::local_name;

/// Core vocabularies whose classes only add noise to a coverage diagram.
const EXCLUDED_NAMESPACES: &[&str] = &[
	"http://www.w3.org/1999/02/22-rdf-syntax-ns#",
	"http://www.w3.org/2000/01/rdf-schema#",
	"http://www.w3.org/2002/07/owl#",
	"http://www.w3.org/ns/shacl#",
	"http://www.w3.org/2001/XMLSchema#",
];

/// Generic OWL/RDFS terms, matched on the local name regardless of namespace.
const EXCLUDED_LOCAL_NAMES: &[&str] = &[
	"Resource",
	"Class",
	"Thing",
	"Nothing",
	"ObjectProperty",
	"DatatypeProperty",
	"AnnotationProperty",
	"Property",
	"Ontology",
	"NamedIndividual",
	"Restriction",
	"Datatype",
	"NodeShape",
	"PropertyShape",
];

/// Whether `uri` is schema boilerplate that the diagram should hide.
pub fn is_excluded(uri: &str, enabled: bool) -> bool {
	if !enabled {
		return false;
	}
	EXCLUDED_NAMESPACES.iter().any(|ns| uri.starts_with(ns))
		|| EXCLUDED_LOCAL_NAMES.contains(&local_name(uri))
}
