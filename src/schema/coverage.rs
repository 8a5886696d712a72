//! Coverage file ingestion.
//!
//! A coverage file holds one row per observed `subject class -> property ->
//! object class` pattern of a single dataset, as written by the schema miner.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};

use super::error::{DiagramError, Result};
use super::uri::local_name;

/// Node id used when a row names no object class.
pub const UNKNOWN_NODE: &str = "Unknown";

/// One observed triple shape with its count, scoped to one dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoverageRow {
	pub subject_uri: String,
	pub subject_label: String,
	pub object_uri: String,
	pub object_label: String,
	pub property_uri: String,
	pub property_label: String,
	pub occurrence_count: u64,
	pub coverage_percent: f64,
	pub source_dataset: String,
}

/// Column positions resolved from the header line.
#[derive(Debug, Default)]
struct Columns {
	subject_uri: Option<usize>,
	subject_label: Option<usize>,
	object_uri: Option<usize>,
	object_label: Option<usize>,
	property_uri: Option<usize>,
	property_label: Option<usize>,
	occurrence_count: Option<usize>,
	coverage_percent: Option<usize>,
}

impl Columns {
	fn from_header(header: &StringRecord) -> Result<Self> {
		let mut columns = Columns::default();
		for (idx, name) in header.iter().enumerate() {
			let slot = match name.trim().to_ascii_lowercase().as_str() {
				"subject_uri" => &mut columns.subject_uri,
				"subject_class" => &mut columns.subject_label,
				"object_uri" => &mut columns.object_uri,
				"object_class" => &mut columns.object_label,
				"property_uri" => &mut columns.property_uri,
				"property" => &mut columns.property_label,
				"occurrence_count" => &mut columns.occurrence_count,
				"coverage_percent" => &mut columns.coverage_percent,
				_ => continue,
			};
			slot.get_or_insert(idx);
		}

		if columns.subject_uri.is_none() && columns.subject_label.is_none() {
			return Err(DiagramError::MissingColumn("subject_uri/subject_class"));
		}
		if columns.property_uri.is_none() && columns.property_label.is_none() {
			return Err(DiagramError::MissingColumn("property_uri/property"));
		}
		Ok(columns)
	}
}

fn field(record: &StringRecord, idx: Option<usize>) -> &str {
	idx.and_then(|i| record.get(i)).unwrap_or("").trim()
}

/// Resolves `(uri, label)` from whichever of the two columns carries a value.
fn identity(uri: &str, label: &str) -> Option<(String, String)> {
	match (uri.is_empty(), label.is_empty()) {
		(true, true) => None,
		(false, true) => Some((uri.to_string(), local_name(uri).to_string())),
		(true, false) => Some((label.to_string(), label.to_string())),
		(false, false) => Some((uri.to_string(), label.to_string())),
	}
}

fn parse_count(raw: &str) -> u64 {
	raw.parse::<u64>()
		.ok()
		.or_else(|| {
			raw.parse::<f64>()
				.ok()
				.filter(|v| v.is_finite() && *v >= 0.0)
				.map(|v| v.trunc() as u64)
		})
		.unwrap_or(0)
}

fn detect_delimiter(text: &str) -> u8 {
	let header = text.lines().next().unwrap_or("");
	if header.contains('\t') { b'\t' } else { b',' }
}

/// Parse a coverage CSV/TSV document into rows tagged with `dataset`.
///
/// Rows without a subject or property are skipped; a missing object becomes
/// [`UNKNOWN_NODE`].
pub fn parse_coverage(text: &str, dataset: &str) -> Result<Vec<CoverageRow>> {
	let mut reader = ReaderBuilder::new()
		.delimiter(detect_delimiter(text))
		.flexible(true)
		.trim(Trim::All)
		.from_reader(text.as_bytes());

	let columns = Columns::from_header(reader.headers()?)?;
	let mut rows = Vec::new();
	let mut skipped = 0usize;

	for (line, record) in reader.records().enumerate() {
		let record = match record {
			Ok(record) => record,
			Err(e) => {
				log::debug!("{dataset}: skipping unreadable row {}: {e}", line + 2);
				skipped += 1;
				continue;
			}
		};

		let subject = identity(
			field(&record, columns.subject_uri),
			field(&record, columns.subject_label),
		);
		let property = identity(
			field(&record, columns.property_uri),
			field(&record, columns.property_label),
		);
		let (Some((subject_uri, subject_label)), Some((property_uri, property_label))) =
			(subject, property)
		else {
			log::debug!("{dataset}: skipping row {} without subject/property", line + 2);
			skipped += 1;
			continue;
		};
		let (object_uri, object_label) = identity(
			field(&record, columns.object_uri),
			field(&record, columns.object_label),
		)
		.unwrap_or_else(|| (UNKNOWN_NODE.to_string(), UNKNOWN_NODE.to_string()));

		rows.push(CoverageRow {
			subject_uri,
			subject_label,
			object_uri,
			object_label,
			property_uri,
			property_label,
			occurrence_count: parse_count(field(&record, columns.occurrence_count)),
			coverage_percent: field(&record, columns.coverage_percent)
				.parse::<f64>()
				.unwrap_or(0.0),
			source_dataset: dataset.to_string(),
		});
	}

	log::debug!("{dataset}: parsed {} coverage rows ({skipped} skipped)", rows.len());
	Ok(rows)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_full_header() {
		let text = "subject_class,subject_uri,property,property_uri,object_class,object_uri,occurrence_count,coverage_percent\n\
			wp:DataNode,http://ex.org/DataNode,dcterms:isPartOf,http://purl.org/dc/terms/isPartOf,wp:Pathway,http://ex.org/Pathway,12,45.5\n";
		let rows = parse_coverage(text, "wikipathways").unwrap();

		assert_eq!(rows.len(), 1);
		let row = &rows[0];
		assert_eq!(row.subject_uri, "http://ex.org/DataNode");
		assert_eq!(row.subject_label, "wp:DataNode");
		assert_eq!(row.property_label, "dcterms:isPartOf");
		assert_eq!(row.object_uri, "http://ex.org/Pathway");
		assert_eq!(row.occurrence_count, 12);
		assert_eq!(row.coverage_percent, 45.5);
		assert_eq!(row.source_dataset, "wikipathways");
	}

	#[test]
	fn test_uri_only_columns_derive_labels() {
		let text = "subject_uri\tproperty_uri\tobject_uri\toccurrence_count\n\
			http://ex.org/A\thttp://ex.org/p#rel\thttp://ex.org/B\t3.0\n";
		let rows = parse_coverage(text, "ds").unwrap();

		assert_eq!(rows[0].subject_label, "A");
		assert_eq!(rows[0].property_label, "rel");
		assert_eq!(rows[0].object_label, "B");
		assert_eq!(rows[0].occurrence_count, 3);
	}

	#[test]
	fn test_label_only_columns_and_quoted_separator() {
		let text = "subject_class,property,object_class,occurrence_count,coverage_percent\n\
			\"Gene, human\",encodes,Protein,not-a-number,\n";
		let rows = parse_coverage(text, "ds").unwrap();

		assert_eq!(rows[0].subject_uri, "Gene, human");
		assert_eq!(rows[0].subject_label, "Gene, human");
		assert_eq!(rows[0].occurrence_count, 0);
		assert_eq!(rows[0].coverage_percent, 0.0);
	}

	#[test]
	fn test_rows_without_identity_are_skipped() {
		let text = "subject_uri,property_uri,object_uri\n\
			,http://ex.org/p,http://ex.org/B\n\
			http://ex.org/A,,http://ex.org/B\n\
			http://ex.org/A,http://ex.org/p,\n";
		let rows = parse_coverage(text, "ds").unwrap();

		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].object_uri, UNKNOWN_NODE);
	}

	#[test]
	fn test_missing_subject_column_is_an_error() {
		let err = parse_coverage("property,object_class\np,B\n", "ds").unwrap_err();
		assert!(matches!(err, DiagramError::MissingColumn(_)));
	}
}
