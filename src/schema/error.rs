//! Error type for the schema engine.

use thiserror::Error;

/// Result alias used across `schema`.
pub type Result<T> = std::result::Result<T, DiagramError>;

/// Failures surfaced by the diagram engine.
#[derive(Error, Debug)]
pub enum DiagramError {
	/// A coverage file could not be read as delimited records.
	#[error("Coverage parse error: {0}")]
	Csv(#[from] csv::Error),

	/// No header matched the named column or any of its fallbacks.
	#[error("Coverage file is missing a {0} column")]
	MissingColumn(&'static str),

	/// Config or source registry JSON did not parse.
	#[error("Invalid configuration: {0}")]
	Config(#[from] serde_json::Error),

	/// A dataset name with no loaded coverage.
	#[error("Unknown dataset: {0}")]
	UnknownDataset(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_messages_name_the_cause() {
		assert_eq!(
			DiagramError::MissingColumn("subject").to_string(),
			"Coverage file is missing a subject column"
		);
		assert_eq!(
			DiagramError::UnknownDataset("chembl".to_string()).to_string(),
			"Unknown dataset: chembl"
		);
		let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
		assert!(DiagramError::from(json).to_string().starts_with("Invalid configuration: "));
	}
}
