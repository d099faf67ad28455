// src/error.rs

use std::{io, path::PathBuf};
use thiserror::Error;

/// Which configured column a lookup was for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnField {
    Response,
    Id,
    Category,
    Answer,
    Score,
}

impl ColumnField {
    pub fn as_str(&self) -> &str {
        match self {
            ColumnField::Response => "response",
            ColumnField::Id => "id",
            ColumnField::Category => "category",
            ColumnField::Answer => "answer",
            ColumnField::Score => "score",
        }
    }
}

/// Every fatal condition a scoring run can hit. The `Display` text is the
/// message shown to the user.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Cannot process csv file {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Column {column:?} appears more than once in the header of {path:?}")]
    DuplicateColumn { path: PathBuf, column: String },

    #[error(
        "Column with name: {column} ({}) is not present in the data file, please try custom experiment",
        .field.as_str()
    )]
    MissingColumn { field: ColumnField, column: String },

    #[error(
        "Response with ID: \"{id}\" is not found in the log file.\nLog File contains the following ID values:\n\n{}\n\nPlease input the correct ID values",
        quote_lines(.known)
    )]
    MissingResponse { id: String, known: Vec<String> },

    #[error(
        "Response: \"{response}\" for ID \"{id}\" is not defined in the response field\nGiven values are:\n\n{}",
        quote_lines(.valid)
    )]
    UnknownAnswer {
        id: String,
        response: String,
        valid: Vec<String>,
    },

    #[error("Trial ID \"{id}\" is defined more than once")]
    DuplicateTrial { id: String },

    #[error("Response with ID: \"{id}\" appears more than once in the log file")]
    RepeatedResponse { id: String },

    #[error("{}", .0.join("\n"))]
    Validation(Vec<String>),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScoreError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ScoreError::Io {
            path: path.into(),
            source,
        }
    }
}

fn quote_lines(items: &[String]) -> String {
    items
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, ScoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_response_lists_known_ids() {
        let err = ScoreError::MissingResponse {
            id: "T2".into(),
            known: vec!["T1".into(), "T3".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("\"T2\""));
        assert!(msg.contains("\"T1\"\n\"T3\""));
    }

    #[test]
    fn missing_column_names_field_and_column() {
        let err = ScoreError::MissingColumn {
            field: ColumnField::Score,
            column: "answer_options_scores".into(),
        };
        assert_eq!(
            err.to_string(),
            "Column with name: answer_options_scores (score) is not present in the data file, please try custom experiment"
        );
    }

    #[test]
    fn validation_joins_messages() {
        let err = ScoreError::Validation(vec!["- a".into(), "- b".into()]);
        assert_eq!(err.to_string(), "- a\n- b");
    }
}
