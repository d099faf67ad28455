// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::error::ScoreError;
use crate::normalize::find_illegal;
use crate::score::{CustomDefinitions, Statistic};

/// Column names looked up in each subject log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnKeys {
    pub response: String,
    pub id: String,
    pub category: String,
    pub answer: String,
    pub score: String,
}

impl Default for ColumnKeys {
    fn default() -> Self {
        Self {
            response: "response".into(),
            id: "id".into(),
            category: "category".into(),
            answer: "answer_options".into(),
            score: "answer_options_scores".into(),
        }
    }
}

/// Settings for one scoring run. Built once at startup and handed to the
/// processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extensions (without the dot) of files treated as subject logs.
    pub data_extensions: Vec<String>,
    pub result_extension: String,
    pub result_delimiter: char,
    /// Statistics written per category, in column order.
    pub statistics: Vec<Statistic>,
    pub columns: ColumnKeys,
    pub case_insensitive: bool,
    /// Characters not allowed in column keys or custom definitions.
    pub illegal_characters: Vec<char>,
    /// When set, trial definitions come from here instead of each log.
    pub custom: Option<CustomDefinitions>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_extensions: vec!["csv".into()],
            result_extension: "csv".into(),
            result_delimiter: ',',
            statistics: vec![Statistic::Sum, Statistic::Mean],
            columns: ColumnKeys::default(),
            case_insensitive: false,
            illegal_characters: vec!['"', '\\', '\t'],
            custom: None,
        }
    }
}

impl Config {
    /// Load a YAML config file. Keys it leaves out keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// `Some(path)` → [`Config::load`], `None` → defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("serializing config")
    }

    /// The output delimiter as a single byte.
    pub fn delimiter_byte(&self) -> Result<u8, ScoreError> {
        if self.result_delimiter.is_ascii() {
            Ok(self.result_delimiter as u8)
        } else {
            Err(ScoreError::Validation(vec![format!(
                "- Result delimiter {:?} must be a single ASCII character",
                self.result_delimiter
            )]))
        }
    }

    /// Sanity checks on everything except custom definitions, collected into
    /// one `Validation` error.
    pub fn validate(&self) -> Result<(), ScoreError> {
        let mut problems = Vec::new();

        let keys = [
            ("response", &self.columns.response),
            ("id", &self.columns.id),
            ("category", &self.columns.category),
            ("answer", &self.columns.answer),
            ("score", &self.columns.score),
        ];
        // custom mode only reads the response and id columns
        let needed = if self.custom.is_some() { 2 } else { keys.len() };
        if keys[..needed].iter().any(|(_, k)| k.trim().is_empty()) {
            problems.push("- Not all column names are defined".to_string());
        }
        for (name, key) in &keys[..needed] {
            let found = find_illegal(key, &self.illegal_characters);
            if !found.is_empty() {
                problems.push(format!(
                    "- Column name for \"{}\" contains characters that are not allowed: {:?}",
                    name, found
                ));
            }
        }

        if self.data_extensions.iter().all(|e| e.trim().is_empty()) {
            problems.push("- No data file extensions are configured".into());
        }
        if self.statistics.is_empty() {
            problems.push("- No statistics are configured".into());
        }
        if let Err(ScoreError::Validation(mut more)) = self.delimiter_byte() {
            problems.append(&mut more);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ScoreError::Validation(problems))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.data_extensions, vec!["csv"]);
        assert_eq!(config.statistics, vec![Statistic::Sum, Statistic::Mean]);
        assert_eq!(config.columns.score, "answer_options_scores");
        assert_eq!(config.delimiter_byte().unwrap(), b',');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("scorer.yaml");
        fs::write(
            &path,
            r#"
result_delimiter: "\t"
case_insensitive: true
columns:
  response: answer
custom:
  ids: "T1\nT2\n"
  categories: "Mood\nMood\n"
  answers: "sad;happy"
  scores: "1;5\n5;1\n"
"#,
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.delimiter_byte()?, b'\t');
        assert!(config.case_insensitive);
        assert_eq!(config.columns.response, "answer");
        assert_eq!(config.columns.id, "id");
        assert_eq!(config.result_extension, "csv");
        let custom = config.custom.as_ref().expect("custom block");
        assert_eq!(custom.answers, "sad;happy");
        Ok(())
    }

    #[test]
    fn yaml_round_trip() -> anyhow::Result<()> {
        let config = Config::default();
        let back: Config = serde_yaml::from_str(&config.to_yaml()?)?;
        assert_eq!(back, config);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load("/definitely/not/here.yaml").is_err());
        assert!(Config::load_or_default(None).is_ok());
    }

    #[test]
    fn validate_reports_every_problem() {
        let mut config = Config::default();
        config.columns.category = " ".into();
        config.columns.id = "trial\"id".into();
        config.result_delimiter = '§';
        config.statistics.clear();
        match config.validate() {
            Err(ScoreError::Validation(problems)) => assert_eq!(problems.len(), 4),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn custom_mode_ignores_definition_columns() {
        let mut config = Config::default();
        config.columns.category.clear();
        config.custom = Some(CustomDefinitions::default());
        assert!(config.validate().is_ok());
    }
}
