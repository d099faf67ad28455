// src/score/definition.rs
//
// Trial definitions and subject responses, built either from the columns of a
// log file or once from batch-wide custom lists.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::ColumnKeys;
use crate::error::{ColumnField, Result, ScoreError};
use crate::normalize::{
    clean_up_string, clean_up_string_list, find_illegal, lowercase_list, remove_junk, split_fields,
    split_lines, FIELD_SEPARATOR,
};
use crate::table::Table;

/// One questionnaire item.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialDefinition {
    pub id: String,
    /// Category labels, de-duplicated, in first-seen order.
    pub categories: Vec<String>,
    /// (answer text, score) pairs in definition order. Answer text is already
    /// lower-cased when the set was built case-insensitively.
    pub answers: Vec<(String, i64)>,
}

impl TrialDefinition {
    /// Score for `response`. A repeated answer text resolves to its last score.
    pub fn score_for(&self, response: &str) -> Option<i64> {
        self.answers
            .iter()
            .rev()
            .find(|(answer, _)| answer == response)
            .map(|(_, score)| *score)
    }

    pub fn answer_keys(&self) -> Vec<String> {
        self.answers.iter().map(|(a, _)| a.clone()).collect()
    }
}

/// All trial definitions for one subject file, keyed and ordered by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialSet {
    trials: BTreeMap<String, TrialDefinition>,
}

impl TrialSet {
    /// Build trials from parallel, already cleaned lists. `answers[i]` and
    /// `scores[i]` are `;`-joined and must have the same number of fields.
    pub fn from_lists(
        ids: &[String],
        categories: &[String],
        answers: &[String],
        scores: &[String],
        case_insensitive: bool,
    ) -> Result<Self> {
        let problems = check_definition_lists(ids, categories, answers, scores);
        if !problems.is_empty() {
            return Err(ScoreError::Validation(problems));
        }

        let mut trials = BTreeMap::new();
        for (idx, id) in ids.iter().enumerate() {
            let mut cats: Vec<String> = Vec::new();
            for c in split_fields(&categories[idx]) {
                if !cats.contains(&c) {
                    cats.push(c);
                }
            }

            let answer_items = split_fields(&answers[idx]);
            let score_items = split_fields(&scores[idx]);
            let mut pairs = Vec::with_capacity(answer_items.len());
            for (answer, score) in answer_items.into_iter().zip(score_items) {
                let value = parse_score(&score).ok_or_else(|| {
                    ScoreError::Validation(vec![format!(
                        "- Score \"{}\" of trial \"{}\" is not an integer",
                        score, id
                    )])
                })?;
                let answer = if case_insensitive {
                    answer.to_lowercase()
                } else {
                    answer
                };
                pairs.push((answer, value));
            }

            let def = TrialDefinition {
                id: id.clone(),
                categories: cats,
                answers: pairs,
            };
            if trials.insert(id.clone(), def).is_some() {
                return Err(ScoreError::DuplicateTrial { id: id.clone() });
            }
        }
        Ok(Self { trials })
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TrialDefinition> {
        self.trials.get(id)
    }

    /// Trials in lexicographic id order.
    pub fn iter(&self) -> impl Iterator<Item = &TrialDefinition> {
        self.trials.values()
    }
}

/// A subject's logged answers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseRecord {
    /// Ids in log order, for error messages.
    ids: Vec<String>,
    responses: BTreeMap<String, String>,
    /// Ids logged on more than one row.
    repeated: BTreeSet<String>,
}

impl ResponseRecord {
    /// Pair `ids[i]` with `responses[i]`. A missing response cell reads as an
    /// empty answer; responses beyond the last id are ignored. When an id is
    /// logged twice the later row wins and the id is remembered as repeated.
    pub fn from_lists(ids: &[String], responses: &[String], case_insensitive: bool) -> Self {
        let responses = if case_insensitive {
            lowercase_list(responses)
        } else {
            responses.to_vec()
        };
        let mut map = BTreeMap::new();
        let mut repeated = BTreeSet::new();
        for (idx, id) in ids.iter().enumerate() {
            let response = responses.get(idx).cloned().unwrap_or_default();
            if map.insert(id.clone(), response).is_some() {
                repeated.insert(id.clone());
            }
        }
        if !repeated.is_empty() {
            debug!(ids = ?repeated, "log repeats trial ids");
        }
        Self {
            ids: ids.to_vec(),
            responses: map,
            repeated,
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.responses.get(id).map(String::as_str)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn is_repeated(&self, id: &str) -> bool {
        self.repeated.contains(id)
    }

    /// Number of logged rows, repeats included.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Batch-wide trial definitions typed in by the user instead of read from
/// each log. Each field is a multi-line text block as entered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomDefinitions {
    /// One trial id per line.
    pub ids: String,
    /// One `;`-joined category list per line.
    pub categories: String,
    /// A single `;`-joined list of answer options shared by every trial.
    pub answers: String,
    /// One `;`-joined score list per line, parallel to `answers`.
    pub scores: String,
}

impl CustomDefinitions {
    /// Pre-flight check and conversion into a [`TrialSet`]. Every problem is
    /// collected into a single `Validation` error.
    pub fn prepare(&self, illegal: &[char], case_insensitive: bool) -> Result<TrialSet> {
        let mut problems = Vec::new();
        for (name, value) in [
            ("ids", &self.ids),
            ("categories", &self.categories),
            ("answers", &self.answers),
            ("scores", &self.scores),
        ] {
            let found = find_illegal(value, illegal);
            if !found.is_empty() {
                problems.push(format!(
                    "- Field \"{}\" contains characters that are not allowed: {}",
                    name,
                    describe_chars(&found)
                ));
            }
        }
        if !problems.is_empty() {
            return Err(ScoreError::Validation(problems));
        }

        let ids = remove_junk(&split_lines(&self.ids));
        let categories = clean_up_string_list(&split_lines(&self.categories), FIELD_SEPARATOR);
        let scores = clean_up_string_list(&split_lines(&self.scores), FIELD_SEPARATOR);
        let answer_string = clean_up_string(&self.answers, FIELD_SEPARATOR);
        let n_answers = split_fields(&answer_string).len();

        if ids.is_empty() {
            problems.push("- No trial ids are defined".into());
        }
        if !(ids.len() == categories.len() && categories.len() == scores.len()) {
            problems.push(format!(
                "- Not all fields have the correct number of elements ({} ids, {} categories, {} score lines)",
                ids.len(),
                categories.len(),
                scores.len()
            ));
        }
        let mut widths: Vec<usize> = scores.iter().map(|s| split_fields(s).len()).collect();
        widths.sort_unstable();
        widths.dedup();
        if widths.len() > 1 || widths.first().is_some_and(|&w| w != n_answers) {
            problems.push(format!(
                "- Every score line must have {} values separated by \";\", one per answer option",
                n_answers
            ));
        }
        if !scores
            .iter()
            .flat_map(|s| split_fields(s))
            .all(|t| parse_score(&t).is_some())
        {
            problems.push(
                "- Field \"score\" should contain only integers separated by \";\", found other characters"
                    .into(),
            );
        }
        if !problems.is_empty() {
            return Err(ScoreError::Validation(problems));
        }

        let answers = vec![answer_string; ids.len()];
        let set = TrialSet::from_lists(&ids, &categories, &answers, &scores, case_insensitive)?;
        debug!(trials = set.len(), answers = n_answers, "prepared custom definitions");
        Ok(set)
    }
}

/// Read the subject's responses from the response and id columns.
pub fn read_responses(table: &Table, keys: &ColumnKeys, case_insensitive: bool) -> Result<ResponseRecord> {
    let responses = remove_junk(require(table, ColumnField::Response, &keys.response)?);
    let ids = remove_junk(require(table, ColumnField::Id, &keys.id)?);
    Ok(ResponseRecord::from_lists(&ids, &responses, case_insensitive))
}

/// Build trial definitions from the id, answer, category and score columns.
pub fn trials_from_columns(table: &Table, keys: &ColumnKeys, case_insensitive: bool) -> Result<TrialSet> {
    let ids = remove_junk(require(table, ColumnField::Id, &keys.id)?);
    let answers = require(table, ColumnField::Answer, &keys.answer)?;
    let categories = require(table, ColumnField::Category, &keys.category)?;
    let scores = require(table, ColumnField::Score, &keys.score)?;

    let answers = clean_up_string_list(answers, FIELD_SEPARATOR);
    let categories = clean_up_string_list(categories, FIELD_SEPARATOR);
    let scores = clean_up_string_list(scores, FIELD_SEPARATOR);

    TrialSet::from_lists(&ids, &categories, &answers, &scores, case_insensitive)
}

fn require<'t>(table: &'t Table, field: ColumnField, name: &str) -> Result<&'t [String]> {
    table.column(name).ok_or_else(|| ScoreError::MissingColumn {
        field,
        column: name.to_string(),
    })
}

/// Checks that must hold before [`TrialSet::from_lists`] zips the lists.
fn check_definition_lists(
    ids: &[String],
    categories: &[String],
    answers: &[String],
    scores: &[String],
) -> Vec<String> {
    let mut problems = Vec::new();
    if ids.len() > categories.len() || ids.len() > answers.len() || ids.len() > scores.len() {
        problems.push(format!(
            "- Not all fields have the correct number of elements ({} ids, {} categories, {} answer lists, {} score lists)",
            ids.len(),
            categories.len(),
            answers.len(),
            scores.len()
        ));
        return problems;
    }
    for (idx, id) in ids.iter().enumerate() {
        let n_answers = split_fields(&answers[idx]).len();
        let n_scores = split_fields(&scores[idx]).len();
        if n_answers != n_scores {
            problems.push(format!(
                "- Trial \"{}\" has {} answer options but {} scores",
                id, n_answers, n_scores
            ));
        }
    }
    problems
}

fn parse_score(token: &str) -> Option<i64> {
    token.trim().parse::<i64>().ok()
}

fn describe_chars(chars: &[char]) -> String {
    chars
        .iter()
        .map(|c| match c {
            '"' => "double-quote (\")".to_string(),
            '\\' => "backslash (\\)".to_string(),
            '\t' => "tab".to_string(),
            other => format!("{:?}", other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
