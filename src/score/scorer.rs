// src/score/scorer.rs
use std::collections::BTreeMap;
use tracing::trace;

use super::definition::{ResponseRecord, TrialSet};
use crate::error::{Result, ScoreError};

/// Resolved scores for one subject file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectScores {
    /// Trial id → resolved score.
    pub individual: BTreeMap<String, i64>,
    /// Category → scores of every trial tagged with it, in trial id order.
    pub by_category: BTreeMap<String, Vec<i64>>,
}

/// Resolve every defined trial against the subject's responses.
///
/// Trials are visited in id order. Responses whose id has no definition are
/// ignored, repeats included; a definition without a response, or logged on
/// more than one row, is an error.
pub fn score_subject(trials: &TrialSet, responses: &ResponseRecord) -> Result<SubjectScores> {
    let mut out = SubjectScores::default();

    for trial in trials.iter() {
        let response = responses
            .get(&trial.id)
            .ok_or_else(|| ScoreError::MissingResponse {
                id: trial.id.clone(),
                known: responses.ids().to_vec(),
            })?;
        if responses.is_repeated(&trial.id) {
            return Err(ScoreError::RepeatedResponse {
                id: trial.id.clone(),
            });
        }

        let score = trial
            .score_for(response)
            .ok_or_else(|| ScoreError::UnknownAnswer {
                id: trial.id.clone(),
                response: response.to_string(),
                valid: trial.answer_keys(),
            })?;
        trace!(id = %trial.id, response, score, "resolved");

        out.individual.insert(trial.id.clone(), score);
        for category in &trial.categories {
            out.by_category
                .entry(category.clone())
                .or_default()
                .push(score);
        }
    }

    Ok(out)
}

/// True when the definitions and the log disagree on how many trials exist.
pub fn is_incomplete(trials: &TrialSet, responses: &ResponseRecord) -> bool {
    trials.len() != responses.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn mood_trials() -> TrialSet {
        TrialSet::from_lists(
            &strings(&["T1", "T2"]),
            &strings(&["Mood", "Mood;Energy"]),
            &strings(&["sad;happy", "tired;fresh"]),
            &strings(&["1;5", "2;4"]),
            false,
        )
        .unwrap()
    }

    #[test]
    fn single_trial_scenario() {
        let trials = TrialSet::from_lists(
            &strings(&["T1"]),
            &strings(&["Mood"]),
            &strings(&["sad;happy"]),
            &strings(&["1;5"]),
            false,
        )
        .unwrap();
        let responses =
            ResponseRecord::from_lists(&strings(&["T1"]), &strings(&["happy"]), false);
        let scores = score_subject(&trials, &responses).unwrap();
        assert_eq!(scores.individual["T1"], 5);
        assert_eq!(scores.by_category["Mood"], vec![5]);
    }

    #[test]
    fn trial_fans_out_to_every_category() {
        let responses = ResponseRecord::from_lists(
            &strings(&["T2", "T1"]),
            &strings(&["fresh", "sad"]),
            false,
        );
        let scores = score_subject(&mood_trials(), &responses).unwrap();
        assert_eq!(scores.by_category["Mood"], vec![1, 4]);
        assert_eq!(scores.by_category["Energy"], vec![4]);
        assert!(!is_incomplete(&mood_trials(), &responses));
    }

    #[test]
    fn missing_response_names_id_and_known_ids() {
        let responses =
            ResponseRecord::from_lists(&strings(&["T1", "T3"]), &strings(&["sad", "x"]), false);
        match score_subject(&mood_trials(), &responses) {
            Err(ScoreError::MissingResponse { id, known }) => {
                assert_eq!(id, "T2");
                assert_eq!(known, strings(&["T1", "T3"]));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn unknown_answer_lists_valid_options() {
        let responses = ResponseRecord::from_lists(
            &strings(&["T1", "T2"]),
            &strings(&["meh", "fresh"]),
            false,
        );
        match score_subject(&mood_trials(), &responses) {
            Err(ScoreError::UnknownAnswer { id, response, valid }) => {
                assert_eq!(id, "T1");
                assert_eq!(response, "meh");
                assert_eq!(valid, strings(&["sad", "happy"]));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn extra_responses_only_flag_incomplete() {
        let responses = ResponseRecord::from_lists(
            &strings(&["T1", "T2", "T9"]),
            &strings(&["happy", "tired", "whatever"]),
            false,
        );
        let scores = score_subject(&mood_trials(), &responses).unwrap();
        assert_eq!(scores.individual.len(), 2);
        assert!(is_incomplete(&mood_trials(), &responses));
    }

    #[test]
    fn repeated_undefined_ids_are_ignored() {
        let responses = ResponseRecord::from_lists(
            &strings(&["practice", "T1", "", "practice", "", "T2"]),
            &strings(&["ok", "sad", "", "ok", "", "fresh"]),
            false,
        );
        let scores = score_subject(&mood_trials(), &responses).unwrap();
        assert_eq!(scores.individual["T1"], 1);
        assert_eq!(scores.individual["T2"], 4);
        assert!(is_incomplete(&mood_trials(), &responses));
    }

    #[test]
    fn repeated_defined_id_is_an_error() {
        let responses = ResponseRecord::from_lists(
            &strings(&["T1", "T2", "T1"]),
            &strings(&["sad", "fresh", "happy"]),
            false,
        );
        match score_subject(&mood_trials(), &responses) {
            Err(ScoreError::RepeatedResponse { id }) => assert_eq!(id, "T1"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
