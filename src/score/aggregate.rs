// src/score/aggregate.rs
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::scorer::SubjectScores;

/// Statistics that can be reported per category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    Sum,
    Mean,
}

impl Statistic {
    pub fn as_str(&self) -> &str {
        match self {
            Statistic::Sum => "Sum",
            Statistic::Mean => "Mean",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Some(Statistic::Sum),
            "mean" => Some(Statistic::Mean),
            _ => None,
        }
    }

    pub fn of(&self, stats: &CategoryStats) -> f64 {
        match self {
            Statistic::Sum => stats.sum,
            Statistic::Mean => stats.mean,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CategoryStats {
    pub sum: f64,
    pub mean: f64,
}

impl CategoryStats {
    /// `None` for an empty score list.
    pub fn from_scores(scores: &[i64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let sum: f64 = scores.iter().map(|&s| s as f64).sum();
        Some(Self {
            sum,
            mean: sum / scores.len() as f64,
        })
    }
}

/// Shortest string that reads back as `value`, always with a fractional
/// part for integral values (`5.0`, `2.5`).
pub fn format_stat(value: f64) -> String {
    format!("{:?}", value)
}

/// Aggregated result of one subject file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectResult {
    pub categories: BTreeMap<String, CategoryStats>,
    pub scores: BTreeMap<String, i64>,
}

impl From<SubjectScores> for SubjectResult {
    fn from(scores: SubjectScores) -> Self {
        let categories = scores
            .by_category
            .iter()
            .filter_map(|(cat, list)| CategoryStats::from_scores(list).map(|s| (cat.clone(), s)))
            .collect();
        Self {
            categories,
            scores: scores.individual,
        }
    }
}

/// Results of every subject file in one batch folder, keyed by file name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResults {
    subjects: BTreeMap<String, SubjectResult>,
}

impl BatchResults {
    pub fn insert(&mut self, file_name: impl Into<String>, result: SubjectResult) {
        self.subjects.insert(file_name.into(), result);
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Every category seen in any file, sorted.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.subjects
            .values()
            .flat_map(|r| r.categories.keys().map(String::as_str))
            .collect()
    }

    /// Every trial id seen in any file, sorted.
    pub fn trial_ids(&self) -> BTreeSet<&str> {
        self.subjects
            .values()
            .flat_map(|r| r.scores.keys().map(String::as_str))
            .collect()
    }

    /// Wide layout: `Item`, `<category>_<statistic>` per category and
    /// statistic, then one column per trial id. One row per file, sorted by
    /// file name. Cells a file has no value for are left empty.
    pub fn to_rows(&self, statistics: &[Statistic]) -> (Vec<String>, Vec<Vec<String>>) {
        let categories = self.categories();
        let ids = self.trial_ids();

        let mut header = vec!["Item".to_string()];
        for cat in &categories {
            for stat in statistics {
                header.push(format!("{}_{}", cat, stat.as_str()));
            }
        }
        header.extend(ids.iter().map(|id| id.to_string()));

        let rows = self
            .subjects
            .iter()
            .map(|(file_name, result)| {
                let mut row = Vec::with_capacity(header.len());
                row.push(file_name.clone());
                for cat in &categories {
                    let stats = result.categories.get(*cat);
                    for stat in statistics {
                        row.push(stats.map(|s| format_stat(stat.of(s))).unwrap_or_default());
                    }
                }
                for id in &ids {
                    row.push(
                        result
                            .scores
                            .get(*id)
                            .map(|s| s.to_string())
                            .unwrap_or_default(),
                    );
                }
                row
            })
            .collect();

        (header, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(cats: &[(&str, &[i64])], scores: &[(&str, i64)]) -> SubjectResult {
        SubjectScores {
            individual: scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            by_category: cats.iter().map(|(k, v)| (k.to_string(), v.to_vec())).collect(),
        }
        .into()
    }

    #[test]
    fn sum_and_mean_match_arithmetic() {
        let stats = CategoryStats::from_scores(&[1, 2, 4]).unwrap();
        assert_eq!(stats.sum, 7.0);
        assert_eq!(stats.mean, 7.0 / 3.0);
        assert!(CategoryStats::from_scores(&[]).is_none());
    }

    #[test]
    fn formats_like_plain_floats() {
        assert_eq!(format_stat(5.0), "5.0");
        assert_eq!(format_stat(2.5), "2.5");
        assert_eq!(format_stat(-3.0), "-3.0");
        assert_eq!(format_stat(1.0 / 3.0), "0.3333333333333333");
    }

    #[test]
    fn statistic_names() {
        assert_eq!(Statistic::from_str(" MEAN "), Some(Statistic::Mean));
        assert_eq!(Statistic::Sum.as_str(), "Sum");
        assert_eq!(Statistic::from_str("median"), None);
    }

    #[test]
    fn wide_layout_is_sorted() {
        let mut batch = BatchResults::default();
        batch.insert(
            "b.csv",
            subject(
                &[("Mood", &[5][..]), ("Anxiety", &[1, 2][..])],
                &[("T2", 1), ("T1", 5)],
            ),
        );
        batch.insert("a.csv", subject(&[("Mood", &[3][..])], &[("T1", 3)]));

        let (header, rows) = batch.to_rows(&[Statistic::Sum, Statistic::Mean]);
        assert_eq!(
            header,
            vec!["Item", "Anxiety_Sum", "Anxiety_Mean", "Mood_Sum", "Mood_Mean", "T1", "T2"]
        );
        assert_eq!(rows[0], vec!["a.csv", "", "", "3.0", "3.0", "3", ""]);
        assert_eq!(rows[1], vec!["b.csv", "3.0", "1.5", "5.0", "5.0", "5", "1"]);
    }
}
