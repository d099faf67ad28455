pub mod aggregate;
pub mod definition;
pub mod scorer;

pub use aggregate::{format_stat, BatchResults, CategoryStats, Statistic, SubjectResult};
pub use definition::{
    read_responses, trials_from_columns, CustomDefinitions, ResponseRecord, TrialDefinition,
    TrialSet,
};
pub use scorer::{is_incomplete, score_subject, SubjectScores};
