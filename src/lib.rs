//! Questionnaire score aggregation.
//!
//! Reads per-subject response logs, resolves every logged answer to a score,
//! sums and averages the scores per category and writes one wide results
//! table per batch folder.

pub mod config;
pub mod error;
pub mod normalize;
pub mod process;
pub mod score;
pub mod table;

pub use config::{ColumnKeys, Config};
pub use error::{ColumnField, ScoreError};
pub use process::{LogSink, NullSink, Processor, ProgressSink, RunSummary};
