// src/process/mod.rs
pub mod sink;

pub use sink::{LogSink, NullSink, ProgressSink, RecordingSink};

use glob::{glob_with, MatchOptions, Pattern};
use std::{
    borrow::Cow,
    io,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::error::{Result, ScoreError};
use crate::score::{
    is_incomplete, read_responses, score_subject, trials_from_columns, BatchResults,
    SubjectResult, TrialSet,
};
use crate::table::{commit_all, read_table, stage_rows};

/// Stem of every results file.
pub const RESULT_STEM: &str = "Cumulative_Score_Results";

/// What a finished run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Results files, in batch order.
    pub outputs: Vec<PathBuf>,
    pub files_processed: usize,
    /// Batches where at least one log had a different number of trials than
    /// were defined.
    pub incomplete_batches: Vec<String>,
}

impl RunSummary {
    pub fn is_incomplete(&self) -> bool {
        !self.incomplete_batches.is_empty()
    }

    /// The end-of-run warning, if there is one.
    pub fn incomplete_warning(&self) -> Option<String> {
        if !self.is_incomplete() {
            return None;
        }
        Some(format!(
            "Warning:\n\nLog file contains more trials than were defined, only defined trials were processed!\nAffected: {}",
            self.incomplete_batches.join(", ")
        ))
    }
}

/// Scores every subject log under a source folder.
pub struct Processor {
    config: Config,
    /// Custom definitions, checked and built once up front.
    custom: Option<TrialSet>,
    delimiter: u8,
}

impl Processor {
    /// Validate `config` and, in custom mode, build the batch-wide trial
    /// definitions. Nothing is read from disk here.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let delimiter = config.delimiter_byte()?;
        let custom = match &config.custom {
            Some(defs) => Some(defs.prepare(&config.illegal_characters, config.case_insensitive)?),
            None => None,
        };
        Ok(Self {
            config,
            custom,
            delimiter,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process every batch under `source` and write one results file per
    /// batch into `dest`.
    ///
    /// The first fatal error aborts the run and is reported to `sink`; results
    /// files are only written once every batch has been scored.
    pub fn run(&self, source: &Path, dest: &Path, sink: &mut dyn ProgressSink) -> Result<RunSummary> {
        match self.run_batches(source, dest, sink) {
            Ok(summary) => {
                if let Some(warning) = summary.incomplete_warning() {
                    warn!(batches = ?summary.incomplete_batches, "trial counts differ from definitions");
                    sink.report_error(&warning);
                }
                sink.set_progress(100);
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, "run aborted");
                sink.report_error(&e.to_string());
                Err(e)
            }
        }
    }

    fn run_batches(&self, source: &Path, dest: &Path, sink: &mut dyn ProgressSink) -> Result<RunSummary> {
        let start = Instant::now();

        let folders = list_batch_folders(source)?;
        let single = folders.is_empty();
        let folders = if single {
            vec![source.to_path_buf()]
        } else {
            folders
        };

        let mut plan = Vec::with_capacity(folders.len());
        for folder in folders {
            let files = list_data_files(&folder, &self.config.data_extensions)?;
            plan.push((folder, files));
        }
        let total: usize = plan.iter().map(|(_, files)| files.len()).sum();
        info!(batches = plan.len(), files = total, "starting run");

        let mut summary = RunSummary::default();
        let mut pending: Vec<(PathBuf, BatchResults)> = Vec::new();
        let mut done = 0usize;

        for (folder, files) in &plan {
            let name = batch_name(folder);
            let mut results = BatchResults::default();
            let mut incomplete = false;

            for file in files {
                let (result, file_incomplete) = self.process_file(file)?;
                incomplete |= file_incomplete;
                results.insert(file_name(file), result);
                done += 1;
                sink.set_progress(percent(done, total));
            }

            if incomplete {
                summary.incomplete_batches.push(name.clone());
            }
            if results.is_empty() {
                warn!(folder = %folder.display(), "no data files, skipping batch");
                continue;
            }

            let batch = if single { None } else { Some(name.as_str()) };
            let out = dest.join(output_file_name(batch, &self.config.result_extension));
            pending.push((out, results));
        }

        let mut staged = Vec::with_capacity(pending.len());
        for (out, results) in &pending {
            let (header, rows) = results.to_rows(&self.config.statistics);
            staged.push(stage_rows(out, &header, &rows, self.delimiter)?);
            debug!(path = %out.display(), subjects = results.len(), "staged results");
        }
        summary.outputs = commit_all(staged)?;
        for out in &summary.outputs {
            info!(path = %out.display(), "saved results");
        }

        summary.files_processed = done;
        info!(files = done, elapsed = ?start.elapsed(), "run complete");
        Ok(summary)
    }

    /// Score one subject log. The flag is set when the log and the trial
    /// definitions disagree on the number of trials.
    #[instrument(level = "info", skip(self, path), fields(file = %path.display()))]
    pub fn process_file(&self, path: &Path) -> Result<(SubjectResult, bool)> {
        let table = read_table(path)?;
        let keys = &self.config.columns;
        let case_insensitive = self.config.case_insensitive;

        let responses = read_responses(&table, keys, case_insensitive)?;
        let trials: Cow<'_, TrialSet> = match &self.custom {
            Some(set) => Cow::Borrowed(set),
            None => Cow::Owned(trials_from_columns(&table, keys, case_insensitive)?),
        };

        let incomplete = is_incomplete(&trials, &responses);
        if incomplete {
            debug!(
                defined = trials.len(),
                logged = responses.len(),
                "trial count mismatch"
            );
        }

        let scores = score_subject(&trials, &responses)?;
        Ok((SubjectResult::from(scores), incomplete))
    }
}

/// `Cumulative_Score_Results.<ext>` for a single batch,
/// `<batch>_Cumulative_Score_Results.<ext>` otherwise.
pub fn output_file_name(batch: Option<&str>, extension: &str) -> String {
    match batch {
        Some(name) => format!("{}_{}.{}", name, RESULT_STEM, extension),
        None => format!("{}.{}", RESULT_STEM, extension),
    }
}

/// Immediate, non-hidden sub-folders of `source`, sorted.
pub fn list_batch_folders(source: &Path) -> Result<Vec<PathBuf>> {
    if !source.is_dir() {
        return Err(ScoreError::io(
            source,
            io::Error::new(io::ErrorKind::NotFound, "source folder does not exist"),
        ));
    }
    let pattern = format!("{}/*", Pattern::escape(&source.to_string_lossy()));
    let mut folders: Vec<PathBuf> = glob_entries(source, &pattern)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();
    folders.sort();
    Ok(folders)
}

/// Files directly in `folder` with one of `extensions`, sorted.
pub fn list_data_files(folder: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let base = Pattern::escape(&folder.to_string_lossy());
    let mut files = Vec::new();
    for ext in extensions {
        let ext = ext.trim().trim_start_matches('.');
        if ext.is_empty() {
            continue;
        }
        let pattern = format!("{}/*.{}", base, Pattern::escape(ext));
        files.extend(glob_entries(folder, &pattern)?.into_iter().filter(|p| p.is_file()));
    }
    files.sort();
    files.dedup();
    debug!(folder = %folder.display(), files = files.len(), "listed data files");
    Ok(files)
}

fn glob_entries(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let paths = glob_with(pattern, options)
        .map_err(|e| ScoreError::io(dir, io::Error::new(io::ErrorKind::InvalidInput, e)))?;
    let mut out = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => out.push(path),
            Err(e) => warn!(error = %e, "skipping unreadable entry"),
        }
    }
    Ok(out)
}

fn batch_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| folder.display().to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100) / total).min(100) as u8
}
