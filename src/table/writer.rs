// src/table/writer.rs
use csv::WriterBuilder;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{Result, ScoreError};

/// A fully written table sitting in a temp file next to its destination.
/// Dropping it without [`StagedTable::commit`] deletes the temp file.
#[derive(Debug)]
pub struct StagedTable {
    tmp: NamedTempFile,
    path: PathBuf,
}

impl StagedTable {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the temp file over the destination path.
    pub fn commit(self) -> Result<PathBuf> {
        let StagedTable { tmp, path } = self;
        tmp.persist(&path).map_err(|e| ScoreError::io(&path, e.error))?;
        debug!(path = %path.display(), "committed table");
        Ok(path)
    }
}

/// Write `headers` then `rows` as UTF-8 delimited text into a temp file in
/// the destination directory. Nothing appears at `path` until the returned
/// table is committed.
pub fn stage_rows<P: AsRef<Path>>(
    path: P,
    headers: &[String],
    rows: &[Vec<String>],
    delimiter: u8,
) -> Result<StagedTable> {
    let path = path.as_ref();
    let dir: PathBuf = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| ScoreError::io(&dir, e))?;

    let tmp = NamedTempFile::new_in(&dir).map_err(|e| ScoreError::io(&dir, e))?;
    {
        let mut wtr = WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_writer(tmp.as_file());
        wtr.write_record(headers).map_err(|e| csv_io(path, e))?;
        for row in rows {
            wtr.write_record(row).map_err(|e| csv_io(path, e))?;
        }
        wtr.flush().map_err(|e| ScoreError::io(path, e))?;
    }
    debug!(path = %path.display(), rows = rows.len(), "staged table");

    Ok(StagedTable {
        tmp,
        path: path.to_path_buf(),
    })
}

/// Commit every staged table in order. If one rename fails, the files already
/// committed are removed again and the uncommitted temp files are dropped.
pub fn commit_all(staged: Vec<StagedTable>) -> Result<Vec<PathBuf>> {
    let mut committed = Vec::with_capacity(staged.len());
    for table in staged {
        match table.commit() {
            Ok(path) => committed.push(path),
            Err(e) => {
                for path in &committed {
                    if let Err(rm) = fs::remove_file(path) {
                        warn!(path = %path.display(), error = %rm, "could not roll back output");
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(committed)
}

fn csv_io(path: &Path, e: csv::Error) -> ScoreError {
    ScoreError::io(path, std::io::Error::new(std::io::ErrorKind::Other, e))
}
