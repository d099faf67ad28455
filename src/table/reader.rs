// src/table/reader.rs
use csv::ReaderBuilder;
use std::{fs, path::Path};
use tracing::{debug, instrument, warn};

use super::Table;
use crate::error::{Result, ScoreError};

/// Candidate delimiters, most preferred first.
const CANDIDATES: &[u8] = b",\t;|:";

/// Guess the field delimiter from a header line.
///
/// Counts every candidate outside double-quoted sections and picks the most
/// frequent one; ties go to the earlier candidate. A space only counts when
/// no other candidate occurs, since header names may contain spaces. Returns
/// `None` when nothing matches.
pub fn sniff_delimiter(line: &str) -> Option<u8> {
    let mut counts = [0usize; CANDIDATES.len()];
    let mut in_quotes = false;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(idx) = CANDIDATES.iter().position(|&c| c == b) {
            counts[idx] += 1;
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (idx, &n) in counts.iter().enumerate() {
        if n > 0 && best.map_or(true, |(_, m)| n > m) {
            best = Some((idx, n));
        }
    }
    match best {
        Some((idx, _)) => Some(CANDIDATES[idx]),
        None if line.trim().contains(' ') => Some(b' '),
        None => None,
    }
}

/// Read a UTF-8 delimited file whose first row is the header.
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| ScoreError::io(path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| ScoreError::Parse {
        path: path.to_path_buf(),
        reason: format!("not valid UTF-8: {}", e),
    })?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let first_line = text.lines().next().unwrap_or("");
    let delimiter = match sniff_delimiter(first_line) {
        Some(d) => d,
        None => {
            warn!("could not sniff delimiter, falling back to comma");
            b','
        }
    };
    debug!(delimiter = %(delimiter as char).escape_default(), "sniffed dialect");

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| ScoreError::Parse {
            path: path.to_path_buf(),
            reason: format!("record {}: {}", idx, e),
        })?;
        records.push(record.iter().map(str::to_string).collect::<Vec<String>>());
    }

    let mut records = records.into_iter();
    let headers = records.next().ok_or_else(|| ScoreError::Parse {
        path: path.to_path_buf(),
        reason: "file has no header row".into(),
    })?;

    let table = Table::from_rows(path, headers, records.collect())?;
    debug!(
        columns = table.headers().len(),
        rows = table.row_count(),
        "read table"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter("id,response,category"), Some(b','));
        assert_eq!(sniff_delimiter("id\tresponse\tcategory"), Some(b'\t'));
        assert_eq!(sniff_delimiter("id;response;category"), Some(b';'));
        assert_eq!(sniff_delimiter("\"a,b\"\tc"), Some(b'\t'));
        assert_eq!(sniff_delimiter("single"), None);
        assert_eq!(sniff_delimiter("id response category"), Some(b' '));
        assert_eq!(sniff_delimiter("Trial ID,Response Value"), Some(b','));
        assert_eq!(sniff_delimiter(" single "), None);
    }

    #[test]
    fn reads_tab_separated_log() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("subject1.csv");
        fs::write(
            &path,
            "id\tresponse\tcategory\nT1\thappy\tMood;Energy\nT2\tsad\tMood\n",
        )?;

        let table = read_table(&path)?;
        assert_eq!(table.headers(), &["id", "response", "category"]);
        assert_eq!(table.column("category").unwrap()[0], "Mood;Energy");
        assert_eq!(table.row_count(), 2);
        Ok(())
    }

    #[test]
    fn reads_space_separated_log() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("subject2.csv");
        fs::write(&path, "id response\nT1 happy\n")?;

        let table = read_table(&path)?;
        assert_eq!(table.headers(), &["id", "response"]);
        assert_eq!(table.column("response").unwrap(), &["happy".to_string()][..]);
        Ok(())
    }

    #[test]
    fn falls_back_to_comma_for_single_column() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("one.csv");
        fs::write(&path, "\u{feff}id\nT1\nT2\n")?;
        let table = read_table(&path)?;
        assert_eq!(table.column("id").unwrap(), &["T1".to_string(), "T2".to_string()][..]);
        Ok(())
    }

    #[test]
    fn quoted_cells_keep_embedded_delimiters() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("quoted.csv");
        fs::write(&path, "id,answer_options\nT1,\"sad, very;happy\"\n")?;
        let table = read_table(&path)?;
        assert_eq!(table.column("answer_options").unwrap()[0], "sad, very;happy");
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.csv");
        fs::write(&path, [0x69, 0x64, 0x0a, 0xff, 0xfe])?;
        assert!(matches!(read_table(&path), Err(ScoreError::Parse { .. })));
        Ok(())
    }

    #[test]
    fn empty_file_is_a_parse_error() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.csv");
        fs::write(&path, "")?;
        assert!(matches!(read_table(&path), Err(ScoreError::Parse { .. })));
        Ok(())
    }

    #[test]
    fn ragged_file_is_rejected() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ragged.csv");
        fs::write(&path, "id,response\nT1,happy,extra\n")?;
        assert!(matches!(read_table(&path), Err(ScoreError::Parse { .. })));
        Ok(())
    }
}
