//! JSONL I/O and atomic file operations

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Append one JSON record as a line, creating parent directories as needed
pub fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let line = serde_json::to_string(record)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Read every well-formed record from a JSONL file.
///
/// A missing file reads as empty. Lines that fail to parse are skipped with a
/// warning so one torn write never hides the rest of the log.
pub fn read_jsonl<T: for<'de> Deserialize<'de>>(path: &Path) -> std::io::Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), line = number + 1, error = %e, "skipping malformed record");
            }
        }
    }

    Ok(records)
}

/// Replace `path` with `data` via a sibling temp file and rename
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(format!(".{}.tmp", std::process::id()));
    let temp_path = std::path::PathBuf::from(temp_name);

    std::fs::write(&temp_path, data)?;
    std::fs::rename(&temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        job_id: String,
        clicks: u32,
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let rows: Vec<Row> = read_jsonl(&dir.path().join("absent.jsonl")).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = dir.path().join("nested").join("events.jsonl");

        append_jsonl(&log, &Row { job_id: "job1".into(), clicks: 1 }).unwrap();
        let mut file = OpenOptions::new().append(true).open(&log).unwrap();
        writeln!(file, "{{\"job_id\": \"torn").unwrap();
        writeln!(file).unwrap();
        append_jsonl(&log, &Row { job_id: "job2".into(), clicks: 3 }).unwrap();

        let rows: Vec<Row> = read_jsonl(&log).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].job_id, "job2");
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("state").join("pf_session");

        atomic_write(&target, b"first").unwrap();
        atomic_write(&target, b"second").unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"second");
        let leftovers = std::fs::read_dir(target.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1, "temp file should be renamed away");
    }
}
