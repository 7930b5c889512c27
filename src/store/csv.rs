//! Append-only CSV sink, one file per source.
//!
//! The header line is fixed at construction and written exactly once, when the
//! file is first created. Lines are `timestamp_ms,value`; the value itself may
//! carry further comma-separated columns (the header names them).

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
    sync::Mutex,
};

use anyhow::{Context, Result};

use super::RecordSink;

pub struct CsvSink {
    path: PathBuf,
    header: String,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl CsvSink {
    pub fn new(path: PathBuf, header: &str) -> Self {
        Self {
            path,
            header: header.to_string(),
            writer: Mutex::new(None),
        }
    }

    /// Opens the file on first use so a disabled source never touches disk.
    fn open(&self) -> Result<BufWriter<File>> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create sink directory {}", parent.display())
            })?;
        }

        let is_new = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open sink file {}", self.path.display()))?;

        let mut writer = BufWriter::new(file);
        if is_new {
            writeln!(writer, "{}", self.header)
                .with_context(|| format!("failed to write header to {}", self.path.display()))?;
        }

        Ok(writer)
    }
}

impl RecordSink for CsvSink {
    fn append(&self, timestamp_ms: i64, value: &str) -> Result<()> {
        let mut guard = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if guard.is_none() {
            *guard = Some(self.open()?);
        }

        let writer = guard.as_mut().expect("writer opened above");
        writeln!(writer, "{timestamp_ms},{value}")
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        writer
            .flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut guard = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(writer) = guard.as_mut() {
            writer
                .flush()
                .with_context(|| format!("failed to flush {}", self.path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_csv_path() -> PathBuf {
        std::env::temp_dir().join(format!("sensekit-sink-{}.csv", uuid::Uuid::new_v4()))
    }

    #[test]
    fn header_is_written_exactly_once() {
        let path = temp_csv_path();
        let sink = CsvSink::new(path.clone(), "TimeUnix,Value");

        sink.append(1000, "true").unwrap();
        sink.append(2000, "false").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["TimeUnix,Value", "1000,true", "2000,false"]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn reopening_an_existing_file_does_not_repeat_the_header() {
        let path = temp_csv_path();
        {
            let sink = CsvSink::new(path.clone(), "TimeUnix,Value");
            sink.append(1, "a").unwrap();
        }
        {
            let sink = CsvSink::new(path.clone(), "TimeUnix,Value");
            sink.append(2, "b").unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let header_count = contents
            .lines()
            .filter(|line| *line == "TimeUnix,Value")
            .count();
        assert_eq!(header_count, 1);
        assert!(contents.lines().any(|line| line == "2,b"));

        std::fs::remove_file(&path).ok();
    }
}
