//! Append-only JSONL journal.
//!
//! Records are appended one JSON object per line with file locking to
//! ensure safe concurrent access. A torn final line from an interrupted
//! write is skipped on read, so readers see either the old or the new state.

use crate::Result;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

/// JSONL journal of `T` records
#[derive(Debug)]
pub struct Journal<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> Journal<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a journal for the given path (the file is created on first append)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append one record
    pub fn append(&self, record: &T) -> Result<()> {
        self.ensure_parent_dir()?;

        // Serialize before touching the file so a bad record never leaves a partial line
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        // Terminate a torn line left by an interrupted writer
        if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                line.insert(0, '\n');
            }
        }

        let mut writer = std::io::BufWriter::new(&file);
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        drop(writer);
        file.sync_data()?;

        file.unlock()?;

        tracing::debug!("Appended record to {:?}", self.path);
        Ok(())
    }

    /// Read every parseable record in append order
    pub fn read_all(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        // Acquire shared lock for reading
        file.lock_shared()?;

        let reader = BufReader::new(&file);
        let mut records = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<T>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        "Skipping unreadable record at {:?} line {}: {}",
                        self.path,
                        line_num + 1,
                        e
                    );
                }
            }
        }

        file.unlock()?;
        tracing::debug!("Read {} records from {:?}", records.len(), self.path);
        Ok(records)
    }
}
