//! Saved temp-target presets.
//!
//! The preset list is held in memory in display order and rewritten as a
//! whole on every mutation. Writes go to a temp file in the same directory
//! which is renamed over the original only after it is synced, so a failed
//! write leaves the previous list in place.

use crate::{Error, Result, TempTarget};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Ordered collection of named presets, keyed by id
#[derive(Debug)]
pub struct PresetRepository {
    path: PathBuf,
    presets: Vec<TempTarget>,
}

impl PresetRepository {
    /// Load presets from a file with shared locking
    ///
    /// Returns an empty list if the file doesn't exist.
    /// If the file is corrupted, logs a warning and starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let presets = read_presets(&path);
        Ok(Self { path, presets })
    }

    /// Current presets in insertion order
    pub fn list(&self) -> &[TempTarget] {
        &self.presets
    }

    pub fn get(&self, id: &str) -> Option<&TempTarget> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Add a preset at the end of the list and persist
    ///
    /// Fails with `DuplicatePreset` (and changes nothing) if the id is taken.
    pub fn append(&mut self, entry: TempTarget) -> Result<()> {
        if self.get(&entry.id).is_some() {
            return Err(Error::DuplicatePreset(entry.id));
        }
        tracing::debug!("Appending preset {} ({})", entry.id, entry.name);
        self.presets.push(entry);
        self.persist()
    }

    /// Replace the preset with `id` in place and persist
    ///
    /// Returns `Ok(false)` without writing if no preset has that id.
    pub fn replace(&mut self, id: &str, updated: TempTarget) -> Result<bool> {
        match self.presets.iter().position(|p| p.id == id) {
            Some(index) => {
                self.presets[index] = updated;
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the preset with `id` and persist the remaining list
    ///
    /// Returns `Ok(false)` without writing if no preset has that id.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let before = self.presets.len();
        self.presets.retain(|p| p.id != id);
        if self.presets.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Atomically write the whole list:
    /// 1. Write to a temp file
    /// 2. Sync to disk
    /// 3. Rename over the original
    fn persist(&self) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::Other(format!("preset path {:?} has no parent directory", self.path))
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;

        // Serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(&self.presets)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} presets to {:?}", self.presets.len(), self.path);
        Ok(())
    }
}

fn read_presets(path: &Path) -> Vec<TempTarget> {
    if !path.exists() {
        tracing::info!("No preset file found at {:?}, starting empty", path);
        return Vec::new();
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open preset file {:?}: {}. Starting empty.", path, e);
            return Vec::new();
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock preset file {:?}: {}. Starting empty.", path, e);
        return Vec::new();
    }

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    let _ = file.unlock();
    if let Err(e) = read {
        tracing::warn!("Failed to read preset file {:?}: {}. Starting empty.", path, e);
        return Vec::new();
    }

    match serde_json::from_str::<Vec<TempTarget>>(&contents) {
        Ok(presets) => {
            tracing::debug!("Loaded {} presets from {:?}", presets.len(), path);
            presets
        }
        Err(e) => {
            tracing::warn!("Failed to parse preset file {:?}: {}. Starting empty.", path, e);
            Vec::new()
        }
    }
}
