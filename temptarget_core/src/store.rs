//! Collaborators the controller writes to: the loop's live temp-target store
//! and the editor that closes after an action.

use crate::journal::Journal;
use crate::{Result, TempTarget};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Sole write path for live (non-preset) temp targets, including the
/// cancel sentinel
pub trait TempTargetStore {
    fn store(&mut self, entries: &[TempTarget]) -> Result<()>;

    /// Target in force at `now`, as read back from the store
    fn active_at(&self, now: DateTime<Utc>) -> Result<Option<TempTarget>>;
}

/// Input surface that is dismissed after enact, cancel and preset apply
pub trait EditorHost {
    fn close_editor(&mut self);
}

/// The latest entry created at or before `now`, unless it is the cancel
/// sentinel or its window has elapsed. Ties go to the later entry.
pub fn in_force_at<'a>(
    entries: impl IntoIterator<Item = &'a TempTarget>,
    now: DateTime<Utc>,
) -> Option<&'a TempTarget> {
    entries
        .into_iter()
        .filter(|e| e.created_at <= now)
        .max_by_key(|e| e.created_at)
        .filter(|e| !e.is_cancel() && e.ends_at() > now)
}

/// JSONL-backed live target store
#[derive(Debug)]
pub struct JsonlTargetStore {
    journal: Journal<TempTarget>,
}

impl JsonlTargetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            journal: Journal::new(path),
        }
    }

    /// Every entry ever stored, in append order
    pub fn entries(&self) -> Result<Vec<TempTarget>> {
        self.journal.read_all()
    }
}

impl TempTargetStore for JsonlTargetStore {
    fn store(&mut self, entries: &[TempTarget]) -> Result<()> {
        for entry in entries {
            self.journal.append(entry)?;
        }
        tracing::debug!("Stored {} temp target entries", entries.len());
        Ok(())
    }

    fn active_at(&self, now: DateTime<Utc>) -> Result<Option<TempTarget>> {
        let entries = self.entries()?;
        Ok(in_force_at(&entries, now).cloned())
    }
}
