//! Activation ledger.
//!
//! Two append-only journals record whether a temp target is in force:
//! the activation journal (one record per enact, cancel or preset apply)
//! and the preset-flag journal (percentage-mode parameters remembered per
//! preset). Current state is the latest record; nothing is ever rewritten.
//!
//! Both journals are cached in memory. Appends update the cache first and
//! then write through, so a failed write still leaves the in-memory state
//! changed and the error for the caller to report.

use crate::journal::Journal;
use crate::{ActivationRecord, Error, PresetActivationFlag, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use uuid::Uuid;

/// Fallback half-basal target for flags written without one
const FALLBACK_HBT: f64 = crate::ratio::DEFAULT_HALF_BASAL_TARGET;

#[derive(Debug)]
pub struct ActivationLedger {
    activations: Journal<ActivationRecord>,
    flags: Journal<PresetActivationFlag>,
    records: Vec<ActivationRecord>,
    preset_flags: Vec<PresetActivationFlag>,
}

impl ActivationLedger {
    /// Open the journals under `dir` without seeding
    pub fn open_unseeded(dir: &Path) -> Result<Self> {
        let activations = Journal::new(dir.join("activations.jsonl"));
        let flags = Journal::new(dir.join("preset_flags.jsonl"));
        let records = activations.read_all()?;
        let preset_flags = flags.read_all()?;

        tracing::debug!(
            "Opened ledger with {} activation records and {} preset flags",
            records.len(),
            preset_flags.len()
        );

        Ok(Self {
            activations,
            flags,
            records,
            preset_flags,
        })
    }

    /// Open the journals under `dir`, appending an inactive seed record if
    /// the activation journal is empty so `current_state` always has an answer.
    pub fn open(dir: &Path, now: DateTime<Utc>) -> Result<Self> {
        let mut ledger = Self::open_unseeded(dir)?;
        if ledger.records.is_empty() {
            tracing::info!("Seeding empty activation ledger");
            ledger.push(ActivationRecord::inactive(now))?;
        }
        Ok(ledger)
    }

    pub fn records(&self) -> &[ActivationRecord] {
        &self.records
    }

    pub fn preset_flags(&self) -> &[PresetActivationFlag] {
        &self.preset_flags
    }

    /// Start curve tracking around `hbt` for `duration` minutes
    pub fn record_manual_activation(
        &mut self,
        now: DateTime<Utc>,
        hbt: f64,
        duration: f64,
    ) -> Result<()> {
        self.push(ActivationRecord {
            id: Uuid::new_v4(),
            active: true,
            date: now,
            start_date: Some(now),
            duration,
            hbt: Some(hbt),
            preset_id: None,
        })
    }

    pub fn record_deactivation(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.push(ActivationRecord::inactive(now))
    }

    /// Re-activate the curve parameters remembered for `preset_id`.
    ///
    /// Without a flag on file there is nothing to curve-track, so a
    /// deactivation is recorded instead. Returns whether the curve was activated.
    pub fn record_preset_activation(
        &mut self,
        now: DateTime<Utc>,
        preset_id: &str,
    ) -> Result<bool> {
        let flag = self
            .latest_flag_for(preset_id)
            .map(|f| (f.hbt.unwrap_or(FALLBACK_HBT), f.duration));

        match flag {
            Some((hbt, duration)) => {
                self.push(ActivationRecord {
                    id: Uuid::new_v4(),
                    active: true,
                    date: now,
                    start_date: Some(now),
                    duration,
                    hbt: Some(hbt),
                    preset_id: Some(preset_id.to_string()),
                })?;
                Ok(true)
            }
            None => {
                self.record_deactivation(now)?;
                Ok(false)
            }
        }
    }

    /// Remember percentage-mode parameters for a saved preset
    pub fn record_preset_flag(
        &mut self,
        now: DateTime<Utc>,
        preset_id: &str,
        hbt: f64,
        duration: f64,
    ) -> Result<()> {
        self.push_flag(PresetActivationFlag {
            id: Some(preset_id.to_string()),
            is_preset: true,
            enabled: true,
            hbt: Some(hbt),
            duration,
            date: now,
        })
    }

    /// Turn off preset-curve tracking
    pub fn record_flag_disabled(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.push_flag(PresetActivationFlag {
            id: None,
            is_preset: false,
            enabled: false,
            hbt: None,
            duration: 0.0,
            date: now,
        })
    }

    /// The record with the latest date; ties go to the most recently appended
    pub fn current_state(&self) -> Result<&ActivationRecord> {
        // max_by_key returns the last of equal maxima
        self.records
            .iter()
            .max_by_key(|r| r.date)
            .ok_or(Error::EmptyLedger)
    }

    /// Latest preset-curve flag of any kind
    pub fn current_flag(&self) -> Option<&PresetActivationFlag> {
        self.preset_flags.iter().max_by_key(|f| f.date)
    }

    /// Most recent flag recorded for `preset_id`, by descending date
    pub fn latest_flag_for(&self, preset_id: &str) -> Option<&PresetActivationFlag> {
        self.preset_flags
            .iter()
            .filter(|f| f.id.as_deref() == Some(preset_id))
            .max_by_key(|f| f.date)
    }

    fn push(&mut self, record: ActivationRecord) -> Result<()> {
        tracing::debug!(
            "Ledger: active={} hbt={:?} duration={}",
            record.active,
            record.hbt,
            record.duration
        );
        self.records.push(record);
        if let Some(record) = self.records.last() {
            self.activations.append(record)?;
        }
        Ok(())
    }

    fn push_flag(&mut self, flag: PresetActivationFlag) -> Result<()> {
        self.preset_flags.push(flag);
        if let Some(flag) = self.preset_flags.last() {
            self.flags.append(flag)?;
        }
        Ok(())
    }
}
