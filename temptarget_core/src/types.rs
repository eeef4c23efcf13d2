//! Core domain types for temporary glucose-target overrides.
//!
//! This module defines the fundamental types used throughout the system:
//! - Glucose units and provenance tags
//! - Temp targets (live entries and presets)
//! - Activation records and preset activation flags
//! - Controller input

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Units and Settings
// ============================================================================

/// Glucose unit system. mg/dL is the canonical storage unit.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum GlucoseUnits {
    #[serde(rename = "mg/dL")]
    MgDl,
    #[serde(rename = "mmol/L")]
    MmolL,
}

impl GlucoseUnits {
    /// Human-readable unit label
    pub fn label(self) -> &'static str {
        match self {
            GlucoseUnits::MgDl => "mg/dL",
            GlucoseUnits::MmolL => "mmol/L",
        }
    }
}

/// Settings snapshot handed to the controller once at construction
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    pub units: GlucoseUnits,
    pub max_sensitivity_ratio: f64,
}

// ============================================================================
// Temp Targets
// ============================================================================

/// Provenance of a temp target entry
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EnteredBy {
    #[serde(rename = "freeaps-x")]
    Manual,
    /// Written by the dosing loop itself
    #[serde(rename = "system")]
    System,
}

/// A time-bounded override of the loop's glucose setpoint.
///
/// Bounds are always stored in mg/dL. Entries are never edited in place;
/// updating a preset replaces the whole record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TempTarget {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "targetTop")]
    pub target_top: f64,
    #[serde(rename = "targetBottom")]
    pub target_bottom: f64,
    /// Minutes
    pub duration: f64,
    #[serde(rename = "enteredBy")]
    pub entered_by: EnteredBy,
    pub reason: String,
}

impl TempTarget {
    /// Label used when the user gives no name
    pub const CUSTOM: &'static str = "Temp target";
    /// Name and reason of the cancel sentinel
    pub const CANCEL: &'static str = "Cancel";

    /// Build a manual entry with a flat target (top == bottom) and a fresh id
    pub fn manual(
        name: Option<&str>,
        created_at: DateTime<Utc>,
        target: f64,
        duration: f64,
    ) -> Self {
        let label = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(Self::CUSTOM)
            .to_string();
        Self {
            id: Uuid::new_v4().to_string(),
            name: label.clone(),
            created_at,
            target_top: target,
            target_bottom: target,
            duration,
            entered_by: EnteredBy::Manual,
            reason: label,
        }
    }

    /// Sentinel entry telling the store to clear the active target
    pub fn cancel(at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: Self::CANCEL.into(),
            created_at: at,
            target_top: 0.0,
            target_bottom: 0.0,
            duration: 0.0,
            entered_by: EnteredBy::Manual,
            reason: Self::CANCEL.into(),
        }
    }

    pub fn is_cancel(&self) -> bool {
        self.duration == 0.0 && self.reason == Self::CANCEL
    }

    /// End of the entry's window, saturating at the latest representable time
    pub fn ends_at(&self) -> DateTime<Utc> {
        // Sub-millisecond precision is dropped; the float cast saturates.
        chrono::TimeDelta::try_milliseconds((self.duration * 60_000.0) as i64)
            .and_then(|window| self.created_at.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

// ============================================================================
// Activation Journals
// ============================================================================

/// One entry of the append-only activation ledger
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActivationRecord {
    pub id: Uuid,
    pub active: bool,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// Minutes; zero on deactivations
    #[serde(default)]
    pub duration: f64,
    /// Half-basal target in force for percentage-mode activations
    #[serde(default)]
    pub hbt: Option<f64>,
    #[serde(default)]
    pub preset_id: Option<String>,
}

impl ActivationRecord {
    pub fn inactive(date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            active: false,
            date,
            start_date: None,
            duration: 0.0,
            hbt: None,
            preset_id: None,
        }
    }
}

/// Remembers a preset's percentage-mode parameters, independent of the
/// preset's TempTarget entry. Cancellation writes a disabled flag with no id.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PresetActivationFlag {
    #[serde(default)]
    pub id: Option<String>,
    pub is_preset: bool,
    pub enabled: bool,
    #[serde(default)]
    pub hbt: Option<f64>,
    #[serde(default)]
    pub duration: f64,
    pub date: DateTime<Utc>,
}

/// Controller state, derived rather than stored
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationState {
    Inactive,
    /// Absolute target in force
    ActiveFlat,
    /// Percentage-derived target in force, tracked via hbt/duration
    ActiveCurve,
}

// ============================================================================
// Controller Input
// ============================================================================

/// How the user expressed the target
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetMode {
    /// Target in the configured display units
    Absolute { target: f64 },
    /// Sensitivity percentage mapped through the half-basal-target curve
    Percentage {
        percentage: f64,
        half_basal_target: f64,
    },
}

/// Form contents for enact / save / update
#[derive(Clone, Debug, PartialEq)]
pub struct TargetInput {
    pub mode: TargetMode,
    /// Minutes
    pub duration: f64,
    pub name: Option<String>,
    /// Start of a manually enacted target; now when unset
    pub starts_at: Option<DateTime<Utc>>,
}

impl TargetInput {
    pub fn absolute(target: f64, duration: f64) -> Self {
        Self {
            mode: TargetMode::Absolute { target },
            duration,
            name: None,
            starts_at: None,
        }
    }

    pub fn percentage(percentage: f64, half_basal_target: f64, duration: f64) -> Self {
        Self {
            mode: TargetMode::Percentage {
                percentage,
                half_basal_target,
            },
            duration,
            name: None,
            starts_at: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn starting_at(mut self, at: DateTime<Utc>) -> Self {
        self.starts_at = Some(at);
        self
    }

    /// Name with blank input treated as absent
    pub fn label(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}
