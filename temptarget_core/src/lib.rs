#![forbid(unsafe_code)]

//! Core domain model and business logic for temporary glucose-target overrides.
//!
//! This crate provides:
//! - Domain types (temp targets, activation records, preset flags)
//! - Percentage ↔ target curve and unit conversion
//! - Preset repository and activation ledger persistence
//! - The controller that ties them to the dosing loop's store

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod clock;
pub mod units;
pub mod ratio;
pub mod journal;
pub mod presets;
pub mod ledger;
pub mod store;
pub mod export;
pub mod controller;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use clock::{Clock, ManualClock, SystemClock};
pub use presets::PresetRepository;
pub use ledger::ActivationLedger;
pub use store::{EditorHost, JsonlTargetStore, TempTargetStore};
pub use controller::{DataPaths, TempTargetController};
