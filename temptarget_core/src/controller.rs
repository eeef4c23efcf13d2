//! Temp-target controller.
//!
//! Orchestrates manual entry, presets, cancellation and preset re-application:
//! - resolves the effective target (percentage curve or unit conversion)
//! - submits live entries to the loop's store
//! - keeps the activation ledger and preset flags in step
//!
//! Validation failures are returned before anything changes. Persistence
//! failures never escape: they are logged, counted, and the in-memory state
//! change stands, since an unsaved journal is recoverable and a failed
//! dose adjustment is not.

use crate::clock::{Clock, SystemClock};
use crate::ledger::ActivationLedger;
use crate::presets::PresetRepository;
use crate::ratio;
use crate::store::{EditorHost, TempTargetStore};
use crate::units::to_canonical;
use crate::{
    ActivationRecord, ActivationState, Error, Result, Settings, TargetInput, TargetMode,
    TempTarget,
};
use std::path::{Path, PathBuf};

/// File layout under the data directory
#[derive(Clone, Debug)]
pub struct DataPaths {
    pub presets: PathBuf,
    pub ledger_dir: PathBuf,
    pub live_targets: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            presets: data_dir.join("presets.json"),
            ledger_dir: data_dir.join("ledger"),
            live_targets: data_dir.join("temptargets.jsonl"),
        }
    }
}

/// Owns every mutation of presets and activation journals. Mutating methods
/// take `&mut self`; callers sharing a controller across threads wrap it in
/// a single `Mutex` so each read-modify-write runs alone.
pub struct TempTargetController<S, H, C = SystemClock> {
    settings: Settings,
    presets: PresetRepository,
    ledger: ActivationLedger,
    store: S,
    editor: H,
    clock: C,
    settings_changed: bool,
    persistence_failures: usize,
}

impl<S, H, C> TempTargetController<S, H, C>
where
    S: TempTargetStore,
    H: EditorHost,
    C: Clock,
{
    pub fn new(
        settings: Settings,
        presets: PresetRepository,
        ledger: ActivationLedger,
        store: S,
        editor: H,
        clock: C,
    ) -> Self {
        Self {
            settings,
            presets,
            ledger,
            store,
            editor,
            clock,
            settings_changed: false,
            persistence_failures: 0,
        }
    }

    /// Load presets and open (seeding if needed) the ledger under `paths`
    pub fn open(
        paths: &DataPaths,
        settings: Settings,
        store: S,
        editor: H,
        clock: C,
    ) -> Result<Self> {
        let presets = PresetRepository::load(&paths.presets)?;
        let ledger = ActivationLedger::open(&paths.ledger_dir, clock.now())?;
        Ok(Self::new(settings, presets, ledger, store, editor, clock))
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Put a manual temp target in force
    pub fn enact(&mut self, input: &TargetInput) -> Result<TempTarget> {
        check_duration(input.duration)?;
        let target = self.resolve_target(&input.mode)?;
        let now = self.clock.now();

        match input.mode {
            TargetMode::Percentage {
                half_basal_target, ..
            } => {
                let result =
                    self.ledger
                        .record_manual_activation(now, half_basal_target, input.duration);
                self.report("curve activation", result);
                self.settings_changed = true;
            }
            TargetMode::Absolute { .. } => {
                // A flat target ends any curve tracking in progress
                let result = self.ledger.record_deactivation(now);
                self.report("deactivation", result);
            }
        }

        let entry = TempTarget::manual(
            input.label(),
            input.starts_at.unwrap_or(now),
            target,
            input.duration,
        );
        tracing::info!(
            "Enacting temp target {} mg/dL for {} min",
            entry.target_bottom,
            entry.duration
        );
        self.submit(&entry);
        self.editor.close_editor();
        Ok(entry)
    }

    /// Clear the live target and both activation views. Returns the sentinel
    /// that was submitted.
    pub fn cancel(&mut self) -> TempTarget {
        let now = self.clock.now();
        let sentinel = TempTarget::cancel(now);

        tracing::info!("Cancelling temp target");
        self.submit(&sentinel);
        self.editor.close_editor();

        let result = self.ledger.record_deactivation(now);
        self.report("deactivation", result);
        let result = self.ledger.record_flag_disabled(now);
        self.report("preset flag", result);

        sentinel
    }

    /// Save the form as a new preset without enacting it
    pub fn save(&mut self, input: &TargetInput) -> Result<TempTarget> {
        check_duration(input.duration)?;
        let target = self.resolve_target(&input.mode)?;
        let now = self.clock.now();

        let entry = TempTarget::manual(input.label(), now, target, input.duration);
        let result = self.presets.append(entry.clone());
        self.report("preset list", result);

        if let TargetMode::Percentage {
            half_basal_target, ..
        } = input.mode
        {
            let result =
                self.ledger
                    .record_preset_flag(now, &entry.id, half_basal_target, input.duration);
            self.report("preset flag", result);
            self.settings_changed = true;
        }

        tracing::info!("Saved preset {} ({})", entry.name, entry.id);
        Ok(entry)
    }

    /// Re-apply a saved preset, recovering its curve parameters if any
    pub fn enact_preset(&mut self, id: &str) -> Result<TempTarget> {
        let mut entry = self
            .presets
            .get(id)
            .cloned()
            .ok_or_else(|| Error::PresetNotFound(id.to_string()))?;
        let now = self.clock.now();
        entry.created_at = now;

        tracing::info!("Enacting preset {} ({})", entry.name, entry.id);
        self.submit(&entry);
        self.editor.close_editor();

        let result = self.ledger.record_preset_activation(now, id).map(|curve| {
            tracing::debug!("Preset {} curve tracking: {}", id, curve);
        });
        self.report("preset activation", result);

        Ok(entry)
    }

    pub fn remove_preset(&mut self, id: &str) -> Result<()> {
        match self.presets.remove(id) {
            Ok(true) => {
                tracing::info!("Removed preset {}", id);
                Ok(())
            }
            Ok(false) => Err(Error::PresetNotFound(id.to_string())),
            Err(e) => {
                self.report("preset list", Err(e));
                Ok(())
            }
        }
    }

    /// Replace a preset's target and duration, keeping its identity.
    /// Name and reason fall back to the preset's own when none is given.
    pub fn update_preset(&mut self, id: &str, input: &TargetInput) -> Result<TempTarget> {
        let existing = self
            .presets
            .get(id)
            .cloned()
            .ok_or_else(|| Error::PresetNotFound(id.to_string()))?;
        // Non-positive durations are kept as entered; only non-numbers are refused
        if !input.duration.is_finite() {
            return Err(Error::InvalidDuration(input.duration));
        }
        let target = self.resolve_target(&input.mode)?;

        let updated = TempTarget {
            id: existing.id,
            name: input.label().map_or(existing.name, str::to_string),
            created_at: existing.created_at,
            target_top: target,
            target_bottom: target,
            duration: input.duration,
            entered_by: existing.entered_by,
            reason: input.label().map_or(existing.reason, str::to_string),
        };

        let result = self.presets.replace(id, updated.clone()).map(|_| ());
        self.report("preset list", result);

        tracing::info!("Updated preset {} ({})", updated.name, updated.id);
        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn presets(&self) -> &[TempTarget] {
        self.presets.list()
    }

    /// Target (mg/dL, unrounded) for a percentage, for live feedback
    pub fn compute_target(&self, percentage: f64, half_basal_target: f64) -> f64 {
        ratio::compute_target(
            percentage,
            half_basal_target,
            self.settings.max_sensitivity_ratio,
        )
    }

    /// Percentage for a target in mg/dL, for live feedback
    pub fn compute_percentage(&self, target: f64, half_basal_target: f64) -> f64 {
        ratio::compute_percentage(target, half_basal_target, self.settings.max_sensitivity_ratio)
    }

    pub fn current_state(&self) -> Result<&ActivationRecord> {
        self.ledger.current_state()
    }

    /// Curve tracking comes from the ledger; a flat target is whatever the
    /// store reports in force right now
    pub fn activation_state(&self) -> Result<ActivationState> {
        let current = self.ledger.current_state()?;
        let state = if current.active && current.hbt.is_some() {
            ActivationState::ActiveCurve
        } else if current.active || self.store.active_at(self.clock.now())?.is_some() {
            ActivationState::ActiveFlat
        } else {
            ActivationState::Inactive
        };
        Ok(state)
    }

    /// Whether a percentage-mode action changed what the dosing loop should
    /// re-read; clears the flag
    pub fn take_settings_changed(&mut self) -> bool {
        std::mem::take(&mut self.settings_changed)
    }

    /// Number of writes that failed since construction
    pub fn persistence_failures(&self) -> usize {
        self.persistence_failures
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn ledger(&self) -> &ActivationLedger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn editor(&self) -> &H {
        &self.editor
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Effective target in mg/dL; NaN and infinite results are refused
    fn resolve_target(&self, mode: &TargetMode) -> Result<f64> {
        let target = match *mode {
            TargetMode::Percentage {
                percentage,
                half_basal_target,
            } => self.compute_target(percentage, half_basal_target).round(),
            TargetMode::Absolute { target } => to_canonical(target, self.settings.units),
        };
        if !target.is_finite() {
            tracing::debug!("Ignoring temp target resolving to {}", target);
            return Err(Error::InvalidTarget(target));
        }
        Ok(target)
    }

    fn submit(&mut self, entry: &TempTarget) {
        let result = self.store.store(std::slice::from_ref(entry));
        self.report("live temp target", result);
    }

    fn report(&mut self, what: &str, result: Result<()>) {
        if let Err(e) = result {
            self.persistence_failures += 1;
            tracing::error!("Failed to persist {}: {}", what, e);
        }
    }
}

fn check_duration(duration: f64) -> Result<()> {
    if !duration.is_finite() || duration <= 0.0 {
        tracing::debug!("Ignoring temp target with duration {}", duration);
        return Err(Error::InvalidDuration(duration));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::{GlucoseUnits, JsonlTargetStore};
    use chrono::{DateTime, Duration, Utc};

    #[derive(Default)]
    struct RecordingStore {
        batches: Vec<Vec<TempTarget>>,
    }

    impl TempTargetStore for RecordingStore {
        fn store(&mut self, entries: &[TempTarget]) -> Result<()> {
            self.batches.push(entries.to_vec());
            Ok(())
        }

        fn active_at(&self, now: DateTime<Utc>) -> Result<Option<TempTarget>> {
            Ok(crate::store::in_force_at(self.batches.iter().flatten(), now).cloned())
        }
    }

    impl RecordingStore {
        fn last(&self) -> Option<&TempTarget> {
            self.batches.last().and_then(|b| b.last())
        }
    }

    struct FailingStore;

    impl TempTargetStore for FailingStore {
        fn store(&mut self, _entries: &[TempTarget]) -> Result<()> {
            Err(Error::Other("store offline".into()))
        }

        fn active_at(&self, _now: DateTime<Utc>) -> Result<Option<TempTarget>> {
            Err(Error::Other("store offline".into()))
        }
    }

    #[derive(Default)]
    struct CountingEditor {
        closed: usize,
    }

    impl EditorHost for CountingEditor {
        fn close_editor(&mut self) {
            self.closed += 1;
        }
    }

    type TestController<S = RecordingStore> =
        TempTargetController<S, CountingEditor, ManualClock>;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn settings(units: GlucoseUnits) -> Settings {
        Settings {
            units,
            max_sensitivity_ratio: 1.2,
        }
    }

    fn open_with<S: TempTargetStore>(
        dir: &Path,
        units: GlucoseUnits,
        store: S,
    ) -> (TestController<S>, ManualClock) {
        crate::logging::init_test();
        let clock = ManualClock::new(t0());
        let controller = TempTargetController::open(
            &DataPaths::new(dir),
            settings(units),
            store,
            CountingEditor::default(),
            clock.clone(),
        )
        .unwrap();
        // Keep later records strictly after the seed
        clock.advance(Duration::seconds(1));
        (controller, clock)
    }

    fn open(dir: &Path, units: GlucoseUnits) -> (TestController, ManualClock) {
        open_with(dir, units, RecordingStore::default())
    }

    #[test]
    fn test_enact_absolute_mmol_converts_and_deactivates_curve() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (mut controller, _clock) = open(temp_dir.path(), GlucoseUnits::MmolL);

        let entry = controller
            .enact(&TargetInput::absolute(8.0, 60.0))
            .unwrap();

        assert_eq!(entry.target_top, 144.0);
        assert_eq!(entry.target_bottom, 144.0);
        assert_eq!(entry.name, TempTarget::CUSTOM);
        assert_eq!(controller.store().last(), Some(&entry));
        assert_eq!(controller.editor().closed, 1);
        assert!(!controller.current_state().unwrap().active);
        assert_eq!(
            controller.activation_state().unwrap(),
            ActivationState::ActiveFlat
        );
        assert!(!controller.take_settings_changed());
    }

    #[test]
    fn test_enact_percentage_records_curve() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (mut controller, clock) = open(temp_dir.path(), GlucoseUnits::MmolL);

        let entry = controller
            .enact(&TargetInput::percentage(50.0, 160.0, 120.0))
            .unwrap();

        // Percentage targets are already canonical, no mmol conversion
        assert_eq!(entry.target_bottom, 160.0);

        let state = controller.current_state().unwrap();
        assert!(state.active);
        assert_eq!(state.hbt, Some(160.0));
        assert_eq!(state.duration, 120.0);
        assert_eq!(state.start_date, Some(clock.now()));
        assert_eq!(
            controller.activation_state().unwrap(),
            ActivationState::ActiveCurve
        );
        assert!(controller.take_settings_changed());
        assert!(!controller.take_settings_changed());
    }

    #[test]
    fn test_enact_uses_requested_start_and_name() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (mut controller, _clock) = open(temp_dir.path(), GlucoseUnits::MgDl);

        let start = t0() + Duration::hours(2);
        let entry = controller
            .enact(
                &TargetInput::absolute(120.4, 30.0)
                    .named("Walk")
                    .starting_at(start),
            )
            .unwrap();

        assert_eq!(entry.created_at, start);
        assert_eq!(entry.target_top, 120.0);
        assert_eq!(entry.reason, "Walk");
    }

    #[test]
    fn test_zero_duration_changes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (mut controller, _clock) = open(temp_dir.path(), GlucoseUnits::MgDl);
        let records_before = controller.ledger().records().len();

        let enact = controller.enact(&TargetInput::percentage(80.0, 160.0, 0.0));
        assert!(matches!(enact, Err(Error::InvalidDuration(_))));
        let save = controller.save(&TargetInput::absolute(120.0, 0.0).named("Nope"));
        assert!(matches!(save, Err(Error::InvalidDuration(_))));

        assert!(controller.store().batches.is_empty());
        assert_eq!(controller.editor().closed, 0);
        assert!(controller.presets().is_empty());
        assert_eq!(controller.ledger().records().len(), records_before);
        assert!(controller.ledger().preset_flags().is_empty());
        assert!(!temp_dir.path().join("presets.json").exists());
    }

    #[test]
    fn test_cancel_always_deactivates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (mut controller, clock) = open(temp_dir.path(), GlucoseUnits::MgDl);

        let inputs = [
            None,
            Some(TargetInput::absolute(140.0, 60.0)),
            Some(TargetInput::percentage(70.0, 160.0, 60.0)),
        ];

        for input in inputs {
            if let Some(input) = input {
                controller.enact(&input).unwrap();
                clock.advance(Duration::seconds(1));
            }

            let sentinel = controller.cancel();
            assert!(sentinel.is_cancel());
            assert_eq!(controller.store().last(), Some(&sentinel));
            assert!(!controller.current_state().unwrap().active);
            assert!(!controller.ledger().current_flag().unwrap().enabled);
            assert_eq!(
                controller.activation_state().unwrap(),
                ActivationState::Inactive
            );
            clock.advance(Duration::seconds(1));
        }
    }

    #[test]
    fn test_saved_percentage_preset_recovers_curve() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (mut controller, clock) = open(temp_dir.path(), GlucoseUnits::MmolL);

        let preset = controller
            .save(&TargetInput::percentage(60.0, 150.0, 90.0).named("Sport"))
            .unwrap();

        // Saving does not touch the live store or activation state
        assert!(controller.store().batches.is_empty());
        assert!(!controller.current_state().unwrap().active);

        let flag = controller.ledger().latest_flag_for(&preset.id).unwrap();
        assert!(flag.is_preset && flag.enabled);
        assert_eq!(flag.hbt, Some(150.0));
        assert_eq!(flag.duration, 90.0);

        clock.advance(Duration::minutes(10));
        let applied = controller.enact_preset(&preset.id).unwrap();
        assert_eq!(applied.created_at, clock.now());
        assert_eq!(applied.id, preset.id);

        let state = controller.current_state().unwrap();
        assert!(state.active);
        assert_eq!(state.hbt, Some(150.0));
        assert_eq!(state.duration, 90.0);
        assert_eq!(state.preset_id.as_deref(), Some(preset.id.as_str()));
    }

    #[test]
    fn test_absolute_preset_apply_records_deactivation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (mut controller, clock) = open(temp_dir.path(), GlucoseUnits::MgDl);

        controller
            .enact(&TargetInput::percentage(70.0, 160.0, 60.0))
            .unwrap();
        clock.advance(Duration::seconds(1));
        let preset = controller
            .save(&TargetInput::absolute(150.0, 45.0).named("High"))
            .unwrap();
        clock.advance(Duration::seconds(1));

        controller.enact_preset(&preset.id).unwrap();
        assert!(!controller.current_state().unwrap().active);
        assert_eq!(
            controller.activation_state().unwrap(),
            ActivationState::ActiveFlat
        );
        assert_eq!(controller.editor().closed, 2);
    }

    #[test]
    fn test_unknown_preset_is_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (mut controller, _clock) = open(temp_dir.path(), GlucoseUnits::MgDl);
        let records_before = controller.ledger().records().len();

        assert!(matches!(
            controller.enact_preset("missing"),
            Err(Error::PresetNotFound(_))
        ));
        assert!(matches!(
            controller.remove_preset("missing"),
            Err(Error::PresetNotFound(_))
        ));
        assert!(matches!(
            controller.update_preset("missing", &TargetInput::absolute(100.0, 30.0)),
            Err(Error::PresetNotFound(_))
        ));
        assert!(controller.store().batches.is_empty());
        assert_eq!(controller.ledger().records().len(), records_before);
    }

    #[test]
    fn test_update_preset_keeps_identity() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (mut controller, clock) = open(temp_dir.path(), GlucoseUnits::MmolL);

        let original = controller
            .save(&TargetInput::absolute(7.0, 60.0).named("Hike"))
            .unwrap();
        clock.advance(Duration::minutes(5));

        let updated = controller
            .update_preset(&original.id, &TargetInput::absolute(8.0, 90.0))
            .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.entered_by, original.entered_by);
        assert_eq!(updated.name, "Hike");
        assert_eq!(updated.reason, "Hike");
        assert_eq!(updated.target_top, 144.0);
        assert_eq!(updated.duration, 90.0);

        let renamed = controller
            .update_preset(
                &original.id,
                &TargetInput::percentage(50.0, 160.0, 30.0).named("Hike slow"),
            )
            .unwrap();
        assert_eq!(renamed.name, "Hike slow");
        assert_eq!(renamed.target_bottom, 160.0);

        let reloaded = PresetRepository::load(temp_dir.path().join("presets.json")).unwrap();
        assert_eq!(reloaded.list(), &[renamed][..]);
    }

    #[test]
    fn test_remove_preset() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (mut controller, _clock) = open(temp_dir.path(), GlucoseUnits::MgDl);

        let a = controller
            .save(&TargetInput::absolute(120.0, 30.0).named("A"))
            .unwrap();
        let b = controller
            .save(&TargetInput::absolute(140.0, 30.0).named("B"))
            .unwrap();

        controller.remove_preset(&a.id).unwrap();
        assert_eq!(controller.presets(), &[b][..]);
    }

    #[test]
    fn test_store_failure_is_counted_not_raised() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (mut controller, _clock) =
            open_with(temp_dir.path(), GlucoseUnits::MgDl, FailingStore);

        let entry = controller.enact(&TargetInput::absolute(130.0, 30.0));
        assert!(entry.is_ok());
        assert_eq!(controller.persistence_failures(), 1);
        assert_eq!(controller.editor().closed, 1);

        controller.cancel();
        assert_eq!(controller.persistence_failures(), 2);
        assert!(!controller.current_state().unwrap().active);
    }

    #[test]
    fn test_non_finite_input_leaves_presets_intact() {
        let temp_dir = tempfile::tempdir().unwrap();
        let presets_path = temp_dir.path().join("presets.json");
        let (mut controller, _clock) = open(temp_dir.path(), GlucoseUnits::MgDl);

        let keep = controller
            .save(&TargetInput::absolute(120.0, 60.0).named("Keep"))
            .unwrap();
        let records_before = controller.ledger().records().len();

        for duration in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let save = controller.save(&TargetInput::absolute(130.0, duration).named("Bad"));
            assert!(matches!(save, Err(Error::InvalidDuration(_))));
            let enact = controller.enact(&TargetInput::absolute(130.0, duration));
            assert!(matches!(enact, Err(Error::InvalidDuration(_))));
            let update = controller.update_preset(&keep.id, &TargetInput::absolute(130.0, duration));
            assert!(matches!(update, Err(Error::InvalidDuration(_))));
        }

        let bad_targets = [
            TargetInput::absolute(f64::INFINITY, 60.0),
            TargetInput::absolute(f64::NAN, 60.0),
            TargetInput::percentage(50.0, f64::NAN, 60.0),
            TargetInput::percentage(50.0, f64::INFINITY, 60.0),
        ];
        for input in &bad_targets {
            assert!(matches!(controller.save(input), Err(Error::InvalidTarget(_))));
            assert!(matches!(controller.enact(input), Err(Error::InvalidTarget(_))));
            assert!(matches!(
                controller.update_preset(&keep.id, input),
                Err(Error::InvalidTarget(_))
            ));
        }

        assert!(controller.store().batches.is_empty());
        assert_eq!(controller.editor().closed, 0);
        assert_eq!(controller.ledger().records().len(), records_before);
        assert_eq!(controller.persistence_failures(), 0);

        let reloaded = PresetRepository::load(&presets_path).unwrap();
        assert_eq!(reloaded.list(), &[keep][..]);
    }

    #[test]
    fn test_update_preset_accepts_non_positive_duration() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (mut controller, _clock) = open(temp_dir.path(), GlucoseUnits::MgDl);

        let preset = controller
            .save(&TargetInput::absolute(120.0, 60.0).named("Short"))
            .unwrap();
        let updated = controller
            .update_preset(&preset.id, &TargetInput::absolute(120.0, 0.0))
            .unwrap();
        assert_eq!(updated.duration, 0.0);
    }

    #[test]
    fn test_flat_target_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let live = temp_dir.path().join("temptargets.jsonl");

        let (mut controller, _clock) = open_with(
            temp_dir.path(),
            GlucoseUnits::MgDl,
            JsonlTargetStore::new(&live),
        );
        controller
            .enact(&TargetInput::absolute(140.0, 60.0))
            .unwrap();
        drop(controller);

        let (mut reopened, clock) = open_with(
            temp_dir.path(),
            GlucoseUnits::MgDl,
            JsonlTargetStore::new(&live),
        );
        assert_eq!(
            reopened.activation_state().unwrap(),
            ActivationState::ActiveFlat
        );

        clock.advance(Duration::minutes(5));
        reopened.cancel();
        drop(reopened);

        let (third, clock) = open_with(
            temp_dir.path(),
            GlucoseUnits::MgDl,
            JsonlTargetStore::new(&live),
        );
        clock.set(t0() + Duration::minutes(10));
        assert_eq!(third.activation_state().unwrap(), ActivationState::Inactive);
    }

    #[test]
    fn test_flat_target_expires_with_its_window() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (mut controller, clock) = open(temp_dir.path(), GlucoseUnits::MgDl);

        controller
            .enact(&TargetInput::absolute(140.0, 30.0))
            .unwrap();
        clock.advance(Duration::minutes(29));
        assert_eq!(
            controller.activation_state().unwrap(),
            ActivationState::ActiveFlat
        );
        clock.advance(Duration::minutes(2));
        assert_eq!(
            controller.activation_state().unwrap(),
            ActivationState::Inactive
        );
    }

    #[test]
    fn test_live_feedback_accessors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (controller, _clock) = open(temp_dir.path(), GlucoseUnits::MgDl);

        assert!((controller.compute_target(50.0, 160.0) - 160.0).abs() < 1e-9);
        assert_eq!(controller.compute_percentage(160.0, 160.0), 50.0);
    }
}
