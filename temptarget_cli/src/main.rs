use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use temptarget_core::units::to_display;
use temptarget_core::*;

#[derive(Parser)]
#[command(name = "temptarget")]
#[command(about = "Temporary glucose target overrides for the dosing loop", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

/// Target as entered on the form
#[derive(Args, Debug)]
struct TargetArgs {
    /// Absolute target in the configured units
    #[arg(long, conflicts_with = "percentage", required_unless_present = "percentage")]
    target: Option<f64>,

    /// Sensitivity percentage (100 = unchanged)
    #[arg(long, allow_negative_numbers = true)]
    percentage: Option<f64>,

    /// Half-basal target for percentage mode (mg/dL)
    #[arg(long, requires = "percentage")]
    hbt: Option<f64>,

    /// Duration in minutes
    #[arg(long)]
    duration: f64,

    /// Preset / entry name
    #[arg(long)]
    name: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Enact a temp target now
    Enact(TargetArgs),

    /// Cancel the active temp target
    Cancel,

    /// Save a preset
    Save(TargetArgs),

    /// List saved presets
    Presets,

    /// Enact a saved preset
    Apply { id: String },

    /// Remove a saved preset
    Remove { id: String },

    /// Update a saved preset
    Update {
        id: String,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Show current activation state and live target
    Status,

    /// Preview the percentage/target conversion
    Preview {
        /// Percentage to convert (configured default when omitted)
        #[arg(long, conflicts_with = "target", allow_negative_numbers = true)]
        percentage: Option<f64>,

        /// Target in mg/dL
        #[arg(long)]
        target: Option<f64>,

        #[arg(long)]
        hbt: Option<f64>,
    },

    /// Export the activation ledger to CSV
    Export { path: PathBuf },
}

/// Prints a line when the form would be dismissed
struct ConsoleEditor;

impl EditorHost for ConsoleEditor {
    fn close_editor(&mut self) {
        println!("✓ Done");
    }
}

type Controller = TempTargetController<JsonlTargetStore, ConsoleEditor>;

fn main() {
    temptarget_core::logging::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = DataPaths::new(&data_dir);
    tracing::debug!("Using data directory {:?}", data_dir);

    let mut controller: Controller = TempTargetController::open(
        &paths,
        config.settings(),
        JsonlTargetStore::new(&paths.live_targets),
        ConsoleEditor,
        SystemClock,
    )?;

    match cli.command {
        Commands::Enact(args) => {
            let input = to_input(&args, &config);
            let entry = controller.enact(&input)?;
            print_entry("Enacted", &entry, config.settings.units);
        }
        Commands::Cancel => {
            controller.cancel();
            println!("Temp target cancelled");
        }
        Commands::Save(args) => {
            let input = to_input(&args, &config);
            let entry = controller.save(&input)?;
            print_entry("Saved preset", &entry, config.settings.units);
            println!("  id: {}", entry.id);
        }
        Commands::Presets => cmd_presets(&controller, config.settings.units),
        Commands::Apply { id } => {
            let entry = controller.enact_preset(&id)?;
            print_entry("Enacted preset", &entry, config.settings.units);
        }
        Commands::Remove { id } => {
            controller.remove_preset(&id)?;
            println!("Removed preset {}", id);
        }
        Commands::Update { id, target } => {
            let input = to_input(&target, &config);
            let entry = controller.update_preset(&id, &input)?;
            print_entry("Updated preset", &entry, config.settings.units);
        }
        Commands::Status => cmd_status(&controller, config.settings.units)?,
        Commands::Preview {
            percentage,
            target,
            hbt,
        } => {
            let hbt = hbt.unwrap_or(config.defaults.half_basal_target);
            if let Some(t) = target {
                println!("{} mg/dL → {}%", t, controller.compute_percentage(t, hbt));
            } else {
                let p = percentage.unwrap_or(config.defaults.percentage);
                let target = controller.compute_target(p, hbt).round();
                println!(
                    "{}% → {} {}",
                    p,
                    to_display(target, config.settings.units),
                    config.settings.units.label()
                );
            }
        }
        Commands::Export { path } => {
            let count = export::ledger_to_csv(controller.ledger().records(), &path)?;
            println!("✓ Exported {} ledger records to {}", count, path.display());
        }
    }

    if controller.persistence_failures() > 0 {
        eprintln!(
            "Warning: {} write(s) failed; see log output",
            controller.persistence_failures()
        );
    }

    Ok(())
}

fn to_input(args: &TargetArgs, config: &Config) -> TargetInput {
    let mode = match (args.percentage, args.target) {
        (Some(percentage), _) => TargetMode::Percentage {
            percentage,
            half_basal_target: args.hbt.unwrap_or(config.defaults.half_basal_target),
        },
        (None, target) => TargetMode::Absolute {
            target: target.unwrap_or_default(),
        },
    };

    TargetInput {
        mode,
        duration: args.duration,
        name: args.name.clone(),
        starts_at: None,
    }
}

fn cmd_presets(controller: &Controller, units: GlucoseUnits) {
    if controller.presets().is_empty() {
        println!("No presets saved.");
        return;
    }

    for preset in controller.presets() {
        let curve = controller
            .ledger()
            .latest_flag_for(&preset.id)
            .and_then(|flag| flag.hbt)
            .map(|hbt| format!(" (hbt {})", hbt))
            .unwrap_or_default();
        println!(
            "{}  {:<16} {} {} for {} min{}",
            preset.id,
            preset.name,
            to_display(preset.target_bottom, units),
            units.label(),
            preset.duration,
            curve
        );
    }
}

fn cmd_status(controller: &Controller, units: GlucoseUnits) -> Result<()> {
    let state = match controller.activation_state()? {
        ActivationState::Inactive => "none",
        ActivationState::ActiveFlat => "flat target",
        ActivationState::ActiveCurve => "percentage curve",
    };
    println!("Override: {}", state);

    let record = controller.current_state()?;
    println!("Curve tracking: {}", if record.active { "active" } else { "inactive" });
    if record.active {
        if let Some(hbt) = record.hbt {
            println!("  hbt: {}", hbt);
        }
        println!("  duration: {} min", record.duration);
        if let Some(start) = record.start_date {
            println!("  started: {}", start.to_rfc3339());
        }
    }

    match controller.store().active_at(chrono::Utc::now())? {
        Some(entry) => print_entry("Live target", &entry, units),
        None => println!("No live temp target"),
    }
    Ok(())
}

fn print_entry(label: &str, entry: &TempTarget, units: GlucoseUnits) {
    println!(
        "{}: {} {} {} for {} min",
        label,
        entry.name,
        to_display(entry.target_bottom, units),
        units.label(),
        entry.duration
    );
}
