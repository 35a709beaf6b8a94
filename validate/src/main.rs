//! halo-validate - replay a TOML scenario through the aura engine.
//!
//! Usage: halo-validate --scenario <file> [--tuning <file>] [--json]
//!
//! Runs the scenario against the in-memory host and prints the final
//! indicator state of every surface, the routed events and the engine status.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use halo_core::context::load_tuning;
use halo_core::sim::{Scenario, ScenarioReport};
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Replay an aura engine scenario")]
struct Cli {
    /// Scenario file (TOML)
    #[arg(short, long)]
    scenario: PathBuf,

    /// Engine tuning file, replacing the scenario's own tuning
    #[arg(short, long)]
    tuning: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    if let Ok(path) = std::env::var("HALO_LOG_PATH")
        && let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(file)
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ScenarioReport, String> {
    let mut scenario = Scenario::load(&cli.scenario).map_err(|e| e.to_string())?;
    if let Some(path) = &cli.tuning {
        scenario.tuning = load_tuning(path).map_err(|e| e.to_string())?;
    }
    Ok(scenario.run())
}

fn print_text(report: &ScenarioReport) {
    println!("scenario: {}", report.name);
    println!();
    println!("events:");
    for record in &report.dispatched {
        let surface = record
            .outcome
            .surface()
            .map(|s| format!(" {s}"))
            .unwrap_or_default();
        println!("  {:<24} {:?}{surface}", record.event.name(), record.outcome);
    }

    println!();
    println!("surfaces:");
    for s in &report.surfaces {
        let slot = s.slot.map(|slot| slot.to_string()).unwrap_or_else(|| "-".into());
        let overlay = s.overlay.map(|d| d.as_str()).unwrap_or("none");
        let trackers: Vec<_> = s
            .trackers
            .iter()
            .map(|t| t.spell_name.as_deref().unwrap_or("?"))
            .collect();
        println!(
            "  {} {slot:<8} overlay={overlay:<8} trackers=[{}] refreshes={}/{}",
            s.surface,
            trackers.join(", "),
            s.aura_refreshes,
            s.vitals_refreshes
        );
    }

    if !report.frames.is_empty() {
        println!();
        println!("foreign frames:");
        for f in &report.frames {
            println!(
                "  {} alpha={:.3} scale={:.3} mouse={} stripped={}",
                f.frame, f.alpha, f.scale, f.mouse, f.stripped
            );
        }
    }

    let status = &report.status;
    println!();
    println!(
        "cached={} mapped={} rebuilds={} self_heals={} generation={} timers={} gated={} listener_faults={} route_faults={}",
        status.cached_slots,
        status.mapped_slots,
        status.mapping_rebuilds,
        status.self_heals,
        status.generation,
        status.pending_timers,
        status.gated_tasks,
        status.listener_faults,
        status.route_faults
    );
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let report = match run(&cli) {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(scenario = %cli.scenario.display(), "{err}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                tracing::error!("failed to serialise report: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_text(&report);
    }
    ExitCode::SUCCESS
}
