//! Agreement Simulator CLI
//!
//! Run deterministic agreement scenarios or replay a scripted schedule.

use agreement_core::AgreementEngine;
use agreement_sim::{
    Order, PropertyOracle, RunExport, ScenarioId, ScenarioResult, ScenarioRunner, ScheduleFile,
    SeededAdversary, SimContext, SimError,
};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Byzantine Agreement Simulation CLI
#[derive(Parser, Debug)]
#[command(name = "agreement-sim")]
#[command(about = "Run deterministic Byzantine agreement scenarios", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Scenario to run (loyal_army, traitor_lieutenant, traitor_commander,
    /// split_commander, large_army, silent_traitors, oral_messages, random_sweep, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Army size for silent_traitors and random_sweep
    #[arg(short, long, default_value = "10")]
    army: usize,

    /// Replay a scripted run from a JSON schedule instead of scenarios
    #[arg(long)]
    schedule: Option<String>,

    /// Export the (last) run to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// List the built-in scenarios and exit
    #[arg(long)]
    list: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize logging, RUST_LOG overrides the level
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if args.list {
        for scenario in ScenarioId::all() {
            println!("{:<20} {}", scenario.name(), scenario.description());
        }
        return;
    }

    let outcome = match &args.schedule {
        Some(path) => replay(&args, path),
        None => run_scenarios(&args),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn base_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(1)
}

/// Replays a schedule file, returns whether the guarantees held.
fn replay(args: &Args, path: &str) -> Result<bool, SimError> {
    let schedule = ScheduleFile::load(path)?;
    let setup = schedule.setup();
    let ctx = SimContext::new(base_seed(args.seed));

    let engine = AgreementEngine::new(schedule.config())
        .with_fault_model(SeededAdversary::new(ctx.adversary_seed(), Order::ALL));
    let outcome = engine.run_with_supplier(&setup, &schedule.deliveries)?;

    let violations = PropertyOracle::new(&setup).check_guaranteed(&outcome);
    let passed = violations.is_empty();

    let mut export = RunExport::capture(path, ctx.seed(), &setup, &outcome);
    export.finalize(passed, violations);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&export)?);
    } else {
        info!(
            "Replayed {} (n={}, f={}, {} scripted inboxes)",
            path,
            setup.n,
            setup.f,
            schedule.deliveries.len()
        );
        if !outcome.agreement_guaranteed() {
            info!("  {} relay does not guarantee agreement here", outcome.strategy());
        }
        for decision in &export.decisions {
            info!(
                "  general {}{}: {}",
                decision.id,
                if decision.faulty { " (traitor)" } else { "" },
                decision.decision
            );
        }
        info!("Consensus: {}", export.consensus);
        for violation in &export.violations {
            error!("  - {}", violation);
        }
    }

    if let Some(export_path) = &args.export {
        export.write_to_file(export_path)?;
        info!("Exported run to {}", export_path);
    }

    Ok(passed)
}

/// Runs the selected scenarios, returns whether all of them passed.
fn run_scenarios(args: &Args) -> Result<bool, SimError> {
    if !args.json {
        info!("Agreement Simulator v0.1.0");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().map_err(SimError::Usage)?]
    };

    let base_seed = base_seed(args.seed);

    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 || args.seeds > 1 {
            return Err(SimError::Usage(
                "--export only supports a single scenario and seed".to_string(),
            ));
        }

        let (result, export) = ScenarioRunner::new(base_seed)
            .with_army(args.army)
            .run_recorded(scenarios[0]);
        if let Some(export) = export {
            export.write_to_file(export_path)?;
            info!("Exported {} to {}", scenarios[0].name(), export_path);
        }
        report(&result, args.json);
        return Ok(result.passed);
    }

    let mut all_results: Vec<ScenarioResult> = Vec::new();
    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = ScenarioRunner::new(seed).with_army(args.army);

        for scenario in &scenarios {
            let result = runner.run(*scenario);
            if !args.json {
                report(&result, false);
            }
            all_results.push(result);
        }
    }

    let total = all_results.len();
    let failed: Vec<&ScenarioResult> = all_results.iter().filter(|r| !r.passed).collect();

    if args.json {
        // JSON output for CI parsing
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed.len(),
            "failed": failed.len(),
            "results": all_results,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed.is_empty() {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed.len(), total);
            for result in &failed {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    Ok(failed.is_empty())
}

fn report(result: &ScenarioResult, json: bool) {
    if json {
        match serde_json::to_string_pretty(result) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to encode result: {}", e),
        }
        return;
    }

    if result.passed {
        info!("✓ {} (seed={}) PASSED", result.scenario.name(), result.seed);
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}
