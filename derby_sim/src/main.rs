//! Derby tournament simulator CLI
//!
//! Plays full six-round tournaments on a virtual clock and prints the results.

use clap::Parser;
use derby_sim::{report, TournamentReport, TournamentRunner};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Derby tournament simulator
#[derive(Parser, Debug)]
#[command(name = "derby-sim")]
#[command(about = "Run seeded horse race tournaments", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of horses in the pool (10..=20)
    #[arg(short = 'n', long, default_value = "20")]
    horses: usize,

    /// Host frame interval in milliseconds
    #[arg(short, long, default_value = "16")]
    frame_ms: u64,

    /// Number of consecutive seeds to play
    #[arg(short, long, default_value = "1")]
    tournaments: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export every frame of the first tournament to a JSON file
    #[arg(long)]
    export: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    // Initialize logging; RUST_LOG overrides the verbosity flag
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("Derby Simulator v{}", env!("CARGO_PKG_VERSION"));
    }

    // Determine base seed
    let base_seed = if args.seed == 0 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    let mut reports: Vec<TournamentReport> = Vec::new();

    for offset in 0..args.tournaments.max(1) {
        let seed = base_seed.wrapping_add(offset as u64);
        let runner = TournamentRunner::new(seed)
            .with_horse_count(args.horses)
            .with_frame_interval(Duration::from_millis(args.frame_ms.max(1)));

        let outcome = match (&args.export, offset) {
            (Some(path), 0) => runner.run_with_export().await.map(|(report, export)| {
                match export.write_to_file(path) {
                    Ok(()) => info!("Exported {} frames to {}", export.frames.len(), path),
                    Err(e) => error!("Failed to write export: {}", e),
                }
                report
            }),
            _ => runner.run().await,
        };

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                error!("Tournament (seed={}) could not be set up: {}", seed, e);
                std::process::exit(1);
            }
        };

        if !args.json {
            println!("{}", report::render_report(&result));
            if result.passed {
                info!("✓ Tournament (seed={}) PASSED in {:.2}s", seed, result.elapsed.as_secs_f64());
            } else {
                error!(
                    "✗ Tournament (seed={}) FAILED: {}",
                    seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }

        reports.push(result);
    }

    let failed_count = reports.iter().filter(|r| !r.passed).count();
    let total = reports.len();

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed_count,
            "failed": failed_count,
            "results": reports,
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to encode summary: {}", e),
        }
    } else if failed_count == 0 {
        info!("All {} tournaments passed", total);
    } else {
        error!("{}/{} tournaments failed", failed_count, total);
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
