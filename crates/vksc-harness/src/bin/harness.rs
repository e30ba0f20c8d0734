//! CLI entrypoint for the Vulkan SC reporting harness.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vksc_harness::structured_log::{ArtifactIndex, LogEmitter, validate_log_file};
use vksc_harness::{ReservationLimits, check_limits, load_snapshots};

/// Reporting tooling for gathered Vulkan SC statistics.
#[derive(Debug, Parser)]
#[command(name = "vksc-harness")]
#[command(about = "Limit checks and reservations for Vulkan SC statistics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check gathered statistics against declared reservation limits.
    CheckLimits {
        /// Statistics snapshot JSON; repeat to merge several devices.
        #[arg(long = "snapshot", required = true)]
        snapshots: Vec<PathBuf>,
        /// Limits JSON (metric name to upper bound).
        #[arg(long)]
        limits: PathBuf,
        /// Optional structured JSONL log of the check.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Run identifier used in trace ids.
        #[arg(long, default_value = "check")]
        run_id: String,
    },
    /// Derive the reservation a replay pass must request.
    Reservation {
        /// Statistics snapshot JSON; repeat to merge several devices.
        #[arg(long = "snapshot", required = true)]
        snapshots: Vec<PathBuf>,
        /// Output JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate a structured JSONL log.
    ValidateLog {
        #[arg(long)]
        log: PathBuf,
    },
    /// Write an artifact index with SHA-256 digests of the given files.
    IndexArtifacts {
        #[arg(long, default_value = "run")]
        run_id: String,
        /// Artifacts as `kind=path`.
        #[arg(long = "artifact", required = true)]
        artifacts: Vec<String>,
        /// Output JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn write_or_print(output: Option<PathBuf>, content: &str) -> std::io::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, content)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::CheckLimits {
            snapshots,
            limits,
            log,
            run_id,
        } => {
            let snapshot = load_snapshots(&snapshots)?;
            let limits = ReservationLimits::from_file(&limits)?;
            let violations = check_limits(&snapshot, &limits)?;
            if let Some(path) = log {
                let mut emitter = LogEmitter::to_file(&path, &run_id, "merged")?;
                emitter.emit_limit_check(&violations)?;
                emitter.flush()?;
            }
            let report: Vec<serde_json::Value> =
                violations.iter().map(|v| v.to_value()).collect();
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !violations.is_empty() {
                return Err(format!(
                    "{} of {} declared limits exceeded",
                    violations.len(),
                    limits.len()
                )
                .into());
            }
            eprintln!("All {} declared limits hold", limits.len());
        }
        Command::Reservation { snapshots, output } => {
            let snapshot = load_snapshots(&snapshots)?;
            let reservation = ReservationLimits::from_snapshot(&snapshot);
            write_or_print(output, &reservation.to_json()?)?;
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = validate_log_file(&log)?;
            for error in &errors {
                eprintln!("{error}");
            }
            if !errors.is_empty() {
                return Err(format!(
                    "{} validation errors in {lines} lines of {}",
                    errors.len(),
                    log.display()
                )
                .into());
            }
            eprintln!("{lines} lines valid");
        }
        Command::IndexArtifacts {
            run_id,
            artifacts,
            output,
        } => {
            let mut index = ArtifactIndex::new(run_id);
            for entry in &artifacts {
                let Some((kind, path)) = entry.split_once('=') else {
                    return Err(format!("artifact '{entry}' is not of the form kind=path").into());
                };
                index.add_file(&PathBuf::from(path), kind)?;
            }
            write_or_print(output, &index.to_json()?)?;
        }
    }

    Ok(())
}
