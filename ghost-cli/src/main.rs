use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ghost_cli::{describe_outcome, read_blob, read_json, write_json, write_output, FrameStats};
use ghost_replay_core::checksum::{checksum_events, checksum_samples, format_checksum};
use ghost_replay_core::cipher::{seal_ghost, unseal};
use ghost_replay_core::codec::{encode_samples, parse_frames, try_decode_samples};
use ghost_replay_core::constants::{DEFAULT_TRACK_ID, MAX_SIM_TIME_MS};
use ghost_replay_core::input::{seal_events, ControlEvent};
use ghost_replay_core::sim::{lookup_track, simulate, simulate_with_trace, Track, BUILTIN_TRACKS};
use ghost_replay_core::submit::{prepare_submission, FinishedRun};
use ghost_replay_core::{validate_run, verify_submission, MotionSample, SubmissionRequest};

#[derive(Parser, Debug)]
#[command(name = "ghost-cli")]
#[command(about = "Ghost replay and input timeline tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List built-in tracks
    Tracks,
    /// Encode a JSON array of motion samples into a sealed ghost blob
    Encode {
        #[arg(long)]
        samples: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Decode a sealed ghost blob back into motion samples
    Decode {
        #[arg(long)]
        ghost: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compute the integrity checksum of a sample trace or an input timeline
    Checksum {
        #[arg(long, value_enum, default_value_t = ChecksumKind::Events)]
        kind: ChecksumKind,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        finish_ms: u32,
    },
    /// Run the client-side plausibility checks on a sample trace
    Validate {
        #[arg(long)]
        samples: PathBuf,
        #[arg(long)]
        finish_ms: u32,
    },
    /// Replay an input timeline through the vehicle model
    Simulate {
        #[arg(long)]
        events: PathBuf,
        #[arg(long, default_value = DEFAULT_TRACK_ID)]
        track: String,
        #[arg(long, default_value_t = MAX_SIM_TIME_MS)]
        budget_ms: u32,
        /// Write the 20 Hz motion trace here
        #[arg(long)]
        trace: Option<PathBuf>,
    },
    /// Simulate an input timeline and build the submission body for it
    Prepare {
        #[arg(long)]
        events: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = DEFAULT_TRACK_ID)]
        track: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Verify a submission body exactly as the server does
    Verify {
        #[arg(long)]
        request: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ChecksumKind {
    Samples,
    Events,
}

fn resolve_track(id: &str) -> Result<&'static Track> {
    lookup_track(id).ok_or_else(|| {
        let available: Vec<_> = BUILTIN_TRACKS.iter().map(|track| track.id).collect();
        anyhow!("unknown track '{id}'. available: {}", available.join(", "))
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Tracks => {
            for track in BUILTIN_TRACKS {
                println!(
                    "{:16} start=({:.2}, {:.2}) heading={:.3} finish_radius={:.1}",
                    track.id, track.start_x, track.start_z, track.start_heading, track.finish_radius
                );
            }
        }
        Commands::Encode { samples, output } => {
            let samples: Vec<MotionSample> = read_json(&samples)?;
            let Some(last) = samples.last() else {
                bail!("no samples to encode");
            };
            let encoded = encode_samples(&samples);
            tracing::info!(samples = samples.len(), bytes = encoded.len(), "encoded ghost");

            println!("samples={}", samples.len());
            println!("bytes={}", encoded.len());
            println!(
                "checksum={}",
                format_checksum(checksum_samples(&samples, last.time))
            );
            write_output(output.as_deref(), &seal_ghost(&samples))?;
        }
        Commands::Decode { ghost, output } => {
            let bytes = unseal(&read_blob(&ghost)?)
                .with_context(|| format!("{} is not a sealed ghost", ghost.display()))?;
            let frames = parse_frames(&bytes)?;
            let samples = try_decode_samples(&bytes)?;
            let stats = FrameStats::from_frames(&frames);

            println!("bytes={}", bytes.len());
            println!("keyframes={}", stats.keyframes);
            println!("runs={} run_samples={}", stats.runs, stats.run_samples);
            println!(
                "delta_batches={} delta_samples={}",
                stats.delta_batches, stats.delta_samples
            );
            write_json(output.as_deref(), &samples)?;
        }
        Commands::Checksum {
            kind,
            input,
            finish_ms,
        } => {
            let checksum = match kind {
                ChecksumKind::Samples => {
                    let samples: Vec<MotionSample> = read_json(&input)?;
                    checksum_samples(&samples, finish_ms)
                }
                ChecksumKind::Events => {
                    let events: Vec<ControlEvent> = read_json(&input)?;
                    checksum_events(&events, finish_ms)
                }
            };
            println!("{}", format_checksum(checksum));
        }
        Commands::Validate { samples, finish_ms } => {
            let samples: Vec<MotionSample> = read_json(&samples)?;
            let report = validate_run(&samples, finish_ms);
            println!("valid={}", report.valid);
            for issue in &report.errors {
                println!("error={issue}");
            }
            if let Some(first) = report.first_error() {
                bail!("run is not plausible: {first}");
            }
        }
        Commands::Simulate {
            events,
            track,
            budget_ms,
            trace,
        } => {
            let track = resolve_track(&track)?;
            let events: Vec<ControlEvent> = read_json(&events)?;
            match trace {
                Some(path) => {
                    let (outcome, samples) = simulate_with_trace(track, &events, budget_ms);
                    println!("{}", describe_outcome(&outcome));
                    write_json(Some(&path), &samples)?;
                }
                None => println!("{}", describe_outcome(&simulate(track, &events, budget_ms))),
            }
        }
        Commands::Prepare {
            events,
            name,
            track,
            output,
        } => {
            let track = resolve_track(&track)?;
            let events: Vec<ControlEvent> = read_json(&events)?;
            // Fail on a malformed timeline before spending a full simulation on it.
            seal_events(&events)?;

            let (outcome, samples) = simulate_with_trace(track, &events, MAX_SIM_TIME_MS);
            let finish_time_ms = outcome
                .finish_time_ms()
                .ok_or_else(|| anyhow!("timeline never reaches the finish on {}", track.id))?;
            tracing::info!(finish_time_ms, samples = samples.len(), "lap simulated");

            let request = prepare_submission(&FinishedRun {
                name: &name,
                track_id: track.id,
                finish_time_ms,
                samples: &samples,
                events: &events,
            })?;
            write_json(output.as_deref(), &request)?;
        }
        Commands::Verify { request } => {
            let request: SubmissionRequest = read_json(&request)?;
            match verify_submission(&request) {
                Ok(run) => {
                    println!("accepted=true");
                    println!("name={}", run.name);
                    println!("track={}", run.track_id);
                    println!("declared_ms={}", run.time_ms);
                    println!("simulated_ms={}", run.simulated_ms);
                    println!("events={}", run.event_count);
                    println!("checksum={}", run.checksum);
                }
                Err(err) => {
                    println!("accepted=false");
                    println!("error_code={}", err.error_code());
                    println!("category={}", err.category().as_str());
                    bail!("submission rejected: {err}");
                }
            }
        }
    }

    Ok(())
}
