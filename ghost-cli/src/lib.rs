use std::{fs, path::Path};

use anyhow::{Context, Result};
use ghost_replay_core::codec::GhostFrame;
use ghost_replay_core::sim::SimOutcome;
use serde::{de::DeserializeOwned, Serialize};

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse JSON from {}", path.display()))
}

/// Ghost blobs are stored as base64 text; surrounding whitespace is ignored.
pub fn read_blob(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(text.trim().to_string())
}

/// Writes `contents` to `path`, creating parent directories, or prints it
/// when no path is given.
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
            }
            fs::write(path, contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("output={}", path.display());
        }
        None => println!("{contents}"),
    }
    Ok(())
}

pub fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    let encoded = serde_json::to_string_pretty(value)?;
    write_output(path, &encoded)
}

/// Frame-level breakdown of an encoded ghost.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub keyframes: usize,
    pub runs: usize,
    pub run_samples: usize,
    pub delta_batches: usize,
    pub delta_samples: usize,
}

impl FrameStats {
    pub fn from_frames(frames: &[GhostFrame]) -> Self {
        let mut stats = Self::default();
        for frame in frames {
            match frame {
                GhostFrame::Keyframe(_) => stats.keyframes += 1,
                GhostFrame::Run { count } => {
                    stats.runs += 1;
                    stats.run_samples += *count as usize;
                }
                GhostFrame::DeltaBatch(residuals) => {
                    stats.delta_batches += 1;
                    stats.delta_samples += residuals.len();
                }
            }
        }
        stats
    }

    pub fn samples(&self) -> usize {
        self.keyframes + self.run_samples + self.delta_samples
    }
}

pub fn describe_outcome(outcome: &SimOutcome) -> String {
    match outcome {
        SimOutcome::Finished { time_ms, frames } => {
            format!("result=finished\ntime_ms={time_ms}\nframes={frames}")
        }
        SimOutcome::DidNotFinish { frames } => {
            format!("result=did_not_finish\nframes={frames}")
        }
    }
}
