//! Client-side plausibility gate.
//!
//! Runs before a submission is attempted so obviously broken runs get a
//! readable message instead of a server rejection. The server never relies
//! on it; re-simulation is the real check.

use std::fmt;

use serde::Serialize;

use crate::codec::MotionSample;
use crate::constants::{MAX_PLAUSIBLE_SPEED, MIN_FINISH_TIME_MS, MIN_SAMPLES};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    TooFewSamples { count: usize },
    FinishTooFast { time_ms: u32 },
    TimeInverted { index: usize },
    SpeedExceeded { index: usize, speed: f64 },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewSamples { count } => write!(
                f,
                "run has {count} samples, at least {MIN_SAMPLES} are required"
            ),
            Self::FinishTooFast { time_ms } => write!(
                f,
                "finish time {time_ms} ms is below the {MIN_FINISH_TIME_MS} ms minimum"
            ),
            Self::TimeInverted { index } => {
                write!(f, "sample {index} is earlier than the sample before it")
            }
            Self::SpeedExceeded { index, speed } => write!(
                f,
                "sample {index} implies {speed:.1} units/s, above the {MAX_PLAUSIBLE_SPEED} limit"
            ),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// The reason a UI should show, if any.
    pub fn first_error(&self) -> Option<&ValidationIssue> {
        self.errors.first()
    }
}

/// Reports the first occurrence of every violated rule, in rule order.
pub fn validate_run(samples: &[MotionSample], finish_time_ms: u32) -> ValidationReport {
    let mut errors = Vec::new();

    if samples.len() < MIN_SAMPLES {
        errors.push(ValidationIssue::TooFewSamples {
            count: samples.len(),
        });
    }
    if finish_time_ms < MIN_FINISH_TIME_MS {
        errors.push(ValidationIssue::FinishTooFast {
            time_ms: finish_time_ms,
        });
    }

    errors.extend(motion_issues(samples));

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

/// Time-order and speed violations between consecutive samples, first
/// occurrence of each. Also applied server-side to submitted ghosts.
pub fn motion_issues(samples: &[MotionSample]) -> Vec<ValidationIssue> {
    let mut inverted = None;
    let mut too_fast = None;
    for (index, pair) in samples.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        let index = index + 1;

        if next.time < prev.time {
            inverted.get_or_insert(ValidationIssue::TimeInverted { index });
            continue;
        }
        if too_fast.is_some() {
            continue;
        }

        let distance = (next.x - prev.x).hypot(next.z - prev.z);
        let speed = if next.time == prev.time {
            // Any movement without elapsed time is unbounded.
            if distance > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        } else {
            distance / ((next.time - prev.time) as f64 / 1000.0)
        };
        if speed > MAX_PLAUSIBLE_SPEED {
            too_fast = Some(ValidationIssue::SpeedExceeded { index, speed });
        }
    }
    inverted.into_iter().chain(too_fast).collect()
}
