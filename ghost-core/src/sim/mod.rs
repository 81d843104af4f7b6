//! Fixed-step re-simulation of a control-input timeline.
//!
//! The loop is bounded by frame count, never wall clock, so the cost of a
//! verification depends only on the declared time.

use std::fmt;

use serde::Serialize;

use crate::codec::MotionSample;
use crate::constants::{
    MAX_SIM_TIME_MS, NOMINAL_FRAME_MS, RESIM_TIME_TOLERANCE, RESIM_TOLERANCE_WINDOW_MS,
    SIM_STEP_HZ, SIM_STEP_SECONDS,
};
use crate::input::{ControlEvent, ControlState};

mod track;
mod vehicle;


pub use track::{lookup_track, LapTracker, Track, BUILTIN_TRACKS};
pub use vehicle::Vehicle;

/// Simulation frames per emitted trace sample (60 Hz / 20 Hz).
const TRACE_STRIDE: u32 = SIM_STEP_HZ * NOMINAL_FRAME_MS / 1_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SimOutcome {
    Finished { time_ms: u32, frames: u32 },
    DidNotFinish { frames: u32 },
}

impl SimOutcome {
    pub fn finish_time_ms(&self) -> Option<u32> {
        match self {
            Self::Finished { time_ms, .. } => Some(*time_ms),
            Self::DidNotFinish { .. } => None,
        }
    }

    pub fn frames(&self) -> u32 {
        match self {
            Self::Finished { frames, .. } | Self::DidNotFinish { frames } => *frames,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimReport {
    pub declared_ms: u32,
    pub simulated_ms: u32,
    pub budget_ms: u32,
    pub frames: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimRejection {
    DidNotFinish { budget_ms: u32 },
    TimeMismatch { declared_ms: u32, simulated_ms: u32 },
}

impl fmt::Display for SimRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DidNotFinish { budget_ms } => {
                write!(f, "did not finish within {budget_ms} ms")
            }
            Self::TimeMismatch {
                declared_ms,
                simulated_ms,
            } => write!(
                f,
                "declared {declared_ms} ms but simulation finished at {simulated_ms} ms"
            ),
        }
    }
}

impl std::error::Error for SimRejection {}

/// Elapsed milliseconds at the start of `frame`, truncated.
#[inline]
pub fn frame_time_ms(frame: u32) -> u32 {
    (frame as u64 * 1_000 / SIM_STEP_HZ as u64) as u32
}

#[inline]
fn frames_for_budget(budget_ms: u32) -> u32 {
    let budget_ms = budget_ms.min(MAX_SIM_TIME_MS) as u64;
    ((budget_ms * SIM_STEP_HZ as u64).div_ceil(1_000)) as u32
}

/// Declared time plus the fractional tolerance and a fixed window, capped
/// at the absolute simulation limit.
pub fn time_budget_ms(declared_ms: u32) -> u32 {
    let tolerance = (declared_ms as f64 * RESIM_TIME_TOLERANCE).ceil() as u64;
    let budget = declared_ms as u64 + tolerance + RESIM_TOLERANCE_WINDOW_MS as u64;
    budget.min(MAX_SIM_TIME_MS as u64) as u32
}

/// A zero declared time never matches.
pub fn within_tolerance(declared_ms: u32, simulated_ms: u32) -> bool {
    if declared_ms == 0 {
        return false;
    }
    let deviation = (simulated_ms as f64 - declared_ms as f64).abs();
    deviation <= declared_ms as f64 * RESIM_TIME_TOLERANCE
}

struct Simulation<'a> {
    vehicle: Vehicle,
    controls: ControlState,
    lap: LapTracker,
    events: &'a [ControlEvent],
    next_event: usize,
    frame: u32,
}

impl<'a> Simulation<'a> {
    fn new(track: &Track, events: &'a [ControlEvent]) -> Self {
        Self {
            vehicle: track.start_vehicle(),
            controls: ControlState::default(),
            lap: LapTracker::new(track),
            events,
            next_event: 0,
            frame: 0,
        }
    }

    /// Applies due events, integrates one frame and reports lap completion.
    fn advance(&mut self) -> bool {
        let now_ms = frame_time_ms(self.frame);
        while let Some(event) = self.events.get(self.next_event) {
            if event.time_offset_ms > now_ms {
                break;
            }
            self.controls.apply(event.action);
            self.next_event += 1;
        }

        self.vehicle.step(SIM_STEP_SECONDS, &self.controls);
        self.frame += 1;
        self.lap.update(&self.vehicle, frame_time_ms(self.frame))
    }

    fn run(mut self, budget_ms: u32, mut on_frame: impl FnMut(u32, &Vehicle)) -> SimOutcome {
        let max_frames = frames_for_budget(budget_ms);
        on_frame(0, &self.vehicle);
        while self.frame < max_frames {
            let finished = self.advance();
            on_frame(self.frame, &self.vehicle);
            if finished {
                return SimOutcome::Finished {
                    time_ms: frame_time_ms(self.frame),
                    frames: self.frame,
                };
            }
        }
        SimOutcome::DidNotFinish { frames: self.frame }
    }
}

/// Replays `events` from the track's start pose until the lap completes or
/// `budget_ms` of simulated time runs out.
pub fn simulate(track: &Track, events: &[ControlEvent], budget_ms: u32) -> SimOutcome {
    Simulation::new(track, events).run(budget_ms, |_, _| {})
}

/// Like [`simulate`], also emitting a motion sample every
/// `NOMINAL_FRAME_MS` of simulated time, starting at time zero.
pub fn simulate_with_trace(
    track: &Track,
    events: &[ControlEvent],
    budget_ms: u32,
) -> (SimOutcome, Vec<MotionSample>) {
    let mut trace = Vec::new();
    let outcome = Simulation::new(track, events).run(budget_ms, |frame, vehicle| {
        if frame % TRACE_STRIDE == 0 {
            trace.push(vehicle.to_sample(frame_time_ms(frame)));
        }
    });
    (outcome, trace)
}

pub fn resimulate(
    track: &Track,
    events: &[ControlEvent],
    declared_ms: u32,
) -> Result<SimReport, SimRejection> {
    let budget_ms = time_budget_ms(declared_ms);
    let outcome = simulate(track, events, budget_ms);

    let SimOutcome::Finished { time_ms, frames } = outcome else {
        return Err(SimRejection::DidNotFinish { budget_ms });
    };
    if !within_tolerance(declared_ms, time_ms) {
        return Err(SimRejection::TimeMismatch {
            declared_ms,
            simulated_ms: time_ms,
        });
    }

    Ok(SimReport {
        declared_ms,
        simulated_ms: time_ms,
        budget_ms,
        frames,
    })
}
