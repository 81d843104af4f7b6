use serde::Serialize;

use super::vehicle::Vehicle;
use crate::constants::{
    DEFAULT_TRACK_ID, FINISH_RADIUS, LEAVE_START_DISTANCE, MIN_LAP_TIME_MS,
};

/// Start pose and finish geometry for one closed-loop course. Start and
/// finish share a point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: &'static str,
    pub start_x: f64,
    pub start_z: f64,
    pub start_heading: f64,
    pub finish_radius: f64,
}

pub const BUILTIN_TRACKS: &[Track] = &[
    Track {
        id: DEFAULT_TRACK_ID,
        start_x: 0.0,
        start_z: 0.0,
        start_heading: 0.0,
        finish_radius: FINISH_RADIUS,
    },
    Track {
        id: "canyon-loop",
        start_x: 120.0,
        start_z: -40.0,
        start_heading: std::f64::consts::FRAC_PI_2,
        finish_radius: FINISH_RADIUS,
    },
];

pub fn lookup_track(id: &str) -> Option<&'static Track> {
    BUILTIN_TRACKS.iter().find(|track| track.id == id)
}

impl Track {
    pub fn start_vehicle(&self) -> Vehicle {
        Vehicle::at_rest(self.start_x, self.start_z, self.start_heading)
    }
}

/// Finish detection for tracks whose start and finish coincide: the car has
/// to get clear of the start before coming back counts as a lap.
#[derive(Clone, Copy, Debug)]
pub struct LapTracker {
    start_x: f64,
    start_z: f64,
    finish_radius: f64,
    left_start: bool,
}

impl LapTracker {
    pub fn new(track: &Track) -> Self {
        Self {
            start_x: track.start_x,
            start_z: track.start_z,
            finish_radius: track.finish_radius,
            left_start: false,
        }
    }

    pub fn has_left_start(&self) -> bool {
        self.left_start
    }

    /// Returns true on the frame the lap completes.
    pub fn update(&mut self, vehicle: &Vehicle, elapsed_ms: u32) -> bool {
        let distance = vehicle.distance_to(self.start_x, self.start_z);
        if !self.left_start {
            self.left_start = distance > LEAVE_START_DISTANCE;
            return false;
        }
        distance < self.finish_radius && elapsed_ms >= MIN_LAP_TIME_MS
    }
}
