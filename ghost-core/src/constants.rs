//! Shared fixed-point scales and tuning constants.
//!
//! The ghost encoder, decoder, checksum, input stream codec and the
//! re-simulator all read from this module so the two ends of every format
//! cannot drift apart.

// Fixed-point scales
pub const POSITION_SCALE: f64 = 100.0; // 1/100 unit
pub const HEADING_SCALE: f64 = 1000.0; // 1/1000 radian
pub const VELOCITY_SCALE: f64 = 100.0; // 1/100 unit per second

// Ghost stream cadence
pub const NOMINAL_FRAME_MS: u32 = 50; // 20 Hz producer
pub const KEYFRAME_INTERVAL_MS: u32 = 1_000;
/// Largest heading change still absorbed by a run frame. Half a quantum, so a
/// run never hides a heading change that would survive quantization.
pub const HEADING_RUN_THRESHOLD: f64 = 0.5 / HEADING_SCALE;
/// Upper bound on samples a single blob may expand to (one hour at 20 Hz).
pub const MAX_GHOST_SAMPLES: usize = 72_000;

// Ghost frame tags
pub const FRAME_TAG_KEYFRAME: u8 = 0x01;
pub const FRAME_TAG_RUN: u8 = 0x02;
pub const FRAME_TAG_DELTA_BATCH: u8 = 0x03;

// Control-input stream
pub const INPUT_STREAM_VERSION: u8 = 1;
pub const MAX_INPUT_EVENTS: usize = 100_000;

// Client-side plausibility gate
pub const MIN_SAMPLES: usize = 50;
pub const MIN_FINISH_TIME_MS: u32 = 10_000;
pub const MAX_PLAUSIBLE_SPEED: f64 = 50.0; // units per second

// Leaderboard
pub const LEADERBOARD_CAPACITY: usize = 10;
pub const MAX_NAME_CHARS: usize = 20;
pub const DEFAULT_TRACK_ID: &str = "default";

// Re-simulation
pub const SIM_STEP_HZ: u32 = 60;
pub const SIM_STEP_SECONDS: f64 = 1.0 / SIM_STEP_HZ as f64;
pub const RESIM_TIME_TOLERANCE: f64 = 0.10;
pub const RESIM_TOLERANCE_WINDOW_MS: u32 = 5_000;
pub const MAX_SIM_TIME_MS: u32 = 15 * 60 * 1_000;
pub const LEAVE_START_DISTANCE: f64 = 10.0;
pub const FINISH_RADIUS: f64 = 4.0;
pub const MIN_LAP_TIME_MS: u32 = 3_000;

// Vehicle model (units, seconds, radians)
pub const VEHICLE_ACCELERATION: f64 = 15.0;
pub const VEHICLE_BRAKE_DECELERATION: f64 = 30.0;
pub const VEHICLE_REVERSE_ACCELERATION: f64 = 8.0;
pub const VEHICLE_ROLLING_FRICTION: f64 = 4.0;
pub const VEHICLE_HANDBRAKE_DECELERATION: f64 = 12.0;
pub const VEHICLE_MAX_FORWARD_SPEED: f64 = 30.0;
pub const VEHICLE_MAX_REVERSE_SPEED: f64 = 8.0;
pub const VEHICLE_TURN_RADIUS: f64 = 20.0;
pub const VEHICLE_MAX_YAW_RATE: f64 = 2.5;
pub const DRIFT_YAW_MULTIPLIER: f64 = 1.4;
pub const DRIFT_SLIP_GAIN: f64 = 0.35;
pub const GRIP_SLIP_DECAY: f64 = 8.0; // per second
pub const DRIFT_SLIP_DECAY: f64 = 1.5; // per second
