//! Predictive delta codec for ghost replays.
//!
//! A stream is a sequence of tagged frames:
//!   KEYFRAME (0x01): time(varint) x z heading vx vz (zigzag varints)
//!   RUN      (0x02): count(varint) samples that match the linear prediction
//!   DELTA    (0x03): count(varint) then `count` residual tuples
//!                    (dx dz dheading dvx dvz, zigzag varints)
//!
//! All arithmetic after quantization is integer, so the decoder lands on
//! exactly the quantized values the encoder saw. Run and delta frames are
//! expanded with the nominal 50 ms cadence; ghosts recorded with another
//! cadence decode with shifted timestamps between keyframes.

use serde::{Deserialize, Serialize};

use crate::constants::{
    FRAME_TAG_DELTA_BATCH, FRAME_TAG_KEYFRAME, FRAME_TAG_RUN, HEADING_RUN_THRESHOLD,
    HEADING_SCALE, KEYFRAME_INTERVAL_MS, MAX_GHOST_SAMPLES, NOMINAL_FRAME_MS, POSITION_SCALE,
    VELOCITY_SCALE,
};
use crate::error::DecodeError;
use crate::varint::{write_varint_i32, write_varint_u32, ByteReader};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSample {
    /// Milliseconds since the start of the run.
    pub time: u32,
    pub x: f64,
    pub z: f64,
    pub heading_y: f64,
    pub vx: f64,
    pub vz: f64,
}

/// A sample on the fixed-point grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantizedSample {
    pub time: u32,
    pub x: i32,
    pub z: i32,
    pub heading: i32,
    pub vx: i32,
    pub vz: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Residual {
    pub dx: i32,
    pub dz: i32,
    pub dheading: i32,
    pub dvx: i32,
    pub dvz: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GhostFrame {
    Keyframe(QuantizedSample),
    Run { count: u32 },
    DeltaBatch(Vec<Residual>),
}

/// Interpolated playback state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostState {
    pub x: f64,
    pub z: f64,
    pub heading_y: f64,
    pub speed: f64,
}

#[inline]
pub fn quantize(value: f64, scale: f64) -> i32 {
    let scaled = (value * scale).round();
    if scaled.is_nan() {
        0
    } else {
        scaled as i32
    }
}

/// Position advanced by `velocity` over `dt_ms`, in position quanta.
#[inline]
fn extrapolate(position: i32, velocity: i32, dt_ms: u32) -> i32 {
    let travel = velocity as f64 * (POSITION_SCALE / VELOCITY_SCALE) * dt_ms as f64 / 1000.0;
    position.wrapping_add(travel.round() as i32)
}

impl QuantizedSample {
    pub fn from_sample(sample: &MotionSample) -> Self {
        Self {
            time: sample.time,
            x: quantize(sample.x, POSITION_SCALE),
            z: quantize(sample.z, POSITION_SCALE),
            heading: quantize(sample.heading_y, HEADING_SCALE),
            vx: quantize(sample.vx, VELOCITY_SCALE),
            vz: quantize(sample.vz, VELOCITY_SCALE),
        }
    }

    pub fn to_sample(self) -> MotionSample {
        MotionSample {
            time: self.time,
            x: self.x as f64 / POSITION_SCALE,
            z: self.z as f64 / POSITION_SCALE,
            heading_y: self.heading as f64 / HEADING_SCALE,
            vx: self.vx as f64 / VELOCITY_SCALE,
            vz: self.vz as f64 / VELOCITY_SCALE,
        }
    }

    /// Constant-velocity prediction `dt_ms` later, stamped with `time`.
    fn predict(&self, dt_ms: u32, time: u32) -> Self {
        Self {
            time,
            x: extrapolate(self.x, self.vx, dt_ms),
            z: extrapolate(self.z, self.vz, dt_ms),
            ..*self
        }
    }

    fn apply(&self, residual: &Residual) -> Self {
        Self {
            time: self.time,
            x: self.x.wrapping_add(residual.dx),
            z: self.z.wrapping_add(residual.dz),
            heading: self.heading.wrapping_add(residual.dheading),
            vx: self.vx.wrapping_add(residual.dvx),
            vz: self.vz.wrapping_add(residual.dvz),
        }
    }
}

impl Residual {
    fn between(predicted: &QuantizedSample, actual: &QuantizedSample) -> Self {
        Self {
            dx: actual.x.wrapping_sub(predicted.x),
            dz: actual.z.wrapping_sub(predicted.z),
            dheading: actual.heading.wrapping_sub(predicted.heading),
            dvx: actual.vx.wrapping_sub(predicted.vx),
            dvz: actual.vz.wrapping_sub(predicted.vz),
        }
    }

    fn is_straight_line(&self) -> bool {
        self.dx == 0
            && self.dz == 0
            && self.dvx == 0
            && self.dvz == 0
            && (self.dheading as f64 / HEADING_SCALE).abs() < HEADING_RUN_THRESHOLD
    }
}

#[derive(Default)]
struct FrameWriter {
    frames: Vec<GhostFrame>,
    pending_run: u32,
    pending_deltas: Vec<Residual>,
}

impl FrameWriter {
    fn flush_run(&mut self) {
        if self.pending_run > 0 {
            self.frames.push(GhostFrame::Run {
                count: self.pending_run,
            });
            self.pending_run = 0;
        }
    }

    fn flush_deltas(&mut self) {
        if !self.pending_deltas.is_empty() {
            let batch = std::mem::take(&mut self.pending_deltas);
            self.frames.push(GhostFrame::DeltaBatch(batch));
        }
    }

    fn flush(&mut self) {
        self.flush_run();
        self.flush_deltas();
    }
}

/// Frame-level encoding of `samples` (ordered by non-decreasing time).
///
/// Samples that match the constant-velocity prediction, over both the real
/// gap and the nominal interval, extend a run, even across the keyframe
/// interval: a run reproduces the prediction exactly and has nothing to
/// resynchronize. Any other sample becomes a keyframe once
/// `KEYFRAME_INTERVAL_MS` has passed since the previous one, and a residual
/// in the pending delta batch otherwise.
pub fn encode_frames(samples: &[MotionSample]) -> Vec<GhostFrame> {
    let mut writer = FrameWriter::default();
    let Some(first) = samples.first() else {
        return writer.frames;
    };

    let mut previous = QuantizedSample::from_sample(first);
    let mut last_keyframe_time = previous.time;
    writer.frames.push(GhostFrame::Keyframe(previous));

    for sample in &samples[1..] {
        let actual = QuantizedSample::from_sample(sample);
        let dt_ms = actual.time.saturating_sub(previous.time);

        // The decoder only knows the nominal interval, so residuals are
        // taken against that prediction.
        let predicted = previous.predict(NOMINAL_FRAME_MS, actual.time);
        let residual = Residual::between(&predicted, &actual);
        let on_course =
            Residual::between(&previous.predict(dt_ms, actual.time), &actual).is_straight_line();

        if on_course && residual.is_straight_line() {
            writer.flush_deltas();
            writer.pending_run += 1;
            previous = predicted;
            continue;
        }

        if actual.time.saturating_sub(last_keyframe_time) >= KEYFRAME_INTERVAL_MS {
            writer.flush();
            writer.frames.push(GhostFrame::Keyframe(actual));
            last_keyframe_time = actual.time;
            previous = actual;
            continue;
        }

        writer.flush_run();
        writer.pending_deltas.push(residual);
        previous = predicted.apply(&residual);
    }

    writer.flush();
    writer.frames
}

pub fn serialize_frames(frames: &[GhostFrame]) -> Vec<u8> {
    let mut out = Vec::new();

    for frame in frames {
        match frame {
            GhostFrame::Keyframe(key) => {
                out.push(FRAME_TAG_KEYFRAME);
                write_varint_u32(&mut out, key.time);
                write_varint_i32(&mut out, key.x);
                write_varint_i32(&mut out, key.z);
                write_varint_i32(&mut out, key.heading);
                write_varint_i32(&mut out, key.vx);
                write_varint_i32(&mut out, key.vz);
            }
            GhostFrame::Run { count } => {
                out.push(FRAME_TAG_RUN);
                write_varint_u32(&mut out, *count);
            }
            GhostFrame::DeltaBatch(residuals) => {
                out.push(FRAME_TAG_DELTA_BATCH);
                write_varint_u32(&mut out, residuals.len() as u32);
                for residual in residuals {
                    write_varint_i32(&mut out, residual.dx);
                    write_varint_i32(&mut out, residual.dz);
                    write_varint_i32(&mut out, residual.dheading);
                    write_varint_i32(&mut out, residual.dvx);
                    write_varint_i32(&mut out, residual.dvz);
                }
            }
        }
    }

    out
}

pub fn encode_samples(samples: &[MotionSample]) -> Vec<u8> {
    serialize_frames(&encode_frames(samples))
}

pub fn parse_frames(bytes: &[u8]) -> Result<Vec<GhostFrame>, DecodeError> {
    let mut reader = ByteReader::new(bytes);
    let mut frames = Vec::new();

    while !reader.is_empty() {
        let offset = reader.position();
        let tag = reader.read_u8()?;
        let frame = match tag {
            FRAME_TAG_KEYFRAME => GhostFrame::Keyframe(QuantizedSample {
                time: reader.read_varint_u32()?,
                x: reader.read_varint_i32()?,
                z: reader.read_varint_i32()?,
                heading: reader.read_varint_i32()?,
                vx: reader.read_varint_i32()?,
                vz: reader.read_varint_i32()?,
            }),
            FRAME_TAG_RUN => {
                let count = reader.read_varint_u32()?;
                check_frame_count(count, offset)?;
                GhostFrame::Run { count }
            }
            FRAME_TAG_DELTA_BATCH => {
                let count = reader.read_varint_u32()?;
                check_frame_count(count, offset)?;
                let mut residuals = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    residuals.push(Residual {
                        dx: reader.read_varint_i32()?,
                        dz: reader.read_varint_i32()?,
                        dheading: reader.read_varint_i32()?,
                        dvx: reader.read_varint_i32()?,
                        dvz: reader.read_varint_i32()?,
                    });
                }
                GhostFrame::DeltaBatch(residuals)
            }
            other => return Err(DecodeError::UnknownFrameTag { tag: other, offset }),
        };
        frames.push(frame);
    }

    Ok(frames)
}

fn check_frame_count(count: u32, offset: usize) -> Result<(), DecodeError> {
    if count == 0 {
        return Err(DecodeError::EmptyFrame { offset });
    }
    if count as usize > MAX_GHOST_SAMPLES {
        return Err(DecodeError::TooManySamples {
            limit: MAX_GHOST_SAMPLES,
        });
    }
    Ok(())
}

fn expand_frames(frames: &[GhostFrame]) -> Result<Vec<QuantizedSample>, DecodeError> {
    let mut samples: Vec<QuantizedSample> = Vec::new();

    for frame in frames {
        let added = match frame {
            GhostFrame::Keyframe(_) => 1,
            GhostFrame::Run { count } => *count as usize,
            GhostFrame::DeltaBatch(residuals) => residuals.len(),
        };
        if samples.len() + added > MAX_GHOST_SAMPLES {
            return Err(DecodeError::TooManySamples {
                limit: MAX_GHOST_SAMPLES,
            });
        }

        match frame {
            GhostFrame::Keyframe(key) => samples.push(*key),
            GhostFrame::Run { count } => {
                let mut previous = *samples.last().ok_or(DecodeError::MissingKeyframe)?;
                for _ in 0..*count {
                    previous = previous.predict(NOMINAL_FRAME_MS, next_time(&previous)?);
                    samples.push(previous);
                }
            }
            GhostFrame::DeltaBatch(residuals) => {
                let mut previous = *samples.last().ok_or(DecodeError::MissingKeyframe)?;
                for residual in residuals {
                    previous = previous
                        .predict(NOMINAL_FRAME_MS, next_time(&previous)?)
                        .apply(residual);
                    samples.push(previous);
                }
            }
        }
    }

    Ok(samples)
}

#[inline]
fn next_time(previous: &QuantizedSample) -> Result<u32, DecodeError> {
    previous
        .time
        .checked_add(NOMINAL_FRAME_MS)
        .ok_or(DecodeError::TimeOverflow)
}

/// Strict decode: reports why a blob is malformed.
pub fn try_decode_samples(bytes: &[u8]) -> Result<Vec<MotionSample>, DecodeError> {
    let frames = parse_frames(bytes)?;
    let quantized = expand_frames(&frames)?;
    Ok(quantized
        .into_iter()
        .map(QuantizedSample::to_sample)
        .collect())
}

/// Best-effort decode for playback. A malformed blob yields no samples, which
/// callers treat as "no ghost available".
pub fn decode_samples(bytes: &[u8]) -> Vec<MotionSample> {
    try_decode_samples(bytes).unwrap_or_default()
}

/// Wraps an angle into [-pi, pi).
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    (angle + PI).rem_euclid(TAU) - PI
}

/// Interpolates along the shortest arc between two headings.
#[inline]
pub fn lerp_angle(from: f64, to: f64, fraction: f64) -> f64 {
    from + wrap_angle(to - from) * fraction
}

impl GhostState {
    fn from_sample(sample: &MotionSample) -> Self {
        Self {
            x: sample.x,
            z: sample.z,
            heading_y: sample.heading_y,
            speed: sample.vx.hypot(sample.vz),
        }
    }
}

/// Ghost pose at `time_ms`, or `None` once playback has passed the last sample.
///
/// Speed comes from the earlier bracketing sample rather than being
/// interpolated; it only feeds cosmetic display.
pub fn state_at_time(samples: &[MotionSample], time_ms: f64) -> Option<GhostState> {
    if time_ms.is_nan() {
        return None;
    }
    let first = samples.first()?;
    if time_ms <= first.time as f64 {
        return Some(GhostState::from_sample(first));
    }
    let last = samples.last()?;
    if time_ms >= last.time as f64 {
        return None;
    }

    let upper = samples.partition_point(|sample| sample.time as f64 <= time_ms);
    let from = &samples[upper - 1];
    let to = &samples[upper];
    let span = to.time as f64 - from.time as f64;
    let fraction = if span > 0.0 {
        (time_ms - from.time as f64) / span
    } else {
        0.0
    };

    Some(GhostState {
        x: from.x + (to.x - from.x) * fraction,
        z: from.z + (to.z - from.z) * fraction,
        heading_y: lerp_angle(from.heading_y, to.heading_y, fraction),
        speed: from.vx.hypot(from.vz),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_line(count: u32, vx: f64, vz: f64) -> Vec<MotionSample> {
        (0..count)
            .map(|index| {
                let time = index * NOMINAL_FRAME_MS;
                let seconds = time as f64 / 1000.0;
                MotionSample {
                    time,
                    x: vx * seconds,
                    z: vz * seconds,
                    heading_y: vx.atan2(vz),
                    vx,
                    vz,
                }
            })
            .collect()
    }

    fn circle(count: u32) -> Vec<MotionSample> {
        let radius = 30.0;
        let omega = 0.4;
        (0..count)
            .map(|index| {
                let time = index * NOMINAL_FRAME_MS;
                let angle = omega * time as f64 / 1000.0;
                MotionSample {
                    time,
                    x: radius * angle.sin(),
                    z: radius * angle.cos(),
                    heading_y: wrap_angle(angle + std::f64::consts::FRAC_PI_2),
                    vx: radius * omega * angle.cos(),
                    vz: -radius * omega * angle.sin(),
                }
            })
            .collect()
    }

    fn angle_error(a: f64, b: f64) -> f64 {
        wrap_angle(a - b).abs()
    }

    fn sample(time: u32, x: f64, heading_y: f64) -> MotionSample {
        MotionSample {
            time,
            x,
            z: 0.0,
            heading_y,
            vx: 2.0,
            vz: 0.0,
        }
    }

    #[test]
    fn empty_input_encodes_to_empty_blob() {
        assert!(encode_samples(&[]).is_empty());
        assert!(decode_samples(&[]).is_empty());
    }

    #[test]
    fn first_sample_is_a_keyframe() {
        let frames = encode_frames(&straight_line(3, 4.0, 0.0));
        assert!(matches!(frames[0], GhostFrame::Keyframe(_)));
        assert_eq!(frames[1], GhostFrame::Run { count: 2 });
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn straight_line_collapses_into_one_run() {
        let samples = straight_line(1_000, 10.0, 5.0);
        let frames = encode_frames(&samples);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1], GhostFrame::Run { count: 999 });

        let bytes = serialize_frames(&frames);
        assert!(bytes.len() < 50, "encoded {} bytes", bytes.len());
    }

    #[test]
    fn curved_motion_emits_keyframes_on_the_interval() {
        let samples = circle(100); // 5 seconds
        let frames = encode_frames(&samples);
        let keyframe_times: Vec<u32> = frames
            .iter()
            .filter_map(|frame| match frame {
                GhostFrame::Keyframe(key) => Some(key.time),
                _ => None,
            })
            .collect();
        assert_eq!(keyframe_times, vec![0, 1_000, 2_000, 3_000, 4_000]);
    }

    #[test]
    fn every_sample_is_covered_exactly_once() {
        let samples = circle(137);
        let covered: usize = encode_frames(&samples)
            .iter()
            .map(|frame| match frame {
                GhostFrame::Keyframe(_) => 1,
                GhostFrame::Run { count } => *count as usize,
                GhostFrame::DeltaBatch(residuals) => residuals.len(),
            })
            .sum();
        assert_eq!(covered, samples.len());
    }

    #[test]
    fn roundtrip_stays_within_quantization_error() {
        let samples = circle(400);
        let decoded = decode_samples(&encode_samples(&samples));
        assert_eq!(decoded.len(), samples.len());

        for (original, restored) in samples.iter().zip(&decoded) {
            assert_eq!(original.time, restored.time);
            assert!((original.x - restored.x).abs() <= 0.5 / POSITION_SCALE + 1e-9);
            assert!((original.z - restored.z).abs() <= 0.5 / POSITION_SCALE + 1e-9);
            assert!((original.vx - restored.vx).abs() <= 0.5 / VELOCITY_SCALE + 1e-9);
            assert!(angle_error(original.heading_y, restored.heading_y) <= 1.0 / HEADING_SCALE);
        }
    }

    #[test]
    fn decoded_samples_requantize_to_the_encoded_grid() {
        let samples = circle(120);
        let decoded = decode_samples(&encode_samples(&samples));
        for (original, restored) in samples.iter().zip(&decoded) {
            assert_eq!(
                QuantizedSample::from_sample(original),
                QuantizedSample::from_sample(restored)
            );
        }
    }

    #[test]
    fn irregular_cadence_decodes_on_the_nominal_grid() {
        let mut samples = straight_line(4, 10.0, 0.0);
        samples[1].time = 70;
        samples[1].x = 0.7;
        samples[2].time = 120;
        samples[2].x = 1.2;
        samples[3].time = 170;
        samples[3].x = 1.7;

        let decoded = decode_samples(&encode_samples(&samples));
        let times: Vec<u32> = decoded.iter().map(|sample| sample.time).collect();
        assert_eq!(times, vec![0, 50, 100, 150]);
        for (original, restored) in samples.iter().zip(&decoded) {
            assert!((original.x - restored.x).abs() <= 0.5 / POSITION_SCALE + 1e-9);
        }
    }

    #[test]
    fn off_nominal_cadence_keeps_positions_on_the_grid() {
        // 12 units/s around a 30-unit circle, sampled every 70 ms.
        let radius = 30.0;
        let omega = 12.0 / radius;
        let samples: Vec<MotionSample> = (0..14u32)
            .map(|index| {
                let time = index * 70;
                let angle = omega * time as f64 / 1000.0;
                MotionSample {
                    time,
                    x: radius * angle.sin(),
                    z: radius * angle.cos(),
                    heading_y: wrap_angle(angle + std::f64::consts::FRAC_PI_2),
                    vx: radius * omega * angle.cos(),
                    vz: -radius * omega * angle.sin(),
                }
            })
            .collect();

        let decoded = decode_samples(&encode_samples(&samples));
        assert_eq!(decoded.len(), samples.len());
        for (original, restored) in samples.iter().zip(&decoded) {
            assert!(
                (original.x - restored.x).abs() <= 1.0 / POSITION_SCALE,
                "x drifted {} at {} ms",
                (original.x - restored.x).abs(),
                original.time
            );
            assert!((original.z - restored.z).abs() <= 1.0 / POSITION_SCALE);
            assert!(angle_error(original.heading_y, restored.heading_y) <= 1.0 / HEADING_SCALE);
        }
    }

    #[test]
    fn off_nominal_straight_line_does_not_run() {
        // A run would be replayed on the 50 ms grid and land short.
        let samples: Vec<MotionSample> = (0..10u32)
            .map(|index| MotionSample {
                time: index * 100,
                x: index as f64,
                z: 0.0,
                heading_y: std::f64::consts::FRAC_PI_2,
                vx: 10.0,
                vz: 0.0,
            })
            .collect();
        let frames = encode_frames(&samples);
        assert!(!frames
            .iter()
            .any(|frame| matches!(frame, GhostFrame::Run { .. })));

        let decoded = decode_samples(&serialize_frames(&frames));
        for (original, restored) in samples.iter().zip(&decoded) {
            assert!((original.x - restored.x).abs() <= 0.5 / POSITION_SCALE + 1e-9);
        }
    }

    #[test]
    fn heading_crossing_the_seam_roundtrips() {
        let samples = vec![
            sample(0, 0.0, 3.13),
            sample(50, 0.1, -3.13),
            sample(100, 0.2, -3.10),
        ];
        let decoded = decode_samples(&encode_samples(&samples));
        for (original, restored) in samples.iter().zip(&decoded) {
            assert!(angle_error(original.heading_y, restored.heading_y) <= 1e-3);
        }
    }

    #[test]
    fn strict_decode_reports_unknown_tag() {
        assert_eq!(
            try_decode_samples(&[0x7F]),
            Err(DecodeError::UnknownFrameTag { tag: 0x7F, offset: 0 })
        );
    }

    #[test]
    fn strict_decode_requires_leading_keyframe() {
        assert_eq!(
            try_decode_samples(&[FRAME_TAG_RUN, 0x03]),
            Err(DecodeError::MissingKeyframe)
        );
    }

    #[test]
    fn strict_decode_rejects_oversized_runs() {
        let mut bytes = encode_samples(&straight_line(2, 1.0, 0.0));
        bytes.push(FRAME_TAG_RUN);
        write_varint_u32(&mut bytes, u32::MAX);
        assert!(matches!(
            try_decode_samples(&bytes),
            Err(DecodeError::TooManySamples { .. })
        ));
    }

    #[test]
    fn soft_decode_returns_empty_on_truncation() {
        let bytes = encode_samples(&circle(60));
        assert!(!decode_samples(&bytes).is_empty());
        for cut in [1, 3, bytes.len() - 1] {
            let truncated = &bytes[..cut];
            assert!(try_decode_samples(truncated).is_err(), "cut at {cut}");
            assert!(decode_samples(truncated).is_empty());
        }
    }

    #[test]
    fn state_before_start_is_first_sample() {
        let samples = vec![sample(100, 1.0, 0.5), sample(150, 2.0, 0.7)];
        let state = state_at_time(&samples, 20.0).unwrap();
        assert_eq!(state.x, 1.0);
        assert_eq!(state.heading_y, 0.5);
        assert_eq!(state.speed, 2.0);
    }

    #[test]
    fn state_at_or_after_end_is_finished() {
        let samples = vec![sample(0, 1.0, 0.0), sample(50, 2.0, 0.0)];
        assert!(state_at_time(&samples, 50.0).is_none());
        assert!(state_at_time(&samples, 5_000.0).is_none());
        assert!(state_at_time(&[], 0.0).is_none());
    }

    #[test]
    fn state_at_nan_time_is_none() {
        let samples = vec![sample(0, 1.0, 0.0), sample(50, 2.0, 0.0)];
        assert!(state_at_time(&samples, f64::NAN).is_none());
        assert_eq!(
            state_at_time(&samples, f64::NEG_INFINITY).map(|state| state.x),
            Some(1.0)
        );
        assert!(state_at_time(&samples, f64::INFINITY).is_none());
    }

    #[test]
    fn state_on_a_sample_time_returns_that_sample() {
        let samples = vec![
            sample(0, 1.0, 0.0),
            sample(50, 2.0, 0.25),
            sample(100, 3.0, 0.5),
        ];
        let state = state_at_time(&samples, 50.0).unwrap();
        assert_eq!(state.x, 2.0);
        assert_eq!(state.heading_y, 0.25);
    }

    #[test]
    fn state_interpolates_position_linearly() {
        let samples = vec![sample(0, 0.0, 0.0), sample(100, 10.0, 1.0)];
        let state = state_at_time(&samples, 25.0).unwrap();
        assert!((state.x - 2.5).abs() < 1e-12);
        assert!((state.heading_y - 0.25).abs() < 1e-12);
    }

    #[test]
    fn heading_interpolation_takes_the_short_way_across_the_seam() {
        let samples = vec![sample(0, 0.0, 3.0), sample(100, 0.0, -3.0)];
        let state = state_at_time(&samples, 50.0).unwrap();
        assert!(
            state.heading_y.abs() > 3.0,
            "heading {} went the long way",
            state.heading_y
        );
        assert!(angle_error(state.heading_y, std::f64::consts::PI) < 1e-9);
    }
}
