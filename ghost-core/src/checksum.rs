use crate::codec::{quantize, MotionSample};
use crate::constants::POSITION_SCALE;
use crate::input::ControlEvent;

/// Order-sensitive multiply-add hash over 32-bit words.
#[derive(Clone, Copy, Debug)]
pub struct RollingHash {
    state: u32,
}

impl RollingHash {
    const SEED: u32 = 17;
    const MULTIPLIER: u32 = 31;

    pub fn new() -> Self {
        Self { state: Self::SEED }
    }

    #[inline]
    pub fn push_u32(&mut self, value: u32) {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(value);
    }

    #[inline]
    pub fn push_i32(&mut self, value: i32) {
        self.push_u32(value as u32);
    }

    pub fn finish(self) -> u32 {
        self.state
    }
}

impl Default for RollingHash {
    fn default() -> Self {
        Self::new()
    }
}

/// Folds quantized positions, then the final time, then the sample count.
pub fn checksum_samples(samples: &[MotionSample], final_time_ms: u32) -> u32 {
    let mut hash = RollingHash::new();
    for sample in samples {
        hash.push_i32(quantize(sample.x, POSITION_SCALE));
        hash.push_i32(quantize(sample.z, POSITION_SCALE));
    }
    hash.push_u32(final_time_ms);
    hash.push_u32(samples.len() as u32);
    hash.finish()
}

/// Binds a control-input timeline to its declared finish time.
pub fn checksum_events(events: &[ControlEvent], final_time_ms: u32) -> u32 {
    let mut hash = RollingHash::new();
    for event in events {
        hash.push_u32(event.time_offset_ms);
        hash.push_u32(event.action.code() as u32);
    }
    hash.push_u32(final_time_ms);
    hash.push_u32(events.len() as u32);
    hash.finish()
}

pub fn format_checksum(checksum: u32) -> String {
    format!("{checksum:08x}")
}

/// Accepts exactly eight lowercase hex digits.
pub fn parse_checksum(text: &str) -> Option<u32> {
    if text.len() != 8
        || !text
            .bytes()
            .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte))
    {
        return None;
    }
    u32::from_str_radix(text, 16).ok()
}
