//! Control-input event stream.
//!
//! Layout after unsealing: `version:u8`, `count:varint`, then per event
//! `delta_ms:varint` (from the previous event) and `action:u8`. The stream
//! is obfuscated and base64 transported exactly like a ghost blob.

use serde::{Deserialize, Serialize};

use crate::cipher::{seal, unseal};
use crate::constants::{INPUT_STREAM_VERSION, MAX_INPUT_EVENTS};
use crate::error::DecodeError;
use crate::varint::{write_varint_u32, ByteReader};

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    ForwardDown = 0,
    ForwardUp = 1,
    BackwardDown = 2,
    BackwardUp = 3,
    LeftDown = 4,
    LeftUp = 5,
    RightDown = 6,
    RightUp = 7,
    HandbrakeDown = 8,
    HandbrakeUp = 9,
}

impl ControlAction {
    pub const ALL: [ControlAction; 10] = [
        Self::ForwardDown,
        Self::ForwardUp,
        Self::BackwardDown,
        Self::BackwardUp,
        Self::LeftDown,
        Self::LeftUp,
        Self::RightDown,
        Self::RightUp,
        Self::HandbrakeDown,
        Self::HandbrakeUp,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlEvent {
    pub time_offset_ms: u32,
    pub action: ControlAction,
}

impl ControlEvent {
    pub fn new(time_offset_ms: u32, action: ControlAction) -> Self {
        Self {
            time_offset_ms,
            action,
        }
    }
}

/// Held control flags. Each flag keeps its last-set value until the next
/// transition for that flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub handbrake: bool,
}

impl ControlState {
    pub fn apply(&mut self, action: ControlAction) {
        use ControlAction::*;
        match action {
            ForwardDown => self.forward = true,
            ForwardUp => self.forward = false,
            BackwardDown => self.backward = true,
            BackwardUp => self.backward = false,
            LeftDown => self.left = true,
            LeftUp => self.left = false,
            RightDown => self.right = true,
            RightUp => self.right = false,
            HandbrakeDown => self.handbrake = true,
            HandbrakeUp => self.handbrake = false,
        }
    }

    /// Throttle axis in `[-1, 1]`.
    pub fn throttle(&self) -> f64 {
        (self.forward as i8 - self.backward as i8) as f64
    }

    /// Steering axis in `[-1, 1]`, positive to the left.
    pub fn steer(&self) -> f64 {
        (self.left as i8 - self.right as i8) as f64
    }

    fn transitions_to(&self, next: &ControlState) -> impl Iterator<Item = ControlAction> {
        use ControlAction::*;
        let flags = [
            (self.forward, next.forward, ForwardDown, ForwardUp),
            (self.backward, next.backward, BackwardDown, BackwardUp),
            (self.left, next.left, LeftDown, LeftUp),
            (self.right, next.right, RightDown, RightUp),
            (self.handbrake, next.handbrake, HandbrakeDown, HandbrakeUp),
        ];
        flags
            .into_iter()
            .filter(|(was, now, _, _)| was != now)
            .map(|(_, now, down, up)| if now { down } else { up })
    }
}

pub fn encode_events(events: &[ControlEvent]) -> Result<Vec<u8>, DecodeError> {
    if events.len() > MAX_INPUT_EVENTS {
        return Err(DecodeError::TooManyEvents {
            count: events.len() as u32,
            max: MAX_INPUT_EVENTS,
        });
    }

    let mut out = Vec::with_capacity(2 + events.len() * 2);
    out.push(INPUT_STREAM_VERSION);
    write_varint_u32(&mut out, events.len() as u32);

    let mut previous = 0u32;
    for (index, event) in events.iter().enumerate() {
        let delta = event
            .time_offset_ms
            .checked_sub(previous)
            .ok_or(DecodeError::NonMonotonicEvents { index })?;
        write_varint_u32(&mut out, delta);
        out.push(event.action.code());
        previous = event.time_offset_ms;
    }

    Ok(out)
}

pub fn decode_events(bytes: &[u8]) -> Result<Vec<ControlEvent>, DecodeError> {
    let mut reader = ByteReader::new(bytes);

    let version = reader.read_u8()?;
    if version != INPUT_STREAM_VERSION {
        return Err(DecodeError::UnsupportedStreamVersion { found: version });
    }

    let count = reader.read_varint_u32()?;
    if count as usize > MAX_INPUT_EVENTS {
        return Err(DecodeError::TooManyEvents {
            count,
            max: MAX_INPUT_EVENTS,
        });
    }
    // Every event needs at least two bytes.
    if reader.remaining() < count as usize * 2 {
        return Err(DecodeError::Truncated {
            offset: bytes.len(),
        });
    }

    let mut events = Vec::with_capacity(count as usize);
    let mut time_offset_ms = 0u32;
    for index in 0..count as usize {
        let delta = reader.read_varint_u32()?;
        time_offset_ms = time_offset_ms
            .checked_add(delta)
            .ok_or(DecodeError::TimeOverflow)?;

        let code = reader.read_u8()?;
        let action =
            ControlAction::from_code(code).ok_or(DecodeError::UnknownActionCode { code, index })?;
        events.push(ControlEvent::new(time_offset_ms, action));
    }

    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            expected: reader.position(),
            actual: bytes.len(),
        });
    }

    Ok(events)
}

pub fn seal_events(events: &[ControlEvent]) -> Result<String, DecodeError> {
    encode_events(events).map(|bytes| seal(&bytes))
}

pub fn open_events(text: &str) -> Result<Vec<ControlEvent>, DecodeError> {
    decode_events(&unseal(text)?)
}

/// Turns per-frame held-key snapshots into transition events.
#[derive(Clone, Debug, Default)]
pub struct InputRecorder {
    state: ControlState,
    events: Vec<ControlEvent>,
}

impl InputRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, time_offset_ms: u32, held: &ControlState) {
        let start = self
            .events
            .last()
            .map_or(0, |event| event.time_offset_ms);
        let time_offset_ms = time_offset_ms.max(start);
        for action in self.state.transitions_to(held) {
            self.events.push(ControlEvent::new(time_offset_ms, action));
        }
        self.state = *held;
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn events(&self) -> &[ControlEvent] {
        &self.events
    }

    pub fn finish(self) -> Vec<ControlEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::ControlAction::*;

    fn timeline() -> Vec<ControlEvent> {
        vec![
            ControlEvent::new(0, ForwardDown),
            ControlEvent::new(0, RightDown),
            ControlEvent::new(1_250, RightUp),
            ControlEvent::new(4_000, HandbrakeDown),
            ControlEvent::new(4_400, HandbrakeUp),
            ControlEvent::new(200_000, ForwardUp),
        ]
    }

    #[test]
    fn action_codes_are_stable() {
        for (code, action) in ControlAction::ALL.iter().enumerate() {
            assert_eq!(action.code() as usize, code);
            assert_eq!(ControlAction::from_code(code as u8), Some(*action));
        }
        assert_eq!(ControlAction::from_code(10), None);
        assert_eq!(ControlAction::from_code(0xFF), None);
    }

    #[test]
    fn stream_layout_is_version_count_then_pairs() {
        let bytes = encode_events(&[
            ControlEvent::new(0, ForwardDown),
            ControlEvent::new(300, LeftDown),
        ])
        .unwrap();
        assert_eq!(bytes, vec![1, 2, 0, 0, 0xAC, 0x02, 4]);
    }

    #[test]
    fn events_roundtrip() {
        let events = timeline();
        let bytes = encode_events(&events).unwrap();
        assert_eq!(decode_events(&bytes).unwrap(), events);
        assert_eq!(open_events(&seal_events(&events).unwrap()).unwrap(), events);
    }

    #[test]
    fn empty_timeline_is_valid() {
        let bytes = encode_events(&[]).unwrap();
        assert_eq!(bytes, vec![INPUT_STREAM_VERSION, 0]);
        assert!(decode_events(&bytes).unwrap().is_empty());
    }

    #[test]
    fn encoder_rejects_time_going_backwards() {
        let events = [
            ControlEvent::new(500, ForwardDown),
            ControlEvent::new(499, ForwardUp),
        ];
        assert_eq!(
            encode_events(&events),
            Err(DecodeError::NonMonotonicEvents { index: 1 })
        );
    }

    #[test]
    fn decoder_rejects_unknown_version() {
        assert_eq!(
            decode_events(&[2, 0]),
            Err(DecodeError::UnsupportedStreamVersion { found: 2 })
        );
        assert_eq!(decode_events(&[]), Err(DecodeError::Truncated { offset: 0 }));
    }

    #[test]
    fn decoder_rejects_unknown_action() {
        assert_eq!(
            decode_events(&[1, 2, 0, 0, 5, 42]),
            Err(DecodeError::UnknownActionCode { code: 42, index: 1 })
        );
    }

    #[test]
    fn decoder_rejects_truncation_and_trailing_bytes() {
        let bytes = encode_events(&timeline()).unwrap();
        for cut in 1..bytes.len() {
            assert!(decode_events(&bytes[..cut]).is_err(), "cut at {cut}");
        }

        let mut padded = bytes.clone();
        padded.push(0);
        assert_eq!(
            decode_events(&padded),
            Err(DecodeError::TrailingBytes {
                expected: bytes.len(),
                actual: padded.len(),
            })
        );
    }

    #[test]
    fn decoder_rejects_oversized_count() {
        let mut bytes = vec![INPUT_STREAM_VERSION];
        write_varint_u32(&mut bytes, MAX_INPUT_EVENTS as u32 + 1);
        assert!(matches!(
            decode_events(&bytes),
            Err(DecodeError::TooManyEvents { .. })
        ));
    }

    #[test]
    fn state_holds_flags_until_released() {
        let mut state = ControlState::default();
        state.apply(ForwardDown);
        state.apply(LeftDown);
        assert_eq!(state.throttle(), 1.0);
        assert_eq!(state.steer(), 1.0);
        state.apply(RightDown);
        assert_eq!(state.steer(), 0.0);
        state.apply(LeftUp);
        assert_eq!(state.steer(), -1.0);
        state.apply(BackwardDown);
        assert_eq!(state.throttle(), 0.0);
    }

    #[test]
    fn recorder_emits_only_transitions() {
        let mut recorder = InputRecorder::new();
        let idle = ControlState::default();
        let gas = ControlState {
            forward: true,
            ..idle
        };
        let gas_left = ControlState { left: true, ..gas };

        recorder.record(0, &idle);
        recorder.record(16, &gas);
        recorder.record(33, &gas);
        recorder.record(50, &gas_left);
        recorder.record(66, &idle);

        assert_eq!(
            recorder.finish(),
            vec![
                ControlEvent::new(16, ForwardDown),
                ControlEvent::new(50, LeftDown),
                ControlEvent::new(66, ForwardUp),
                ControlEvent::new(66, LeftUp),
            ]
        );
    }

    #[test]
    fn recorder_clamps_late_timestamps() {
        let mut recorder = InputRecorder::new();
        let gas = ControlState {
            forward: true,
            ..ControlState::default()
        };
        recorder.record(100, &gas);
        recorder.record(90, &ControlState::default());
        let events = recorder.finish();
        assert_eq!(events[1].time_offset_ms, 100);
        assert!(encode_events(&events).is_ok());
    }
}
