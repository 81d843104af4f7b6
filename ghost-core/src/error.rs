use std::fmt;

/// Byte-level failures shared by the ghost codec and the control-input stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    InvalidBase64,
    Truncated { offset: usize },
    VarintOverflow { offset: usize },
    UnknownFrameTag { tag: u8, offset: usize },
    EmptyFrame { offset: usize },
    MissingKeyframe,
    TooManySamples { limit: usize },
    TimeOverflow,
    UnsupportedStreamVersion { found: u8 },
    TooManyEvents { count: u32, max: usize },
    UnknownActionCode { code: u8, index: usize },
    NonMonotonicEvents { index: usize },
    TrailingBytes { expected: usize, actual: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBase64 => write!(f, "payload is not valid base64"),
            Self::Truncated { offset } => write!(f, "stream truncated at byte {offset}"),
            Self::VarintOverflow { offset } => {
                write!(f, "varint at byte {offset} overflows 32 bits")
            }
            Self::UnknownFrameTag { tag, offset } => {
                write!(f, "unknown frame tag 0x{tag:02x} at byte {offset}")
            }
            Self::EmptyFrame { offset } => write!(f, "zero-length frame at byte {offset}"),
            Self::MissingKeyframe => write!(f, "stream does not start with a keyframe"),
            Self::TooManySamples { limit } => {
                write!(f, "stream expands past {limit} samples")
            }
            Self::TimeOverflow => write!(f, "sample time overflows u32 milliseconds"),
            Self::UnsupportedStreamVersion { found } => {
                write!(f, "unsupported input stream version: {found}")
            }
            Self::TooManyEvents { count, max } => {
                write!(f, "event count out of range: {count} (max {max})")
            }
            Self::UnknownActionCode { code, index } => {
                write!(f, "unknown action code {code} at event {index}")
            }
            Self::NonMonotonicEvents { index } => {
                write!(f, "event {index} is earlier than the event before it")
            }
            Self::TrailingBytes { expected, actual } => write!(
                f,
                "stream length mismatch: expected {expected} bytes, got {actual}"
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Coarse class of a rejected submission. Operators use it to tell tampered
/// payloads apart from runs that simply do not reproduce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidArgument,
    Implausible,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::Implausible => "implausible",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyError {
    InvalidName { reason: &'static str },
    UnknownTrack { track_id: String },
    MalformedInputs(DecodeError),
    InvalidChecksumFormat,
    ChecksumMismatch { declared: u32, computed: u32 },
    InvalidGhost { reason: &'static str },
    GhostChecksumMismatch { declared: u32, computed: u32 },
    ImplausibleGhost { reason: String },
    DidNotFinish { budget_ms: u32 },
    TimeMismatch { declared_ms: u32, simulated_ms: u32 },
}

impl VerifyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DidNotFinish { .. }
            | Self::TimeMismatch { .. }
            | Self::ImplausibleGhost { .. } => ErrorCategory::Implausible,
            _ => ErrorCategory::InvalidArgument,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidName { .. } => "invalid_name",
            Self::UnknownTrack { .. } => "unknown_track",
            Self::MalformedInputs(_) => "malformed_inputs",
            Self::InvalidChecksumFormat => "invalid_checksum",
            Self::ChecksumMismatch { .. } => "checksum_mismatch",
            Self::InvalidGhost { .. } => "invalid_ghost",
            Self::GhostChecksumMismatch { .. } => "ghost_checksum_mismatch",
            Self::ImplausibleGhost { .. } => "implausible_ghost",
            Self::DidNotFinish { .. } => "did_not_finish",
            Self::TimeMismatch { .. } => "time_mismatch",
        }
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName { reason } => write!(f, "invalid name: {reason}"),
            Self::UnknownTrack { track_id } => write!(f, "unknown track: {track_id}"),
            Self::MalformedInputs(err) => write!(f, "malformed input stream: {err}"),
            Self::InvalidChecksumFormat => {
                write!(f, "checksum must be 8 lowercase hex characters")
            }
            Self::ChecksumMismatch { declared, computed } => write!(
                f,
                "checksum mismatch: declared={declared:08x}, computed={computed:08x}"
            ),
            Self::InvalidGhost { reason } => write!(f, "invalid ghost: {reason}"),
            Self::GhostChecksumMismatch { declared, computed } => write!(
                f,
                "ghost checksum mismatch: declared={declared:08x}, computed={computed:08x}"
            ),
            Self::ImplausibleGhost { reason } => write!(f, "implausible ghost: {reason}"),
            Self::DidNotFinish { budget_ms } => {
                write!(f, "run did not reach the finish within {budget_ms} ms")
            }
            Self::TimeMismatch {
                declared_ms,
                simulated_ms,
            } => write!(
                f,
                "time mismatch: declared={declared_ms} ms, simulated={simulated_ms} ms"
            ),
        }
    }
}

impl std::error::Error for VerifyError {}
