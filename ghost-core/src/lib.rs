pub mod checksum;
pub mod cipher;
pub mod codec;
pub mod constants;
pub mod error;
pub mod input;
pub mod sim;
pub mod submit;
pub mod validate;
pub mod varint;
pub mod verify;

pub use checksum::{checksum_events, checksum_samples, format_checksum, parse_checksum};
pub use cipher::{open_ghost, seal_ghost, xor_transform};
pub use codec::{decode_samples, encode_samples, state_at_time, GhostState, MotionSample};
pub use error::{DecodeError, ErrorCategory, VerifyError};
pub use input::{ControlAction, ControlEvent, ControlState};
pub use validate::{validate_run, ValidationIssue, ValidationReport};
pub use verify::{verify_submission, SubmissionRequest, VerifiedRun};
