//! Client side of a leaderboard submission.
//!
//! The top-N read and the write are separate calls with no transaction
//! between them. The server store owns capacity enforcement; this side
//! only decides whether a submission is worth sending and makes sure a
//! run that cleared the local checks is never dropped because the remote
//! end failed or raced.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::checksum::{checksum_events, checksum_samples, format_checksum};
use crate::cipher::{open_ghost, seal_ghost};
use crate::codec::MotionSample;
use crate::constants::DEFAULT_TRACK_ID;
use crate::error::DecodeError;
use crate::input::{seal_events, ControlEvent};
use crate::validate::{validate_run, ValidationIssue};
use crate::verify::SubmissionRequest;

fn default_track_id() -> String {
    DEFAULT_TRACK_ID.to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    pub time: u32,
    /// Sealed ghost, opaque to the store.
    pub blob: String,
    pub checksum: String,
    #[serde(default = "default_track_id")]
    pub track_id: String,
    #[serde(default)]
    pub created_at_unix_s: u64,
}

impl LeaderboardEntry {
    /// Decoded ghost, empty when the blob is missing or unreadable.
    pub fn ghost_samples(&self) -> Vec<MotionSample> {
        open_ghost(&self.blob)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub trait LeaderboardBackend {
    type Error: fmt::Display;

    fn top_entries(
        &mut self,
        track_id: &str,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, Self::Error>;

    fn submit(&mut self, request: &SubmissionRequest) -> Result<SubmitResponse, Self::Error>;
}

/// Whether `time_ms` would place on a board holding `entries`. Ties with the
/// slowest entry of a full board do not place.
pub fn qualifies(entries: &[LeaderboardEntry], time_ms: u32, capacity: usize) -> bool {
    if capacity == 0 {
        return false;
    }
    if entries.len() < capacity {
        return true;
    }
    entries
        .iter()
        .map(|entry| entry.time)
        .max()
        .is_some_and(|slowest| time_ms < slowest)
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitBlocked {
    Implausible(Vec<ValidationIssue>),
    InvalidInputs(DecodeError),
}

impl fmt::Display for SubmitBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Implausible(issues) => match issues.first() {
                Some(issue) => write!(f, "{issue}"),
                None => write!(f, "run failed validation"),
            },
            Self::InvalidInputs(err) => write!(f, "input timeline cannot be encoded: {err}"),
        }
    }
}

impl std::error::Error for SubmitBlocked {}

/// Everything the client knows about a finished run.
#[derive(Clone, Copy, Debug)]
pub struct FinishedRun<'a> {
    pub name: &'a str,
    pub track_id: &'a str,
    pub finish_time_ms: u32,
    pub samples: &'a [MotionSample],
    pub events: &'a [ControlEvent],
}

/// Runs the plausibility gate and packs the run into a request.
pub fn prepare_submission(run: &FinishedRun<'_>) -> Result<SubmissionRequest, SubmitBlocked> {
    let report = validate_run(run.samples, run.finish_time_ms);
    if !report.valid {
        return Err(SubmitBlocked::Implausible(report.errors));
    }

    let inputs = seal_events(run.events).map_err(SubmitBlocked::InvalidInputs)?;

    Ok(SubmissionRequest {
        name: run.name.to_string(),
        time: run.finish_time_ms,
        inputs,
        checksum: format_checksum(checksum_events(run.events, run.finish_time_ms)),
        track_id: run.track_id.to_string(),
        ghost: Some(seal_ghost(run.samples)),
        ghost_checksum: Some(format_checksum(checksum_samples(
            run.samples,
            run.finish_time_ms,
        ))),
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteStatus {
    Ranked { rank: u32 },
    /// Accepted by the server but pushed off the board, usually by a
    /// concurrent submission.
    Unplaced { message: Option<String> },
    /// The top-N read said this run would not place, so nothing was sent.
    Skipped,
    Rejected { message: String },
    /// Transport or store failure; the request is kept for a retry.
    Failed { error: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub request: SubmissionRequest,
    pub locally_accepted: bool,
    pub remote: RemoteStatus,
}

impl SubmissionOutcome {
    pub fn needs_retry(&self) -> bool {
        matches!(self.remote, RemoteStatus::Failed { .. })
    }
}

/// Sends `request` if it can place. A failed top-N read is treated as
/// "might place" and the write is attempted anyway.
pub fn submit_run<B: LeaderboardBackend>(
    backend: &mut B,
    request: SubmissionRequest,
    capacity: usize,
) -> SubmissionOutcome {
    let placeable = backend
        .top_entries(&request.track_id, capacity)
        .map(|entries| qualifies(&entries, request.time, capacity))
        .unwrap_or(true);
    if !placeable {
        return SubmissionOutcome {
            request,
            locally_accepted: false,
            remote: RemoteStatus::Skipped,
        };
    }

    let remote = match backend.submit(&request) {
        Ok(SubmitResponse {
            success: true,
            rank: Some(rank),
            ..
        }) => RemoteStatus::Ranked { rank },
        Ok(SubmitResponse {
            success: true,
            rank: None,
            message,
        }) => RemoteStatus::Unplaced { message },
        Ok(SubmitResponse { message, .. }) => RemoteStatus::Rejected {
            message: message.unwrap_or_else(|| "submission rejected".to_string()),
        },
        Err(err) => RemoteStatus::Failed {
            error: err.to_string(),
        },
    };

    SubmissionOutcome {
        request,
        locally_accepted: true,
        remote,
    }
}
