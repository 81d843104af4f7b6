use serde::{Deserialize, Serialize};

use crate::checksum::{checksum_events, checksum_samples, format_checksum, parse_checksum};
use crate::cipher::open_ghost;
use crate::constants::{DEFAULT_TRACK_ID, MAX_NAME_CHARS};
use crate::error::VerifyError;
use crate::input::{open_events, ControlEvent};
use crate::sim::{lookup_track, resimulate, within_tolerance, SimRejection, SimReport, Track};
use crate::validate::motion_issues;

fn default_track_id() -> String {
    DEFAULT_TRACK_ID.to_string()
}

/// Body of a leaderboard submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub name: String,
    /// Declared finish time in milliseconds.
    pub time: u32,
    /// Sealed control-input stream.
    pub inputs: String,
    pub checksum: String,
    #[serde(default = "default_track_id")]
    pub track_id: String,
    /// Sealed ghost to store alongside the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ghost: Option<String>,
    /// Sample checksum of `ghost` over the declared time; required with a ghost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ghost_checksum: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedRun {
    pub name: String,
    pub track_id: String,
    pub time_ms: u32,
    pub checksum: String,
    pub event_count: u32,
    pub simulated_ms: u32,
    pub ghost: Option<String>,
}

impl From<SimRejection> for VerifyError {
    fn from(rejection: SimRejection) -> Self {
        match rejection {
            SimRejection::DidNotFinish { budget_ms } => Self::DidNotFinish { budget_ms },
            SimRejection::TimeMismatch {
                declared_ms,
                simulated_ms,
            } => Self::TimeMismatch {
                declared_ms,
                simulated_ms,
            },
        }
    }
}

/// Trimmed display name, or the reason it is unusable.
pub fn normalize_name(name: &str) -> Result<String, VerifyError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(VerifyError::InvalidName {
            reason: "name is empty",
        });
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(VerifyError::InvalidName {
            reason: "name is longer than 20 characters",
        });
    }
    if name.chars().any(char::is_control) {
        return Err(VerifyError::InvalidName {
            reason: "name contains control characters",
        });
    }
    Ok(name.to_string())
}

/// Ties a submitted ghost to the declared run: it must decode, match its
/// sample checksum, move plausibly and end near the declared finish time.
fn check_ghost(
    ghost: &str,
    ghost_checksum: Option<&str>,
    declared_ms: u32,
) -> Result<(), VerifyError> {
    let samples = open_ghost(ghost);
    let Some(last) = samples.last() else {
        return Err(VerifyError::InvalidGhost {
            reason: "payload does not decode",
        });
    };

    let declared = ghost_checksum
        .ok_or(VerifyError::InvalidGhost {
            reason: "ghost checksum is missing",
        })
        .and_then(|text| {
            parse_checksum(text).ok_or(VerifyError::InvalidGhost {
                reason: "ghost checksum must be 8 lowercase hex characters",
            })
        })?;
    let computed = checksum_samples(&samples, declared_ms);
    if declared != computed {
        return Err(VerifyError::GhostChecksumMismatch { declared, computed });
    }

    if let Some(issue) = motion_issues(&samples).into_iter().next() {
        return Err(VerifyError::ImplausibleGhost {
            reason: issue.to_string(),
        });
    }

    if !within_tolerance(declared_ms, last.time) {
        return Err(VerifyError::ImplausibleGhost {
            reason: format!(
                "ghost ends at {} ms, declared finish is {declared_ms} ms",
                last.time
            ),
        });
    }
    Ok(())
}

pub fn verify_submission(request: &SubmissionRequest) -> Result<VerifiedRun, VerifyError> {
    verify_submission_with(request, resimulate)
}

fn verify_submission_with<F>(
    request: &SubmissionRequest,
    resim_fn: F,
) -> Result<VerifiedRun, VerifyError>
where
    F: FnOnce(&Track, &[ControlEvent], u32) -> Result<SimReport, SimRejection>,
{
    let name = normalize_name(&request.name)?;

    let track = lookup_track(&request.track_id).ok_or_else(|| VerifyError::UnknownTrack {
        track_id: request.track_id.clone(),
    })?;

    let events = open_events(&request.inputs).map_err(VerifyError::MalformedInputs)?;

    let declared = parse_checksum(&request.checksum).ok_or(VerifyError::InvalidChecksumFormat)?;
    let computed = checksum_events(&events, request.time);
    if declared != computed {
        return Err(VerifyError::ChecksumMismatch { declared, computed });
    }

    if let Some(ghost) = &request.ghost {
        check_ghost(ghost, request.ghost_checksum.as_deref(), request.time)?;
    }

    let report = resim_fn(track, &events, request.time)?;

    Ok(VerifiedRun {
        name,
        track_id: track.id.to_string(),
        time_ms: request.time,
        checksum: format_checksum(computed),
        event_count: events.len() as u32,
        simulated_ms: report.simulated_ms,
        ghost: request.ghost.clone(),
    })
}
