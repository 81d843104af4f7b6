pub(crate) use ghost_replay_core::submit::{LeaderboardEntry, SubmitResponse};
pub(crate) use ghost_replay_core::verify::{SubmissionRequest, VerifiedRun};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct LeaderboardResponse {
    pub(crate) success: bool,
    pub(crate) track_id: String,
    pub(crate) entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResetResponse {
    pub(crate) success: bool,
    pub(crate) track_id: String,
    pub(crate) removed: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) service: &'static str,
    pub(crate) tracks: Vec<&'static str>,
    pub(crate) stored_entries: usize,
    pub(crate) leaderboard_capacity: usize,
    pub(crate) sim_concurrency: usize,
    pub(crate) sims_in_flight: usize,
    pub(crate) max_body_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) http_workers: Option<usize>,
    pub(crate) admin_enabled: bool,
}
