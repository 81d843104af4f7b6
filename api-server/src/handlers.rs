use actix_web::{
    http::StatusCode,
    web::{Data, Json, Path},
    HttpRequest, HttpResponse, Responder,
};
use ghost_replay_core::sim::{lookup_track, BUILTIN_TRACKS};
use ghost_replay_core::verify_submission;

use crate::auth::{admin_access, AdminAccess};
use crate::config::AppState;
use crate::now_unix_s;
use crate::response::{json_error_with_code, json_verify_error};
use crate::types::{
    HealthResponse, LeaderboardEntry, LeaderboardResponse, ResetResponse, SubmissionRequest,
    SubmitResponse, VerifiedRun,
};

fn store_error(context: &str, err: String) -> HttpResponse {
    tracing::error!("{context}: {err}");
    json_error_with_code(
        StatusCode::INTERNAL_SERVER_ERROR,
        "leaderboard store error",
        Some("internal_error"),
    )
}

/// Returns `(error_message, error_code)` on failure.
pub(crate) fn known_track(track_id: &str) -> Result<(), (String, &'static str)> {
    match lookup_track(track_id) {
        Some(_) => Ok(()),
        None => Err((format!("unknown track: {track_id}"), "unknown_track")),
    }
}

pub(crate) fn entry_from_run(run: VerifiedRun, created_at_unix_s: u64) -> LeaderboardEntry {
    LeaderboardEntry {
        name: run.name,
        time: run.time_ms,
        blob: run.ghost.unwrap_or_default(),
        checksum: run.checksum,
        track_id: run.track_id,
        created_at_unix_s,
    }
}

pub(crate) async fn health(state: Data<AppState>) -> impl Responder {
    let stored_entries = match state.store.count() {
        Ok(count) => count,
        Err(e) => return store_error("health check failed", e),
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        service: "ghost-replay-api",
        tracks: BUILTIN_TRACKS.iter().map(|track| track.id).collect(),
        stored_entries,
        leaderboard_capacity: state.leaderboard_capacity,
        sim_concurrency: state.sim_concurrency,
        sims_in_flight: state
            .sim_concurrency
            .saturating_sub(state.sim_semaphore.available_permits()),
        max_body_bytes: state.max_body_bytes,
        http_workers: state.http_workers,
        admin_enabled: state.admin_api_key.is_some(),
    })
}

pub(crate) async fn submit(
    state: Data<AppState>,
    request: Json<SubmissionRequest>,
) -> impl Responder {
    let request = request.into_inner();

    let _permit = match state.sim_semaphore.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            return json_error_with_code(
                StatusCode::SERVICE_UNAVAILABLE,
                "re-simulation workers are shutting down",
                Some("unavailable"),
            )
        }
    };

    let verified = tokio::task::spawn_blocking(move || {
        let result = verify_submission(&request);
        (request, result)
    })
    .await;

    let run = match verified {
        Ok((_, Ok(run))) => run,
        Ok((request, Err(err))) => {
            tracing::info!(
                name = %request.name,
                track_id = %request.track_id,
                declared_ms = request.time,
                error_code = err.error_code(),
                "submission rejected: {err}"
            );
            return json_verify_error(&err);
        }
        Err(err) => {
            tracing::error!("re-simulation worker failure: {err}");
            return json_error_with_code(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("re-simulation worker failure: {err}"),
                Some("internal_error"),
            );
        }
    };

    tracing::info!(
        name = %run.name,
        track_id = %run.track_id,
        declared_ms = run.time_ms,
        simulated_ms = run.simulated_ms,
        events = run.event_count,
        "submission verified"
    );

    let entry = entry_from_run(run, now_unix_s());
    match state.store.insert_ranked(&entry, state.leaderboard_capacity) {
        Ok(Some(rank)) => HttpResponse::Ok().json(SubmitResponse {
            success: true,
            rank: Some(rank),
            message: None,
        }),
        Ok(None) => HttpResponse::Ok().json(SubmitResponse {
            success: true,
            rank: None,
            message: Some(format!(
                "verified, but {} ms did not place in the top {}",
                entry.time, state.leaderboard_capacity
            )),
        }),
        Err(e) => store_error("leaderboard insert failed", e),
    }
}

pub(crate) async fn leaderboard(state: Data<AppState>, path: Path<String>) -> impl Responder {
    let track_id = path.into_inner();
    if let Err((msg, code)) = known_track(&track_id) {
        return json_error_with_code(StatusCode::NOT_FOUND, msg, Some(code));
    }

    match state.store.top(&track_id, state.leaderboard_capacity) {
        Ok(entries) => HttpResponse::Ok().json(LeaderboardResponse {
            success: true,
            track_id,
            entries,
        }),
        Err(e) => store_error("leaderboard read failed", e),
    }
}

pub(crate) async fn reset_leaderboard(
    state: Data<AppState>,
    req: HttpRequest,
    path: Path<String>,
) -> impl Responder {
    match admin_access(req.headers(), state.admin_api_key.as_deref()) {
        AdminAccess::Granted => {}
        AdminAccess::Denied => {
            return json_error_with_code(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                Some("unauthorized"),
            )
        }
        AdminAccess::Disabled => {
            return json_error_with_code(
                StatusCode::FORBIDDEN,
                "operator routes are disabled (ADMIN_API_KEY is not set)",
                Some("admin_disabled"),
            )
        }
    }

    let track_id = path.into_inner();
    if let Err((msg, code)) = known_track(&track_id) {
        return json_error_with_code(StatusCode::NOT_FOUND, msg, Some(code));
    }

    match state.store.clear_track(&track_id) {
        Ok(removed) => {
            tracing::warn!(track_id = %track_id, removed, "leaderboard reset");
            HttpResponse::Ok().json(ResetResponse {
                success: true,
                track_id,
                removed,
            })
        }
        Err(e) => store_error("leaderboard reset failed", e),
    }
}
