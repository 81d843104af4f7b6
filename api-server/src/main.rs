mod auth;
mod config;
mod handlers;
mod response;
mod store;
mod types;

use std::time::{SystemTime, UNIX_EPOCH};

use actix_cors::Cors;
use actix_web::{error::InternalError, http::StatusCode, middleware, web, App, HttpServer};

use config::AppState;
use handlers::{health, leaderboard, reset_leaderboard, submit};
use response::json_error_with_code;
use store::LeaderboardStore;

pub(crate) fn now_unix_s() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let response = json_error_with_code(
                StatusCode::BAD_REQUEST,
                format!("invalid submission body: {err}"),
                Some("invalid_json"),
            );
            InternalError::from_response(err, response).into()
        })
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/api/submit", web::post().to(submit))
        .route("/api/leaderboard/{track_id}", web::get().to(leaderboard))
        .route(
            "/api/leaderboard/{track_id}",
            web::delete().to(reset_leaderboard),
        );
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let bind_addr = config::bind_addr();
    let data_dir = config::data_dir();
    let store = LeaderboardStore::open(&data_dir).map_err(std::io::Error::other)?;
    let state = AppState::from_env(store);

    tracing::info!(
        "starting ghost replay api: bind_addr={} data_dir={} sim_concurrency={} leaderboard_capacity={} max_body_bytes={} admin_enabled={}",
        bind_addr,
        data_dir.display(),
        state.sim_concurrency,
        state.leaderboard_capacity,
        state.max_body_bytes,
        state.admin_api_key.is_some()
    );

    let http_workers = state.http_workers;
    let max_body_bytes = state.max_body_bytes;
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .expose_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config(max_body_bytes))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes)
    });

    let server = match http_workers {
        Some(workers) => server.workers(workers),
        None => server,
    };

    server.bind(bind_addr)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::{test as awtest, App};
    use ghost_replay_core::checksum::{checksum_events, format_checksum};
    use ghost_replay_core::constants::{DEFAULT_TRACK_ID, MAX_SIM_TIME_MS};
    use ghost_replay_core::input::{seal_events, ControlAction, ControlEvent};
    use ghost_replay_core::sim::{lookup_track, simulate};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tokio::sync::Semaphore;

    fn test_state(admin_api_key: Option<&str>) -> (AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = LeaderboardStore::open(dir.path()).unwrap();
        let state = AppState {
            store: Arc::new(store),
            sim_semaphore: Arc::new(Semaphore::new(2)),
            sim_concurrency: 2,
            max_body_bytes: config::DEFAULT_MAX_BODY_BYTES,
            leaderboard_capacity: 10,
            admin_api_key: admin_api_key.map(str::to_string),
            http_workers: None,
        };
        (state, dir)
    }

    /// Full throttle with the wheel held right: a tight circle back
    /// through the start.
    fn circle_events() -> Vec<ControlEvent> {
        vec![
            ControlEvent::new(0, ControlAction::ForwardDown),
            ControlEvent::new(0, ControlAction::RightDown),
        ]
    }

    fn circle_finish_ms() -> u32 {
        let track = lookup_track(DEFAULT_TRACK_ID).unwrap();
        simulate(track, &circle_events(), MAX_SIM_TIME_MS)
            .finish_time_ms()
            .expect("circle lap must finish")
    }

    fn submission(name: &str, time: u32) -> Value {
        let events = circle_events();
        json!({
            "name": name,
            "time": time,
            "inputs": seal_events(&events).unwrap(),
            "checksum": format_checksum(checksum_events(&events, time)),
            "trackId": DEFAULT_TRACK_ID,
        })
    }

    macro_rules! app {
        ($state:expr) => {
            awtest::init_service(
                App::new()
                    .app_data(web::Data::new($state.clone()))
                    .app_data(json_config($state.max_body_bytes))
                    .configure(routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn honest_submission_is_ranked() {
        let (state, _dir) = test_state(None);
        let app = app!(state);

        let req = awtest::TestRequest::post()
            .uri("/api/submit")
            .set_json(submission("Ada", circle_finish_ms()))
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["success"], Value::Bool(true));
        assert_eq!(body["rank"], json!(1));
        assert!(body.get("message").is_none());
        assert_eq!(state.store.count().unwrap(), 1);
    }

    #[actix_web::test]
    async fn tampered_checksum_is_invalid_argument() {
        let (state, _dir) = test_state(None);
        let app = app!(state);

        let mut body = submission("Ada", circle_finish_ms());
        body["time"] = json!(circle_finish_ms() - 1_000);
        let req = awtest::TestRequest::post()
            .uri("/api/submit")
            .set_json(body)
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["success"], Value::Bool(false));
        assert_eq!(body["error_code"], "checksum_mismatch");
        assert_eq!(body["category"], "invalid_argument");
        assert_eq!(state.store.count().unwrap(), 0);
    }

    #[actix_web::test]
    async fn inflated_time_is_implausible() {
        let (state, _dir) = test_state(None);
        let app = app!(state);

        let req = awtest::TestRequest::post()
            .uri("/api/submit")
            .set_json(submission("Ada", circle_finish_ms() * 2))
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["error_code"], "time_mismatch");
        assert_eq!(body["category"], "implausible");
    }

    #[actix_web::test]
    async fn malformed_json_is_rejected() {
        let (state, _dir) = test_state(None);
        let app = app!(state);

        let req = awtest::TestRequest::post()
            .uri("/api/submit")
            .set_json(json!({ "name": "Ada" }))
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["error_code"], "invalid_json");
    }

    #[actix_web::test]
    async fn leaderboard_lists_entries_fastest_first() {
        let (state, _dir) = test_state(None);
        let app = app!(state);
        let finish = circle_finish_ms();

        // Both claims sit inside the tolerance band of the same lap.
        for (name, time) in [("Slow", finish + finish / 20), ("Fast", finish)] {
            let req = awtest::TestRequest::post()
                .uri("/api/submit")
                .set_json(submission(name, time))
                .to_request();
            let resp = awtest::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = awtest::TestRequest::get()
            .uri("/api/leaderboard/default")
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = awtest::read_body_json(resp).await;
        let entries = body["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["name"], "Fast");
        assert_eq!(entries[0]["time"], json!(finish));
        assert_eq!(entries[1]["name"], "Slow");
        assert_eq!(entries[0]["trackId"], "default");
    }

    #[actix_web::test]
    async fn unknown_track_leaderboard_is_not_found() {
        let (state, _dir) = test_state(None);
        let app = app!(state);

        let req = awtest::TestRequest::get()
            .uri("/api/leaderboard/moon")
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["error_code"], "unknown_track");
    }

    #[actix_web::test]
    async fn reset_requires_admin_key() {
        let (state, _dir) = test_state(Some("s3cret"));
        let app = app!(state);

        let req = awtest::TestRequest::post()
            .uri("/api/submit")
            .set_json(submission("Ada", circle_finish_ms()))
            .to_request();
        awtest::call_service(&app, req).await;

        let req = awtest::TestRequest::delete()
            .uri("/api/leaderboard/default")
            .insert_header(("x-api-key", "wrong"))
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(state.store.count().unwrap(), 1);

        let req = awtest::TestRequest::delete()
            .uri("/api/leaderboard/default")
            .insert_header(("authorization", "Bearer s3cret"))
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["removed"], json!(1));
        assert_eq!(state.store.count().unwrap(), 0);
    }

    #[actix_web::test]
    async fn reset_is_forbidden_without_configured_key() {
        let (state, _dir) = test_state(None);
        let app = app!(state);

        let req = awtest::TestRequest::delete()
            .uri("/api/leaderboard/default")
            .insert_header(("x-api-key", "anything"))
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn health_reports_tracks_and_limits() {
        let (state, _dir) = test_state(None);
        let app = app!(state);

        let req = awtest::TestRequest::get().uri("/health").to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["tracks"], json!(["default", "canyon-loop"]));
        assert_eq!(body["leaderboard_capacity"], json!(10));
        assert_eq!(body["sims_in_flight"], json!(0));
        assert_eq!(body["admin_enabled"], Value::Bool(false));
    }
}
