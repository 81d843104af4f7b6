use std::{env, path::PathBuf, sync::Arc};

use ghost_replay_core::constants::LEADERBOARD_CAPACITY;
use tokio::sync::Semaphore;

use crate::store::LeaderboardStore;

pub(crate) const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub(crate) const DEFAULT_DATA_DIR: &str = "./data";
// A long lap is a few thousand input events; ghosts stay well under this.
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 512 * 1024;
pub(crate) const DEFAULT_SIM_CONCURRENCY: usize = 4;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<LeaderboardStore>,
    pub(crate) sim_semaphore: Arc<Semaphore>,
    pub(crate) sim_concurrency: usize,
    pub(crate) max_body_bytes: usize,
    pub(crate) leaderboard_capacity: usize,
    pub(crate) admin_api_key: Option<String>,
    pub(crate) http_workers: Option<usize>,
}

impl AppState {
    pub(crate) fn from_env(store: LeaderboardStore) -> Self {
        let sim_concurrency = read_env_usize("SIM_CONCURRENCY", DEFAULT_SIM_CONCURRENCY);
        Self {
            store: Arc::new(store),
            sim_semaphore: Arc::new(Semaphore::new(sim_concurrency)),
            sim_concurrency,
            max_body_bytes: read_env_usize("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
            leaderboard_capacity: read_env_usize("LEADERBOARD_CAPACITY", LEADERBOARD_CAPACITY),
            admin_api_key: read_env_optional_string("ADMIN_API_KEY"),
            http_workers: read_env_optional_usize("HTTP_WORKERS"),
        }
    }
}

pub(crate) fn bind_addr() -> String {
    env::var("API_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
}

pub(crate) fn data_dir() -> PathBuf {
    PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()))
}

pub(crate) fn read_env_usize(name: &str, default: usize) -> usize {
    read_env_optional_usize(name).unwrap_or(default)
}

pub(crate) fn read_env_optional_usize(name: &str) -> Option<usize> {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
}

pub(crate) fn read_env_optional_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
