use config::Config;
use service::UserService;
use std::time::Instant;

pub mod api;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod router;
pub mod service;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: UserService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, users: UserService) -> Self {
        Self {
            config,
            users,
            started_at: Instant::now(),
        }
    }
}
