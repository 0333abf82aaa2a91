pub mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod merge;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::profile_routes()
}
