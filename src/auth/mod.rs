use crate::state::AppState;
use axum::Router;

mod dto;
pub(crate) mod extractors;
pub mod handlers;
mod password;
pub mod repo;
mod repo_types;
mod token;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
