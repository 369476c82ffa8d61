mod dto;
pub mod handlers;
mod repo;
mod services;

pub use repo::{ExperienceLevel, InterviewSession, SessionStatus};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
