mod dto;
pub mod handlers;
mod repo;

pub use repo::{InterviewQuestion, QuestionKind};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
