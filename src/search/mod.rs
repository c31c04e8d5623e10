//! Candidate search: filter compilation, execution, statistics, suggestions
//! and the per-recruiter search history.

pub mod dto;
pub mod executor;
pub mod filter;
pub mod handlers;
pub mod history;
pub mod predicate;
pub mod service;
pub mod stats;
pub mod suggestions;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
