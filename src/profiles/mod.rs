//! Candidate and recruiter profiles: records, validation and the profile
//! operations of each role.

pub mod candidate;
pub mod dto;
pub mod handlers;
pub mod model;
pub mod recruiter;
pub mod validation;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::candidate_routes())
        .merge(handlers::recruiter_routes())
}
