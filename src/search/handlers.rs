use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        SearchHistoryResponse, SearchResponse, StatisticsResponse, SuggestionsQuery,
        SuggestionsResponse,
    },
    filter::SearchParams,
    service,
};
use crate::{auth::extractors::RequireRecruiter, error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/hr/students", get(search_students))
        .route("/hr/statistics", get(get_statistics))
        .route("/hr/suggestions", get(get_suggestions))
        .route("/hr/search-history", get(get_search_history))
}

#[instrument(skip(state, pairs), fields(recruiter_id = %identity.id))]
pub async fn search_students(
    State(state): State<AppState>,
    RequireRecruiter(identity): RequireRecruiter,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<SearchResponse>, AppError> {
    let params = SearchParams::from_pairs(pairs);
    let out = service::search_candidates(&state, identity, &params).await?;
    let page = out.page;
    Ok(Json(SearchResponse {
        success: true,
        candidates: page.candidates,
        total_candidates: page.total,
        current_page: page.page,
        total_pages: page.total_pages,
        has_next_page: page.has_next_page,
        has_prev_page: page.has_prev_page,
        filters: params,
    }))
}

#[instrument(skip(state), fields(recruiter_id = %identity.id))]
pub async fn get_statistics(
    State(state): State<AppState>,
    RequireRecruiter(identity): RequireRecruiter,
) -> Result<Json<StatisticsResponse>, AppError> {
    let statistics = service::statistics(&state, identity).await?;
    Ok(Json(StatisticsResponse {
        success: true,
        statistics,
    }))
}

#[instrument(skip(state), fields(recruiter_id = %identity.id))]
pub async fn get_suggestions(
    State(state): State<AppState>,
    RequireRecruiter(identity): RequireRecruiter,
    Query(q): Query<SuggestionsQuery>,
) -> Result<Json<SuggestionsResponse>, AppError> {
    let suggestions = service::suggestions(&state, identity, q.kind.as_deref()).await?;
    Ok(Json(SuggestionsResponse {
        success: true,
        suggestions,
    }))
}

#[instrument(skip(state), fields(recruiter_id = %identity.id))]
pub async fn get_search_history(
    State(state): State<AppState>,
    RequireRecruiter(identity): RequireRecruiter,
) -> Result<Json<SearchHistoryResponse>, AppError> {
    let search_history = service::search_history(&state, identity).await?;
    Ok(Json(SearchHistoryResponse {
        success: true,
        search_history,
    }))
}
