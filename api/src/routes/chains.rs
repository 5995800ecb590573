use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use domain::{ChainDetails, ChainSummary};
use serde::Deserialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chains", get(list_chains))
        .route("/chains/:chain_id/details", get(get_chain_details))
}

async fn list_chains(State(state): State<AppState>) -> Json<Vec<ChainSummary>> {
    Json(state.dashboard.chain_summaries())
}

#[derive(Debug, Deserialize)]
struct DetailsQuery {
    domain: Option<String>,
}

async fn get_chain_details(
    State(state): State<AppState>,
    Path(chain_id): Path<u64>,
    Query(params): Query<DetailsQuery>,
) -> Result<Json<ChainDetails>, StatusCode> {
    let domain = params
        .domain
        .as_deref()
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .ok_or(StatusCode::BAD_REQUEST)?;
    let chain = state
        .dashboard
        .chain(chain_id)
        .ok_or(StatusCode::NOT_FOUND)?;

    let details = state
        .dashboard
        .chain_details(domain, chain)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    Ok(Json(details))
}
