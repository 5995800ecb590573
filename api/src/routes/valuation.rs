use axum::{extract::State, routing::post, Json, Router};
use domain::{Balance, PriceFeedResult, ValuationResult};
use serde::Deserialize;
use valuation::compute_valuation;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/valuation", post(value_balances))
        .route("/valuation/compute", post(compute_from_results))
}

#[derive(Debug, Deserialize)]
struct ValuationRequest {
    #[serde(default)]
    balances: Vec<Balance>,
}

async fn value_balances(
    State(state): State<AppState>,
    Json(payload): Json<ValuationRequest>,
) -> Json<ValuationResult> {
    let result = state.dashboard.value_balances(&payload.balances).await;
    tracing::info!(
        assets = payload.balances.len(),
        total_usd = %result.total_formatted_in_usd,
        "balances valued"
    );
    Json(result)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComputeRequest {
    #[serde(default)]
    balances: Vec<Balance>,
    #[serde(default)]
    price_results: Vec<PriceFeedResult>,
}

/// Pure valuation over caller-supplied feed results; nothing is fetched.
async fn compute_from_results(Json(payload): Json<ComputeRequest>) -> Json<ValuationResult> {
    Json(compute_valuation(&payload.balances, &payload.price_results))
}
