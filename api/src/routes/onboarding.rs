use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
use domain::{find_step, next_step, onboarding_steps, OnboardingStep};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/onboarding/steps", get(list_steps))
        .route("/onboarding/steps/:step_id", get(get_step))
}

async fn list_steps() -> Json<&'static [OnboardingStep]> {
    Json(onboarding_steps())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StepResponse {
    step: &'static OnboardingStep,
    next_step_id: Option<&'static str>,
}

async fn get_step(Path(step_id): Path<String>) -> Result<Json<StepResponse>, StatusCode> {
    let step = find_step(&step_id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(StepResponse {
        step,
        next_step_id: next_step(&step_id).map(|next| next.id),
    }))
}
