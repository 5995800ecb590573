use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use domain::DashboardView;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard/:domain", get(get_dashboard))
}

#[derive(Debug, serde::Deserialize)]
struct DashboardQuery {
    /// Cached views older than this are recomputed before answering.
    max_age_secs: Option<i64>,
    #[serde(default)]
    refresh: bool,
}

async fn get_dashboard(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<DashboardView>, StatusCode> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let view = if params.refresh {
        state.dashboard.refresh(domain).await
    } else {
        let view = state.dashboard.view(domain).await;
        let max_age = params.max_age_secs.unwrap_or(i64::MAX).max(0);
        if (Utc::now() - view.updated_at).num_seconds() > max_age {
            state.dashboard.refresh(domain).await
        } else {
            view
        }
    };

    Ok(Json(view.as_ref().clone()))
}
