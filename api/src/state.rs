use std::sync::Arc;

use crate::{config::AppConfig, services::DashboardService};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub dashboard: Arc<DashboardService>,
}

// Axum state must stay cheap to clone and shareable across workers.
#[allow(dead_code)]
fn _assert_state_bounds() {
    fn assert_bounds<T: Clone + Send + Sync + 'static>() {}
    assert_bounds::<AppState>();
}
