use std::sync::Arc;

use crate::services::dashboard_controller::DashboardController;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<DashboardController>,
}
