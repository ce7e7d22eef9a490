use std::sync::Arc;

use crate::config::AppConfig;
use crate::source::StatsService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: Arc<StatsService>,
}

impl AppState {
    pub fn new(config: AppConfig, service: StatsService) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
        }
    }
}
