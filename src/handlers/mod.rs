pub mod common;
pub mod print_orders;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    repositories::PrintOrderRepository,
    services::print_orders::{LifecycleSettings, PrintOrderService},
    storage::FileStore,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub print_orders: Arc<PrintOrderService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, files: Arc<dyn FileStore>, config: &AppConfig) -> Self {
        let repository = Arc::new(
            PrintOrderRepository::new(db_pool, files.clone())
                .with_transition_guard(config.enforce_status_transitions),
        );
        let print_orders = Arc::new(PrintOrderService::new(
            repository,
            files,
            LifecycleSettings::from(config),
        ));

        Self { print_orders }
    }
}
