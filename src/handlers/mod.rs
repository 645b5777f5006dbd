pub mod common;
pub mod dashboard;
pub mod documents;
pub mod health;
pub mod inventory;
pub mod reference;

use std::sync::Arc;

use crate::{
    auth::BranchAccessPolicy,
    commands::documents::DocumentDefaults,
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        dashboard::DashboardService, documents::DocumentService, inventory::InventoryService,
        reference::ReferenceDataService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer used by the HTTP handlers. Every service shares one
/// branch access policy built from configuration.
#[derive(Clone)]
pub struct AppServices {
    pub documents: Arc<DocumentService>,
    pub inventory: Arc<InventoryService>,
    pub reference: Arc<ReferenceDataService>,
    pub dashboard: Arc<DashboardService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let policy = BranchAccessPolicy::new(config.head_office_prefix.clone());
        let defaults = DocumentDefaults {
            currency: config.default_currency.clone(),
            tax_rate: config.tax_rate(),
        };

        let documents = Arc::new(DocumentService::new(
            db_pool.clone(),
            event_sender.clone(),
            policy.clone(),
            defaults,
        ));
        let inventory = Arc::new(InventoryService::new(
            db_pool.clone(),
            event_sender.clone(),
            policy.clone(),
        ));
        let reference = Arc::new(ReferenceDataService::new(
            db_pool.clone(),
            event_sender,
            policy.clone(),
        ));
        let dashboard = Arc::new(DashboardService::new(db_pool, policy));

        Self {
            documents,
            inventory,
            reference,
            dashboard,
        }
    }
}
