use std::sync::Arc;

use crate::db::Database;
use crate::micro_deposit::{MicroDepositStore, VerificationWorkflow};

/// Shared state for both listeners
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<VerificationWorkflow>,
    /// Admin listing reads through the store directly
    pub store: MicroDepositStore,
    /// Pinged by the health check when present
    pub db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(workflow: Arc<VerificationWorkflow>, db: Option<Arc<Database>>) -> Self {
        Self {
            store: workflow.store().clone(),
            workflow,
            db,
        }
    }
}
