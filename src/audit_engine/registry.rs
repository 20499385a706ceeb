//! Ordered auditor registry
//!
//! Built once at engine construction; registration order is the stable
//! order findings are compiled in, so reports are reproducible across
//! runs.

use log::{info, warn};
use std::sync::Arc;

use super::auditor::Auditor;

#[derive(Default, Clone)]
pub struct AuditorRegistry {
    auditors: Vec<Arc<dyn Auditor>>,
}

impl AuditorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an auditor. Order of registration is preserved in
    /// compiled results.
    #[must_use]
    pub fn register(mut self, auditor: Arc<dyn Auditor>) -> Self {
        self.auditors.push(auditor);
        self
    }

    #[must_use]
    pub fn auditors(&self) -> &[Arc<dyn Auditor>] {
        &self.auditors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.auditors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.auditors.is_empty()
    }

    /// Run `initialize` on every registered auditor.
    ///
    /// Initialization failures disable the auditor for the run rather
    /// than aborting it; the survivors are returned in registration
    /// order.
    pub async fn initialize_all(&self) -> Vec<Arc<dyn Auditor>> {
        let mut ready = Vec::with_capacity(self.auditors.len());
        for auditor in &self.auditors {
            match auditor.initialize().await {
                Ok(()) => ready.push(Arc::clone(auditor)),
                Err(e) => {
                    warn!("auditor {} failed to initialize, skipping: {e:#}", auditor.name());
                }
            }
        }
        info!("{}/{} auditors ready", ready.len(), self.auditors.len());
        ready
    }

    /// Run `cleanup` on every registered auditor, logging failures.
    pub async fn cleanup_all(&self) {
        for auditor in &self.auditors {
            if let Err(e) = auditor.cleanup().await {
                warn!("auditor {} cleanup failed: {e:#}", auditor.name());
            }
        }
    }
}
