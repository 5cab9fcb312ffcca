use std::sync::Arc;

use nexus_core::{
    AuditHandle, AuditStore, Authenticator, Config, Dispatcher, HistoryStore, SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    dispatcher: Dispatcher,
    authenticator: Arc<dyn Authenticator>,
    history: Arc<dyn HistoryStore>,
    audit: AuditHandle,
    audit_store: Arc<dyn AuditStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        dispatcher: Dispatcher,
        authenticator: Arc<dyn Authenticator>,
        history: Arc<dyn HistoryStore>,
        audit: AuditHandle,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            config,
            dispatcher,
            authenticator,
            history,
            audit,
            audit_store,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn history(&self) -> &dyn HistoryStore {
        self.history.as_ref()
    }

    pub fn audit(&self) -> &AuditHandle {
        &self.audit
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }
}
