pub mod audit;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod history;
pub mod metrics;
pub mod provider;
pub mod routing;
pub mod testing;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, AuditWriter, SqliteAuditStore,
};
pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, AuthMethod, Config,
    ConfigError, SanitizedConfig,
};
pub use dispatch::{DispatchError, Dispatched, Dispatcher, ResponseEnvelope};
pub use history::{
    session_title, ChatSession, Exchange, HistoryError, HistoryStore, NewExchange,
    SqliteHistoryStore,
};
pub use provider::{
    Adapter, AdapterDescriptor, AdapterError, AdapterKind, GenerationResult, ImageAdapter,
    TextAdapter,
};
pub use routing::{KeywordClassifier, ModeHint, PromptRouter, RoutingDecision, RoutingReason};
