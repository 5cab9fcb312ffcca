use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nexus_core::{
    create_audit_system, create_authenticator, load_config, load_config_from_env,
    validate_config, AuditEvent, AuditStore, Authenticator, Config, Dispatcher, HistoryStore,
    SanitizedConfig, SqliteAuditStore, SqliteHistoryStore,
};
use nexus_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for audit event channel
const AUDIT_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("NEXUS_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Config file from `NEXUS_CONFIG`, else `config.toml`, else environment only.
fn resolve_config() -> Result<Config> {
    match std::env::var("NEXUS_CONFIG") {
        Ok(path) => {
            let path = PathBuf::from(path);
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        Err(_) => {
            let path = PathBuf::from("config.toml");
            if path.exists() {
                info!("Loading configuration from {:?}", path);
                load_config(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))
            } else {
                info!("No config.toml found, using defaults and environment");
                load_config_from_env().context("Failed to load config from environment")
            }
        }
    }
}

/// SHA-256 of the sanitized configuration; secrets never enter the hash input.
fn config_hash(config: &Config) -> String {
    let json = serde_json::to_string(&SanitizedConfig::from(config)).unwrap_or_default();
    format!("{:x}", Sha256::digest(json.as_bytes()))
}

async fn run() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    init_logging();
    if let Ok(path) = dotenv {
        info!("Loaded environment from {:?}", path);
    }

    let config = resolve_config()?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);
    info!("Database path: {:?}", config.database.path);

    let dispatcher = Dispatcher::from_config(&config).context("Failed to build adapters")?;
    for kind in [nexus_core::AdapterKind::Text, nexus_core::AdapterKind::Image] {
        let descriptor = dispatcher.adapter(kind).descriptor();
        info!(
            adapter = %kind,
            model = %descriptor.name,
            provider = %descriptor.provider,
            "Adapter ready"
        );
    }
    let sanitized = SanitizedConfig::from(&config);
    if !sanitized.providers.text.api_key_configured {
        warn!("GROQ_API_KEY not set; text requests will fail with a configuration error");
    }
    if !sanitized.providers.image.api_key_configured {
        info!("GEMINI_API_KEY not set; image requests use the fallback renderer");
    }

    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    let audit_store: Arc<dyn AuditStore> = Arc::new(
        SqliteAuditStore::new(&config.database.path).context("Failed to create audit store")?,
    );
    let history: Arc<dyn HistoryStore> = Arc::new(
        SqliteHistoryStore::new(&config.database.path)
            .context("Failed to create history store")?,
    );
    info!("Storage initialized");

    let (audit_handle, audit_writer) =
        create_audit_system(Arc::clone(&audit_store), AUDIT_BUFFER_SIZE);
    let writer_handle = tokio::spawn(audit_writer.run());

    audit_handle
        .emit(AuditEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash(&config),
        })
        .await;

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(
        config,
        dispatcher,
        authenticator,
        history,
        audit_handle.clone(),
        audit_store,
    ));
    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutting down...");
    audit_handle
        .emit(AuditEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // The router (and its AppState handle) is gone once serve returns; this is
    // the last sender, so dropping it lets the writer drain and exit.
    drop(audit_handle);
    if let Err(e) = writer_handle.await {
        error!("Audit writer task failed: {}", e);
    }
    info!("Audit writer stopped");

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
