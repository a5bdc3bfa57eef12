use anyhow::Result;
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;
mod views;

use services::{
    auth::HeaderAuthenticator, descriptor::JsonDescriptorParser, file_store::FileStore,
    sqlite_store::SqliteStore, store::MetadataStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting metaedit with config: {:?}", cfg);

    // --- Initialize metadata store ---
    let store: Arc<dyn MetadataStore> = match cfg.database_url.as_deref() {
        Some(db_url) => {
            let store = connect_sqlite(db_url).await?;

            // --- Handle migration mode ---
            if migrate {
                store.run_migrations().await?;
                tracing::info!("Database migration complete.");
                return Ok(()); // exit after migration
            }
            Arc::new(store)
        }
        None => {
            if migrate {
                anyhow::bail!("--migrate needs a database URL (METAEDIT_DATABASE_URL)");
            }
            if !Path::new(&cfg.metadata_dir).exists() {
                fs::create_dir_all(&cfg.metadata_dir)?;
                tracing::info!("Created metadata directory at {}", cfg.metadata_dir);
            }
            Arc::new(FileStore::new(cfg.metadata_dir.clone()))
        }
    };

    let app_state = state::AppState {
        store,
        auth: Arc::new(HeaderAuthenticator::new(cfg.auth_source.clone())),
        descriptors: Arc::new(JsonDescriptorParser),
        settings: Arc::new(cfg.editor_settings()),
    };

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(app_state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the SQLite pool, creating the database file's directory if needed.
async fn connect_sqlite(db_url: &str) -> Result<SqliteStore> {
    tracing::debug!("Connecting using raw URL => {}", db_url);

    // Extract the local file path SQLx will use
    let db_path = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .trim_start_matches("file:");
    tracing::debug!("Interpreted SQLite path => {}", db_path);

    // Create parent directory if needed
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    // Try opening manually before SQLx
    match fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(db_path)
    {
        Ok(_) => tracing::debug!("File can be created/opened successfully."),
        Err(e) => tracing::warn!("Failed to open file manually: {}", e),
    }

    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;
    Ok(SqliteStore::new(Arc::new(db)))
}
