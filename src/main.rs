use anyhow::Result;
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use std::{fs, io::ErrorKind, path::Path, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use url::Url;

use nimbus::auth::JwtKeys;
use nimbus::blob_store::S3BlobStore;
use nimbus::config::AppConfig;
use nimbus::handlers::AppState;
use nimbus::repositories::{FileRepository, FolderRepository, UserRepository};
use nimbus::routes;
use nimbus::services::file_service::FileService;
use nimbus::services::folder_service::FolderService;
use nimbus::services::user_service::UserService;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = AppConfig::from_env_and_args()?;

    tracing::info!(
        host = %cfg.host,
        port = cfg.port,
        bucket = %cfg.bucket,
        blob_endpoint = %cfg.blob_endpoint,
        "starting nimbus"
    );

    // --- Initialize SQLite connection ---
    let db_url = &cfg.database_url;
    tracing::debug!("connecting using URL => {}", db_url);

    // Extract the local file path SQLx will use
    let db_path = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("file:");

    // Create parent directory if needed
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::info!("created missing directory {:?}", parent);
        }
    }

    // SQLx will not create the database file itself; make sure it exists.
    match fs::OpenOptions::new().create(true).write(true).open(db_path) {
        Ok(_) => tracing::debug!("database file can be created/opened"),
        Err(e) => tracing::warn!("failed to open database file manually: {}", e),
    }

    let pool: Arc<sqlx::Pool<sqlx::Sqlite>> = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await?,
    );

    // --- Handle migration mode ---
    if migrate {
        run_migrations(&pool).await?;
        tracing::info!("database migration complete");
        return Ok(()); // exit after migration
    }

    // --- Initialize services ---
    let blob_store = Arc::new(S3BlobStore::new(
        Url::parse(&cfg.blob_endpoint)?,
        cfg.blob_region.clone(),
        cfg.blob_access_key.clone(),
        cfg.blob_secret_key.clone(),
    ));
    let files = FileService::new(
        FileRepository::new(pool.clone()),
        blob_store,
        cfg.bucket.clone(),
        cfg.default_quota_bytes,
        Duration::from_secs(cfg.reservation_ttl_secs),
    );
    let folders = FolderService::new(FolderRepository::new(pool.clone()));
    let users = UserService::new(UserRepository::new(pool.clone()));

    let state = AppState {
        files: files.clone(),
        folders,
        users,
        jwt: JwtKeys::new(&cfg.jwt_secret, cfg.jwt_expiry_secs),
        presign_ttl: Duration::from_secs(cfg.presign_ttl_secs),
        pool: pool.clone(),
    };

    // --- Reservation sweeper ---
    // Collects upload intents that never finalized, releasing their quota.
    let sweep_interval = Duration::from_secs(cfg.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            if let Err(err) = files.sweep_expired_reservations().await {
                tracing::warn!("reservation sweep failed: {err}");
            }
        }
    });

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(state);

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

/// Run SQLite migrations manually from the SQL file on disk.
async fn run_migrations(pool: &Arc<sqlx::Pool<sqlx::Sqlite>>) -> Result<()> {
    let path = "migrations/0001_init.sql";

    if !Path::new(path).exists() {
        anyhow::bail!("Migration file not found: {}", path);
    }

    let sql = fs::read_to_string(path)?;
    let statements = sql
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in statements {
        tracing::debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(&**pool).await?;
    }

    Ok(())
}
