use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::str::FromStr;

/// Centralized application configuration.
/// Combines environment variables (prefix `NIMBUS_`) and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,

    /// S3-compatible endpoint presigned URLs point at (e.g. MinIO).
    pub blob_endpoint: String,
    pub blob_region: String,
    pub blob_access_key: String,
    pub blob_secret_key: String,
    /// Single bucket holding every user's objects.
    pub bucket: String,

    pub jwt_secret: String,
    pub jwt_expiry_secs: u64,

    /// Quota ceiling for owners without a policy record.
    pub default_quota_bytes: i64,
    /// Validity of issued presigned PUT/GET URLs.
    pub presign_ttl_secs: u64,
    /// How long an upload reservation holds quota before the sweeper may
    /// collect it. Should comfortably exceed the presign TTL.
    pub reservation_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

/// Command-line configuration; everything else comes from the environment.
#[derive(Parser, Debug)]
#[command(author, version, about = "Personal cloud drive API")]
pub struct Args {
    /// Host to bind to (overrides NIMBUS_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides NIMBUS_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides NIMBUS_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.into())
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {name} value `{value}`")),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).context(format!("reading {name}")),
    }
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the
    /// migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();

        let cfg = Self {
            host: args.host.unwrap_or_else(|| env_string("NIMBUS_HOST", "0.0.0.0")),
            port: match args.port {
                Some(port) => port,
                None => env_parse("NIMBUS_PORT", 3000)?,
            },
            database_url: args
                .database_url
                .unwrap_or_else(|| env_string("NIMBUS_DATABASE_URL", "sqlite://./data/nimbus.db")),
            blob_endpoint: env_string("NIMBUS_BLOB_ENDPOINT", "http://localhost:9000"),
            blob_region: env_string("NIMBUS_BLOB_REGION", "us-east-1"),
            blob_access_key: env_string("NIMBUS_BLOB_ACCESS_KEY", "minioadmin"),
            blob_secret_key: env_string("NIMBUS_BLOB_SECRET_KEY", "minioadmin"),
            bucket: env_string("NIMBUS_BUCKET", "nimbus"),
            jwt_secret: env_string("NIMBUS_JWT_SECRET", "nimbus-dev-secret"),
            jwt_expiry_secs: env_parse("NIMBUS_JWT_EXPIRY_SECS", 3600)?,
            default_quota_bytes: env_parse("NIMBUS_DEFAULT_QUOTA_BYTES", 1024 * 1024 * 1024)?,
            presign_ttl_secs: env_parse("NIMBUS_PRESIGN_TTL_SECS", 600)?,
            reservation_ttl_secs: env_parse("NIMBUS_RESERVATION_TTL_SECS", 3600)?,
            sweep_interval_secs: env_parse("NIMBUS_SWEEP_INTERVAL_SECS", 300)?,
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
