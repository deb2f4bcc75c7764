use acct_core::{AuthConfig, StorageConfig};
use acct_service::{build_router, ServiceConfig, ServiceState};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StorageMode {
    Auto,
    Memory,
    Postgres,
}

#[derive(Debug, Parser)]
#[command(name = "acctd", version, about = "Partner accounting REST service")]
struct Cli {
    /// REST socket address to bind, e.g. 127.0.0.1:8090
    #[arg(long, default_value = "127.0.0.1:8090", env = "ACCT_LISTEN")]
    listen: SocketAddr,
    /// Persistence backend. `auto` picks postgres when a database url is configured.
    #[arg(long, value_enum, default_value_t = StorageMode::Auto, env = "ACCT_STORAGE")]
    storage: StorageMode,
    /// PostgreSQL url for accounting records.
    #[arg(long, env = "ACCT_DATABASE_URL")]
    database_url: Option<String>,
    /// Max PostgreSQL pool connections.
    #[arg(long, default_value_t = 5, env = "ACCT_PG_MAX_CONNECTIONS")]
    pg_max_connections: u32,
    /// Lifetime of an authenticated session.
    #[arg(long, default_value_t = 48, env = "ACCT_SESSION_TTL_HOURS")]
    session_ttl_hours: i64,
    /// Issuer name shown in authenticator apps.
    #[arg(long, default_value = "AcctSystem", env = "ACCT_OTP_ISSUER")]
    otp_issuer: String,
    /// Accepted OTP clock drift, in 30-second steps.
    #[arg(long, default_value_t = 1, env = "ACCT_OTP_SKEW")]
    otp_skew: u8,
}

fn resolve_storage(cli: &Cli) -> anyhow::Result<StorageConfig> {
    let resolved_url = cli
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok());

    let storage = match cli.storage {
        StorageMode::Memory => StorageConfig::Memory,
        StorageMode::Postgres => {
            let database_url = resolved_url.ok_or_else(|| {
                anyhow::anyhow!("storage=postgres requires --database-url or DATABASE_URL")
            })?;
            StorageConfig::postgres(database_url, cli.pg_max_connections)
        }
        StorageMode::Auto => {
            if let Some(database_url) = resolved_url {
                StorageConfig::postgres(database_url, cli.pg_max_connections)
            } else {
                StorageConfig::Memory
            }
        }
    };

    Ok(storage)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "acct_service=info,info".to_string()),
        )
        .init();

    let cli = Cli::parse();
    if cli.session_ttl_hours <= 0 {
        anyhow::bail!("--session-ttl-hours must be positive");
    }

    let storage = resolve_storage(&cli)?;
    info!(backend = storage.label(), "starting acct-service");
    let config = ServiceConfig {
        storage,
        auth: AuthConfig {
            issuer: cli.otp_issuer,
            otp_skew: cli.otp_skew,
        },
        session_ttl: chrono::Duration::hours(cli.session_ttl_hours),
    };
    let state = ServiceState::bootstrap(config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    info!("acct-service REST listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
