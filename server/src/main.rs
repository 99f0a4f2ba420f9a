use anyhow::Result;
use axum::Router;
use clap::Parser;
use newsroom_content::{FileContentStore, RestConfig, RestContentStore};
use newsroom_core::{ContentStore, FieldBoosts, RefreshPolicy, SearchService};
use newsroom_server::build_app;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Base URL of the content store REST API
    #[arg(long, env = "CONTENT_STORE_URL", default_value = "http://localhost:54321")]
    content_url: String,
    /// Read-only API key for the content store
    #[arg(long, env = "CONTENT_STORE_KEY", default_value = "", hide_env_values = true)]
    content_key: String,
    /// Serve from an export file or directory instead of the REST API
    #[arg(long)]
    input: Option<String>,
    /// Seconds a snapshot is served before the next search re-fetches
    #[arg(long, env = "STALENESS_SECS", default_value_t = 300)]
    staleness_secs: u64,
    /// Seconds to wait after a failed fetch before retrying on read
    #[arg(long, env = "RETRY_AFTER_SECS", default_value_t = 30)]
    retry_after_secs: u64,
    /// Background refresh period in seconds; 0 disables scheduled refresh
    #[arg(long, env = "REFRESH_INTERVAL_SECS", default_value_t = 0)]
    refresh_interval_secs: u64,
    /// Content store request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    #[arg(long, default_value_t = 2.0)]
    title_boost: f64,
    #[arg(long, default_value_t = 1.0)]
    excerpt_boost: f64,
    /// Token required by POST /index/refresh
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,
    /// Host to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let store: Arc<dyn ContentStore> = match &args.input {
        Some(path) => Arc::new(FileContentStore::new(path)),
        None => {
            let config = RestConfig {
                timeout: Duration::from_secs(args.timeout_secs),
                ..RestConfig::new(args.content_url.clone(), args.content_key.clone())
            };
            Arc::new(RestContentStore::new(config)?)
        }
    };
    let policy = RefreshPolicy::new(Duration::from_secs(args.staleness_secs), Duration::from_secs(args.retry_after_secs));
    let boosts = FieldBoosts { title: args.title_boost, excerpt: args.excerpt_boost, ..FieldBoosts::default() };
    let service = Arc::new(SearchService::new(store, policy, boosts));

    let _scheduled = if args.refresh_interval_secs > 0 {
        Some(service.spawn_scheduled_refresh(Duration::from_secs(args.refresh_interval_secs)))
    } else {
        if let Err(e) = service.refresh().await {
            tracing::warn!(error = %e, "initial fetch failed; will retry on first search");
        }
        None
    };

    let app: Router = build_app(service, args.admin_token.clone());
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
