use clap::Parser;
use mockshape::adapters::rate_limit;
use mockshape::cli::Cli;
use mockshape::config::{watcher::DefinitionWatcher, Settings};
use mockshape::AppContext;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const RATE_LIMIT_EVICTION_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;
    let host = settings.server.host.clone();
    let port = settings.server.port;

    info!("Starting Mockshape on {}:{}", host, port);

    let ctx = Arc::new(AppContext::new(settings)?);

    if let Some(limiter) = &ctx.rate_limiter {
        rate_limit::spawn_eviction(limiter.clone(), RATE_LIMIT_EVICTION_PERIOD);
    }

    let _watcher = if cli.no_watch {
        None
    } else {
        let ctx_for_watcher = ctx.clone();
        let cli_for_watcher = cli.clone();
        let runtime = tokio::runtime::Handle::current();
        let watcher = DefinitionWatcher::new(Settings::watch_paths(&cli.config), move || {
            match Settings::new_with_cli(&cli_for_watcher) {
                Ok(new_settings) => {
                    let ctx = ctx_for_watcher.clone();
                    runtime.spawn(async move {
                        ctx.reload(new_settings.definitions()).await;
                        info!("Definitions reloaded successfully");
                    });
                }
                Err(e) => error!("Failed to reload definitions, keeping previous: {}", e),
            }
        })?;
        Some(watcher)
    };

    let app = mockshape::create_app(&ctx);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
