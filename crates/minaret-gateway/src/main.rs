use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use tracing::info;

use minaret_core::MinaretConfig;
use minaret_scheduler::{Clock, Notify, ScheduleEngine, TimingsFetcher, WebhookNotifier};

mod app;
mod auth;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minaret=info,minaret_gateway=info,tower_http=info".into()),
        )
        .init();

    // load config: MINARET_CONFIG env > ./minaret.toml.
    // A ConfigError here is fatal; nothing is re-validated at runtime.
    let config_path = std::env::var("MINARET_CONFIG").ok();
    let config = MinaretConfig::load(config_path.as_deref())?;

    let tz = config.test_mode.zone()?;
    let clock = if config.test_mode.enabled {
        let start = config.test_mode.virtual_start()?;
        let clock = Clock::test(tz, start);
        info!(
            virtual_start = %start,
            offset_ms = clock.offset_ms(),
            "test mode active — virtual clock enabled, webhooks suppressed"
        );
        clock
    } else {
        Clock::real(tz)
    };

    let flags = Arc::new(RwLock::new(config.features.clone()));
    let fetcher = TimingsFetcher::new(&config.provider, tz);
    let notifier: Arc<dyn Notify> = Arc::new(WebhookNotifier::new(
        &config.webhook,
        config.test_mode.enabled,
        Arc::clone(&flags),
    ));
    let engine = ScheduleEngine::new(clock, fetcher, notifier);

    // spawn the daily cycle and the next-prayer tracker in the background
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(Arc::clone(&engine).run(shutdown_rx.clone()));
    tokio::spawn(minaret_scheduler::tracker::run(
        Arc::clone(&engine),
        shutdown_rx,
    ));

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;
    let state = Arc::new(app::AppState {
        config,
        flags,
        engine,
    });
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("minaret gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    // signal scheduler and tracker to stop
    let _ = shutdown_tx.send(true);
    Ok(())
}
