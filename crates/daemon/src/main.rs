use std::sync::Arc;

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rigwatch_alerting::{AlertingService, JsonFileSettingsStore};
use rigwatch_daemon::background::{alert_logger, market_warmup, reading_intake};
use rigwatch_daemon::shutdown::ShutdownListener;
use rigwatch_daemon::DaemonConfig;
use rigwatch_events::{BusDispatcher, EventBus, LogNotifier};
use rigwatch_market::{FallbackTable, HttpMarketSource, MarketData};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rigwatch_daemon=info,rigwatch_market=info,rigwatch_alerting=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = DaemonConfig::from_env();
    tracing::info!(
        settings_path = %config.settings_path.display(),
        fallback_table_path = %config.fallback_table_path.display(),
        price_api_url = %config.market.price_api_url,
        network_api_url = %config.market.network_api_url,
        "Loaded daemon configuration"
    );

    // --- Market data ---
    let fallback = match FallbackTable::load(&config.fallback_table_path).await {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!(error = %e, "Fallback table unavailable, starting without one");
            FallbackTable::default()
        }
    };
    let source = match HttpMarketSource::new(&config.market) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build market HTTP client");
            std::process::exit(1);
        }
    };
    let market = Arc::new(MarketData::new(Arc::new(source), fallback, &config.market));
    tracing::info!("Market data providers ready");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // --- Alerting ---
    let dispatcher = Arc::new(BusDispatcher::new(Arc::new(LogNotifier), Arc::clone(&event_bus)));
    let alerting = Arc::new(
        AlertingService::new(
            Arc::new(JsonFileSettingsStore::new(&config.settings_path)),
            dispatcher,
        )
        .await,
    );
    tracing::info!(config = ?alerting.config(), "Alerting service ready");

    // --- Background jobs ---
    let cancel = CancellationToken::new();

    let logger_handle = tokio::spawn(alert_logger::run(event_bus.subscribe(), cancel.clone()));
    let warmup_handle = tokio::spawn(market_warmup::run(
        Arc::clone(&market),
        config.warmup.clone(),
        cancel.clone(),
    ));
    let intake_handle = tokio::spawn(reading_intake::run(
        BufReader::new(tokio::io::stdin()),
        Arc::clone(&alerting),
        cancel.clone(),
    ));

    tracing::info!("Background jobs started (alert logger, market warm-up, reading intake)");

    // --- Shutdown ---
    match ShutdownListener::install() {
        Ok(listener) => {
            listener.recv().await;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGTERM handler, waiting for Ctrl-C only");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            }
        }
    }
    cancel.cancel();

    let (logged, warmup, intake) = tokio::join!(logger_handle, warmup_handle, intake_handle);
    if let Ok(logged) = logged {
        tracing::info!(alerts_logged = logged, "Alert logger finished");
    }
    if warmup.is_err() {
        tracing::warn!("Market warm-up job did not shut down cleanly");
    }
    if let Ok(stats) = intake {
        tracing::info!(?stats, "Reading intake finished");
    }

    tracing::info!("Daemon stopped");
}
