use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dm_relay::config::Config;
use dm_relay::markers::{FsMarkerStore, MarkerStore};
use dm_relay::relay::Relay;
use dm_relay::server::{AppState, build_router};
use dm_relay::slack::SlackClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dm_relay=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("loading configuration")?;
    info!(?config, "Configuration loaded");

    let markers = FsMarkerStore::open(config.marker_dir.clone()).with_context(|| {
        format!("opening marker directory {}", config.marker_dir.display())
    })?;
    report_interrupted_claims(&markers);

    let slack = SlackClient::new(&config.slack).context("building Slack client")?;
    let relay = Relay::new(
        config.credentials.clone(),
        config.slack.target_channel.clone(),
        Arc::new(markers),
        slack,
    );
    if config.signing_secret.is_none() {
        warn!("SLACK_SIGNING_SECRET not set; request signatures will not be verified");
    }
    let app = build_router(AppState::new(relay, config.signing_secret.clone()));

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("serving")?;

    info!("shut down");
    Ok(())
}

/// Logs claims a previous run left without a delivered marker.
///
/// They are kept, so those files are never relayed automatically.
fn report_interrupted_claims(markers: &FsMarkerStore) {
    match markers.interrupted_claims() {
        Ok(ids) if ids.is_empty() => {}
        Ok(ids) => {
            let files: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
            warn!(
                count = ids.len(),
                ?files,
                dir = %markers.dir().display(),
                "Found claims with no delivered marker; these files may not have been relayed"
            );
        }
        Err(e) => warn!(error = %e, "Failed to scan marker directory"),
    }
}

async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, draining requests");
    token.cancel();
}
