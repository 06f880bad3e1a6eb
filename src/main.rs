//! Feed → Mastodon auto-poster — binary entrypoint.
//! Loads env configuration, wires the liveness/metrics server, then drives
//! the poll/publish scheduler forever.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedtoot::config::Config;
use feedtoot::feed::Rss2JsonClient;
use feedtoot::ledger::Ledger;
use feedtoot::publisher::MastodonClient;
use feedtoot::{api, metrics, scheduler};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feedtoot=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Missing credentials abort here, before anything is scheduled.
    let cfg = Config::from_env()?;

    let handle = metrics::install();
    if let Some(port) = cfg.liveness_port {
        let router = api::router(metrics::router(handle));
        tokio::spawn(async move {
            if let Err(e) = api::serve(port, router).await {
                tracing::warn!(error = ?e, "liveness server stopped");
            }
        });
    }

    let mut ledger = Ledger::open(cfg.ledger_path.clone(), cfg.ledger_cap);
    let feed = Rss2JsonClient::new(cfg.feed_endpoint.clone());
    let publisher = MastodonClient::new(
        cfg.instance.clone(),
        cfg.access_token.clone(),
        cfg.visibility.clone(),
    );

    tracing::info!(
        instance = %cfg.instance,
        schedule = ?cfg.schedule,
        posted = ledger.len(),
        "feed poster started"
    );

    scheduler::run(cfg.schedule, &feed, &publisher, &mut ledger).await;
    Ok(())
}
