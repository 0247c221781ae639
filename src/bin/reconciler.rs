//! Periodic reconciliation daemon: expires lapsed activation windows
//! and takes down showcases whose hint went away. Runs alongside the
//! API server against the same database.

use std::env;
use std::time::Duration;

use dotenv::dotenv;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use storefront_ranker::api::server::init_tracing;
use storefront_ranker::db::{get_pool, init_pool};
use storefront_ranker::domain::reconciler::run_sweeps;

const DEFAULT_INTERVAL_SECS: u64 = 300;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let interval_secs = env::var("RECONCILER_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_INTERVAL_SECS);

    info!("Starting expiry reconciler, interval {}s", interval_secs);

    init_pool().await?;

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let pool = match get_pool() {
            Ok(pool) => pool,
            Err(e) => {
                error!("Connection pool unavailable: {}", e);
                continue;
            }
        };

        // A failed pass is picked up on the next tick; the sweeps are
        // idempotent so nothing is lost
        if let Err(e) = run_sweeps(pool).await {
            error!("Reconciliation sweep failed: {}", e);
        }
    }
}
