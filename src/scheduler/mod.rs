//! Ingestion scheduler: the fixed-period pull from the news source.
//!
//! One timer task pulls a batch per tick and hands it to the posting stage.
//! Ticks never overlap (the next tick fires only after the previous one ran
//! to completion) and are independent: a fetch failure is logged and the
//! timer simply continues on its period — no backoff, no circuit breaker,
//! because ticks are idempotent by construction via the dedup store.
//!
//! The loop is gated on gateway readiness and cancelled on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::chat::ChatApi;
use crate::fetch::NewsSource;
use crate::moderation::PostingStage;

/// Timer and batch parameters for the ingestion loop.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Fixed period between ticks.
    pub interval: Duration,

    /// Batch size requested from the source each tick.
    pub fetch_limit: usize,
}

/// Runs the ingestion loop until `shutdown` is cancelled.
///
/// Waits for `ready` to become true before the first tick; if the readiness
/// channel closes without ever signalling, the loop exits (the gateway is
/// gone, so there is nothing to ingest for).
pub async fn run<S, C>(
    config: SchedulerConfig,
    source: Arc<S>,
    stage: Arc<PostingStage<C>>,
    mut ready: watch::Receiver<bool>,
    shutdown: CancellationToken,
) where
    S: NewsSource,
    C: ChatApi,
{
    tokio::select! {
        _ = shutdown.cancelled() => {
            info!("shutdown before gateway became ready, scheduler exiting");
            return;
        }
        result = ready.wait_for(|ready| *ready) => {
            if result.is_err() {
                warn!("readiness channel closed, scheduler exiting");
                return;
            }
        }
    }

    info!(interval = ?config.interval, fetch_limit = config.fetch_limit, "ingestion scheduler started");
    let mut timer = tokio::time::interval(config.interval);
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("shutdown signal received, scheduler stopping");
                return;
            }
            _ = timer.tick() => {
                tick(&config, source.as_ref(), stage.as_ref()).await;
            }
        }
    }
}

/// One tick: fetch a batch and feed it to the posting stage.
async fn tick<S, C>(config: &SchedulerConfig, source: &S, stage: &PostingStage<C>)
where
    S: NewsSource,
    C: ChatApi,
{
    let items = match source.fetch_latest(config.fetch_limit).await {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "news fetch failed, skipping tick");
            return;
        }
    };
    stage.run_tick(&items).await;
}
