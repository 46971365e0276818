use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::negotiation::NegotiationEngine;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Background task that periodically reverts pending swap requests older
/// than the configured TTL.
pub struct ExpirySweeper {
    engine: NegotiationEngine,
    ttl: Duration,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(engine: NegotiationEngine, ttl: Duration, interval: Duration) -> Self {
        Self {
            engine,
            ttl,
            interval: interval.max(MIN_SWEEP_INTERVAL),
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Sweep on every tick until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(ttl = ?self.ttl, interval = ?self.interval, "Swap expiry sweeper started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Swap expiry sweeper stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.engine.expire_stale(Utc::now(), self.ttl).await {
                        warn!(error = %e, "Swap expiry sweep failed");
                    }
                }
            }
        }
    }
}
