//! Feed poller — drives the detection pipeline on a fixed cadence.
//!
//! Each cycle: fetch the feed, decode, run every observation through the
//! geofence in feed order, hand violators to the resolver, prune the
//! ledger, then schedule the next cycle. Pilot lookups spawned for cache
//! misses are not awaited; they may still be outstanding when the next
//! cycle runs.
//!
//! A failed fetch or decode never stops ingestion: the cycle is logged and
//! rescheduled with exponential backoff, reset on the next success.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use thiserror::Error;

use nestwatch_core::{
    decode_feed, now_millis, DroneObservation, NestError, NoFlyZone, ViolationLedger,
    RETENTION_MS,
};

use crate::resolver::PilotResolver;

/// Backoff ceiling for consecutive feed failures.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PollError {
    #[error("feed fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("feed fetch returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("feed decode failed: {0}")]
    Decode(#[from] NestError),
}

pub struct FeedPoller {
    client: reqwest::Client,
    feed_url: String,
    zone: NoFlyZone,
    resolver: PilotResolver,
    ledger: Arc<RwLock<ViolationLedger>>,
    interval: Duration,
}

impl FeedPoller {
    pub fn new(
        client: reqwest::Client,
        feed_url: String,
        zone: NoFlyZone,
        resolver: PilotResolver,
        ledger: Arc<RwLock<ViolationLedger>>,
        interval: Duration,
    ) -> Self {
        FeedPoller {
            client,
            feed_url,
            zone,
            resolver,
            ledger,
            interval,
        }
    }

    /// Run the poll loop forever.
    pub async fn run(self) {
        let mut consecutive_failures = 0u32;
        loop {
            tokio::time::sleep(backoff_delay(self.interval, consecutive_failures)).await;

            match self.poll_once().await {
                Ok(violations) => {
                    consecutive_failures = 0;
                    if violations > 0 {
                        tracing::debug!(violations, "poll cycle complete");
                    }
                }
                Err(e) => {
                    consecutive_failures += 1;
                    tracing::warn!(consecutive_failures, "poll cycle failed: {e}");
                }
            }
        }
    }

    /// One fetch → decode → evaluate → resolve pass. Returns the number of
    /// violating observations seen this cycle.
    async fn poll_once(&self) -> Result<usize, PollError> {
        let response = self.client.get(&self.feed_url).send().await?;
        if !response.status().is_success() {
            return Err(PollError::Status(response.status()));
        }
        let body = response.text().await?;
        let observations = decode_feed(&body)?;
        Ok(self.process_batch(observations))
    }

    /// Evaluate a decoded batch and merge violators, preserving feed order.
    fn process_batch(&self, observations: Vec<DroneObservation>) -> usize {
        let mut violations = 0;
        for observation in observations {
            if !self.zone.is_violation(observation.position) {
                continue;
            }
            let distance = self.zone.distance_to_center(observation.position);
            violations += 1;
            self.resolver.resolve(observation, distance);
        }

        let pruned = self
            .ledger
            .write()
            .unwrap()
            .prune(RETENTION_MS, now_millis());
        if pruned > 0 {
            tracing::debug!(pruned, "evicted stale ledger records");
        }

        violations
    }
}

fn backoff_delay(base: Duration, consecutive_failures: u32) -> Duration {
    let factor = 1u32 << consecutive_failures.min(6);
    (base * factor).min(MAX_BACKOFF)
}
