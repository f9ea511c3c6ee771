//! Pilot identity resolution.
//!
//! Cache hits merge into the ledger synchronously. Cache misses fire a
//! remote lookup on a spawned task so the poll loop never waits on the
//! identity service. In-flight lookups are deduplicated per drone serial:
//! a pending set is consulted before a new request is issued, so a burst
//! of observations for one unresolved drone produces exactly one fetch.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use nestwatch_core::{DroneObservation, PilotIdentity, ViolationLedger};

/// Errors from the remote identity service.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("pilot lookup request failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("pilot lookup returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed pilot document: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Remote pilot-identity source, keyed by drone serial.
#[async_trait]
pub trait PilotLookup: Send + Sync {
    async fn fetch(&self, serial: &str) -> Result<PilotIdentity, LookupError>;
}

/// HTTP implementation against the registry service.
pub struct HttpPilotLookup {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPilotLookup {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        HttpPilotLookup {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl PilotLookup for HttpPilotLookup {
    async fn fetch(&self, serial: &str) -> Result<PilotIdentity, LookupError> {
        let url = format!("{}/{serial}", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }
        let body = response.text().await?;
        let identity: PilotIdentity = serde_json::from_str(&body)?;
        Ok(identity)
    }
}

/// Resolves drone serials to pilots and merges results into the ledger.
#[derive(Clone)]
pub struct PilotResolver {
    lookup: Arc<dyn PilotLookup>,
    ledger: Arc<RwLock<ViolationLedger>>,
    /// Serials with a lookup currently in flight.
    pending: Arc<Mutex<HashSet<String>>>,
}

impl PilotResolver {
    pub fn new(lookup: Arc<dyn PilotLookup>, ledger: Arc<RwLock<ViolationLedger>>) -> Self {
        PilotResolver {
            lookup,
            ledger,
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Resolve one violating observation.
    ///
    /// Known serial: merged synchronously. Unknown serial: spawns a lookup
    /// unless one is already pending for it, in which case the observation
    /// is dropped (the in-flight lookup's record seeds from its own
    /// observation).
    pub fn resolve(&self, observation: DroneObservation, distance: f64) {
        {
            let mut ledger = self.ledger.write().unwrap();
            if ledger.merge_by_drone(&observation, distance) {
                return;
            }
        }

        {
            let mut pending = self.pending.lock().unwrap();
            if !pending.insert(observation.serial.clone()) {
                return; // lookup already in flight for this serial
            }
        }

        let resolver = self.clone();
        tokio::spawn(async move {
            resolver.complete_lookup(observation, distance).await;
        });
    }

    /// Run the remote lookup and merge the result. Failures drop the
    /// resolution — no record, no retry.
    pub(crate) async fn complete_lookup(&self, observation: DroneObservation, distance: f64) {
        match self.lookup.fetch(&observation.serial).await {
            Ok(identity) => {
                let mut ledger = self.ledger.write().unwrap();
                ledger.record_identity(identity, &observation, distance);
            }
            Err(e) => {
                tracing::warn!(serial = %observation.serial, "pilot lookup failed: {e}");
            }
        }
        self.pending.lock().unwrap().remove(&observation.serial);
    }
}
