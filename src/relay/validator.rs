//! Concurrent relay validation
//!
//! `fanout` workers share one candidate queue. Every candidate gets a single
//! bounded probe through itself to the identity-check endpoint; only an
//! exact HTTP 200 makes it into the result. There is no retry and no
//! backoff, and a bad candidate never aborts the batch.

use crate::config::RelayConfig;
use crate::crawler::{build_http_client, WorkQueue};
use crate::relay::Relay;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Probes relay candidates for liveness
#[derive(Debug, Clone)]
pub struct RelayValidator {
    probe_url: String,
    timeout: Duration,
    fanout: usize,
    cancel: CancellationToken,
}

impl RelayValidator {
    pub fn new(probe_url: impl Into<String>, timeout: Duration, fanout: usize) -> Self {
        Self {
            probe_url: probe_url.into(),
            timeout,
            fanout: fanout.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Stops probing when `cancel` fires; relays already confirmed are kept
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Creates a validator from the `[relays]` configuration section
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            config.probe_url.clone(),
            Duration::from_secs(config.probe_timeout_secs),
            config.fanout,
        )
    }

    /// Validates `candidates` and returns the live subset
    ///
    /// All workers are joined before returning. The result has no
    /// meaningful order.
    pub async fn validate(&self, candidates: Vec<String>) -> HashSet<Relay> {
        let total = candidates.len();
        let queue = Arc::new(WorkQueue::new(candidates));
        let valid: Arc<Mutex<HashSet<Relay>>> = Arc::new(Mutex::new(HashSet::new()));

        let workers = self.fanout.min(total.max(1));
        tracing::info!(
            "Validating {} relay candidates with {} workers against {}",
            total,
            workers,
            self.probe_url
        );

        let mut set = JoinSet::new();
        for _ in 0..workers {
            let queue = Arc::clone(&queue);
            let valid = Arc::clone(&valid);
            let validator = self.clone();

            set.spawn(async move {
                loop {
                    if validator.cancel.is_cancelled() {
                        break;
                    }
                    let Some(candidate) = queue.pop() else {
                        break;
                    };

                    let probed = tokio::select! {
                        biased;
                        _ = validator.cancel.cancelled() => {
                            tracing::debug!("Probe of {} abandoned on cancellation", candidate);
                            break;
                        }
                        probed = validator.probe(&candidate) => probed,
                    };

                    if let Some(relay) = probed {
                        tracing::info!("Relay {} is alive", relay);
                        valid
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .insert(relay);
                    }
                }
            });
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Relay validation worker failed: {}", e);
            }
        }

        let valid = std::mem::take(&mut *valid.lock().unwrap_or_else(PoisonError::into_inner));
        tracing::info!("{} of {} relay candidates are alive", valid.len(), total);
        valid
    }

    /// Issues the single probe for one candidate
    ///
    /// Returns the relay only when the probe answered exactly HTTP 200.
    async fn probe(&self, candidate: &str) -> Option<Relay> {
        let relay = match Relay::parse(candidate) {
            Ok(relay) => relay,
            Err(e) => {
                tracing::debug!("Discarding candidate: {}", e);
                return None;
            }
        };

        let client = match build_http_client(self.timeout, Some(&relay)) {
            Ok(client) => client,
            Err(e) => {
                tracing::debug!("Discarding relay {}: {}", relay, e);
                return None;
            }
        };

        match client.get(&self.probe_url).send().await {
            Ok(response) if response.status().as_u16() == 200 => Some(relay),
            Ok(response) => {
                tracing::debug!(
                    "Discarding relay {}: probe returned HTTP {}",
                    relay,
                    response.status().as_u16()
                );
                None
            }
            Err(e) => {
                tracing::debug!("Discarding relay {}: {}", relay, e);
                None
            }
        }
    }
}
