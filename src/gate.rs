//! Single-flight coalescing for concurrent backend calls.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::debug;

use crate::error::SessionError;

/// Whether the current caller leads a fresh flight or joins one in progress.
enum Flight<T> {
    Join(broadcast::Receiver<Result<T, SessionError>>),
    Lead(broadcast::Sender<Result<T, SessionError>>),
}

/// Coalesces concurrent calls per key: the first caller runs the work, every
/// caller that arrives before it resolves receives the same result instead of
/// issuing duplicate work.
pub struct SingleFlightGate<T> {
    inflight: Mutex<HashMap<String, broadcast::Sender<Result<T, SessionError>>>>,
}

impl<T: Clone + Send + 'static> SingleFlightGate<T> {
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Run `work` under `key`, or await the call already in flight for it.
    ///
    /// A failure is delivered identically to every waiter. The key is
    /// released before the result is published, so a subsequent call always
    /// starts fresh work regardless of how the previous flight ended.
    pub async fn run_exclusive<F, Fut>(&self, key: &str, work: F) -> Result<T, SessionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SessionError>>,
    {
        // Decide whether to lead or join while holding the lock, but perform
        // any await only after the guard's scope has ended — a std Mutex guard
        // may not be held across an await point.
        let flight = {
            let Ok(mut inflight) = self.inflight.lock() else {
                // Poisoned map: degrade to uncoalesced work.
                return work().await;
            };
            if let Some(tx) = inflight.get(key) {
                Flight::Join(tx.subscribe())
            } else {
                let (tx, _) = broadcast::channel(1);
                inflight.insert(key.to_string(), tx.clone());
                Flight::Lead(tx)
            }
        };

        let tx = match flight {
            Flight::Join(mut rx) => {
                debug!(key, "joining in-flight call");
                return match rx.recv().await {
                    Ok(result) => result,
                    Err(_) => Err(SessionError::Network(format!(
                        "in-flight call for '{key}' was cancelled before completing"
                    ))),
                };
            }
            Flight::Lead(tx) => tx,
        };

        let result = {
            // Releases the key even if the work future is dropped mid-flight.
            let _open = FlightGuard {
                inflight: &self.inflight,
                key,
            };
            work().await
        };

        // Key already released: late arrivals start fresh work, earlier
        // waiters still hold their receivers.
        let _ = tx.send(result.clone());
        result
    }
}

impl<T: Clone + Send + 'static> Default for SingleFlightGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct FlightGuard<'a, T> {
    inflight: &'a Mutex<HashMap<String, broadcast::Sender<Result<T, SessionError>>>>,
    key: &'a str,
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        if let Ok(mut inflight) = self.inflight.lock() {
            inflight.remove(self.key);
        }
    }
}
