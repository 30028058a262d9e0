#![cfg(feature = "std")]

//! Pairs oracle requests with the out-of-band notifications that answer them.
//!
//! Each request registers a one-shot slot keyed by its correlation id before
//! the request is sent. The first notification carrying that id resolves the
//! slot and removes it; a timeout removes it as well, so the table never
//! grows across turns or games.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::time::{timeout_at, Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorrelationId(pub u64);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One notification from the oracle service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleResponse {
    pub id: CorrelationId,
    pub content: String,
    pub function_name: String,
    /// Set when the oracle gave up on this request; `content` is empty then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl OracleResponse {
    pub fn reply(id: CorrelationId, content: String, function_name: &str) -> Self {
        Self {
            id,
            content,
            function_name: function_name.to_string(),
            failure: None,
        }
    }

    /// Notification that request `id` will never be answered.
    pub fn failed(id: CorrelationId, cause: String, function_name: &str) -> Self {
        Self {
            id,
            content: String::new(),
            function_name: function_name.to_string(),
            failure: Some(cause),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    Timeout { id: CorrelationId, after: Duration },
    /// The correlator dropped the slot without resolving it.
    Closed { id: CorrelationId },
    /// A request with this id is already waiting.
    DuplicateId { id: CorrelationId },
    /// The oracle reported that it cannot answer this request.
    Failed { id: CorrelationId, cause: String },
}

impl fmt::Display for CorrelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationError::Timeout { id, after } => {
                write!(f, "no response for request {} within {:?}", id, after)
            }
            CorrelationError::Closed { id } => write!(f, "request {} was abandoned", id),
            CorrelationError::DuplicateId { id } => {
                write!(f, "request {} is already pending", id)
            }
            CorrelationError::Failed { id, cause } => {
                write!(f, "request {} failed: {}", id, cause)
            }
        }
    }
}

impl std::error::Error for CorrelationError {}

struct Slot {
    deadline: Instant,
    sender: oneshot::Sender<OracleResponse>,
}

/// Correlation table shared by every game in the process.
pub struct ResponseCorrelator {
    next_id: AtomicU64,
    pending: Mutex<HashMap<CorrelationId, Slot>>,
}

impl ResponseCorrelator {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh id, unique within this process.
    pub fn next_id(&self) -> CorrelationId {
        CorrelationId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Open a slot for `id` that expires `timeout` from now. Register before
    /// sending the request so an immediate reply cannot be missed.
    pub fn register(
        self: &Arc<Self>,
        id: CorrelationId,
        timeout: Duration,
    ) -> Result<PendingResponse, CorrelationError> {
        let (sender, receiver) = oneshot::channel();
        let deadline = Instant::now() + timeout;
        let mut pending = self.lock();
        if pending.contains_key(&id) {
            return Err(CorrelationError::DuplicateId { id });
        }
        pending.insert(id, Slot { deadline, sender });
        Ok(PendingResponse {
            id,
            timeout,
            deadline,
            receiver,
            correlator: Arc::clone(self),
        })
    }

    /// Route one notification. Returns `true` only if it resolved a waiter;
    /// notifications for unknown or expired ids are dropped.
    pub fn dispatch(&self, response: OracleResponse) -> bool {
        let slot = self.lock().remove(&response.id);
        match slot {
            Some(slot) if Instant::now() <= slot.deadline => {
                let id = response.id;
                if slot.sender.send(response).is_err() {
                    log::debug!("oracle response {} arrived after its waiter left", id);
                    return false;
                }
                true
            }
            Some(_) => {
                log::debug!("oracle response {} arrived past its deadline", response.id);
                false
            }
            None => {
                log::debug!("ignoring oracle response {} with no pending request", response.id);
                false
            }
        }
    }

    /// Register, then wait. Use [`register`](Self::register) directly when a
    /// request must be sent between the two.
    pub async fn await_response(
        self: &Arc<Self>,
        id: CorrelationId,
        timeout: Duration,
    ) -> Result<OracleResponse, CorrelationError> {
        self.register(id, timeout)?.wait().await
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_pending(&self, id: CorrelationId) -> bool {
        self.lock().contains_key(&id)
    }

    fn deregister(&self, id: CorrelationId) -> bool {
        self.lock().remove(&id).is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CorrelationId, Slot>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ResponseCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered request waiting for its notification.
pub struct PendingResponse {
    id: CorrelationId,
    timeout: Duration,
    deadline: Instant,
    receiver: oneshot::Receiver<OracleResponse>,
    correlator: Arc<ResponseCorrelator>,
}

impl PendingResponse {
    pub fn id(&self) -> CorrelationId {
        self.id
    }

    /// Resolve with the first matching notification or fail once the
    /// deadline passes. A failure notification ends the wait early. The slot
    /// is gone on return either way.
    pub async fn wait(mut self) -> Result<OracleResponse, CorrelationError> {
        let id = self.id;
        match timeout_at(self.deadline, &mut self.receiver).await {
            Ok(Ok(mut response)) => match response.failure.take() {
                Some(cause) => Err(CorrelationError::Failed { id, cause }),
                None => Ok(response),
            },
            Ok(Err(_)) => Err(CorrelationError::Closed { id }),
            Err(_) => {
                self.correlator.deregister(id);
                Err(CorrelationError::Timeout {
                    id,
                    after: self.timeout,
                })
            }
        }
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        self.correlator.deregister(self.id);
    }
}
