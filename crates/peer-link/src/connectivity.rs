use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{self, BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{LinkError, Result};

// ─── Connectivity ─────────────────────────────────────────────────────────

/// The platform link to the companion device.
///
/// `send_direct` needs the peer to be reachable right now and may produce a
/// reply; `send_durable` queues the payload as the latest application
/// context, delivered whenever the peer next wakes. Only the most recent
/// durable payload is guaranteed to arrive.
pub trait Connectivity: Send + Sync + 'static {
    fn is_reachable(&self) -> bool;

    fn send_direct(&self, payload: Value) -> BoxFuture<'static, Result<Value>>;

    fn send_durable(&self, payload: Value) -> Result<()>;
}

// ─── MemoryConnectivity ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Direct,
    Durable,
}

/// One attempted send, in the order attempts were made.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboxEntry {
    pub channel: Channel,
    pub payload: Value,
    pub delivered: bool,
}

/// Attempts kept by [`MemoryConnectivity::new`].
pub const DEFAULT_OUTBOX_CAPACITY: usize = 1024;

struct MemoryState {
    capacity: usize,
    outbox: VecDeque<OutboxEntry>,
    context: Option<Value>,
}

/// In-process stand-in for the platform link. Records the most recent
/// attempts; reachability and direct-send failure can be flipped at any time.
#[derive(Clone)]
pub struct MemoryConnectivity {
    reachable: Arc<AtomicBool>,
    fail_direct: Arc<AtomicBool>,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryConnectivity {
    pub fn new(reachable: bool) -> Self {
        Self::with_capacity(reachable, DEFAULT_OUTBOX_CAPACITY)
    }

    /// Keep at most `capacity` attempts, dropping the oldest first.
    pub fn with_capacity(reachable: bool, capacity: usize) -> Self {
        Self {
            reachable: Arc::new(AtomicBool::new(reachable)),
            fail_direct: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(MemoryState {
                capacity,
                outbox: VecDeque::with_capacity(capacity.min(DEFAULT_OUTBOX_CAPACITY)),
                context: None,
            })),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Release);
    }

    /// Make direct sends fail even while reachable.
    pub fn set_fail_direct(&self, fail: bool) {
        self.fail_direct.store(fail, Ordering::Release);
    }

    pub fn outbox(&self) -> Vec<OutboxEntry> {
        self.state
            .lock()
            .map(|s| s.outbox.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn sent_on(&self, channel: Channel) -> Vec<OutboxEntry> {
        self.outbox()
            .into_iter()
            .filter(|e| e.channel == channel)
            .collect()
    }

    /// The application context the peer would see on its next wake.
    pub fn durable_context(&self) -> Option<Value> {
        self.state.lock().ok().and_then(|s| s.context.clone())
    }

    fn record(&self, channel: Channel, payload: Value, delivered: bool) {
        if let Ok(mut s) = self.state.lock() {
            if channel == Channel::Durable && delivered {
                s.context = Some(payload.clone());
            }
            if s.capacity == 0 {
                return;
            }
            if s.outbox.len() == s.capacity {
                s.outbox.pop_front();
            }
            s.outbox.push_back(OutboxEntry {
                channel,
                payload,
                delivered,
            });
        }
    }
}

impl Default for MemoryConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for MemoryConnectivity {
    fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Acquire)
    }

    fn send_direct(&self, payload: Value) -> BoxFuture<'static, Result<Value>> {
        let result = if !self.is_reachable() {
            Err(LinkError::Unreachable)
        } else if self.fail_direct.load(Ordering::Acquire) {
            Err(LinkError::Direct("simulated failure".to_string()))
        } else {
            Ok(json!({ "status": "delivered" }))
        };
        self.record(Channel::Direct, payload, result.is_ok());
        future::ready(result).boxed()
    }

    fn send_durable(&self, payload: Value) -> Result<()> {
        self.record(Channel::Durable, payload, true);
        Ok(())
    }
}
