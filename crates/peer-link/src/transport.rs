use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use haptic_core::protocol::PeerReady;
use haptic_core::LinkStatus;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::connectivity::{Channel, Connectivity};

// ─── Delivery ─────────────────────────────────────────────────────────────

/// Where a payload finally went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent(Channel),
    /// Both channels refused it.
    Lost,
}

/// Returned by [`TransportAdapter::send`]. The send is already under way;
/// awaiting [`settled`](Dispatch::settled) is optional.
pub struct Dispatch {
    task: Option<JoinHandle<Delivery>>,
    immediate: Delivery,
}

impl Dispatch {
    pub async fn settled(self) -> Delivery {
        match self.task {
            Some(task) => task.await.unwrap_or(Delivery::Lost),
            None => self.immediate,
        }
    }
}

// ─── TransportAdapter ─────────────────────────────────────────────────────

struct Inner {
    connectivity: Arc<dyn Connectivity>,
    link: Mutex<LinkStatus>,
    announced: AtomicBool,
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Chooses a channel for each outbound payload and tracks link status.
///
/// Cheap to clone; clones share the same link flags and announcement guard.
#[derive(Clone)]
pub struct TransportAdapter {
    inner: Arc<Inner>,
}

impl TransportAdapter {
    pub fn new(connectivity: Arc<dyn Connectivity>) -> Self {
        Self {
            inner: Arc::new(Inner {
                connectivity,
                link: Mutex::new(LinkStatus::default()),
                announced: AtomicBool::new(false),
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Send `payload` without waiting.
    ///
    /// Reachable now: direct send on a spawned task, falling back to one
    /// durable send if it fails. Not reachable: one durable send and no
    /// direct attempt. Must be called inside a Tokio runtime.
    pub fn send(&self, payload: Value) -> Dispatch {
        if !self.inner.connectivity.is_reachable() {
            let delivery = self.send_durable(payload);
            return Dispatch {
                task: None,
                immediate: delivery,
            };
        }

        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let this = self.clone();
        let task = tokio::spawn(async move {
            let attempt = this.inner.connectivity.send_direct(payload.clone()).await;
            let delivery = match attempt {
                Ok(_) => Delivery::Sent(Channel::Direct),
                Err(e) => {
                    tracing::warn!(error = %e, "direct send failed, falling back to durable");
                    this.send_durable(payload)
                }
            };
            if this.inner.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
                this.inner.idle.notify_waiters();
            }
            delivery
        });
        Dispatch {
            task: Some(task),
            immediate: Delivery::Lost,
        }
    }

    fn send_durable(&self, payload: Value) -> Delivery {
        match self.inner.connectivity.send_durable(payload) {
            Ok(()) => Delivery::Sent(Channel::Durable),
            Err(e) => {
                tracing::warn!(error = %e, "durable send failed, payload dropped");
                Delivery::Lost
            }
        }
    }

    /// Resolve once no direct send is in flight.
    pub async fn idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn link(&self) -> LinkStatus {
        self.inner
            .link
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default()
    }

    pub fn on_reachability_changed(&self, reachable: bool) -> LinkStatus {
        tracing::info!(reachable, "reachability changed");
        self.update_link(|link| link.reachable = reachable)
    }

    /// Record the outcome of link activation. The first successful
    /// activation announces readiness to the peer, once per adapter.
    pub fn on_activation_complete(&self, activated: bool, error: Option<&str>) -> LinkStatus {
        if let Some(error) = error {
            tracing::warn!(error, "link activation reported an error");
        }
        let reachable = self.inner.connectivity.is_reachable();
        let link = self.update_link(|link| {
            link.activated = activated;
            link.reachable = reachable;
            link.settled = true;
        });

        if activated && !self.inner.announced.swap(true, Ordering::AcqRel) {
            tracing::info!("link active, announcing readiness");
            self.send(PeerReady::now().to_value());
        }
        link
    }

    fn update_link(&self, f: impl FnOnce(&mut LinkStatus)) -> LinkStatus {
        match self.inner.link.lock() {
            Ok(mut link) => {
                f(&mut link);
                link.clone()
            }
            Err(_) => LinkStatus::default(),
        }
    }
}
