use std::future::Future;
use std::time::Instant;

use haptic_core::config::HapticsConfig;
use haptic_core::{HapticOutput, MessageRouter, PresentationSnapshot};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{LinkError, Result};
use crate::transport::TransportAdapter;

// ─── LinkEvent ────────────────────────────────────────────────────────────

/// Everything that can reach the session, from any thread.
#[derive(Debug)]
pub enum LinkEvent {
    /// A direct message. With `reply`, the ack goes back on it; without,
    /// the ack is sent through the transport.
    InboundDirect {
        payload: Value,
        reply: Option<oneshot::Sender<Value>>,
    },
    /// A durable context delivery. Applied, never acknowledged.
    InboundDurable(Value),
    Reachability(bool),
    Activation {
        activated: bool,
        error: Option<String>,
    },
    TestHaptics,
    Trigger {
        pattern_id: String,
        variant: Option<String>,
    },
    Send(Value),
    /// Answered once every earlier event has been applied.
    Flush(oneshot::Sender<()>),
}

/// Session clock. Taken from Tokio so paused-time tests drive it.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

// ─── PeerSession ──────────────────────────────────────────────────────────

/// Serial owner of the router. One task, one queue: events are applied in
/// arrival order and pulse or dismiss deadlines are timers inside the same
/// loop, so state is never touched from two places at once.
pub struct PeerSession<O> {
    router: MessageRouter<O>,
    transport: TransportAdapter,
    haptics: HapticsConfig,
    snapshot: watch::Sender<PresentationSnapshot>,
}

impl<O: HapticOutput + 'static> PeerSession<O> {
    /// Start the session task and return a handle to it. The task ends when
    /// every handle is dropped.
    pub fn spawn(
        router: MessageRouter<O>,
        transport: TransportAdapter,
        haptics: HapticsConfig,
    ) -> PeerSessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot, snapshot_rx) = watch::channel(router.snapshot());
        let session = PeerSession {
            router,
            transport: transport.clone(),
            haptics,
            snapshot,
        };
        tokio::spawn(session.run(rx));
        PeerSessionHandle {
            tx,
            snapshot: snapshot_rx,
            transport,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<LinkEvent>) {
        tracing::debug!("peer session started");
        loop {
            let deadline = self.router.next_deadline();
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => self.on_event(event),
                    None => break,
                },
                _ = sleep_until(deadline) => {}
            }
            let fired = self.router.tick(now());
            if !fired.is_empty() {
                tracing::trace!(count = fired.len(), "pulses fired");
            }
            self.publish();
        }
        tracing::debug!("peer session stopped");
    }

    fn on_event(&mut self, event: LinkEvent) {
        let at = now();
        match event {
            LinkEvent::InboundDirect { payload, reply } => {
                let ack = self.router.handle(&payload, at).to_value();
                match reply {
                    Some(reply) => {
                        // Publish first so the sender sees its own change.
                        self.router.tick(at);
                        self.publish();
                        if reply.send(ack).is_err() {
                            tracing::debug!("reply handler dropped before ack");
                        }
                    }
                    None => {
                        self.transport.send(ack);
                    }
                }
            }
            LinkEvent::InboundDurable(payload) => {
                self.router.handle(&payload, at);
            }
            LinkEvent::Reachability(reachable) => {
                let link = self.transport.on_reachability_changed(reachable);
                self.router.set_link(link);
            }
            LinkEvent::Activation { activated, error } => {
                let link = self
                    .transport
                    .on_activation_complete(activated, error.as_deref());
                self.router.set_link(link);
            }
            LinkEvent::TestHaptics => {
                self.router
                    .play_test(self.haptics.strength, self.haptics.count, at);
            }
            LinkEvent::Trigger {
                pattern_id,
                variant,
            } => {
                self.router.trigger(&pattern_id, variant.as_deref(), at);
            }
            LinkEvent::Send(payload) => {
                self.transport.send(payload);
            }
            LinkEvent::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    fn publish(&self) {
        let next = self.router.snapshot();
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

// ─── PeerSessionHandle ────────────────────────────────────────────────────

/// Cloneable entry point into a running [`PeerSession`]. Every method
/// returns as soon as the event is queued.
#[derive(Clone)]
pub struct PeerSessionHandle {
    tx: mpsc::UnboundedSender<LinkEvent>,
    snapshot: watch::Receiver<PresentationSnapshot>,
    transport: TransportAdapter,
}

impl PeerSessionHandle {
    pub fn post(&self, event: LinkEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| LinkError::SessionClosed)
    }

    /// Deliver a direct message and wait for its acknowledgment.
    pub fn inbound_direct(&self, payload: Value) -> impl Future<Output = Result<Value>> + Send {
        let (reply, rx) = oneshot::channel();
        let posted = self.post(LinkEvent::InboundDirect {
            payload,
            reply: Some(reply),
        });
        async move {
            posted?;
            rx.await.map_err(|_| LinkError::SessionClosed)
        }
    }

    pub fn inbound_direct_no_reply(&self, payload: Value) -> Result<()> {
        self.post(LinkEvent::InboundDirect {
            payload,
            reply: None,
        })
    }

    pub fn inbound_durable(&self, payload: Value) -> Result<()> {
        self.post(LinkEvent::InboundDurable(payload))
    }

    pub fn reachability_changed(&self, reachable: bool) -> Result<()> {
        self.post(LinkEvent::Reachability(reachable))
    }

    pub fn activation_complete(&self, activated: bool, error: Option<String>) -> Result<()> {
        self.post(LinkEvent::Activation { activated, error })
    }

    pub fn test_haptics(&self) -> Result<()> {
        self.post(LinkEvent::TestHaptics)
    }

    pub fn trigger(&self, pattern_id: impl Into<String>, variant: Option<String>) -> Result<()> {
        self.post(LinkEvent::Trigger {
            pattern_id: pattern_id.into(),
            variant,
        })
    }

    pub fn send(&self, payload: Value) -> Result<()> {
        self.post(LinkEvent::Send(payload))
    }

    /// Wait until every event posted so far has been applied.
    pub async fn flush(&self) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.post(LinkEvent::Flush(done))?;
        rx.await.map_err(|_| LinkError::SessionClosed)
    }

    /// Wait until the current run has finished and no direct send is in
    /// flight.
    pub async fn settle(&self) -> Result<()> {
        self.flush().await?;
        let mut rx = self.snapshot.clone();
        rx.wait_for(|s| !s.busy)
            .await
            .map_err(|_| LinkError::SessionClosed)?;
        self.transport.idle().await;
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<PresentationSnapshot> {
        self.snapshot.clone()
    }

    pub fn snapshot(&self) -> PresentationSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn transport(&self) -> &TransportAdapter {
        &self.transport
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
