//! `peer-link` drives the link to the wrist device.
//!
//! ```text
//! platform callbacks ──► PeerSessionHandle ──mpsc──► PeerSession task
//!                                                      │  owns MessageRouter
//!                                                      │  pulse/dismiss deadlines
//!                                                      ▼
//!                        watch::Receiver ◄── PresentationSnapshot
//!                                                      │
//!                        TransportAdapter ◄── acks, announcements, outbound
//!                              │
//!                              ▼
//!                        dyn Connectivity (direct, else durable)
//! ```

pub mod connectivity;
pub mod error;
pub mod session;
pub mod transport;

pub use connectivity::{Channel, Connectivity, MemoryConnectivity, OutboxEntry};
pub use error::{LinkError, Result};
pub use session::{LinkEvent, PeerSession, PeerSessionHandle};
pub use transport::{Delivery, Dispatch, TransportAdapter};
