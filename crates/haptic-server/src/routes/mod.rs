pub mod events;
pub mod haptics;
pub mod inbound;
pub mod link;
pub mod outbound;
pub mod patterns;
pub mod state;
