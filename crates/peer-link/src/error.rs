use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("peer is not reachable")]
    Unreachable,

    #[error("direct send failed: {0}")]
    Direct(String),

    #[error("durable send failed: {0}")]
    Durable(String),

    #[error("peer session has shut down")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, LinkError>;
