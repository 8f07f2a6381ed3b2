use thiserror::Error;

#[derive(Debug, Error)]
pub enum HapticError {
    #[error("pattern '{0}' has no pulses")]
    EmptyPattern(String),

    #[error("pattern '{id}' is out of order: pulse {index} at {offset_ms}ms precedes {previous_ms}ms")]
    UnorderedPattern {
        id: String,
        index: usize,
        offset_ms: u32,
        previous_ms: u32,
    },

    #[error("duplicate pattern id in catalog: {0}")]
    DuplicatePattern(String),

    #[error("invalid intensity: {0}")]
    InvalidIntensity(String),

    #[error("invalid haptic strength '{0}': expected 'basic' or 'strong'")]
    InvalidStrength(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HapticError>;
