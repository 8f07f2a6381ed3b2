use serde::{Deserialize, Serialize};

use crate::analysis::MetricReading;
use crate::protocol::AnalysisUpdate;

// ---------------------------------------------------------------------------
// CoachingState
// ---------------------------------------------------------------------------

/// Live coaching metrics and session flags shown on the wrist.
///
/// Only the router writes this; readers get whole-struct clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachingState {
    pub likability: u8,
    pub interest: u8,
    pub speaking_speed: u8,
    pub emotion: String,
    pub feedback_text: String,
    pub session_active: bool,
    pub session_type_label: String,
}

impl Default for CoachingState {
    fn default() -> Self {
        Self {
            likability: 78,
            interest: 92,
            speaking_speed: 85,
            emotion: "긍정적".to_string(),
            feedback_text: String::new(),
            session_active: false,
            session_type_label: "소개팅".to_string(),
        }
    }
}

impl CoachingState {
    /// Apply every field present in a `realtimeAnalysis` update.
    pub fn merge_analysis(&mut self, update: &AnalysisUpdate) {
        if let Some(v) = update.likability {
            self.likability = v;
        }
        if let Some(v) = update.interest {
            self.interest = v;
        }
        if let Some(v) = update.speaking_speed {
            self.speaking_speed = v;
        }
        if let Some(v) = &update.emotion {
            self.emotion = v.clone();
        }
        if let Some(v) = &update.feedback {
            self.feedback_text = v.clone();
        }
    }

    /// Apply metrics read out of a feedback string.
    pub fn merge_reading(&mut self, reading: &MetricReading) {
        if let Some(v) = reading.likability {
            self.likability = v;
        }
        if let Some(v) = reading.interest {
            self.interest = v;
        }
    }
}

// ---------------------------------------------------------------------------
// LinkStatus
// ---------------------------------------------------------------------------

pub const PEER_LABEL_CONNECTING: &str = "연결 중...";
pub const PEER_LABEL_DISCONNECTED: &str = "연결 안됨";

/// Connection flags as last reported by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStatus {
    pub activated: bool,
    pub reachable: bool,
    /// Set once the first activation completes; before that the label reads
    /// "connecting".
    pub settled: bool,
}

impl LinkStatus {
    pub fn connected(&self) -> bool {
        self.activated && self.reachable
    }

    pub fn label(&self, device_name: &str) -> String {
        if !self.settled {
            PEER_LABEL_CONNECTING.to_string()
        } else if self.connected() {
            format!("연결됨: {device_name}")
        } else {
            PEER_LABEL_DISCONNECTED.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// PresentationSnapshot
// ---------------------------------------------------------------------------

/// Everything the presentation layer may read, captured at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationSnapshot {
    pub coaching: CoachingState,
    pub notification_visible: bool,
    pub notification_text: String,
    pub navigate_to_session: bool,
    pub connected: bool,
    pub peer_label: String,
    /// A pattern run is in progress.
    pub busy: bool,
}

impl Default for PresentationSnapshot {
    fn default() -> Self {
        Self {
            coaching: CoachingState::default(),
            notification_visible: false,
            notification_text: String::new(),
            navigate_to_session: false,
            connected: false,
            peer_label: PEER_LABEL_CONNECTING.to_string(),
            busy: false,
        }
    }
}
