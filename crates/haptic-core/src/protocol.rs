//! Wire envelopes exchanged with the companion device.
//!
//! Every envelope is a flat JSON object with an `action` string and a
//! `timestamp` (seconds since the Unix epoch, floating point). Field names
//! are fixed by the companion app and must not change. Inbound payloads are
//! decoded exactly once, here, into [`Command`]; everything past this module
//! works with typed values.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Echoed when an inbound payload has no usable `action` field.
pub const UNKNOWN_ACTION: &str = "unknown";

/// `status` value of every acknowledgment.
pub const ACK_STATUS: &str = "received";

/// Action of the one-shot announcement sent after the link first activates.
pub const PEER_READY_ACTION: &str = "watchConnected";

/// Current wall-clock time in wire format.
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A recognized inbound action with its required fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Command {
    #[serde(rename = "startSession")]
    StartSession {
        #[serde(rename = "sessionType")]
        session_type: String,
    },
    #[serde(rename = "stopSession")]
    StopSession,
    #[serde(rename = "hapticFeedback")]
    HapticFeedback { message: String },
    #[serde(rename = "hapticFeedbackWithPattern")]
    HapticFeedbackWithPattern {
        message: String,
        pattern: String,
        category: String,
        #[serde(rename = "patternId")]
        pattern_id: String,
    },
    #[serde(rename = "realtimeAnalysis")]
    RealtimeAnalysis(AnalysisUpdate),
}

impl Command {
    pub const ACTIONS: &'static [&'static str] = &[
        "startSession",
        "stopSession",
        "hapticFeedback",
        "hapticFeedbackWithPattern",
        "realtimeAnalysis",
    ];

    pub fn is_known(action: &str) -> bool {
        Self::ACTIONS.contains(&action)
    }

    pub fn action(&self) -> &'static str {
        match self {
            Command::StartSession { .. } => "startSession",
            Command::StopSession => "stopSession",
            Command::HapticFeedback { .. } => "hapticFeedback",
            Command::HapticFeedbackWithPattern { .. } => "hapticFeedbackWithPattern",
            Command::RealtimeAnalysis(_) => "realtimeAnalysis",
        }
    }
}

/// `realtimeAnalysis` fields. Each one is optional and applied on its own;
/// a field with the wrong JSON type is treated as absent instead of failing
/// the whole message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisUpdate {
    #[serde(default, deserialize_with = "lenient_percent", skip_serializing_if = "Option::is_none")]
    pub likability: Option<u8>,
    #[serde(default, deserialize_with = "lenient_percent", skip_serializing_if = "Option::is_none")]
    pub interest: Option<u8>,
    #[serde(default, deserialize_with = "lenient_percent", skip_serializing_if = "Option::is_none")]
    pub speaking_speed: Option<u8>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Integers (or integral floats) clamped into 0..=100; anything else is `None`.
fn lenient_percent<'de, D>(d: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    let n = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64));
    Ok(n.map(|n| n.clamp(0, 100) as u8))
}

fn lenient_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok(value.as_str().map(str::to_owned))
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Why an inbound payload produced no command. None of these are errors to
/// the sender; they are logged and acknowledged like any other message.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    NotAnObject,
    MissingAction,
    Unrecognized(String),
    Malformed { action: String, reason: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotAnObject => f.write_str("payload is not a JSON object"),
            Rejection::MissingAction => f.write_str("payload has no action"),
            Rejection::Unrecognized(a) => write!(f, "unrecognized action '{a}'"),
            Rejection::Malformed { action, reason } => write!(f, "malformed '{action}': {reason}"),
        }
    }
}

/// A decoded inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    /// The raw `action` string, when present, recognized or not.
    pub action: Option<String>,
    pub timestamp: Option<f64>,
    pub command: Result<Command, Rejection>,
}

impl Inbound {
    pub fn decode(payload: &Value) -> Self {
        let Some(obj) = payload.as_object() else {
            return Self {
                action: None,
                timestamp: None,
                command: Err(Rejection::NotAnObject),
            };
        };
        let action = obj.get("action").and_then(Value::as_str).map(str::to_owned);
        let timestamp = obj.get("timestamp").and_then(Value::as_f64);

        let command = match action.as_deref() {
            None => Err(Rejection::MissingAction),
            Some(a) if !Command::is_known(a) => Err(Rejection::Unrecognized(a.to_string())),
            Some(a) => Command::deserialize(payload).map_err(|e| Rejection::Malformed {
                action: a.to_string(),
                reason: e.to_string(),
            }),
        };

        Self {
            action,
            timestamp,
            command,
        }
    }

    /// The action to echo in the acknowledgment.
    pub fn echo_action(&self) -> &str {
        self.action.as_deref().unwrap_or(UNKNOWN_ACTION)
    }
}

// ---------------------------------------------------------------------------
// Outbound envelopes
// ---------------------------------------------------------------------------

/// Receipt for an inbound message, independent of whether it was understood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub status: String,
    #[serde(rename = "action")]
    pub echoed_action: String,
    pub timestamp: f64,
    #[serde(rename = "watchAppActive")]
    pub sender_active: bool,
}

impl Ack {
    pub fn received(action: impl Into<String>, sender_active: bool) -> Self {
        Self {
            status: ACK_STATUS.to_string(),
            echoed_action: action.into(),
            timestamp: now_timestamp(),
            sender_active,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Announcement sent once when the link first activates. Receivers treat
/// repeats as no-ops, so a duplicate is harmless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerReady {
    pub action: String,
    #[serde(rename = "watchReady")]
    pub ready: bool,
    pub timestamp: f64,
}

impl PeerReady {
    pub fn now() -> Self {
        Self {
            action: PEER_READY_ACTION.to_string(),
            ready: true,
            timestamp: now_timestamp(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
