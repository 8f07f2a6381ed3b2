use crate::catalog::PatternDefinition;
use crate::types::{Intensity, PulseSpec};
use serde::{Deserialize, Serialize};

use Intensity::{Light, Medium, Strong, Success};

// ---------------------------------------------------------------------------
// Cue
// ---------------------------------------------------------------------------

/// Coarse category of a free-text notification, derived from the emoji the
/// companion app puts in its feedback strings.
///
/// Used when a notification arrives without an explicit pattern id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Warning,
    Positive,
    Neutral,
    Suggestion,
    Notice,
}

/// Marker table in priority order; the first cue with a matching marker wins.
const MARKERS: &[(Cue, &[&str])] = &[
    (Cue::Warning, &["🚀", "⏰"]),
    (Cue::Positive, &["💕", "🎉", "✨"]),
    (Cue::Neutral, &["😊", "📈", "⚡"]),
    (Cue::Suggestion, &["💡", "💭"]),
];

impl Cue {
    pub fn classify(text: &str) -> Cue {
        MARKERS
            .iter()
            .find(|(_, markers)| markers.iter().any(|m| text.contains(m)))
            .map(|(cue, _)| *cue)
            .unwrap_or(Cue::Notice)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cue::Warning => "warning",
            Cue::Positive => "positive",
            Cue::Neutral => "neutral",
            Cue::Suggestion => "suggestion",
            Cue::Notice => "notice",
        }
    }

    pub fn pattern(self) -> PatternDefinition {
        let p = PulseSpec::new;
        let pulses = match self {
            Cue::Warning => vec![p(Strong, 0), p(Medium, 100), p(Strong, 200)],
            Cue::Positive => vec![p(Success, 0), p(Success, 300)],
            Cue::Neutral => vec![p(Medium, 0)],
            Cue::Suggestion => vec![p(Light, 0), p(Light, 150)],
            Cue::Notice => vec![p(Strong, 0)],
        };
        // Every arm above is non-empty and sorted.
        PatternDefinition::new(format!("cue:{}", self.as_str()), self.as_str(), pulses)
            .unwrap_or_else(|_| PatternDefinition::fallback())
    }
}
