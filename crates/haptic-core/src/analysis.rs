use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// ParsedFeedback
// ---------------------------------------------------------------------------

/// Result of reading a feedback string.
///
/// Serializes to the flat metric map the companion app expects, e.g.
/// `{"likability":78,"interest":92}` or `{"feedback":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParsedFeedback {
    Metrics(MetricReading),
    Freeform { feedback: String },
}

/// Metrics found in a labelled feedback string. `None` means the label was
/// absent or its number could not be read; the caller keeps its old value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricReading {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likability: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest: Option<u8>,
}

#[derive(Clone, Copy)]
enum Metric {
    Likability,
    Interest,
}

fn field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(호감도|likability|관심도|interest)\s*:\s*(.*?)\s*%?\s*$")
            .expect("static regex")
    })
}

fn metric_for(label: &str) -> Metric {
    match label.to_lowercase().as_str() {
        "호감도" | "likability" => Metric::Likability,
        _ => Metric::Interest,
    }
}

/// Read `"호감도: 78%, 관심도: 92%"`-style text.
///
/// Fields are comma separated, each `label: number%`. Labels may be Korean
/// or English. When no field carries a known label the whole text is
/// returned as freeform feedback. Numbers above 100 are clamped.
pub fn parse(text: &str) -> ParsedFeedback {
    let re = field_re();
    let mut reading = MetricReading::default();
    let mut labelled = false;

    for component in text.split(',') {
        let Some(caps) = re.captures(component) else {
            continue;
        };
        labelled = true;
        let value = caps[2].trim().parse::<u32>().ok().map(|n| n.min(100) as u8);
        match metric_for(&caps[1]) {
            Metric::Likability => reading.likability = value.or(reading.likability),
            Metric::Interest => reading.interest = value.or(reading.interest),
        }
    }

    if labelled {
        ParsedFeedback::Metrics(reading)
    } else {
        ParsedFeedback::Freeform {
            feedback: text.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
