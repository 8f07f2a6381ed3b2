use crate::error::{HapticError, Result};
use crate::types::{HapticStrength, Intensity, PulseSpec};
use serde::Serialize;
use std::collections::HashMap;

use Intensity::{Light, Medium, Strong, Success};

/// Id reported for the single-pulse pattern used on a catalog miss.
pub const DEFAULT_PATTERN_ID: &str = "default";

/// Id reported for the generated haptic test sequence.
pub const TEST_PATTERN_ID: &str = "test";

/// Gap between repetitions of the haptic test sequence.
const TEST_REPEAT_MS: u32 = 700;

// ---------------------------------------------------------------------------
// PatternDefinition
// ---------------------------------------------------------------------------

/// A named, fixed sequence of timed pulses.
///
/// Construction through [`PatternDefinition::new`] guarantees at least one
/// pulse and non-decreasing offsets, so nothing downstream re-checks either.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternDefinition {
    id: String,
    name: String,
    pulses: Vec<PulseSpec>,
    /// Variant substring that selects the mirrored intensity ordering.
    #[serde(skip_serializing_if = "Option::is_none")]
    mirror_on: Option<String>,
}

impl PatternDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        pulses: Vec<PulseSpec>,
    ) -> Result<Self> {
        let id = id.into();
        if pulses.is_empty() {
            return Err(HapticError::EmptyPattern(id));
        }
        for (index, pair) in pulses.windows(2).enumerate() {
            if pair[1].offset_ms < pair[0].offset_ms {
                return Err(HapticError::UnorderedPattern {
                    id,
                    index: index + 1,
                    offset_ms: pair[1].offset_ms,
                    previous_ms: pair[0].offset_ms,
                });
            }
        }
        Ok(Self {
            id,
            name: name.into(),
            pulses,
            mirror_on: None,
        })
    }

    /// Mark this pattern as having a mirrored variant selected whenever the
    /// trigger's variant tag contains `marker`.
    pub fn with_mirror_variant(mut self, marker: impl Into<String>) -> Self {
        self.mirror_on = Some(marker.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pulses(&self) -> &[PulseSpec] {
        &self.pulses
    }

    pub fn mirror_marker(&self) -> Option<&str> {
        self.mirror_on.as_deref()
    }

    /// Offset of the last pulse; the run's nominal length.
    pub fn span_ms(&self) -> u32 {
        self.pulses.last().map(|p| p.offset_ms).unwrap_or(0)
    }

    /// Same timing, intensities in reverse order.
    pub fn mirrored(&self) -> Self {
        let pulses = self
            .pulses
            .iter()
            .zip(self.pulses.iter().rev())
            .map(|(slot, source)| PulseSpec::new(source.intensity, slot.offset_ms))
            .collect();
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            pulses,
            mirror_on: self.mirror_on.clone(),
        }
    }

    /// The single medium pulse played when a pattern id is unknown.
    pub fn fallback() -> Self {
        Self {
            id: DEFAULT_PATTERN_ID.to_string(),
            name: "default".to_string(),
            pulses: vec![PulseSpec::new(Medium, 0)],
            mirror_on: None,
        }
    }

    /// The settings-driven test sequence: `count` repetitions, 700ms apart.
    ///
    /// `count` is clamped into 1..=4.
    pub fn test_sequence(strength: HapticStrength, count: u8) -> Self {
        let count = u32::from(count.clamp(1, 4));
        let (first, second, gap) = match strength {
            HapticStrength::Basic => (Medium, Strong, 50),
            HapticStrength::Strong => (Strong, Medium, 100),
        };
        let pulses = (0..count)
            .flat_map(|i| {
                let base = i * TEST_REPEAT_MS;
                [PulseSpec::new(first, base), PulseSpec::new(second, base + gap)]
            })
            .collect();
        Self {
            id: TEST_PATTERN_ID.to_string(),
            name: format!("test ({strength})"),
            pulses,
            mirror_on: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PatternCatalog
// ---------------------------------------------------------------------------

/// Read-only registry of coaching patterns, keyed by id.
///
/// Built once at startup and shared behind an `Arc`; there is no mutation API.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    patterns: Vec<PatternDefinition>,
    index: HashMap<String, usize>,
}

impl PatternCatalog {
    pub fn from_patterns(patterns: Vec<PatternDefinition>) -> Result<Self> {
        let mut index = HashMap::with_capacity(patterns.len());
        for (i, p) in patterns.iter().enumerate() {
            if index.insert(p.id.clone(), i).is_some() {
                return Err(HapticError::DuplicatePattern(p.id.clone()));
            }
        }
        Ok(Self { patterns, index })
    }

    /// The eight coaching patterns shipped with the product, checked the same
    /// way as any other catalog.
    pub fn builtin() -> Result<Self> {
        Self::from_patterns(builtin_definitions()?)
    }

    pub fn lookup(&self, id: &str) -> Option<&PatternDefinition> {
        self.index.get(id).map(|&i| &self.patterns[i])
    }

    /// Resolve a trigger request to the concrete pulse list to play.
    ///
    /// Unknown ids degrade to [`PatternDefinition::fallback`]. The variant tag
    /// only matters for patterns registered with a mirror marker.
    pub fn resolve(&self, id: &str, variant: Option<&str>) -> PatternDefinition {
        let Some(def) = self.lookup(id) else {
            tracing::debug!(pattern_id = id, "unknown pattern, using default pulse");
            return PatternDefinition::fallback();
        };
        match (def.mirror_marker(), variant) {
            (Some(marker), Some(v)) if v.contains(marker) => def.mirrored(),
            _ => def.clone(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternDefinition> {
        self.patterns.iter()
    }

    /// Listing view of every pattern, in catalog order.
    pub fn summaries(&self) -> Vec<PatternSummary> {
        self.patterns.iter().map(PatternSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

// ---------------------------------------------------------------------------
// PatternSummary
// ---------------------------------------------------------------------------

/// Serializable listing entry for a pattern, as shown by `patterns` and
/// `/api/patterns`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSummary {
    pub id: String,
    pub name: String,
    pub pulses: Vec<PulseSpec>,
    pub mirror_on: Option<String>,
    pub span_ms: u32,
}

impl From<&PatternDefinition> for PatternSummary {
    fn from(def: &PatternDefinition) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            pulses: def.pulses.clone(),
            mirror_on: def.mirror_on.clone(),
            span_ms: def.span_ms(),
        }
    }
}

/// Product-defined constants.
fn builtin_definitions() -> Result<Vec<PatternDefinition>> {
    let p = PulseSpec::new;
    let def = |id: &str, name: &str, pulses: Vec<PulseSpec>| {
        PatternDefinition::new(id, name, pulses)
    };
    Ok(vec![
        def("S1", "speed control", vec![p(Strong, 0), p(Strong, 200), p(Strong, 400)])?,
        def("L1", "listening", vec![p(Light, 0), p(Medium, 350), p(Strong, 700)])?,
        def("F1", "topic change", vec![p(Success, 0)])?,
        def("R1", "likability up", vec![p(Light, 0), p(Medium, 250), p(Success, 500)])?,
        def("F2", "silence management", vec![p(Light, 0), p(Medium, 450)])?,
        def("S2", "volume control", vec![p(Light, 0), p(Strong, 350)])?.with_mirror_variant("loud"),
        def("R2", "interest down", vec![p(Strong, 0), p(Strong, 250)])?,
        def("L3", "question suggestion", vec![p(Light, 0), p(Light, 160), p(Success, 550)])?,
    ])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const IDS: [&str; 8] = ["S1", "S2", "L1", "L3", "F1", "F2", "R1", "R2"];

    fn intensities(def: &PatternDefinition) -> Vec<Intensity> {
        def.pulses().iter().map(|p| p.intensity).collect()
    }

    fn offsets(def: &PatternDefinition) -> Vec<u32> {
        def.pulses().iter().map(|p| p.offset_ms).collect()
    }

    fn builtin() -> PatternCatalog {
        PatternCatalog::builtin().unwrap()
    }

    #[test]
    fn summary_carries_span_and_mirror() {
        let summaries = builtin().summaries();
        assert_eq!(summaries.len(), 8);
        let s2 = summaries.iter().find(|s| s.id == "S2").unwrap();
        assert_eq!(s2.mirror_on.as_deref(), Some("loud"));
        assert_eq!(s2.span_ms, 350);
        let v = serde_json::to_value(&summaries[0]).unwrap();
        assert_eq!(v["id"], "S1");
        assert_eq!(v["span_ms"], 400);
        assert!(v["mirror_on"].is_null());
    }

    #[test]
    fn builtin_has_the_eight_coaching_patterns() {
        let catalog = builtin();
        assert_eq!(catalog.len(), 8);
        for id in IDS {
            let def = catalog.lookup(id).unwrap_or_else(|| panic!("missing {id}"));
            assert!(!def.pulses().is_empty());
            let offs = offsets(def);
            assert!(offs.windows(2).all(|w| w[0] <= w[1]), "{id} unsorted");
        }
    }

    #[test]
    fn pulse_shapes_are_distinct() {
        let catalog = builtin();
        for (i, a) in IDS.iter().enumerate() {
            for b in &IDS[i + 1..] {
                assert_ne!(
                    catalog.lookup(a).unwrap().pulses(),
                    catalog.lookup(b).unwrap().pulses(),
                    "{a} and {b} share a shape"
                );
            }
        }
    }

    #[test]
    fn speed_control_is_three_strong_pulses() {
        let catalog = builtin();
        let s1 = catalog.lookup("S1").unwrap();
        assert_eq!(intensities(s1), vec![Strong, Strong, Strong]);
        assert_eq!(offsets(s1), vec![0, 200, 400]);
    }

    #[test]
    fn question_suggestion_ends_long() {
        let catalog = builtin();
        let l3 = catalog.lookup("L3").unwrap();
        assert_eq!(intensities(l3), vec![Light, Light, Success]);
        assert_eq!(offsets(l3), vec![0, 160, 550]);
        assert_eq!(l3.span_ms(), 550);
    }

    #[test]
    fn unknown_id_resolves_to_single_medium_pulse() {
        let catalog = builtin();
        assert!(catalog.lookup("Z9").is_none());
        let def = catalog.resolve("Z9", None);
        assert_eq!(def.id(), DEFAULT_PATTERN_ID);
        assert_eq!(def.pulses(), &[PulseSpec::new(Medium, 0)]);
    }

    #[test]
    fn volume_variant_mirrors_intensity_not_timing() {
        let catalog = builtin();
        let quiet = catalog.resolve("S2", Some("volume_quiet"));
        let loud = catalog.resolve("S2", Some("volume_loud"));
        assert_eq!(intensities(&quiet), vec![Light, Strong]);
        assert_eq!(intensities(&loud), vec![Strong, Light]);
        assert_eq!(offsets(&quiet), offsets(&loud));
    }

    #[test]
    fn variant_is_ignored_for_patterns_without_mirror() {
        let catalog = builtin();
        let plain = catalog.resolve("L1", None);
        let tagged = catalog.resolve("L1", Some("loud"));
        assert_eq!(plain, tagged);
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let err = PatternDefinition::new("X", "empty", vec![]).unwrap_err();
        assert!(matches!(err, HapticError::EmptyPattern(id) if id == "X"));
    }

    #[test]
    fn unordered_pattern_is_rejected() {
        let err = PatternDefinition::new(
            "X",
            "backwards",
            vec![PulseSpec::new(Light, 100), PulseSpec::new(Light, 50)],
        )
        .unwrap_err();
        assert!(matches!(err, HapticError::UnorderedPattern { index: 1, .. }));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let a = PatternDefinition::new("A", "a", vec![PulseSpec::new(Light, 0)]).unwrap();
        let err = PatternCatalog::from_patterns(vec![a.clone(), a]).unwrap_err();
        assert!(matches!(err, HapticError::DuplicatePattern(_)));
    }

    #[test]
    fn test_sequence_repeats_every_700ms() {
        let basic = PatternDefinition::test_sequence(HapticStrength::Basic, 2);
        assert_eq!(offsets(&basic), vec![0, 50, 700, 750]);
        assert_eq!(intensities(&basic), vec![Medium, Strong, Medium, Strong]);

        let strong = PatternDefinition::test_sequence(HapticStrength::Strong, 1);
        assert_eq!(offsets(&strong), vec![0, 100]);
        assert_eq!(intensities(&strong), vec![Strong, Medium]);
    }

    #[test]
    fn test_sequence_clamps_count() {
        assert_eq!(PatternDefinition::test_sequence(HapticStrength::Basic, 0).pulses().len(), 2);
        assert_eq!(PatternDefinition::test_sequence(HapticStrength::Basic, 9).pulses().len(), 8);
    }
}
