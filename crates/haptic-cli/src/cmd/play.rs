use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use haptic_core::config::Config;
use haptic_core::sequencer::TracingActuator;
use haptic_core::{HapticSequencer, PatternCatalog, PatternDefinition};

use crate::output::print_json;

pub fn run(
    config_path: &Path,
    pattern_id: Option<&str>,
    variant: Option<&str>,
    test: bool,
    json: bool,
) -> anyhow::Result<()> {
    let catalog = PatternCatalog::builtin()?;
    let pattern = if test {
        let config = Config::load(config_path).context("failed to load config")?;
        PatternDefinition::test_sequence(config.haptics.strength, config.haptics.count)
    } else {
        let id = pattern_id.context("a pattern id or --test is required")?;
        catalog.resolve(id, variant)
    };

    if !json {
        println!("playing {} ({})", pattern.id(), pattern.name());
    }

    let mut sequencer = HapticSequencer::new(Arc::new(catalog), TracingActuator);
    let start = Instant::now();
    let id = pattern.id().to_string();
    sequencer.play(pattern, start);

    let mut fired = Vec::new();
    while let Some(deadline) = sequencer.next_deadline() {
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        for pulse in sequencer.fire_due(Instant::now()) {
            let offset_ms = pulse.due.duration_since(start).as_millis() as u64;
            if !json {
                println!("{offset_ms:>5}ms  {}", pulse.intensity);
            }
            fired.push(serde_json::json!({
                "offset_ms": offset_ms,
                "intensity": pulse.intensity,
            }));
        }
    }

    if json {
        print_json(&serde_json::json!({ "pattern": id, "pulses": fired }))?;
    }
    Ok(())
}
