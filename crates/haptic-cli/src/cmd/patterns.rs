use crate::output::{print_json, print_table};
use haptic_core::PatternCatalog;

pub fn run(json: bool) -> anyhow::Result<()> {
    let catalog = PatternCatalog::builtin()?;

    if json {
        return print_json(&catalog.summaries());
    }

    let rows = catalog
        .summaries()
        .into_iter()
        .map(|p| {
            let pulses = p
                .pulses
                .iter()
                .map(|s| format!("{}@{}", s.intensity, s.offset_ms))
                .collect::<Vec<_>>()
                .join(" ");
            vec![
                p.id,
                p.name,
                pulses,
                p.mirror_on
                    .map(|m| format!("mirrors on \"{m}\""))
                    .unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "PULSES", "VARIANT"], rows);
    Ok(())
}
