use crate::output::print_json;
use haptic_core::analysis::{self, ParsedFeedback};

pub fn run(text: &str, json: bool) -> anyhow::Result<()> {
    let parsed = analysis::parse(text);
    if json {
        return print_json(&parsed);
    }

    match parsed {
        ParsedFeedback::Metrics(reading) => {
            let show = |v: Option<u8>| v.map(|n| format!("{n}%")).unwrap_or_else(|| "-".into());
            println!("likability: {}", show(reading.likability));
            println!("interest:   {}", show(reading.interest));
        }
        ParsedFeedback::Freeform { feedback } => println!("feedback: {feedback}"),
    }
    Ok(())
}
