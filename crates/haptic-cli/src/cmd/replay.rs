use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use haptic_core::config::Config;
use haptic_core::sequencer::PulseRecorder;
use haptic_core::{MessageRouter, PatternCatalog, RouterOptions};
use peer_link::{Channel, MemoryConnectivity, PeerSession, TransportAdapter};
use serde_json::Value;

use crate::output::print_json;

/// Upper bound on how long the last pattern may keep the session busy.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

pub fn run(
    config_path: &Path,
    file: &Path,
    durable: bool,
    unreachable: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(config_path).context("failed to load config")?;
    let messages = read_messages(file)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(replay(config, messages, durable, unreachable, json))
}

fn read_messages(file: &Path) -> anyhow::Result<Vec<Value>> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}: line {} is not valid JSON", file.display(), i + 1))
        })
        .collect()
}

async fn replay(
    config: Config,
    messages: Vec<Value>,
    durable: bool,
    unreachable: bool,
    json: bool,
) -> anyhow::Result<()> {
    // Room for every ack with its fallback, plus the ready announcement.
    let capacity = messages.len() * 2 + 1;
    let connectivity = MemoryConnectivity::with_capacity(!unreachable, capacity);
    let pulses = PulseRecorder::new();
    let router = MessageRouter::new(
        Arc::new(PatternCatalog::builtin()?),
        pulses.clone(),
        RouterOptions::from_config(&config),
    );
    let transport = TransportAdapter::new(Arc::new(connectivity.clone()));
    let session = PeerSession::spawn(router, transport, config.haptics.clone());

    session.reachability_changed(!unreachable)?;
    session.activation_complete(true, None)?;

    let count = messages.len();
    for message in messages {
        if durable {
            session.inbound_durable(message)?;
        } else {
            session.inbound_direct_no_reply(message)?;
        }
    }

    tokio::time::timeout(SETTLE_TIMEOUT, session.settle())
        .await
        .context("session did not settle")??;

    let snapshot = session.snapshot();
    let outbox = connectivity.outbox();
    let pulses = pulses.take();

    if json {
        return print_json(&serde_json::json!({
            "messages": count,
            "pulses": pulses,
            "outbox": outbox,
            "state": snapshot,
        }));
    }

    let acks = |channel: Channel| {
        outbox
            .iter()
            .filter(|e| e.channel == channel && e.payload["status"] == "received")
            .count()
    };
    let c = &snapshot.coaching;
    println!("replayed {count} message(s)");
    println!(
        "acks:     {} direct, {} durable",
        acks(Channel::Direct),
        acks(Channel::Durable)
    );
    println!(
        "pulses:   {}",
        pulses
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    );
    println!(
        "session:  {} ({})",
        if c.session_active { "active" } else { "idle" },
        c.session_type_label
    );
    println!(
        "metrics:  likability {}%, interest {}%, speed {}%, emotion {}",
        c.likability, c.interest, c.speaking_speed, c.emotion
    );
    if snapshot.notification_visible {
        println!("notice:   {}", snapshot.notification_text);
    }
    println!("link:     {}", snapshot.peer_label);
    Ok(())
}
