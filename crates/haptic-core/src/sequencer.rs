use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::catalog::{PatternCatalog, PatternDefinition};
use crate::timeline::Timeline;
use crate::types::Intensity;

// ─── HapticOutput ─────────────────────────────────────────────────────────

/// The physical actuator: emits one pulse of the given intensity, now.
pub trait HapticOutput: Send {
    fn emit(&mut self, intensity: Intensity);
}

impl<F> HapticOutput for F
where
    F: FnMut(Intensity) + Send,
{
    fn emit(&mut self, intensity: Intensity) {
        self(intensity)
    }
}

/// Actuator stand-in that only logs. Used by the server and CLI when no
/// hardware is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingActuator;

impl HapticOutput for TracingActuator {
    fn emit(&mut self, intensity: Intensity) {
        tracing::info!(%intensity, "pulse");
    }
}

/// Actuator stand-in that records every emitted pulse. Clones share the
/// same buffer, so a test can keep one clone and hand the other to a
/// sequencer.
#[derive(Debug, Default, Clone)]
pub struct PulseRecorder {
    pulses: Arc<Mutex<Vec<Intensity>>>,
}

impl PulseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pulses(&self) -> Vec<Intensity> {
        self.pulses.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn take(&self) -> Vec<Intensity> {
        self.pulses
            .lock()
            .map(|mut p| std::mem::take(&mut *p))
            .unwrap_or_default()
    }
}

impl HapticOutput for PulseRecorder {
    fn emit(&mut self, intensity: Intensity) {
        if let Ok(mut p) = self.pulses.lock() {
            p.push(intensity);
        }
    }
}

// ─── CancelToken ──────────────────────────────────────────────────────────

/// Shared cancellation flag for one run. Every scheduled pulse holds a clone
/// and checks it just before firing.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ─── Runs ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RunId(pub u64);

/// One active execution of a pattern.
#[derive(Debug)]
struct SequencerRun {
    id: RunId,
    token: CancelToken,
    remaining: usize,
}

/// A pulse that actually reached the actuator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredPulse {
    pub run: RunId,
    pub index: usize,
    pub intensity: Intensity,
    pub due: Instant,
}

struct PulseTask {
    run: RunId,
    index: usize,
    intensity: Intensity,
    token: CancelToken,
}

// ─── HapticSequencer ──────────────────────────────────────────────────────

/// Plays patterns onto a single actuator, one run at a time.
///
/// The sequencer is passive: `trigger`/`play` only put pulses on the
/// timeline and return. The owner waits until
/// [`next_deadline`](HapticSequencer::next_deadline) and calls
/// [`fire_due`](HapticSequencer::fire_due). A new trigger cancels the
/// previous run's token, so any of its pulses still on the timeline become
/// no-ops and two runs never interleave.
pub struct HapticSequencer<O> {
    catalog: Arc<PatternCatalog>,
    output: O,
    timeline: Timeline<PulseTask>,
    active: Option<SequencerRun>,
    next_run: u64,
}

impl<O: HapticOutput> HapticSequencer<O> {
    pub fn new(catalog: Arc<PatternCatalog>, output: O) -> Self {
        Self {
            catalog,
            output,
            timeline: Timeline::new(),
            active: None,
            next_run: 1,
        }
    }

    /// Resolve `pattern_id` through the catalog and play it from `now`.
    pub fn trigger(&mut self, pattern_id: &str, variant: Option<&str>, now: Instant) -> RunId {
        let pattern = self.catalog.resolve(pattern_id, variant);
        self.play(pattern, now)
    }

    /// Play an already-resolved pattern from `now`, preempting any active run.
    pub fn play(&mut self, pattern: PatternDefinition, now: Instant) -> RunId {
        if let Some(prev) = self.cancel() {
            tracing::debug!(run = prev.0, "run preempted");
        }

        let id = RunId(self.next_run);
        self.next_run += 1;
        let token = CancelToken::new();

        for (index, pulse) in pattern.pulses().iter().enumerate() {
            self.timeline.schedule(
                now + Duration::from_millis(u64::from(pulse.offset_ms)),
                PulseTask {
                    run: id,
                    index,
                    intensity: pulse.intensity,
                    token: token.clone(),
                },
            );
        }

        tracing::info!(
            run = id.0,
            pattern = pattern.id(),
            pulses = pattern.pulses().len(),
            "run started"
        );
        self.active = Some(SequencerRun {
            id,
            remaining: pattern.pulses().len(),
            token,
        });
        id
    }

    /// Cancel the active run, if any. Its unfired pulses stay on the
    /// timeline and are skipped when they come due.
    pub fn cancel(&mut self) -> Option<RunId> {
        let run = self.active.take()?;
        run.token.cancel();
        Some(run.id)
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timeline.next_deadline()
    }

    /// Fire every pulse due at `now`, in due order, skipping cancelled ones.
    pub fn fire_due(&mut self, now: Instant) -> Vec<FiredPulse> {
        let mut fired = Vec::new();
        while let Some((due, task)) = self.timeline.pop_due(now) {
            if task.token.is_cancelled() {
                continue;
            }
            self.output.emit(task.intensity);
            fired.push(FiredPulse {
                run: task.run,
                index: task.index,
                intensity: task.intensity,
                due,
            });

            let finished = match self.active.as_mut() {
                Some(run) if run.id == task.run => {
                    run.remaining = run.remaining.saturating_sub(1);
                    run.remaining == 0
                }
                _ => false,
            };
            if finished {
                tracing::debug!(run = task.run.0, "run complete");
                self.active = None;
            }
        }
        fired
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
