pub mod analysis;
pub mod catalog;
pub mod config;
pub mod cue;
pub mod error;
pub mod io;
pub mod ledger;
pub mod protocol;
pub mod router;
pub mod sequencer;
pub mod state;
pub mod timeline;
pub mod types;

pub use catalog::{PatternCatalog, PatternDefinition, PatternSummary};
pub use error::{HapticError, Result};
pub use router::{MessageRouter, RouterOptions};
pub use sequencer::{HapticOutput, HapticSequencer};
pub use state::{CoachingState, LinkStatus, PresentationSnapshot};
pub use types::{HapticStrength, Intensity, PulseSpec};
