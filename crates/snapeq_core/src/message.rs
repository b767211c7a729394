//! Message Types for Thread Communication
//!
//! Commands flow from the configuration layer -> control thread
//! Events flow from the control thread -> configuration layer

use serde::{Deserialize, Serialize};

use crate::settings::EqSettings;

/// Commands sent to the EQ control thread
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set gain for a single band (band_index, gain_db)
    SetBandGain { band: usize, gain_db: f32 },

    /// Apply a preset by display name
    ApplyPreset(String),

    /// Enable (true) or bypass (false) the equalizer
    SetEnabled(bool),

    /// The stream's real sample rate is known or has changed
    Reinitialize(u32),

    /// Request current state; the StateUpdate echoes the sequence number
    RequestState(u64),

    /// Stop the control thread
    Shutdown,
}

/// Events sent from the control thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// Current parameters, as accepted so far, answering `RequestState(seq)`
    StateUpdate { seq: u64, settings: EqSettings },

    /// A command was rejected; state is unchanged
    Error { message: String },

    /// Control thread exited
    Stopped,
}

impl Event {
    /// Create an error event from any error type
    pub fn error<E: std::fmt::Display>(err: E) -> Self {
        Event::Error {
            message: err.to_string(),
        }
    }
}
