//! snapeq Core - EQ Engine
//!
//! This crate hosts the equalizer inside a player:
//! - A control thread that owns parameter changes
//! - Command/event messages for the configuration layer
//! - Persistent JSON settings
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Configuration Layer                       │
//! │     sliders / presets ──commands──▶ EqEngine ◀──events──    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ crossbeam-channel
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Control Thread                          │
//! │   validate ─▶ build coefficients ─▶ push EqUpdate (rtrb)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ rtrb
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │        decoder ──▶ EqProcessor ──▶ output                   │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod engine;
mod error;
mod message;
mod settings;

pub use config::EngineConfig;
pub use engine::EqEngine;
pub use error::{EngineError, EngineResult};
pub use message::{Command, Event};
pub use settings::EqSettings;

// Re-export DSP types for convenience
pub use snapeq_dsp::{
    AudioProcessor, EqConfig, EqProcessor, Equalizer, GainLaw, Preset, EQ_BANDS,
};
