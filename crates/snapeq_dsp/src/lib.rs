//! snapeq DSP - 10-Band Graphic Equalizer
//!
//! This crate provides the equalizer that sits inline in the playback path:
//! - Peaking-EQ biquad coefficient generation (RBJ cookbook form)
//! - A fixed 10-band cascade over interleaved int16 stereo
//! - Gain, preset and bypass controls with click-free state handling
//! - Lock-free coefficient hand-off from a control thread to the audio thread
//!
//! # Architecture
//!
//! The audio path follows a strict "no allocation in audio callback" rule.
//! Coefficients are prepared off the audio thread and swapped in whole
//! between buffers, so a buffer never mixes old and new coefficients.

mod cascade;
mod coeffs;
mod eq;
mod error;
mod presets;
mod processor;
mod realtime;
mod sample;

pub use cascade::{Cascade, DelayLine};
pub use coeffs::{generate, is_passthrough, passthrough, GainLaw};
pub use eq::{
    validate_gain, Band, EqConfig, EqUpdate, Equalizer, CENTER_FREQS, DEFAULT_Q,
    DEFAULT_SAMPLE_RATE, EQ_BANDS, MAX_GAIN_DB, MIN_GAIN_DB,
};
pub use error::DspError;
pub use presets::{Preset, PRESETS, SUBWOOFER_BOOST_GAINS};
pub use processor::AudioProcessor;
pub use realtime::{split, EqController, EqProcessor, DEFAULT_UPDATE_CAPACITY};
pub use sample::{hard_clip, to_float, to_int16};

/// Re-exported so callers can name coefficient sets without a direct dependency
pub use biquad::Coefficients;
