//! DSP Error Types

use thiserror::Error;

/// Errors that can occur during EQ control operations
///
/// None of these are fatal: the rejected operation leaves the equalizer
/// exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Invalid band index: {0} (must be 0-9)")]
    InvalidBandIndex(usize),

    #[error("Invalid gain: {0}dB (must be -15 to +15)")]
    InvalidGain(f32),

    #[error("Unrecognized preset: {0:?}")]
    UnrecognizedPreset(String),

    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(u32),

    #[error("Invalid filter coefficients for frequency {frequency}Hz at sample rate {sample_rate}Hz")]
    InvalidCoefficients { frequency: f32, sample_rate: u32 },
}
