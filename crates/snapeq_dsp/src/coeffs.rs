//! Peaking-EQ Coefficient Generator
//!
//! Derives the five normalized coefficients of one biquad section from a
//! band's center frequency, Q and gain, following the RBJ Audio EQ Cookbook
//! peaking form with the gain scaling applied by hand.
//!
//! Coefficients are stored in `biquad::Coefficients` with `a0` divided out,
//! so the stored form is `{b0, b1, b2, a1, a2}` and `a0 == 1`.

use std::f32::consts::PI;

use biquad::{Coefficients, Hertz};
use serde::{Deserialize, Serialize};

use crate::eq::Band;
use crate::error::DspError;

/// Mapping from a band's `gain_db` to the amplitude `A` used in the section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GainLaw {
    /// `A = 10^(dB/20)`: the device's historical tuning.
    /// The response peak at the center frequency is twice `gain_db`.
    #[default]
    Reference,
    /// `A = 10^(dB/40)`: the cookbook definition.
    /// The response peak at the center frequency equals `gain_db`.
    Cookbook,
}

impl GainLaw {
    /// Amplitude `A` for a gain in dB
    #[inline]
    pub fn amplitude(self, gain_db: f32) -> f32 {
        match self {
            GainLaw::Reference => 10.0_f32.powf(gain_db / 20.0),
            GainLaw::Cookbook => 10.0_f32.powf(gain_db / 40.0),
        }
    }
}

impl std::str::FromStr for GainLaw {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reference" => Ok(GainLaw::Reference),
            "cookbook" => Ok(GainLaw::Cookbook),
            other => Err(format!("unknown gain law {other:?} (expected reference or cookbook)")),
        }
    }
}

/// Identity section: output equals input, state is carried but unused
#[inline]
pub fn passthrough() -> Coefficients<f32> {
    Coefficients {
        a1: 0.0,
        a2: 0.0,
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
    }
}

/// Whether a coefficient set is exactly the identity section
pub fn is_passthrough(coeffs: &Coefficients<f32>) -> bool {
    coeffs.b0 == 1.0 && coeffs.b1 == 0.0 && coeffs.b2 == 0.0 && coeffs.a1 == 0.0 && coeffs.a2 == 0.0
}

/// Generate the peaking-EQ section for `band` at `sample_rate_hz`
///
/// A band at 0 dB short-circuits to [`passthrough`] at any valid rate, even
/// above Nyquist. Stability is not checked
/// here: gains outside [-15, 15] dB are rejected before they reach a band.
///
/// # Errors
/// - [`DspError::InvalidSampleRate`] if the rate is zero
/// - [`DspError::InvalidCoefficients`] if the center is at or above Nyquist
pub fn generate(
    band: &Band,
    sample_rate_hz: u32,
    gain_law: GainLaw,
) -> Result<Coefficients<f32>, DspError> {
    let fs = Hertz::<f32>::from_hz(sample_rate_hz as f32)
        .map_err(|_| DspError::InvalidSampleRate(sample_rate_hz))?;

    if band.gain_db() == 0.0 {
        return Ok(passthrough());
    }

    let center = band.center_freq_hz();
    if center * 2.0 >= fs.hz() {
        return Err(DspError::InvalidCoefficients {
            frequency: center,
            sample_rate: sample_rate_hz,
        });
    }

    let omega = 2.0 * PI * center / fs.hz();
    let (sin_w, cos_w) = omega.sin_cos();
    let alpha = sin_w / (2.0 * band.q_factor());
    let a = gain_law.amplitude(band.gain_db());

    let a0 = 1.0 + alpha / a;
    Ok(Coefficients {
        b0: (1.0 + alpha * a) / a0,
        b1: (-2.0 * cos_w) / a0,
        b2: (1.0 - alpha * a) / a0,
        a1: (-2.0 * cos_w) / a0,
        a2: (1.0 - alpha / a) / a0,
    })
}
