//! 10-Band Graphic Equalizer
//!
//! Ten peaking-EQ biquads in a fixed cascade, one per ISO-ish band from
//! 50 Hz to 5 kHz, driven by user-facing gains in dB.
//!
//! The [`Equalizer`] is a plain owned value: the audio pipeline stage holds
//! it and calls [`Equalizer::process`] per buffer. When control changes come
//! from another thread, split it with [`crate::split`] instead of sharing it.

use std::str::FromStr;

use biquad::Coefficients;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cascade::Cascade;
use crate::coeffs::{self, GainLaw};
use crate::error::DspError;
use crate::presets::{Preset, SUBWOOFER_BOOST_GAINS};

/// Number of bands; a permanent design constant
pub const EQ_BANDS: usize = 10;

/// Band center frequencies (Hz), lowest first
pub const CENTER_FREQS: [f32; EQ_BANDS] = [
    50.0,   // Sub-bass
    80.0,   // Bass
    125.0,  // Upper bass
    200.0,  // Low-mid
    315.0,  // Low-mid
    500.0,  // Mid
    800.0,  // Mid
    1250.0, // Upper-mid
    2000.0, // Presence
    5000.0, // Brilliance
];

/// Q of every band
pub const DEFAULT_Q: f32 = 1.0;

/// Lowest accepted band gain
pub const MIN_GAIN_DB: f32 = -15.0;

/// Highest accepted band gain
pub const MAX_GAIN_DB: f32 = 15.0;

/// Sample rate assumed until the stream reports the real one
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Reject gains outside [-15, 15] dB, NaN included
pub fn validate_gain(gain_db: f32) -> Result<(), DspError> {
    if (MIN_GAIN_DB..=MAX_GAIN_DB).contains(&gain_db) {
        Ok(())
    } else {
        Err(DspError::InvalidGain(gain_db))
    }
}

/// One equalization stage
///
/// Center frequency and Q never change after construction. The coefficients
/// are derived from them, the gain and the equalizer's sample rate.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    center_freq_hz: f32,
    q_factor: f32,
    pub(crate) gain_db: f32,
    coefficients: Coefficients<f32>,
}

impl Band {
    /// A 0 dB (identity) band
    pub fn new(center_freq_hz: f32, q_factor: f32) -> Self {
        Self {
            center_freq_hz,
            q_factor,
            gain_db: 0.0,
            coefficients: coeffs::passthrough(),
        }
    }

    pub fn center_freq_hz(&self) -> f32 {
        self.center_freq_hz
    }

    pub fn q_factor(&self) -> f32 {
        self.q_factor
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    pub fn coefficients(&self) -> &Coefficients<f32> {
        &self.coefficients
    }

    /// Copy of this band at a new gain with regenerated coefficients
    ///
    /// The gain must already be validated.
    pub(crate) fn with_gain(self, gain_db: f32, sample_rate: u32, gain_law: GainLaw) -> Self {
        let mut band = self;
        band.gain_db = gain_db;
        band.regenerate(sample_rate, gain_law);
        band
    }

    /// Recompute coefficients from the current parameters
    ///
    /// A band that cannot be realized at this rate (center at or above
    /// Nyquist) falls back to the identity section.
    pub(crate) fn regenerate(&mut self, sample_rate: u32, gain_law: GainLaw) {
        self.coefficients = match coeffs::generate(self, sample_rate, gain_law) {
            Ok(c) => c,
            Err(e) => {
                warn!("{}; band bypassed", e);
                coeffs::passthrough()
            }
        };
    }

    /// Magnitude response of this section in dB at `freq_hz`
    fn response_db(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let c = &self.coefficients;
        let w = 2.0 * std::f64::consts::PI * freq_hz / sample_rate;
        let (s1, c1) = w.sin_cos();
        let (s2, c2) = (2.0 * w).sin_cos();

        let (b0, b1, b2) = (c.b0 as f64, c.b1 as f64, c.b2 as f64);
        let (a1, a2) = (c.a1 as f64, c.a2 as f64);

        let num_re = b0 + b1 * c1 + b2 * c2;
        let num_im = -(b1 * s1 + b2 * s2);
        let den_re = 1.0 + a1 * c1 + a2 * c2;
        let den_im = -(a1 * s1 + a2 * s2);

        let num = num_re * num_re + num_im * num_im;
        let den = den_re * den_re + den_im * den_im;
        10.0 * (num / den).log10()
    }
}

/// Serializable equalizer parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqConfig {
    pub gains: [f32; EQ_BANDS],
    pub enabled: bool,
    pub sample_rate: u32,
    pub gain_law: GainLaw,
}

impl Default for EqConfig {
    fn default() -> Self {
        Self {
            gains: SUBWOOFER_BOOST_GAINS,
            enabled: true,
            sample_rate: DEFAULT_SAMPLE_RATE,
            gain_law: GainLaw::default(),
        }
    }
}

impl EqConfig {
    /// Set gain for a specific band (0-9), rejecting out-of-range values
    pub fn set_band_gain(&mut self, band_index: usize, gain_db: f32) -> Result<(), DspError> {
        if band_index >= EQ_BANDS {
            return Err(DspError::InvalidBandIndex(band_index));
        }
        validate_gain(gain_db)?;
        self.gains[band_index] = gain_db;
        Ok(())
    }

    /// Check every gain and the sample rate
    pub fn validate(&self) -> Result<(), DspError> {
        if self.sample_rate == 0 {
            return Err(DspError::InvalidSampleRate(0));
        }
        self.gains.iter().try_for_each(|g| validate_gain(*g))
    }
}

/// A fully prepared change to an equalizer
///
/// Bands carry their regenerated coefficients, so applying an update is a
/// plain copy: no math, no allocation, no logging.
#[derive(Debug, Clone, Copy)]
pub enum EqUpdate {
    /// Replace one band
    Band { index: usize, band: Band },
    /// Replace all bands and set `enabled`; clears state on a false -> true edge
    Preset { bands: [Band; EQ_BANDS], enabled: bool },
    /// Set `enabled`; `true` always clears state
    Enabled(bool),
    /// New sample rate and bands; always clears state
    Reinitialize { sample_rate: u32, bands: [Band; EQ_BANDS] },
    /// Whole parameter set replacing several coalesced updates
    Snapshot {
        sample_rate: u32,
        bands: [Band; EQ_BANDS],
        enabled: bool,
        reset: bool,
    },
}

impl EqUpdate {
    /// Whether installing this update clears the delay lines
    pub fn clears_state(&self, was_enabled: bool) -> bool {
        match *self {
            EqUpdate::Band { .. } => false,
            EqUpdate::Preset { enabled, .. } => enabled && !was_enabled,
            EqUpdate::Enabled(enabled) => enabled,
            EqUpdate::Reinitialize { .. } => true,
            EqUpdate::Snapshot { reset, .. } => reset,
        }
    }
}

/// The equalizer: band parameters, cascade state and the bypass flag
///
/// # Real-time Safety
/// `process*` perform no allocations, no locking and no logging.
/// Control methods regenerate coefficients and log; call them between
/// buffers, or from another thread through [`crate::EqController`].
#[derive(Debug, Clone)]
pub struct Equalizer {
    bands: [Band; EQ_BANDS],
    cascade: Cascade,
    sample_rate: u32,
    enabled: bool,
    gain_law: GainLaw,
}

impl Equalizer {
    /// Subwoofer Boost gains, enabled, placeholder sample rate
    pub fn new() -> Self {
        Self::build(&EqConfig::default())
    }

    /// Build an equalizer from saved parameters
    pub fn from_config(config: &EqConfig) -> Result<Self, DspError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &EqConfig) -> Self {
        let bands = core::array::from_fn(|i| {
            Band::new(CENTER_FREQS[i], DEFAULT_Q).with_gain(
                config.gains[i],
                config.sample_rate,
                config.gain_law,
            )
        });

        Self {
            bands,
            cascade: Cascade::new(),
            sample_rate: config.sample_rate,
            enabled: config.enabled,
            gain_law: config.gain_law,
        }
    }

    /// Snapshot of the current parameters
    pub fn config(&self) -> EqConfig {
        EqConfig {
            gains: self.gains(),
            enabled: self.enabled,
            sample_rate: self.sample_rate,
            gain_law: self.gain_law,
        }
    }

    // ------------------------------------------------------------------
    // Planning: validate and prepare, without touching `self`
    // ------------------------------------------------------------------

    pub(crate) fn plan_band_gain(&self, index: usize, gain_db: f32) -> Result<EqUpdate, DspError> {
        let band = self
            .bands
            .get(index)
            .ok_or(DspError::InvalidBandIndex(index))?;
        validate_gain(gain_db)?;

        Ok(EqUpdate::Band {
            index,
            band: band.with_gain(gain_db, self.sample_rate, self.gain_law),
        })
    }

    pub(crate) fn plan_preset(&self, preset: Preset) -> EqUpdate {
        let bands = match preset.gains() {
            Some(gains) => core::array::from_fn(|i| {
                self.bands[i].with_gain(gains[i], self.sample_rate, self.gain_law)
            }),
            // Custom keeps the current bands as they are
            None => self.bands,
        };

        EqUpdate::Preset {
            bands,
            enabled: preset.enables(),
        }
    }

    pub(crate) fn plan_reinitialize(&self, sample_rate: u32) -> Result<EqUpdate, DspError> {
        if sample_rate == 0 {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }

        let mut bands = self.bands;
        for band in bands.iter_mut() {
            band.regenerate(sample_rate, self.gain_law);
        }

        Ok(EqUpdate::Reinitialize { sample_rate, bands })
    }

    /// Install a prepared update
    ///
    /// Real-time safe: this is what the audio side runs between buffers.
    pub fn apply_update(&mut self, update: EqUpdate) {
        let reset = update.clears_state(self.enabled);
        match update {
            EqUpdate::Band { index, band } => {
                if let Some(slot) = self.bands.get_mut(index) {
                    *slot = band;
                }
            }
            EqUpdate::Preset { bands, enabled } => {
                self.bands = bands;
                self.enabled = enabled;
            }
            EqUpdate::Enabled(enabled) => {
                self.enabled = enabled;
            }
            EqUpdate::Reinitialize { sample_rate, bands } => {
                self.sample_rate = sample_rate;
                self.bands = bands;
            }
            EqUpdate::Snapshot {
                sample_rate,
                bands,
                enabled,
                ..
            } => {
                self.sample_rate = sample_rate;
                self.bands = bands;
                self.enabled = enabled;
            }
        }
        if reset {
            self.cascade.reset();
        }
    }

    /// The whole current parameter set as one update
    pub(crate) fn snapshot(&self, reset: bool) -> EqUpdate {
        EqUpdate::Snapshot {
            sample_rate: self.sample_rate,
            bands: self.bands,
            enabled: self.enabled,
            reset,
        }
    }

    // ------------------------------------------------------------------
    // Control surface
    // ------------------------------------------------------------------

    /// Set one band's gain and regenerate that band only
    ///
    /// Out-of-range index or gain is rejected and nothing changes.
    pub fn set_band_gain(&mut self, index: usize, gain_db: f32) -> Result<(), DspError> {
        let update = self.plan_band_gain(index, gain_db).map_err(|e| {
            warn!("Rejected band gain change: {}", e);
            e
        })?;
        self.apply_update(update);

        info!(
            "Band {} ({:.0}Hz) set to {:.1}dB",
            index, CENTER_FREQS[index], gain_db
        );
        Ok(())
    }

    /// Apply a preset by its display name
    ///
    /// Unknown names are rejected with [`DspError::UnrecognizedPreset`] and
    /// leave gains, coefficients and the enabled flag untouched.
    pub fn apply_preset(&mut self, name: &str) -> Result<(), DspError> {
        let preset = Preset::from_str(name).map_err(|e| {
            warn!("{}", e);
            e
        })?;
        self.load_preset(preset);
        Ok(())
    }

    /// Apply a preset
    pub fn load_preset(&mut self, preset: Preset) {
        let update = self.plan_preset(preset);
        self.apply_update(update);
        info!("Applied preset: {}", preset);
    }

    /// Enable or bypass the whole equalizer
    ///
    /// Enabling always clears the delay lines so stale filter memory cannot
    /// produce a click. Disabling leaves them alone.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.apply_update(EqUpdate::Enabled(enabled));
        info!("EQ {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Adopt a new sample rate: clear state and regenerate every band
    ///
    /// Call once the stream's real rate is known and whenever it changes.
    pub fn reinitialize(&mut self, sample_rate: u32) -> Result<(), DspError> {
        let update = self.plan_reinitialize(sample_rate).map_err(|e| {
            warn!("Rejected re-initialization: {}", e);
            e
        })?;
        self.apply_update(update);

        info!("Initialized {}-band graphic EQ @ {} Hz", EQ_BANDS, sample_rate);
        for (i, band) in self.bands.iter().enumerate() {
            debug!(
                "Band {}: {:.0}Hz, Q={:.1}, Gain={:.1}dB",
                i, band.center_freq_hz, band.q_factor, band.gain_db
            );
        }
        Ok(())
    }

    /// Clear the delay lines without touching parameters
    pub fn reset(&mut self) {
        self.cascade.reset();
    }

    // ------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------

    /// Filter `frame_count` interleaved stereo frames in place
    ///
    /// Disabled: returns immediately, buffer untouched.
    ///
    /// # Panics
    /// Debug builds assert that the buffer holds `frame_count` frames;
    /// release builds process the whole frames that are present.
    #[inline]
    pub fn process(&mut self, samples: &mut [i16], frame_count: usize) {
        if !self.enabled {
            return;
        }
        debug_assert!(
            frame_count.saturating_mul(2) <= samples.len(),
            "buffer holds {} samples, {} frames requested",
            samples.len(),
            frame_count
        );
        let len = frame_count.saturating_mul(2).min(samples.len());
        self.cascade.process_interleaved(&self.bands, &mut samples[..len]);
    }

    /// Filter an interleaved stereo buffer `[L0, R0, L1, R1, ...]` in place
    #[inline]
    pub fn process_interleaved(&mut self, samples: &mut [i16]) {
        if !self.enabled {
            return;
        }
        self.cascade.process_interleaved(&self.bands, samples);
    }

    /// Process one float stereo frame, without the output clip
    #[inline]
    pub fn process_frame(&mut self, left: f32, right: f32) -> (f32, f32) {
        if !self.enabled {
            return (left, right);
        }
        self.cascade.process_frame(&self.bands, left, right)
    }

    // ------------------------------------------------------------------
    // Read-back
    // ------------------------------------------------------------------

    /// All gains, lowest band first
    pub fn gains(&self) -> [f32; EQ_BANDS] {
        core::array::from_fn(|i| self.bands[i].gain_db)
    }

    pub fn band(&self, index: usize) -> Option<&Band> {
        self.bands.get(index)
    }

    pub fn bands(&self) -> &[Band; EQ_BANDS] {
        &self.bands
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn gain_law(&self) -> GainLaw {
        self.gain_law
    }

    /// Filter memory, for inspection
    pub fn cascade(&self) -> &Cascade {
        &self.cascade
    }

    /// Combined magnitude response of the cascade in dB at `freq_hz`
    ///
    /// Ignores the enabled flag and the output clip.
    pub fn response_db(&self, freq_hz: f32) -> f32 {
        let fs = self.sample_rate as f64;
        self.bands
            .iter()
            .map(|b| b.response_db(freq_hz as f64, fs))
            .sum::<f64>() as f32
    }
}

impl Default for Equalizer {
    fn default() -> Self {
        Self::new()
    }
}
