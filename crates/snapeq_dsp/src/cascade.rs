//! Cascade Filter Engine
//!
//! Runs the ten bands in series over each stereo frame. Every band keeps two
//! delay taps per channel and is evaluated in direct form II:
//!
//! ```text
//! w  = x - a1*d0 - a2*d1
//! y  = b0*w + b1*d0 + b2*d1
//! d1 = d0
//! d0 = w
//! ```
//!
//! The output of band `k` is the input of band `k + 1`. Band order is fixed
//! (lowest center first) so rounding behaviour is reproducible.
//!
//! # Real-time Safety
//! The cascade holds only fixed-size arrays. Processing never allocates,
//! never locks and never logs.

use biquad::Coefficients;

use crate::eq::{Band, EQ_BANDS};
use crate::sample;

/// Two delay taps `[d0, d1]` of one band on one channel
pub type DelayLine = [f32; 2];

/// Per-band, per-channel filter memory
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cascade {
    delay_left: [DelayLine; EQ_BANDS],
    delay_right: [DelayLine; EQ_BANDS],
}

impl Cascade {
    /// Create a cascade with cleared state
    pub const fn new() -> Self {
        Self {
            delay_left: [[0.0; 2]; EQ_BANDS],
            delay_right: [[0.0; 2]; EQ_BANDS],
        }
    }

    /// Clear every delay line on both channels
    pub fn reset(&mut self) {
        self.delay_left = [[0.0; 2]; EQ_BANDS];
        self.delay_right = [[0.0; 2]; EQ_BANDS];
    }

    /// Whether all delay lines are zero
    pub fn is_reset(&self) -> bool {
        self.delay_left
            .iter()
            .chain(self.delay_right.iter())
            .all(|line| line[0] == 0.0 && line[1] == 0.0)
    }

    /// Delay lines `(left, right)` of one band
    pub fn delay_state(&self, band: usize) -> Option<(DelayLine, DelayLine)> {
        Some((*self.delay_left.get(band)?, *self.delay_right.get(band)?))
    }

    /// Run one stereo frame through all bands, float domain, no clipping
    #[inline]
    pub fn process_frame(&mut self, bands: &[Band; EQ_BANDS], left: f32, right: f32) -> (f32, f32) {
        let mut l = left;
        let mut r = right;

        for ((band, dl), dr) in bands
            .iter()
            .zip(self.delay_left.iter_mut())
            .zip(self.delay_right.iter_mut())
        {
            let c = band.coefficients();
            l = run_section(c, dl, l);
            r = run_section(c, dr, r);
        }

        (l, r)
    }

    /// Filter an interleaved int16 buffer `[L0, R0, L1, R1, ...]` in place
    ///
    /// Each channel is converted to float, cascaded, hard clipped and
    /// truncated back to int16. A trailing odd sample is left untouched.
    #[inline]
    pub fn process_interleaved(&mut self, bands: &[Band; EQ_BANDS], samples: &mut [i16]) {
        for frame in samples.chunks_exact_mut(2) {
            let (l, r) = self.process_frame(
                bands,
                sample::to_float(frame[0]),
                sample::to_float(frame[1]),
            );
            frame[0] = sample::to_int16(l);
            frame[1] = sample::to_int16(r);
        }
    }
}

impl Default for Cascade {
    fn default() -> Self {
        Self::new()
    }
}

/// One direct form II biquad step
#[inline(always)]
fn run_section(c: &Coefficients<f32>, d: &mut DelayLine, x: f32) -> f32 {
    let w = x - c.a1 * d[0] - c.a2 * d[1];
    let y = c.b0 * w + c.b1 * d[0] + c.b2 * d[1];
    d[1] = d[0];
    d[0] = w;
    y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coeffs::{self, GainLaw};
    use crate::eq::{CENTER_FREQS, DEFAULT_Q};

    fn flat_bands() -> [Band; EQ_BANDS] {
        core::array::from_fn(|i| Band::new(CENTER_FREQS[i], DEFAULT_Q))
    }

    fn boosted_bands(index: usize, gain_db: f32) -> [Band; EQ_BANDS] {
        let mut bands = flat_bands();
        bands[index] = bands[index].with_gain(gain_db, 44100, GainLaw::Reference);
        bands
    }

    #[test]
    fn test_new_cascade_is_reset() {
        assert!(Cascade::new().is_reset());
        assert!(Cascade::default().is_reset());
    }

    #[test]
    fn test_identity_bands_reproduce_input() {
        let bands = flat_bands();
        let mut cascade = Cascade::new();

        for i in 0..500 {
            let x = ((i as f32) * 0.05).sin() * 0.8;
            let (l, r) = cascade.process_frame(&bands, x, -x);
            assert_eq!(l, x);
            assert_eq!(r, -x);
        }
    }

    #[test]
    fn test_run_section_recurrence() {
        let c = Coefficients {
            a1: -0.5,
            a2: 0.25,
            b0: 1.0,
            b1: 2.0,
            b2: 3.0,
        };
        let mut d = [0.0_f32; 2];

        // n=0: w = 1, y = 1
        assert_eq!(run_section(&c, &mut d, 1.0), 1.0);
        assert_eq!(d, [1.0, 0.0]);

        // n=1: w = 0 + 0.5*1 = 0.5, y = 0.5 + 2*1 = 2.5
        assert_eq!(run_section(&c, &mut d, 0.0), 2.5);
        assert_eq!(d, [0.5, 1.0]);

        // n=2: w = 0 + 0.5*0.5 - 0.25*1 = 0, y = 0 + 2*0.5 + 3*1 = 4
        assert_eq!(run_section(&c, &mut d, 0.0), 4.0);
        assert_eq!(d, [0.0, 0.5]);
    }

    #[test]
    fn test_channels_are_independent() {
        let bands = boosted_bands(5, 6.0);
        let mut cascade = Cascade::new();

        // Signal on the left only; right must stay silent with zero state
        for i in 0..200 {
            let x = ((i as f32) * 0.07).sin() * 0.5;
            let (_, r) = cascade.process_frame(&bands, x, 0.0);
            assert_eq!(r, 0.0);
        }
        let (left, right) = cascade.delay_state(5).unwrap();
        assert_ne!(left, [0.0, 0.0]);
        assert_eq!(right, [0.0, 0.0]);
    }

    #[test]
    fn test_reset_clears_state() {
        let bands = boosted_bands(0, 12.0);
        let mut cascade = Cascade::new();
        cascade.process_frame(&bands, 0.5, 0.5);
        assert!(!cascade.is_reset());

        cascade.reset();
        assert!(cascade.is_reset());
    }

    #[test]
    fn test_interleaved_clips_build_up() {
        // +15 dB (30 dB peak) at 1250 Hz on a full-scale tone must clip, not wrap
        let bands = boosted_bands(7, 15.0);
        let mut cascade = Cascade::new();

        let mut buffer: Vec<i16> = (0..2048)
            .map(|i| {
                let t = (i / 2) as f32 / 44100.0;
                ((2.0 * std::f32::consts::PI * 1250.0 * t).sin() * 30000.0) as i16
            })
            .collect();
        cascade.process_interleaved(&bands, &mut buffer);

        let peak = buffer.iter().map(|s| (*s as i32).abs()).max().unwrap();
        assert_eq!(peak, 32767);
        assert!(buffer.iter().all(|s| *s != i16::MIN));
    }

    #[test]
    fn test_interleaved_ignores_trailing_sample() {
        let bands = flat_bands();
        let mut cascade = Cascade::new();
        let mut buffer = [100_i16, -100, 555];
        cascade.process_interleaved(&bands, &mut buffer);
        assert_eq!(buffer[2], 555);
    }

    #[test]
    fn test_delay_state_out_of_range() {
        assert!(Cascade::new().delay_state(EQ_BANDS).is_none());
    }

    #[test]
    fn test_passthrough_band_keeps_input_as_state() {
        // An identity section still records w = x in its delay line
        let bands = flat_bands();
        let mut cascade = Cascade::new();
        cascade.process_frame(&bands, 0.25, -0.25);
        let (l, r) = cascade.delay_state(0).unwrap();
        assert_eq!(l, [0.25, 0.0]);
        assert_eq!(r, [-0.25, 0.0]);
        assert!(coeffs::is_passthrough(bands[0].coefficients()));
    }
}
