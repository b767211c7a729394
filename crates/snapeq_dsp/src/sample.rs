//! Sample Conversion and Hard Limiting
//!
//! The cascade runs in floating point. Samples enter as signed 16-bit
//! integers scaled by 1/32768 and leave scaled by 32767 after a hard clip
//! to [-1.0, 1.0], which absorbs gain build-up across the ten bands.
//!
//! # Numeric Semantics
//!
//! - Float to int conversion truncates toward zero (no rounding, no dither)
//! - Full-scale positive input (32767) comes back as 32766 through an
//!   identity chain because of the 32768/32767 scale asymmetry

/// Input scale: int16 -> [-1.0, 1.0)
pub const INPUT_SCALE: f32 = 32768.0;

/// Output scale: [-1.0, 1.0] -> int16
pub const OUTPUT_SCALE: f32 = 32767.0;

/// Convert an int16 sample to the normalized float range
#[inline]
pub fn to_float(sample: i16) -> f32 {
    sample as f32 / INPUT_SCALE
}

/// Hard limit to [-1.0, 1.0]
///
/// This is a brick-wall clamp, not a soft knee.
#[inline]
pub fn hard_clip(sample: f32) -> f32 {
    sample.clamp(-1.0, 1.0)
}

/// Clip and convert a float sample back to int16
///
/// `as` truncates toward zero, and maps NaN to 0.
#[inline]
pub fn to_int16(sample: f32) -> i16 {
    (hard_clip(sample) * OUTPUT_SCALE) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_float_range() {
        assert_eq!(to_float(0), 0.0);
        assert_eq!(to_float(i16::MIN), -1.0);
        assert!(to_float(i16::MAX) < 1.0);
        assert_eq!(to_float(16384), 0.5);
    }

    #[test]
    fn test_hard_clip_limits() {
        assert_eq!(hard_clip(0.25), 0.25);
        assert_eq!(hard_clip(1.5), 1.0);
        assert_eq!(hard_clip(-3.0), -1.0);
        assert_eq!(hard_clip(1.0), 1.0);
    }

    #[test]
    fn test_to_int16_truncates_toward_zero() {
        // 0.99999 * 32767 = 32766.67 -> 32766
        assert_eq!(to_int16(0.99999), 32766);
        assert_eq!(to_int16(-0.99999), -32766);
        assert_eq!(to_int16(1.0), 32767);
        assert_eq!(to_int16(-1.0), -32767);
    }

    #[test]
    fn test_to_int16_clips_overshoot() {
        assert_eq!(to_int16(4.0), 32767);
        assert_eq!(to_int16(-4.0), -32767);
    }

    #[test]
    fn test_full_scale_round_trip_within_one_lsb() {
        for sample in [i16::MAX, i16::MIN, 1, -1, 12345, -12345] {
            let back = to_int16(to_float(sample));
            assert!(
                (back as i32 - sample as i32).abs() <= 1,
                "{} came back as {}",
                sample,
                back
            );
        }
    }

    #[test]
    fn test_nan_maps_to_silence() {
        assert_eq!(to_int16(f32::NAN), 0);
    }
}
