//! Audio Processor Trait
//!
//! Interface for in-place stages of the int16 playback path, so a pipeline
//! can hold the equalizer (or its audio-side half) next to other stages
//! without knowing which one it has.

/// A stage that filters interleaved stereo int16 audio in place
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no network, no mutex locks, no logging)
/// - Constant or O(n) time complexity where n = buffer size
///
/// Violating these rules causes audio dropouts ("glitches").
pub trait AudioProcessor: Send {
    /// Process audio buffer in-place
    ///
    /// Buffer format is interleaved: [L0, R0, L1, R1, ...]
    fn process(&mut self, buffer: &mut [i16]);

    /// Reset internal state (delay lines)
    fn reset(&mut self);

    /// Human-readable name for logs
    fn name(&self) -> &'static str;

    /// Whether this processor currently modifies audio
    fn is_enabled(&self) -> bool {
        true
    }
}

impl AudioProcessor for crate::Equalizer {
    fn process(&mut self, buffer: &mut [i16]) {
        self.process_interleaved(buffer);
    }

    fn reset(&mut self) {
        crate::Equalizer::reset(self);
    }

    fn name(&self) -> &'static str {
        "10-Band Graphic EQ"
    }

    fn is_enabled(&self) -> bool {
        crate::Equalizer::is_enabled(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Equalizer;

    /// Test processor that just inverts audio
    struct InvertProcessor;

    impl AudioProcessor for InvertProcessor {
        fn process(&mut self, buffer: &mut [i16]) {
            for sample in buffer.iter_mut() {
                *sample = sample.saturating_neg();
            }
        }

        fn reset(&mut self) {}

        fn name(&self) -> &'static str {
            "Inverter"
        }
    }

    fn run_chain(stages: &mut [Box<dyn AudioProcessor>], buffer: &mut [i16]) {
        for stage in stages.iter_mut() {
            if stage.is_enabled() {
                stage.process(buffer);
            }
        }
    }

    #[test]
    fn test_default_is_enabled() {
        assert!(InvertProcessor.is_enabled());
    }

    #[test]
    fn test_eq_as_trait_object() {
        let mut stages: Vec<Box<dyn AudioProcessor>> =
            vec![Box::new(Equalizer::new()), Box::new(InvertProcessor)];

        let mut buffer = [500_i16, -500, 300, -300];
        run_chain(&mut stages, &mut buffer);

        assert_eq!(stages[0].name(), "10-Band Graphic EQ");
        // After inversion the left channel of a positive DC input is negative
        assert!(buffer[0] < 0);
        assert!(buffer[1] > 0);
    }

    #[test]
    fn test_disabled_eq_skipped() {
        let mut eq = Equalizer::new();
        eq.set_enabled(false);
        let mut stages: Vec<Box<dyn AudioProcessor>> = vec![Box::new(eq)];

        let mut buffer = [500_i16, -500];
        run_chain(&mut stages, &mut buffer);
        assert_eq!(buffer, [500, -500]);
    }

    #[test]
    fn test_reset_through_trait() {
        let mut eq = Equalizer::new();
        let mut buffer = [9000_i16; 64];
        AudioProcessor::process(&mut eq, &mut buffer);
        assert!(!eq.cascade().is_reset());

        AudioProcessor::reset(&mut eq);
        assert!(eq.cascade().is_reset());
    }
}
