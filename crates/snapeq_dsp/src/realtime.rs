//! Control / Audio Thread Split
//!
//! Control changes arrive from a configuration handler while the audio
//! callback is filtering. Instead of sharing one [`Equalizer`] behind a lock,
//! the control side keeps a shadow copy of the parameters, prepares complete
//! band sets (coefficients included) and ships them through a lock-free SPSC
//! ring buffer. The audio side drains the ring at the top of every buffer.
//!
//! ```text
//! config handler ──▶ EqController ──rtrb<EqUpdate>──▶ EqProcessor ──▶ audio
//!                    (validate, compute)              (copy, filter)
//! ```
//!
//! A buffer is filtered entirely with the coefficient set that was current
//! when it started: there are no torn reads, and the audio thread never
//! blocks or allocates.
//!
//! A valid control change never fails. When the audio side stops draining
//! and the ring fills up, further changes are folded into a single backlog
//! snapshot of the whole parameter set, which is pushed as soon as a slot
//! frees up (on the next change or on [`EqController::flush`]).

use rtrb::{Consumer, Producer, PushError, RingBuffer};
use tracing::{debug, info, warn};

use crate::eq::{Band, EqConfig, EqUpdate, Equalizer, CENTER_FREQS, EQ_BANDS};
use crate::error::DspError;
use crate::presets::Preset;
use crate::processor::AudioProcessor;

/// Default number of in-flight updates
pub const DEFAULT_UPDATE_CAPACITY: usize = 64;

/// Split an equalizer into its control and audio halves
///
/// Both halves start from the same state. `capacity` bounds the number of
/// updates that can be queued before the audio side drains them.
pub fn split(eq: Equalizer, capacity: usize) -> (EqController, EqProcessor) {
    let (producer, consumer) = RingBuffer::<EqUpdate>::new(capacity.max(1));

    let controller = EqController {
        shadow: eq.clone(),
        updates: producer,
        backlog: None,
    };
    let processor = EqProcessor {
        eq,
        updates: consumer,
    };

    (controller, processor)
}

/// Control-side half: validation, coefficient generation, read-back
///
/// Every method either accepts the change, mirrors it locally and queues it
/// for the audio side, or rejects it and changes nothing on either side.
pub struct EqController {
    shadow: Equalizer,
    updates: Producer<EqUpdate>,
    /// Changes that did not fit in the ring, folded into one snapshot
    backlog: Option<EqUpdate>,
}

impl EqController {
    /// Mirror an update into the shadow copy, then queue it
    fn submit(&mut self, update: EqUpdate) {
        let mut reset = update.clears_state(self.shadow.is_enabled());
        self.shadow.apply_update(update);

        let update = match self.backlog.take() {
            // Queued updates must stay in order, so fold into the backlog
            Some(pending) => {
                reset |= pending.clears_state(false);
                self.shadow.snapshot(reset)
            }
            None => update,
        };

        if let Err(PushError::Full(rejected)) = self.updates.push(update) {
            if !matches!(rejected, EqUpdate::Snapshot { .. }) {
                warn!("Audio side is not draining EQ updates; coalescing further changes");
            }
            self.backlog = Some(self.shadow.snapshot(reset));
        }
    }

    /// Push the backlog snapshot if the ring has room again
    ///
    /// Returns `true` once nothing is left waiting.
    pub fn flush(&mut self) -> bool {
        if let Some(pending) = self.backlog.take() {
            match self.updates.push(pending) {
                Ok(()) => debug!("EQ backlog delivered"),
                Err(PushError::Full(pending)) => self.backlog = Some(pending),
            }
        }
        self.backlog.is_none()
    }

    /// Whether changes are waiting for room in the ring
    pub fn has_backlog(&self) -> bool {
        self.backlog.is_some()
    }

    /// Set one band's gain (see [`Equalizer::set_band_gain`])
    pub fn set_band_gain(&mut self, index: usize, gain_db: f32) -> Result<(), DspError> {
        let update = self.shadow.plan_band_gain(index, gain_db).map_err(|e| {
            warn!("Rejected band gain change: {}", e);
            e
        })?;
        self.submit(update);

        info!(
            "Band {} ({:.0}Hz) set to {:.1}dB",
            index, CENTER_FREQS[index], gain_db
        );
        Ok(())
    }

    /// Apply a preset by name (see [`Equalizer::apply_preset`])
    pub fn apply_preset(&mut self, name: &str) -> Result<(), DspError> {
        let preset = name.parse::<Preset>().map_err(|e| {
            warn!("{}", e);
            e
        })?;
        self.load_preset(preset)
    }

    /// Apply a preset
    pub fn load_preset(&mut self, preset: Preset) -> Result<(), DspError> {
        let update = self.shadow.plan_preset(preset);
        self.submit(update);
        info!("Applied preset: {}", preset);
        Ok(())
    }

    /// Enable or bypass; enabling clears the audio side's delay lines
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), DspError> {
        self.submit(EqUpdate::Enabled(enabled));
        info!("EQ {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Adopt a new sample rate (see [`Equalizer::reinitialize`])
    pub fn reinitialize(&mut self, sample_rate: u32) -> Result<(), DspError> {
        let update = self.shadow.plan_reinitialize(sample_rate).map_err(|e| {
            warn!("Rejected re-initialization: {}", e);
            e
        })?;
        self.submit(update);

        info!("Initialized {}-band graphic EQ @ {} Hz", EQ_BANDS, sample_rate);
        Ok(())
    }

    /// Gains as last accepted
    pub fn gains(&self) -> [f32; EQ_BANDS] {
        self.shadow.gains()
    }

    pub fn bands(&self) -> &[Band; EQ_BANDS] {
        self.shadow.bands()
    }

    pub fn is_enabled(&self) -> bool {
        self.shadow.is_enabled()
    }

    pub fn sample_rate(&self) -> u32 {
        self.shadow.sample_rate()
    }

    /// Parameters as last accepted
    pub fn config(&self) -> EqConfig {
        self.shadow.config()
    }

    /// Combined response of the accepted parameters (see [`Equalizer::response_db`])
    pub fn response_db(&self, freq_hz: f32) -> f32 {
        self.shadow.response_db(freq_hz)
    }

    /// Updates queued but not yet picked up by the audio side
    pub fn pending(&self) -> usize {
        self.updates.buffer().capacity() - self.updates.slots()
    }
}

/// Audio-side half: owns the cascade state and filters buffers
pub struct EqProcessor {
    eq: Equalizer,
    updates: Consumer<EqUpdate>,
}

impl EqProcessor {
    /// Install every queued update
    ///
    /// Wait-free; bounded by the ring capacity.
    #[inline]
    pub fn sync(&mut self) {
        while let Ok(update) = self.updates.pop() {
            self.eq.apply_update(update);
        }
    }

    /// Pick up pending updates, then filter `frame_count` frames in place
    #[inline]
    pub fn process(&mut self, samples: &mut [i16], frame_count: usize) {
        self.sync();
        self.eq.process(samples, frame_count);
    }

    /// Pick up pending updates, then filter a whole interleaved buffer
    #[inline]
    pub fn process_interleaved(&mut self, samples: &mut [i16]) {
        self.sync();
        self.eq.process_interleaved(samples);
    }

    /// The equalizer as the audio thread currently sees it
    pub fn equalizer(&self) -> &Equalizer {
        &self.eq
    }
}

impl AudioProcessor for EqProcessor {
    fn process(&mut self, buffer: &mut [i16]) {
        self.process_interleaved(buffer);
    }

    fn reset(&mut self) {
        self.eq.reset();
    }

    fn name(&self) -> &'static str {
        "10-Band Graphic EQ"
    }

    fn is_enabled(&self) -> bool {
        self.eq.is_enabled()
    }
}
