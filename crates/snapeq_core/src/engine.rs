//! EQ Engine - Control Thread
//!
//! The `EqEngine` owns the control half of a split equalizer on a dedicated
//! thread. The configuration layer talks to it with [`Command`]s; the audio
//! pipeline stage keeps the [`EqProcessor`] returned at construction and
//! calls it once per buffer.
//!
//! ```text
//! ┌──────────────────────┐  crossbeam   ┌────────────────────┐
//! │ configuration layer  │ ──Command──▶ │  control thread    │
//! │ (sliders, presets)   │ ◀──Event──── │  EqController      │
//! └──────────────────────┘              └─────────┬──────────┘
//!                                                 │ rtrb (prepared bands)
//!                                                 ▼
//!                                       ┌────────────────────┐
//!                                       │  audio thread      │
//!                                       │  EqProcessor       │
//!                                       └────────────────────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use snapeq_dsp::{EqController, EqProcessor, Equalizer, Preset};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::message::{Command, Event};
use crate::settings::EqSettings;

/// How often the control thread retries a backlog the audio side has not taken
const BACKLOG_RETRY: Duration = Duration::from_millis(5);

/// The EQ control engine
///
/// Lives on the configuration side; dropping it stops the control thread.
pub struct EqEngine {
    /// Channel for sending commands to the control thread
    command_sender: Sender<Command>,

    /// Channel for receiving events from the control thread
    event_receiver: Receiver<Event>,

    /// Handle to the control thread
    control_thread: Option<JoinHandle<()>>,

    /// Sequence number for the next state request
    next_request: AtomicU64,

    /// Current configuration
    config: EngineConfig,
}

impl EqEngine {
    /// Start an engine from saved settings with default sizing
    ///
    /// Returns the engine and the audio-side processor.
    pub fn new(settings: &EqSettings) -> EngineResult<(Self, EqProcessor)> {
        Self::with_config(settings, EngineConfig::default())
    }

    /// Start an engine with custom sizing
    pub fn with_config(
        settings: &EqSettings,
        config: EngineConfig,
    ) -> EngineResult<(Self, EqProcessor)> {
        config.validate().map_err(EngineError::ConfigError)?;

        let eq = Equalizer::from_config(&settings.eq)?;
        let (controller, processor) = snapeq_dsp::split(eq, config.update_capacity);

        let (command_sender, command_receiver) = bounded::<Command>(config.command_capacity);
        let (event_sender, event_receiver) = unbounded::<Event>();

        let active_preset = settings.active_preset.clone();

        let control_thread = thread::Builder::new()
            .name("snapeq-control".into())
            .spawn(move || {
                Self::control_thread_main(controller, command_receiver, event_sender, active_preset);
            })
            .map_err(|e| EngineError::ThreadSpawn(e.to_string()))?;

        Ok((
            Self {
                command_sender,
                event_receiver,
                control_thread: Some(control_thread),
                next_request: AtomicU64::new(0),
                config,
            },
            processor,
        ))
    }

    /// Set EQ band gain
    pub fn set_band_gain(&self, band: usize, gain_db: f32) -> EngineResult<()> {
        self.send_command(Command::SetBandGain { band, gain_db })
    }

    /// Apply a preset by display name
    pub fn apply_preset(&self, name: impl Into<String>) -> EngineResult<()> {
        self.send_command(Command::ApplyPreset(name.into()))
    }

    /// Enable or bypass the equalizer
    pub fn set_enabled(&self, enabled: bool) -> EngineResult<()> {
        self.send_command(Command::SetEnabled(enabled))
    }

    /// Report the stream's real sample rate
    pub fn reinitialize(&self, sample_rate: u32) -> EngineResult<()> {
        self.send_command(Command::Reinitialize(sample_rate))
    }

    /// Ask for a StateUpdate event
    ///
    /// Returns the sequence number the matching event will carry.
    pub fn request_state(&self) -> EngineResult<u64> {
        let seq = self.next_request.fetch_add(1, Ordering::Relaxed);
        self.send_command(Command::RequestState(seq))?;
        Ok(seq)
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<Event> {
        self.event_receiver.try_recv().ok()
    }

    /// Get the event receiver for polling
    pub fn event_receiver(&self) -> &Receiver<Event> {
        &self.event_receiver
    }

    /// Request state and wait for it
    ///
    /// Commands are handled in order, so the returned settings reflect every
    /// command sent before this call, and their updates are already on their
    /// way to the audio side. If one of those commands was rejected, the first
    /// rejection is returned as [`EngineError::Rejected`] once the state
    /// arrives. Answers to earlier requests still sitting in the event
    /// channel are skipped.
    pub fn wait_for_state(&self, timeout: Duration) -> EngineResult<EqSettings> {
        let seq = self.request_state()?;

        let deadline = Instant::now() + timeout;
        let mut rejection = None;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.event_receiver.recv_timeout(remaining) {
                Ok(Event::StateUpdate { seq: answered, .. }) if answered < seq => {
                    // Errors so far belong to the earlier request
                    rejection = None;
                }
                Ok(Event::StateUpdate { settings, .. }) => {
                    return match rejection {
                        Some(message) => Err(EngineError::Rejected(message)),
                        None => Ok(settings),
                    };
                }
                Ok(Event::Error { message }) => {
                    rejection.get_or_insert(message);
                }
                Ok(Event::Stopped) => return Err(EngineError::ChannelRecvError),
                Err(RecvTimeoutError::Timeout) => return Err(EngineError::Timeout),
                Err(RecvTimeoutError::Disconnected) => return Err(EngineError::ChannelRecvError),
            }
        }
    }

    /// Get current configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stop the control thread and wait for it
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.control_thread.take() {
            let _ = self.command_sender.send(Command::Shutdown);
            if handle.join().is_err() {
                warn!("Control thread panicked");
            }
        }
    }

    fn send_command(&self, command: Command) -> EngineResult<()> {
        self.command_sender
            .send(command)
            .map_err(|_| EngineError::ChannelSendError)
    }

    /// Main loop of the control thread
    fn control_thread_main(
        mut controller: EqController,
        commands: Receiver<Command>,
        events: Sender<Event>,
        mut active_preset: Option<String>,
    ) {
        info!("Control thread started");

        loop {
            let received = if controller.has_backlog() {
                commands.recv_timeout(BACKLOG_RETRY)
            } else {
                commands.recv().map_err(|_| RecvTimeoutError::Disconnected)
            };
            let command = match received {
                Ok(command) => command,
                Err(RecvTimeoutError::Timeout) => {
                    controller.flush();
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Command channel disconnected");
                    break;
                }
            };
            debug!("Command: {:?}", command);

            let result = match command {
                Command::SetBandGain { band, gain_db } => controller
                    .set_band_gain(band, gain_db)
                    .map(|()| active_preset = Some(Preset::Custom.name().to_string())),
                Command::ApplyPreset(name) => controller
                    .apply_preset(&name)
                    .map(|()| active_preset = Some(name)),
                Command::SetEnabled(enabled) => controller.set_enabled(enabled),
                Command::Reinitialize(sample_rate) => controller.reinitialize(sample_rate),
                Command::RequestState(seq) => {
                    let settings = EqSettings {
                        eq: controller.config(),
                        active_preset: active_preset.clone(),
                    };
                    let _ = events.send(Event::StateUpdate { seq, settings });
                    Ok(())
                }
                Command::Shutdown => {
                    info!("Shutdown command received");
                    break;
                }
            };

            if let Err(e) = result {
                let _ = events.send(Event::error(e));
            }
        }

        let _ = events.send(Event::Stopped);
        info!("Control thread shutting down");
    }
}

impl Drop for EqEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapeq_dsp::{DspError, EQ_BANDS, SUBWOOFER_BOOST_GAINS};

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_initial_state_matches_settings() {
        let settings = EqSettings::default();
        let (engine, processor) = EqEngine::new(&settings).unwrap();

        assert_eq!(engine.wait_for_state(WAIT).unwrap(), settings);
        assert_eq!(processor.equalizer().gains(), SUBWOOFER_BOOST_GAINS);
    }

    #[test]
    fn test_commands_reach_processor() {
        let (engine, mut processor) = EqEngine::new(&EqSettings::default()).unwrap();

        engine.set_band_gain(4, 5.0).unwrap();
        engine.reinitialize(48000).unwrap();
        let state = engine.wait_for_state(WAIT).unwrap();
        assert_eq!(state.eq.gains[4], 5.0);
        assert_eq!(state.eq.sample_rate, 48000);
        assert_eq!(state.active_preset.as_deref(), Some("Custom"));

        let mut buffer = [0_i16; 8];
        processor.process(&mut buffer, 4);
        assert_eq!(processor.equalizer().gains()[4], 5.0);
        assert_eq!(processor.equalizer().sample_rate(), 48000);
    }

    #[test]
    fn test_preset_updates_active_preset() {
        let (engine, mut processor) = EqEngine::new(&EqSettings::default()).unwrap();

        engine.apply_preset("Flat (Bypass)").unwrap();
        let state = engine.wait_for_state(WAIT).unwrap();
        assert_eq!(state.active_preset.as_deref(), Some("Flat (Bypass)"));
        assert!(!state.eq.enabled);
        assert_eq!(state.eq.gains, [0.0; 10]);

        let original = [3000_i16, -3000];
        let mut buffer = original;
        processor.process(&mut buffer, 1);
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_rejected_command_reports_error() {
        let (engine, _processor) = EqEngine::new(&EqSettings::default()).unwrap();

        engine.set_band_gain(2, 40.0).unwrap();
        match engine.wait_for_state(WAIT) {
            Err(EngineError::Rejected(message)) => {
                assert_eq!(message, DspError::InvalidGain(40.0).to_string());
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        // Nothing changed, and the next request is clean
        let state = engine.wait_for_state(WAIT).unwrap();
        assert_eq!(state, EqSettings::default());
    }

    #[test]
    fn test_unrecognized_preset_keeps_active_preset() {
        let (engine, _processor) = EqEngine::new(&EqSettings::default()).unwrap();

        engine.apply_preset("Rock").unwrap();
        assert!(matches!(
            engine.wait_for_state(WAIT),
            Err(EngineError::Rejected(_))
        ));
        let state = engine.wait_for_state(WAIT).unwrap();
        assert_eq!(state.active_preset.as_deref(), Some("Subwoofer Boost"));
    }

    #[test]
    fn test_earlier_state_answer_is_skipped() {
        let (engine, _processor) = EqEngine::new(&EqSettings::default()).unwrap();

        engine.request_state().unwrap();
        engine.set_band_gain(0, -9.0).unwrap();
        let state = engine.wait_for_state(WAIT).unwrap();
        assert_eq!(state.eq.gains[0], -9.0);
    }

    #[test]
    fn test_changes_beyond_ring_capacity_are_kept() {
        let config = EngineConfig {
            update_capacity: 4,
            ..Default::default()
        };
        let (engine, mut processor) =
            EqEngine::with_config(&EqSettings::default(), config).unwrap();

        // The audio side is paused while the changes pile up
        for i in 0..70 {
            engine.set_band_gain(i % EQ_BANDS, (i % 31) as f32 - 15.0).unwrap();
        }
        let state = engine.wait_for_state(WAIT).unwrap();
        assert_eq!(state.eq.gains[9], (69 % 31) as f32 - 15.0);

        let deadline = Instant::now() + WAIT;
        let mut buffer = [0_i16; 8];
        while processor.equalizer().config() != state.eq && Instant::now() < deadline {
            processor.process(&mut buffer, 4);
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(processor.equalizer().config(), state.eq);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = EqSettings::default();
        settings.eq.gains[0] = -30.0;
        assert!(matches!(
            EqEngine::new(&settings),
            Err(EngineError::Dsp(DspError::InvalidGain(_)))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            command_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            EqEngine::with_config(&EqSettings::default(), config),
            Err(EngineError::ConfigError(_))
        ));
    }

    #[test]
    fn test_shutdown_emits_stopped() {
        let (mut engine, _processor) = EqEngine::new(&EqSettings::default()).unwrap();
        engine.shutdown();

        let events: Vec<Event> = engine.event_receiver().try_iter().collect();
        assert_eq!(events.last(), Some(&Event::Stopped));
        assert!(engine.set_enabled(true).is_err());
    }
}
