//! Command-line entry point for the snapeq equalizer.
//!
//! Reads a 16-bit stereo WAV file, runs it block by block through the
//! 10-band EQ and writes the result with the same format.
//!
//! Usage:
//!
//! ```text
//! snapeq <input.wav> <output.wav> [--settings FILE] [--preset NAME]
//!        [--gain BAND=DB ...] [--disable] [--gain-law reference|cookbook]
//!        [--block-frames N] [--save-settings] [-v...]
//! ```
//!
//! `BAND` is either a band index (0-9) or a center frequency in Hz.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueHint};
use snapeq_core::{AudioProcessor, EngineConfig, EqEngine, EqSettings, GainLaw};
use snapeq_dsp::{CENTER_FREQS, EQ_BANDS};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const STATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Filter a 16-bit stereo WAV file through a 10-band graphic equalizer
#[derive(Parser, Debug)]
#[command(name = "snapeq", author, version, about, long_about = None)]
struct Args {
    /// Input WAV file (16-bit integer, stereo)
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// JSON settings file to start from
    #[arg(long, value_hint = ValueHint::FilePath)]
    settings: Option<PathBuf>,

    /// Preset to apply ("Flat (Bypass)", "Subwoofer Boost", "Custom")
    #[arg(long)]
    preset: Option<String>,

    /// Band gain override, applied after the preset
    #[arg(long = "gain", value_name = "BAND=DB", value_parser = parse_gain)]
    gains: Vec<(usize, f32)>,

    /// Bypass the equalizer
    #[arg(long)]
    disable: bool,

    /// Gain law used when generating coefficients
    #[arg(long)]
    gain_law: Option<GainLaw>,

    /// Frames per processing block
    #[arg(long)]
    block_frames: Option<usize>,

    /// Write the final parameters back to the settings file
    #[arg(long, requires = "settings")]
    save_settings: bool,

    /// Logging verbosity
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity with multiple `-vv`",
    )]
    verbose: u8,
}

/// Parse `BAND=DB`, where `BAND` is an index or a center frequency
fn parse_gain(s: &str) -> Result<(usize, f32), String> {
    let (band, gain) = s
        .split_once('=')
        .ok_or_else(|| format!("expected BAND=DB, got {s:?}"))?;

    let band = band.trim();
    let band = band.strip_suffix("Hz").unwrap_or(band);
    let value: f32 = band
        .parse()
        .map_err(|_| format!("invalid band {band:?}"))?;

    let index = if value >= 0.0 && value.fract() == 0.0 && (value as usize) < EQ_BANDS {
        value as usize
    } else {
        CENTER_FREQS
            .iter()
            .position(|&freq| freq == value)
            .ok_or_else(|| format!("{value} is neither a band index nor a center frequency"))?
    };

    let gain_db: f32 = gain
        .trim()
        .parse()
        .map_err(|_| format!("invalid gain {gain:?}"))?;

    Ok((index, gain_db))
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let mut settings = match &args.settings {
        Some(path) => EqSettings::load(path),
        None => EqSettings::default(),
    };
    if let Some(law) = args.gain_law {
        settings.eq.gain_law = law;
    }

    let mut config = EngineConfig::default();
    if let Some(block_frames) = args.block_frames {
        config.block_frames = block_frames;
    }

    let mut reader = hound::WavReader::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let spec = reader.spec();
    if spec.channels != 2
        || spec.bits_per_sample != 16
        || spec.sample_format != hound::SampleFormat::Int
    {
        bail!(
            "Input must be 16-bit integer stereo, got {} channel(s) at {} bits ({:?})",
            spec.channels,
            spec.bits_per_sample,
            spec.sample_format
        );
    }

    let (engine, mut processor) =
        EqEngine::with_config(&settings, config).context("Failed to start the EQ engine")?;

    engine.reinitialize(spec.sample_rate)?;
    if let Some(preset) = &args.preset {
        engine.apply_preset(preset.as_str())?;
    }
    for &(band, gain_db) in &args.gains {
        engine.set_band_gain(band, gain_db)?;
    }
    if args.disable {
        engine.set_enabled(false)?;
    }

    let state = engine
        .wait_for_state(STATE_TIMEOUT)
        .context("EQ parameters were not accepted")?;
    info!(
        "EQ {} at {} Hz, preset {:?}, gains {:?}",
        if state.eq.enabled { "enabled" } else { "bypassed" },
        state.eq.sample_rate,
        state.active_preset,
        state.eq.gains
    );

    let mut samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()
        .with_context(|| format!("Failed to read samples from {}", args.input.display()))?;
    if samples.len() % 2 != 0 {
        warn!("Input ends with a partial frame; the last sample is passed through");
    }

    filter_blocks(&mut processor, &mut samples, engine.config().block_frames);

    write_wav(&args.output, spec, &samples)?;
    info!(
        "Wrote {} frames to {}",
        samples.len() / 2,
        args.output.display()
    );

    if args.save_settings {
        if let Some(path) = &args.settings {
            state
                .save(path)
                .with_context(|| format!("Failed to save settings to {}", path.display()))?;
        }
    }

    Ok(())
}

/// Run interleaved stereo samples through a pipeline stage, one block at a time
fn filter_blocks(stage: &mut dyn AudioProcessor, samples: &mut [i16], block_frames: usize) {
    info!(
        "Filtering through {} ({})",
        stage.name(),
        if stage.is_enabled() { "active" } else { "bypassed" }
    );
    for block in samples.chunks_mut(block_frames.max(1) * 2) {
        stage.process(block);
    }
}

fn write_wav(path: &Path, spec: hound::WavSpec, samples: &[i16]) -> Result<()> {
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
