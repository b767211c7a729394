//! Persistent Settings Management
//!
//! The equalizer parameters the configuration layer exposes (band gains,
//! enabled flag, active preset) are stored as a JSON document so they survive
//! a restart. The path is chosen by the host.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use snapeq_dsp::{EqConfig, Preset};
use tracing::{error, info};

use crate::error::EngineResult;

/// Root settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqSettings {
    /// Gains, enabled flag, sample rate and gain law
    pub eq: EqConfig,
    /// Name of the last applied preset, "Custom" after manual band changes
    pub active_preset: Option<String>,
}

impl Default for EqSettings {
    fn default() -> Self {
        Self {
            eq: EqConfig::default(),
            active_preset: Some(Preset::SubwooferBoost.name().to_string()),
        }
    }
}

impl EqSettings {
    /// Load settings from disk, or return default if missing, corrupt or out of range
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::File::open(path) {
                Ok(file) => match serde_json::from_reader::<_, EqSettings>(file) {
                    Ok(settings) => match settings.eq.validate() {
                        Ok(()) => {
                            info!("Settings loaded from {:?}", path);
                            return settings;
                        }
                        Err(e) => {
                            error!("Settings file {:?} rejected: {}", path, e);
                        }
                    },
                    Err(e) => {
                        error!("Failed to parse settings file: {}", e);
                    }
                },
                Err(e) => {
                    error!("Failed to open settings file: {}", e);
                }
            }
        }

        info!("Using default settings");
        Self::default()
    }

    /// Save settings to disk, creating parent directories
    pub fn save(&self, path: &Path) -> EngineResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;

        info!("Settings saved to {:?}", path);
        Ok(())
    }
}
