//! Engine Configuration

use serde::{Deserialize, Serialize};

/// Queue and block sizing for the EQ engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Capacity of the command channel into the control thread
    pub command_capacity: usize,

    /// Capacity of the update ring into the audio thread
    pub update_capacity: usize,

    /// Frames per processing block (lower = less latency, more overhead)
    pub block_frames: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command_capacity: 32,
            update_capacity: snapeq_dsp::DEFAULT_UPDATE_CAPACITY,
            block_frames: 256,
        }
    }
}

impl EngineConfig {
    /// Smaller blocks for tighter control latency
    pub fn low_latency() -> Self {
        Self {
            block_frames: 64,
            ..Self::default()
        }
    }

    /// Calculate block latency in milliseconds at a sample rate
    pub fn block_latency_ms(&self, sample_rate: u32) -> f32 {
        (self.block_frames as f32 / sample_rate as f32) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.command_capacity == 0 {
            return Err("Command capacity must be at least 1".to_string());
        }
        if self.update_capacity == 0 {
            return Err("Update capacity must be at least 1".to_string());
        }
        if self.block_frames < 16 || self.block_frames > 8192 {
            return Err(format!("Invalid block size: {}", self.block_frames));
        }
        Ok(())
    }
}
