//! Engine Error Types

use thiserror::Error;

/// Errors that can occur in the EQ engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Engine configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to spawn control thread: {0}")]
    ThreadSpawn(String),

    #[error("Command rejected: {0}")]
    Rejected(String),

    #[error("Timed out waiting for the control thread")]
    Timeout,

    #[error("DSP error: {0}")]
    Dsp(#[from] snapeq_dsp::DspError),

    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings format error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Channel send error - receiver dropped")]
    ChannelSendError,

    #[error("Channel receive error - sender dropped")]
    ChannelRecvError,
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::ConfigError("bad capacity".into());
        assert!(err.to_string().contains("bad capacity"));

        let err = EngineError::Rejected("Invalid gain: 20dB".into());
        assert!(err.to_string().contains("20dB"));
    }

    #[test]
    fn test_error_from_dsp() {
        let dsp_err = snapeq_dsp::DspError::InvalidBandIndex(10);
        let engine_err: EngineError = dsp_err.into();
        assert!(matches!(engine_err, EngineError::Dsp(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let engine_err: EngineError = json_err.into();
        assert!(matches!(engine_err, EngineError::Settings(_)));
    }
}
