//! Error types for the metrics bridge.
//!
//! Unknown categories are not represented here: they are dropped at the
//! routing boundary and never surface as errors.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the bridge itself.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Startup configuration is unusable; the scheduler must not start.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Writing a formatted line to the metrics sink failed.
    #[error("failed to emit metrics line: {0}")]
    SinkEmit(#[from] std::io::Error),

    /// The sink did not accept the line within one interval.
    #[error("metrics sink did not accept the line within {0:?}")]
    SinkTimeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = BridgeError::InvalidConfiguration("interval must be at least 1 second".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: interval must be at least 1 second"
        );

        let err = BridgeError::SinkTimeout(Duration::from_secs(2));
        assert_eq!(err.to_string(), "metrics sink did not accept the line within 2s");
    }

    #[test]
    fn test_io_errors_become_sink_failures() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        assert!(matches!(BridgeError::from(io), BridgeError::SinkEmit(_)));
    }
}
