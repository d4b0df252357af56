//! Crate error type.
//!
//! Every condition is raised synchronously where it is detected. Nothing is
//! retried: the engines are deterministic arithmetic, so a failed run fails
//! identically on every attempt.

use thiserror::Error;

/// Errors raised by coverage structures, accumulators, engines and samplers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LatencyError {
    /// Parameters or inputs that can never describe a valid run.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A parameter regime the engine refuses to approximate.
    #[error("unsupported configuration: {message}")]
    Unsupported { message: String },

    /// Internal invariant broken by floating-point drift.
    #[error("numeric fault in {context}: remaining coverage {remaining}")]
    NumericFault { context: &'static str, remaining: f64 },
}

impl LatencyError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        LatencyError::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        LatencyError::Unsupported {
            message: message.into(),
        }
    }

    /// Whether a driver should log this and skip the configuration rather
    /// than treat it as a failed run.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            LatencyError::Configuration { .. } | LatencyError::Unsupported { .. }
        )
    }

    /// Process exit status for the driver: 2 for a skipped configuration,
    /// 1 for a failed run.
    pub fn exit_status(&self) -> i32 {
        if self.is_skippable() {
            2
        } else {
            1
        }
    }
}

pub type Result<T> = std::result::Result<T, LatencyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_fault_is_not_skippable() {
        let e = LatencyError::NumericFault {
            context: "interval coverage",
            remaining: -1.0,
        };
        assert!(!e.is_skippable());
        assert!(LatencyError::unsupported("x").is_skippable());
        assert!(LatencyError::config("x").is_skippable());
        assert_eq!(e.exit_status(), 1);
        assert_eq!(LatencyError::unsupported("x").exit_status(), 2);
        assert_eq!(LatencyError::config("x").exit_status(), 2);
    }

    #[test]
    fn test_display_carries_message() {
        let e = LatencyError::config("scan interval 10 is less than scan window 20");
        assert_eq!(
            e.to_string(),
            "configuration error: scan interval 10 is less than scan window 20"
        );
    }
}
