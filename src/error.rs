use thiserror::Error;

/// Errors raised by the match engine.
///
/// Every call is all-or-nothing: an error means no partial result was produced.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Unknown match type: {0}")]
    UnknownMatchType(String),

    #[error("Invalid match configuration {match_type}: {reason}")]
    InvalidConfiguration { match_type: String, reason: &'static str },

    #[error("Unknown match outcome: {0}")]
    UnknownOutcome(String),

    #[error("Invalid competitor attribute {field}: {value} (expected a finite value in 0..=100)")]
    InvalidAttribute { field: &'static str, value: f64 },

    #[error("Unknown condition tier: {0}")]
    UnknownCondition(String),

    #[error("Simulation exceeded the limit of {limit} points without a result")]
    SimulationLimitExceeded { limit: u32 },
}

impl EngineError {
    /// Unknown match-type key or an inconsistent match profile.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EngineError::UnknownMatchType(_) | EngineError::InvalidConfiguration { .. }
        )
    }

    /// Malformed competitor or outcome input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidAttribute { .. }
                | EngineError::UnknownCondition(_)
                | EngineError::UnknownOutcome(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
