use chainroute_core::CoreError;

/// Errors that can occur within the routing layer.
///
/// Network conditions never surface here: a routing call with no fresh
/// network degrades to the fallback network instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("scoring weight '{name}' out of range [0, 1]: {value}")]
    InvalidScoringWeight { name: &'static str, value: f64 },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl RoutingError {
    /// True when the caller sent something the engine refuses to score.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::Core(CoreError::UnsupportedCurrency(_))
                | Self::Core(CoreError::UnknownUrgency(_))
        )
    }
}
