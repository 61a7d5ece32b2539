use chainroute_core::CoreError;

/// Errors raised while polling a network.
///
/// Everything except [`MonitorError::UnknownNetwork`] and
/// [`MonitorError::Core`] is a poll failure: the monitor absorbs it by
/// decaying the network's reliability.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("poll of {network} timed out after {after_ms} ms")]
    Timeout { network: String, after_ms: u128 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error from {network}: {message}")]
    Rpc { network: String, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no USD price available for {0}")]
    PriceUnavailable(String),

    #[error("poll task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl MonitorError {
    /// True for errors the monitor treats as a failed poll.
    pub fn is_poll_failure(&self) -> bool {
        !matches!(self, Self::UnknownNetwork(_) | Self::Core(_))
    }
}
