/// Core configuration and parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("fallback network '{0}' is not defined in the network catalog")]
    MissingFallbackNetwork(String),

    #[error("network catalog is empty")]
    EmptyCatalog,

    #[error("duplicate network key: {0}")]
    DuplicateNetwork(String),

    #[error("invalid network descriptor '{key}': {reason}")]
    InvalidDescriptor { key: String, reason: String },

    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("unknown urgency: {0}")]
    UnknownUrgency(String),
}
