use thiserror::Error;

/// Main error type for the trading client
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Reference data not found: {0}")]
    ReferenceDataNotFound(String),

    // Session errors
    #[error("{gateway} gateway connection failure: {reason}")]
    ConnectionFailure {
        gateway: &'static str,
        reason: String,
    },

    #[error("Authentication rejected: {0}")]
    AuthFailure(String),

    #[error("Login rejected: {0}")]
    LoginFailure(String),

    // Order errors
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Cancel failed for order {order_ref}: {reason}")]
    CancelFailure { order_ref: String, reason: String },

    // Request-dispatch errors (the fire-and-forget call itself failed)
    #[error("Gateway request failed: {0}")]
    Gateway(String),
}

pub type Result<T> = std::result::Result<T, Error>;
