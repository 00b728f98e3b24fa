//! Error types shared across the mesher crates.

use thiserror::Error;

/// Core error type.
#[derive(Error, Debug)]
pub enum Error {
    /// A capacity computation overflowed or exceeded a hard limit
    #[error("Capacity error: {0}")]
    Capacity(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
