//! Error types for the bit-exact plist codec.
//!
//! Most of this crate does not fail: the parser degrades and logs,
//! the encoder is total over [`Value`](crate::Value), and the differ reports
//! discrepancies as data. [`Error`] covers the remaining fallible edges:
//!
//! - **Scalar decoding**: a `real` or `integer` payload that cannot be read
//! - **Serde bridging**: Rust types that have no counterpart in the closed value set
//! - **I/O**: reader/writer failures in the convenience helpers
//!
//! ## Examples
//!
//! ```rust
//! use bitplist::{decode_real, Error};
//!
//! let err = decode_real("not-a-number").unwrap_err();
//! assert!(matches!(err, Error::MalformedNumber { .. }));
//! assert!(err.to_string().contains("not-a-number"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all errors surfaced by the fallible parts of the crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A `real` payload that is neither a bit pattern nor a decimal double
    #[error("malformed real number: {text:?}")]
    MalformedNumber { text: String },

    /// An `integer` payload that does not fit a signed 32-bit decimal
    #[error("malformed 32-bit integer: {text:?}")]
    MalformedInteger { text: String },

    /// A Rust type with no representation in the value tree
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// `None` or `()` where a value is required; the format has no null
    #[error("no plist representation for none or unit")]
    NoValue,

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a malformed-number error for an unreadable `real` payload.
    pub fn malformed_number(text: &str) -> Self {
        Error::MalformedNumber {
            text: text.to_string(),
        }
    }

    /// Creates a malformed-integer error for an unreadable `integer` payload.
    pub fn malformed_integer(text: &str) -> Self {
        Error::MalformedInteger {
            text: text.to_string(),
        }
    }

    /// Creates an unsupported type error for types that cannot live in a value tree.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitplist::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
