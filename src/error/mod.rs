//! Error types for the SMTP relay core.
//!
//! This module defines the error hierarchy for relay operations. Errors are
//! categorized by where they occur in the relay pipeline so callers can tell
//! fatal startup problems apart from failures that are local to a single
//! SMTP transaction.
//!
//! # Error Hierarchy
//!
//! The main [`RelayError`] enum contains variants for each failure category:
//! - Configuration errors (no backend enabled, unknown selection policy)
//! - Authentication failures during AUTH PLAIN
//! - Payload parse errors (malformed or unreadable DATA payload)
//! - Address format errors raised by provider adapters
//! - Provider errors (the outbound send was rejected)
//! - Session lifecycle errors (operation after logout)
//!
//! # Examples
//!
//! ```rust
//! use smtp_relay::error::RelayError;
//!
//! fn handle_relay_error(error: &RelayError) {
//!     if error.is_fatal() {
//!         eprintln!("relay cannot start: {error}");
//!     } else if error.fails_transaction_only() {
//!         eprintln!("transaction failed, connection stays up: {error}");
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

/// Top-level error type for the SMTP relay core.
///
/// Each variant carries enough context to log the failure and to decide
/// whether the process, the connection, or only the current transaction
/// is affected.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration-related errors.
    ///
    /// Raised at startup when the relay is misconfigured: no outbound
    /// backend is enabled, or an unrecognized selection policy was supplied.
    /// The process must not start in this state.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// AUTH PLAIN credential mismatch.
    ///
    /// The supplied username/password pair did not match the configured
    /// credential. The SMTP transaction is rejected but the connection
    /// remains usable.
    #[error("authentication failed: invalid username or password")]
    AuthenticationFailed,

    /// DATA payload parse errors.
    ///
    /// The payload could not be read to completion or contained no usable
    /// content. Fails the current `Data` call only.
    #[error("parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
        /// Optional underlying error source (typically an I/O error).
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An address field a provider adapter could not parse.
    ///
    /// Providers that require structured `(display-name, address)` pairs
    /// fail the whole send attempt when any address field is malformed.
    #[error("invalid {field} address: {message}")]
    AddressFormat {
        /// Which message field held the malformed address.
        field: &'static str,
        /// Description of why the address could not be parsed.
        message: String,
    },

    /// The outbound provider rejected the send request.
    ///
    /// Fails the current `Data` call only; the relay performs no retry and
    /// assumes no partial send was committed.
    #[error("provider {provider} rejected send: {message}")]
    Provider {
        /// Name of the provider that rejected the request.
        provider: &'static str,
        /// HTTP status returned by the provider, when one was received.
        status: Option<u16>,
        /// Description of the provider failure.
        message: String,
        /// Optional underlying error source (typically a transport error).
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An operation was invoked on a session after `logout`.
    #[error("session is closed")]
    SessionClosed,
}

impl RelayError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        RelayError::Configuration {
            message: message.into(),
        }
    }

    /// Creates a parse error without an underlying source.
    pub fn parse(message: impl Into<String>) -> Self {
        RelayError::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a parse error wrapping an I/O failure from the payload stream.
    pub fn payload_read(source: std::io::Error) -> Self {
        RelayError::Parse {
            message: "failed to read message payload".to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an address format error for the named message field.
    pub fn address_format(field: &'static str, message: impl Into<String>) -> Self {
        RelayError::AddressFormat {
            field,
            message: message.into(),
        }
    }

    /// Creates a provider error from an HTTP status and response body.
    pub fn provider_rejected(provider: &'static str, status: u16, body: impl Into<String>) -> Self {
        RelayError::Provider {
            provider,
            status: Some(status),
            message: body.into(),
            source: None,
        }
    }

    /// Creates a provider error from a transport-level failure.
    pub fn provider_transport(provider: &'static str, source: reqwest::Error) -> Self {
        RelayError::Provider {
            provider,
            status: source.status().map(|s| s.as_u16()),
            message: "request to provider failed".to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if this error must prevent the relay from starting.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RelayError::Configuration { .. })
    }

    /// Returns true if this error fails the current transaction while the
    /// connection and process remain alive.
    pub fn fails_transaction_only(&self) -> bool {
        matches!(
            self,
            RelayError::AuthenticationFailed
                | RelayError::Parse { .. }
                | RelayError::AddressFormat { .. }
                | RelayError::Provider { .. }
        )
    }

    /// Returns the provider name for provider errors.
    pub fn provider_name(&self) -> Option<&'static str> {
        match self {
            RelayError::Provider { provider, .. } => Some(provider),
            _ => None,
        }
    }
}
