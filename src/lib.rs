//! # SMTP Relay Core
//!
//! The internal logic of a mail-submission relay that accepts SMTP
//! transactions and forwards each submitted message through one of several
//! interchangeable outbound email-delivery providers:
//!
//! - **Backend selection** across configured providers (`random` or
//!   `round-robin`)
//! - **Session state machine** implementing the mail-transaction callbacks
//!   the protocol layer drives (MAIL/RCPT/AUTH/DATA/RESET/QUIT)
//! - **Payload parsing** from a raw DATA stream into a structured message
//! - **Provider adapters** for Resend and SendGrid
//!
//! SMTP framing, TLS negotiation, and socket management belong to the
//! embedding protocol layer; this crate is invoked through per-connection
//! callbacks and talks to providers over their HTTP APIs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smtp_relay::{BackendSelector, MailOptions, RcptOptions, RelayConfig, SelectionPolicy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Backends are enabled by the presence of their API keys
//!     // (RESEND_API_KEY, SENDGRID_API_KEY); SMTP_USERNAME/SMTP_PASSWORD
//!     // optionally enable inbound AUTH.
//!     let config = RelayConfig::from_env().with_policy(SelectionPolicy::RoundRobin);
//!     let selector = BackendSelector::from_config(&config)?;
//!
//!     // One session per inbound connection, driven by the protocol layer.
//!     let mut session = selector.select();
//!     session.mail("sender@example.com", &MailOptions::default())?;
//!     session.rcpt("recipient@example.com", &RcptOptions::default())?;
//!
//!     let payload: &[u8] =
//!         b"From: sender@example.com\r\nTo: recipient@example.com\r\nSubject: Hi\r\nHello\r\n";
//!     let message_id = session.data(payload).await?;
//!     println!("dispatched as {message_id}");
//!
//!     session.logout();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod error;
pub mod message;

// Session and selection
pub mod backend;

// Outbound adapters
pub mod providers;

// Re-exports for convenience
pub use backend::selector::BackendSelector;
pub use backend::{MailOptions, ProviderBackend, ProviderSession, RcptOptions, SessionState};
pub use config::{Credential, RelayConfig, RelayConfigBuilder, SelectionPolicy};
pub use error::{RelayError, RelayResult};
pub use message::{MessageBody, StructuredMessage};
pub use providers::{Address, MailProvider, ResendProvider, SendGridProvider};
