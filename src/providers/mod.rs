//! Outbound provider adapters.
//!
//! Each adapter translates a [`StructuredMessage`] into the minimal send
//! request one provider accepts, invokes the provider's HTTP API, and
//! propagates the result. Adapters are stateless after construction and safe
//! for concurrent use by multiple sessions; they share a pooled
//! [`reqwest::Client`] internally.
//!
//! Supported providers:
//! - [`ResendProvider`] — raw header strings pass straight through
//! - [`SendGridProvider`] — addresses are parsed into name/address pairs
//!
//! No attachments, custom headers, or delivery-receipt options are mapped.

mod address;
mod resend;
mod sendgrid;

pub use address::Address;
pub use resend::ResendProvider;
pub use sendgrid::SendGridProvider;

use async_trait::async_trait;

use crate::error::RelayResult;
use crate::message::StructuredMessage;

/// The outbound send seam every provider adapter implements.
///
/// `send` performs exactly one synchronous send attempt — no retry, no
/// partial-commit assumption — and returns the provider-assigned message
/// identifier on success.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Sends one message through the provider's API.
    async fn send(&self, message: &StructuredMessage) -> RelayResult<String>;
}
