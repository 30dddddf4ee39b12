//! Backend sessions.
//!
//! A [`ProviderBackend`] is the immutable pairing of one outbound provider
//! adapter with the process-wide AUTH credential; it exists to stamp out one
//! [`ProviderSession`] per inbound connection. The session implements the
//! mail-transaction callbacks the protocol layer drives
//! (`mail`/`rcpt`/`auth_plain`/`data`/`reset`/`logout`) and dispatches the
//! parsed message through the provider on `data`.

pub mod selector;

use std::sync::Arc;

use tokio::io::AsyncRead;

use crate::config::Credential;
use crate::error::{RelayError, RelayResult};
use crate::message::StructuredMessage;
use crate::providers::MailProvider;

/// Options accompanying a `MAIL FROM` command.
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct MailOptions {
    /// Declared message size from the SIZE extension, when supplied.
    pub size: Option<u64>,
}

/// Options accompanying a `RCPT TO` command.
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct RcptOptions {}

/// Lifecycle state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Fresh session, no transaction started.
    Created,
    /// AUTH PLAIN succeeded, no transaction started.
    Authenticated,
    /// A `MAIL FROM` was accepted.
    InTransaction,
    /// The last `DATA` dispatch succeeded.
    Completed,
    /// `logout` was called; no further operations are valid.
    LoggedOut,
}

/// One configured outbound provider plus the shared AUTH credential.
///
/// Immutable after construction; holds no per-message state and is safe to
/// share across concurrent session creations.
#[derive(Clone)]
pub struct ProviderBackend {
    provider: Arc<dyn MailProvider>,
    credential: Option<Credential>,
}

impl ProviderBackend {
    /// Creates a backend around a provider adapter.
    pub fn new(provider: impl MailProvider + 'static, credential: Option<Credential>) -> Self {
        Self {
            provider: Arc::new(provider),
            credential,
        }
    }

    /// The wrapped provider's name.
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Creates a session for one inbound connection.
    pub fn new_session(&self) -> ProviderSession {
        ProviderSession {
            provider: Arc::clone(&self.provider),
            credential: self.credential.clone(),
            state: SessionState::Created,
            authenticated: false,
        }
    }
}

/// Per-connection mail-transaction state machine.
///
/// The protocol layer invokes these callbacks synchronously within the
/// connection's execution context. Sender and recipient validation is not
/// the relay's concern — `mail` and `rcpt` accept anything; the message
/// content that matters is re-derived from the DATA payload headers.
pub struct ProviderSession {
    provider: Arc<dyn MailProvider>,
    credential: Option<Credential>,
    state: SessionState,
    authenticated: bool,
}

impl ProviderSession {
    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Name of the provider this session dispatches to.
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    fn ensure_open(&self) -> RelayResult<()> {
        if self.state == SessionState::LoggedOut {
            return Err(RelayError::SessionClosed);
        }
        Ok(())
    }

    /// Accepts any sender unconditionally and opens a transaction.
    pub fn mail(&mut self, from: &str, _opts: &MailOptions) -> RelayResult<()> {
        self.ensure_open()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(provider = self.provider.name(), from, "MAIL FROM accepted");
        #[cfg(not(feature = "tracing"))]
        let _ = from;

        self.state = SessionState::InTransaction;
        Ok(())
    }

    /// Accepts any recipient unconditionally; callable multiple times.
    pub fn rcpt(&mut self, to: &str, _opts: &RcptOptions) -> RelayResult<()> {
        self.ensure_open()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(provider = self.provider.name(), to, "RCPT TO accepted");
        #[cfg(not(feature = "tracing"))]
        let _ = to;

        Ok(())
    }

    /// Validates an AUTH PLAIN attempt.
    ///
    /// With no credential configured authentication is disabled and every
    /// attempt succeeds. With one configured, the pair must match exactly;
    /// a mismatch returns [`RelayError::AuthenticationFailed`] and leaves
    /// the session usable.
    pub fn auth_plain(&mut self, username: &str, password: &str) -> RelayResult<()> {
        self.ensure_open()?;

        match &self.credential {
            None => Ok(()),
            Some(credential) if credential.verify(username, password) => {
                self.authenticated = true;
                if self.state == SessionState::Created {
                    self.state = SessionState::Authenticated;
                }
                Ok(())
            }
            Some(_) => Err(RelayError::AuthenticationFailed),
        }
    }

    /// Consumes the DATA payload and dispatches the message.
    ///
    /// Reads the payload to its end, parses it into a [`StructuredMessage`],
    /// and hands it to the provider adapter for exactly one send attempt.
    /// Returns the provider-assigned message identifier. A parse or provider
    /// error fails this call only; the session stays usable and no partial
    /// send is assumed committed.
    pub async fn data<R>(&mut self, payload: R) -> RelayResult<String>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.ensure_open()?;

        let message = StructuredMessage::read_from(payload).await?;
        let id = self.provider.send(&message).await?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            provider = self.provider.name(),
            id = %id,
            "message dispatched"
        );

        self.state = SessionState::Completed;
        Ok(id)
    }

    /// Discards transaction-scoped state; infallible and repeatable.
    pub fn reset(&mut self) {
        if self.state == SessionState::LoggedOut {
            return;
        }
        self.state = if self.authenticated {
            SessionState::Authenticated
        } else {
            SessionState::Created
        };
    }

    /// Terminates the session; all further operations fail.
    pub fn logout(&mut self) {
        self.state = SessionState::LoggedOut;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;

    use crate::error::{RelayError, RelayResult};
    use crate::message::StructuredMessage;
    use crate::providers::MailProvider;

    /// Provider stub recording nothing and answering with a fixed outcome.
    pub struct StubProvider {
        pub name: &'static str,
        pub fail: bool,
    }

    impl StubProvider {
        pub fn named(name: &'static str) -> Self {
            Self { name, fail: false }
        }

        pub fn failing(name: &'static str) -> Self {
            Self { name, fail: true }
        }
    }

    #[async_trait]
    impl MailProvider for StubProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn send(&self, _message: &StructuredMessage) -> RelayResult<String> {
            if self.fail {
                Err(RelayError::provider_rejected(self.name, 500, "stub failure"))
            } else {
                Ok(format!("{}-id", self.name))
            }
        }
    }
}
