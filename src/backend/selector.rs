//! Backend selection.
//!
//! The [`BackendSelector`] owns the configured backends and hands out one
//! [`ProviderSession`] per inbound connection according to the configured
//! [`SelectionPolicy`]:
//!
//! - **random** draws a backend uniformly per session, with no coordination
//!   between concurrent sessions
//! - **round-robin** visits backends in fixed cyclic order; the cursor is
//!   owned by the selector instance and guarded by a mutex held only for the
//!   read-and-increment, never during session handling
//!
//! With exactly one backend configured, both policies return it directly
//! with no randomness or locking.

use std::sync::Mutex;

use rand::Rng;
use secrecy::ExposeSecret;

use crate::backend::{ProviderBackend, ProviderSession};
use crate::config::{RelayConfig, SelectionPolicy};
use crate::error::{RelayError, RelayResult};
use crate::providers::{ResendProvider, SendGridProvider};

/// Chooses which backend serves each new session.
pub struct BackendSelector {
    backends: Vec<ProviderBackend>,
    policy: SelectionPolicy,
    next_index: Mutex<usize>,
}

impl BackendSelector {
    /// Creates a selector over the given backends.
    ///
    /// Fails with a configuration error when no backend is supplied; the
    /// relay must not start in that state.
    pub fn new(backends: Vec<ProviderBackend>, policy: SelectionPolicy) -> RelayResult<Self> {
        if backends.is_empty() {
            return Err(RelayError::configuration("no backends enabled"));
        }
        Ok(Self {
            backends,
            policy,
            next_index: Mutex::new(0),
        })
    }

    /// Builds provider backends from the configuration.
    ///
    /// A backend is enabled by the presence of its API key. Zero enabled
    /// backends is a fatal configuration error.
    pub fn from_config(config: &RelayConfig) -> RelayResult<Self> {
        let credential = config.credential().cloned();
        let mut backends = Vec::new();

        if let Some(key) = config.resend_api_key() {
            let key = key.expose_secret().clone();
            let provider = match config.resend_endpoint() {
                Some(endpoint) => ResendProvider::with_endpoint(key, endpoint),
                None => ResendProvider::new(key),
            };
            #[cfg(feature = "tracing")]
            tracing::info!("resend backend enabled");
            backends.push(ProviderBackend::new(provider, credential.clone()));
        }

        if let Some(key) = config.sendgrid_api_key() {
            let key = key.expose_secret().clone();
            let provider = match config.sendgrid_endpoint() {
                Some(endpoint) => SendGridProvider::with_endpoint(key, endpoint),
                None => SendGridProvider::new(key),
            };
            #[cfg(feature = "tracing")]
            tracing::info!("sendgrid backend enabled");
            backends.push(ProviderBackend::new(provider, credential));
        }

        Self::new(backends, config.policy())
    }

    /// The configured policy.
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Number of configured backends.
    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Creates a session bound to exactly one backend.
    pub fn select(&self) -> ProviderSession {
        let index = if self.backends.len() == 1 {
            // Single-backend shortcut: no randomness, no locking.
            0
        } else {
            match self.policy {
                SelectionPolicy::Random => rand::thread_rng().gen_range(0..self.backends.len()),
                SelectionPolicy::RoundRobin => self.advance_index(),
            }
        };

        let backend = &self.backends[index];

        #[cfg(feature = "tracing")]
        tracing::debug!(
            policy = %self.policy,
            index,
            provider = backend.provider_name(),
            "backend selected for new session"
        );

        backend.new_session()
    }

    /// Reads and advances the round-robin cursor.
    ///
    /// The lock covers only the read-and-increment, so session handling
    /// never runs under it. No two calls observe the same pre-increment
    /// index.
    fn advance_index(&self) -> usize {
        let mut index = self.next_index.lock().unwrap();
        let current = *index;
        *index = (current + 1) % self.backends.len();
        current
    }
}

impl std::fmt::Debug for BackendSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSelector")
            .field("backend_count", &self.backends.len())
            .field("policy", &self.policy)
            .finish()
    }
}
