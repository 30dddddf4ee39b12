//! Relay configuration.
//!
//! This module provides:
//! - The [`SelectionPolicy`] choosing how sessions are spread across backends
//! - The optional inbound [`Credential`] for AUTH PLAIN
//! - [`RelayConfig`] with a builder and environment loading
//!
//! A provider backend is enabled by the presence of its API key; the relay
//! refuses to start when no backend is enabled (checked when the selector is
//! built from the config).

use std::env;
use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{RelayError, RelayResult};

/// Environment variable holding the Resend API key.
pub const RESEND_API_KEY: &str = "RESEND_API_KEY";
/// Environment variable holding the SendGrid API key.
pub const SENDGRID_API_KEY: &str = "SENDGRID_API_KEY";
/// Environment variable holding the inbound AUTH username.
pub const SMTP_USERNAME: &str = "SMTP_USERNAME";
/// Environment variable holding the inbound AUTH password.
pub const SMTP_PASSWORD: &str = "SMTP_PASSWORD";

/// Policy for choosing which backend serves a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionPolicy {
    /// Pick a backend uniformly at random per session.
    #[default]
    Random,
    /// Visit backends in fixed cyclic order across sessions.
    RoundRobin,
}

impl SelectionPolicy {
    /// Returns the configuration-surface name of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionPolicy::Random => "random",
            SelectionPolicy::RoundRobin => "round-robin",
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(SelectionPolicy::Random),
            "round-robin" => Ok(SelectionPolicy::RoundRobin),
            other => Err(RelayError::configuration(format!(
                "invalid provider selection: {other}"
            ))),
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shared username/password pair for inbound AUTH PLAIN.
///
/// One credential is configured process-wide and used identically by every
/// backend. When no credential is configured, authentication is disabled and
/// any AUTH attempt succeeds.
#[derive(Clone)]
pub struct Credential {
    username: String,
    password: SecretString,
}

impl Credential {
    /// Creates a credential from a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }

    /// Loads the credential from `SMTP_USERNAME`/`SMTP_PASSWORD`.
    ///
    /// Returns `None` unless both variables are set and non-empty, matching
    /// the rule that a half-configured credential disables authentication.
    pub fn from_env() -> Option<Self> {
        let username = env::var(SMTP_USERNAME).ok().filter(|s| !s.is_empty())?;
        let password = env::var(SMTP_PASSWORD).ok().filter(|s| !s.is_empty())?;
        Some(Self::new(username, password))
    }

    /// Returns the configured username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Checks a supplied pair against the configured one.
    ///
    /// Exact, case-sensitive string equality on both fields.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password.expose_secret() == password
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Configuration consumed by the relay core.
///
/// # Examples
///
/// ```rust
/// use smtp_relay::config::{RelayConfig, SelectionPolicy};
///
/// let config = RelayConfig::builder()
///     .policy(SelectionPolicy::RoundRobin)
///     .resend_api_key("re_123")
///     .sendgrid_api_key("SG.456")
///     .build();
/// assert_eq!(config.policy(), SelectionPolicy::RoundRobin);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    policy: SelectionPolicy,
    credential: Option<Credential>,
    resend_api_key: Option<SecretString>,
    sendgrid_api_key: Option<SecretString>,
    resend_endpoint: Option<String>,
    sendgrid_endpoint: Option<String>,
}

impl RelayConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::default()
    }

    /// Loads the configuration from the environment.
    ///
    /// Reads the provider API keys and the optional AUTH credential. The
    /// selection policy defaults to [`SelectionPolicy::Random`]; override it
    /// with [`RelayConfig::with_policy`].
    pub fn from_env() -> Self {
        let mut builder = RelayConfigBuilder::default();
        if let Some(key) = env::var(RESEND_API_KEY).ok().filter(|s| !s.is_empty()) {
            builder = builder.resend_api_key(key);
        }
        if let Some(key) = env::var(SENDGRID_API_KEY).ok().filter(|s| !s.is_empty()) {
            builder = builder.sendgrid_api_key(key);
        }
        if let Some(credential) = Credential::from_env() {
            builder = builder.credential(credential);
        }
        builder.build()
    }

    /// Returns this configuration with the policy replaced.
    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns this configuration with the policy parsed from its name.
    pub fn with_policy_name(self, name: &str) -> RelayResult<Self> {
        Ok(self.with_policy(name.parse()?))
    }

    /// The configured selection policy.
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// The configured AUTH credential, if any.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// The Resend API key, if the Resend backend is enabled.
    pub fn resend_api_key(&self) -> Option<&SecretString> {
        self.resend_api_key.as_ref()
    }

    /// The SendGrid API key, if the SendGrid backend is enabled.
    pub fn sendgrid_api_key(&self) -> Option<&SecretString> {
        self.sendgrid_api_key.as_ref()
    }

    /// Endpoint override for the Resend API.
    pub fn resend_endpoint(&self) -> Option<&str> {
        self.resend_endpoint.as_deref()
    }

    /// Endpoint override for the SendGrid API.
    pub fn sendgrid_endpoint(&self) -> Option<&str> {
        self.sendgrid_endpoint.as_deref()
    }
}

/// Builder for [`RelayConfig`].
#[derive(Debug, Clone, Default)]
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl RelayConfigBuilder {
    /// Sets the backend selection policy.
    pub fn policy(mut self, policy: SelectionPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Sets the inbound AUTH credential.
    pub fn credential(mut self, credential: Credential) -> Self {
        self.config.credential = Some(credential);
        self
    }

    /// Enables the Resend backend with the given API key.
    pub fn resend_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.resend_api_key = Some(SecretString::new(key.into()));
        self
    }

    /// Enables the SendGrid backend with the given API key.
    pub fn sendgrid_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.sendgrid_api_key = Some(SecretString::new(key.into()));
        self
    }

    /// Overrides the Resend API endpoint (used by tests).
    pub fn resend_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.resend_endpoint = Some(endpoint.into());
        self
    }

    /// Overrides the SendGrid API endpoint (used by tests).
    pub fn sendgrid_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.sendgrid_endpoint = Some(endpoint.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> RelayConfig {
        self.config
    }
}
