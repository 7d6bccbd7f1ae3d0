//! API credentials and where they come from.
//!
//! A [`Credential`] is an explicit value owned by whoever makes calls. It is
//! looked up once at startup and replaced in place when the operator supplies
//! a new key after an authentication failure. Nothing here writes to the
//! process environment.

use crate::provider::Provider;
use crate::{Error, Result};
use keyring::Entry;
use std::fmt;
use tokio::runtime::{Handle, RuntimeFlavor};

/// Keyring service name under which API keys may be stored (user = provider id).
pub const KEYRING_SERVICE: &str = "agent-cli";

/// An opaque API secret. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret. Surrounding whitespace is dropped; blank input yields `None`.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Read a credential from an environment variable.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var).ok().and_then(Self::new)
    }

    /// Read a credential from the OS keyring.
    pub fn from_keyring(service: &str, user: &str) -> Option<Self> {
        let entry = Entry::new(service, user).ok()?;
        entry.get_password().ok().and_then(Self::new)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Where a resolved credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Keyring,
    Environment,
    Prompt,
}

/// Interactive source of secrets.
///
/// The terminal implementation suppresses echo; tests script the answers.
pub trait SecretPrompt {
    /// Ask the operator for a secret. `label` is shown verbatim.
    fn prompt_secret(&mut self, label: &str) -> Result<String>;
}

/// Echo-suppressed terminal prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl SecretPrompt for TerminalPrompt {
    fn prompt_secret(&mut self, label: &str) -> Result<String> {
        blocking(|| {
            dialoguer::Password::new()
                .with_prompt(label)
                .allow_empty_password(true)
                .interact()
                .map_err(|e| Error::Prompt(e.to_string()))
        })
    }
}

/// Run a blocking terminal read without stalling other tasks on a
/// multi-threaded runtime. Outside such a runtime `f` runs directly.
fn blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Prompt label used when asking for a provider's key.
pub fn prompt_label(provider: &Provider, replacement: bool) -> String {
    if replacement {
        format!("Enter a new {} API Key", provider.label())
    } else {
        format!("Enter {} API Key", provider.label())
    }
}

/// Look up the credential for `provider`.
///
/// Order: OS keyring, then the provider's environment variable (which may
/// have come from a `.env` file), then, only for providers that cannot work
/// without one, an interactive prompt. Providers that need no key resolve to
/// `None` when nothing is configured.
pub fn resolve(
    provider: &Provider,
    use_keyring: bool,
    secrets: &mut dyn SecretPrompt,
) -> Result<Option<(Credential, CredentialSource)>> {
    if use_keyring {
        if let Some(c) = Credential::from_keyring(KEYRING_SERVICE, provider.id()) {
            return Ok(Some((c, CredentialSource::Keyring)));
        }
    }

    if let Some(var) = provider.credential_env_var() {
        if let Some(c) = Credential::from_env(&var) {
            return Ok(Some((c, CredentialSource::Environment)));
        }
    }

    if !provider.requires_credential() {
        return Ok(None);
    }

    let secret = secrets.prompt_secret(&prompt_label(provider, false))?;
    Ok(Credential::new(secret).map(|c| (c, CredentialSource::Prompt)))
}
