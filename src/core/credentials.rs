//! Secure credential storage using the system keyring
//!
//! This module handles secure storage of the GitHub credential:
//! - the OAuth access token (`github-token`)
//! - the identity it belongs to (`github-user`, serialized as JSON)
//!
//! The keyring is reached through the `SecretStorage` trait so the store can
//! run against an in-memory backend in tests.

use std::collections::HashMap;
use std::sync::RwLock;

use keyring::Entry;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{ExtsyncError, Result};
use crate::github::client::{GitHubUser, IdentityApi};

const SERVICE_NAME: &str = "extsync";
const GITHUB_TOKEN_KEY: &str = "github-token";
const GITHUB_USER_KEY: &str = "github-user";

/// Key/value secret backend
pub trait SecretStorage: Send + Sync {
    /// Read a secret; `None` if it does not exist
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Create or replace a secret
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Remove a secret; succeeds if it does not exist
    fn delete(&self, key: &str) -> Result<()>;
}

/// Secrets kept in the OS keyring (macOS Keychain, Linux Secret Service)
#[derive(Debug, Default)]
pub struct KeyringStorage;

impl SecretStorage for KeyringStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = Entry::new(SERVICE_NAME, key)?;
        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ExtsyncError::Credential(format!(
                "Cannot access system keychain. Make sure your keyring is unlocked. ({})",
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Already deleted
            Err(e) => Err(ExtsyncError::Credential(e.to_string())),
        }
    }
}

/// Secrets kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    fn poisoned() -> ExtsyncError {
        ExtsyncError::Credential("in-memory secret storage is poisoned".to_string())
    }
}

impl SecretStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

/// The stored GitHub credential
#[derive(Debug, Clone)]
pub struct Credential {
    /// OAuth access token
    pub access_token: SecretString,
    /// Identity the token was issued to
    pub user: GitHubUser,
}

impl Credential {
    /// Login name of the token owner
    pub fn login(&self) -> &str {
        &self.user.login
    }

    /// Numeric id of the token owner
    pub fn owner_id(&self) -> u64 {
        self.user.id
    }
}

/// Credential store for secure token management
pub struct CredentialStore<S = KeyringStorage> {
    storage: S,
}

impl CredentialStore<KeyringStorage> {
    /// Store backed by the system keyring
    pub fn keyring() -> Self {
        Self::new(KeyringStorage)
    }
}

impl<S: SecretStorage> CredentialStore<S> {
    /// Create a store over the given backend
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Return the stored credential, if both token and identity are present
    ///
    /// Never touches the network.
    pub fn get(&self) -> Result<Option<Credential>> {
        let Some(token) = self.storage.get(GITHUB_TOKEN_KEY)? else {
            return Ok(None);
        };
        let Some(user_json) = self.storage.get(GITHUB_USER_KEY)? else {
            return Ok(None);
        };

        let user: GitHubUser = serde_json::from_str(&user_json).map_err(|e| {
            ExtsyncError::Credential(format!("Invalid stored identity: {}", e))
        })?;

        Ok(Some(Credential {
            access_token: SecretString::from(token),
            user,
        }))
    }

    /// Get the credential, returning an error if not authenticated
    pub fn require(&self) -> Result<Credential> {
        self.get()?.ok_or(ExtsyncError::NotAuthenticated)
    }

    /// Persist a token together with its identity
    ///
    /// The identity is written first; if the token write fails the identity
    /// is removed again so no half-credential is left behind.
    pub fn save(&self, token: &SecretString, user: &GitHubUser) -> Result<()> {
        let user_json = serde_json::to_string(user)?;
        self.storage.set(GITHUB_USER_KEY, &user_json)?;

        if let Err(e) = self.storage.set(GITHUB_TOKEN_KEY, token.expose_secret()) {
            let _ = self.storage.delete(GITHUB_USER_KEY);
            return Err(e);
        }

        Ok(())
    }

    /// Delete both entries; succeeds when nothing is stored
    pub fn clear(&self) -> Result<()> {
        let token = self.storage.delete(GITHUB_TOKEN_KEY);
        let user = self.storage.delete(GITHUB_USER_KEY);
        token.and(user)
    }

    /// Check the stored token against GitHub
    ///
    /// Returns false when nothing is stored, when storage cannot be read, or
    /// when the identity lookup fails for any reason.
    pub async fn is_valid(&self, identity: &dyn IdentityApi) -> bool {
        let credential = match self.get() {
            Ok(Some(credential)) => credential,
            Ok(None) => return false,
            Err(e) => {
                tracing::debug!("Credential lookup failed: {}", e);
                return false;
            }
        };

        match identity.current_user(&credential.access_token).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Stored token rejected: {}", e);
                false
            }
        }
    }
}

/// Get a masked version of a token for display (shows first 4 and last 4 chars)
pub fn mask_token(token: &SecretString) -> String {
    let chars: Vec<char> = token.expose_secret().chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
