//! GitHub API client wrapper using octocrab

use async_trait::async_trait;
use octocrab::Octocrab;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Authenticated GitHub identity, as returned by `GET /user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubUser {
    /// Login name
    pub login: String,
    /// Numeric user id
    pub id: u64,
    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: String,
    /// Display name, if public
    #[serde(default)]
    pub name: Option<String>,
    /// Email, if public
    #[serde(default)]
    pub email: Option<String>,
}

/// Looks up the identity a token belongs to
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Fetch the user owning `token`; fails if GitHub rejects the token
    async fn current_user(&self, token: &SecretString) -> Result<GitHubUser>;
}

/// GitHub API client wrapper
///
/// Built from an explicit access token; callers obtain the token from the
/// `CredentialStore`.
pub struct GitHubClient {
    /// The octocrab instance
    inner: Octocrab,
}

impl GitHubClient {
    /// Create a new GitHub client authenticated with `token`
    pub fn new(token: &SecretString) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(token.expose_secret().to_string())
            .build()?;

        Ok(Self { inner: octocrab })
    }

    /// Get the inner octocrab instance
    pub fn octocrab(&self) -> &Octocrab {
        &self.inner
    }

    /// Fetch the authenticated user
    pub async fn current_user(&self) -> Result<GitHubUser> {
        // GitHub API: GET /user
        let user: GitHubUser = self.inner.get("/user", None::<&()>).await?;
        Ok(user)
    }
}

/// Identity lookups against api.github.com
#[derive(Debug, Default)]
pub struct GitHubIdentity;

#[async_trait]
impl IdentityApi for GitHubIdentity {
    async fn current_user(&self, token: &SecretString) -> Result<GitHubUser> {
        GitHubClient::new(token)?.current_user().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserializes_with_optional_fields_missing() {
        let json = r#"{"login":"alice","id":42,"avatar_url":"https://avatars.example/u/42"}"#;
        let user: GitHubUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.login, "alice");
        assert_eq!(user.id, 42);
        assert!(user.name.is_none());
        assert!(user.email.is_none());
    }

    #[test]
    fn test_user_ignores_unknown_fields() {
        let json = r#"{"login":"bob","id":7,"avatar_url":"","name":"Bob","email":null,"type":"User","site_admin":false}"#;
        let user: GitHubUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.name.as_deref(), Some("Bob"));
    }
}
