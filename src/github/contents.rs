//! Repository file synchronization
//!
//! Reconciles a local artifact with a single file in the sync repository
//! through the GitHub contents API:
//!
//! - `upsert` reads the file's current sha, then writes the new content with
//!   that sha (update) or without one (create).
//! - `fetch` reads and decodes the file, reporting absence as
//!   `RemoteNotFound`.
//!
//! The read and the write are two separate requests. GitHub rejects a write
//! whose sha no longer matches, which is reported as an error and never
//! retried; a change landing between the two requests is not otherwise
//! detected.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::repository::RepositoryCoordinate;
use crate::error::{ExtsyncError, Result};
use crate::github::client::GitHubClient;
use crate::github::error_handler::STATUS_NOT_FOUND;

/// Encoding GitHub uses when it inlines file content
const INLINE_ENCODING: &str = "base64";

/// File metadata and content as returned by the contents endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFileContent {
    /// Revision token of the current version
    pub sha: String,
    /// Base64 content, possibly wrapped across lines
    #[serde(default)]
    pub content: String,
    /// `base64` when `content` is inlined; `none` for files over 1 MB
    #[serde(default)]
    pub encoding: Option<String>,
    /// File size in bytes
    #[serde(default)]
    pub size: u64,
}

impl RemoteFileContent {
    /// Decode the inlined content of the file at `path`
    ///
    /// Fails rather than returning an empty payload when GitHub left the
    /// content out.
    pub fn decode(&self, path: &str) -> Result<Vec<u8>> {
        if let Some(encoding) = self.encoding.as_deref() {
            if encoding != INLINE_ENCODING {
                return Err(ExtsyncError::GitHubApi {
                    status: None,
                    message: format!(
                        "'{}' ({} bytes) was returned with encoding '{}'; only inlined base64 content can be read",
                        path, self.size, encoding
                    ),
                });
            }
        }

        let bytes = decode_content(&self.content, path)?;
        if bytes.is_empty() && self.size > 0 {
            return Err(ExtsyncError::GitHubApi {
                status: None,
                message: format!(
                    "'{}' has {} bytes but GitHub returned no content",
                    path, self.size
                ),
            });
        }
        Ok(bytes)
    }
}

/// Body of a create-or-update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutFileRequest {
    /// Commit message
    pub message: String,
    /// Base64 content
    pub content: String,
    /// Revision token being replaced; absent when creating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutFileResponse {
    content: Option<PutFileContent>,
}

#[derive(Debug, Deserialize)]
struct PutFileContent {
    sha: String,
}

/// The per-file contents endpoint
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentsApi: Send + Sync {
    /// Read a file; fails with `RemoteNotFound` when it does not exist
    async fn get_file(&self, repo: &RepositoryCoordinate, path: &str)
        -> Result<RemoteFileContent>;

    /// Create or update a file, returning the new revision token
    async fn put_file(
        &self,
        repo: &RepositoryCoordinate,
        path: &str,
        request: PutFileRequest,
    ) -> Result<String>;
}

/// `/repos/{owner}/{repo}/contents/{path}` with every segment percent-encoded
fn contents_route(repo: &RepositoryCoordinate, path: &str) -> Result<String> {
    let invalid = || ExtsyncError::InvalidInput(format!("Cannot build a route for '{}'", path));

    let mut url = Url::parse("https://api.github.com/").map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(["repos", repo.owner.as_str(), repo.name.as_str(), "contents"])
        .extend(path.split('/').filter(|segment| !segment.is_empty()));

    Ok(url.path().to_string())
}

#[async_trait]
impl ContentsApi for GitHubClient {
    async fn get_file(
        &self,
        repo: &RepositoryCoordinate,
        path: &str,
    ) -> Result<RemoteFileContent> {
        // GitHub API: GET /repos/{owner}/{repo}/contents/{path}
        let route = contents_route(repo, path)?;

        match self.octocrab().get(&route, None::<&()>).await {
            Ok(file) => Ok(file),
            Err(e) => Err(not_found_in_context(e.into(), repo, path)),
        }
    }

    async fn put_file(
        &self,
        repo: &RepositoryCoordinate,
        path: &str,
        request: PutFileRequest,
    ) -> Result<String> {
        // GitHub API: PUT /repos/{owner}/{repo}/contents/{path}
        let route = contents_route(repo, path)?;

        let response: PutFileResponse = self.octocrab().put(&route, Some(&request)).await?;

        response
            .content
            .map(|c| c.sha)
            .ok_or_else(|| ExtsyncError::GitHubApi {
                status: None,
                message: format!("GitHub did not return a revision for '{}'", path),
            })
    }
}

/// Attach the file being read to a 404
fn not_found_in_context(
    err: ExtsyncError,
    repo: &RepositoryCoordinate,
    path: &str,
) -> ExtsyncError {
    match err {
        ExtsyncError::GitHubApi {
            status: Some(STATUS_NOT_FOUND),
            ..
        } => ExtsyncError::RemoteNotFound {
            repository: repo.full_name(),
            path: path.to_string(),
        },
        other => other,
    }
}

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertKind {
    /// The file did not exist and was created
    Created,
    /// An existing file was replaced
    Updated,
}

/// Result of an upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Whether the file was created or updated
    pub kind: UpsertKind,
    /// Revision token of the written version
    pub sha: String,
}

/// Create-or-update-or-fetch operations on one repository
pub struct RemoteFileSync<'a> {
    api: &'a dyn ContentsApi,
    repo: RepositoryCoordinate,
}

impl<'a> RemoteFileSync<'a> {
    /// Create a syncer for `repo`
    pub fn new(api: &'a dyn ContentsApi, repo: RepositoryCoordinate) -> Self {
        Self { api, repo }
    }

    /// The repository this syncer writes to
    pub fn repository(&self) -> &RepositoryCoordinate {
        &self.repo
    }

    /// Write `content` to `path`, creating the file if it does not exist
    pub async fn upsert(&self, content: &[u8], path: &str) -> Result<UpsertOutcome> {
        let existing_sha = match self.api.get_file(&self.repo, path).await {
            Ok(existing) => Some(existing.sha),
            Err(ExtsyncError::RemoteNotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        let (kind, message) = match existing_sha {
            Some(ref sha) => {
                tracing::debug!("Updating {} in {} (sha {})", path, self.repo, sha);
                (UpsertKind::Updated, format!("Update {}", path))
            }
            None => {
                tracing::debug!("Creating {} in {}", path, self.repo);
                (UpsertKind::Created, format!("Create {}", path))
            }
        };

        let request = PutFileRequest {
            message,
            content: STANDARD.encode(content),
            sha: existing_sha,
        };
        let sha = self.api.put_file(&self.repo, path, request).await?;

        Ok(UpsertOutcome { kind, sha })
    }

    /// Read and decode the file at `path`
    pub async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let file = self.api.get_file(&self.repo, path).await?;
        file.decode(path)
    }

    /// Like `fetch`, but absence is `Ok(None)`
    pub async fn fetch_optional(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.fetch(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Decode contents-API base64, which GitHub wraps at 60 columns
pub fn decode_content(encoded: &str, path: &str) -> Result<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ExtsyncError::GitHubApi {
            status: None,
            message: format!("'{}' has malformed content: {}", path, e),
        })
}
