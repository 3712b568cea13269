//! GitHub API error classification
//!
//! Turns octocrab errors into typed `ExtsyncError`s by status code so call
//! sites can match on the kind of failure instead of inspecting messages.

use crate::error::ExtsyncError;

/// Status GitHub uses for a missing resource
pub const STATUS_NOT_FOUND: u16 = 404;

/// Classifies an octocrab error into a more specific ExtsyncError
pub fn classify_github_error(err: octocrab::Error) -> ExtsyncError {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            classify_status(source.status_code.as_u16(), source.message.clone())
        }
        other => ExtsyncError::GitHubApi {
            status: None,
            message: other.to_string(),
        },
    }
}

/// Classify a failed response by status code and GitHub's message
pub fn classify_status(status: u16, message: String) -> ExtsyncError {
    if status == 401 {
        return ExtsyncError::AuthenticationFailed(format!(
            "GitHub rejected the stored token ({})",
            message
        ));
    }

    if is_rate_limit_error(status, &message) {
        return ExtsyncError::GitHubApi {
            status: Some(status),
            message: "API rate limit exceeded. Please wait a few minutes and try again."
                .to_string(),
        };
    }

    ExtsyncError::GitHubApi {
        status: Some(status),
        message,
    }
}

/// Check if a response is a rate limit rejection
fn is_rate_limit_error(status: u16, message: &str) -> bool {
    status == 429 || (status == 403 && message.to_lowercase().contains("rate limit"))
}
