//! Typed errors for the Outline adapter.
//!
//! [`RpcError`] is the taxonomy every remote call surfaces to the host.
//! [`CredentialError`] covers local credential checks and the `auth.info`
//! call used to validate a key before any import.

use thiserror::Error;

/// Errors raised by a single Outline RPC call.
///
/// These propagate to the host unmodified; nothing in this crate retries or
/// recovers from them.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The API key was rejected (HTTP 401 or 403).
    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// The requested object (or the API itself) does not exist (HTTP 404).
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Any other failure reported by the API.
    #[error("Outline API error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A 2xx response whose body could not be understood.
    #[error("invalid response from {method}: {reason}")]
    InvalidResponse { method: String, reason: String },
}

impl RpcError {
    /// HTTP status behind this error, when there was a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            RpcError::Auth { status, .. } | RpcError::Remote { status, .. } => Some(*status),
            RpcError::NotFound { .. } => Some(404),
            RpcError::Transport(_) | RpcError::InvalidResponse { .. } => None,
        }
    }
}

/// Errors raised while validating host-supplied credentials.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("API key is required")]
    MissingApiKey,

    #[error("Workspace URL is required")]
    MissingWorkspaceUrl,

    #[error("Workspace URL must start with http:// or https://")]
    InvalidScheme,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Invalid workspace URL or API not accessible")]
    WorkspaceNotAccessible,

    #[error("API request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Cannot connect to workspace URL. Please check the URL is correct. ({0})")]
    Unreachable(String),

    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

impl From<RpcError> for CredentialError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::Auth { .. } => CredentialError::InvalidApiKey,
            RpcError::NotFound { .. } => CredentialError::WorkspaceNotAccessible,
            RpcError::Remote { status, message } => {
                CredentialError::RequestFailed { status, message }
            }
            RpcError::Transport(source) => CredentialError::Unreachable(source.to_string()),
            RpcError::InvalidResponse { reason, .. } => CredentialError::Unexpected(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_maps_to_invalid_api_key() {
        let err = RpcError::Auth {
            status: 401,
            message: "authentication_required".into(),
        };
        assert_eq!(err.status(), Some(401));
        assert_eq!(CredentialError::from(err), CredentialError::InvalidApiKey);
    }

    #[test]
    fn not_found_maps_to_workspace_not_accessible() {
        let err = RpcError::NotFound {
            message: "not_found".into(),
        };
        assert_eq!(
            CredentialError::from(err).to_string(),
            "Invalid workspace URL or API not accessible"
        );
    }

    #[test]
    fn transport_error_keeps_source_message() {
        let err = RpcError::Transport("connection refused".into());
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("connection refused"));
        match CredentialError::from(err) {
            CredentialError::Unreachable(msg) => assert_eq!(msg, "connection refused"),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn remote_error_display_carries_status_and_message() {
        let err = RpcError::Remote {
            status: 500,
            message: "internal_error".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("internal_error"));
    }
}
