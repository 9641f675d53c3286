//! Provider error types

use std::time::Duration;
use thiserror::Error;

/// Provider errors
///
/// Every failure is terminal for the current operation. Nothing at this
/// layer retries; the host runtime decides whether to run the operation again.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Unknown resource kind: {0}")]
    UnknownResource(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Remote call failure; the API error is the source
    #[error("{context}")]
    Api {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(
        "unexpected state '{state}', wanted target '{}'",
        .expected.join(", ")
    )]
    UnexpectedState {
        state: String,
        expected: Vec<String>,
    },

    #[error(
        "timeout while waiting for state to become '{}' (last state: '{last_state}', timeout: {timeout:?})",
        .target.join(", ")
    )]
    Timeout {
        last_state: String,
        target: Vec<String>,
        timeout: Duration,
    },

    #[error(
        "The supplied {attribute} contains {actual} bytes after encoding, this exceeds the limit of {limit} bytes"
    )]
    SizeLimit {
        attribute: &'static str,
        actual: usize,
        limit: usize,
    },

    /// Created remotely, then failed to settle; the host keeps `id` so the
    /// resource can be read or destroyed later
    #[error("{id} was created but did not become ready")]
    Tainted {
        id: String,
        #[source]
        source: Box<CloudError>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Wrap a remote-call failure with the operation that issued it
    pub fn api(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        CloudError::Api {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Record that `id` exists remotely even though the operation failed
    pub fn tainted(self, id: impl Into<String>) -> Self {
        if matches!(self, CloudError::Tainted { .. }) {
            return self;
        }
        CloudError::Tainted {
            id: id.into(),
            source: Box::new(self),
        }
    }

    /// Id of a resource left behind by a failed create
    pub fn tainted_id(&self) -> Option<&str> {
        match self {
            CloudError::Tainted { id, .. } => Some(id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_last_state() {
        let err = CloudError::Timeout {
            last_state: "creating".to_string(),
            target: vec!["active".to_string(), "inactive".to_string()],
            timeout: Duration::from_secs(300),
        };
        let message = err.to_string();
        assert!(message.contains("last state: 'creating'"));
        assert!(message.contains("'active, inactive'"));
    }

    #[test]
    fn test_size_limit_message() {
        let err = CloudError::SizeLimit {
            attribute: "user_data",
            actual: 16388,
            limit: 16384,
        };
        assert_eq!(
            err.to_string(),
            "The supplied user_data contains 16388 bytes after encoding, this exceeds the limit of 16384 bytes"
        );
    }

    #[test]
    fn test_api_error_keeps_context_prefix() {
        let io = std::io::Error::other("connection reset");
        let err = CloudError::api("Error creating server", io);
        assert_eq!(err.to_string(), "Error creating server");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "connection reset");
    }

    #[test]
    fn test_tainted_keeps_id_and_cause() {
        let timeout = CloudError::Timeout {
            last_state: "creating".to_string(),
            target: vec!["active".to_string()],
            timeout: Duration::from_secs(1),
        };
        let err = timeout.tainted("srv-12345").tainted("srv-other");

        assert_eq!(err.tainted_id(), Some("srv-12345"));
        assert_eq!(err.to_string(), "srv-12345 was created but did not become ready");
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("last state: 'creating'"));
        assert_eq!(CloudError::Validation("x".to_string()).tainted_id(), None);
    }
}
