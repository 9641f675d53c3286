//! Mapping of API client failures into provider errors

use brightbox_cloud::{CloudError, Result};

/// Attach the failing operation to an API error
pub(crate) trait ApiResultExt<T> {
    /// Prefix any error with `context`, e.g. "Error creating server"
    fn context(self, context: &str) -> Result<T>;

    /// Like [`context`](ApiResultExt::context), but a 404 becomes `Ok(None)`
    fn found(self, context: &str) -> Result<Option<T>>;
}

impl<T> ApiResultExt<T> for brightbox_api::Result<T> {
    fn context(self, context: &str) -> Result<T> {
        self.map_err(|e| CloudError::api(context, e))
    }

    fn found(self, context: &str) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(CloudError::api(context, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brightbox_api::ApiError;

    fn status(code: u16) -> brightbox_api::Result<()> {
        Err(ApiError::Status {
            status: code,
            name: "missing_resource".to_string(),
            message: "Resource not found".to_string(),
        })
    }

    #[test]
    fn test_context_prefixes_message() {
        let err = status(500).context("Error creating server").unwrap_err();
        assert!(matches!(err, CloudError::Api { .. }));
        assert_eq!(err.to_string(), "Error creating server");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(
            source.to_string(),
            "API error (HTTP 500): missing_resource: Resource not found"
        );
    }

    #[test]
    fn test_found_maps_not_found_only() {
        assert!(status(404).found("Error retrieving server").unwrap().is_none());
        assert!(status(403).found("Error retrieving server").is_err());
        let ok: brightbox_api::Result<u8> = Ok(1);
        assert_eq!(ok.found("x").unwrap(), Some(1));
    }
}
