//! Server user data encoding
//!
//! User data travels base64 encoded and is limited in size. State never holds
//! the plain payload: it keeps either a digest of it or the base64 form the
//! configuration supplied.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use brightbox_cloud::{CloudError, Result};
use sha2::{Digest, Sha256};

/// Maximum encoded size accepted by the API, in bytes
pub const USER_DATA_SIZE_LIMIT: usize = 16384;

pub fn is_base64(value: &str) -> bool {
    STANDARD.decode(value).is_ok()
}

/// Base64 encode a plain payload unless it is already base64
pub fn encode_plain(plain: &str) -> String {
    if is_base64(plain) {
        plain.to_string()
    } else {
        STANDARD.encode(plain)
    }
}

/// Transport form of the configured user data, if any
///
/// At most one of the two representations may be set.
pub fn encode(user_data: Option<&str>, user_data_base64: Option<&str>) -> Result<Option<String>> {
    let user_data = user_data.filter(|v| !v.is_empty());
    let user_data_base64 = user_data_base64.filter(|v| !v.is_empty());

    let (attribute, encoded) = match (user_data, user_data_base64) {
        (Some(_), Some(_)) => {
            return Err(CloudError::Validation(
                "user_data conflicts with user_data_base64".to_string(),
            ));
        }
        (Some(plain), None) => ("user_data", encode_plain(plain)),
        (None, Some(encoded)) => {
            validate_base64(encoded)?;
            ("user_data_base64", encoded.to_string())
        }
        (None, None) => return Ok(None),
    };

    check_size(attribute, &encoded)?;
    Ok(Some(encoded))
}

pub fn validate_base64(value: &str) -> Result<()> {
    if is_base64(value) {
        Ok(())
    } else {
        Err(CloudError::Validation(
            "user_data_base64 must be base64 encoded".to_string(),
        ))
    }
}

pub fn check_size(attribute: &'static str, encoded: &str) -> Result<()> {
    if encoded.len() > USER_DATA_SIZE_LIMIT {
        return Err(CloudError::SizeLimit {
            attribute,
            actual: encoded.len(),
            limit: USER_DATA_SIZE_LIMIT,
        });
    }
    Ok(())
}

/// SHA-256 hex digest of the payload carried by a base64 string
pub fn digest(encoded: &str) -> String {
    let payload = STANDARD
        .decode(encoded)
        .unwrap_or_else(|_| encoded.as_bytes().to_vec());
    hex::encode(Sha256::digest(&payload))
}
