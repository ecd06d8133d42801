/// Cloudinary request signing
///
/// Signed uploads let a client talk to Cloudinary directly without ever
/// seeing the API secret. The signature is computed over the request
/// parameters:
///
/// 1. drop `file`, `cloud_name`, `resource_type`, `api_key` and empty values
/// 2. sort the rest by key and join as `k=v&k=v`
/// 3. append the API secret and hash with SHA-256 (hex)
///
/// The Cloudinary account must be configured for SHA-256 signatures.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Parameters Cloudinary leaves out of the signature
const UNSIGNED_PARAMS: &[&str] = &["file", "cloud_name", "resource_type", "api_key"];

/// Everything a client needs to upload directly to Cloudinary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBundle {
    pub timestamp: i64,
    pub signature: String,
    pub api_key: String,
    pub cloud_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

impl SignatureBundle {
    /// Upload endpoint for `resource_type` (`image`, `video`, `raw`, `auto`)
    pub fn upload_url(&self, resource_type: &str) -> String {
        upload_url(&self.cloud_name, resource_type)
    }
}

pub fn upload_url(cloud_name: &str, resource_type: &str) -> String {
    format!(
        "https://api.cloudinary.com/v1_1/{}/{}/upload",
        cloud_name, resource_type
    )
}

/// Canonical `k=v&k=v` string that gets signed
pub fn string_to_sign(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(k, v)| !v.is_empty() && !UNSIGNED_PARAMS.contains(&k.as_str()))
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Signs a parameter set with the API secret
pub fn sign_params(params: &BTreeMap<String, String>, api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Builds a signed bundle for an upload into `folder`
pub fn sign_upload(
    folder: Option<&str>,
    timestamp: i64,
    api_key: &str,
    api_secret: &str,
    cloud_name: &str,
) -> SignatureBundle {
    let mut params = BTreeMap::new();
    params.insert("timestamp".to_string(), timestamp.to_string());
    if let Some(folder) = folder {
        params.insert("folder".to_string(), folder.to_string());
    }

    SignatureBundle {
        timestamp,
        signature: sign_params(&params, api_secret),
        api_key: api_key.to_string(),
        cloud_name: cloud_name.to_string(),
        folder: folder.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_string_to_sign_sorted_and_filtered() {
        let p = params(&[
            ("timestamp", "1700000000"),
            ("folder", "art"),
            ("api_key", "123"),
            ("file", "@bytes"),
            ("tags", ""),
        ]);
        assert_eq!(string_to_sign(&p), "folder=art&timestamp=1700000000");
    }

    #[test]
    fn test_sign_params_sha256() {
        let p = params(&[("timestamp", "1700000000"), ("folder", "art")]);
        assert_eq!(
            sign_params(&p, "abcd"),
            "0bbb9245ebdaf680b69971b15a28bfee969a0ad24c57ce5fadbd2a09319805bd"
        );
    }

    #[test]
    fn test_sign_upload_bundle() {
        let bundle = sign_upload(Some("art"), 1_700_000_000, "key", "abcd", "demo");
        assert_eq!(
            bundle.signature,
            "0bbb9245ebdaf680b69971b15a28bfee969a0ad24c57ce5fadbd2a09319805bd"
        );
        assert_eq!(bundle.folder.as_deref(), Some("art"));
        assert_eq!(
            bundle.upload_url("video"),
            "https://api.cloudinary.com/v1_1/demo/video/upload"
        );
    }

    #[test]
    fn test_destroy_params_signature() {
        let p = params(&[("public_id", "sample"), ("timestamp", "1315060510")]);
        assert_eq!(
            sign_params(&p, "abcd"),
            "0d4fe14b2b4a3f68a97ccc5097c43908b623d24293c296826a9390c14d891509"
        );
    }
}
