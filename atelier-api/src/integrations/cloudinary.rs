/// Cloudinary media client
///
/// Signing itself lives in `atelier_shared::cloudinary` so the upload CLI can
/// verify bundles with the same rules; this client performs the calls that
/// need the API secret server-side.

use atelier_shared::cloudinary::{sign_params, sign_upload, upload_url, SignatureBundle};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{check_status, IntegrationError};
use crate::config::CloudinaryConfig;

const SERVICE: &str = "Cloudinary";

/// Result of a destroy call (`ok` or `not found`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroyResult {
    pub result: String,
}

pub struct CloudinaryClient<'a> {
    http: &'a reqwest::Client,
    config: &'a CloudinaryConfig,
}

impl<'a> CloudinaryClient<'a> {
    pub fn new(
        http: &'a reqwest::Client,
        config: Option<&'a CloudinaryConfig>,
    ) -> Result<Self, IntegrationError> {
        let config = config.ok_or(IntegrationError::NotConfigured("Cloudinary"))?;
        Ok(Self { http, config })
    }

    /// Signature bundle for a direct upload into `folder`
    pub fn sign(&self, folder: Option<&str>) -> SignatureBundle {
        sign_upload(
            folder,
            Utc::now().timestamp(),
            &self.config.api_key,
            &self.config.api_secret,
            &self.config.cloud_name,
        )
    }

    /// Uploads a small file in one request and returns Cloudinary's asset JSON
    pub async fn upload(
        &self,
        data: Bytes,
        filename: String,
        folder: Option<&str>,
        resource_type: &str,
    ) -> Result<serde_json::Value, IntegrationError> {
        let bundle = self.sign(folder);

        let file = reqwest::multipart::Part::stream(data).file_name(filename);
        let mut form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("api_key", bundle.api_key.clone())
            .text("timestamp", bundle.timestamp.to_string())
            .text("signature", bundle.signature.clone());
        if let Some(folder) = bundle.folder.clone() {
            form = form.text("folder", folder);
        }

        let response = self
            .http
            .post(upload_url(&self.config.cloud_name, resource_type))
            .multipart(form)
            .send()
            .await
            .map_err(IntegrationError::request(SERVICE))?;

        check_status(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(IntegrationError::decode(SERVICE))
    }

    /// Deletes an asset by public id
    pub async fn destroy(
        &self,
        public_id: &str,
        resource_type: &str,
    ) -> Result<DestroyResult, IntegrationError> {
        let timestamp = Utc::now().timestamp().to_string();

        let mut params = BTreeMap::new();
        params.insert("public_id".to_string(), public_id.to_string());
        params.insert("timestamp".to_string(), timestamp.clone());
        let signature = sign_params(&params, &self.config.api_secret);

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/{}/destroy",
            self.config.cloud_name, resource_type
        );

        let response = self
            .http
            .post(url)
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.config.api_key.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await
            .map_err(IntegrationError::request(SERVICE))?;

        check_status(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(IntegrationError::decode(SERVICE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_config() {
        let http = reqwest::Client::new();
        assert!(matches!(
            CloudinaryClient::new(&http, None),
            Err(IntegrationError::NotConfigured("Cloudinary"))
        ));
    }

    #[test]
    fn test_sign_uses_configured_account() {
        let http = reqwest::Client::new();
        let config = CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        };
        let client = CloudinaryClient::new(&http, Some(&config)).unwrap();

        let bundle = client.sign(Some("portfolio"));
        assert_eq!(bundle.cloud_name, "demo");
        assert_eq!(bundle.api_key, "key");
        assert_eq!(bundle.signature.len(), 64);
        assert_eq!(bundle.folder.as_deref(), Some("portfolio"));
    }

    #[test]
    fn test_destroy_result_passes_through_as_json() {
        let result: DestroyResult = serde_json::from_str(r#"{"result":"not found"}"#).unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({ "result": "not found" })
        );
    }
}
