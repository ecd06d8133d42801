/// Mux video client
///
/// Uses HTTP basic auth with the access token id/secret. Every Mux response
/// wraps its payload in `{"data": ...}`.

use atelier_shared::models::video::{MuxSync, VideoStatus};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use super::{check_status, IntegrationError};
use crate::config::MuxConfig;

const SERVICE: &str = "Mux";
const BASE_URL: &str = "https://api.mux.com/video/v1";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackId {
    pub id: String,
    pub policy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuxAsset {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub playback_ids: Vec<PlaybackId>,
    pub duration: Option<f64>,
}

impl MuxAsset {
    /// First public playback id, if any
    pub fn public_playback_id(&self) -> Option<&str> {
        self.playback_ids
            .iter()
            .find(|p| p.policy == "public")
            .map(|p| p.id.as_str())
    }

    /// Fields to copy onto the `videos` row
    pub fn to_sync(&self) -> MuxSync {
        MuxSync {
            asset_id: self.id.clone(),
            playback_id: self.public_playback_id().map(str::to_string),
            duration_seconds: self.duration,
            status: Some(VideoStatus::from_mux(&self.status)),
        }
    }
}

/// Direct upload target for browser/CLI uploads straight to Mux
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuxUpload {
    pub id: String,
    pub url: String,
    pub status: String,
    pub asset_id: Option<String>,
}

pub struct MuxClient<'a> {
    http: &'a reqwest::Client,
    config: &'a MuxConfig,
}

impl<'a> MuxClient<'a> {
    pub fn new(
        http: &'a reqwest::Client,
        config: Option<&'a MuxConfig>,
    ) -> Result<Self, IntegrationError> {
        let config = config.ok_or(IntegrationError::NotConfigured("Mux"))?;
        Ok(Self { http, config })
    }

    /// Creates an asset from a publicly reachable source URL
    pub async fn create_asset(&self, input_url: &str) -> Result<MuxAsset, IntegrationError> {
        let body = json!({
            "input": [{ "url": input_url }],
            "playback_policy": ["public"],
        });

        self.post("/assets", body).await
    }

    pub async fn get_asset(&self, asset_id: &str) -> Result<MuxAsset, IntegrationError> {
        let response = self
            .http
            .get(format!("{}/assets/{}", BASE_URL, asset_id))
            .basic_auth(&self.config.token_id, Some(&self.config.token_secret))
            .send()
            .await
            .map_err(IntegrationError::request(SERVICE))?;

        unwrap_envelope(response).await
    }

    /// Creates a direct upload URL; the asset appears once the upload finishes
    pub async fn create_direct_upload(
        &self,
        cors_origin: &str,
    ) -> Result<MuxUpload, IntegrationError> {
        let body = json!({
            "cors_origin": cors_origin,
            "new_asset_settings": { "playback_policy": ["public"] },
        });

        self.post("/uploads", body).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, IntegrationError> {
        let response = self
            .http
            .post(format!("{}{}", BASE_URL, path))
            .basic_auth(&self.config.token_id, Some(&self.config.token_secret))
            .json(&body)
            .send()
            .await
            .map_err(IntegrationError::request(SERVICE))?;

        unwrap_envelope(response).await
    }
}

async fn unwrap_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, IntegrationError> {
    let envelope: Envelope<T> = check_status(SERVICE, response)
        .await?
        .json()
        .await
        .map_err(IntegrationError::decode(SERVICE))?;

    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_envelope_parsing() {
        let raw = r#"{
            "data": {
                "id": "asset123",
                "status": "ready",
                "duration": 12.5,
                "playback_ids": [
                    {"id": "signed1", "policy": "signed"},
                    {"id": "public1", "policy": "public"}
                ]
            }
        }"#;

        let envelope: Envelope<MuxAsset> = serde_json::from_str(raw).unwrap();
        let sync = envelope.data.to_sync();

        assert_eq!(sync.asset_id, "asset123");
        assert_eq!(sync.playback_id.as_deref(), Some("public1"));
        assert_eq!(sync.duration_seconds, Some(12.5));
        assert_eq!(sync.status, Some(VideoStatus::Ready));
    }

    #[test]
    fn test_preparing_asset_without_playback() {
        let asset: MuxAsset =
            serde_json::from_str(r#"{"id": "a", "status": "preparing"}"#).unwrap();
        let sync = asset.to_sync();

        assert!(sync.playback_id.is_none());
        assert_eq!(sync.status, Some(VideoStatus::Preparing));
    }
}
