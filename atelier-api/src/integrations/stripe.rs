/// Stripe payments client and webhook verification
///
/// Token purchases go through PaymentIntents: the API creates the intent,
/// the browser confirms it with Stripe.js, and Stripe reports the outcome
/// through a signed webhook.
///
/// # Webhook signatures
///
/// The `Stripe-Signature` header looks like `t=1700000000,v1=<hex>,v1=<hex>`.
/// Each `v1` is `HMAC-SHA256(webhook_secret, "{t}.{raw body}")`; the event is
/// accepted when any `v1` matches and `t` is within the tolerance window.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;

use super::{check_status, IntegrationError, SignatureError};
use crate::config::StripeConfig;

const SERVICE: &str = "Stripe";
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Maximum accepted age (and clock skew) of a webhook signature, in seconds
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }

    /// `metadata[user_id]` written at creation
    pub fn user_id(&self) -> Option<&str> {
        self.metadata.get("user_id").map(String::as_str)
    }

    /// `metadata[tokens]` written at creation
    pub fn tokens(&self) -> Option<i64> {
        self.metadata.get("tokens").and_then(|t| t.parse().ok())
    }
}

/// Webhook event; only `data.object` is kept, as raw JSON
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub object: serde_json::Value,
}

pub struct StripeClient<'a> {
    http: &'a reqwest::Client,
    config: &'a StripeConfig,
}

impl<'a> StripeClient<'a> {
    pub fn new(
        http: &'a reqwest::Client,
        config: Option<&'a StripeConfig>,
    ) -> Result<Self, IntegrationError> {
        let config = config.ok_or(IntegrationError::NotConfigured("Stripe"))?;
        Ok(Self { http, config })
    }

    pub fn webhook_secret(&self) -> &str {
        &self.config.webhook_secret
    }

    pub async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &[(&str, String)],
    ) -> Result<PaymentIntent, IntegrationError> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".to_string(), amount_cents.to_string()),
            ("currency".to_string(), currency.to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        for (key, value) in metadata {
            form.push((format!("metadata[{}]", key), value.clone()));
        }

        let response = self
            .http
            .post(format!("{}/payment_intents", BASE_URL))
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(IntegrationError::request(SERVICE))?;

        check_status(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(IntegrationError::decode(SERVICE))
    }

    pub async fn retrieve_payment_intent(
        &self,
        id: &str,
    ) -> Result<PaymentIntent, IntegrationError> {
        let response = self
            .http
            .get(format!("{}/payment_intents/{}", BASE_URL, id))
            .bearer_auth(&self.config.secret_key)
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

/// Hex HMAC-SHA256 over `"{timestamp}.{payload}"`
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    hex::encode(mac.finalize().into_bytes())
}

/// Checks a `Stripe-Signature` header against the raw request body
pub fn verify_webhook_signature(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?;

    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse::<i64>().map_err(|_| SignatureError::Malformed)?)
            }
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }

    if now.abs_diff(timestamp) > WEBHOOK_TOLERANCE_SECS.unsigned_abs() {
        return Err(SignatureError::Expired);
    }

    let matched = signatures.iter().any(|candidate| {
        let Ok(expected) = hex::decode(candidate) else {
            return false;
        };
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const PAYLOAD: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
    const TS: i64 = 1_700_000_000;

    #[test]
    fn test_compute_signature_vector() {
        assert_eq!(
            compute_signature(SECRET, TS, PAYLOAD),
            "001ce3ef73e456cedaab328328720d3ad59defb8bbd0f1518f46c04ad4ac0bb7"
        );
    }

    #[test]
    fn test_valid_signature_accepted() {
        let header = format!("t={},v1={}", TS, compute_signature(SECRET, TS, PAYLOAD));
        assert_eq!(
            verify_webhook_signature(PAYLOAD, Some(&header), SECRET, TS + 10),
            Ok(())
        );
    }

    #[test]
    fn test_any_matching_v1_is_enough() {
        let header = format!(
            "t={},v1={},v1={}",
            TS,
            "00".repeat(32),
            compute_signature(SECRET, TS, PAYLOAD)
        );
        assert!(verify_webhook_signature(PAYLOAD, Some(&header), SECRET, TS).is_ok());
    }

    #[test]
    fn test_rejections() {
        let good = compute_signature(SECRET, TS, PAYLOAD);

        assert_eq!(
            verify_webhook_signature(PAYLOAD, None, SECRET, TS),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verify_webhook_signature(PAYLOAD, Some("v1=abc"), SECRET, TS),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_webhook_signature(
                PAYLOAD,
                Some(&format!("t={},v1={}", TS, good)),
                SECRET,
                TS + WEBHOOK_TOLERANCE_SECS + 1
            ),
            Err(SignatureError::Expired)
        );
        assert_eq!(
            verify_webhook_signature(
                b"tampered",
                Some(&format!("t={},v1={}", TS, good)),
                SECRET,
                TS
            ),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_extreme_timestamps_are_expired() {
        for (timestamp, now) in [(i64::MIN, TS), (i64::MAX, TS), (TS, i64::MIN), (i64::MIN, i64::MAX)] {
            let header = format!("t={},v1={}", timestamp, "00".repeat(32));
            assert_eq!(
                verify_webhook_signature(PAYLOAD, Some(&header), SECRET, now),
                Err(SignatureError::Expired)
            );
        }
    }

    #[test]
    fn test_intent_metadata_accessors() {
        let intent: PaymentIntent = serde_json::from_str(
            r#"{
                "id": "pi_1",
                "amount": 2000,
                "currency": "usd",
                "status": "succeeded",
                "client_secret": "pi_1_secret",
                "metadata": {"user_id": "u1", "tokens": "500"}
            }"#,
        )
        .unwrap();

        assert!(intent.succeeded());
        assert_eq!(intent.user_id(), Some("u1"));
        assert_eq!(intent.tokens(), Some(500));
    }
}
