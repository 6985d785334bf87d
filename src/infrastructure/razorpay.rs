use async_trait::async_trait;
use chrono::DateTime;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use crate::config::RazorpayConfig;
use crate::domain::errors::GatewayError;
use crate::domain::payment::{PaymentIntent, PaymentProof};
use crate::domain::ports::PaymentGateway;

type HmacSha256 = Hmac<Sha256>;

// ── Signatures ────────────────────────────────────────────────────────────────

fn signature_mac(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC-SHA256 takes any key length"));
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(gateway_payment_id.as_bytes());
    mac
}

/// Hex-encoded HMAC-SHA256 of `order_id|payment_id`, as produced by the
/// checkout SDK after a successful payment.
pub fn sign(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> String {
    hex::encode(
        signature_mac(secret, gateway_order_id, gateway_payment_id)
            .finalize()
            .into_bytes(),
    )
}

/// Constant-time check of a payment signature. Anything that does not decode
/// to the expected MAC is simply a mismatch.
pub fn verify_signature(secret: &str, proof: &PaymentProof) -> bool {
    let Ok(provided) = hex::decode(proof.signature.trim()) else {
        return false;
    };
    signature_mac(secret, &proof.gateway_order_id, &proof.gateway_payment_id)
        .verify_slice(&provided)
        .is_ok()
}

/// Prefix that keeps checkout seals disjoint from payment signatures, which
/// are computed over `order_id|payment_id` with the same key.
const SEAL_CONTEXT: &[u8] = b"checkout-seal:v1\n";

fn seal_mac(secret: &str, payload: &[u8]) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC-SHA256 takes any key length"));
    mac.update(SEAL_CONTEXT);
    mac.update(payload);
    mac
}

/// Hex-encoded HMAC-SHA256 binding a priced checkout to the key secret.
pub fn seal(secret: &str, payload: &[u8]) -> String {
    hex::encode(seal_mac(secret, payload).finalize().into_bytes())
}

pub fn verify_seal(secret: &str, payload: &[u8], tag: &str) -> bool {
    let Ok(provided) = hex::decode(tag.trim()) else {
        return false;
    };
    seal_mac(secret, payload).verify_slice(&provided).is_ok()
}

// ── HTTP adapter ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RazorpayOrder {
    id: String,
    amount: i64,
    currency: String,
    created_at: i64,
}

impl TryFrom<RazorpayOrder> for PaymentIntent {
    type Error = GatewayError;

    fn try_from(order: RazorpayOrder) -> Result<Self, Self::Error> {
        let created_at = DateTime::from_timestamp(order.created_at, 0).ok_or_else(|| {
            GatewayError::Decode(format!("invalid created_at {}", order.created_at))
        })?;
        Ok(PaymentIntent {
            gateway_order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            created_at,
        })
    }
}

pub struct RazorpayGateway {
    http: reqwest::Client,
    api_base: String,
    key_id: String,
    key_secret: SecretString,
}

impl RazorpayGateway {
    pub fn new(config: &RazorpayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        })
    }

    async fn read_order(resp: reqwest::Response) -> Result<PaymentIntent, GatewayError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let order: RazorpayOrder = resp
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        order.try_into()
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        if amount <= 0 {
            return Err(GatewayError::InvalidAmount(amount.to_string()));
        }

        let resp = self
            .http
            .post(format!("{}/v1/orders", self.api_base))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&json!({
                "amount": amount,
                "currency": currency,
                "receipt": receipt,
            }))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Self::read_order(resp).await
    }

    async fn fetch_payment_intent(
        &self,
        gateway_order_id: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        let resp = self
            .http
            .get(format!("{}/v1/orders/{}", self.api_base, gateway_order_id))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Self::read_order(resp).await
    }

    fn verify_signature(&self, proof: &PaymentProof) -> bool {
        verify_signature(self.key_secret.expose_secret(), proof)
    }

    fn seal(&self, payload: &[u8]) -> String {
        seal(self.key_secret.expose_secret(), payload)
    }

    fn verify_seal(&self, payload: &[u8], tag: &str) -> bool {
        verify_seal(self.key_secret.expose_secret(), payload, tag)
    }
}
