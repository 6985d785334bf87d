use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use chrono::{DateTime, Utc};

use super::errors::{GatewayError, ValidationError};

/// A payment intent ("order" in Razorpay terms) owned by the gateway.
/// `amount` is in the smallest currency unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub gateway_order_id: String,
    pub amount: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Converts a major-unit amount (rupees) into minor units (paise), rounding
/// half-up to the nearest unit. Only strictly positive amounts are accepted.
pub fn to_minor_units(amount: &BigDecimal) -> Result<i64, GatewayError> {
    let minor = (amount * BigDecimal::from(100)).with_scale_round(0, RoundingMode::HalfUp);
    match minor.to_i64() {
        Some(value) if value > 0 => Ok(value),
        _ => Err(GatewayError::InvalidAmount(amount.to_string())),
    }
}

/// Proof of a completed payment as returned by the gateway's client SDK.
/// Constructed only when all three fields are present and non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProof {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

impl PaymentProof {
    pub fn parse(
        gateway_order_id: Option<String>,
        gateway_payment_id: Option<String>,
        signature: Option<String>,
    ) -> Result<Self, ValidationError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (
            present(gateway_order_id),
            present(gateway_payment_id),
            present(signature),
        ) {
            (Some(gateway_order_id), Some(gateway_payment_id), Some(signature)) => Ok(Self {
                gateway_order_id,
                gateway_payment_id,
                signature,
            }),
            _ => Err(ValidationError::new("Missing payment details")),
        }
    }
}
