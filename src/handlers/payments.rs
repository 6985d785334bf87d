use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::checkout_service::CheckoutStarted;
use crate::domain::catalog::{CartLine, CheckoutRequest, CustomerDetails, PricedCheckout, PricedLine};
use crate::domain::errors::ValidationError;
use crate::domain::payment::PaymentProof;
use crate::errors::AppError;
use crate::AppState;

use super::orders::OrderResponse;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartItemRequest {
    /// Catalog product id
    pub id: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetailsDto {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Falls back to the shipping address when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Option<Vec<CartItemRequest>>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetailsDto>,
}

/// A cart line priced by the server. Decimal values are strings, e.g. "1000.00".
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricedLineDto {
    pub product_id: String,
    pub product_name: String,
    pub product_slug: String,
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub line_total: BigDecimal,
}

/// Returned by create-order and sent back unchanged to verify.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDataDto {
    pub razorpay_order_id: String,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    pub items: Vec<PricedLineDto>,
    pub shipping_address: String,
    pub customer_details: CustomerDetailsDto,
    /// Server-issued tag over the fields above; any edit invalidates it.
    #[serde(default)]
    pub seal: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentOrderDto {
    /// Gateway order id
    pub id: String,
    /// Amount in the smallest currency unit (paise)
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order: PaymentOrderDto,
    #[serde(rename = "orderData")]
    pub order_data: OrderDataDto,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
    #[serde(default, rename = "orderData")]
    pub order_data: Option<OrderDataDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub order: OrderResponse,
    pub message: String,
}

// ── Boundary conversions ─────────────────────────────────────────────────────

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<CreateOrderRequest> for CheckoutRequest {
    type Error = ValidationError;

    fn try_from(req: CreateOrderRequest) -> Result<Self, Self::Error> {
        let items = req
            .items
            .filter(|items| !items.is_empty())
            .ok_or_else(|| ValidationError::new("Missing cart items"))?;
        let shipping_address = non_blank(req.shipping_address)
            .ok_or_else(|| ValidationError::new("Missing shipping address"))?;
        let details = req
            .customer_details
            .ok_or_else(|| ValidationError::new("Missing customer details"))?;

        let customer = match (
            non_blank(Some(details.name)),
            non_blank(Some(details.email)),
            non_blank(Some(details.phone)),
        ) {
            (Some(name), Some(email), Some(phone)) => CustomerDetails {
                name,
                email,
                phone,
                billing_address: non_blank(details.billing_address),
            },
            _ => return Err(ValidationError::new("Missing customer details")),
        };

        let lines = items
            .into_iter()
            .map(|item| {
                if item.id.trim().is_empty() {
                    return Err(ValidationError::new("Missing product id"));
                }
                if item.quantity <= 0 {
                    return Err(ValidationError::new(format!(
                        "Invalid quantity for product {}",
                        item.id
                    )));
                }
                Ok(CartLine {
                    product_id: item.id,
                    quantity: item.quantity,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CheckoutRequest {
            lines,
            shipping_address,
            customer,
        })
    }
}

impl From<CustomerDetails> for CustomerDetailsDto {
    fn from(c: CustomerDetails) -> Self {
        Self {
            name: c.name,
            email: c.email,
            phone: c.phone,
            billing_address: c.billing_address,
        }
    }
}

impl From<CustomerDetailsDto> for CustomerDetails {
    fn from(c: CustomerDetailsDto) -> Self {
        Self {
            name: c.name,
            email: c.email,
            phone: c.phone,
            billing_address: c.billing_address,
        }
    }
}

impl From<PricedLine> for PricedLineDto {
    fn from(l: PricedLine) -> Self {
        Self {
            product_id: l.product_id,
            product_name: l.product_name,
            product_slug: l.product_slug,
            unit_price: l.unit_price,
            quantity: l.quantity,
            line_total: l.line_total,
        }
    }
}

impl From<PricedLineDto> for PricedLine {
    fn from(l: PricedLineDto) -> Self {
        Self {
            product_id: l.product_id,
            product_name: l.product_name,
            product_slug: l.product_slug,
            unit_price: l.unit_price,
            quantity: l.quantity,
            line_total: l.line_total,
        }
    }
}

impl From<PricedCheckout> for OrderDataDto {
    fn from(c: PricedCheckout) -> Self {
        Self {
            razorpay_order_id: c.razorpay_order_id,
            total_amount: c.total_amount,
            items: c.items.into_iter().map(PricedLineDto::from).collect(),
            shipping_address: c.shipping_address,
            customer_details: c.customer.into(),
            seal: c.seal,
        }
    }
}

impl From<OrderDataDto> for PricedCheckout {
    fn from(d: OrderDataDto) -> Self {
        Self {
            razorpay_order_id: d.razorpay_order_id,
            total_amount: d.total_amount,
            items: d.items.into_iter().map(PricedLine::from).collect(),
            shipping_address: d.shipping_address,
            customer: d.customer_details.into(),
            seal: d.seal,
        }
    }
}

impl From<CheckoutStarted> for CreateOrderResponse {
    fn from(started: CheckoutStarted) -> Self {
        Self {
            success: true,
            order: PaymentOrderDto {
                id: started.intent.gateway_order_id,
                amount: started.intent.amount,
                currency: started.intent.currency,
            },
            order_data: started.checkout.into(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /payments/create-order
///
/// Prices the cart against the catalog and opens a payment intent for the
/// total. Nothing is stored; `orderData` must be sent back to
/// `/payments/verify` unchanged.
#[utoipa::path(
    post,
    path = "/payments/create-order",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Payment intent created", body = CreateOrderResponse),
        (status = 400, description = "Invalid cart, unknown or inactive product, insufficient stock"),
        (status = 500, description = "Payment gateway failure"),
    ),
    tag = "payments"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let request = CheckoutRequest::try_from(body.into_inner())?;

    let started = state.checkout.begin_checkout(request).await?;

    Ok(HttpResponse::Ok().json(CreateOrderResponse::from(started)))
}

/// POST /payments/verify
///
/// Checks the payment signature and records the paid order with its items.
/// Verifying the same payment again returns the order recorded the first time.
#[utoipa::path(
    post,
    path = "/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified, order recorded", body = VerifyPaymentResponse),
        (status = 400, description = "Missing payment details, missing order data or invalid signature"),
        (status = 500, description = "Failed to verify payment"),
    ),
    tag = "payments"
)]
pub async fn verify_payment(
    state: web::Data<AppState>,
    body: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let proof = PaymentProof::parse(
        body.razorpay_order_id,
        body.razorpay_payment_id,
        body.razorpay_signature,
    )?;
    let order_data = body
        .order_data
        .ok_or_else(|| ValidationError::new("Missing order data"))?;

    let order = state
        .checkout
        .complete_checkout(proof, order_data.into())
        .await?;

    Ok(HttpResponse::Ok().json(VerifyPaymentResponse {
        success: true,
        order: order.into(),
        message: "Payment verified successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(body: serde_json::Value) -> Result<CheckoutRequest, ValidationError> {
        let req: CreateOrderRequest = serde_json::from_value(body).expect("valid json shape");
        CheckoutRequest::try_from(req)
    }

    fn customer() -> serde_json::Value {
        json!({ "name": "Lakshmi", "email": "l@example.com", "phone": "9000000001" })
    }

    #[test]
    fn well_formed_request_is_accepted() {
        let req = parse(json!({
            "items": [{ "id": "p1", "quantity": 2, "price": 1 }],
            "shippingAddress": "4 Silk Street",
            "customerDetails": customer()
        }))
        .expect("valid request");

        assert_eq!(req.lines, vec![CartLine { product_id: "p1".to_string(), quantity: 2 }]);
        assert_eq!(req.customer.billing_address, None);
    }

    #[test]
    fn missing_pieces_are_named() {
        let err = parse(json!({ "shippingAddress": "x", "customerDetails": customer() }))
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing cart items");

        let err = parse(json!({ "items": [{ "id": "p1", "quantity": 1 }], "customerDetails": customer() }))
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing shipping address");

        let err = parse(json!({ "items": [{ "id": "p1", "quantity": 1 }], "shippingAddress": "x" }))
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing customer details");
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let err = parse(json!({
            "items": [{ "id": "p1", "quantity": 0 }],
            "shippingAddress": "x",
            "customerDetails": customer()
        }))
        .unwrap_err();

        assert_eq!(err.to_string(), "Invalid quantity for product p1");
    }

    #[test]
    fn order_data_uses_camel_case_keys() {
        let dto = OrderDataDto {
            razorpay_order_id: "order_1".to_string(),
            total_amount: BigDecimal::from(2000),
            items: vec![],
            shipping_address: "x".to_string(),
            customer_details: CustomerDetailsDto {
                name: "n".to_string(),
                email: "e".to_string(),
                phone: "p".to_string(),
                billing_address: None,
            },
            seal: "ab12".to_string(),
        };

        let value = serde_json::to_value(&dto).unwrap();

        assert_eq!(value["razorpayOrderId"], "order_1");
        assert_eq!(value["totalAmount"], "2000");
        assert!(value["customerDetails"].get("billingAddress").is_none());
        assert_eq!(value["seal"], "ab12");
    }
}
