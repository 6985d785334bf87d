use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{Order, OrderItem};
use crate::errors::AppError;
use crate::AppState;

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub product_slug: String,
    pub quantity: i32,
    /// Decimal unit price as a string, e.g. "1000.00"
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub billing_address: String,
    /// Decimal total as a string
    pub total_amount: String,
    pub status: String,
    pub payment_status: String,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub order_items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderEnvelope {
    pub order: OrderResponse,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(i: OrderItem) -> Self {
        Self {
            id: i.id,
            order_id: i.order_id,
            product_id: i.product_id,
            product_name: i.product_name,
            product_slug: i.product_slug,
            quantity: i.quantity,
            price: i.price.to_string(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            customer_email: o.customer_email,
            customer_name: o.customer_name,
            customer_phone: o.customer_phone,
            shipping_address: o.shipping_address,
            billing_address: o.billing_address,
            total_amount: o.total_amount.to_string(),
            status: o.status.to_string(),
            payment_status: o.payment_status.to_string(),
            razorpay_order_id: o.razorpay_order_id,
            razorpay_payment_id: o.razorpay_payment_id,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
            order_items: o.items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

/// Order ids that do not parse cannot exist.
pub(crate) fn parse_order_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders/{id}
///
/// Returns the order together with its items.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = String, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderEnvelope),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = parse_order_id(&path.into_inner())?;

    let order = state.orders.get_order(order_id).await?;

    Ok(HttpResponse::Ok().json(OrderEnvelope {
        order: order.into(),
    }))
}
