use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::identity::RequestContext;
use crate::domain::order::OrderStatus;
use crate::errors::AppError;
use crate::AppState;

use super::orders::{parse_order_id, OrderEnvelope, OrderResponse};

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of PENDING, CONFIRMED, PROCESSING, SHIPPED, DELIVERED, CANCELLED
    pub status: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /admin/orders
///
/// Paginated order headers, newest first. Items are not included.
#[utoipa::path(
    get,
    path = "/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 401, description = "Missing or invalid session"),
        (status = 403, description = "Caller is not an admin"),
    ),
    tag = "admin"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    ctx: RequestContext,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = state.orders.list_orders(&ctx, page, limit).await?;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// PATCH /admin/orders/{id}/status
#[utoipa::path(
    patch,
    path = "/admin/orders/{id}/status",
    params(
        ("id" = String, Path, description = "Order UUID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderEnvelope),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed or order changed concurrently"),
    ),
    tag = "admin"
)]
pub async fn update_order_status(
    state: web::Data<AppState>,
    ctx: RequestContext,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = parse_order_id(&path.into_inner())?;
    let next: OrderStatus = body
        .status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown order status '{}'", body.status)))?;

    let order = state.orders.update_status(&ctx, order_id, next).await?;

    Ok(HttpResponse::Ok().json(OrderEnvelope {
        order: order.into(),
    }))
}

/// DELETE /admin/orders/{id}
///
/// Removes an abandoned order that never got paid.
#[utoipa::path(
    delete,
    path = "/admin/orders/{id}",
    params(
        ("id" = String, Path, description = "Order UUID"),
    ),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is not pending"),
    ),
    tag = "admin"
)]
pub async fn delete_order(
    state: web::Data<AppState>,
    ctx: RequestContext,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = parse_order_id(&path.into_inner())?;

    state.orders.delete_pending_order(&ctx, order_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
