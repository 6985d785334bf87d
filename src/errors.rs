use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

use crate::domain::errors::{
    CheckoutError, OrderError, PricingError, RepositoryError, ValidationError,
};

pub const CREATE_ORDER_FAILED: &str = "Failed to create payment order";
pub const VERIFY_PAYMENT_FAILED: &str = "Failed to verify payment";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Admin access required")]
    Forbidden,

    #[error("Order not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    /// `message` is what the client sees; the cause only goes to the log.
    #[error("{message}")]
    Internal {
        message: &'static str,
        needs_review: bool,
    },
}

impl AppError {
    pub fn internal(message: &'static str) -> Self {
        AppError::Internal {
            message,
            needs_review: false,
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::BadRequest(e.0)
    }
}

impl From<CheckoutError> for AppError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Validation(v) => AppError::BadRequest(v.0),
            CheckoutError::Pricing(PricingError::CatalogUnavailable(cause)) => {
                log::error!("Catalog lookup failed: {}", cause);
                AppError::internal(CREATE_ORDER_FAILED)
            }
            CheckoutError::Pricing(p) => AppError::BadRequest(p.to_string()),
            CheckoutError::IntentCreation(g) => {
                log::error!("Payment intent creation failed: {}", g);
                AppError::internal(CREATE_ORDER_FAILED)
            }
            CheckoutError::IntentLookup(g) => {
                log::error!("Payment intent lookup failed: {}", g);
                AppError::internal(VERIFY_PAYMENT_FAILED)
            }
            CheckoutError::InvalidSignature => {
                AppError::BadRequest("Invalid payment signature".to_string())
            }
            CheckoutError::Persistence(RepositoryError::ItemsNotPersisted {
                compensated, ..
            }) => AppError::Internal {
                message: VERIFY_PAYMENT_FAILED,
                needs_review: !compensated,
            },
            CheckoutError::Persistence(r) => {
                log::error!("Order persistence failed: {}", r);
                AppError::internal(VERIFY_PAYMENT_FAILED)
            }
        }
    }
}

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound => AppError::NotFound,
            OrderError::Forbidden => AppError::Forbidden,
            e @ (OrderError::InvalidTransition { .. }
            | OrderError::ConcurrentUpdate
            | OrderError::NotDeletable(_)) => AppError::Conflict(e.to_string()),
            OrderError::Repository(r) => {
                log::error!("Order store failure: {}", r);
                AppError::internal("Internal server error")
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Internal {
                needs_review: true, ..
            } => json!({ "error": self.to_string(), "needs_review": true }),
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::GatewayError;
    use crate::domain::order::OrderStatus;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;

    async fn body_json(err: AppError) -> serde_json::Value {
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::NotFound.error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn not_found_display() {
        assert_eq!(AppError::NotFound.to_string(), "Order not found");
    }

    #[test]
    fn signature_mismatch_is_a_bad_request() {
        let err: AppError = CheckoutError::InvalidSignature.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid payment signature");
    }

    #[test]
    fn pricing_failures_are_bad_requests() {
        let err: AppError = CheckoutError::Pricing(PricingError::InsufficientStock {
            name: "Paithani".to_string(),
            requested: 10,
            available: 5,
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("Insufficient stock"));
    }

    #[test]
    fn gateway_failure_hides_the_cause() {
        let err: AppError =
            CheckoutError::IntentCreation(GatewayError::Transport("dns error".to_string())).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), CREATE_ORDER_FAILED);
    }

    #[test]
    fn validation_message_is_passed_through() {
        let err: AppError =
            CheckoutError::Validation(ValidationError::new("Missing order data")).into();
        assert_eq!(err.to_string(), "Missing order data");
    }

    #[test]
    fn order_conflicts_map_to_409() {
        let err: AppError = OrderError::NotDeletable(OrderStatus::Shipped).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        let err: AppError = OrderError::ConcurrentUpdate.into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn repository_failure_maps_to_500() {
        let err: AppError = OrderError::Repository(RepositoryError::Internal("boom".into())).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[actix_web::test]
    async fn failed_compensation_is_flagged_for_review() {
        let err: AppError = CheckoutError::Persistence(RepositoryError::ItemsNotPersisted {
            cause: "insert failed".to_string(),
            compensated: false,
        })
        .into();

        let body = body_json(err).await;
        assert_eq!(body["error"], VERIFY_PAYMENT_FAILED);
        assert_eq!(body["needs_review"], true);
    }

    #[actix_web::test]
    async fn compensated_failure_is_not_flagged() {
        let err: AppError = CheckoutError::Persistence(RepositoryError::ItemsNotPersisted {
            cause: "insert failed".to_string(),
            compensated: true,
        })
        .into();

        let body = body_json(err).await;
        assert_eq!(body["error"], VERIFY_PAYMENT_FAILED);
        assert!(body.get("needs_review").is_none());
    }
}
