use thiserror::Error;

use super::order::OrderStatus;

/// A request body that failed boundary validation. The message is safe to show
/// to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Product {0} not found")]
    ProductNotFound(String),
    #[error("Product {0} is not available")]
    ProductInactive(String),
    #[error("Insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        name: String,
        requested: i32,
        available: i32,
    },
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Invalid payment amount: {0}")]
    InvalidAmount(String),
    #[error("Payment gateway request failed: {0}")]
    Transport(String),
    #[error("Payment gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Unexpected payment gateway response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Order not found")]
    NotFound,
    #[error("An order already exists for gateway order {0}")]
    Duplicate(String),
    /// The header was written but its items were not. `compensated` tells
    /// whether the orphaned header was removed again.
    #[error("Order items could not be persisted (compensated: {compensated}): {cause}")]
    ItemsNotPersisted { cause: String, compensated: bool },
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Everything that can abort a checkout, tagged with the step that failed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error("Could not create payment intent: {0}")]
    IntentCreation(GatewayError),
    #[error("Could not look up payment intent: {0}")]
    IntentLookup(GatewayError),
    #[error("Invalid payment signature")]
    InvalidSignature,
    #[error("Could not persist order: {0}")]
    Persistence(RepositoryError),
}

/// Failures of order lookups and admin order mutations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found")]
    NotFound,
    #[error("Admin role required")]
    Forbidden,
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Order was modified concurrently")]
    ConcurrentUpdate,
    #[error("Only pending orders can be deleted (order is {0})")]
    NotDeletable(OrderStatus),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for OrderError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => OrderError::NotFound,
            other => OrderError::Repository(other),
        }
    }
}
