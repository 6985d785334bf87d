use async_trait::async_trait;
use uuid::Uuid;

use super::catalog::ProductSnapshot;
use super::errors::{GatewayError, PricingError, RepositoryError};
use super::identity::RequestContext;
use super::order::{ListResult, NewOrder, Order, OrderItem, OrderStatus};
use super::payment::{PaymentIntent, PaymentProof};

#[async_trait]
pub trait CatalogReader: Send + Sync + 'static {
    async fn fetch_product(&self, id: &str) -> Result<Option<ProductSnapshot>, PricingError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    /// Creates a remote payment intent for `amount` minor units.
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentIntent, GatewayError>;

    async fn fetch_payment_intent(&self, gateway_order_id: &str)
        -> Result<PaymentIntent, GatewayError>;

    /// Pure check of the payment signature; never performs I/O.
    fn verify_signature(&self, proof: &PaymentProof) -> bool;

    /// Tags `payload` with the merchant key so it can travel through the client.
    fn seal(&self, payload: &[u8]) -> String;

    fn verify_seal(&self, payload: &[u8], tag: &str) -> bool;
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn insert_header(&self, header: &NewOrder) -> Result<(), RepositoryError>;
    async fn insert_items(&self, items: &[OrderItem]) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepositoryError>;
    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Order>, RepositoryError>;
    async fn list(&self, page: i64, limit: i64) -> Result<ListResult, RepositoryError>;

    /// Removes the order and its items unconditionally. Only used to undo a
    /// half-written order.
    async fn delete_order(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// Removes the order and its items only if it is still in `expected`.
    /// Returns whether a row was deleted.
    async fn delete_if_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
    ) -> Result<bool, RepositoryError>;

    /// Sets `next` only if the order is still in `expected`. Returns whether a
    /// row changed.
    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, RepositoryError>;

    /// Writes header and items as one unit.
    ///
    /// Stores without multi-statement transactions get header-then-items with
    /// a compensating delete of the header when the items fail. Stores that
    /// can do better override this.
    async fn create_order(
        &self,
        header: NewOrder,
        items: Vec<OrderItem>,
    ) -> Result<Order, RepositoryError> {
        self.insert_header(&header).await?;

        if let Err(e) = self.insert_items(&items).await {
            let compensated = match self.delete_order(header.id).await {
                Ok(()) => true,
                Err(cleanup) => {
                    log::error!(
                        "Compensating delete of order {} failed, manual review needed: {}",
                        header.id,
                        cleanup
                    );
                    false
                }
            };
            return Err(RepositoryError::ItemsNotPersisted {
                cause: e.to_string(),
                compensated,
            });
        }

        self.find_by_id(header.id)
            .await?
            .ok_or_else(|| RepositoryError::Internal(format!("order {} vanished", header.id)))
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn resolve(&self, token: &str) -> Result<Option<RequestContext>, RepositoryError>;
}
