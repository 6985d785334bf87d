//! In-process adapters for the checkout ports.
//!
//! They keep state behind a mutex and can be told to fail specific calls,
//! which makes them suitable for exercising the compensation and idempotency
//! paths of the checkout without a database or a payment provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::catalog::ProductSnapshot;
use crate::domain::errors::{GatewayError, PricingError, RepositoryError};
use crate::domain::identity::RequestContext;
use crate::domain::order::{ListResult, NewOrder, Order, OrderItem, OrderStatus};
use crate::domain::payment::{PaymentIntent, PaymentProof};
use crate::domain::ports::{CatalogReader, IdentityProvider, OrderRepository, PaymentGateway};

use super::razorpay;

// ── Catalog ───────────────────────────────────────────────────────────────────

pub struct InMemoryCatalog {
    products: HashMap<String, ProductSnapshot>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<ProductSnapshot>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
    async fn fetch_product(&self, id: &str) -> Result<Option<ProductSnapshot>, PricingError> {
        Ok(self.products.get(id).cloned())
    }
}

// ── Orders ────────────────────────────────────────────────────────────────────

struct StoredOrder {
    header: NewOrder,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct OrderState {
    orders: HashMap<Uuid, StoredOrder>,
    items: Vec<OrderItem>,
}

impl OrderState {
    fn assemble(&self, stored: &StoredOrder) -> Order {
        let items = self
            .items
            .iter()
            .filter(|item| item.order_id == stored.header.id)
            .cloned()
            .collect();
        Order::from_parts(
            stored.header.clone(),
            items,
            stored.created_at,
            stored.updated_at,
        )
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    state: Mutex<OrderState>,
    fail_item_inserts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `insert_items` call fail.
    pub fn fail_item_inserts(&self, fail: bool) {
        self.fail_item_inserts.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `delete_order` call fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().map(|s| s.orders.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, OrderState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Internal("order store lock poisoned".to_string()))
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert_header(&self, header: &NewOrder) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;

        if let Some(gateway_id) = &header.razorpay_order_id {
            let taken = state
                .orders
                .values()
                .any(|o| o.header.razorpay_order_id.as_ref() == Some(gateway_id));
            if taken {
                return Err(RepositoryError::Duplicate(gateway_id.clone()));
            }
        }

        let now = Utc::now();
        state.orders.insert(
            header.id,
            StoredOrder {
                header: header.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn insert_items(&self, items: &[OrderItem]) -> Result<(), RepositoryError> {
        if self.fail_item_inserts.load(Ordering::SeqCst) {
            return Err(RepositoryError::Internal("item insert failed".to_string()));
        }
        let mut state = self.lock()?;
        if let Some(orphan) = items.iter().find(|i| !state.orders.contains_key(&i.order_id)) {
            return Err(RepositoryError::Internal(format!(
                "order {} does not exist",
                orphan.order_id
            )));
        }
        state.items.extend_from_slice(items);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.orders.get(&id).map(|stored| state.assemble(stored)))
    }

    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .orders
            .values()
            .find(|o| o.header.razorpay_order_id.as_deref() == Some(gateway_order_id))
            .map(|stored| state.assemble(stored)))
    }

    async fn list(&self, page: i64, limit: i64) -> Result<ListResult, RepositoryError> {
        let state = self.lock()?;

        let mut stored: Vec<&StoredOrder> = state.orders.values().collect();
        stored.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = usize::try_from((page - 1).max(0) * limit).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);
        let items = stored
            .iter()
            .skip(offset)
            .take(limit)
            .map(|o| Order::from_parts(o.header.clone(), vec![], o.created_at, o.updated_at))
            .collect();

        Ok(ListResult {
            items,
            total: state.orders.len() as i64,
        })
    }

    async fn delete_order(&self, id: Uuid) -> Result<(), RepositoryError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Internal("delete failed".to_string()));
        }
        let mut state = self.lock()?;
        if state.orders.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        state.items.retain(|item| item.order_id != id);
        Ok(())
    }

    async fn delete_if_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        let in_expected = state
            .orders
            .get(&id)
            .is_some_and(|stored| stored.header.status == expected);
        if !in_expected {
            return Ok(false);
        }
        state.orders.remove(&id);
        state.items.retain(|item| item.order_id != id);
        Ok(true)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        match state.orders.get_mut(&id) {
            Some(stored) if stored.header.status == expected => {
                stored.header.status = next;
                stored.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ── Payment gateway ───────────────────────────────────────────────────────────

/// Gateway that mints intents locally and checks signatures with the same
/// HMAC scheme as the real provider.
pub struct InMemoryGateway {
    secret: String,
    intents: Mutex<HashMap<String, PaymentIntent>>,
    next_id: AtomicU64,
    unavailable: AtomicBool,
}

impl InMemoryGateway {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            intents: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn intent_count(&self) -> usize {
        self.intents.lock().map(|i| i.len()).unwrap_or(0)
    }

    /// Signature the client SDK would hand back for this payment.
    pub fn sign(&self, gateway_order_id: &str, gateway_payment_id: &str) -> String {
        razorpay::sign(&self.secret, gateway_order_id, gateway_payment_id)
    }

    fn check_available(&self) -> Result<(), GatewayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("gateway unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        _receipt: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        self.check_available()?;
        if amount <= 0 {
            return Err(GatewayError::InvalidAmount(amount.to_string()));
        }

        let intent = PaymentIntent {
            gateway_order_id: format!("order_{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            amount,
            currency: currency.to_string(),
            created_at: Utc::now(),
        };
        self.intents
            .lock()
            .map_err(|_| GatewayError::Transport("intent store lock poisoned".to_string()))?
            .insert(intent.gateway_order_id.clone(), intent.clone());
        Ok(intent)
    }

    async fn fetch_payment_intent(
        &self,
        gateway_order_id: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        self.check_available()?;
        self.intents
            .lock()
            .map_err(|_| GatewayError::Transport("intent store lock poisoned".to_string()))?
            .get(gateway_order_id)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected {
                status: 400,
                body: format!("order {gateway_order_id} does not exist"),
            })
    }

    fn verify_signature(&self, proof: &PaymentProof) -> bool {
        razorpay::verify_signature(&self.secret, proof)
    }

    fn seal(&self, payload: &[u8]) -> String {
        razorpay::seal(&self.secret, payload)
    }

    fn verify_seal(&self, payload: &[u8], tag: &str) -> bool {
        razorpay::verify_seal(&self.secret, payload, tag)
    }
}

// ── Identity ──────────────────────────────────────────────────────────────────

/// Fixed token table.
#[derive(Default)]
pub struct StaticIdentityProvider {
    sessions: HashMap<String, RequestContext>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, token: impl Into<String>, ctx: RequestContext) -> Self {
        self.sessions.insert(token.into(), ctx);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Option<RequestContext>, RepositoryError> {
        Ok(self.sessions.get(token).copied())
    }
}
