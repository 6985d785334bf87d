use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use log::{error, info, warn};
use uuid::Uuid;

use crate::domain::catalog::{sum_line_totals, CheckoutRequest, PricedCheckout};
use crate::domain::errors::{CheckoutError, RepositoryError, ValidationError};
use crate::domain::order::{NewOrder, Order, OrderItem, OrderStatus, PaymentStatus};
use crate::domain::payment::{to_minor_units, PaymentIntent, PaymentProof};
use crate::domain::ports::{CatalogReader, OrderRepository, PaymentGateway};

use super::pricing::price_cart;

pub const ORDER_DATA_MISMATCH: &str = "Order data does not match payment";

/// Result of the first checkout phase: the remote intent plus the priced
/// cart the client must send back when it verifies the payment.
#[derive(Debug, Clone)]
pub struct CheckoutStarted {
    pub intent: PaymentIntent,
    pub checkout: PricedCheckout,
}

/// Drives a checkout across its two requests. Holds no state between them.
pub struct CheckoutService {
    catalog: Arc<dyn CatalogReader>,
    gateway: Arc<dyn PaymentGateway>,
    orders: Arc<dyn OrderRepository>,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        catalog: Arc<dyn CatalogReader>,
        gateway: Arc<dyn PaymentGateway>,
        orders: Arc<dyn OrderRepository>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            gateway,
            orders,
            currency: currency.into(),
        }
    }

    /// Prices the cart against the catalog and opens a payment intent for the
    /// total. Nothing is persisted.
    pub async fn begin_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutStarted, CheckoutError> {
        let items = price_cart(self.catalog.as_ref(), &request.lines).await?;

        let total = sum_line_totals(&items);
        if total <= BigDecimal::zero() {
            return Err(ValidationError::new("Order total must be greater than zero").into());
        }
        let amount = to_minor_units(&total).map_err(CheckoutError::IntentCreation)?;

        let receipt = format!("rcpt_{}", Uuid::new_v4().simple());
        let intent = self
            .gateway
            .create_payment_intent(amount, &self.currency, &receipt)
            .await
            .map_err(CheckoutError::IntentCreation)?;

        info!(
            "Created payment intent {} for {} {} ({} lines)",
            intent.gateway_order_id,
            intent.amount,
            intent.currency,
            items.len()
        );

        let mut checkout = PricedCheckout {
            razorpay_order_id: intent.gateway_order_id.clone(),
            total_amount: total,
            items,
            shipping_address: request.shipping_address,
            customer: request.customer,
            seal: String::new(),
        };
        checkout.seal = self.gateway.seal(&checkout.sealed_payload());

        Ok(CheckoutStarted { intent, checkout })
    }

    /// Verifies the payment proof and persists the order. Replaying the same
    /// proof returns the order created by the first call.
    pub async fn complete_checkout(
        &self,
        proof: PaymentProof,
        checkout: PricedCheckout,
    ) -> Result<Order, CheckoutError> {
        if !self.gateway.verify_signature(&proof) {
            warn!(
                "Rejected payment {} for {}: signature mismatch",
                proof.gateway_payment_id, proof.gateway_order_id
            );
            return Err(CheckoutError::InvalidSignature);
        }

        if let Some(existing) = self.existing_order(&proof.gateway_order_id).await? {
            warn!(
                "Payment for {} already recorded as order {}; returning it",
                proof.gateway_order_id, existing.id
            );
            return Ok(existing);
        }

        self.check_against_intent(&proof, &checkout).await?;

        let (header, items) = build_order(&proof, checkout);
        let order_id = header.id;

        match self.orders.create_order(header, items).await {
            Ok(order) => {
                info!(
                    "Order {} confirmed for payment {} ({})",
                    order.id, proof.gateway_payment_id, order.total_amount
                );
                Ok(order)
            }
            Err(RepositoryError::Duplicate(gateway_order_id)) => {
                // A concurrent verification of the same payment won.
                let existing = self.existing_order(&gateway_order_id).await?;
                existing.ok_or(CheckoutError::Persistence(RepositoryError::Duplicate(
                    gateway_order_id,
                )))
            }
            Err(e) => {
                error!("Failed to persist order {}: {}", order_id, e);
                Err(CheckoutError::Persistence(e))
            }
        }
    }

    async fn existing_order(&self, gateway_order_id: &str) -> Result<Option<Order>, CheckoutError> {
        self.orders
            .find_by_gateway_order_id(gateway_order_id)
            .await
            .map_err(CheckoutError::Persistence)
    }

    /// The priced cart is client-held between the two calls, so it is only
    /// accepted if it carries our seal, is internally consistent and its
    /// total is exactly what the gateway intent was opened for.
    async fn check_against_intent(
        &self,
        proof: &PaymentProof,
        checkout: &PricedCheckout,
    ) -> Result<(), CheckoutError> {
        let mismatch = || CheckoutError::Validation(ValidationError::new(ORDER_DATA_MISMATCH));

        if !self
            .gateway
            .verify_seal(&checkout.sealed_payload(), &checkout.seal)
        {
            warn!(
                "Order data for {} does not carry a valid seal",
                proof.gateway_order_id
            );
            return Err(mismatch());
        }

        if checkout.razorpay_order_id != proof.gateway_order_id
            || checkout.items.is_empty()
            || !checkout.items.iter().all(|line| line.is_consistent())
            || sum_line_totals(&checkout.items) != checkout.total_amount
        {
            return Err(mismatch());
        }

        let intent = self
            .gateway
            .fetch_payment_intent(&proof.gateway_order_id)
            .await
            .map_err(CheckoutError::IntentLookup)?;
        let expected = to_minor_units(&checkout.total_amount).map_err(|_| mismatch())?;

        if intent.amount != expected || intent.currency != self.currency {
            warn!(
                "Order data for {} totals {} but intent is {} {}",
                proof.gateway_order_id, expected, intent.amount, intent.currency
            );
            return Err(mismatch());
        }
        Ok(())
    }
}

fn build_order(proof: &PaymentProof, checkout: PricedCheckout) -> (NewOrder, Vec<OrderItem>) {
    let order_id = Uuid::new_v4();
    let customer = checkout.customer;

    let header = NewOrder {
        id: order_id,
        billing_address: customer
            .billing_address
            .unwrap_or_else(|| checkout.shipping_address.clone()),
        customer_email: customer.email,
        customer_name: customer.name,
        customer_phone: customer.phone,
        shipping_address: checkout.shipping_address,
        total_amount: checkout.total_amount,
        status: OrderStatus::Confirmed,
        payment_status: PaymentStatus::Paid,
        razorpay_order_id: Some(proof.gateway_order_id.clone()),
        razorpay_payment_id: Some(proof.gateway_payment_id.clone()),
    };

    let items = checkout
        .items
        .into_iter()
        .map(|line| OrderItem {
            id: Uuid::new_v4(),
            order_id,
            product_id: line.product_id,
            product_name: line.product_name,
            product_slug: line.product_slug,
            quantity: line.quantity,
            price: line.unit_price,
        })
        .collect();

    (header, items)
}
