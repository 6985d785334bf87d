use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::catalog::ProductSnapshot;
use crate::domain::errors::RepositoryError;
use crate::domain::order::{NewOrder, Order, OrderItem};
use crate::schema::{order_items, orders, products};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub billing_address: String,
    pub total_amount: BigDecimal,
    pub status: String,
    pub payment_status: String,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    pub fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, RepositoryError> {
        Ok(Order {
            id: self.id,
            customer_email: self.customer_email,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            shipping_address: self.shipping_address,
            billing_address: self.billing_address,
            total_amount: self.total_amount,
            status: self.status.parse().map_err(RepositoryError::Internal)?,
            payment_status: self
                .payment_status
                .parse()
                .map_err(RepositoryError::Internal)?,
            razorpay_order_id: self.razorpay_order_id,
            razorpay_payment_id: self.razorpay_payment_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items: items.into_iter().map(OrderItem::from).collect(),
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub billing_address: String,
    pub total_amount: BigDecimal,
    pub status: String,
    pub payment_status: String,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
}

impl From<&NewOrder> for NewOrderRow {
    fn from(o: &NewOrder) -> Self {
        Self {
            id: o.id,
            customer_email: o.customer_email.clone(),
            customer_name: o.customer_name.clone(),
            customer_phone: o.customer_phone.clone(),
            shipping_address: o.shipping_address.clone(),
            billing_address: o.billing_address.clone(),
            total_amount: o.total_amount.clone(),
            status: o.status.as_str().to_string(),
            payment_status: o.payment_status.as_str().to_string(),
            razorpay_order_id: o.razorpay_order_id.clone(),
            razorpay_payment_id: o.razorpay_payment_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub product_slug: String,
    pub quantity: i32,
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_slug: row.product_slug,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub product_slug: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

impl From<&OrderItem> for NewOrderItemRow {
    fn from(i: &OrderItem) -> Self {
        Self {
            id: i.id,
            order_id: i.order_id,
            product_id: i.product_id.clone(),
            product_name: i.product_name.clone(),
            product_slug: i.product_slug.clone(),
            quantity: i.quantity,
            price: i.price.clone(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub price: BigDecimal,
    pub stock_count: i32,
    pub active: bool,
}

impl From<ProductRow> for ProductSnapshot {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            price: row.price,
            stock_count: row.stock_count,
            active: row.active,
        }
    }
}
