use bigdecimal::BigDecimal;
use serde_json::json;

/// Current state of a catalog product as seen at checkout time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub price: BigDecimal,
    pub stock_count: i32,
    pub active: bool,
}

/// Client-supplied cart entry. Only the product id and quantity are trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i32,
}

/// A cart line after server-side price and stock validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: String,
    pub product_name: String,
    pub product_slug: String,
    pub unit_price: BigDecimal,
    pub quantity: i32,
    pub line_total: BigDecimal,
}

impl PricedLine {
    pub fn from_snapshot(product: &ProductSnapshot, quantity: i32) -> Self {
        Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            product_slug: product.slug.clone(),
            unit_price: product.price.clone(),
            quantity,
            line_total: &product.price * BigDecimal::from(quantity),
        }
    }

    /// True when `line_total` still equals `unit_price * quantity` and both
    /// fit the two-decimal money columns exactly.
    pub fn is_consistent(&self) -> bool {
        self.quantity > 0
            && self.unit_price >= BigDecimal::from(0)
            && fits_in_paise(&self.unit_price)
            && fits_in_paise(&self.line_total)
            && self.line_total == &self.unit_price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub billing_address: Option<String>,
}

/// A validated create-order request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub lines: Vec<CartLine>,
    pub shipping_address: String,
    pub customer: CustomerDetails,
}

/// The priced cart handed back to the client after intent creation; it comes
/// back unchanged with the payment proof. `seal` is a keyed MAC over
/// [`PricedCheckout::sealed_payload`].
#[derive(Debug, Clone, PartialEq)]
pub struct PricedCheckout {
    pub razorpay_order_id: String,
    pub total_amount: BigDecimal,
    pub items: Vec<PricedLine>,
    pub shipping_address: String,
    pub customer: CustomerDetails,
    pub seal: String,
}

impl PricedCheckout {
    /// Canonical bytes of everything except the seal. Decimals keep the exact
    /// textual form they were priced with.
    pub fn sealed_payload(&self) -> Vec<u8> {
        let items: Vec<_> = self
            .items
            .iter()
            .map(|line| {
                json!([
                    line.product_id,
                    line.product_name,
                    line.product_slug,
                    line.unit_price.to_string(),
                    line.quantity,
                    line.line_total.to_string(),
                ])
            })
            .collect();

        json!([
            self.razorpay_order_id,
            self.total_amount.to_string(),
            items,
            self.shipping_address,
            [
                self.customer.name,
                self.customer.email,
                self.customer.phone,
                self.customer.billing_address,
            ],
        ])
        .to_string()
        .into_bytes()
    }
}

/// True when the amount has at most two fractional digits.
pub fn fits_in_paise(amount: &BigDecimal) -> bool {
    let (_, scale) = amount.normalized().as_bigint_and_exponent();
    scale <= 2
}

pub fn sum_line_totals(lines: &[PricedLine]) -> BigDecimal {
    lines
        .iter()
        .fold(BigDecimal::from(0), |acc, line| acc + &line.line_total)
}
