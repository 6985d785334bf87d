use std::collections::HashMap;

use crate::domain::catalog::{CartLine, PricedLine};
use crate::domain::errors::PricingError;
use crate::domain::ports::CatalogReader;

/// Prices every cart line against the live catalog. Read-only: stock is
/// checked but never decremented here.
pub async fn price_cart(
    catalog: &dyn CatalogReader,
    lines: &[CartLine],
) -> Result<Vec<PricedLine>, PricingError> {
    let mut priced = Vec::with_capacity(lines.len());
    // Repeated ids draw on the same stock.
    let mut requested: HashMap<&str, i32> = HashMap::new();

    for line in lines {
        let product = catalog
            .fetch_product(&line.product_id)
            .await?
            .ok_or_else(|| PricingError::ProductNotFound(line.product_id.clone()))?;

        if !product.active {
            return Err(PricingError::ProductInactive(product.name));
        }
        let so_far = requested.entry(line.product_id.as_str()).or_insert(0);
        *so_far = so_far.saturating_add(line.quantity);
        let total_requested = *so_far;
        if total_requested > product.stock_count {
            return Err(PricingError::InsufficientStock {
                name: product.name,
                requested: total_requested,
                available: product.stock_count,
            });
        }

        priced.push(PricedLine::from_snapshot(&product, line.quantity));
    }

    Ok(priced)
}
