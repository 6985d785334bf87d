use async_trait::async_trait;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::catalog::ProductSnapshot;
use crate::domain::errors::PricingError;
use crate::domain::ports::CatalogReader;
use crate::schema::products;

use super::models::ProductRow;
use super::with_conn;

/// Read-only view of the `products` table.
pub struct DieselCatalogReader {
    pool: DbPool,
}

impl DieselCatalogReader {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogReader for DieselCatalogReader {
    async fn fetch_product(&self, id: &str) -> Result<Option<ProductSnapshot>, PricingError> {
        let id = id.to_string();
        let row = with_conn(&self.pool, move |conn| {
            Ok(products::table
                .find(id)
                .select(ProductRow::as_select())
                .first(conn)
                .optional()?)
        })
        .await
        .map_err(|e| PricingError::CatalogUnavailable(e.to_string()))?;

        Ok(row.map(ProductSnapshot::from))
    }
}
