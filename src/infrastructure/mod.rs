pub mod catalog_repo;
pub mod identity_repo;
pub mod memory;
pub mod models;
pub mod order_repo;
pub mod razorpay;

use actix_web::web;
use diesel::pg::PgConnection;

use crate::db::DbPool;
use crate::domain::errors::RepositoryError;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for RepositoryError {
    fn from(e: diesel::result::Error) -> Self {
        RepositoryError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for RepositoryError {
    fn from(e: r2d2::Error) -> Self {
        RepositoryError::Internal(e.to_string())
    }
}

/// Runs blocking diesel work on actix's blocking pool with a pooled
/// connection.
pub(crate) async fn with_conn<T, F>(pool: &DbPool, f: F) -> Result<T, RepositoryError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, RepositoryError> + Send + 'static,
{
    let pool = pool.clone();
    web::block(move || {
        let mut conn = pool.get()?;
        f(&mut *conn)
    })
    .await
    .map_err(|e| RepositoryError::Internal(e.to_string()))?
}
