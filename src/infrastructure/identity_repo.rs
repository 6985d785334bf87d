use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::RepositoryError;
use crate::domain::identity::{RequestContext, Role};
use crate::domain::ports::IdentityProvider;
use crate::schema::{profiles, user_sessions};

use super::with_conn;

/// Resolves bearer tokens through `user_sessions` and the owner's profile.
pub struct DieselIdentityProvider {
    pool: DbPool,
}

impl DieselIdentityProvider {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProvider for DieselIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Option<RequestContext>, RepositoryError> {
        let token = token.to_string();
        let row = with_conn(&self.pool, move |conn| {
            Ok(user_sessions::table
                .inner_join(profiles::table)
                .filter(user_sessions::token.eq(token))
                .filter(user_sessions::expires_at.gt(Utc::now()))
                .select((profiles::id, profiles::role))
                .first::<(Uuid, String)>(conn)
                .optional()?)
        })
        .await?;

        row.map(|(user_id, role)| {
            let role: Role = role.parse().map_err(RepositoryError::Internal)?;
            Ok(RequestContext { user_id, role })
        })
        .transpose()
    }
}
