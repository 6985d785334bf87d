use std::sync::Arc;

use log::info;
use uuid::Uuid;

use crate::domain::errors::OrderError;
use crate::domain::identity::RequestContext;
use crate::domain::order::{ListResult, Order, OrderStatus};
use crate::domain::ports::OrderRepository;

pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order, OrderError> {
        self.repo.find_by_id(id).await?.ok_or(OrderError::NotFound)
    }

    pub async fn list_orders(
        &self,
        ctx: &RequestContext,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, OrderError> {
        require_admin(ctx)?;
        Ok(self.repo.list(page, limit).await?)
    }

    /// Moves an order along its fulfilment flow. The write only lands if the
    /// order is still in the status it was read in.
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        next: OrderStatus,
    ) -> Result<Order, OrderError> {
        require_admin(ctx)?;

        let current = self.get_order(id).await?.status;
        if !current.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        if !self.repo.update_status(id, current, next).await? {
            return Err(OrderError::ConcurrentUpdate);
        }

        info!(
            "Order {} moved from {} to {} by {}",
            id, current, next, ctx.user_id
        );
        self.get_order(id).await
    }

    /// Deletes an abandoned order. Only orders still pending payment qualify.
    pub async fn delete_pending_order(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<(), OrderError> {
        require_admin(ctx)?;

        let order = self.get_order(id).await?;
        if order.status != OrderStatus::Pending {
            return Err(OrderError::NotDeletable(order.status));
        }
        if !self.repo.delete_if_status(id, OrderStatus::Pending).await? {
            // Moved on (or vanished) since it was read.
            let current = self.get_order(id).await?;
            return Err(match current.status {
                OrderStatus::Pending => OrderError::ConcurrentUpdate,
                status => OrderError::NotDeletable(status),
            });
        }

        info!("Pending order {} deleted by {}", id, ctx.user_id);
        Ok(())
    }
}

fn require_admin(ctx: &RequestContext) -> Result<(), OrderError> {
    if ctx.is_admin() {
        Ok(())
    } else {
        Err(OrderError::Forbidden)
    }
}
