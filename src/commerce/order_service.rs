use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    error::CommerceError,
    order_number,
    status::{OrderStatus, StatusPolicy},
    types::{
        CartLine, CheckoutDetails, LowStockProduct, Order, OrderStats, OrderWithItems,
        StatusChange,
    },
    validation,
};
use crate::{
    gateway::Identity,
    store::{CommerceStore, LineRejection, OrderPlan, PlannedLine, StoreError},
};

/// Fresh order numbers tried before a checkout gives up on collisions.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Rows returned by the admin order listing when no limit is given.
pub const DEFAULT_ORDER_LIST_LIMIT: i64 = 100;

/// Checkout and order administration.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn CommerceStore>,
    status_policy: StatusPolicy,
    low_stock_threshold: i32,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn CommerceStore>,
        status_policy: StatusPolicy,
        low_stock_threshold: i32,
    ) -> Self {
        Self {
            store,
            status_policy,
            low_stock_threshold,
        }
    }

    /// Converts the caller's cart into a pending order.
    ///
    /// Lines are checked against live stock first so that a correctable problem is
    /// reported without touching the store; the commit then re-checks every line
    /// inside its transaction. The total always uses the cart's price snapshots.
    pub async fn create_order(
        &self,
        caller: &Identity,
        details: CheckoutDetails,
    ) -> Result<OrderWithItems, CommerceError> {
        let delivery_address =
            validation::required_field("delivery_address", &details.delivery_address)?;
        let contact_phone = validation::required_field("contact_phone", &details.contact_phone)
            .and_then(|phone| {
                validation::max_length("contact_phone", phone, validation::CONTACT_PHONE_MAX_LEN)
            })?;
        let notes = validation::normalize_notes(details.notes);

        let Some(cart) = self.store.find_cart(caller.user_id).await? else {
            return Err(CommerceError::EmptyCart);
        };
        let lines = self.store.cart_lines(cart.id).await?;
        if lines.is_empty() {
            return Err(CommerceError::EmptyCart);
        }

        for line in &lines {
            validation::ensure_orderable(&line.product, line.item.quantity).inspect_err(|err| {
                warn!(user_id = %caller.user_id, "Checkout rejected: {}", err);
            })?;
        }

        let planned: Vec<PlannedLine> = lines.iter().map(planned_line).collect();
        let total: Decimal = planned.iter().map(|line| line.subtotal).sum();

        for _ in 0..ORDER_NUMBER_ATTEMPTS {
            let plan = OrderPlan {
                cart_id: cart.id,
                owner_user_id: caller.user_id,
                order_number: order_number::generate(),
                total,
                delivery_address: delivery_address.clone(),
                contact_phone: contact_phone.clone(),
                notes: notes.clone(),
                lines: planned.clone(),
            };

            match self.store.commit_order(plan).await {
                Ok(order) => {
                    info!(
                        user_id = %caller.user_id,
                        order_id = %order.order.id,
                        order_number = %order.order.order_number,
                        total = %order.order.total,
                        "Order created"
                    );
                    return Ok(order);
                }
                Err(StoreError::DuplicateOrderNumber(number)) => {
                    warn!("Order number {} collided, generating another", number);
                }
                Err(StoreError::LineRejected {
                    product_id,
                    rejection,
                }) => {
                    let err = rejected_line_error(&planned, product_id, rejection);
                    warn!(user_id = %caller.user_id, "Checkout lost a stock race: {}", err);
                    return Err(err);
                }
                Err(StoreError::CartChanged(cart_item_id)) => {
                    warn!(
                        user_id = %caller.user_id,
                        cart_item_id = %cart_item_id,
                        "Cart changed while checking out"
                    );
                    return Err(CommerceError::Unexpected(
                        "Cart changed during checkout, please retry".into(),
                    ));
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(CommerceError::Unexpected(
            "Could not allocate an order number, please retry".into(),
        ))
    }

    pub async fn list_my_orders(&self, caller: &Identity) -> Result<Vec<Order>, CommerceError> {
        Ok(self.store.orders_for_user(caller.user_id).await?)
    }

    /// An order is visible to its owner and to admins and vendors.
    pub async fn get_order(
        &self,
        caller: &Identity,
        order_id: Uuid,
    ) -> Result<OrderWithItems, CommerceError> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;

        if order.order.owner_user_id != caller.user_id && !caller.role.can_view_all_orders() {
            return Err(CommerceError::Forbidden(
                "You do not have permission to view this order".into(),
            ));
        }

        Ok(order)
    }

    /// Newest first, at most `limit` orders (100 when unset).
    pub async fn list_all_orders(
        &self,
        caller: &Identity,
        status: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<Order>, CommerceError> {
        if !caller.role.can_view_all_orders() {
            return Err(forbidden(&["admin", "vendor"]));
        }

        let status = status.map(str::parse::<OrderStatus>).transpose()?;
        let limit = limit.unwrap_or(DEFAULT_ORDER_LIST_LIMIT);
        if limit <= 0 {
            return Err(CommerceError::Validation(
                "limit must be greater than 0".into(),
            ));
        }

        Ok(self.store.all_orders(status, limit).await?)
    }

    /// Dashboard counters plus the low-stock report.
    pub async fn order_stats(&self, caller: &Identity) -> Result<OrderStats, CommerceError> {
        if !caller.role.is_admin() {
            return Err(forbidden(&["admin"]));
        }

        let totals = self.store.order_totals().await?;
        let low_stock_products = self.low_stock_report(caller).await?;

        Ok(OrderStats {
            total_orders: totals.total_orders,
            total_revenue: totals.revenue,
            pending_orders: totals.pending_orders,
            low_stock_products,
        })
    }

    /// Administrative status change. Which transitions are accepted depends on the
    /// configured [`StatusPolicy`].
    pub async fn update_order_status(
        &self,
        caller: &Identity,
        order_id: Uuid,
        change: StatusChange,
    ) -> Result<Order, CommerceError> {
        if !caller.role.is_admin() {
            return Err(forbidden(&["admin"]));
        }

        let next: OrderStatus = change.status.trim().parse()?;

        let current = self
            .store
            .order(order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?
            .order;
        self.status_policy.check(current.status, next)?;

        let order = self
            .store
            .set_order_status(order_id, next)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;

        info!(
            order_id = %order_id,
            actor = %caller.user_id,
            from = %current.status,
            to = %next,
            "Order status changed"
        );

        Ok(order)
    }

    pub async fn low_stock_report(
        &self,
        caller: &Identity,
    ) -> Result<Vec<LowStockProduct>, CommerceError> {
        if !caller.role.is_admin() {
            return Err(forbidden(&["admin"]));
        }

        let products = self.store.low_stock_products(self.low_stock_threshold).await?;
        Ok(products.into_iter().map(LowStockProduct::from).collect())
    }
}

fn planned_line(line: &CartLine) -> PlannedLine {
    PlannedLine {
        cart_item_id: line.item.id,
        product_id: line.item.product_id,
        product_name: line.product.name.clone(),
        quantity: line.item.quantity,
        unit_price_snapshot: line.item.unit_price_snapshot,
        subtotal: validation::line_subtotal(line.item.quantity, line.item.unit_price_snapshot),
    }
}

fn rejected_line_error(
    lines: &[PlannedLine],
    product_id: Uuid,
    rejection: LineRejection,
) -> CommerceError {
    let line = lines.iter().find(|line| line.product_id == product_id);
    let name = line
        .map(|line| line.product_name.clone())
        .unwrap_or_else(|| product_id.to_string());

    match rejection {
        LineRejection::Missing | LineRejection::Deactivated => {
            CommerceError::ProductUnavailable { product_id, name }
        }
        LineRejection::Short { available } => CommerceError::InsufficientStock {
            product_id,
            name,
            available,
            requested: line.map_or(0, |line| line.quantity),
        },
    }
}

fn order_not_found(order_id: Uuid) -> CommerceError {
    CommerceError::NotFound(format!("Order {}", order_id))
}

fn forbidden(roles: &[&str]) -> CommerceError {
    CommerceError::Forbidden(format!("Access denied. Required role: {}", roles.join(" or ")))
}
