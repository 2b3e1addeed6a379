//! Storage seam of the storefront.
//!
//! Business rules live in [`crate::commerce`]; a store only persists rows and
//! guarantees that [`CommerceStore::commit_order`] is all-or-nothing and re-checks
//! stock under its own isolation.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::commerce::{
    error::CommerceError,
    status::OrderStatus,
    types::{Cart, CartItem, CartLine, Order, OrderWithItems, Product},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Why a checkout line could not be applied inside the commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRejection {
    Missing,
    Deactivated,
    Short { available: i32 },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Line for product {product_id} rejected at commit: {rejection:?}")]
    LineRejected {
        product_id: Uuid,
        rejection: LineRejection,
    },

    #[error("Order number {0} is already taken")]
    DuplicateOrderNumber(String),

    /// A planned cart row was removed or its quantity edited after the checkout
    /// read the cart.
    #[error("Cart item {0} changed during checkout")]
    CartChanged(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] DieselError),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub(crate) fn from_order_insert(err: DieselError, order_number: &str) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                if info.constraint_name() == Some("orders_order_number_key") =>
            {
                Self::DuplicateOrderNumber(order_number.to_string())
            }
            other => Self::Database(other),
        }
    }
}

impl From<StoreError> for CommerceError {
    fn from(err: StoreError) -> Self {
        error!("Storage failure: {}", err);
        CommerceError::Unexpected("Storage backend failure, please retry".into())
    }
}

/// Order counters for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderTotals {
    pub total_orders: i64,
    pub pending_orders: i64,
    /// Sum of totals of confirmed, shipped and delivered orders.
    pub revenue: Decimal,
}

/// A cart item together with the owner of its cart and its live product.
#[derive(Debug, Clone)]
pub struct OwnedCartItem {
    pub item: CartItem,
    pub owner_user_id: Uuid,
    pub product: Product,
}

#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price_snapshot: Decimal,
}

/// Everything needed to turn a validated cart into an order.
#[derive(Debug, Clone)]
pub struct OrderPlan {
    pub cart_id: Uuid,
    pub owner_user_id: Uuid,
    pub order_number: String,
    pub total: Decimal,
    pub delivery_address: String,
    pub contact_phone: String,
    pub notes: Option<String>,
    pub lines: Vec<PlannedLine>,
}

impl OrderPlan {
    /// Lines in product id order, which is the order stock rows are locked in.
    pub fn lines_in_lock_order(&self) -> Vec<&PlannedLine> {
        let mut lines: Vec<&PlannedLine> = self.lines.iter().collect();
        lines.sort_by_key(|line| line.product_id);
        lines
    }
}

#[derive(Debug, Clone)]
pub struct PlannedLine {
    /// Cart row this line consumes. The commit removes exactly this row, and only
    /// while it still holds `quantity`.
    pub cart_item_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price_snapshot: Decimal,
    pub subtotal: Decimal,
}

#[async_trait]
pub trait CommerceStore: Send + Sync {
    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    /// Active products with `stock <= threshold`, lowest stock first.
    async fn low_stock_products(&self, threshold: i32) -> Result<Vec<Product>, StoreError>;

    /// Returns the user's cart, creating it on first access.
    async fn cart_for_user(&self, user_id: Uuid) -> Result<Cart, StoreError>;

    async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>, StoreError>;

    async fn cart_lines(&self, cart_id: Uuid) -> Result<Vec<CartLine>, StoreError>;

    async fn cart_item_for_product(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, StoreError>;

    async fn owned_cart_item(&self, item_id: Uuid) -> Result<Option<OwnedCartItem>, StoreError>;

    /// Inserts the item, or adds `quantity` to the existing row for the same
    /// `(cart, product)` pair. An existing row keeps its price snapshot.
    async fn add_to_cart(&self, item: NewCartItem) -> Result<CartItem, StoreError>;

    async fn set_cart_item_quantity(
        &self,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<Option<CartItem>, StoreError>;

    /// Returns `false` when the item did not exist.
    async fn delete_cart_item(&self, item_id: Uuid) -> Result<bool, StoreError>;

    async fn clear_cart(&self, cart_id: Uuid) -> Result<usize, StoreError>;

    /// Atomically creates the order and its items, decrements stock for every line
    /// and removes the planned cart rows. Stock, availability and the planned cart
    /// rows are checked again inside the commit; on any failure nothing is changed.
    /// Cart rows added after the plan was made stay in the cart.
    async fn commit_order(&self, plan: OrderPlan) -> Result<OrderWithItems, StoreError>;

    async fn order(&self, id: Uuid) -> Result<Option<OrderWithItems>, StoreError>;

    /// Newest first.
    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError>;

    /// Newest first, at most `limit` rows.
    async fn all_orders(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> Result<Vec<Order>, StoreError>;

    async fn order_totals(&self) -> Result<OrderTotals, StoreError>;

    async fn set_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError>;
}
