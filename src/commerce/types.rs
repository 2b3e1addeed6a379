use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::status::OrderStatus;

// Catalog

/// Soft-delete marker of a product.
///
/// A deactivated product can no longer be put in a cart or ordered, but it stays
/// referenceable by historical order items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductState {
    Active,
    Deactivated,
}

impl ProductState {
    pub fn from_active_flag(active: bool) -> Self {
        if active { Self::Active } else { Self::Deactivated }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub state: ProductState,
    pub category_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LowStockProduct {
    pub id: Uuid,
    pub name: String,
    pub stock: i32,
}

impl From<Product> for LowStockProduct {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            stock: product.stock,
        }
    }
}

// Carts

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Price captured when the product first entered the cart. Repeat adds keep it.
    pub unit_price_snapshot: Decimal,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price_snapshot
    }
}

/// A cart item joined with the live product it points to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: Product,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartView {
    pub cart_id: Uuid,
    pub items: Vec<CartLine>,
    pub total: Decimal,
    pub item_count: i32,
}

impl CartView {
    pub fn new(cart_id: Uuid, items: Vec<CartLine>) -> Self {
        let total = items.iter().map(|line| line.item.subtotal()).sum();
        let item_count = items.iter().map(|line| line.item.quantity).sum();
        Self {
            cart_id,
            items,
            total,
            item_count,
        }
    }
}

// Orders

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub owner_user_id: Uuid,
    pub total: Decimal,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub contact_phone: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price_snapshot: Decimal,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Admin dashboard figures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderStats {
    pub total_orders: i64,
    /// Sum of confirmed, shipped and delivered order totals.
    pub total_revenue: Decimal,
    pub pending_orders: i64,
    pub low_stock_products: Vec<LowStockProduct>,
}

// Requests

fn default_quantity() -> i32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AddCartItem {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateCartItem {
    pub quantity: i32,
}

/// Checkout form. Missing fields deserialize as empty so that they are reported as
/// validation errors rather than body rejections.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CheckoutDetails {
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusChange {
    pub status: String,
}
