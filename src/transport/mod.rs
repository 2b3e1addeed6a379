//! Client-side entry points to the storefront.
//!
//! Both transports resolve the caller's bearer credential on every call and end up
//! in the same [`CartService`](crate::commerce::CartService) and
//! [`OrderService`](crate::commerce::OrderService) code, so they return the same
//! results and the same [`CommerceError`]s for the same inputs.

mod direct;
mod routed;

use async_trait::async_trait;
use uuid::Uuid;

use crate::commerce::{
    error::CommerceError,
    types::{
        AddCartItem, CartLine, CartView, CheckoutDetails, Order, OrderWithItems, StatusChange,
        UpdateCartItem,
    },
};

pub use direct::DirectClient;
pub use routed::RoutedClient;

#[async_trait]
pub trait StorefrontClient: Send + Sync {
    async fn get_cart(&self) -> Result<CartView, CommerceError>;

    async fn add_cart_item(&self, input: AddCartItem) -> Result<CartLine, CommerceError>;

    async fn update_cart_item(
        &self,
        item_id: Uuid,
        input: UpdateCartItem,
    ) -> Result<CartLine, CommerceError>;

    async fn remove_cart_item(&self, item_id: Uuid) -> Result<(), CommerceError>;

    async fn clear_cart(&self) -> Result<(), CommerceError>;

    async fn create_order(
        &self,
        details: CheckoutDetails,
    ) -> Result<OrderWithItems, CommerceError>;

    async fn list_my_orders(&self) -> Result<Vec<Order>, CommerceError>;

    async fn get_order(&self, order_id: Uuid) -> Result<OrderWithItems, CommerceError>;

    async fn update_order_status(
        &self,
        order_id: Uuid,
        change: StatusChange,
    ) -> Result<Order, CommerceError>;
}
