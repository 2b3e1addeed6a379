use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::StorefrontClient;
use crate::{
    app_state::AppState,
    commerce::{
        CartService, OrderService,
        error::CommerceError,
        types::{
            AddCartItem, CartLine, CartView, CheckoutDetails, Order, OrderWithItems,
            StatusChange, UpdateCartItem,
        },
    },
    gateway::{self, AccessGateway, Identity},
};

/// Calls the services in-process, bypassing HTTP.
#[derive(Clone)]
pub struct DirectClient {
    carts: CartService,
    orders: OrderService,
    gateway: Arc<dyn AccessGateway>,
    token: Option<String>,
}

impl DirectClient {
    pub fn new(state: &AppState, token: Option<String>) -> Self {
        Self {
            carts: state.carts.clone(),
            orders: state.orders.clone(),
            gateway: state.gateway.clone(),
            token,
        }
    }

    async fn caller(&self) -> Result<Identity, CommerceError> {
        gateway::authenticate(self.gateway.as_ref(), self.token.as_deref()).await
    }
}

#[async_trait]
impl StorefrontClient for DirectClient {
    async fn get_cart(&self) -> Result<CartView, CommerceError> {
        let caller = self.caller().await?;
        self.carts.get_cart(&caller).await
    }

    async fn add_cart_item(&self, input: AddCartItem) -> Result<CartLine, CommerceError> {
        let caller = self.caller().await?;
        self.carts.add_item(&caller, input).await
    }

    async fn update_cart_item(
        &self,
        item_id: Uuid,
        input: UpdateCartItem,
    ) -> Result<CartLine, CommerceError> {
        let caller = self.caller().await?;
        self.carts.update_quantity(&caller, item_id, input).await
    }

    async fn remove_cart_item(&self, item_id: Uuid) -> Result<(), CommerceError> {
        let caller = self.caller().await?;
        self.carts.remove_item(&caller, item_id).await
    }

    async fn clear_cart(&self) -> Result<(), CommerceError> {
        let caller = self.caller().await?;
        self.carts.clear_cart(&caller).await
    }

    async fn create_order(
        &self,
        details: CheckoutDetails,
    ) -> Result<OrderWithItems, CommerceError> {
        let caller = self.caller().await?;
        self.orders.create_order(&caller, details).await
    }

    async fn list_my_orders(&self) -> Result<Vec<Order>, CommerceError> {
        let caller = self.caller().await?;
        self.orders.list_my_orders(&caller).await
    }

    async fn get_order(&self, order_id: Uuid) -> Result<OrderWithItems, CommerceError> {
        let caller = self.caller().await?;
        self.orders.get_order(&caller, order_id).await
    }

    async fn update_order_status(
        &self,
        order_id: Uuid,
        change: StatusChange,
    ) -> Result<Order, CommerceError> {
        let caller = self.caller().await?;
        self.orders.update_order_status(&caller, order_id, change).await
    }
}
