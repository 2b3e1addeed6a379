use std::sync::Arc;

use crate::{
    commerce::{CartService, OrderService},
    config::OrderSettings,
    gateway::AccessGateway,
    store::CommerceStore,
};

/// Shared handles injected into every handler. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub carts: CartService,
    pub orders: OrderService,
    pub gateway: Arc<dyn AccessGateway>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CommerceStore>,
        gateway: Arc<dyn AccessGateway>,
        settings: &OrderSettings,
    ) -> Self {
        Self {
            carts: CartService::new(store.clone()),
            orders: OrderService::new(store, settings.status_policy, settings.low_stock_threshold),
            gateway,
        }
    }
}
