#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use unimarket_orderservice::{
    app_state::AppState,
    commerce::{
        CartService, OrderService, StatusPolicy,
        types::{AddCartItem, CheckoutDetails, Product, ProductState},
    },
    config::OrderSettings,
    gateway::{Identity, Role, StaticAccessGateway},
    store::{CommerceStore, MemoryStore},
};
use uuid::Uuid;

pub fn identity(role: Role) -> Identity {
    Identity {
        user_id: Uuid::new_v4(),
        role,
    }
}

pub fn student() -> Identity {
    identity(Role::Student)
}

pub fn vendor() -> Identity {
    identity(Role::Vendor)
}

pub fn admin() -> Identity {
    identity(Role::Admin)
}

pub fn product(name: &str, price: Decimal, stock: i32) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        price,
        stock,
        state: ProductState::Active,
        category_id: None,
        seller_id: None,
        image_url: None,
    }
}

pub fn add(product: &Product, quantity: i32) -> AddCartItem {
    AddCartItem {
        product_id: product.id,
        quantity,
    }
}

pub fn checkout() -> CheckoutDetails {
    CheckoutDetails {
        delivery_address: "Dormitory B, room 214".into(),
        contact_phone: "+1 555 0100".into(),
        notes: None,
    }
}

/// Services over a shared in-memory store.
pub struct Shop {
    pub store: Arc<MemoryStore>,
    pub carts: CartService,
    pub orders: OrderService,
}

impl Shop {
    pub fn new() -> Self {
        Self::with_policy(StatusPolicy::Strict)
    }

    pub fn with_policy(status_policy: StatusPolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::over(store.clone(), store, status_policy)
    }

    /// Services over `backend`, which may wrap `store`.
    pub fn over(
        store: Arc<MemoryStore>,
        backend: Arc<dyn CommerceStore>,
        status_policy: StatusPolicy,
    ) -> Self {
        let settings = OrderSettings {
            status_policy,
            ..OrderSettings::default()
        };

        Self {
            store,
            carts: CartService::new(backend.clone()),
            orders: OrderService::new(
                backend,
                settings.status_policy,
                settings.low_stock_threshold,
            ),
        }
    }

    pub async fn stock(&self, product: &Product) -> i32 {
        let product = self.store.product(product.id).await.unwrap();
        product.expect("product exists").stock
    }

    pub fn stock_product(&self, name: &str, price: Decimal, stock: i32) -> Product {
        let product = product(name, price, stock);
        self.store.put_product(product.clone());
        product
    }
}

/// Application state plus a static token table with one token per identity.
pub fn app_state(store: Arc<MemoryStore>, users: &[(&str, &Identity)]) -> AppState {
    let gateway = users
        .iter()
        .fold(StaticAccessGateway::new(), |gateway, (token, identity)| {
            gateway.with_token(*token, (*identity).clone())
        });

    AppState::new(store, Arc::new(gateway), &OrderSettings::default())
}
