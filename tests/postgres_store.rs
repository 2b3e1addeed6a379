//! Runs against a real PostgreSQL database:
//! `DATABASE_URL=postgres://... cargo test --test postgres_store -- --ignored`

mod common;

use std::sync::Arc;

use common::{add, checkout, product, student};
use futures::future::join_all;
use rust_decimal_macros::dec;
use unimarket_orderservice::{
    commerce::{CartService, CommerceError, OrderService, StatusPolicy, types::UpdateCartItem},
    db,
    store::{CommerceStore, PgStore},
};

async fn pg_store() -> Arc<PgStore> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    db::run_migrations(&url).await.unwrap();
    let pool = db::create_pool(&url, 16).await.unwrap();
    Arc::new(PgStore::new(pool))
}

#[tokio::test]
#[ignore]
async fn repeat_add_upserts_a_single_row() {
    let store = pg_store().await;
    let carts = CartService::new(store.clone());
    let alice = student();
    let binder = product("Ring binder", dec!(3.75), 10);
    store.put_product(&binder).await.unwrap();

    carts.add_item(&alice, add(&binder, 2)).await.unwrap();
    let line = carts.add_item(&alice, add(&binder, 3)).await.unwrap();
    assert_eq!(line.item.quantity, 5);

    let cart = carts.get_cart(&alice).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total, dec!(18.75));

    let err = carts
        .update_quantity(&alice, line.item.id, UpdateCartItem { quantity: 11 })
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::InsufficientStock { available: 10, .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn concurrent_checkouts_never_oversell() {
    const INITIAL_STOCK: i32 = 7;

    let store = pg_store().await;
    let carts = CartService::new(store.clone());
    let orders = Arc::new(OrderService::new(store.clone(), StatusPolicy::Strict, 5));
    let projector = product("Mini projector", dec!(120), INITIAL_STOCK);
    store.put_product(&projector).await.unwrap();

    let mut buyers = Vec::new();
    for _ in 0..6 {
        let buyer = student();
        carts.add_item(&buyer, add(&projector, 2)).await.unwrap();
        buyers.push(buyer);
    }

    let handles = buyers.into_iter().map(|buyer| {
        let orders = orders.clone();
        tokio::spawn(async move { orders.create_order(&buyer, checkout()).await })
    });

    let mut sold = 0;
    for joined in join_all(handles).await {
        match joined.unwrap() {
            Ok(placed) => {
                assert_eq!(placed.order.total, dec!(240));
                sold += 2;
            }
            Err(err) => assert!(matches!(err, CommerceError::InsufficientStock { .. }), "{err:?}"),
        }
    }

    let stock = store.product(projector.id).await.unwrap().unwrap().stock;
    assert_eq!(sold, 6);
    assert_eq!(stock, INITIAL_STOCK - sold);
}
