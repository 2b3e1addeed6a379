mod common;

use common::{Shop, add, admin, student};
use rust_decimal_macros::dec;
use unimarket_orderservice::commerce::{
    CommerceError,
    types::{AddCartItem, ProductState, UpdateCartItem},
};
use uuid::Uuid;

#[tokio::test]
async fn get_cart_creates_one_cart_per_user() {
    let shop = Shop::new();
    let alice = student();

    let first = shop.carts.get_cart(&alice).await.unwrap();
    let second = shop.carts.get_cart(&alice).await.unwrap();

    assert_eq!(first.cart_id, second.cart_id);
    assert!(first.items.is_empty());
    assert_eq!(first.total, dec!(0));
    assert_eq!(first.item_count, 0);
}

#[tokio::test]
async fn adding_beyond_stock_keeps_the_existing_quantity() {
    let shop = Shop::new();
    let alice = student();
    let mug = shop.stock_product("Campus mug", dec!(12.50), 3);

    let line = shop.carts.add_item(&alice, add(&mug, 2)).await.unwrap();
    assert_eq!(line.item.quantity, 2);

    let cart = shop.carts.get_cart(&alice).await.unwrap();
    assert_eq!(cart.total, dec!(25.00));
    assert_eq!(cart.item_count, 2);

    let err = shop.carts.add_item(&alice, add(&mug, 2)).await.unwrap_err();
    assert_eq!(
        err,
        CommerceError::InsufficientStock {
            product_id: mug.id,
            name: "Campus mug".into(),
            available: 3,
            requested: 4,
        }
    );
    assert_eq!(err.to_string(), "Insufficient stock for Campus mug. Available: 3");

    let cart = shop.carts.get_cart(&alice).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].item.quantity, 2);
}

#[tokio::test]
async fn repeat_add_merges_into_one_row_and_keeps_the_first_price() {
    let shop = Shop::new();
    let alice = student();
    let mut notebook = shop.stock_product("Notebook", dec!(3.00), 10);

    shop.carts.add_item(&alice, add(&notebook, 2)).await.unwrap();

    notebook.price = dec!(4.00);
    shop.store.put_product(notebook.clone());

    let line = shop.carts.add_item(&alice, add(&notebook, 3)).await.unwrap();
    assert_eq!(line.item.quantity, 5);
    assert_eq!(line.item.unit_price_snapshot, dec!(3.00));

    let cart = shop.carts.get_cart(&alice).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total, dec!(15.00));
    assert_eq!(cart.items[0].product.price, dec!(4.00));
}

#[tokio::test]
async fn add_rejects_unknown_and_deactivated_products() {
    let shop = Shop::new();
    let alice = student();
    let hoodie = shop.stock_product("Hoodie", dec!(40), 5);
    shop.store.set_product_state(hoodie.id, ProductState::Deactivated);

    let missing = Uuid::new_v4();
    let err = shop
        .carts
        .add_item(
            &alice,
            AddCartItem {
                product_id: missing,
                quantity: 1,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, CommerceError::NotFound(format!("Product {}", missing)));

    let err = shop.carts.add_item(&alice, add(&hoodie, 1)).await.unwrap_err();
    assert_eq!(
        err,
        CommerceError::ProductUnavailable {
            product_id: hoodie.id,
            name: "Hoodie".into(),
        }
    );
}

#[tokio::test]
async fn non_positive_quantities_are_validation_errors() {
    let shop = Shop::new();
    let alice = student();
    let pen = shop.stock_product("Pen", dec!(1.20), 50);

    let err = shop.carts.add_item(&alice, add(&pen, 0)).await.unwrap_err();
    assert_eq!(err, CommerceError::Validation("Quantity must be greater than 0".into()));

    let line = shop.carts.add_item(&alice, add(&pen, 4)).await.unwrap();

    for quantity in [0, -3] {
        let err = shop
            .carts
            .update_quantity(&alice, line.item.id, UpdateCartItem { quantity })
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    let cart = shop.carts.get_cart(&alice).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].item.quantity, 4);
}

#[tokio::test]
async fn update_quantity_is_checked_against_live_stock() {
    let shop = Shop::new();
    let alice = student();
    let lamp = shop.stock_product("Desk lamp", dec!(18), 4);

    let line = shop.carts.add_item(&alice, add(&lamp, 1)).await.unwrap();

    let updated = shop
        .carts
        .update_quantity(&alice, line.item.id, UpdateCartItem { quantity: 4 })
        .await
        .unwrap();
    assert_eq!(updated.item.quantity, 4);

    let err = shop
        .carts
        .update_quantity(&alice, line.item.id, UpdateCartItem { quantity: 5 })
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::InsufficientStock { available: 4, requested: 5, .. }));
}

#[tokio::test]
async fn other_users_items_look_missing_even_to_admins() {
    let shop = Shop::new();
    let alice = student();
    let root = admin();
    let cable = shop.stock_product("USB cable", dec!(6), 10);

    let line = shop.carts.add_item(&alice, add(&cable, 2)).await.unwrap();
    let expected = CommerceError::NotFound(format!("Cart item {}", line.item.id));

    let err = shop
        .carts
        .update_quantity(&root, line.item.id, UpdateCartItem { quantity: 1 })
        .await
        .unwrap_err();
    assert_eq!(err, expected);

    let err = shop.carts.remove_item(&root, line.item.id).await.unwrap_err();
    assert_eq!(err, expected);

    let cart = shop.carts.get_cart(&alice).await.unwrap();
    assert_eq!(cart.items[0].item.quantity, 2);
}

#[tokio::test]
async fn removing_an_item_twice_reports_not_found() {
    let shop = Shop::new();
    let alice = student();
    let cable = shop.stock_product("USB cable", dec!(6), 10);

    let line = shop.carts.add_item(&alice, add(&cable, 1)).await.unwrap();

    shop.carts.remove_item(&alice, line.item.id).await.unwrap();
    let err = shop.carts.remove_item(&alice, line.item.id).await.unwrap_err();
    assert!(matches!(err, CommerceError::NotFound(_)));
}

#[tokio::test]
async fn cart_mutations_never_touch_stock() {
    let shop = Shop::new();
    let alice = student();
    let bob = student();
    let ruler = shop.stock_product("Ruler", dec!(2), 6);

    let line = shop.carts.add_item(&alice, add(&ruler, 3)).await.unwrap();
    shop.carts.add_item(&bob, add(&ruler, 6)).await.unwrap();
    shop.carts
        .update_quantity(&alice, line.item.id, UpdateCartItem { quantity: 5 })
        .await
        .unwrap();
    shop.carts.remove_item(&alice, line.item.id).await.unwrap();
    shop.carts.clear_cart(&bob).await.unwrap();

    assert_eq!(shop.stock(&ruler).await, 6);
}

#[tokio::test]
async fn clear_cart_empties_the_cart_and_tolerates_missing_carts() {
    let shop = Shop::new();
    let alice = student();
    let a = shop.stock_product("Stapler", dec!(9), 3);
    let b = shop.stock_product("Staples", dec!(2), 30);

    shop.carts.clear_cart(&alice).await.unwrap();

    shop.carts.add_item(&alice, add(&a, 1)).await.unwrap();
    shop.carts.add_item(&alice, add(&b, 10)).await.unwrap();
    shop.carts.clear_cart(&alice).await.unwrap();

    let cart = shop.carts.get_cart(&alice).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, dec!(0));
}
