use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::{
    error::CommerceError,
    types::{AddCartItem, CartLine, CartView, UpdateCartItem},
    validation,
};
use crate::{
    gateway::Identity,
    store::{CommerceStore, NewCartItem, OwnedCartItem},
};

/// Per-user cart management.
///
/// Carts reserve nothing: every mutation is checked against live stock, but the
/// binding check happens at checkout. Cart mutations never change product stock.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CommerceStore>,
}

impl CartService {
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        Self { store }
    }

    /// The caller's cart with live product data, created on first access.
    pub async fn get_cart(&self, caller: &Identity) -> Result<CartView, CommerceError> {
        let cart = self.store.cart_for_user(caller.user_id).await?;
        let lines = self.store.cart_lines(cart.id).await?;
        Ok(CartView::new(cart.id, lines))
    }

    /// Adds `quantity` units of a product. A product already in the cart has its
    /// quantity increased and keeps the price captured on the first add.
    pub async fn add_item(
        &self,
        caller: &Identity,
        input: AddCartItem,
    ) -> Result<CartLine, CommerceError> {
        let quantity = validation::require_positive_quantity(input.quantity)?;

        let product = self
            .store
            .product(input.product_id)
            .await?
            .ok_or_else(|| CommerceError::NotFound(format!("Product {}", input.product_id)))?;
        validation::ensure_orderable(&product, quantity)?;

        let cart = self.store.cart_for_user(caller.user_id).await?;
        let in_cart = self
            .store
            .cart_item_for_product(cart.id, product.id)
            .await?
            .map_or(0, |item| item.quantity);

        let requested = in_cart
            .checked_add(quantity)
            .ok_or_else(|| CommerceError::Validation("Quantity is too large".into()))?;
        validation::ensure_orderable(&product, requested)?;

        let item = self
            .store
            .add_to_cart(NewCartItem {
                cart_id: cart.id,
                product_id: product.id,
                quantity,
                unit_price_snapshot: product.price,
            })
            .await?;

        info!(
            user_id = %caller.user_id,
            product_id = %product.id,
            quantity = item.quantity,
            "Cart item added"
        );

        Ok(CartLine { item, product })
    }

    /// Replaces the quantity of one of the caller's cart items.
    pub async fn update_quantity(
        &self,
        caller: &Identity,
        item_id: Uuid,
        input: UpdateCartItem,
    ) -> Result<CartLine, CommerceError> {
        let quantity = validation::require_positive_quantity(input.quantity)?;
        let owned = self.owned_item(caller, item_id).await?;
        validation::ensure_orderable(&owned.product, quantity)?;

        let item = self
            .store
            .set_cart_item_quantity(item_id, quantity)
            .await?
            .ok_or_else(|| cart_item_not_found(item_id))?;

        Ok(CartLine {
            item,
            product: owned.product,
        })
    }

    /// Removing an item twice reports `NotFound` the second time.
    pub async fn remove_item(&self, caller: &Identity, item_id: Uuid) -> Result<(), CommerceError> {
        self.owned_item(caller, item_id).await?;

        if !self.store.delete_cart_item(item_id).await? {
            return Err(cart_item_not_found(item_id));
        }

        Ok(())
    }

    pub async fn clear_cart(&self, caller: &Identity) -> Result<(), CommerceError> {
        if let Some(cart) = self.store.find_cart(caller.user_id).await? {
            let removed = self.store.clear_cart(cart.id).await?;
            info!(user_id = %caller.user_id, removed, "Cart cleared");
        }

        Ok(())
    }

    /// Items in someone else's cart look exactly like missing ones, whatever the
    /// caller's role.
    async fn owned_item(
        &self,
        caller: &Identity,
        item_id: Uuid,
    ) -> Result<OwnedCartItem, CommerceError> {
        self.store
            .owned_cart_item(item_id)
            .await?
            .filter(|owned| owned.owner_user_id == caller.user_id)
            .ok_or_else(|| cart_item_not_found(item_id))
    }
}

fn cart_item_not_found(item_id: Uuid) -> CommerceError {
    CommerceError::NotFound(format!("Cart item {}", item_id))
}
