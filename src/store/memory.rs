use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{
    CommerceStore, LineRejection, NewCartItem, OrderPlan, OrderTotals, OwnedCartItem, StoreError,
};
use crate::commerce::{
    status::OrderStatus,
    types::{Cart, CartItem, CartLine, Order, OrderItem, OrderWithItems, Product, ProductState},
};

#[derive(Default)]
struct Tables {
    products: HashMap<Uuid, Product>,
    carts: HashMap<Uuid, Cart>,
    // Insertion order doubles as display order.
    cart_items: Vec<CartItem>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    order_numbers: HashSet<String>,
}

impl Tables {
    fn cart_by_owner(&self, user_id: Uuid) -> Option<&Cart> {
        self.carts.values().find(|cart| cart.owner_user_id == user_id)
    }

    fn order_with_items(&self, order: &Order) -> OrderWithItems {
        OrderWithItems {
            order: order.clone(),
            items: self
                .order_items
                .iter()
                .filter(|item| item.order_id == order.id)
                .cloned()
                .collect(),
        }
    }

    fn check_line(&self, product_id: Uuid, quantity: i32) -> Result<(), StoreError> {
        let rejection = match self.products.get(&product_id) {
            None => Some(LineRejection::Missing),
            Some(product) if !product.state.is_active() => Some(LineRejection::Deactivated),
            Some(product) if product.stock < quantity => Some(LineRejection::Short {
                available: product.stock,
            }),
            Some(_) => None,
        };

        match rejection {
            Some(rejection) => Err(StoreError::LineRejected {
                product_id,
                rejection,
            }),
            None => Ok(()),
        }
    }
}

/// In-process store. One mutex guards every table, so a commit observes and
/// mutates a consistent snapshot.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a catalog entry.
    pub fn put_product(&self, product: Product) {
        self.tables.lock().products.insert(product.id, product);
    }

    /// Seller-side absolute stock edit.
    pub fn set_stock(&self, product_id: Uuid, stock: i32) -> bool {
        match self.tables.lock().products.get_mut(&product_id) {
            Some(product) => {
                product.stock = stock;
                true
            }
            None => false,
        }
    }

    pub fn set_product_state(&self, product_id: Uuid, state: ProductState) -> bool {
        match self.tables.lock().products.get_mut(&product_id) {
            Some(product) => {
                product.state = state;
                true
            }
            None => false,
        }
    }

    pub fn order_count(&self) -> usize {
        self.tables.lock().orders.len()
    }

    pub fn order_item_count(&self) -> usize {
        self.tables.lock().order_items.len()
    }
}

#[async_trait]
impl CommerceStore for MemoryStore {
    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.tables.lock().products.get(&id).cloned())
    }

    async fn low_stock_products(&self, threshold: i32) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self
            .tables
            .lock()
            .products
            .values()
            .filter(|p| p.state.is_active() && p.stock <= threshold)
            .cloned()
            .collect();
        products.sort_by_key(|p| (p.stock, p.id));
        Ok(products)
    }

    async fn cart_for_user(&self, user_id: Uuid) -> Result<Cart, StoreError> {
        let mut tables = self.tables.lock();
        if let Some(cart) = tables.cart_by_owner(user_id) {
            return Ok(cart.clone());
        }

        let cart = Cart {
            id: Uuid::new_v4(),
            owner_user_id: user_id,
            created_at: Utc::now(),
        };
        tables.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>, StoreError> {
        Ok(self.tables.lock().cart_by_owner(user_id).cloned())
    }

    async fn cart_lines(&self, cart_id: Uuid) -> Result<Vec<CartLine>, StoreError> {
        let tables = self.tables.lock();
        Ok(tables
            .cart_items
            .iter()
            .filter(|item| item.cart_id == cart_id)
            .filter_map(|item| {
                tables.products.get(&item.product_id).map(|product| CartLine {
                    item: item.clone(),
                    product: product.clone(),
                })
            })
            .collect())
    }

    async fn cart_item_for_product(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, StoreError> {
        Ok(self
            .tables
            .lock()
            .cart_items
            .iter()
            .find(|item| item.cart_id == cart_id && item.product_id == product_id)
            .cloned())
    }

    async fn owned_cart_item(&self, item_id: Uuid) -> Result<Option<OwnedCartItem>, StoreError> {
        let tables = self.tables.lock();
        let Some(item) = tables.cart_items.iter().find(|item| item.id == item_id) else {
            return Ok(None);
        };

        let owner = tables.carts.get(&item.cart_id).map(|cart| cart.owner_user_id);
        let product = tables.products.get(&item.product_id);

        Ok(owner.zip(product).map(|(owner_user_id, product)| OwnedCartItem {
            item: item.clone(),
            owner_user_id,
            product: product.clone(),
        }))
    }

    async fn add_to_cart(&self, new_item: NewCartItem) -> Result<CartItem, StoreError> {
        let mut tables = self.tables.lock();

        if let Some(existing) = tables
            .cart_items
            .iter_mut()
            .find(|item| item.cart_id == new_item.cart_id && item.product_id == new_item.product_id)
        {
            existing.quantity += new_item.quantity;
            return Ok(existing.clone());
        }

        let item = CartItem {
            id: Uuid::new_v4(),
            cart_id: new_item.cart_id,
            product_id: new_item.product_id,
            quantity: new_item.quantity,
            unit_price_snapshot: new_item.unit_price_snapshot,
            created_at: Utc::now(),
        };
        tables.cart_items.push(item.clone());
        Ok(item)
    }

    async fn set_cart_item_quantity(
        &self,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<Option<CartItem>, StoreError> {
        let mut tables = self.tables.lock();
        Ok(tables
            .cart_items
            .iter_mut()
            .find(|item| item.id == item_id)
            .map(|item| {
                item.quantity = quantity;
                item.clone()
            }))
    }

    async fn delete_cart_item(&self, item_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock();
        let before = tables.cart_items.len();
        tables.cart_items.retain(|item| item.id != item_id);
        Ok(tables.cart_items.len() != before)
    }

    async fn clear_cart(&self, cart_id: Uuid) -> Result<usize, StoreError> {
        let mut tables = self.tables.lock();
        let before = tables.cart_items.len();
        tables.cart_items.retain(|item| item.cart_id != cart_id);
        Ok(before - tables.cart_items.len())
    }

    async fn commit_order(&self, plan: OrderPlan) -> Result<OrderWithItems, StoreError> {
        let mut tables = self.tables.lock();

        if tables.order_numbers.contains(&plan.order_number) {
            return Err(StoreError::DuplicateOrderNumber(plan.order_number));
        }

        // Validate everything before touching any row.
        for line in plan.lines_in_lock_order() {
            tables.check_line(line.product_id, line.quantity)?;

            let unchanged = tables.cart_items.iter().any(|item| {
                item.id == line.cart_item_id
                    && item.cart_id == plan.cart_id
                    && item.quantity == line.quantity
            });
            if !unchanged {
                return Err(StoreError::CartChanged(line.cart_item_id));
            }
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            order_number: plan.order_number.clone(),
            owner_user_id: plan.owner_user_id,
            total: plan.total,
            status: OrderStatus::Pending,
            delivery_address: plan.delivery_address.clone(),
            contact_phone: plan.contact_phone.clone(),
            notes: plan.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        let items: Vec<OrderItem> = plan
            .lines
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price_snapshot: line.unit_price_snapshot,
                subtotal: line.subtotal,
                created_at: now,
            })
            .collect();

        for line in &plan.lines {
            if let Some(product) = tables.products.get_mut(&line.product_id) {
                product.stock -= line.quantity;
            }
        }

        tables.order_numbers.insert(plan.order_number);
        tables.orders.push(order.clone());
        tables.order_items.extend(items.iter().cloned());
        tables
            .cart_items
            .retain(|item| !plan.lines.iter().any(|line| line.cart_item_id == item.id));

        Ok(OrderWithItems { order, items })
    }

    async fn order(&self, id: Uuid) -> Result<Option<OrderWithItems>, StoreError> {
        let tables = self.tables.lock();
        Ok(tables
            .orders
            .iter()
            .find(|order| order.id == id)
            .map(|order| tables.order_with_items(order)))
    }

    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .tables
            .lock()
            .orders
            .iter()
            .rev()
            .filter(|order| order.owner_user_id == user_id)
            .cloned()
            .collect())
    }

    async fn all_orders(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .tables
            .lock()
            .orders
            .iter()
            .rev()
            .filter(|order| status.is_none_or(|status| order.status == status))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn order_totals(&self) -> Result<OrderTotals, StoreError> {
        let tables = self.tables.lock();

        Ok(tables.orders.iter().fold(OrderTotals::default(), |mut totals, order| {
            totals.total_orders += 1;
            if order.status == OrderStatus::Pending {
                totals.pending_orders += 1;
            }
            if order.status.counts_as_revenue() {
                totals.revenue += order.total;
            }
            totals
        }))
    }

    async fn set_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let mut tables = self.tables.lock();
        Ok(tables
            .orders
            .iter_mut()
            .find(|order| order.id == id)
            .map(|order| {
                order.status = status;
                order.updated_at = Utc::now();
                order.clone()
            }))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::store::PlannedLine;

    fn product(stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Graph paper".into(),
            description: None,
            price: dec!(2.00),
            stock,
            state: ProductState::Active,
            category_id: None,
            seller_id: None,
            image_url: None,
        }
    }

    fn plan(cart_item: &CartItem, product: &Product) -> OrderPlan {
        let quantity = cart_item.quantity;
        OrderPlan {
            cart_id: cart_item.cart_id,
            owner_user_id: Uuid::new_v4(),
            order_number: "ORD-1-abcdefghi".into(),
            total: product.price * rust_decimal::Decimal::from(quantity),
            delivery_address: "Building 3".into(),
            contact_phone: "555-0100".into(),
            notes: None,
            lines: vec![PlannedLine {
                cart_item_id: cart_item.id,
                product_id: product.id,
                product_name: product.name.clone(),
                quantity,
                unit_price_snapshot: product.price,
                subtotal: product.price * rust_decimal::Decimal::from(quantity),
            }],
        }
    }

    async fn stocked_cart(store: &MemoryStore, product: &Product, quantity: i32) -> CartItem {
        store.put_product(product.clone());
        let cart = store.cart_for_user(Uuid::new_v4()).await.unwrap();
        store
            .add_to_cart(NewCartItem {
                cart_id: cart.id,
                product_id: product.id,
                quantity,
                unit_price_snapshot: product.price,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn cart_is_created_once_per_user() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        let first = store.cart_for_user(user).await.unwrap();
        let second = store.cart_for_user(user).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn repeat_add_keeps_the_first_snapshot() {
        let store = MemoryStore::new();
        let cart = store.cart_for_user(Uuid::new_v4()).await.unwrap();
        let product_id = Uuid::new_v4();

        store
            .add_to_cart(NewCartItem {
                cart_id: cart.id,
                product_id,
                quantity: 1,
                unit_price_snapshot: dec!(3.00),
            })
            .await
            .unwrap();
        let item = store
            .add_to_cart(NewCartItem {
                cart_id: cart.id,
                product_id,
                quantity: 2,
                unit_price_snapshot: dec!(5.00),
            })
            .await
            .unwrap();

        assert_eq!(item.quantity, 3);
        assert_eq!(item.unit_price_snapshot, dec!(3.00));
    }

    #[tokio::test]
    async fn rejected_commit_leaves_everything_untouched() {
        let store = MemoryStore::new();
        let product = product(1);
        let item = stocked_cart(&store, &product, 2).await;

        let err = store.commit_order(plan(&item, &product)).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::LineRejected {
                rejection: LineRejection::Short { available: 1 },
                ..
            }
        ));
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.product(product.id).await.unwrap().unwrap().stock, 1);
        assert_eq!(store.cart_lines(item.cart_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reused_order_number_is_reported() {
        let store = MemoryStore::new();
        let product = product(5);
        let item = stocked_cart(&store, &product, 1).await;

        store.commit_order(plan(&item, &product)).await.unwrap();
        let err = store.commit_order(plan(&item, &product)).await.unwrap_err();

        assert!(matches!(err, StoreError::DuplicateOrderNumber(_)));
        assert_eq!(store.product(product.id).await.unwrap().unwrap().stock, 4);
    }

    #[tokio::test]
    async fn edited_cart_row_aborts_the_commit() {
        let store = MemoryStore::new();
        let product = product(5);
        let item = stocked_cart(&store, &product, 1).await;
        let planned = plan(&item, &product);

        store.set_cart_item_quantity(item.id, 3).await.unwrap();

        let err = store.commit_order(planned).await.unwrap_err();
        assert!(matches!(err, StoreError::CartChanged(id) if id == item.id));
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.product(product.id).await.unwrap().unwrap().stock, 5);
        assert_eq!(store.cart_lines(item.cart_id).await.unwrap()[0].item.quantity, 3);
    }

    #[tokio::test]
    async fn commit_only_removes_planned_rows() {
        let store = MemoryStore::new();
        let pen = product(5);
        let item = stocked_cart(&store, &pen, 1).await;
        let planned = plan(&item, &pen);

        let book = product(10);
        store.put_product(book.clone());
        store
            .add_to_cart(NewCartItem {
                cart_id: item.cart_id,
                product_id: book.id,
                quantity: 3,
                unit_price_snapshot: book.price,
            })
            .await
            .unwrap();

        store.commit_order(planned).await.unwrap();

        let left = store.cart_lines(item.cart_id).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].item.product_id, book.id);
        assert_eq!(left[0].item.quantity, 3);
    }

    #[tokio::test]
    async fn totals_count_revenue_from_accepted_orders_only() {
        let store = MemoryStore::new();
        let product = product(50);
        let first = stocked_cart(&store, &product, 2).await;
        let placed = store.commit_order(plan(&first, &product)).await.unwrap();

        let second = stocked_cart(&store, &product, 3).await;
        let mut other = plan(&second, &product);
        other.order_number = "ORD-2-abcdefghi".into();
        store.commit_order(other).await.unwrap();

        store
            .set_order_status(placed.order.id, OrderStatus::Confirmed)
            .await
            .unwrap();

        let totals = store.order_totals().await.unwrap();
        assert_eq!(totals.total_orders, 2);
        assert_eq!(totals.pending_orders, 1);
        assert_eq!(totals.revenue, dec!(4.00));

        let limited = store.all_orders(None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
