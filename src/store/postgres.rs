use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper, upsert::excluded};
use diesel_async::{
    AsyncConnection, AsyncPgConnection, RunQueryDsl, pooled_connection::bb8::PooledConnection,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{
    CommerceStore, LineRejection, NewCartItem, OrderPlan, OrderTotals, OwnedCartItem, StoreError,
};
use crate::{
    commerce::{
        status::OrderStatus,
        types::{Cart, CartItem, CartLine, Order, OrderItem, OrderWithItems, Product},
    },
    db::DbPool,
    models::{
        CartEntity, CartItemEntity, CreateCartEntity, CreateCartItemEntity, CreateOrderEntity,
        CreateOrderItemEntity, OrderEntity, OrderItemEntity, ProductEntity, UpsertProductEntity,
    },
    schema::{cart_items, carts, order_items, orders, products},
};

/// PostgreSQL-backed store on a `diesel-async` bb8 pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

fn into_orders(rows: Vec<OrderEntity>) -> Result<Vec<Order>, StoreError> {
    rows.into_iter().map(Order::try_from).collect()
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|err| StoreError::Pool(err.to_string()))
    }

    /// Inserts or overwrites a catalog row. Used for seeding; catalog management
    /// itself belongs to the vendor tooling.
    pub async fn put_product(&self, product: &Product) -> Result<(), StoreError> {
        let conn = &mut self.conn().await?;
        let entity = UpsertProductEntity::from(product);

        diesel::insert_into(products::table)
            .values(&entity)
            .on_conflict(products::id)
            .do_update()
            .set(&entity)
            .execute(conn)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl CommerceStore for PgStore {
    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let conn = &mut self.conn().await?;

        let product: Option<ProductEntity> = products::table
            .find(id)
            .select(ProductEntity::as_select())
            .first(conn)
            .await
            .optional()?;

        Ok(product.map(Product::from))
    }

    async fn low_stock_products(&self, threshold: i32) -> Result<Vec<Product>, StoreError> {
        let conn = &mut self.conn().await?;

        let rows: Vec<ProductEntity> = products::table
            .filter(products::active.eq(true))
            .filter(products::stock.le(threshold))
            .order_by((products::stock.asc(), products::id.asc()))
            .select(ProductEntity::as_select())
            .load(conn)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn cart_for_user(&self, user_id: Uuid) -> Result<Cart, StoreError> {
        let conn = &mut self.conn().await?;

        diesel::insert_into(carts::table)
            .values(CreateCartEntity {
                id: Uuid::new_v4(),
                owner_user_id: user_id,
            })
            .on_conflict(carts::owner_user_id)
            .do_nothing()
            .execute(conn)
            .await?;

        let cart: CartEntity = carts::table
            .filter(carts::owner_user_id.eq(user_id))
            .select(CartEntity::as_select())
            .first(conn)
            .await?;

        Ok(cart.into())
    }

    async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>, StoreError> {
        let conn = &mut self.conn().await?;

        let cart: Option<CartEntity> = carts::table
            .filter(carts::owner_user_id.eq(user_id))
            .select(CartEntity::as_select())
            .first(conn)
            .await
            .optional()?;

        Ok(cart.map(Cart::from))
    }

    async fn cart_lines(&self, cart_id: Uuid) -> Result<Vec<CartLine>, StoreError> {
        let conn = &mut self.conn().await?;

        let rows: Vec<(CartItemEntity, ProductEntity)> = cart_items::table
            .inner_join(products::table)
            .filter(cart_items::cart_id.eq(cart_id))
            .order_by((cart_items::created_at.asc(), cart_items::id.asc()))
            .select((CartItemEntity::as_select(), ProductEntity::as_select()))
            .load(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(item, product)| CartLine {
                item: item.into(),
                product: product.into(),
            })
            .collect())
    }

    async fn cart_item_for_product(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, StoreError> {
        let conn = &mut self.conn().await?;

        let item: Option<CartItemEntity> = cart_items::table
            .filter(cart_items::cart_id.eq(cart_id))
            .filter(cart_items::product_id.eq(product_id))
            .select(CartItemEntity::as_select())
            .first(conn)
            .await
            .optional()?;

        Ok(item.map(CartItem::from))
    }

    async fn owned_cart_item(&self, item_id: Uuid) -> Result<Option<OwnedCartItem>, StoreError> {
        let conn = &mut self.conn().await?;

        let row: Option<(CartItemEntity, Uuid, ProductEntity)> = cart_items::table
            .inner_join(carts::table)
            .inner_join(products::table)
            .filter(cart_items::id.eq(item_id))
            .select((
                CartItemEntity::as_select(),
                carts::owner_user_id,
                ProductEntity::as_select(),
            ))
            .first(conn)
            .await
            .optional()?;

        Ok(row.map(|(item, owner_user_id, product)| OwnedCartItem {
            item: item.into(),
            owner_user_id,
            product: product.into(),
        }))
    }

    async fn add_to_cart(&self, item: NewCartItem) -> Result<CartItem, StoreError> {
        let conn = &mut self.conn().await?;

        let item: CartItemEntity = diesel::insert_into(cart_items::table)
            .values(CreateCartItemEntity::from(item))
            .on_conflict((cart_items::cart_id, cart_items::product_id))
            .do_update()
            .set((
                cart_items::quantity.eq(cart_items::quantity + excluded(cart_items::quantity)),
                cart_items::updated_at.eq(diesel::dsl::now),
            ))
            .returning(CartItemEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(item.into())
    }

    async fn set_cart_item_quantity(
        &self,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<Option<CartItem>, StoreError> {
        let conn = &mut self.conn().await?;

        let item: Option<CartItemEntity> = diesel::update(cart_items::table.find(item_id))
            .set((
                cart_items::quantity.eq(quantity),
                cart_items::updated_at.eq(diesel::dsl::now),
            ))
            .returning(CartItemEntity::as_returning())
            .get_result(conn)
            .await
            .optional()?;

        Ok(item.map(CartItem::from))
    }

    async fn delete_cart_item(&self, item_id: Uuid) -> Result<bool, StoreError> {
        let conn = &mut self.conn().await?;

        let deleted = diesel::delete(cart_items::table.find(item_id))
            .execute(conn)
            .await?;

        Ok(deleted > 0)
    }

    async fn clear_cart(&self, cart_id: Uuid) -> Result<usize, StoreError> {
        let conn = &mut self.conn().await?;

        let deleted = diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart_id)))
            .execute(conn)
            .await?;

        Ok(deleted)
    }

    async fn commit_order(&self, plan: OrderPlan) -> Result<OrderWithItems, StoreError> {
        let conn = &mut self.conn().await?;

        conn.transaction(move |conn| {
            Box::pin(async move {
                let order: OrderEntity = diesel::insert_into(orders::table)
                    .values(CreateOrderEntity::from(&plan))
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await
                    .map_err(|err| StoreError::from_order_insert(err, &plan.order_number))?;

                let new_items: Vec<CreateOrderItemEntity> = plan
                    .lines
                    .iter()
                    .map(|line| CreateOrderItemEntity::for_line(order.id, line))
                    .collect();

                let items: Vec<OrderItemEntity> = diesel::insert_into(order_items::table)
                    .values(new_items)
                    .returning(OrderItemEntity::as_returning())
                    .get_results(conn)
                    .await?;

                // The conditional update takes the row lock and re-checks stock against
                // the latest committed value, so concurrent checkouts cannot oversell.
                for line in plan.lines_in_lock_order() {
                    let decremented = diesel::update(products::table)
                        .filter(products::id.eq(line.product_id))
                        .filter(products::active.eq(true))
                        .filter(products::stock.ge(line.quantity))
                        .set((
                            products::stock.eq(products::stock - line.quantity),
                            products::updated_at.eq(diesel::dsl::now),
                        ))
                        .execute(conn)
                        .await?;

                    if decremented == 0 {
                        let current: Option<(i32, bool)> = products::table
                            .find(line.product_id)
                            .select((products::stock, products::active))
                            .first(conn)
                            .await
                            .optional()?;

                        let rejection = match current {
                            None => LineRejection::Missing,
                            Some((_, false)) => LineRejection::Deactivated,
                            Some((available, true)) => LineRejection::Short { available },
                        };

                        return Err(StoreError::LineRejected {
                            product_id: line.product_id,
                            rejection,
                        });
                    }
                }

                // Rows added to the cart after the plan was read are left alone.
                for line in &plan.lines {
                    let removed = diesel::delete(
                        cart_items::table
                            .filter(cart_items::id.eq(line.cart_item_id))
                            .filter(cart_items::cart_id.eq(plan.cart_id))
                            .filter(cart_items::quantity.eq(line.quantity)),
                    )
                    .execute(conn)
                    .await?;

                    if removed == 0 {
                        return Err(StoreError::CartChanged(line.cart_item_id));
                    }
                }

                Ok::<OrderWithItems, StoreError>(OrderWithItems {
                    order: order.try_into()?,
                    items: items.into_iter().map(OrderItem::from).collect(),
                })
            })
        })
        .await
    }

    async fn order(&self, id: Uuid) -> Result<Option<OrderWithItems>, StoreError> {
        let conn = &mut self.conn().await?;

        let order: Option<OrderEntity> = orders::table
            .find(id)
            .select(OrderEntity::as_select())
            .first(conn)
            .await
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items: Vec<OrderItemEntity> = order_items::table
            .filter(order_items::order_id.eq(order.id))
            .order_by((order_items::created_at.asc(), order_items::id.asc()))
            .select(OrderItemEntity::as_select())
            .load(conn)
            .await?;

        Ok(Some(OrderWithItems {
            order: order.try_into()?,
            items: items.into_iter().map(OrderItem::from).collect(),
        }))
    }

    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let conn = &mut self.conn().await?;

        let rows: Vec<OrderEntity> = orders::table
            .filter(orders::owner_user_id.eq(user_id))
            .order_by(orders::created_at.desc())
            .select(OrderEntity::as_select())
            .load(conn)
            .await?;

        into_orders(rows)
    }

    async fn all_orders(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> Result<Vec<Order>, StoreError> {
        let conn = &mut self.conn().await?;

        let mut query = orders::table
            .order_by(orders::created_at.desc())
            .limit(limit)
            .select(OrderEntity::as_select())
            .into_boxed();

        if let Some(status) = status {
            query = query.filter(orders::status.eq(status.as_str()));
        }

        let rows: Vec<OrderEntity> = query.load(conn).await?;
        into_orders(rows)
    }

    async fn order_totals(&self) -> Result<OrderTotals, StoreError> {
        let conn = &mut self.conn().await?;

        let total_orders: i64 = orders::table.count().get_result(conn).await?;

        let pending_orders: i64 = orders::table
            .filter(orders::status.eq(OrderStatus::Pending.as_str()))
            .count()
            .get_result(conn)
            .await?;

        let revenue: Option<Decimal> = orders::table
            .filter(orders::status.eq_any(OrderStatus::REVENUE.map(OrderStatus::as_str)))
            .select(diesel::dsl::sum(orders::total))
            .first(conn)
            .await?;

        Ok(OrderTotals {
            total_orders,
            pending_orders,
            revenue: revenue.unwrap_or_default(),
        })
    }

    async fn set_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let conn = &mut self.conn().await?;

        let order: Option<OrderEntity> = diesel::update(orders::table.find(id))
            .set((
                orders::status.eq(status.as_str()),
                orders::updated_at.eq(diesel::dsl::now),
            ))
            .returning(OrderEntity::as_returning())
            .get_result(conn)
            .await
            .optional()?;

        order.map(Order::try_from).transpose()
    }
}
