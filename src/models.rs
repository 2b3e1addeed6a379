use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    commerce::{
        status::OrderStatus,
        types::{Cart, CartItem, Order, OrderItem, Product, ProductState},
    },
    store::{NewCartItem, OrderPlan, PlannedLine, StoreError},
};

// Products

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductEntity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub active: bool,
    pub category_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub image_url: Option<String>,
}

impl From<ProductEntity> for Product {
    fn from(entity: ProductEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            price: entity.price,
            stock: entity.stock,
            state: ProductState::from_active_flag(entity.active),
            category_id: entity.category_id,
            seller_id: entity.seller_id,
            image_url: entity.image_url,
        }
    }
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = crate::schema::products)]
pub struct UpsertProductEntity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub active: bool,
    pub category_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub image_url: Option<String>,
}

impl From<&Product> for UpsertProductEntity {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            active: product.state.is_active(),
            category_id: product.category_id,
            seller_id: product.seller_id,
            image_url: product.image_url.clone(),
        }
    }
}

// Carts

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartEntity {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<CartEntity> for Cart {
    fn from(entity: CartEntity) -> Self {
        Self {
            id: entity.id,
            owner_user_id: entity.owner_user_id,
            created_at: entity.created_at,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::carts)]
pub struct CreateCartEntity {
    pub id: Uuid,
    pub owner_user_id: Uuid,
}

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(belongs_to(CartEntity, foreign_key = cart_id))]
#[diesel(table_name = crate::schema::cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemEntity {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price_snapshot: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<CartItemEntity> for CartItem {
    fn from(entity: CartItemEntity) -> Self {
        Self {
            id: entity.id,
            cart_id: entity.cart_id,
            product_id: entity.product_id,
            quantity: entity.quantity,
            unit_price_snapshot: entity.unit_price_snapshot,
            created_at: entity.created_at,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::cart_items)]
pub struct CreateCartItemEntity {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price_snapshot: Decimal,
}

impl From<NewCartItem> for CreateCartItemEntity {
    fn from(item: NewCartItem) -> Self {
        Self {
            id: Uuid::new_v4(),
            cart_id: item.cart_id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price_snapshot: item.unit_price_snapshot,
        }
    }
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: Uuid,
    pub order_number: String,
    pub owner_user_id: Uuid,
    pub total: Decimal,
    pub status: String,
    pub delivery_address: String,
    pub contact_phone: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderEntity> for Order {
    type Error = StoreError;

    fn try_from(entity: OrderEntity) -> Result<Self, Self::Error> {
        // The check constraint on `orders.status` keeps this from failing.
        let status: OrderStatus = entity
            .status
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("order status '{}'", entity.status)))?;

        Ok(Self {
            id: entity.id,
            order_number: entity.order_number,
            owner_user_id: entity.owner_user_id,
            total: entity.total,
            status,
            delivery_address: entity.delivery_address,
            contact_phone: entity.contact_phone,
            notes: entity.notes,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub id: Uuid,
    pub order_number: String,
    pub owner_user_id: Uuid,
    pub total: Decimal,
    pub status: String,
    pub delivery_address: String,
    pub contact_phone: String,
    pub notes: Option<String>,
}

impl From<&OrderPlan> for CreateOrderEntity {
    fn from(plan: &OrderPlan) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_number: plan.order_number.clone(),
            owner_user_id: plan.owner_user_id,
            total: plan.total,
            status: OrderStatus::Pending.as_str().to_string(),
            delivery_address: plan.delivery_address.clone(),
            contact_phone: plan.contact_phone.clone(),
            notes: plan.notes.clone(),
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(belongs_to(OrderEntity, foreign_key = order_id))]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price_snapshot: Decimal,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<OrderItemEntity> for OrderItem {
    fn from(entity: OrderItemEntity) -> Self {
        Self {
            id: entity.id,
            order_id: entity.order_id,
            product_id: entity.product_id,
            quantity: entity.quantity,
            unit_price_snapshot: entity.unit_price_snapshot,
            subtotal: entity.subtotal,
            created_at: entity.created_at,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderItemEntity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price_snapshot: Decimal,
    pub subtotal: Decimal,
}

impl CreateOrderItemEntity {
    pub fn for_line(order_id: Uuid, line: &PlannedLine) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price_snapshot: line.unit_price_snapshot,
            subtotal: line.subtotal,
        }
    }
}
