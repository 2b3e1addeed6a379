//! Cart and checkout rules, written once and shared by every call path.

pub mod cart_service;
pub mod error;
pub mod order_number;
pub mod order_service;
pub mod status;
pub mod types;
pub mod validation;

pub use cart_service::CartService;
pub use error::{CommerceError, WireError};
pub use order_service::OrderService;
pub use status::{OrderStatus, StatusPolicy};
