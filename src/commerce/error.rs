use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Failures of cart and order operations.
///
/// Everything except `Unexpected` is a client-correctable condition. `Unexpected`
/// covers backend and network failures; because no operation leaves partial state
/// behind, a call that failed with it can be re-issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommerceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Product {name} is not available")]
    ProductUnavailable { product_id: Uuid, name: String },

    #[error("Insufficient stock for {name}. Available: {available}")]
    InsufficientStock {
        product_id: Uuid,
        name: String,
        available: i32,
        requested: i32,
    },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidStatus(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Unexpected(String),
}

impl CommerceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::ProductUnavailable { .. } => "product_unavailable",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::EmptyCart => "empty_cart",
            Self::Validation(_) => "validation_error",
            Self::InvalidStatus(_) => "invalid_status",
            Self::Forbidden(_) => "forbidden",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Unexpected(_) => "internal",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unexpected(_))
    }
}

/// Serialized form of a [`CommerceError`], carried in the `error` field of failed
/// API responses. Converting back yields the same error the service produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WireError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested: Option<i32>,
}

impl From<&CommerceError> for WireError {
    fn from(err: &CommerceError) -> Self {
        let mut wire = WireError {
            code: err.code().to_string(),
            message: err.to_string(),
            resource: None,
            product_id: None,
            product_name: None,
            available: None,
            requested: None,
        };

        match err {
            CommerceError::NotFound(resource) => wire.resource = Some(resource.clone()),
            CommerceError::ProductUnavailable { product_id, name } => {
                wire.product_id = Some(*product_id);
                wire.product_name = Some(name.clone());
            }
            CommerceError::InsufficientStock {
                product_id,
                name,
                available,
                requested,
            } => {
                wire.product_id = Some(*product_id);
                wire.product_name = Some(name.clone());
                wire.available = Some(*available);
                wire.requested = Some(*requested);
            }
            _ => {}
        }

        wire
    }
}

impl From<WireError> for CommerceError {
    fn from(wire: WireError) -> Self {
        let malformed = |wire: &WireError| {
            CommerceError::Unexpected(format!("Malformed {} error: {}", wire.code, wire.message))
        };

        match wire.code.as_str() {
            "not_found" => match wire.resource {
                Some(resource) => CommerceError::NotFound(resource),
                None => malformed(&wire),
            },
            "product_unavailable" => match (wire.product_id, wire.product_name.clone()) {
                (Some(product_id), Some(name)) => {
                    CommerceError::ProductUnavailable { product_id, name }
                }
                _ => malformed(&wire),
            },
            "insufficient_stock" => match (
                wire.product_id,
                wire.product_name.clone(),
                wire.available,
                wire.requested,
            ) {
                (Some(product_id), Some(name), Some(available), Some(requested)) => {
                    CommerceError::InsufficientStock {
                        product_id,
                        name,
                        available,
                        requested,
                    }
                }
                _ => malformed(&wire),
            },
            "empty_cart" => CommerceError::EmptyCart,
            "validation_error" => CommerceError::Validation(wire.message),
            "invalid_status" => CommerceError::InvalidStatus(wire.message),
            "forbidden" => CommerceError::Forbidden(wire.message),
            "unauthenticated" => CommerceError::Unauthenticated(wire.message),
            _ => CommerceError::Unexpected(wire.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_reports_available_quantity() {
        let err = CommerceError::InsufficientStock {
            product_id: Uuid::new_v4(),
            name: "Calculator".into(),
            available: 3,
            requested: 4,
        };
        assert_eq!(err.to_string(), "Insufficient stock for Calculator. Available: 3");
    }

    #[test]
    fn stock_error_survives_the_wire() {
        let err = CommerceError::InsufficientStock {
            product_id: Uuid::new_v4(),
            name: "Lab coat".into(),
            available: 1,
            requested: 2,
        };

        let json = serde_json::to_string(&WireError::from(&err)).unwrap();
        let wire: WireError = serde_json::from_str(&json).unwrap();
        assert_eq!(CommerceError::from(wire), err);
    }

    #[test]
    fn incomplete_wire_error_becomes_unexpected() {
        let wire = WireError {
            code: "insufficient_stock".into(),
            message: "Insufficient stock".into(),
            resource: None,
            product_id: None,
            product_name: None,
            available: Some(1),
            requested: None,
        };

        let err = CommerceError::from(wire);
        assert!(err.is_retryable());
    }
}
