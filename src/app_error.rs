use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::commerce::error::{CommerceError, WireError};

/// Envelope of every API response. Failed requests carry `error` and no `data`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StdResponse<T, M> {
    pub data: Option<T>,
    pub message: Option<M>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

impl<T, M> StdResponse<T, M> {
    pub fn ok(data: T, message: M) -> Self {
        Self {
            data: Some(data),
            message: Some(message),
            error: None,
        }
    }
}

impl<T: Serialize, M: Serialize> IntoResponse for StdResponse<T, M> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Commerce(CommerceError::Validation(rejection.body_text()))
    }
}

fn status_for(err: &CommerceError) -> StatusCode {
    match err {
        CommerceError::NotFound(_) => StatusCode::NOT_FOUND,
        CommerceError::ProductUnavailable { .. } | CommerceError::InsufficientStock { .. } => {
            StatusCode::CONFLICT
        }
        CommerceError::EmptyCart
        | CommerceError::Validation(_)
        | CommerceError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
        CommerceError::Forbidden(_) => StatusCode::FORBIDDEN,
        CommerceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        CommerceError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = match self {
            AppError::Commerce(err) => err,
            AppError::Other(err) => {
                error!("Unhandled error: {:#}", err);
                CommerceError::Unexpected("Internal server error".into())
            }
        };

        let body: StdResponse<(), String> = StdResponse {
            data: None,
            message: Some(err.to_string()),
            error: Some(WireError::from(&err)),
        };

        (status_for(&err), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn stock_conflicts_map_to_409() {
        let err = CommerceError::InsufficientStock {
            product_id: Uuid::new_v4(),
            name: "Mug".into(),
            available: 1,
            requested: 2,
        };
        assert_eq!(status_for(&err), StatusCode::CONFLICT);
        assert_eq!(status_for(&CommerceError::EmptyCart), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&CommerceError::Unauthenticated("x".into())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn error_responses_carry_the_wire_form() {
        let res = AppError::from(CommerceError::NotFound("Order 1".into())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = AppError::from(anyhow::anyhow!("pool exhausted")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
