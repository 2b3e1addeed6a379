use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    commerce::types::{CheckoutDetails, Order, OrderWithItems, StatusChange},
    gateway::Identity,
    middleware,
};

/// Checkout and order history of the authenticated caller, plus the admin status
/// update which shares the `/orders/{id}` prefix.
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_my_orders, create_order))
            .routes(utoipa_axum::routes!(get_order))
            .routes(utoipa_axum::routes!(update_order_status))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::authorization,
            )),
    )
}

/// Fetch the caller's orders, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Get my orders successfully", body = StdResponse<Vec<Order>, String>)
    )
)]
async fn get_my_orders(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    let orders = state.orders.list_my_orders(&caller).await?;

    Ok(StdResponse::ok(orders, "Get my orders successfully"))
}

/// Place an order from the caller's cart. Stock is decremented and the cart emptied
/// in the same commit.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    request_body = CheckoutDetails,
    responses(
        (status = 201, description = "Order created", body = StdResponse<OrderWithItems, String>),
        (status = 400, description = "Missing delivery details or empty cart"),
        (status = 409, description = "A cart line is unavailable or out of stock")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    payload: Result<Json<CheckoutDetails>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(details) = payload?;
    let order = state.orders.create_order(&caller, details).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse::ok(order, "Order created successfully"),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<OrderWithItems, String>),
        (status = 403, description = "Order belongs to someone else"),
        (status = 404, description = "Order not found")
    )
)]
async fn get_order(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.orders.get_order(&caller, id).await?;

    Ok(StdResponse::ok(order, "Get order successfully"))
}

/// Change an order's status. Admin only.
#[utoipa::path(
    put,
    path = "/{id}/status",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID to update")
    ),
    request_body = StatusChange,
    responses(
        (status = 200, description = "Order status updated", body = StdResponse<Order, String>),
        (status = 400, description = "Unknown status or transition not allowed"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Order not found")
    )
)]
async fn update_order_status(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(change) = payload?;
    let order = state.orders.update_order_status(&caller, id, change).await?;

    Ok(StdResponse::ok(order, "Order status updated"))
}
