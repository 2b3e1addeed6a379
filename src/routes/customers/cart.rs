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
    commerce::types::{AddCartItem, CartLine, CartView, UpdateCartItem},
    gateway::Identity,
    middleware,
};

/// Cart routes of the authenticated caller.
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/cart",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_cart, clear_cart))
            .routes(utoipa_axum::routes!(add_cart_item))
            .routes(utoipa_axum::routes!(update_cart_item, remove_cart_item))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::authorization,
            )),
    )
}

/// Fetch the caller's cart, creating an empty one on first access.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Get cart successfully", body = StdResponse<CartView, String>),
        (status = 401, description = "Missing or invalid token")
    )
)]
async fn get_cart(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    let cart = state.carts.get_cart(&caller).await?;

    Ok(StdResponse::ok(cart, "Get cart successfully"))
}

/// Remove every item from the caller's cart.
#[utoipa::path(
    delete,
    path = "/",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Cart cleared")
    )
)]
async fn clear_cart(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    state.carts.clear_cart(&caller).await?;

    Ok(StdResponse::ok((), "Cart cleared"))
}

/// Add a product to the cart. Adding a product already in the cart increases its
/// quantity.
#[utoipa::path(
    post,
    path = "/items",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    request_body = AddCartItem,
    responses(
        (status = 201, description = "Item added to cart", body = StdResponse<CartLine, String>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product unavailable or insufficient stock")
    )
)]
async fn add_cart_item(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    payload: Result<Json<AddCartItem>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = payload?;
    let line = state.carts.add_item(&caller, input).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse::ok(line, "Item added to cart"),
    ))
}

#[utoipa::path(
    put,
    path = "/items/{id}",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Cart item ID")
    ),
    request_body = UpdateCartItem,
    responses(
        (status = 200, description = "Cart item updated", body = StdResponse<CartLine, String>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Cart item not found"),
        (status = 409, description = "Product unavailable or insufficient stock")
    )
)]
async fn update_cart_item(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    payload: Result<Json<UpdateCartItem>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = payload?;
    let line = state.carts.update_quantity(&caller, id, input).await?;

    Ok(StdResponse::ok(line, "Cart item updated"))
}

#[utoipa::path(
    delete,
    path = "/items/{id}",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Cart item ID")
    ),
    responses(
        (status = 200, description = "Cart item removed"),
        (status = 404, description = "Cart item not found")
    )
)]
async fn remove_cart_item(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    state.carts.remove_item(&caller, id).await?;

    Ok(StdResponse::ok((), "Cart item removed"))
}
