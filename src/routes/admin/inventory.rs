use axum::{Extension, extract::State, response::IntoResponse};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    commerce::types::LowStockProduct,
    gateway::Identity,
    middleware,
};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/admin/low-stock",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_low_stock))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::authorization,
            )),
    )
}

/// Active products at or below the configured stock threshold, lowest stock first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Low stock report", body = StdResponse<Vec<LowStockProduct>, String>),
        (status = 403, description = "Caller is not an admin")
    )
)]
async fn get_low_stock(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    let products = state.orders.low_stock_report(&caller).await?;

    Ok(StdResponse::ok(products, "Get low stock products successfully"))
}
