use axum::{Extension, extract::State, response::IntoResponse};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    commerce::types::OrderStats,
    gateway::Identity,
    middleware,
};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/admin/stats",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_stats))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::authorization,
            )),
    )
}

/// Order counters, revenue and low-stock products. Admin only.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Order statistics", body = StdResponse<OrderStats, String>),
        (status = 403, description = "Caller is not an admin")
    )
)]
async fn get_stats(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    let stats = state.orders.order_stats(&caller).await?;

    Ok(StdResponse::ok(stats, "Get stats successfully"))
}
