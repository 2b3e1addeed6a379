use axum::{
    Extension,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    commerce::types::Order,
    gateway::Identity,
    middleware,
};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/admin/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_all_orders))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::authorization,
            )),
    )
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    /// Only orders currently in this status.
    pub status: Option<String>,
    /// Maximum number of orders returned, 100 by default.
    pub limit: Option<i64>,
}

/// Fetch every order in the system, newest first. Admins and vendors only.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(OrderFilter),
    responses(
        (status = 200, description = "List all orders", body = StdResponse<Vec<Order>, String>),
        (status = 400, description = "Unknown status filter or non-positive limit"),
        (status = 403, description = "Caller is neither admin nor vendor")
    )
)]
async fn get_all_orders(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, AppError> {
    let status = filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let orders = state
        .orders
        .list_all_orders(&caller, status, filter.limit)
        .await?;

    Ok(StdResponse::ok(orders, "Get orders successfully"))
}
