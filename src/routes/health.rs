use axum::response::IntoResponse;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{app_error::StdResponse, app_state::AppState};

pub const SERVICE_NAME: &str = "OrderService";

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(utoipa_axum::routes!(health))
}

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub status: &'static str,
    pub service: &'static str,
}

/// Liveness check. Does not touch the store.
#[utoipa::path(
    get,
    path = "/health",
    tags = ["Health"],
    responses(
        (status = 200, description = "Service is up", body = StdResponse<HealthRes, String>)
    )
)]
async fn health() -> impl IntoResponse {
    StdResponse::ok(
        HealthRes {
            status: "ok",
            service: SERVICE_NAME,
        },
        "Service is healthy",
    )
}
