pub mod admin;
pub mod customers;
pub mod health;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::openapi::{
    InfoBuilder, OpenApi,
    security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::app_state::AppState;

/// Every routed operation, with its OpenAPI description.
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(health::routes_with_openapi())
        .merge(customers::cart::routes_with_openapi(state))
        .merge(customers::orders::routes_with_openapi(state))
        .merge(admin::orders::routes_with_openapi(state))
        .merge(admin::inventory::routes_with_openapi(state))
        .merge(admin::stats::routes_with_openapi(state))
}

fn api_doc(mut openapi: OpenApi) -> OpenApi {
    openapi.info = InfoBuilder::new()
        .title("UniMarket OrderService API")
        .version(env!("CARGO_PKG_VERSION"))
        .build();

    openapi
        .components
        .get_or_insert_with(Default::default)
        .add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );

    openapi
}

/// The complete HTTP application: API routes, Swagger UI and request tracing.
pub fn app(state: AppState) -> Router {
    let (router, openapi) = routes_with_openapi(&state).split_for_parts();
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc(openapi));

    router
        .merge(swagger_ui)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
