use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::{app_error::AppError, app_state::AppState, gateway};

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// Resolves the bearer credential through the access gateway and exposes the
/// caller as an `Extension<Identity>`.
pub async fn authorization(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credential = bearer_token(req.headers());
    let identity = gateway::authenticate(state.gateway.as_ref(), credential.as_deref()).await?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
