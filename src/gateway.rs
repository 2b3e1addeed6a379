//! Access Gateway seam: turns a bearer credential into a user identity and role.
//!
//! Token issuance lives outside this service; the gateway only resolves.

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{commerce::error::CommerceError, config::GatewayConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Vendor,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Vendor => "vendor",
            Self::Admin => "admin",
        }
    }

    /// Changing order status and reading stock reports.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Reading orders placed by other users.
    pub fn can_view_all_orders(self) -> bool {
        matches!(self, Self::Admin | Self::Vendor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "vendor" => Ok(Self::Vendor),
            "admin" => Ok(Self::Admin),
            other => Err(anyhow::anyhow!("Unknown role '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

#[async_trait]
pub trait AccessGateway: Send + Sync {
    async fn resolve(&self, credential: &str) -> Result<Identity, CommerceError>;
}

/// Resolves an optional credential, rejecting a missing or blank one the same way
/// on every call path.
pub async fn authenticate(
    gateway: &dyn AccessGateway,
    credential: Option<&str>,
) -> Result<Identity, CommerceError> {
    match credential.map(str::trim).filter(|c| !c.is_empty()) {
        Some(credential) => gateway.resolve(credential).await,
        None => Err(CommerceError::Unauthenticated(
            "No authorization token provided".into(),
        )),
    }
}

fn invalid_token() -> CommerceError {
    CommerceError::Unauthenticated("Invalid or expired token".into())
}

/// Fixed token table, for development and tests.
#[derive(Clone, Debug, Default)]
pub struct StaticAccessGateway {
    tokens: HashMap<String, Identity>,
}

impl StaticAccessGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }

    /// Parses `token=user_uuid:role` entries separated by commas.
    pub fn parse(entries: &str) -> Result<Self> {
        let mut gateway = Self::new();

        for entry in entries.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (token, identity) = entry
                .split_once('=')
                .with_context(|| format!("Access token entry '{}' is missing '='", entry))?;
            let (user_id, role) = identity
                .split_once(':')
                .with_context(|| format!("Access token entry '{}' is missing ':role'", entry))?;

            let identity = Identity {
                user_id: user_id
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid user id in '{}'", entry))?,
                role: role.parse()?,
            };
            gateway = gateway.with_token(token.trim(), identity);
        }

        Ok(gateway)
    }
}

#[async_trait]
impl AccessGateway for StaticAccessGateway {
    async fn resolve(&self, credential: &str) -> Result<Identity, CommerceError> {
        self.tokens.get(credential).cloned().ok_or_else(|| {
            warn!("Rejected unknown access token");
            invalid_token()
        })
    }
}

#[derive(Deserialize)]
struct GatewayUser {
    id: Uuid,
    #[serde(default)]
    role: Option<Role>,
}

/// Delegates resolution to an external auth service: `GET {url}` with the bearer
/// credential must answer `{"id": "...", "role": "..."}`.
#[derive(Clone, Debug)]
pub struct HttpAccessGateway {
    http_client: Client,
    url: String,
}

impl HttpAccessGateway {
    pub fn new(http_client: Client, url: impl Into<String>) -> Self {
        Self {
            http_client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl AccessGateway for HttpAccessGateway {
    async fn resolve(&self, credential: &str) -> Result<Identity, CommerceError> {
        let res = self
            .http_client
            .get(&self.url)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|err| {
                warn!("Access gateway request failed: {}", err);
                CommerceError::Unexpected("Access gateway is unreachable".into())
            })?;

        match res.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                warn!("Access gateway rejected credential");
                return Err(invalid_token());
            }
            status if !status.is_success() => {
                return Err(CommerceError::Unexpected(format!(
                    "Access gateway answered {}",
                    status
                )));
            }
            _ => {}
        }

        let user: GatewayUser = res
            .json()
            .await
            .map_err(|err| {
                warn!("Failed to parse access gateway reply: {}", err);
                CommerceError::Unexpected("Failed to parse access gateway reply".into())
            })?;

        Ok(Identity {
            user_id: user.id,
            role: user.role.unwrap_or(Role::Student),
        })
    }
}

/// Builds the gateway selected by configuration.
pub fn from_config(config: &GatewayConfig, http_client: Client) -> Result<Arc<dyn AccessGateway>> {
    let gateway: Arc<dyn AccessGateway> = match config {
        GatewayConfig::Remote { url } => Arc::new(HttpAccessGateway::new(http_client, url.clone())),
        GatewayConfig::Static { tokens } => {
            let gateway = StaticAccessGateway::parse(tokens)
                .context("Failed to parse ACCESS_TOKENS")?;
            if gateway.tokens.is_empty() {
                warn!("No access tokens configured, every request will be rejected");
            }
            Arc::new(gateway)
        }
    };

    Ok(gateway)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_static_token_table() {
        let admin = Uuid::new_v4();
        let student = Uuid::new_v4();
        let entries = format!("root-token={}:admin, kid-token = {}:student", admin, student);

        let gateway = StaticAccessGateway::parse(&entries).unwrap();
        assert_eq!(
            gateway.tokens.get("root-token"),
            Some(&Identity { user_id: admin, role: Role::Admin })
        );
        assert_eq!(gateway.tokens.get("kid-token").map(|i| i.role), Some(Role::Student));
    }

    #[test]
    fn rejects_malformed_token_entries() {
        assert!(StaticAccessGateway::parse("broken").is_err());
        assert!(StaticAccessGateway::parse("t=not-a-uuid:admin").is_err());
        assert!(StaticAccessGateway::parse(&format!("t={}:janitor", Uuid::new_v4())).is_err());
    }

    #[tokio::test]
    async fn blank_credentials_never_reach_the_gateway() {
        let gateway = StaticAccessGateway::new().with_token(
            "",
            Identity { user_id: Uuid::new_v4(), role: Role::Admin },
        );

        let err = authenticate(&gateway, Some("   ")).await.unwrap_err();
        assert_eq!(err, CommerceError::Unauthenticated("No authorization token provided".into()));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_retryable_failure() {
        let gateway = HttpAccessGateway::new(Client::new(), "http://127.0.0.1:1/me");

        let err = gateway.resolve("some-token").await.unwrap_err();
        assert_eq!(err, CommerceError::Unexpected("Access gateway is unreachable".into()));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn garbled_gateway_reply_is_unexpected() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/me", listener.local_addr().unwrap());
        let app = axum::Router::new().route("/me", axum::routing::get(|| async { "not json" }));
        tokio::spawn(async move { axum::serve(listener, app).await });

        let gateway = HttpAccessGateway::new(Client::new(), url);
        let err = gateway.resolve("some-token").await.unwrap_err();
        assert_eq!(
            err,
            CommerceError::Unexpected("Failed to parse access gateway reply".into())
        );
    }
}
