use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;
use uuid::Uuid;

use super::StorefrontClient;
use crate::{
    app_error::StdResponse,
    commerce::{
        error::CommerceError,
        types::{
            AddCartItem, CartLine, CartView, CheckoutDetails, Order, OrderWithItems,
            StatusChange, UpdateCartItem,
        },
    },
};

/// Calls the routed HTTP API.
#[derive(Clone, Debug)]
pub struct RoutedClient {
    http_client: Client,
    base_url: String,
    token: Option<String>,
}

impl RoutedClient {
    pub fn new(http_client: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self
            .http_client
            .request(method, format!("{}{}", self.base_url, path));

        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Sends the request and unwraps the response envelope. A failed request comes
    /// back as the `CommerceError` the service raised.
    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<Option<T>, CommerceError> {
        let res = req.send().await.map_err(|err| {
            warn!("Storefront API request failed: {}", err);
            CommerceError::Unexpected("Storefront API is unreachable".into())
        })?;
        let status = res.status();

        let body: StdResponse<T, String> = res.json().await.map_err(|err| {
            warn!("Failed to parse storefront API response ({}): {}", status, err);
            CommerceError::Unexpected(format!("Unexpected storefront API response ({})", status))
        })?;

        match body.error {
            Some(wire) => Err(wire.into()),
            None if !status.is_success() => Err(CommerceError::Unexpected(
                body.message
                    .unwrap_or_else(|| format!("Storefront API answered {}", status)),
            )),
            None => Ok(body.data),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, CommerceError> {
        self.send(req).await?.ok_or_else(|| {
            CommerceError::Unexpected("Storefront API response carried no data".into())
        })
    }

    async fn execute(&self, req: RequestBuilder) -> Result<(), CommerceError> {
        self.send::<serde_json::Value>(req).await.map(|_| ())
    }

    fn with_body<B: Serialize>(&self, method: Method, path: &str, body: &B) -> RequestBuilder {
        self.request(method, path).json(body)
    }
}

#[async_trait]
impl StorefrontClient for RoutedClient {
    async fn get_cart(&self) -> Result<CartView, CommerceError> {
        self.fetch(self.request(Method::GET, "/cart")).await
    }

    async fn add_cart_item(&self, input: AddCartItem) -> Result<CartLine, CommerceError> {
        self.fetch(self.with_body(Method::POST, "/cart/items", &input)).await
    }

    async fn update_cart_item(
        &self,
        item_id: Uuid,
        input: UpdateCartItem,
    ) -> Result<CartLine, CommerceError> {
        let path = format!("/cart/items/{}", item_id);
        self.fetch(self.with_body(Method::PUT, &path, &input)).await
    }

    async fn remove_cart_item(&self, item_id: Uuid) -> Result<(), CommerceError> {
        let path = format!("/cart/items/{}", item_id);
        self.execute(self.request(Method::DELETE, &path)).await
    }

    async fn clear_cart(&self) -> Result<(), CommerceError> {
        self.execute(self.request(Method::DELETE, "/cart")).await
    }

    async fn create_order(
        &self,
        details: CheckoutDetails,
    ) -> Result<OrderWithItems, CommerceError> {
        self.fetch(self.with_body(Method::POST, "/orders", &details)).await
    }

    async fn list_my_orders(&self) -> Result<Vec<Order>, CommerceError> {
        self.fetch(self.request(Method::GET, "/orders")).await
    }

    async fn get_order(&self, order_id: Uuid) -> Result<OrderWithItems, CommerceError> {
        let path = format!("/orders/{}", order_id);
        self.fetch(self.request(Method::GET, &path)).await
    }

    async fn update_order_status(
        &self,
        order_id: Uuid,
        change: StatusChange,
    ) -> Result<Order, CommerceError> {
        let path = format!("/orders/{}/status", order_id);
        self.fetch(self.with_body(Method::PUT, &path, &change)).await
    }
}
