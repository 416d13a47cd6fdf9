//! store::rest
//!
//! REST implementation of the content store using the admin API.
//!
//! # Design
//!
//! This module implements the `ContentStore` trait over the storefront's
//! admin REST API:
//!
//! - `GET    /collections/{collection}/items`
//! - `PUT    /collections/{collection}/items/{item}/position`
//! - `PUT    /collections/{collection}/order`
//! - `PUT    /collections/{collection}/items/{item}/active`
//! - `POST   /categories`
//! - `PATCH  /categories/{node}`
//! - `DELETE /categories/{node}`
//! - `GET    /categories/tree`
//!
//! # Authentication
//!
//! A static bearer token (from config or `SHELFWORK_TOKEN`). Requests
//! without a token are sent unauthenticated; the API answers 401 and the
//! error surfaces as `StoreError::AuthRequired`.
//!
//! # Rate Limiting
//!
//! The API rate-limits aggressively during catalog imports. This
//! implementation returns `StoreError::RateLimited` on 429 and does not
//! retry; backoff is the caller's responsibility.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::traits::{ContentStore, NodeDraft, NodePatch, StoreError};
use crate::core::campaign::CampaignWindow;
use crate::core::sequence::OrderedItem;
use crate::core::tree::CategoryNode;
use crate::core::types::{CollectionId, ItemId, NodeId, Slug};

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "shelfwork-cli";

/// REST content store implementation.
pub struct RestStore {
    /// HTTP client for making requests
    client: Client,
    /// Static bearer token, if configured
    token: Option<String>,
    /// API base URL
    base_url: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("has_token", &self.token.is_some())
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RestStore {
    /// Create a new REST store.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API base URL, without trailing slash
    /// * `token` - Optional static bearer token
    /// * `timeout` - Per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        Ok(Self {
            client,
            token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Get the API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build standard request headers.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(token) = &self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Deserialize a successful response or map the error status.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, StoreError> {
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| StoreError::NetworkError(format!("invalid response body: {e}")))
        } else {
            Err(self.handle_error_response(response, status).await)
        }
    }

    /// Check a response where the caller only cares about success.
    async fn handle_empty_response(&self, response: Response) -> Result<(), StoreError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.handle_error_response(response, status).await)
        }
    }

    /// Map an error response to a `StoreError`.
    async fn handle_error_response(&self, response: Response, status: StatusCode) -> StoreError {
        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => {
                if self.token.is_none() {
                    StoreError::AuthRequired
                } else {
                    StoreError::AuthFailed("invalid or expired token".into())
                }
            }
            StatusCode::FORBIDDEN => StoreError::AuthFailed(message),
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            StatusCode::CONFLICT => StoreError::NotEmpty(message),
            StatusCode::UNPROCESSABLE_ENTITY => StoreError::ApiError {
                status: status.as_u16(),
                message,
            },
            StatusCode::TOO_MANY_REQUESTS => StoreError::RateLimited,
            _ => StoreError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Error body shape returned by the admin API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Body for `PUT .../position`.
#[derive(Debug, Serialize)]
struct PositionBody {
    position: u32,
}

/// Body for `PUT .../order`.
#[derive(Debug, Serialize)]
struct OrderBody<'a> {
    ordered: &'a [ItemId],
}

/// Body for `PUT .../active`.
#[derive(Debug, Serialize)]
struct ActiveBody {
    active: bool,
}

/// Body for `POST /categories`.
#[derive(Debug, Serialize)]
struct CreateNodeBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a NodeId>,
    name: &'a str,
    slug: &'a Slug,
    active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    campaign: Option<&'a CampaignWindow>,
}

/// Body for `PATCH /categories/{node}`.
///
/// Outer `None` fields are omitted entirely; `Some(None)` serializes as
/// an explicit `null` so the API can distinguish "clear" from "leave".
#[derive(Debug, Serialize)]
struct PatchNodeBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<Option<NodeId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    slug: Option<Slug>,
    #[serde(skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    campaign: Option<Option<CampaignWindow>>,
}

impl From<NodePatch> for PatchNodeBody {
    fn from(patch: NodePatch) -> Self {
        Self {
            parent_id: patch.parent_id,
            name: patch.name,
            slug: patch.slug,
            active: patch.active,
            campaign: patch.campaign,
        }
    }
}

#[async_trait]
impl ContentStore for RestStore {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn list(&self, collection: &CollectionId) -> Result<Vec<OrderedItem>, StoreError> {
        let response = self
            .client
            .get(self.url(&format!("/collections/{collection}/items")))
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        self.handle_response(response).await
    }

    async fn update_position(
        &self,
        collection: &CollectionId,
        item: &ItemId,
        position: u32,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.url(&format!("/collections/{collection}/items/{item}/position")))
            .headers(self.headers())
            .json(&PositionBody { position })
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        self.handle_empty_response(response).await
    }

    async fn update_positions_batch(
        &self,
        collection: &CollectionId,
        ordered: &[ItemId],
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.url(&format!("/collections/{collection}/order")))
            .headers(self.headers())
            .json(&OrderBody { ordered })
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        self.handle_empty_response(response).await
    }

    async fn update_active(
        &self,
        collection: &CollectionId,
        item: &ItemId,
        active: bool,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.url(&format!("/collections/{collection}/items/{item}/active")))
            .headers(self.headers())
            .json(&ActiveBody { active })
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        self.handle_empty_response(response).await
    }

    async fn create_node(
        &self,
        parent: Option<&NodeId>,
        draft: NodeDraft,
    ) -> Result<CategoryNode, StoreError> {
        let body = CreateNodeBody {
            parent_id: parent,
            name: &draft.name,
            slug: &draft.slug,
            active: draft.active,
            campaign: draft.campaign.as_ref(),
        };
        let response = self
            .client
            .post(self.url("/categories"))
            .headers(self.headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        self.handle_response(response).await
    }

    async fn update_node(&self, node: &NodeId, patch: NodePatch) -> Result<(), StoreError> {
        let response = self
            .client
            .patch(self.url(&format!("/categories/{node}")))
            .headers(self.headers())
            .json(&PatchNodeBody::from(patch))
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        self.handle_empty_response(response).await
    }

    async fn delete_node(&self, node: &NodeId) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.url(&format!("/categories/{node}")))
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        self.handle_empty_response(response).await
    }

    async fn fetch_tree(&self) -> Result<Vec<CategoryNode>, StoreError> {
        let response = self
            .client
            .get(self.url("/categories/tree"))
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(token: Option<&str>) -> RestStore {
        RestStore::new(
            "https://admin.example.test/api/v1/",
            token.map(String::from),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        assert_eq!(store(None).base_url(), "https://admin.example.test/api/v1");
    }

    #[test]
    fn headers_without_token() {
        let headers = store(None).headers();
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn headers_with_token() {
        let headers = store(Some("swk_secret")).headers();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer swk_secret");
    }

    #[test]
    fn debug_hides_token() {
        let debug = format!("{:?}", store(Some("swk_secret")));
        assert!(!debug.contains("swk_secret"));
        assert!(debug.contains("has_token: true"));
    }

    #[test]
    fn patch_body_distinguishes_clear_from_leave() {
        let body = PatchNodeBody::from(NodePatch::set_campaign(None));
        let json = serde_json::to_value(&body).unwrap();
        // campaign present as explicit null, everything else omitted
        assert_eq!(json, serde_json::json!({ "campaign": null }));

        let body = PatchNodeBody::from(NodePatch::default());
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn patch_body_reparent_to_root_is_null() {
        let body = PatchNodeBody::from(NodePatch::reparent(None));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "parent_id": null }));
    }
}
