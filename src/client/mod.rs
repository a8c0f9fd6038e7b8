// This file is part of the terraform-provider-scalr project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scalr HTTP client for API interactions

use std::ops::ControlFlow;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tf_provider::Diagnostics;
use tracing::debug;

use crate::config::ClientConfig;

mod error;
pub mod models;

pub mod agent_pool_tokens;
pub mod team_access;
pub mod team_tokens;
pub mod teams;
pub mod variables;
pub mod workspaces;

pub use error::{Result, ScalrError};

use error::api_error_message;
use models::ListDocument;

/// Path of the API below the hostname
pub const BASE_PATH: &str = "/api/iacp/v3";
/// Page size requested by list operations
pub const DEFAULT_PAGE_SIZE: u32 = 100;

const JSON_API: &str = "application/vnd.api+json";

/// Scalr API client
#[derive(Clone)]
pub struct ScalrClient {
    http: Client,
    token: String,
    base_url: String,
}

impl std::fmt::Debug for ScalrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalrClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl ScalrClient {
    /// Create a new client with pooled connections
    pub fn new(config: &ClientConfig) -> Result<Self> {
        if config.token.is_empty() {
            return Err(ScalrError::Config("the API token is empty".to_string()));
        }

        let http = Client::builder()
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .danger_accept_invalid_certs(config.ssl_skip_verify)
            .build()?;

        Ok(Self {
            http,
            token: config.token.clone(),
            base_url: format!("https://{}{}", config.hostname, BASE_PATH),
        })
    }

    /// Create a client talking to a mock server
    #[cfg(test)]
    pub fn test_client(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            token: "test-token".to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[cfg(test)]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{method} {url}");
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, JSON_API)
            .header(reqwest::header::CONTENT_TYPE, JSON_API)
    }

    /// Turn a non-success response into a `ScalrError`
    async fn check(response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ScalrError::NotFound);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ScalrError::Api {
            status: status.as_u16(),
            message: api_error_message(context, &body),
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
        let response = Self::check(response, context).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// GET a document
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, context: &str) -> Result<T> {
        let response = self.request(Method::GET, path).send().await?;
        Self::decode(response, context).await
    }

    /// Send a JSON:API body and decode the returned document
    pub(crate) async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        context: &str,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(method, path)
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;
        Self::decode(response, context).await
    }

    /// Send a JSON:API body and ignore the response content
    pub(crate) async fn send_empty<B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        context: &str,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .request(method, path)
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;
        Self::check(response, context).await?;
        Ok(())
    }

    /// POST without a body and decode the returned document
    pub(crate) async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        context: &str,
    ) -> Result<T> {
        let response = self.request(Method::POST, path).send().await?;
        Self::decode(response, context).await
    }

    pub(crate) async fn delete(&self, path: &str, context: &str) -> Result<()> {
        let response = self.request(Method::DELETE, path).send().await?;
        Self::check(response, context).await?;
        Ok(())
    }

    /// Walk a paginated list page by page
    ///
    /// `query` is an already encoded query string (without page parameters).
    /// `visit` is called for every item and may stop the walk early.
    pub(crate) async fn walk_pages<T, F>(
        &self,
        path: &str,
        query: &str,
        context: &str,
        mut visit: F,
    ) -> Result<()>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> ControlFlow<()>,
    {
        let mut page = 1;
        loop {
            let mut url = format!("{path}?page[number]={page}&page[size]={DEFAULT_PAGE_SIZE}");
            if !query.is_empty() {
                url.push('&');
                url.push_str(query);
            }

            let list: ListDocument<T> = self.get(&url, context).await?;
            debug!("{context}: page {page} returned {} items", list.data.len());

            for item in list.data {
                if visit(item).is_break() {
                    return Ok(());
                }
            }

            let Some(pagination) = list.meta.and_then(|meta| meta.pagination) else {
                return Ok(());
            };
            if pagination.current_page >= pagination.total_pages {
                return Ok(());
            }
            match pagination.next_page {
                Some(next) if next > page => page = next,
                _ => return Ok(()),
            }
        }
    }

    /// First item of a paginated list matching `pred`
    pub(crate) async fn find_in_pages<T, P>(
        &self,
        path: &str,
        query: &str,
        context: &str,
        mut pred: P,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        P: FnMut(&T) -> bool,
    {
        let mut found = None;
        self.walk_pages(path, query, context, |item: T| {
            if pred(&item) {
                found = Some(item);
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await?;
        Ok(found)
    }

    /// Every item of a paginated list matching `pred`
    pub(crate) async fn collect_pages<T, P>(
        &self,
        path: &str,
        query: &str,
        context: &str,
        mut pred: P,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        P: FnMut(&T) -> bool,
    {
        let mut items = Vec::new();
        self.walk_pages(path, query, context, |item: T| {
            if pred(&item) {
                items.push(item);
            }
            ControlFlow::Continue(())
        })
        .await?;
        Ok(items)
    }
}

/// Percent-encode a single path segment
pub(crate) fn segment(value: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(value)
}

/// Client slot shared by the provider and every resource
///
/// Resources are built before the provider is configured, so they hold the
/// slot and look the client up on every call.
#[derive(Debug, Clone, Default)]
pub struct SharedClient(Arc<OnceLock<ScalrClient>>);

impl SharedClient {
    /// Publish the configured client. Returns false if one was already set.
    pub fn set(&self, client: ScalrClient) -> bool {
        self.0.set(client).is_ok()
    }

    pub fn get(&self, diags: &mut Diagnostics) -> Option<&ScalrClient> {
        let client = self.0.get();
        if client.is_none() {
            diags.root_error(
                "Provider is not configured",
                "The Scalr client is only available once the provider has been configured.",
            );
        }
        client
    }

    #[cfg(test)]
    pub fn configured(client: ScalrClient) -> Self {
        let shared = Self::default();
        shared.set(client);
        shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Item {
        id: String,
    }

    fn page(ids: &[&str], current: u32, next: Option<u32>, total: u32) -> serde_json::Value {
        json!({
            "data": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>(),
            "meta": {
                "pagination": {
                    "current-page": current,
                    "next-page": next,
                    "total-pages": total,
                    "total-count": 3
                }
            }
        })
    }

    async fn mount_two_pages(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("page[number]", "1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page(&["a", "b"], 1, Some(2), 2)),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("page[number]", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["c"], 2, None, 2)))
            .mount(server)
            .await;
    }

    #[test]
    fn test_base_url() {
        let client = ScalrClient::new(&ClientConfig {
            hostname: "example.scalr.io".to_string(),
            token: "secret".to_string(),
            ssl_skip_verify: false,
        })
        .unwrap();
        assert_eq!(client.base_url(), "https://example.scalr.io/api/iacp/v3");

        let err = ScalrClient::new(&ClientConfig {
            hostname: "example.scalr.io".to_string(),
            token: String::new(),
            ssl_skip_verify: false,
        })
        .unwrap_err();
        assert!(matches!(err, ScalrError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = ScalrClient::test_client("http://localhost");
        let debug = format!("{client:?}");
        assert!(!debug.contains("test-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("my ws/1"), "my%20ws%2F1");
    }

    #[test]
    fn test_unconfigured_slot() {
        let shared = SharedClient::default();
        let mut diags = Diagnostics::default();
        assert!(shared.get(&mut diags).is_none());
        assert_eq!(diags.errors.len(), 1);

        assert!(shared.set(ScalrClient::test_client("http://localhost")));
        assert!(!shared.set(ScalrClient::test_client("http://localhost")));
        let mut diags = Diagnostics::default();
        assert!(shared.clone().get(&mut diags).is_some());
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn test_headers_and_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/teams/team-1"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("content-type", JSON_API))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = ScalrClient::test_client(&server.uri());
        let err = client
            .get::<serde_json::Value>("teams/team-1", "reading team")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_api_error_carries_details() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vars"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "errors": [{"status": "422", "detail": "Key has already been taken"}]
            })))
            .mount(&server)
            .await;

        let client = ScalrClient::test_client(&server.uri());
        let err = client
            .send::<_, serde_json::Value>(Method::POST, "vars", &json!({}), "creating variable")
            .await
            .unwrap_err();
        match err {
            ScalrError::Api { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "creating variable: Key has already been taken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_collect_pages_walks_all_pages() {
        let server = MockServer::start().await;
        mount_two_pages(&server).await;

        let client = ScalrClient::test_client(&server.uri());
        let items: Vec<Item> = client
            .collect_pages("items", "", "listing items", |_| true)
            .await
            .unwrap();
        let ids: Vec<_> = items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_find_in_pages_stops_early() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("page[number]", "1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page(&["a", "b"], 1, Some(2), 2)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("page[number]", "2"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let client = ScalrClient::test_client(&server.uri());
        let found: Option<Item> = client
            .find_in_pages("items", "", "listing items", |item: &Item| item.id == "b")
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, "b");
    }

    #[tokio::test]
    async fn test_find_in_pages_without_match() {
        let server = MockServer::start().await;
        mount_two_pages(&server).await;

        let client = ScalrClient::test_client(&server.uri());
        let found: Option<Item> = client
            .find_in_pages("items", "", "listing items", |item: &Item| item.id == "z")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_walk_without_meta_is_single_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("filter[name]", "devs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "x"}]})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ScalrClient::test_client(&server.uri());
        let items: Vec<Item> = client
            .collect_pages("items", "filter[name]=devs", "listing items", |_| true)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }
}
