//! JSON-over-HTTP client for the Bookshelf backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{BookRemote, RemoteError, RemoteResult, WishlistRemote};
use crate::models::{CatalogRecord, WishlistRecord};
use crate::util::{compact_text, is_http_url, normalize_text_option};

#[derive(Clone)]
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(Self {
            base_url,
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request.header("Accept", "application/json").send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Api {
            status: status.as_u16(),
            message: parse_api_error(status, &body),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|error| RemoteError::InvalidPayload(format!("{error}: {}", compact_text(&body))))
    }
}

#[async_trait]
impl WishlistRemote for HttpRemote {
    async fn get_all(&self) -> RemoteResult<Vec<WishlistRecord>> {
        let url = self.url("wishlist");
        tracing::debug!("GET {}", url);
        self.send_json(self.client.get(url)).await
    }

    async fn upsert(&self, record: &WishlistRecord) -> RemoteResult<WishlistRecord> {
        let url = self.url("wishlist/upsert");
        tracing::debug!("POST {}", url);
        self.send_json(self.client.post(url).json(record)).await
    }

    async fn upsert_all(&self, records: &[WishlistRecord]) -> RemoteResult<Vec<WishlistRecord>> {
        let url = self.url("wishlist/upsertAll");
        tracing::debug!("POST {} ({} records)", url, records.len());
        self.send_json(self.client.post(url).json(records)).await
    }

    async fn delete(&self, id: i64) -> RemoteResult<()> {
        let url = self.url(&format!("wishlist/{id}"));
        tracing::debug!("DELETE {}", url);
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn delete_many(&self, ids: &[i64]) -> RemoteResult<()> {
        let url = self.url("wishlist/deleteMany");
        tracing::debug!("POST {} ({} ids)", url, ids.len());
        self.send(self.client.post(url).json(ids)).await?;
        Ok(())
    }

    async fn purchase(&self, id: i64) -> RemoteResult<CatalogRecord> {
        let url = self.url(&format!("wishlist/purchase/{id}"));
        tracing::debug!("POST {}", url);
        self.send_json(self.client.post(url)).await
    }
}

#[async_trait]
impl BookRemote for HttpRemote {
    async fn list_books(&self) -> RemoteResult<Vec<CatalogRecord>> {
        let url = self.url("llibres");
        tracing::debug!("GET {}", url);
        self.send_json(self.client.get(url)).await
    }

    async fn fetch_by_isbn(&self, isbn: &str) -> RemoteResult<Option<CatalogRecord>> {
        let url = self.url(&format!("llibres/fetch/{}", urlencoding::encode(isbn.trim())));
        tracing::debug!("GET {}", url);
        match self.send_json(self.client.get(url)).await {
            Ok(record) => Ok(Some(record)),
            Err(RemoteError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

pub(crate) fn normalize_base_url(raw: String) -> RemoteResult<String> {
    let base_url = normalize_text_option(Some(raw)).ok_or_else(|| {
        RemoteError::InvalidConfiguration("base URL must not be empty".to_string())
    })?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}
