//! Publishing boundary: media upload, previous-post cleanup, and the new
//! status post.
//!
//! [`Publisher`] is the capability the cycle consumes; a concrete instance
//! is constructed per pair from that pair's own credentials via
//! [`PublisherFactory`], so credentials never bleed across pairs.
//! [`MastodonPublisher`] speaks the Mastodon-compatible REST API with a
//! bearer token.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, Response, header, multipart};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::config::PublishConfig;

/// Errors from the publishing collaborator.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The HTTP request itself failed.
    #[error("publish request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The publisher API rejected the call.
    #[error("publisher API error: {0}")]
    Api(String),

    /// The environment variable named in the pair's publish config is
    /// not set.
    #[error("missing environment variable: {0}")]
    MissingCredential(String),

    /// Reading a chart artifact failed.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Opaque handle to an uploaded media attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef(pub String);

/// Opaque handle to a created post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef(pub String);

/// The publishing capability one pair's cycle holds.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Upload one chart image; the returned reference is attachable to a
    /// post.
    async fn upload_media(&self, image: &Path) -> Result<MediaRef, PublishError>;

    /// Delete the account's previous posts so the new one replaces them.
    /// Returns how many were removed.
    async fn delete_previous(&self) -> Result<usize, PublishError>;

    /// Create the new post with the combined summary text and media.
    async fn post(&self, text: &str, media: &[MediaRef]) -> Result<PostRef, PublishError>;
}

/// Builds a [`Publisher`] for one pair from its publish configuration.
pub trait PublisherFactory: Send + Sync {
    fn publisher_for(
        &self,
        pair: &str,
        cfg: &PublishConfig,
    ) -> Result<Box<dyn Publisher>, PublishError>;
}

/// Bearer-token publisher for Mastodon-compatible servers.
pub struct MastodonPublisher {
    client: Client,
    base_url: String,
}

impl MastodonPublisher {
    pub fn new(base_url: impl Into<String>, token: SecretString) -> Result<Self, PublishError> {
        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| PublishError::Api("access token is not a valid header value".into()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn checked(response: Response) -> Result<Response, PublishError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown API error".to_string());
        Err(PublishError::Api(format!("{status}: {body}")))
    }
}

#[derive(Deserialize)]
struct MediaResponse {
    id: String,
}

#[derive(Deserialize)]
struct Account {
    id: String,
}

#[derive(Deserialize)]
struct Status {
    id: String,
}

#[async_trait]
impl Publisher for MastodonPublisher {
    async fn upload_media(&self, image: &Path) -> Result<MediaRef, PublishError> {
        let bytes = tokio::fs::read(image).await?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chart.svg".to_string());
        let mime = if file_name.ends_with(".svg") {
            "image/svg+xml"
        } else {
            "image/png"
        };
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/api/v2/media", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let media = Self::checked(response).await?.json::<MediaResponse>().await?;
        Ok(MediaRef(media.id))
    }

    async fn delete_previous(&self) -> Result<usize, PublishError> {
        let response = self
            .client
            .get(format!("{}/api/v1/accounts/verify_credentials", self.base_url))
            .send()
            .await?;
        let account = Self::checked(response).await?.json::<Account>().await?;

        let response = self
            .client
            .get(format!(
                "{}/api/v1/accounts/{}/statuses",
                self.base_url, account.id
            ))
            .query(&[("limit", "40"), ("exclude_replies", "true")])
            .send()
            .await?;
        let statuses = Self::checked(response).await?.json::<Vec<Status>>().await?;

        let mut deleted = 0;
        for status in &statuses {
            let response = self
                .client
                .delete(format!("{}/api/v1/statuses/{}", self.base_url, status.id))
                .send()
                .await?;
            Self::checked(response).await?;
            deleted += 1;
        }
        Ok(deleted)
    }

    async fn post(&self, text: &str, media: &[MediaRef]) -> Result<PostRef, PublishError> {
        let media_ids: Vec<&str> = media.iter().map(|m| m.0.as_str()).collect();
        let response = self
            .client
            .post(format!("{}/api/v1/statuses", self.base_url))
            .json(&serde_json::json!({
                "status": text,
                "media_ids": media_ids,
            }))
            .send()
            .await?;
        let status = Self::checked(response).await?.json::<Status>().await?;
        Ok(PostRef(status.id))
    }
}

/// Default factory: resolves each pair's access token from the environment
/// variable named in its publish config.
pub struct MastodonFactory;

impl PublisherFactory for MastodonFactory {
    fn publisher_for(
        &self,
        _pair: &str,
        cfg: &PublishConfig,
    ) -> Result<Box<dyn Publisher>, PublishError> {
        let token = std::env::var(&cfg.token_env)
            .map_err(|_| PublishError::MissingCredential(cfg.token_env.clone()))?;
        let publisher = MastodonPublisher::new(&cfg.base_url, SecretString::from(token))?;
        Ok(Box::new(publisher))
    }
}
