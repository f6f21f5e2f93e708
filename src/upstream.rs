use crate::models::{Daily, Subscriber, SubscribeEmailResponse, VisitorCount};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("not found")]
    NotFound,
    #[error("upstream returned {0}")]
    Status(StatusCode),
}

/// Client for the content API that owns the daily passages, the visitor
/// counter and subscription mail.
#[derive(Debug, Clone)]
pub struct ContentClient {
    http: Client,
    base_url: String,
}

impl ContentClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub async fn today(&self) -> Result<Daily, UpstreamError> {
        self.get_json("/api/today").await
    }

    pub async fn post(&self, date: &str) -> Result<Daily, UpstreamError> {
        self.get_json(&format!("/api/post/{date}")).await
    }

    pub async fn visitors(&self) -> Result<u64, UpstreamError> {
        let visitors: VisitorCount = self.get_json("/api/visitors").await?;
        Ok(visitors.count)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "fetching");
        let response = self.http.get(&url).send().await?;
        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(UpstreamError::NotFound),
            status => Err(UpstreamError::Status(status)),
        }
    }
}

/// Side channel that tells the outside world a subscription went through.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn subscription_confirmed(&self, subscriber: &Subscriber) -> Result<(), UpstreamError>;
}

#[async_trait]
impl Notifier for ContentClient {
    async fn subscription_confirmed(&self, subscriber: &Subscriber) -> Result<(), UpstreamError> {
        let url = format!("{}/api/subscribe/email", self.base_url);
        let response = self.http.post(&url).json(subscriber).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let body: SubscribeEmailResponse = response.json().await?;
        match body.email {
            Some(email) => info!(
                to = %email.to,
                subject = %email.subject,
                body = email.body.as_deref().unwrap_or_default(),
                "subscription email dispatched"
            ),
            None => info!(to = %subscriber.email, "subscription email accepted"),
        }
        Ok(())
    }
}
