use super::{
    wire, DirectoryRequest, DirectoryResponse, DirectoryService, RankingRequest, RankingResponse,
    RankingService, RecommendationRequest, RecommendationService, ServiceError, ServiceSet,
};
use crate::config::{parse_duration, ServicesConfig};
use crate::provider::ClinicalProfile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// JSON-over-HTTP client shared by the three collaborators
#[derive(Clone)]
pub struct HttpServiceClient {
    name: &'static str,
    url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpServiceClient {
    pub fn new(
        name: &'static str,
        url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            name,
            url: url.into(),
            api_key,
            client,
        })
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// POST `body` as JSON and return the decoded JSON response
    pub async fn post_json<B: Serialize + ?Sized>(&self, body: &B) -> Result<serde_json::Value> {
        if !self.is_configured() {
            return Err(ServiceError::NotConfigured {
                service: self.name.to_string(),
            }
            .into());
        }

        tracing::debug!("POST {} ({})", self.url, self.name);

        let mut request = self.client.post(&self.url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", self.name))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Http {
                service: self.name.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", self.name))
    }
}

pub struct HttpRecommendationClient(HttpServiceClient);

impl HttpRecommendationClient {
    pub fn new(client: HttpServiceClient) -> Self {
        Self(client)
    }
}

#[async_trait]
impl RecommendationService for HttpRecommendationClient {
    async fn recommend(&self, request: &RecommendationRequest) -> Result<ClinicalProfile> {
        let value = self.0.post_json(request).await?;
        Ok(wire::parse_recommendation(value)?)
    }
}

pub struct HttpDirectoryClient(HttpServiceClient);

impl HttpDirectoryClient {
    pub fn new(client: HttpServiceClient) -> Self {
        Self(client)
    }
}

#[async_trait]
impl DirectoryService for HttpDirectoryClient {
    async fn search(&self, request: &DirectoryRequest) -> Result<DirectoryResponse> {
        let value = self.0.post_json(request).await?;
        Ok(wire::parse_directory(value)?)
    }
}

pub struct HttpRankingClient(HttpServiceClient);

impl HttpRankingClient {
    pub fn new(client: HttpServiceClient) -> Self {
        Self(client)
    }
}

#[async_trait]
impl RankingService for HttpRankingClient {
    async fn rank(&self, request: &RankingRequest<'_>) -> Result<RankingResponse> {
        let value = self.0.post_json(request).await?;
        Ok(wire::parse_ranking(value)?)
    }
}

impl ServiceSet {
    /// HTTP clients for every configured endpoint
    ///
    /// An endpoint left empty still yields a client; calling it fails with
    /// [`ServiceError::NotConfigured`], which the orchestrator handles like
    /// any other failure of that step.
    pub fn from_config(config: &ServicesConfig) -> Result<Self> {
        let timeout = parse_duration(&config.timeout)
            .with_context(|| format!("Invalid services.timeout: {}", config.timeout))?;

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.is_empty());
        if api_key.is_none() {
            tracing::debug!("{} not set, calling services without a key", config.api_key_env);
        }

        let client = |name: &'static str, url: &str| {
            HttpServiceClient::new(name, url, api_key.clone(), timeout)
        };

        Ok(Self::new(
            Arc::new(HttpRecommendationClient::new(client(
                "recommendation",
                &config.recommendation_url,
            )?)),
            Arc::new(HttpDirectoryClient::new(client(
                "directory",
                &config.directory_url,
            )?)),
            Arc::new(HttpRankingClient::new(client(
                "ranking",
                &config.ranking_url,
            )?)),
        ))
    }
}
