//! External collaborators: recommendation, directory search and ranking
//!
//! The orchestrator only sees these traits. Responses are validated into
//! domain types at the boundary (`wire`), so nothing downstream deals with
//! loosely-typed payloads.

mod http;
pub mod wire;

pub use http::{HttpDirectoryClient, HttpRankingClient, HttpRecommendationClient, HttpServiceClient};

use crate::provider::{ClinicalHistory, ClinicalProfile, Evidence, Provider, ProviderLinks};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid response from {service}: {message}")]
    InvalidResponse { service: String, message: String },

    #[error("{service} returned HTTP {status}: {body}")]
    Http {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service} is not configured")]
    NotConfigured { service: String },
}

/// Input to the recommendation lookup
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationRequest {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<ClinicalHistory>,
}

/// Input to the directory search
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryRequest {
    pub state: String,
    pub city: String,
    /// Specialty to search for: explicit taxonomy, else the inferred one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_miles: Option<u32>,
    /// Maximum number of providers to return
    pub limit: usize,
}

/// Directory search result
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryResponse {
    /// Total matches reported by the directory (may exceed `providers`)
    pub total: usize,
    pub providers: Vec<Provider>,
}

/// Input to the ranking lookup
#[derive(Debug, Clone, Serialize)]
pub struct RankingRequest<'a> {
    pub description: &'a str,
    pub providers: &'a [Provider],
    pub evidence: &'a [Evidence],
}

/// Ranking result: registry numbers best first, plus name-keyed links
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingResponse {
    pub order: Vec<String>,
    pub links: ProviderLinks,
}

#[async_trait]
pub trait RecommendationService: Send + Sync {
    async fn recommend(&self, request: &RecommendationRequest) -> Result<ClinicalProfile>;
}

#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn search(&self, request: &DirectoryRequest) -> Result<DirectoryResponse>;
}

#[async_trait]
pub trait RankingService: Send + Sync {
    async fn rank(&self, request: &RankingRequest<'_>) -> Result<RankingResponse>;
}

/// The three collaborators an orchestrator runs against
#[derive(Clone)]
pub struct ServiceSet {
    pub recommendation: Arc<dyn RecommendationService>,
    pub directory: Arc<dyn DirectoryService>,
    pub ranking: Arc<dyn RankingService>,
}

impl ServiceSet {
    pub fn new(
        recommendation: Arc<dyn RecommendationService>,
        directory: Arc<dyn DirectoryService>,
        ranking: Arc<dyn RankingService>,
    ) -> Self {
        Self {
            recommendation,
            directory,
            ranking,
        }
    }
}
