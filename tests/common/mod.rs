//! Shared fixtures and scripted collaborators for integration tests
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use careseek::provider::{Address, ClinicalProfile, Contact, Evidence, Provider, ProviderLinks};
use careseek::services::{
    DirectoryRequest, DirectoryResponse, DirectoryService, RankingRequest, RankingResponse,
    RankingService, RecommendationRequest, RecommendationService, ServiceSet,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub fn provider(registry_number: &str, name: &str) -> Provider {
    Provider {
        id: format!("id-{}", registry_number),
        registry_number: registry_number.to_string(),
        name: name.to_string(),
        specialty: "Cardiology".to_string(),
        address: Address {
            line1: "100 Lake Ave".to_string(),
            line2: None,
            city: "Duluth".to_string(),
            state: "MN".to_string(),
            postal_code: "55802".to_string(),
        },
        contact: Contact::default(),
        rating: None,
        years_experience: None,
        board_certified: false,
        accepting_patients: true,
        languages: vec!["English".to_string()],
        insurance: Vec::new(),
        education: None,
    }
}

/// Providers numbered 1..=n
pub fn providers(n: usize) -> Vec<Provider> {
    (1..=n)
        .map(|i| provider(&i.to_string(), &format!("Dr. Provider {}", i)))
        .collect()
}

pub fn numbers(providers: &[Provider]) -> Vec<&str> {
    providers.iter().map(|p| p.registry_number.as_str()).collect()
}

pub fn profile() -> ClinicalProfile {
    ClinicalProfile {
        icd10_code: Some("I20.9".to_string()),
        differential: vec![careseek::provider::Differential {
            name: "Angina pectoris".to_string(),
            icd10_code: Some("I20.9".to_string()),
            likelihood: Some(0.6),
        }],
        specialty: Some("Cardiology".to_string()),
        supporting_evidence: vec![Evidence {
            title: "Stable angina guideline".to_string(),
            source: Some("ACC".to_string()),
            url: None,
            summary: String::new(),
        }],
    }
}

pub fn directory(providers: Vec<Provider>) -> DirectoryResponse {
    DirectoryResponse {
        total: providers.len(),
        providers,
    }
}

pub fn ranking(order: &[&str]) -> RankingResponse {
    RankingResponse {
        order: order.iter().map(|s| s.to_string()).collect(),
        links: ProviderLinks::new(),
    }
}

/// What a scripted collaborator does on its next call
pub enum Reply<T> {
    Ok(T),
    Fail(&'static str),
    /// Never completes
    Hang,
}

/// Queue of replies plus a call log
pub struct Scripted<T, Req> {
    replies: Mutex<VecDeque<Reply<T>>>,
    requests: Mutex<Vec<Req>>,
}

impl<T, Req: Clone> Scripted<T, Req> {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, reply: Reply<T>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Req> {
        self.requests.lock().unwrap().clone()
    }

    async fn next(&self, request: Req) -> Result<T> {
        let reply = {
            self.requests.lock().unwrap().push(request);
            self.replies.lock().unwrap().pop_front()
        };

        match reply {
            Some(Reply::Ok(value)) => Ok(value),
            Some(Reply::Fail(message)) => Err(anyhow!(message)),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}

pub type MockRecommendation = Scripted<ClinicalProfile, RecommendationRequest>;
pub type MockDirectory = Scripted<DirectoryResponse, DirectoryRequest>;
/// Records the registry numbers it was asked to rank
pub type MockRanking = Scripted<RankingResponse, Vec<String>>;

#[async_trait]
impl RecommendationService for MockRecommendation {
    async fn recommend(&self, request: &RecommendationRequest) -> Result<ClinicalProfile> {
        self.next(request.clone()).await
    }
}

#[async_trait]
impl DirectoryService for MockDirectory {
    async fn search(&self, request: &DirectoryRequest) -> Result<DirectoryResponse> {
        self.next(request.clone()).await
    }
}

#[async_trait]
impl RankingService for MockRanking {
    async fn rank(&self, request: &RankingRequest<'_>) -> Result<RankingResponse> {
        let numbers = request
            .providers
            .iter()
            .map(|p| p.registry_number.clone())
            .collect();
        self.next(numbers).await
    }
}

pub struct Mocks {
    pub recommendation: Arc<MockRecommendation>,
    pub directory: Arc<MockDirectory>,
    pub ranking: Arc<MockRanking>,
}

impl Mocks {
    pub fn new(
        recommendation: MockRecommendation,
        directory: MockDirectory,
        ranking: MockRanking,
    ) -> Self {
        Self {
            recommendation: Arc::new(recommendation),
            directory: Arc::new(directory),
            ranking: Arc::new(ranking),
        }
    }

    pub fn services(&self) -> ServiceSet {
        ServiceSet::new(
            self.recommendation.clone(),
            self.directory.clone(),
            self.ranking.clone(),
        )
    }
}
