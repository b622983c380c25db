//! Search orchestration
//!
//! Drives one search through recommendation, directory lookup and ranking,
//! and hands the outcome to the result store. External failures are caught
//! here and translated into [`FailureKind`]s; only a directory failure ends
//! a run without results.

use crate::provider::{ClinicalProfile, Provider, ProviderLinks, SearchCriteria};
use crate::ranking::{apply_external_order, fallback_order, RankingSource};
use crate::services::{DirectoryRequest, RankingRequest, RecommendationRequest, ServiceSet};
use crate::store::{FetchedResults, ResultStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

/// What the user asked for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// Assessment plus ranked providers
    #[default]
    Full,
    /// Clinical assessment only; providers on request
    AssessmentOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    Idle,
    FetchingRecommendation,
    FetchingDirectory,
    Ranking,
    Ready,
    Failed,
}

impl OrchestratorState {
    /// A run is in flight
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            OrchestratorState::FetchingRecommendation
                | OrchestratorState::FetchingDirectory
                | OrchestratorState::Ranking
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrchestratorState::Idle => "idle",
            OrchestratorState::FetchingRecommendation => "fetching-recommendation",
            OrchestratorState::FetchingDirectory => "fetching-directory",
            OrchestratorState::Ranking => "ranking",
            OrchestratorState::Ready => "ready",
            OrchestratorState::Failed => "failed",
        }
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an external failure was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Recommendation failed; continued with an empty profile
    DegradedInput,
    /// Directory failed; run aborted
    FatalFetch,
    /// Ranking failed or returned nothing usable; fallback order used
    RankingUnavailable,
    /// Saved session unreadable; treated as absent
    PersistenceRead,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::DegradedInput => "degraded-input",
            FailureKind::FatalFetch => "fatal-fetch",
            FailureKind::RankingUnavailable => "ranking-unavailable",
            FailureKind::PersistenceRead => "persistence-read",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Provider directory unavailable for {}: {reason}", .criteria.label())]
    DirectoryUnavailable {
        criteria: SearchCriteria,
        reason: String,
    },

    #[error("A search is already in progress")]
    RunInFlight,

    #[error("Cannot do that while the search is {state}")]
    ReentryNotAllowed { state: OrchestratorState },

    #[error("No previous search to continue")]
    NoPriorContext,
}

impl OrchestratorError {
    /// Criteria to retry with, for failures that carry them
    pub fn criteria(&self) -> Option<&SearchCriteria> {
        match self {
            OrchestratorError::DirectoryUnavailable { criteria, .. } => Some(criteria),
            _ => None,
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub state: OrchestratorState,
    pub mode: RequestMode,
    /// Providers handed to the result store
    pub providers: usize,
    /// Matches the directory reported (may exceed `providers`)
    pub directory_total: usize,
    pub ranking: RankingSource,
    pub profile_available: bool,
    pub failures: Vec<Failure>,
}

impl RunReport {
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrchestratorSettings {
    /// Directory result cap
    pub max_results: usize,
    /// Upper bound on each external call; `None` waits indefinitely
    pub step_timeout: Option<Duration>,
    /// Provider the fallback ranker keeps first when it is in the list
    pub pinned_registry_number: Option<String>,
    /// Fixed fallback seed for reproducible order
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
struct RunContext {
    criteria: SearchCriteria,
    mode: RequestMode,
}

pub struct Orchestrator {
    services: ServiceSet,
    settings: OrchestratorSettings,
    rng: StdRng,
    state: watch::Sender<OrchestratorState>,
    context: Option<RunContext>,
    last_failure: Option<Failure>,
}

impl Orchestrator {
    pub fn new(services: ServiceSet, settings: OrchestratorSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (state, _) = watch::channel(OrchestratorState::Idle);

        Self {
            services,
            settings,
            rng,
            state,
            context: None,
            last_failure: None,
        }
    }

    /// Replace the fallback random source
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn state(&self) -> OrchestratorState {
        *self.state.borrow()
    }

    /// Observe state changes, e.g. to disable a search control while busy
    pub fn subscribe(&self) -> watch::Receiver<OrchestratorState> {
        self.state.subscribe()
    }

    /// Whether a new run may start
    pub fn can_trigger(&self) -> bool {
        !self.state().is_busy()
    }

    /// The fatal failure that put the orchestrator in `Failed`
    pub fn last_failure(&self) -> Option<&Failure> {
        self.last_failure.as_ref()
    }

    /// Criteria of the most recent run
    pub fn criteria(&self) -> Option<&SearchCriteria> {
        self.context.as_ref().map(|c| &c.criteria)
    }

    /// Pick up from a store that already holds results, e.g. one restored
    /// from a saved session, so re-entry works without a new run
    pub fn resume_from(&mut self, store: &ResultStore) {
        if self.state() != OrchestratorState::Idle {
            return;
        }
        if let Some(criteria) = store.criteria() {
            self.context = Some(RunContext {
                criteria: criteria.clone(),
                mode: store.mode(),
            });
            self.transition(OrchestratorState::Ready);
        }
    }

    /// Give up on a run whose future was dropped mid-flight
    ///
    /// Moves to `Failed` with the captured criteria so [`retry`](Self::retry)
    /// can pick it up. No-op unless a run is in flight.
    pub fn abandon(&mut self) {
        if self.state().is_busy() {
            tracing::warn!("Abandoning search stuck in {}", self.state());
            self.last_failure = Some(Failure::new(FailureKind::FatalFetch, "search abandoned"));
            self.transition(OrchestratorState::Failed);
        }
    }

    /// Run a new search
    pub async fn run(
        &mut self,
        criteria: SearchCriteria,
        mode: RequestMode,
        store: &mut ResultStore,
    ) -> Result<RunReport, OrchestratorError> {
        if !self.can_trigger() {
            return Err(OrchestratorError::RunInFlight);
        }

        self.context = Some(RunContext {
            criteria: criteria.clone(),
            mode,
        });
        self.execute(criteria, mode, store).await
    }

    /// Fetch and rank providers after an assessment-only search
    ///
    /// Repeats the whole run with the captured criteria.
    pub async fn show_specialists(
        &mut self,
        store: &mut ResultStore,
    ) -> Result<RunReport, OrchestratorError> {
        let state = self.state();
        if state.is_busy() {
            return Err(OrchestratorError::RunInFlight);
        }

        let context = self.context.clone().ok_or(OrchestratorError::NoPriorContext)?;
        if state != OrchestratorState::Ready || context.mode != RequestMode::AssessmentOnly {
            return Err(OrchestratorError::ReentryNotAllowed { state });
        }

        tracing::info!("Showing specialists for {}", context.criteria.label());
        self.context = Some(RunContext {
            criteria: context.criteria.clone(),
            mode: RequestMode::Full,
        });
        self.execute(context.criteria, RequestMode::Full, store).await
    }

    /// Re-run a failed search with the criteria it failed with
    pub async fn retry(&mut self, store: &mut ResultStore) -> Result<RunReport, OrchestratorError> {
        let state = self.state();
        if state != OrchestratorState::Failed {
            return Err(OrchestratorError::ReentryNotAllowed { state });
        }

        let context = self.context.clone().ok_or(OrchestratorError::NoPriorContext)?;
        tracing::info!("Retrying search for {}", context.criteria.label());
        self.execute(context.criteria, context.mode, store).await
    }

    fn transition(&mut self, next: OrchestratorState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!("Search state {} -> {}", previous, next);
        }
    }

    /// Await `step`, bounded by the configured step timeout
    async fn step<T, F>(&self, name: &str, step: F) -> anyhow::Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match self.settings.step_timeout {
            Some(limit) => match tokio::time::timeout(limit, step).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!("{} timed out after {:?}", name, limit)),
            },
            None => step.await,
        }
    }

    async fn execute(
        &mut self,
        criteria: SearchCriteria,
        mode: RequestMode,
        store: &mut ResultStore,
    ) -> Result<RunReport, OrchestratorError> {
        let run_id = Uuid::new_v4();
        let mut failures = Vec::new();
        self.last_failure = None;

        tracing::info!("Starting search {} for {}", run_id, criteria.label());

        // Step 1: recommendation (degrades)
        self.transition(OrchestratorState::FetchingRecommendation);
        let profile = self.fetch_recommendation(&criteria, &mut failures).await;

        if mode == RequestMode::AssessmentOnly {
            let profile_available = !profile.is_empty();
            store.set_assessment(criteria, profile, Some(run_id));
            self.transition(OrchestratorState::Ready);

            return Ok(RunReport {
                run_id,
                state: OrchestratorState::Ready,
                mode,
                providers: 0,
                directory_total: 0,
                ranking: RankingSource::External,
                profile_available,
                failures,
            });
        }

        // Step 2: directory (fatal)
        self.transition(OrchestratorState::FetchingDirectory);
        let request = DirectoryRequest {
            state: criteria.state.clone(),
            city: criteria.city.clone(),
            specialty: criteria.taxonomy.clone().or_else(|| profile.specialty.clone()),
            description: criteria.description.clone(),
            radius_miles: criteria.radius_miles,
            limit: self.settings.max_results,
        };

        let directory = self.services.directory.clone();
        let response = match self.step("directory", directory.search(&request)).await {
            Ok(response) => response,
            Err(e) => {
                let reason = format!("{:#}", e);
                tracing::error!(kind = %FailureKind::FatalFetch, "Directory search failed: {}", reason);
                self.last_failure = Some(Failure::new(FailureKind::FatalFetch, reason.clone()));
                self.transition(OrchestratorState::Failed);
                return Err(OrchestratorError::DirectoryUnavailable { criteria, reason });
            }
        };

        let mut raw = response.providers;
        if self.settings.max_results > 0 && raw.len() > self.settings.max_results {
            raw.truncate(self.settings.max_results);
        }
        tracing::debug!("Directory returned {} of {} providers", raw.len(), response.total);

        // Step 3: ranking (falls back)
        self.transition(OrchestratorState::Ranking);
        let (providers, links, ranking) = self
            .rank(&criteria, raw, &profile, &mut failures)
            .await;

        let report = RunReport {
            run_id,
            state: OrchestratorState::Ready,
            mode,
            providers: providers.len(),
            directory_total: response.total,
            ranking,
            profile_available: !profile.is_empty(),
            failures,
        };

        store.set_results(
            FetchedResults::new(criteria, providers, links)
                .with_profile(profile)
                .with_ranking(ranking)
                .with_run_id(run_id),
        );
        self.transition(OrchestratorState::Ready);

        tracing::info!(
            "Search {} ready: {} providers ({})",
            run_id,
            report.providers,
            if ranking.is_ranked() { "ranked" } else { "unranked" }
        );
        Ok(report)
    }

    async fn fetch_recommendation(
        &self,
        criteria: &SearchCriteria,
        failures: &mut Vec<Failure>,
    ) -> ClinicalProfile {
        let request = RecommendationRequest {
            description: criteria.description.clone(),
            history: criteria.history.clone(),
        };

        match self
            .step("recommendation", self.services.recommendation.recommend(&request))
            .await
        {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(
                    kind = %FailureKind::DegradedInput,
                    "Recommendation failed, continuing without assessment: {:#}",
                    e
                );
                failures.push(Failure::new(FailureKind::DegradedInput, format!("{:#}", e)));
                ClinicalProfile::default()
            }
        }
    }

    async fn rank(
        &mut self,
        criteria: &SearchCriteria,
        raw: Vec<Provider>,
        profile: &ClinicalProfile,
        failures: &mut Vec<Failure>,
    ) -> (Vec<Provider>, ProviderLinks, RankingSource) {
        if raw.is_empty() {
            return (raw, ProviderLinks::new(), RankingSource::External);
        }

        let request = RankingRequest {
            description: &criteria.description,
            providers: &raw,
            evidence: &profile.supporting_evidence,
        };

        let outcome = self
            .step("ranking", self.services.ranking.rank(&request))
            .await;

        let (reason, links, raw) = match outcome {
            Ok(response) if response.order.is_empty() => (
                "ranking returned no order".to_string(),
                response.links,
                raw,
            ),
            Ok(response) => {
                let reordered = apply_external_order(raw, &response.order);
                if !reordered.ranked.is_empty() {
                    return (reordered.ranked, response.links, RankingSource::External);
                }
                (
                    "ranking matched none of the providers".to_string(),
                    response.links,
                    reordered.unclaimed,
                )
            }
            Err(e) => (format!("{:#}", e), ProviderLinks::new(), raw),
        };

        tracing::warn!(
            kind = %FailureKind::RankingUnavailable,
            "Ranking unavailable, using fallback order: {}",
            reason
        );
        failures.push(Failure::new(FailureKind::RankingUnavailable, reason));

        let pin = self.settings.pinned_registry_number.as_deref();
        let ordered = fallback_order(
            raw,
            pin.map(|number| move |p: &Provider| p.registry_number == number),
            &mut self.rng,
        );
        (ordered, links, RankingSource::Fallback)
    }
}
