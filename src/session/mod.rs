//! Session persistence
//!
//! Mirrors the result store into a durable key/value store so that coming
//! back to the results view without fresh navigation data rebuilds the same
//! view, and decides between fresh data, a restored session or a new fetch
//! when a view mounts.
use crate::error::{CareseekError, Result};
use crate::filtering::FilterState;
use crate::orchestrator::{FailureKind, RequestMode};
use crate::provider::{ClinicalProfile, Provider, ProviderLinks, SearchCriteria};
use crate::ranking::RankingSource;
use crate::storage::SessionStore;
use crate::store::{FetchedResults, ResultStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// The one key every session is written under
pub const SESSION_KEY: &str = "careseek.results";

/// Current payload version; newer payloads are treated as unreadable
pub const SESSION_VERSION: u32 = 1;

fn current_version() -> u32 {
    SESSION_VERSION
}

/// Durable projection of a results view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default = "current_version")]
    pub version: u32,

    pub saved_at: DateTime<Utc>,

    #[serde(default)]
    pub run_id: Option<Uuid>,

    #[serde(default)]
    pub criteria: Option<SearchCriteria>,

    /// Raw, unfiltered provider list in ranked order
    #[serde(default)]
    pub providers: Vec<Provider>,

    #[serde(default)]
    pub links: ProviderLinks,

    #[serde(default)]
    pub filter: FilterState,

    #[serde(default)]
    pub profile: ClinicalProfile,

    #[serde(default)]
    pub ranking: RankingSource,

    #[serde(default)]
    pub mode: RequestMode,
}

impl PersistedSession {
    /// Serialize to the stored JSON form
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CareseekError::Json {
            source: e,
            context: "Failed to serialize result session".to_string(),
        })
    }

    /// Parse the stored JSON form
    pub fn from_json(content: &str) -> Result<Self> {
        let session: PersistedSession =
            serde_json::from_str(content).map_err(|e| CareseekError::Json {
                source: e,
                context: "Failed to deserialize result session".to_string(),
            })?;

        if session.version > SESSION_VERSION {
            return Err(CareseekError::Session(format!(
                "Unsupported session version {} (expected <= {})",
                session.version, SESSION_VERSION
            )));
        }

        Ok(session)
    }

    /// Whether mounting can rebuild a view from this session
    ///
    /// A provider list is required, except for an assessment-only run,
    /// which saves no providers but must keep its criteria so the
    /// specialist list can be requested later.
    pub fn is_restorable(&self) -> bool {
        match self.mode {
            RequestMode::Full => !self.providers.is_empty(),
            RequestMode::AssessmentOnly => {
                !self.providers.is_empty() || self.criteria.is_some()
            }
        }
    }
}

/// Reads and writes the persisted session under [`SESSION_KEY`]
#[derive(Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn SessionStore>,
    key: String,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self::with_key(store, SESSION_KEY)
    }

    pub fn with_key(store: Arc<dyn SessionStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Overwrite the durable session with `session`
    pub fn persist(&self, session: &PersistedSession) -> Result<()> {
        let payload = session.to_json()?;
        self.store.save(&self.key, &payload)
    }

    /// Read the durable session
    ///
    /// Read and parse failures are logged and reported as "no session".
    pub fn restore(&self) -> Option<PersistedSession> {
        let content = match self.store.load(&self.key) {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(
                    kind = %FailureKind::PersistenceRead,
                    "Failed to read saved session: {}",
                    e
                );
                return None;
            }
        };

        match PersistedSession::from_json(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(
                    kind = %FailureKind::PersistenceRead,
                    "Ignoring unreadable saved session: {}",
                    e
                );
                None
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.store.clear(&self.key)
    }

    pub fn describe(&self) -> String {
        format!("{} [{}]", self.store.describe(), self.key)
    }
}

/// How a results view got its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    /// Caller supplied fresh navigation data; durable copy overwritten
    Fresh,
    /// Result list and filter state restored from the durable store
    Restored,
    /// Nothing to show; run a search with these criteria
    NeedsFetch(SearchCriteria),
}

/// Decide where a mounting results view gets its data from
///
/// 1. Fresh navigation data wins and overwrites the durable session.
/// 2. Otherwise a durable session with a non-empty provider list is
///    restored, filter state included.
/// 3. Otherwise the caller should run a search with `default_criteria`.
pub fn mount(
    store: &mut ResultStore,
    fresh: Option<FetchedResults>,
    default_criteria: &SearchCriteria,
) -> MountOutcome {
    if let Some(results) = fresh {
        tracing::debug!("Mounting results view with fresh data");
        store.set_results(results);
        return MountOutcome::Fresh;
    }

    match store.bridge().restore() {
        Some(session) if session.is_restorable() => {
            tracing::debug!("Mounting results view from saved session");
            store.restore(session);
            MountOutcome::Restored
        }
        _ => {
            tracing::info!(
                "No saved results, searching with default criteria ({})",
                default_criteria.label()
            );
            MountOutcome::NeedsFetch(default_criteria.clone())
        }
    }
}
