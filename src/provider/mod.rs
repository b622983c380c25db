//! Provider search data model
//!
//! Criteria that start a search, the providers a directory lookup returns,
//! and the clinical and supplemental data attached to a result set.

mod clinical;
mod links;

pub use clinical::{ClinicalProfile, Differential, Evidence};
pub use links::{normalize_name, ProviderLinks, SupplementalLink};

use serde::{Deserialize, Serialize};

/// Criteria for one search run
///
/// Immutable once a run starts; the orchestrator keeps a copy so a failed
/// run can be retried without asking the user again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Two-letter state code
    pub state: String,

    pub city: String,

    /// Free-text diagnosis or symptom description
    pub description: String,

    /// Optional taxonomy/specialty code used to narrow the directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<String>,

    /// Optional proximity radius in miles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_miles: Option<u32>,

    /// Optional history forwarded to the recommendation lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<ClinicalHistory>,
}

impl SearchCriteria {
    pub fn new(
        state: impl Into<String>,
        city: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            state: state.into(),
            city: city.into(),
            description: description.into(),
            taxonomy: None,
            radius_miles: None,
            history: None,
        }
    }

    pub fn with_taxonomy(mut self, taxonomy: impl Into<String>) -> Self {
        self.taxonomy = Some(taxonomy.into());
        self
    }

    pub fn with_radius(mut self, miles: u32) -> Self {
        self.radius_miles = Some(miles);
        self
    }

    pub fn with_history(mut self, history: ClinicalHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// Short human-readable label, used in log lines and CLI headers
    pub fn label(&self) -> String {
        format!("{}, {}: {}", self.city, self.state, self.description)
    }
}

/// Optional patient history sent along with the clinical description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
}

/// A healthcare provider as returned by the directory lookup
///
/// The core never mutates a provider; it only reorders references to them
/// and annotates those references with a rank, grade and links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// Directory-local identifier
    pub id: String,

    /// External registry (NPI) number
    pub registry_number: String,

    /// Display name
    pub name: String,

    pub specialty: String,

    pub address: Address,

    #[serde(default)]
    pub contact: Contact,

    /// Rating on a 0-5 scale, when the directory has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_experience: Option<u32>,

    #[serde(default)]
    pub board_certified: bool,

    #[serde(default)]
    pub accepting_patients: bool,

    #[serde(default)]
    pub languages: Vec<String>,

    #[serde(default)]
    pub insurance: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<Education>,
}

/// Practice location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl Address {
    /// Single-line rendering ("line1, line2, city, ST 12345")
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.clone()];
        if let Some(line2) = &self.line2 {
            parts.push(line2.clone());
        }
        parts.push(self.city.clone());
        format!("{} {}", parts.join(", "), self.state_and_zip())
    }

    fn state_and_zip(&self) -> String {
        format!("{} {}", self.state, self.postal_code).trim().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<u16>,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_builder() {
        let criteria = SearchCriteria::new("MN", "Minneapolis", "chest pain")
            .with_taxonomy("207RC0000X")
            .with_radius(25);

        assert_eq!(criteria.taxonomy.as_deref(), Some("207RC0000X"));
        assert_eq!(criteria.radius_miles, Some(25));
        assert_eq!(criteria.label(), "Minneapolis, MN: chest pain");
    }

    #[test]
    fn test_address_one_line() {
        let address = Address {
            line1: "420 Delaware St SE".to_string(),
            line2: Some("Suite 8".to_string()),
            city: "Minneapolis".to_string(),
            state: "MN".to_string(),
            postal_code: "55455".to_string(),
        };

        assert_eq!(
            address.one_line(),
            "420 Delaware St SE, Suite 8, Minneapolis MN 55455"
        );
    }

    #[test]
    fn test_provider_defaults_on_sparse_json() {
        let json = r#"{
            "id": "1",
            "registry_number": "1234567890",
            "name": "Dr. Ada Lovelace",
            "specialty": "Cardiology",
            "address": {"line1": "1 Main", "city": "Duluth", "state": "MN", "postal_code": "55802"}
        }"#;

        let provider: Provider = serde_json::from_str(json).unwrap();
        assert!(!provider.board_certified);
        assert!(provider.languages.is_empty());
        assert!(provider.rating.is_none());
    }
}
