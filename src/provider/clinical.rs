//! Clinical profile produced by the recommendation lookup

use serde::{Deserialize, Serialize};

/// Structured clinical profile used as ranking input
///
/// `Default` is the empty profile the orchestrator falls back to when the
/// recommendation lookup is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalProfile {
    /// Primary candidate diagnosis (ICD-10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icd10_code: Option<String>,

    /// Differential diagnoses, most likely first
    #[serde(default)]
    pub differential: Vec<Differential>,

    /// Inferred specialty to search for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,

    /// Evidence forwarded to the ranking lookup
    #[serde(default)]
    pub supporting_evidence: Vec<Evidence>,
}

impl ClinicalProfile {
    /// True when the lookup produced nothing usable
    pub fn is_empty(&self) -> bool {
        self.icd10_code.is_none()
            && self.differential.is_empty()
            && self.specialty.is_none()
            && self.supporting_evidence.is_empty()
    }

    /// Text shown on the assessment view
    pub fn summary(&self) -> String {
        if self.differential.is_empty() {
            return "No differential available".to_string();
        }

        let mut lines = Vec::with_capacity(self.differential.len() + 1);
        if let Some(code) = &self.icd10_code {
            lines.push(format!("Primary: {}", code));
        }
        for (i, dx) in self.differential.iter().enumerate() {
            let code = dx.icd10_code.as_deref().unwrap_or("-");
            match dx.likelihood {
                Some(p) => lines.push(format!(
                    "{}. {} [{}] ({:.0}%)",
                    i + 1,
                    dx.name,
                    code,
                    p * 100.0
                )),
                None => lines.push(format!("{}. {} [{}]", i + 1, dx.name, code)),
            }
        }
        lines.join("\n")
    }
}

/// One entry in a differential diagnosis list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Differential {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icd10_code: Option<String>,
    /// Likelihood in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likelihood: Option<f64>,
}

/// A supporting-evidence snippet (usually bibliographic)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile_summary() {
        let profile = ClinicalProfile::default();
        assert!(profile.is_empty());
        assert_eq!(profile.summary(), "No differential available");
    }

    #[test]
    fn test_summary_lists_differential() {
        let profile = ClinicalProfile {
            icd10_code: Some("I20.9".to_string()),
            differential: vec![
                Differential {
                    name: "Angina pectoris".to_string(),
                    icd10_code: Some("I20.9".to_string()),
                    likelihood: Some(0.6),
                },
                Differential {
                    name: "GERD".to_string(),
                    icd10_code: None,
                    likelihood: None,
                },
            ],
            specialty: Some("Cardiology".to_string()),
            supporting_evidence: Vec::new(),
        };

        let summary = profile.summary();
        assert!(summary.starts_with("Primary: I20.9"));
        assert!(summary.contains("1. Angina pectoris [I20.9] (60%)"));
        assert!(summary.contains("2. GERD [-]"));
    }
}
