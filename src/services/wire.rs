//! Collaborator payloads and their validation into domain types
//!
//! Raw shapes are permissive (defaults, aliases, numbers-or-strings) but
//! the conversion is strict about what the core relies on: a provider
//! without a registry number or a name is dropped, a payload that is not
//! an object is rejected.

use crate::provider::{
    Address, ClinicalProfile, Contact, Differential, Education, Evidence, Provider, ProviderLinks,
    SupplementalLink,
};
use crate::services::{DirectoryResponse, RankingResponse, ServiceError};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A string field that some services send as a number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl TextOrNumber {
    fn into_string(self) -> String {
        match self {
            TextOrNumber::Text(s) => s.trim().to_string(),
            TextOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn invalid(service: &str, message: impl Into<String>) -> ServiceError {
    ServiceError::InvalidResponse {
        service: service.to_string(),
        message: message.into(),
    }
}

fn require_object(service: &str, value: &Value) -> Result<(), ServiceError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(invalid(service, "expected a JSON object"))
    }
}

// ----- recommendation -----

#[derive(Debug, Deserialize)]
struct RawRecommendation {
    #[serde(default, alias = "icd10", alias = "icd_10_code")]
    icd10_code: Option<String>,
    #[serde(default, alias = "differential_diagnosis")]
    differential: Vec<RawDifferential>,
    #[serde(default, alias = "recommended_specialty")]
    specialty: Option<String>,
    #[serde(default, alias = "evidence")]
    supporting_evidence: Vec<RawEvidence>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDifferential {
    Name(String),
    Entry {
        #[serde(alias = "diagnosis")]
        name: String,
        #[serde(default, alias = "icd10", alias = "code")]
        icd10_code: Option<String>,
        #[serde(default, alias = "probability")]
        likelihood: Option<f64>,
    },
}

#[derive(Debug, Deserialize)]
struct RawEvidence {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "journal")]
    source: Option<String>,
    #[serde(default, alias = "link")]
    url: Option<String>,
    #[serde(default, alias = "abstract", alias = "snippet")]
    summary: Option<String>,
}

/// Validate a recommendation payload into a clinical profile
pub fn parse_recommendation(value: Value) -> Result<ClinicalProfile, ServiceError> {
    const SERVICE: &str = "recommendation";
    require_object(SERVICE, &value)?;

    let raw: RawRecommendation =
        serde_json::from_value(value).map_err(|e| invalid(SERVICE, e.to_string()))?;

    let differential = raw
        .differential
        .into_iter()
        .filter_map(|d| match d {
            RawDifferential::Name(name) => non_empty(Some(name)).map(|name| Differential {
                name,
                icd10_code: None,
                likelihood: None,
            }),
            RawDifferential::Entry {
                name,
                icd10_code,
                likelihood,
            } => non_empty(Some(name)).map(|name| Differential {
                name,
                icd10_code: non_empty(icd10_code),
                likelihood: likelihood.filter(|p| p.is_finite()).map(|p| p.clamp(0.0, 1.0)),
            }),
        })
        .collect();

    let supporting_evidence = raw
        .supporting_evidence
        .into_iter()
        .filter_map(|e| {
            let title = non_empty(e.title)?;
            Some(Evidence {
                title,
                source: non_empty(e.source),
                url: non_empty(e.url),
                summary: e.summary.unwrap_or_default().trim().to_string(),
            })
        })
        .collect();

    Ok(ClinicalProfile {
        icd10_code: non_empty(raw.icd10_code),
        differential,
        specialty: non_empty(raw.specialty),
        supporting_evidence,
    })
}

// ----- directory -----

#[derive(Debug, Deserialize)]
struct RawDirectory {
    #[serde(default, alias = "result_count", alias = "count")]
    total: Option<usize>,
    #[serde(default, alias = "results")]
    providers: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawProvider {
    #[serde(default)]
    id: Option<TextOrNumber>,
    #[serde(default, alias = "npi", alias = "number")]
    registry_number: Option<TextOrNumber>,
    #[serde(default, alias = "display_name", alias = "full_name")]
    name: Option<String>,
    #[serde(default, alias = "taxonomy", alias = "primary_specialty")]
    specialty: Option<String>,
    #[serde(default)]
    address: Option<RawAddress>,
    #[serde(default)]
    contact: Option<Contact>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default, alias = "experience_years", alias = "experience")]
    years_experience: Option<u32>,
    #[serde(default)]
    board_certified: Option<bool>,
    #[serde(default, alias = "accepting_new_patients")]
    accepting_patients: Option<bool>,
    #[serde(default)]
    languages: Vec<String>,
    #[serde(default, alias = "insurances", alias = "accepted_insurance")]
    insurance: Vec<String>,
    #[serde(default)]
    education: Option<Education>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAddress {
    #[serde(default, alias = "address_1", alias = "street")]
    line1: Option<String>,
    #[serde(default, alias = "address_2")]
    line2: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default, alias = "zip", alias = "postal")]
    postal_code: Option<TextOrNumber>,
}

fn convert_provider(value: Value) -> Result<Provider, String> {
    let raw: RawProvider = serde_json::from_value(value).map_err(|e| e.to_string())?;

    let registry_number = raw
        .registry_number
        .map(TextOrNumber::into_string)
        .filter(|s| !s.is_empty())
        .ok_or("missing registry number")?;
    let name = non_empty(raw.name).ok_or("missing name")?;
    let address = raw.address.unwrap_or_default();

    Ok(Provider {
        id: raw
            .id
            .map(TextOrNumber::into_string)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| registry_number.clone()),
        registry_number,
        name,
        specialty: non_empty(raw.specialty).unwrap_or_default(),
        address: Address {
            line1: non_empty(address.line1).unwrap_or_default(),
            line2: non_empty(address.line2),
            city: non_empty(address.city).unwrap_or_default(),
            state: non_empty(address.state).unwrap_or_default(),
            postal_code: address
                .postal_code
                .map(TextOrNumber::into_string)
                .unwrap_or_default(),
        },
        contact: raw.contact.unwrap_or_default(),
        rating: raw.rating.filter(|r| r.is_finite() && (0.0..=5.0).contains(r)),
        years_experience: raw.years_experience,
        board_certified: raw.board_certified.unwrap_or(false),
        accepting_patients: raw.accepting_patients.unwrap_or(false),
        languages: raw.languages.into_iter().filter_map(|l| non_empty(Some(l))).collect(),
        insurance: raw.insurance.into_iter().filter_map(|i| non_empty(Some(i))).collect(),
        education: raw.education,
    })
}

/// Validate a directory payload; malformed providers are skipped
pub fn parse_directory(value: Value) -> Result<DirectoryResponse, ServiceError> {
    const SERVICE: &str = "directory";
    require_object(SERVICE, &value)?;

    let raw: RawDirectory =
        serde_json::from_value(value).map_err(|e| invalid(SERVICE, e.to_string()))?;

    let mut providers = Vec::with_capacity(raw.providers.len());
    for (index, entry) in raw.providers.into_iter().enumerate() {
        match convert_provider(entry) {
            Ok(provider) => providers.push(provider),
            Err(reason) => {
                tracing::warn!("Skipping directory entry {}: {}", index, reason);
            }
        }
    }

    Ok(DirectoryResponse {
        total: raw.total.unwrap_or(providers.len()).max(providers.len()),
        providers,
    })
}

// ----- ranking -----

#[derive(Debug, Deserialize)]
struct RawRanking {
    #[serde(default, alias = "ranking", alias = "ranked", alias = "ranked_npis")]
    order: Vec<RawRankItem>,
    #[serde(default, alias = "provider_links", alias = "supplemental")]
    links: BTreeMap<String, Vec<RawLink>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRankItem {
    Bare(TextOrNumber),
    Entry {
        #[serde(alias = "npi")]
        registry_number: TextOrNumber,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLink {
    Url(String),
    Entry {
        #[serde(default)]
        title: Option<String>,
        #[serde(alias = "link", alias = "href")]
        url: String,
        #[serde(default, alias = "type")]
        kind: Option<String>,
    },
}

/// Validate a ranking payload
pub fn parse_ranking(value: Value) -> Result<RankingResponse, ServiceError> {
    const SERVICE: &str = "ranking";
    require_object(SERVICE, &value)?;

    let raw: RawRanking =
        serde_json::from_value(value).map_err(|e| invalid(SERVICE, e.to_string()))?;

    let order = raw
        .order
        .into_iter()
        .map(|item| match item {
            RawRankItem::Bare(v) => v.into_string(),
            RawRankItem::Entry { registry_number } => registry_number.into_string(),
        })
        .filter(|s| !s.is_empty())
        .collect();

    let mut links = ProviderLinks::new();
    for (name, entries) in raw.links {
        let entries: Vec<SupplementalLink> = entries
            .into_iter()
            .filter_map(|link| match link {
                RawLink::Url(url) => non_empty(Some(url)).map(|url| SupplementalLink {
                    title: url.clone(),
                    url,
                    kind: None,
                }),
                RawLink::Entry { title, url, kind } => {
                    non_empty(Some(url)).map(|url| SupplementalLink {
                        title: non_empty(title).unwrap_or_else(|| url.clone()),
                        url,
                        kind: non_empty(kind),
                    })
                }
            })
            .collect();

        if !name.trim().is_empty() && !entries.is_empty() {
            links.insert(&name, entries);
        }
    }

    Ok(RankingResponse { order, links })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recommendation_full_payload() {
        let profile = parse_recommendation(json!({
            "icd10": "G43.909",
            "differential_diagnosis": [
                {"diagnosis": "Migraine", "code": "G43.909", "probability": 0.7},
                "Tension headache",
                {"name": "  "}
            ],
            "recommended_specialty": "Neurology",
            "evidence": [
                {"title": "Migraine management", "journal": "NEJM", "abstract": "..."},
                {"url": "https://example.org/untitled"}
            ]
        }))
        .unwrap();

        assert_eq!(profile.icd10_code.as_deref(), Some("G43.909"));
        assert_eq!(profile.differential.len(), 2);
        assert_eq!(profile.differential[0].likelihood, Some(0.7));
        assert_eq!(profile.differential[1].name, "Tension headache");
        assert_eq!(profile.specialty.as_deref(), Some("Neurology"));
        assert_eq!(profile.supporting_evidence.len(), 1);
        assert_eq!(profile.supporting_evidence[0].source.as_deref(), Some("NEJM"));
    }

    #[test]
    fn test_recommendation_rejects_non_object() {
        assert!(parse_recommendation(json!(["G43.909"])).is_err());
        assert!(parse_recommendation(json!("text")).is_err());
    }

    #[test]
    fn test_recommendation_clamps_likelihood() {
        let profile = parse_recommendation(json!({
            "differential": [{"name": "X", "likelihood": 3.5}]
        }))
        .unwrap();
        assert_eq!(profile.differential[0].likelihood, Some(1.0));
    }

    #[test]
    fn test_directory_skips_invalid_providers() {
        let response = parse_directory(json!({
            "result_count": 40,
            "results": [
                {
                    "npi": 1234567890u64,
                    "display_name": "Dr. Ada Park",
                    "taxonomy": "Cardiology",
                    "address": {"address_1": "1 Main", "city": "Duluth", "state": "MN", "zip": 55802},
                    "rating": 4.5,
                    "accepting_new_patients": true,
                    "languages": ["English", " "]
                },
                {"display_name": "No Number"},
                {"npi": "222", "display_name": ""},
                "garbage"
            ]
        }))
        .unwrap();

        assert_eq!(response.total, 40);
        assert_eq!(response.providers.len(), 1);

        let p = &response.providers[0];
        assert_eq!(p.registry_number, "1234567890");
        assert_eq!(p.id, "1234567890");
        assert_eq!(p.address.postal_code, "55802");
        assert!(p.accepting_patients);
        assert!(!p.board_certified);
        assert_eq!(p.languages, vec!["English".to_string()]);
    }

    #[test]
    fn test_directory_out_of_range_rating_dropped() {
        let response = parse_directory(json!({
            "providers": [{"npi": "1", "name": "Dr. A", "rating": 17.0}]
        }))
        .unwrap();
        assert_eq!(response.total, 1);
        assert!(response.providers[0].rating.is_none());
    }

    #[test]
    fn test_ranking_mixed_item_shapes() {
        let response = parse_ranking(json!({
            "ranked": ["3", 1, {"npi": "2"}, ""],
            "provider_links": {
                "Dr. Ada Park": [
                    "https://example.org/a",
                    {"title": "Video", "href": "https://example.org/v", "type": "video"}
                ],
                "Dr. Nobody": []
            }
        }))
        .unwrap();

        assert_eq!(response.order, vec!["3", "1", "2"]);
        assert_eq!(response.links.len(), 1);

        let links = response.links.get("dr. ada park").unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].kind.as_deref(), Some("video"));
    }

    #[test]
    fn test_ranking_empty_object_is_empty_order() {
        let response = parse_ranking(json!({})).unwrap();
        assert!(response.order.is_empty());
        assert!(response.links.is_empty());
    }
}
