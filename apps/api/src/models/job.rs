use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matching::geo::Coordinate;

/// A parsed job description plus the embeddings and coordinate cached on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub company_name: String,
    pub job_title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub qualifications: Vec<String>,
    #[serde(default)]
    pub min_years: Option<f64>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub culture_index: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture_embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_embedding: Option<Vec<f32>>,
    /// Geocoded from the first resolvable entry of `locations`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_coordinates: Option<Coordinate>,

    #[serde(default)]
    pub ingested_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(company_name: impl Into<String>, job_title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_name: company_name.into(),
            job_title: job_title.into(),
            summary: String::new(),
            skills: Vec::new(),
            responsibilities: Vec::new(),
            qualifications: Vec::new(),
            min_years: None,
            locations: Vec::new(),
            culture_index: None,
            profile_embedding: None,
            culture_embedding: None,
            location_embedding: None,
            location_coordinates: None,
            ingested_at: None,
        }
    }

    pub fn profile_vector(&self) -> Option<&[f32]> {
        self.profile_embedding
            .as_deref()
            .filter(|v| !v.is_empty())
    }

    pub fn culture_vector(&self) -> Option<&[f32]> {
        self.culture_embedding
            .as_deref()
            .filter(|v| !v.is_empty())
    }

    pub fn has_embeddings(&self) -> bool {
        self.profile_vector().is_some()
    }

    /// Identifier used in API responses: `<company>_<title>`.
    pub fn job_key(&self) -> String {
        format!("{}_{}", self.company_name, self.job_title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_deserializes_min_years_and_coordinates() {
        let json = r#"{
            "company_name": "Acme",
            "job_title": "Staff Engineer",
            "min_years": 7,
            "locations": ["Austin, TX"],
            "location_coordinates": {"lat": 30.27, "lon": -97.74}
        }"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.min_years, Some(7.0));
        assert_eq!(job.locations, vec!["Austin, TX".to_string()]);
        let coord = job.location_coordinates.unwrap();
        assert!((coord.lat - 30.27).abs() < 1e-9);
    }

    #[test]
    fn test_job_key_joins_company_and_title() {
        let job = Job::new("Acme", "Staff Engineer");
        assert_eq!(job.job_key(), "Acme_Staff Engineer");
    }

    #[test]
    fn test_job_with_out_of_range_coordinate_is_rejected() {
        let json = r#"{
            "company_name": "Acme",
            "job_title": "Engineer",
            "location_coordinates": {"lat": 123.0, "lon": 0.0}
        }"#;
        assert!(serde_json::from_str::<Job>(json).is_err());
    }
}
