use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matching::geo::Coordinate;

/// One work-experience entry as returned by the resume parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub responsibilities: Option<String>,
}

/// A parsed resume plus everything the matcher caches on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    /// Employer names in resume order. Empty names are tolerated here and
    /// filtered when features are built.
    #[serde(default)]
    pub companies: Vec<String>,
    #[serde(default)]
    pub culture_index: Option<String>,
    #[serde(default)]
    pub clifton_strengths: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture_embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_coordinates: Option<Coordinate>,

    #[serde(default)]
    pub ingested_at: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            email: None,
            location: None,
            summary: String::new(),
            skills: Vec::new(),
            experience: Vec::new(),
            companies: Vec::new(),
            culture_index: None,
            clifton_strengths: Vec::new(),
            profile_embedding: None,
            culture_embedding: None,
            location_embedding: None,
            location_coordinates: None,
            ingested_at: None,
        }
    }

    /// Profile embedding, treating an empty vector the same as a missing one.
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
}
