//! Great-circle distance and commute feasibility between jobs and candidates.

use serde::{Deserialize, Serialize};

use crate::matching::MatchError;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default maximum commute distance.
pub const DEFAULT_MAX_COMMUTE_KM: f64 = 80.0;

/// A validated latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: Option<f64>,
    lon: Option<f64>,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = MatchError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        match (raw.lat, raw.lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon),
            _ => Err(MatchError::InvalidArgument(
                "coordinate requires both lat and lon".to_string(),
            )),
        }
    }
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, MatchError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(MatchError::InvalidArgument(format!(
                "latitude {lat} outside [-90, 90]"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(MatchError::InvalidArgument(format!(
                "longitude {lon} outside [-180, 180]"
            )));
        }
        Ok(Self { lat, lon })
    }
}

/// Result of checking whether a candidate can commute to a job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Commutability {
    Commutable { distance_km: f64 },
    NotCommutable { distance_km: f64 },
    /// At least one side has no coordinate.
    Unknown,
}

impl Commutability {
    pub fn distance_km(&self) -> Option<f64> {
        match self {
            Commutability::Commutable { distance_km }
            | Commutability::NotCommutable { distance_km } => Some(*distance_km),
            Commutability::Unknown => None,
        }
    }
}

/// Haversine distance in kilometers.
pub fn haversine_distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Boundary inclusive: exactly `max_km` away is still commutable.
pub fn is_commutable(distance_km: f64, max_km: f64) -> bool {
    distance_km <= max_km
}

pub fn candidate_commutability(
    job: Option<&Coordinate>,
    candidate: Option<&Coordinate>,
    max_km: f64,
) -> Commutability {
    let (Some(job), Some(candidate)) = (job, candidate) else {
        return Commutability::Unknown;
    };

    let distance_km = haversine_distance_km(job, candidate);
    if is_commutable(distance_km, max_km) {
        Commutability::Commutable { distance_km }
    } else {
        Commutability::NotCommutable { distance_km }
    }
}

/// Fixed-size location vector used when text embeddings are a poor fit for
/// place names: `[lat / 90, lon / 180]`.
pub fn coordinate_vector(coord: &Coordinate) -> Vec<f32> {
    vec![(coord.lat / 90.0) as f32, (coord.lon / 180.0) as f32]
}
