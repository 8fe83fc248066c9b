//! Geocoding — resolves location strings to coordinates via Nominatim.
//!
//! Failure of any kind means "coordinates unknown" (`None`), never an error.
//! Nominatim's usage policy allows one request per second, so requests are
//! spaced by `MIN_REQUEST_INTERVAL` across all callers sharing the client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::matching::geo::Coordinate;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const USER_AGENT: &str = concat!("matchmaker/", env!("CARGO_PKG_VERSION"));
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 3;

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, location: &str) -> Option<Coordinate>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimGeocoder {
    pub fn new(base_url: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            last_request: Mutex::new(None),
        })
    }

    async fn wait_for_slot(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let next = prev + MIN_REQUEST_INTERVAL;
            if next > Instant::now() {
                tokio::time::sleep_until(next).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, location: &str) -> Option<Coordinate> {
        let location = location.trim();
        if location.is_empty() {
            return None;
        }

        for attempt in 1..=MAX_ATTEMPTS {
            self.wait_for_slot().await;

            let response = self
                .client
                .get(format!("{}/search", self.base_url))
                .query(&[("q", location), ("format", "json"), ("limit", "1")])
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) if e.is_timeout() => {
                    warn!(location, attempt, "geocoding timed out");
                    continue;
                }
                Err(e) => {
                    warn!(location, error = %e, "geocoding request failed");
                    return None;
                }
            };

            if !response.status().is_success() {
                warn!(
                    location,
                    status = response.status().as_u16(),
                    "geocoder returned error status"
                );
                return None;
            }

            let places: Vec<NominatimPlace> = match response.json().await {
                Ok(p) => p,
                Err(e) => {
                    warn!(location, error = %e, "unreadable geocoder response");
                    return None;
                }
            };

            let coordinate = places.first().and_then(parse_place);
            if coordinate.is_none() {
                debug!(location, "location could not be geocoded");
            }
            return coordinate;
        }

        warn!(location, attempts = MAX_ATTEMPTS, "geocoding gave up");
        None
    }
}

fn parse_place(place: &NominatimPlace) -> Option<Coordinate> {
    let lat = place.lat.parse::<f64>().ok()?;
    let lon = place.lon.parse::<f64>().ok()?;
    Coordinate::new(lat, lon).ok()
}

/// Geocodes the first location string that resolves.
pub async fn geocode_first(geocoder: &dyn Geocoder, locations: &[String]) -> Option<Coordinate> {
    for location in locations {
        if let Some(coord) = geocoder.geocode(location).await {
            return Some(coord);
        }
    }
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Lookup-table geocoder for tests.
    #[derive(Default)]
    pub(crate) struct TableGeocoder(pub HashMap<String, Coordinate>);

    #[async_trait]
    impl Geocoder for TableGeocoder {
        async fn geocode(&self, location: &str) -> Option<Coordinate> {
            self.0.get(location).copied()
        }
    }

    #[test]
    fn test_parse_place_reads_string_coordinates() {
        let json = r#"[{"lat": "51.5073", "lon": "-0.1276", "display_name": "London"}]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(json).unwrap();
        let coord = parse_place(&places[0]).unwrap();
        assert!((coord.lat - 51.5073).abs() < 1e-9);
        assert!((coord.lon + 0.1276).abs() < 1e-9);
    }

    #[test]
    fn test_parse_place_rejects_garbage() {
        let place = NominatimPlace {
            lat: "north".to_string(),
            lon: "0".to_string(),
        };
        assert!(parse_place(&place).is_none());
        let place = NominatimPlace {
            lat: "95".to_string(),
            lon: "0".to_string(),
        };
        assert!(parse_place(&place).is_none());
    }

    #[tokio::test]
    async fn test_geocode_first_skips_unresolvable() {
        let berlin = Coordinate::new(52.52, 13.405).unwrap();
        let geocoder = TableGeocoder(HashMap::from([("Berlin".to_string(), berlin)]));
        let locations = vec!["Remote".to_string(), "Berlin".to_string()];
        assert_eq!(geocode_first(&geocoder, &locations).await, Some(berlin));
        assert_eq!(geocode_first(&geocoder, &[]).await, None);
    }

    #[tokio::test]
    async fn test_blank_location_is_not_requested() {
        let geocoder = NominatimGeocoder::new("http://127.0.0.1:9".to_string()).unwrap();
        assert!(geocoder.geocode("   ").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_spaced() {
        let geocoder = NominatimGeocoder::new(DEFAULT_GEOCODER_URL.to_string()).unwrap();
        let start = Instant::now();
        geocoder.wait_for_slot().await;
        geocoder.wait_for_slot().await;
        geocoder.wait_for_slot().await;
        assert!(Instant::now() - start >= Duration::from_secs(2));
    }
}
