use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::task::JoinSet;

use crate::config::AppConfig;
use crate::models::{Distance, Event};
use crate::query::DistanceMap;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent("event-scout/0.1")
        .build()
        .expect("failed to build geocoding client")
});

// Place ids are stable, so resolved coordinates are cached for the process
// lifetime.
static COORD_CACHE: Lazy<Mutex<HashMap<String, Coordinates>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("http error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("no geometry for place {0}")]
    NoGeometry(String),
}

#[derive(Debug, Deserialize)]
struct PlaceDetailsResponse {
    result: Option<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Place-details client used to resolve viewer/venue place ids into
/// coordinates and distance buckets.
#[derive(Clone)]
pub struct Geocoder {
    api_key: String,
    base_url: String,
}

impl Geocoder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Geocoder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn from_env() -> Self {
        Geocoder::new(std::env::var("MAPS_API_KEY").unwrap_or_default())
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut geocoder = match &config.maps_api_key {
            Some(key) => Geocoder::new(key.clone()),
            None => Geocoder::from_env(),
        };
        if let Some(base) = &config.geocode_base_url {
            geocoder.base_url = base.clone();
        }
        geocoder
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn coordinates(&self, place_id: &str) -> Result<Coordinates, GeoError> {
        let cached = {
            let guard = COORD_CACHE.lock().expect("coordinate cache poisoned");
            guard.get(place_id).copied()
        };
        if let Some(coords) = cached {
            return Ok(coords);
        }

        let mut url =
            Url::parse(&self.base_url).map_err(|err| GeoError::Http(err.to_string()))?;
        url.query_pairs_mut()
            .append_pair("place_id", place_id)
            .append_pair("key", &self.api_key);

        let response = CLIENT
            .get(url)
            .send()
            .await
            .map_err(|err| GeoError::Http(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| GeoError::Http(err.to_string()))?;
        if !status.is_success() {
            return Err(GeoError::Http(format!("status {}: {}", status, text)));
        }

        let payload: PlaceDetailsResponse =
            serde_json::from_str(&text).map_err(|err| GeoError::Parse(err.to_string()))?;
        let location = payload
            .result
            .and_then(|result| result.geometry)
            .map(|geometry| geometry.location)
            .ok_or_else(|| GeoError::NoGeometry(place_id.to_string()))?;

        let coords = Coordinates {
            lat: location.lat,
            lng: location.lng,
        };
        COORD_CACHE
            .lock()
            .expect("coordinate cache poisoned")
            .insert(place_id.to_string(), coords);

        Ok(coords)
    }

    /// Bucketed great-circle distance between two place ids.
    pub async fn distance_bucket(
        &self,
        viewer_place: &str,
        event_place: &str,
    ) -> Result<Distance, GeoError> {
        let viewer = self.coordinates(viewer_place).await?;
        let event = self.coordinates(event_place).await?;
        Ok(bucket_for(haversine_km(viewer, event)))
    }

    /// Resolves a distance bucket for every event, concurrently. No viewer
    /// location yields an empty map (distance features disabled). A failed
    /// lookup resolves that one event to `None` without touching the rest.
    pub async fn distance_map(&self, viewer_place: Option<&str>, events: &[Event]) -> DistanceMap {
        let mut map = DistanceMap::new();
        let viewer_place = match viewer_place {
            Some(place) if !place.is_empty() => place,
            _ => return map,
        };

        // The viewer side is common to every comparison; resolve it once up
        // front so the fan-out only does the per-event lookup.
        let viewer = match self.coordinates(viewer_place).await {
            Ok(coords) => coords,
            Err(err) => {
                eprintln!("viewer location lookup failed: {err}");
                for event in events {
                    map.insert(event.id.clone(), None);
                }
                return map;
            }
        };

        let mut lookups = JoinSet::new();
        for event in events {
            let geocoder = self.clone();
            let id = event.id.clone();
            let place = event.location.clone();
            lookups.spawn(async move {
                let bucket = match geocoder.coordinates(&place).await {
                    Ok(coords) => Some(bucket_for(haversine_km(viewer, coords))),
                    Err(err) => {
                        eprintln!("distance lookup failed for event {id}: {err}");
                        None
                    }
                };
                (id, bucket)
            });
        }

        while let Some(joined) = lookups.join_next().await {
            if let Ok((id, bucket)) = joined {
                map.insert(id, bucket);
            }
        }

        map
    }
}

/// Great-circle distance in kilometers.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Half-open bucket boundaries: anything under 1km is `One`, under 5km is
/// `Five`, and so on.
pub fn bucket_for(km: f64) -> Distance {
    match km {
        d if d < 1.0 => Distance::One,
        d if d < 5.0 => Distance::Five,
        d if d < 10.0 => Distance::Ten,
        d if d < 25.0 => Distance::TwentyFive,
        d if d < 50.0 => Distance::Fifty,
        _ => Distance::OverFifty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventCategory, EventPrice};
    use chrono::{Duration, Utc};

    fn event(id: &str) -> Event {
        let start = Utc::now() + Duration::days(1);
        Event {
            id: id.to_string(),
            name: id.to_string(),
            location: format!("place-{id}"),
            description: String::new(),
            host: "host-1".to_string(),
            start: start.to_rfc3339(),
            end: (start + Duration::hours(1)).to_rfc3339(),
            category: EventCategory::Entertainment,
            price: EventPrice::Free,
        }
    }

    #[test]
    fn buckets_use_half_open_boundaries() {
        assert_eq!(bucket_for(0.0), Distance::One);
        assert_eq!(bucket_for(0.99), Distance::One);
        assert_eq!(bucket_for(1.0), Distance::Five);
        assert_eq!(bucket_for(4.99), Distance::Five);
        assert_eq!(bucket_for(5.0), Distance::Ten);
        assert_eq!(bucket_for(9.99), Distance::Ten);
        assert_eq!(bucket_for(10.0), Distance::TwentyFive);
        assert_eq!(bucket_for(25.0), Distance::Fifty);
        assert_eq!(bucket_for(50.0), Distance::OverFifty);
        assert_eq!(bucket_for(4000.0), Distance::OverFifty);
    }

    #[test]
    fn haversine_matches_known_distances() {
        let origin = Coordinates { lat: 0.0, lng: 0.0 };
        assert_eq!(haversine_km(origin, origin), 0.0);

        // One degree of latitude is roughly 111.2 km.
        let one_north = Coordinates { lat: 1.0, lng: 0.0 };
        let d = haversine_km(origin, one_north);
        assert!((d - 111.2).abs() < 0.5, "got {d}");
    }

    #[tokio::test]
    async fn no_viewer_location_yields_empty_map() {
        let geocoder = Geocoder::new("test-key");
        let events = vec![event("a"), event("b")];
        assert!(geocoder.distance_map(None, &events).await.is_empty());
        assert!(geocoder.distance_map(Some(""), &events).await.is_empty());
    }

    #[tokio::test]
    async fn one_failed_lookup_does_not_invalidate_the_rest() {
        // The viewer and the first venue resolve from the coordinate cache;
        // the second venue's lookup hits an unroutable endpoint and fails.
        {
            let mut cache = COORD_CACHE.lock().unwrap();
            cache.insert(
                "viewer-cached".to_string(),
                Coordinates { lat: 0.0, lng: 0.0 },
            );
            cache.insert(
                "place-close".to_string(),
                Coordinates { lat: 0.01, lng: 0.0 }, // roughly 1.1 km north
            );
        }

        let geocoder = Geocoder::new("test-key").with_base_url("http://127.0.0.1:9/place");
        let events = vec![event("close"), event("lost")];
        let map = geocoder.distance_map(Some("viewer-cached"), &events).await;

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("close"), Some(&Some(Distance::Five)));
        assert_eq!(map.get("lost"), Some(&None));
    }

    #[tokio::test]
    async fn failed_lookups_resolve_to_none_per_event() {
        // Unroutable endpoint: every lookup fails, but the batch still
        // produces an entry per event instead of erroring out.
        let geocoder = Geocoder::new("test-key").with_base_url("http://127.0.0.1:9/place");
        let events = vec![event("a"), event("b")];
        let map = geocoder.distance_map(Some("viewer-place"), &events).await;
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&None));
        assert_eq!(map.get("b"), Some(&None));
    }
}
