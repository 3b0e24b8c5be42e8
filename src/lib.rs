//! Event discovery engine: pure filtering/sorting/availability matching over
//! a snapshot of events, plus the store and geocoding collaborators that feed
//! it.

pub mod config;
pub mod db;
pub mod geo;
pub mod models;
pub mod query;
mod utils;

use anyhow::Context;

pub use config::{AppConfig, ConfigStore};
pub use db::Store;
pub use geo::Geocoder;
pub use models::{
    AvailabilityGrid, Distance, Event, EventCategory, EventKind, EventPrice, Filters, Sort,
    Status, User, UserEvent,
};
pub use query::{filter_events, is_available, sort_events, DistanceMap};

/// Loads the viewer's snapshot (events, RSVP records, availability, stored
/// filter preference), resolves distance buckets when the viewer has a
/// location, and returns the filtered, ordered discovery list. The query
/// engine itself only ever sees plain data; this is the one layer that
/// touches the store.
pub async fn discover(
    store: &Store,
    user_id: &str,
    search: &str,
    sort: Sort,
    geocoder: &Geocoder,
) -> anyhow::Result<Vec<Event>> {
    let events = store.events().context("loading events")?;
    let user = store
        .user(user_id)
        .context("loading user")?
        .ok_or_else(|| anyhow::anyhow!("unknown user: {user_id}"))?;
    let filters = store
        .filters(user_id)
        .context("loading filter preference")?
        .unwrap_or_default();

    let distance_map = geocoder
        .distance_map(user.location.as_deref(), &events)
        .await;

    Ok(query::filter_events(
        &events,
        &user.events,
        search,
        &filters,
        sort,
        user.availability.as_ref(),
        &distance_map,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn seed_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        let now = Utc::now();
        let events = vec![
            Event {
                id: "evt-late".to_string(),
                name: "Late Show".to_string(),
                location: "place-late".to_string(),
                description: String::new(),
                host: "user-1".to_string(),
                start: (now + Duration::days(9)).to_rfc3339(),
                end: (now + Duration::days(9) + Duration::hours(2)).to_rfc3339(),
                category: EventCategory::Entertainment,
                price: EventPrice::High,
            },
            Event {
                id: "evt-soon".to_string(),
                name: "Morning Yoga".to_string(),
                location: "place-soon".to_string(),
                description: String::new(),
                host: "user-1".to_string(),
                start: (now + Duration::days(1)).to_rfc3339(),
                end: (now + Duration::days(1) + Duration::hours(1)).to_rfc3339(),
                category: EventCategory::Fitness,
                price: EventPrice::Free,
            },
            Event {
                id: "evt-old".to_string(),
                name: "Last Week".to_string(),
                location: "place-old".to_string(),
                description: String::new(),
                host: "user-1".to_string(),
                start: (now - Duration::days(7)).to_rfc3339(),
                end: (now - Duration::days(7) + Duration::hours(1)).to_rfc3339(),
                category: EventCategory::Creative,
                price: EventPrice::Low,
            },
        ];
        store.save_events(&events).unwrap();
        store
            .save_user(&User {
                id: "user-1".to_string(),
                name: "Viewer".to_string(),
                location: None,
                availability: None,
                events: vec![UserEvent {
                    id: "evt-late".to_string(),
                    status: Status::Interested,
                    kind: EventKind::Rsvp,
                }],
            })
            .unwrap();
        store
    }

    #[tokio::test]
    async fn discover_returns_upcoming_events_date_ordered() {
        let store = seed_store();
        let geocoder = Geocoder::new("");
        let out = discover(&store, "user-1", "", Sort::Date, &geocoder)
            .await
            .unwrap();
        let ids: Vec<&str> = out.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["evt-soon", "evt-late"]);
    }

    #[tokio::test]
    async fn discover_applies_the_stored_filter_preference() {
        let store = seed_store();
        let mut filters = Filters::default();
        filters.categories = vec![EventCategory::Fitness];
        store.save_filters("user-1", &filters).unwrap();

        let geocoder = Geocoder::new("");
        let out = discover(&store, "user-1", "", Sort::Date, &geocoder)
            .await
            .unwrap();
        let ids: Vec<&str> = out.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["evt-soon"]);
    }

    #[tokio::test]
    async fn discover_rejects_unknown_users() {
        let store = seed_store();
        let geocoder = Geocoder::new("");
        let result = discover(&store, "nobody", "", Sort::Date, &geocoder).await;
        assert!(result.is_err());
    }
}
