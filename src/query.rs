use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Datelike, Local, Timelike, Utc};

use crate::models::{AvailabilityGrid, Distance, Event, Filters, Sort, Status, UserEvent};

/// Event id -> resolved distance bucket. A `None` value means the lookup for
/// that event failed; an empty map means the viewer has no location at all.
pub type DistanceMap = HashMap<String, Option<Distance>>;

/// Whether the viewer is free when the event starts, against their weekly
/// grid. Three-valued: `None` when the grid is absent or the timestamp does
/// not parse, which callers must treat as "unknown" rather than busy.
pub fn is_available(start: &str, grid: Option<&AvailabilityGrid>) -> Option<bool> {
    let grid = grid?;
    let start = parse_rfc3339(start)?;
    let local = start.with_timezone(&Local);
    let day = local.weekday().num_days_from_sunday() as usize;
    let hour = local.hour() as usize;
    Some(grid.is_free(day, hour))
}

/// Computes the viewer-visible, filtered, ordered event list. Pure: the input
/// slice is never mutated and identical inputs produce identical output.
pub fn filter_events(
    events: &[Event],
    user_events: &[UserEvent],
    search: &str,
    filters: &Filters,
    sort: Sort,
    availability: Option<&AvailabilityGrid>,
    distance_map: &DistanceMap,
) -> Vec<Event> {
    let now = Utc::now();
    let needle = search.to_lowercase();

    let kept: Vec<Event> = events
        .iter()
        .filter(|event| {
            if !needle.is_empty() && !matches_search(event, &needle) {
                return false;
            }
            // Past events never appear in discovery, whatever the filters say.
            if let Some(start) = parse_rfc3339(&event.start) {
                if start < now {
                    return false;
                }
            }
            if filters.hide_cant_go && status_for(user_events, &event.id) == Some(Status::CantGo) {
                return false;
            }
            // The one place the three-valued availability collapses: unknown
            // fails closed here.
            if filters.only_available && is_available(&event.start, availability) != Some(true) {
                return false;
            }
            // Hard membership checks; an empty allowed list passes nothing.
            if !filters.categories.contains(&event.category)
                || !filters.prices.contains(&event.price)
            {
                return false;
            }
            // Distance only constrains when the viewer has a location and
            // this event's bucket actually resolved.
            if !distance_map.is_empty() {
                if let Some(Some(bucket)) = distance_map.get(&event.id) {
                    if !filters.distances.contains(bucket) {
                        return false;
                    }
                }
            }
            true
        })
        .cloned()
        .collect();

    sort_events(kept, sort, distance_map)
}

/// Stable sort by the requested mode. Distance modes sort on a total key:
/// resolved buckets in the requested direction, unresolved events after them,
/// with date ascending breaking every tie. Partial location data therefore
/// yields one deterministic order and can never panic the sort.
pub fn sort_events(mut events: Vec<Event>, sort: Sort, distance_map: &DistanceMap) -> Vec<Event> {
    let now = Utc::now();
    match sort {
        Sort::Date => events.sort_by_key(|event| start_or_now(event, now)),
        Sort::PriceAsc => events.sort_by_key(|event| event.price.ordinal()),
        Sort::PriceDesc => events.sort_by_key(|event| Reverse(event.price.ordinal())),
        Sort::DistanceAsc => events.sort_by_key(|event| {
            (
                bucket_rank(event, distance_map, false),
                start_or_now(event, now),
            )
        }),
        Sort::DistanceDesc => events.sort_by_key(|event| {
            (
                bucket_rank(event, distance_map, true),
                start_or_now(event, now),
            )
        }),
    }
    events
}

// Primary distance-sort key. Events whose bucket never resolved rank after
// every resolved bucket in either direction, where the date component orders
// them among themselves.
fn bucket_rank(event: &Event, distance_map: &DistanceMap, descending: bool) -> u8 {
    let last = Distance::ALL.len() as u8 - 1;
    match distance_map.get(&event.id).copied().flatten() {
        Some(bucket) if descending => last - bucket.ordinal(),
        Some(bucket) => bucket.ordinal(),
        None => u8::MAX,
    }
}

fn matches_search(event: &Event, needle: &str) -> bool {
    event.name.to_lowercase().contains(needle)
        || event.category.label().to_lowercase().contains(needle)
}

fn status_for(user_events: &[UserEvent], event_id: &str) -> Option<Status> {
    user_events
        .iter()
        .find(|record| record.id == event_id)
        .map(|record| record.status)
}

fn parse_rfc3339(timestamp: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn start_or_now(event: &Event, now: DateTime<Utc>) -> DateTime<Utc> {
    parse_rfc3339(&event.start).unwrap_or(now)
}
