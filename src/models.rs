use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Event {
    pub id: String,
    pub name: String,
    /// Place id of the venue, resolvable through the geocoder.
    pub location: String,
    pub description: String,
    pub host: String,
    pub start: String, // RFC 3339
    pub end: String,   // RFC 3339
    pub category: EventCategory,
    pub price: EventPrice,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventCategory {
    Entertainment,
    Creative,
    #[serde(rename = "Food Related")]
    FoodRelated,
    Fitness,
    Puzzles,
    Travel,
    Charity,
}

impl EventCategory {
    pub const ALL: [EventCategory; 7] = [
        EventCategory::Entertainment,
        EventCategory::Creative,
        EventCategory::FoodRelated,
        EventCategory::Fitness,
        EventCategory::Puzzles,
        EventCategory::Travel,
        EventCategory::Charity,
    ];

    /// Display label, also the text the search box matches against.
    pub fn label(&self) -> &'static str {
        match self {
            EventCategory::Entertainment => "Entertainment",
            EventCategory::Creative => "Creative",
            EventCategory::FoodRelated => "Food Related",
            EventCategory::Fitness => "Fitness",
            EventCategory::Puzzles => "Puzzles",
            EventCategory::Travel => "Travel",
            EventCategory::Charity => "Charity",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPrice {
    Free,
    Low,
    #[serde(rename = "Medium")]
    Med,
    High,
}

impl EventPrice {
    pub const ALL: [EventPrice; 4] = [
        EventPrice::Free,
        EventPrice::Low,
        EventPrice::Med,
        EventPrice::High,
    ];

    /// Position in the fixed order Free < Low < Med < High.
    pub fn ordinal(&self) -> u8 {
        match self {
            EventPrice::Free => 0,
            EventPrice::Low => 1,
            EventPrice::Med => 2,
            EventPrice::High => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventPrice::Free => "Free",
            EventPrice::Low => "$",
            EventPrice::Med => "$$",
            EventPrice::High => "$$$",
        }
    }

    pub fn range_label(&self) -> &'static str {
        match self {
            EventPrice::Free => "Free",
            EventPrice::Low => "$0-$20",
            EventPrice::Med => "$20-$50",
            EventPrice::High => "$50+",
        }
    }
}

/// Discretized viewer-to-venue distance tier.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Distance {
    #[serde(rename = "ONE")]
    One,
    #[serde(rename = "FIVE")]
    Five,
    #[serde(rename = "TEN")]
    Ten,
    #[serde(rename = "TWENTY_FIVE")]
    TwentyFive,
    #[serde(rename = "FIFTY")]
    Fifty,
    #[serde(rename = "OVER_FIFTY")]
    OverFifty,
}

impl Distance {
    pub const ALL: [Distance; 6] = [
        Distance::One,
        Distance::Five,
        Distance::Ten,
        Distance::TwentyFive,
        Distance::Fifty,
        Distance::OverFifty,
    ];

    pub fn ordinal(&self) -> u8 {
        match self {
            Distance::One => 0,
            Distance::Five => 1,
            Distance::Ten => 2,
            Distance::TwentyFive => 3,
            Distance::Fifty => 4,
            Distance::OverFifty => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Distance::One => "< 1km",
            Distance::Five => "< 5km",
            Distance::Ten => "< 10km",
            Distance::TwentyFive => "< 25km",
            Distance::Fifty => "< 50km",
            Distance::OverFifty => "50+ km",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    None,
    Going,
    Interested,
    #[serde(rename = "Can't Go")]
    CantGo,
    Went,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Past,
    Created,
    #[serde(rename = "RSVPd")]
    Rsvp,
}

/// A user's recorded relationship to one event.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserEvent {
    pub id: String,
    pub status: Status,
    pub kind: EventKind,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Place id of the user's home location; `None` disables distance
    /// filtering and sorting entirely.
    pub location: Option<String>,
    pub availability: Option<AvailabilityGrid>,
    pub events: Vec<UserEvent>,
}

/// Weekly free/busy pattern: `[day_of_week (0 = Sunday)][hour_of_day]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvailabilityGrid([[bool; 24]; 7]);

impl AvailabilityGrid {
    pub fn new() -> Self {
        AvailabilityGrid([[false; 24]; 7])
    }

    /// Builds a grid from row data, padding absent slots with `false` and
    /// ignoring anything beyond 7 rows or 24 columns.
    pub fn from_rows(rows: &[Vec<bool>]) -> Self {
        let mut grid = [[false; 24]; 7];
        for (day, row) in rows.iter().take(7).enumerate() {
            for (hour, free) in row.iter().take(24).enumerate() {
                grid[day][hour] = *free;
            }
        }
        AvailabilityGrid(grid)
    }

    pub fn is_free(&self, day: usize, hour: usize) -> bool {
        self.0
            .get(day)
            .and_then(|row| row.get(hour))
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, day: usize, hour: usize, free: bool) {
        if day < 7 && hour < 24 {
            self.0[day][hour] = free;
        }
    }
}

impl Default for AvailabilityGrid {
    fn default() -> Self {
        AvailabilityGrid::new()
    }
}

impl Serialize for AvailabilityGrid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<Vec<bool>> = self.0.iter().map(|row| row.to_vec()).collect();
        rows.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AvailabilityGrid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<Vec<bool>>::deserialize(deserializer)?;
        Ok(AvailabilityGrid::from_rows(&rows))
    }
}

/// User-configured inclusion predicates. Membership is explicit: an empty
/// category/price list passes nothing.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Filters {
    pub only_available: bool,
    pub hide_cant_go: bool,
    pub categories: Vec<EventCategory>,
    pub prices: Vec<EventPrice>,
    pub distances: Vec<Distance>,
}

impl Default for Filters {
    fn default() -> Self {
        Filters {
            only_available: false,
            hide_cant_go: false,
            categories: EventCategory::ALL.to_vec(),
            prices: EventPrice::ALL.to_vec(),
            distances: Distance::ALL.to_vec(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Sort {
    #[default]
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "DISTANCE_ASC")]
    DistanceAsc,
    #[serde(rename = "DISTANCE_DES")]
    DistanceDesc,
    #[serde(rename = "PRICE_ASC")]
    PriceAsc,
    #[serde(rename = "PRICE_DES")]
    PriceDesc,
}
