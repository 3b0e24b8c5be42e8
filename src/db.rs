use std::path::Path;

use chrono::{Duration, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;

use crate::models::{
    AvailabilityGrid, Event, EventCategory, EventKind, EventPrice, Filters, Status, User,
    UserEvent,
};
use crate::utils;

/// String-key/JSON-value document store. Each collection lives under its own
/// key: `events`, `user:<id>`, `filters:<id>`.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open_default() -> rusqlite::Result<Self> {
        let path = utils::database_path();
        utils::ensure_parent(&path);
        Store::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        store.seed_if_empty()?;
        Ok(store)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents(
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at_utc TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn seed_if_empty(&self) -> rusqlite::Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        self.save_events(&sample_events())?;
        self.save_user(&sample_user())?;
        Ok(())
    }

    pub fn get_raw(&self, key: &str) -> rusqlite::Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM documents WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn set_raw(&self, key: &str, value: &str) -> rusqlite::Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO documents (key, value, updated_at_utc)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at_utc = excluded.updated_at_utc",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn events(&self) -> rusqlite::Result<Vec<Event>> {
        match self.get_raw("events")? {
            Some(payload) => decode(&payload),
            None => Ok(Vec::new()),
        }
    }

    pub fn save_events(&self, events: &[Event]) -> rusqlite::Result<()> {
        let payload = serde_json::to_string(events).expect("event serialization");
        self.set_raw("events", &payload)
    }

    pub fn user(&self, id: &str) -> rusqlite::Result<Option<User>> {
        match self.get_raw(&format!("user:{id}"))? {
            Some(payload) => decode(&payload).map(Some),
            None => Ok(None),
        }
    }

    pub fn save_user(&self, user: &User) -> rusqlite::Result<()> {
        let payload = serde_json::to_string(user).expect("user serialization");
        self.set_raw(&format!("user:{}", user.id), &payload)
    }

    pub fn filters(&self, user_id: &str) -> rusqlite::Result<Option<Filters>> {
        match self.get_raw(&format!("filters:{user_id}"))? {
            Some(payload) => decode(&payload).map(Some),
            None => Ok(None),
        }
    }

    pub fn save_filters(&self, user_id: &str, filters: &Filters) -> rusqlite::Result<()> {
        let payload = serde_json::to_string(filters).expect("filter serialization");
        self.set_raw(&format!("filters:{user_id}"), &payload)
    }
}

// Corrupt payloads surface as errors; the engine never sees half-decoded
// data.
fn decode<T: DeserializeOwned>(payload: &str) -> rusqlite::Result<T> {
    serde_json::from_str(payload).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            payload.len(),
            rusqlite::types::Type::Text,
            Box::new(err),
        )
    })
}

fn sample_events() -> Vec<Event> {
    let now = Utc::now();
    vec![
        sample_event(
            "evt-trivia",
            "Pub Trivia Night",
            EventCategory::Puzzles,
            EventPrice::Free,
            now + Duration::days(2),
        ),
        sample_event(
            "evt-gallery",
            "Gallery Opening",
            EventCategory::Creative,
            EventPrice::Low,
            now + Duration::days(5),
        ),
        sample_event(
            "evt-marathon",
            "Harbour Fun Run",
            EventCategory::Fitness,
            EventPrice::Med,
            now + Duration::days(12),
        ),
    ]
}

fn sample_event(
    id: &str,
    name: &str,
    category: EventCategory,
    price: EventPrice,
    start: chrono::DateTime<Utc>,
) -> Event {
    Event {
        id: id.to_string(),
        name: name.to_string(),
        location: format!("place-{id}"),
        description: format!("{name} (sample event)"),
        host: "user-demo".to_string(),
        start: start.to_rfc3339(),
        end: (start + Duration::hours(2)).to_rfc3339(),
        category,
        price,
    }
}

fn sample_user() -> User {
    User {
        id: "user-demo".to_string(),
        name: "Demo User".to_string(),
        location: None,
        availability: Some(AvailabilityGrid::new()),
        events: vec![UserEvent {
            id: "evt-trivia".to_string(),
            status: Status::Going,
            kind: EventKind::Created,
        }],
    }
}
