//! Places the agent has already been.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Event,
    Vendor,
    Fishing,
    Crafting,
    General,
}

impl LocationKind {
    pub fn classify(name: &str, event_active: bool) -> Self {
        let lower = name.to_ascii_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
        if event_active {
            LocationKind::Event
        } else if has(&["station", "vendor", "trading", "market"]) {
            LocationKind::Vendor
        } else if has(&["lake", "river", "pond", "creek", "lagoon", "bay"]) {
            LocationKind::Fishing
        } else if has(&["workshop", "camp", "workbench", "factory"]) {
            LocationKind::Crafting
        } else {
            LocationKind::General
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocationRecord {
    /// As first seen on the HUD.
    pub name: String,
    pub kind: LocationKind,
    pub visits: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct Atlas {
    places: BTreeMap<String, LocationRecord>,
}

impl Atlas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.places.contains_key(&normalize(name))
    }

    pub fn get(&self, name: &str) -> Option<&LocationRecord> {
        self.places.get(&normalize(name))
    }

    /// Every place, ordered by normalized name.
    pub fn records(&self) -> impl Iterator<Item = &LocationRecord> {
        self.places.values()
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Note a visit. Returns true the first time a place is seen.
    pub fn visit(&mut self, name: &str, event_active: bool, at: DateTime<Utc>) -> bool {
        let key = normalize(name);
        match self.places.get_mut(&key) {
            Some(record) => {
                record.visits = record.visits.saturating_add(1);
                record.last_seen = at;
                if event_active {
                    record.kind = LocationKind::Event;
                }
                false
            }
            None => {
                self.places.insert(
                    key,
                    LocationRecord {
                        name: name.trim().to_string(),
                        kind: LocationKind::classify(name, event_active),
                        visits: 1,
                        first_seen: at,
                        last_seen: at,
                    },
                );
                true
            }
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
