//! Per-cycle snapshot of the game as the agent sees it.

use chrono::{DateTime, Utc};
use sensor::{Detection, Frame, Position, Size};
use serde::Serialize;

const HOSTILE: &[&str] = &[
    "person", "creature", "enemy", "ghoul", "scorched", "mutant", "raider", "robot", "rat",
    "dog", "bear", "wolf", "deathclaw",
];
const LOOT: &[&str] = &[
    "container", "loot", "backpack", "handbag", "suitcase", "bag", "box", "crate", "chest",
];
const JUNK: &[&str] = &[
    "junk", "bottle", "cup", "bowl", "vase", "clock", "scissors", "toaster",
];

/// Resource fraction under which components count as scarce.
const SCARCE_BELOW: f64 = 0.2;

const VENDOR: &[&str] = &["vendor", "merchant", "trader"];
const WATER: &[&str] = &["water", "lake", "river", "pond"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Hostile,
    Loot,
    Junk,
    Vendor,
    Water,
    Neutral,
}

impl EntityKind {
    /// Bucket a detector label by its words, ignoring case and plurals.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_ascii_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let any = |table: &[&str]| {
            words.iter().any(|w| {
                table.contains(w) || w.strip_suffix('s').is_some_and(|s| table.contains(&s))
            })
        };
        if any(HOSTILE) {
            EntityKind::Hostile
        } else if any(LOOT) {
            EntityKind::Loot
        } else if any(JUNK) {
            EntityKind::Junk
        } else if any(VENDOR) {
            EntityKind::Vendor
        } else if any(WATER) {
            EntityKind::Water
        } else {
            EntityKind::Neutral
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entity {
    pub label: String,
    pub kind: EntityKind,
    pub position: Position,
    pub size: Size,
}

impl From<&Detection> for Entity {
    fn from(d: &Detection) -> Self {
        Self {
            label: d.label.clone(),
            kind: EntityKind::from_label(&d.label),
            position: d.position,
            size: d.size,
        }
    }
}

impl Entity {
    pub fn describe(&self) -> String {
        format!(
            "{} {}, {}",
            self.label,
            self.position.describe(),
            self.size.describe()
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Flags {
    pub event_active: bool,
    pub near_water: bool,
    pub fish_caught: bool,
    pub stuck: bool,
    pub vendor_nearby: bool,
    pub scarce_resources: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Context {
    pub location: Option<String>,
    /// Whether the atlas had seen `location` before this cycle.
    pub location_known: bool,
    pub health: f64,
    pub weight_ratio: f64,
    pub resource_ratio: f64,
    pub entities: Vec<Entity>,
    pub flags: Flags,
    pub timestamp: DateTime<Utc>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            location: None,
            location_known: false,
            health: 1.0,
            weight_ratio: 0.0,
            resource_ratio: 1.0,
            entities: Vec::new(),
            flags: Flags::default(),
            timestamp: Utc::now(),
        }
    }
}

impl Context {
    /// Build a snapshot from a perception frame.
    ///
    /// HUD units are resolved by [`Hud`] itself. Vendor and water detections
    /// raise the matching flags even when the HUD does not.
    pub fn from_frame(frame: &Frame, location_known: impl Fn(&str) -> bool) -> Self {
        let entities: Vec<Entity> = frame.objects.iter().map(Entity::from).collect();
        let hud = frame.hud.clone().unwrap_or_default();
        let location = hud
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case("unknown"))
            .map(str::to_string);
        let resource_ratio = hud.resource_fraction().unwrap_or(1.0);
        let known = location.as_deref().is_some_and(location_known);
        let flags = Flags {
            event_active: hud.event_active,
            near_water: hud.near_water || entities.iter().any(|e| e.kind == EntityKind::Water),
            fish_caught: hud.fish_caught,
            stuck: hud.stuck,
            vendor_nearby: entities.iter().any(|e| e.kind == EntityKind::Vendor),
            scarce_resources: hud.scarce_resources || resource_ratio < SCARCE_BELOW,
        };
        Self {
            location,
            location_known: known,
            health: hud.health_fraction().unwrap_or(1.0),
            weight_ratio: hud.weight_fraction().unwrap_or(0.0),
            resource_ratio,
            entities,
            flags,
            timestamp: frame.captured_at,
        }
    }

    pub fn with_entity(mut self, label: &str) -> Self {
        self.entities.push(Entity::from(&Detection::new(
            label,
            Position::Center,
            Size::Large,
        )));
        self
    }

    pub fn with_health(mut self, health: f64) -> Self {
        self.health = unit(health);
        self
    }

    pub fn with_weight(mut self, weight_ratio: f64) -> Self {
        self.weight_ratio = unit(weight_ratio);
        self
    }

    pub fn with_location(mut self, name: &str, known: bool) -> Self {
        self.location = Some(name.to_string());
        self.location_known = known;
        self
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind == kind).count()
    }

    pub fn has(&self, kind: EntityKind) -> bool {
        self.entities.iter().any(|e| e.kind == kind)
    }

    pub fn hostiles(&self) -> usize {
        self.count(EntityKind::Hostile)
    }

    pub fn vendor_nearby(&self) -> bool {
        self.flags.vendor_nearby || self.has(EntityKind::Vendor)
    }
}

fn unit(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
