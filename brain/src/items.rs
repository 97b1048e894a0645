//! What the agent knows about items, and what to do with them.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::{Context, EntityKind};

/// File in the knowledge directory holding a JSON array of [`ItemRecord`]s.
pub const ITEMS_FILE: &str = "items.json";

#[derive(Debug, Error)]
pub enum ItemError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed item file: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Keep,
    Sell,
    Scrap,
    Trade,
    LearnThenSell,
    /// Might be a god roll; look before selling.
    Evaluate,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Keep => "keep",
            Disposition::Sell => "sell",
            Disposition::Scrap => "scrap",
            Disposition::Trade => "trade",
            Disposition::LearnThenSell => "learn_then_sell",
            Disposition::Evaluate => "evaluate",
        }
    }

    /// Rule of thumb for an item nobody has recorded.
    pub fn guess(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("plan") {
            Disposition::LearnThenSell
        } else if lower.contains("legendary") {
            Disposition::Evaluate
        } else if lower.contains("scrap") || lower.contains("junk") {
            Disposition::Scrap
        } else {
            Disposition::Sell
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub base_value: u32,
    #[serde(default)]
    pub vendor_value: u32,
    #[serde(default)]
    pub god_roll: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub god_roll_effects: Vec<String>,
    pub action: Disposition,
    #[serde(default)]
    pub rarity: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl ItemRecord {
    pub fn new(name: impl Into<String>, action: Disposition) -> Self {
        Self {
            name: name.into(),
            kind: String::new(),
            base_value: 0,
            vendor_value: 0,
            god_roll: false,
            god_roll_effects: Vec::new(),
            action,
            rarity: String::new(),
            notes: String::new(),
        }
    }

    pub fn god_roll(mut self, effects: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.god_roll = true;
        self.god_roll_effects = effects.into_iter().map(Into::into).collect();
        self
    }
}

/// One line of item advice for a prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemAdvice {
    pub item: String,
    pub action: Disposition,
}

/// Item knowledge keyed by case-insensitive name.
#[derive(Clone, Debug, Default)]
pub struct ItemBook {
    items: BTreeMap<String, ItemRecord>,
}

impl ItemBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> Result<Self, ItemError> {
        let records: Vec<ItemRecord> = serde_json::from_str(raw)?;
        Ok(records.into_iter().collect())
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ItemError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }

    /// Record or replace what is known about an item.
    pub fn learn(&mut self, record: ItemRecord) -> Option<ItemRecord> {
        self.items.insert(normalize(&record.name), record)
    }

    pub fn get(&self, name: &str) -> Option<&ItemRecord> {
        self.items.get(&normalize(name))
    }

    pub fn records(&self) -> impl Iterator<Item = &ItemRecord> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn god_rolls(&self) -> usize {
        self.items.values().filter(|r| r.god_roll).count()
    }

    /// The recorded action, else [`Disposition::guess`].
    pub fn disposition(&self, name: &str) -> Disposition {
        self.get(name)
            .map_or_else(|| Disposition::guess(name), |r| r.action)
    }

    /// Advice for every loot and junk object in view, once per label.
    pub fn advise(&self, ctx: &Context) -> Vec<ItemAdvice> {
        let mut advice: Vec<ItemAdvice> = Vec::new();
        for entity in &ctx.entities {
            if !matches!(entity.kind, EntityKind::Loot | EntityKind::Junk) {
                continue;
            }
            if advice.iter().any(|a| a.item.eq_ignore_ascii_case(&entity.label)) {
                continue;
            }
            let action = match self.get(&entity.label) {
                Some(record) => record.action,
                None if entity.kind == EntityKind::Junk => Disposition::Scrap,
                None => Disposition::guess(&entity.label),
            };
            advice.push(ItemAdvice {
                item: entity.label.clone(),
                action,
            });
        }
        advice
    }
}

impl FromIterator<ItemRecord> for ItemBook {
    fn from_iter<T: IntoIterator<Item = ItemRecord>>(iter: T) -> Self {
        let mut book = Self::new();
        for record in iter {
            book.learn(record);
        }
        book
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
