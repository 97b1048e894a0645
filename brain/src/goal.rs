//! Goals the operator can switch on and off, and the per-kind behaviour
//! behind them.

use chrono::{DateTime, Utc};
use motor::Action;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::context::{Context, EntityKind};
use crate::plan::{ActionPlan, PlanEntry, Provenance};
use crate::situation::Situation;

/// Id of the exploration goal that is always enabled.
pub const DEFAULT_GOAL_ID: &str = "explore_and_map";

const DEFAULT_WEIGHT_THRESHOLD: f64 = 0.8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GoalError {
    #[error("goal {0:?} not found")]
    NotFound(String),
    #[error("goal {0:?} already exists")]
    Duplicate(String),
    #[error("goal {0:?} is permanent")]
    Permanent(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    PublicEvents,
    Inventory,
    Fishing,
    DailyChallenges,
    VendorRounds,
    ResourceFarming,
    CampMaintenance,
    Exploration,
    Custom,
}

impl GoalKind {
    /// Contribution of this goal to the escalation score.
    pub fn base_weight(self) -> f64 {
        match self {
            GoalKind::PublicEvents => 0.6,
            GoalKind::Inventory => 0.4,
            GoalKind::Fishing => 0.2,
            GoalKind::DailyChallenges
            | GoalKind::VendorRounds
            | GoalKind::ResourceFarming
            | GoalKind::CampMaintenance
            | GoalKind::Exploration
            | GoalKind::Custom => 0.0,
        }
    }

    /// Whether visible loot is worth stopping for under this goal.
    pub fn wants_loot(self) -> bool {
        matches!(self, GoalKind::Inventory | GoalKind::ResourceFarming)
    }

    pub fn is_eligible(self, goal: &Goal, ctx: &Context) -> bool {
        match self {
            GoalKind::PublicEvents => ctx.flags.event_active,
            GoalKind::Inventory => {
                ctx.weight_ratio
                    >= goal
                        .condition_f64("weight_threshold")
                        .unwrap_or(DEFAULT_WEIGHT_THRESHOLD)
            }
            GoalKind::Fishing => !ctx.flags.event_active && ctx.flags.near_water,
            _ => true,
        }
    }

    /// Goal-specific situation, consulted after the threat, loot and stuck
    /// checks.
    pub fn classify_context(self, goal: &Goal, ctx: &Context) -> Option<Situation> {
        match self {
            GoalKind::PublicEvents => ctx.flags.event_active.then_some(Situation::EventActive),
            GoalKind::Fishing => Some(if ctx.flags.fish_caught {
                Situation::FishCaught
            } else if ctx.flags.near_water {
                Situation::FishingSpot
            } else {
                Situation::SeekWater
            }),
            GoalKind::Inventory => {
                let threshold = goal
                    .condition_f64("weight_threshold")
                    .unwrap_or(DEFAULT_WEIGHT_THRESHOLD);
                if ctx.weight_ratio >= threshold {
                    Some(Situation::Overweight)
                } else if ctx.vendor_nearby() {
                    Some(Situation::VendorNearby)
                } else if ctx.has(EntityKind::Junk) {
                    Some(Situation::JunkVisible)
                } else {
                    None
                }
            }
            GoalKind::VendorRounds => ctx.vendor_nearby().then_some(Situation::VendorNearby),
            GoalKind::ResourceFarming => ctx.has(EntityKind::Junk).then_some(Situation::JunkVisible),
            GoalKind::DailyChallenges
            | GoalKind::CampMaintenance
            | GoalKind::Exploration
            | GoalKind::Custom => None,
        }
    }

    pub fn default_entry(self) -> PlanEntry {
        match self {
            GoalKind::PublicEvents => PlanEntry::new(Action::Map, 1.0, "check map for the event"),
            GoalKind::Fishing => PlanEntry::new(Action::Attack, 5.0, "cast line"),
            GoalKind::Inventory => PlanEntry::new(Action::PipBoy, 1.0, "open inventory"),
            GoalKind::DailyChallenges
            | GoalKind::VendorRounds
            | GoalKind::ResourceFarming
            | GoalKind::CampMaintenance
            | GoalKind::Exploration
            | GoalKind::Custom => PlanEntry::new(Action::Forward, 2.0, "continue exploration"),
        }
    }

    /// What to do for this goal when nothing more specific applies.
    pub fn default_plan(self) -> ActionPlan {
        self.default_entry().to_plan(Provenance::Fallback)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: GoalKind,
    pub priority: i32,
    pub enabled: bool,
    #[serde(default)]
    pub conditions: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_context: Option<String>,
    #[serde(default)]
    pub successes: u64,
    #[serde(default)]
    pub failures: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_outcome_at: Option<DateTime<Utc>>,
}

impl Goal {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: GoalKind, priority: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            kind,
            priority,
            enabled: false,
            conditions: Map::new(),
            ai_context: None,
            successes: 0,
            failures: 0,
            last_outcome_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_condition(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.conditions.insert(key.to_string(), value.into());
        self
    }

    pub fn with_ai_context(mut self, context: impl Into<String>) -> Self {
        self.ai_context = Some(context.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn condition_f64(&self, key: &str) -> Option<f64> {
        self.conditions.get(key).and_then(Value::as_f64)
    }

    /// Enabled and its kind's condition holds for `ctx`.
    pub fn is_eligible(&self, ctx: &Context) -> bool {
        self.enabled && self.kind.is_eligible(self, ctx)
    }

    pub fn record(&mut self, success: bool) {
        if success {
            self.successes = self.successes.saturating_add(1);
        } else {
            self.failures = self.failures.saturating_add(1);
        }
        self.last_outcome_at = Some(Utc::now());
    }
}

/// Goals every registry starts with, in registration order.
pub fn builtin_goals() -> Vec<Goal> {
    vec![
        Goal::new("do_public_events", "Public Events", GoalKind::PublicEvents, 8)
            .with_description("Join and complete public events when one is running")
            .with_condition("min_level", 5),
        Goal::new("manage_inventory", "Manage Inventory", GoalKind::Inventory, 5)
            .with_description("Keep carry weight under control by stashing, scrapping or selling")
            .with_condition("weight_threshold", DEFAULT_WEIGHT_THRESHOLD)
            .with_condition("caps_threshold", 1000),
        Goal::new("fishing", "Fishing", GoalKind::Fishing, 3)
            .with_description("Fish at nearby water when nothing else is going on"),
        Goal::new("daily_challenges", "Daily Challenges", GoalKind::DailyChallenges, 6)
            .with_description("Work through the daily challenge list")
            .with_condition("max_time", 900),
        Goal::new("vendor_rounds", "Vendor Rounds", GoalKind::VendorRounds, 4)
            .with_description("Visit vendors to sell surplus for caps")
            .with_condition("min_caps", 500)
            .with_condition("check_frequency", 3600),
        Goal::new("resource_farming", "Resource Farming", GoalKind::ResourceFarming, 2)
            .with_description("Collect junk for scarce crafting components")
            .with_condition("target_resources", json!(["screws", "springs", "adhesive"])),
        Goal::new("camp_maintenance", "C.A.M.P. Maintenance", GoalKind::CampMaintenance, 1)
            .with_description("Repair and restock the player camp")
            .with_condition("check_frequency", 1800),
        Goal::new(DEFAULT_GOAL_ID, "Explore and Map", GoalKind::Exploration, 1)
            .with_description("Wander, discover new locations and map the world")
            .with_condition("discovery_radius", 100)
            .enabled(true),
    ]
}
