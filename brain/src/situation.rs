use serde::{Deserialize, Serialize};

use crate::context::{Context, EntityKind};
use crate::goal::Goal;

pub const DEFAULT_LOW_HEALTH: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Situation {
    LowHealthCombat,
    EnemyDetected,
    LootAvailable,
    Stuck,
    EventActive,
    FishingSpot,
    FishCaught,
    SeekWater,
    Overweight,
    VendorNearby,
    JunkVisible,
    NormalExploration,
}

/// Bucket used by the deterministic fallback table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarseSignal {
    Threat,
    Orientation,
    Loot,
    Clear,
}

impl Situation {
    pub const ALL: [Situation; 12] = [
        Situation::LowHealthCombat,
        Situation::EnemyDetected,
        Situation::LootAvailable,
        Situation::Stuck,
        Situation::EventActive,
        Situation::FishingSpot,
        Situation::FishCaught,
        Situation::SeekWater,
        Situation::Overweight,
        Situation::VendorNearby,
        Situation::JunkVisible,
        Situation::NormalExploration,
    ];

    /// Stable key, also used for instant knowledge lookups.
    pub fn key(self) -> &'static str {
        match self {
            Situation::LowHealthCombat => "low_health_combat",
            Situation::EnemyDetected => "enemy_detected",
            Situation::LootAvailable => "loot_available",
            Situation::Stuck => "stuck",
            Situation::EventActive => "event_active",
            Situation::FishingSpot => "fishing_spot",
            Situation::FishCaught => "fish_caught",
            Situation::SeekWater => "seek_water",
            Situation::Overweight => "overweight",
            Situation::VendorNearby => "vendor_nearby",
            Situation::JunkVisible => "junk_visible",
            Situation::NormalExploration => "normal_exploration",
        }
    }

    pub fn signal(self) -> CoarseSignal {
        match self {
            Situation::LowHealthCombat | Situation::EnemyDetected => CoarseSignal::Threat,
            Situation::Stuck | Situation::SeekWater => CoarseSignal::Orientation,
            Situation::LootAvailable
            | Situation::FishCaught
            | Situation::VendorNearby
            | Situation::JunkVisible => CoarseSignal::Loot,
            Situation::EventActive
            | Situation::FishingSpot
            | Situation::Overweight
            | Situation::NormalExploration => CoarseSignal::Clear,
        }
    }
}

/// Maps a context and the enabled goals to exactly one [`Situation`].
#[derive(Clone, Copy, Debug)]
pub struct Classifier {
    pub low_health: f64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            low_health: DEFAULT_LOW_HEALTH,
        }
    }
}

impl Classifier {
    pub fn new(low_health: f64) -> Self {
        Self { low_health }
    }

    /// `active` must be the enabled goals, highest priority first.
    ///
    /// Threats always win over loot, loot over being stuck, and all of those
    /// over goal-specific checks.
    pub fn classify(&self, ctx: &Context, active: &[&Goal]) -> Situation {
        let hostile = ctx.has(EntityKind::Hostile);
        if hostile && ctx.health < self.low_health {
            return Situation::LowHealthCombat;
        }
        if hostile {
            return Situation::EnemyDetected;
        }
        if ctx.has(EntityKind::Loot) && active.iter().any(|g| g.kind.wants_loot()) {
            return Situation::LootAvailable;
        }
        if ctx.flags.stuck {
            return Situation::Stuck;
        }
        active
            .iter()
            .find_map(|g| g.kind.classify_context(g, ctx))
            .unwrap_or(Situation::NormalExploration)
    }
}
