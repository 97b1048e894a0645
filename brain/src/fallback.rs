//! Canned plans: the instant table consulted first and the fallback table
//! consulted last.

use std::collections::HashMap;

use motor::Action;

use crate::goal::GoalKind;
use crate::plan::{ActionPlan, PlanEntry, Provenance};
use crate::situation::Situation;

const RETREAT: PlanEntry = PlanEntry::new(Action::Backward, 3.0, "retreat to safety");
const ENGAGE: PlanEntry = PlanEntry::new(Action::Vats, 0.1, "engage detected threat");
const UNSTUCK: PlanEntry = PlanEntry::new(Action::Backward, 1.0, "back away from obstacle");
const SCAN: PlanEntry = PlanEntry::new(Action::SmoothLook, 1.0, "look around to get bearings");
const INVESTIGATE: PlanEntry = PlanEntry::new(Action::Interact, 1.0, "investigate nearby object");
const COLLECT: PlanEntry = PlanEntry::new(Action::Interact, 0.5, "collect resources");
const EXPLORE: PlanEntry = PlanEntry::new(Action::Forward, 2.0, "continue exploration");

/// Situations answered without consulting any model.
#[derive(Clone, Debug)]
pub struct InstantTable {
    entries: HashMap<Situation, PlanEntry>,
}

impl Default for InstantTable {
    fn default() -> Self {
        Self::empty()
            .with(Situation::LowHealthCombat, RETREAT)
            .with(Situation::LootAvailable, COLLECT)
            .with(Situation::Stuck, UNSTUCK)
    }
}

impl InstantTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with(mut self, situation: Situation, entry: PlanEntry) -> Self {
        self.entries.insert(situation, entry);
        self
    }

    pub fn without(mut self, situation: Situation) -> Self {
        self.entries.remove(&situation);
        self
    }

    pub fn get(&self, situation: Situation) -> Option<ActionPlan> {
        self.entries
            .get(&situation)
            .map(|e| e.to_plan(Provenance::Instant))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Partition {
    Combat,
    Orientation,
    Investigation,
    Exploration,
    Default,
}

pub fn partition(situation: Situation) -> Partition {
    match situation {
        Situation::LowHealthCombat | Situation::EnemyDetected => Partition::Combat,
        Situation::Stuck | Situation::SeekWater => Partition::Orientation,
        Situation::LootAvailable
        | Situation::FishCaught
        | Situation::VendorNearby
        | Situation::JunkVisible => Partition::Investigation,
        Situation::NormalExploration => Partition::Exploration,
        Situation::EventActive | Situation::FishingSpot | Situation::Overweight => {
            Partition::Default
        }
    }
}

/// Deterministic last resort. Every situation is listed so that a new
/// variant fails to compile until it has an entry.
pub fn fallback_plan(situation: Situation, goal: GoalKind) -> ActionPlan {
    let entry = match situation {
        // combat
        Situation::LowHealthCombat => RETREAT,
        Situation::EnemyDetected => ENGAGE,
        // orientation
        Situation::Stuck => UNSTUCK,
        Situation::SeekWater => SCAN,
        // investigation
        Situation::LootAvailable
        | Situation::FishCaught
        | Situation::VendorNearby
        | Situation::JunkVisible => INVESTIGATE,
        // exploration
        Situation::NormalExploration => match goal {
            GoalKind::Exploration => EXPLORE,
            other => other.default_entry(),
        },
        // default
        Situation::EventActive => GoalKind::PublicEvents.default_entry(),
        Situation::FishingSpot => GoalKind::Fishing.default_entry(),
        Situation::Overweight => GoalKind::Inventory.default_entry(),
    };
    entry.to_plan(Provenance::Fallback)
}
