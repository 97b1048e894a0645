//! Escalation score: how much a situation warrants the strategic model.

use serde::Serialize;

use crate::context::Context;
use crate::goal::Goal;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComplexityWeights {
    pub multiple_hostiles: f64,
    pub unknown_location: f64,
    pub inventory_full: f64,
    pub scarce_resources: f64,
    /// Weight ratio at which the inventory counts as near full.
    pub inventory_full_ratio: f64,
}

impl Default for ComplexityWeights {
    fn default() -> Self {
        Self {
            multiple_hostiles: 0.3,
            unknown_location: 0.2,
            inventory_full: 0.2,
            scarce_resources: 0.2,
            inventory_full_ratio: 0.9,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ComplexityInputs {
    pub goal_weight: f64,
    pub multiple_hostiles: bool,
    pub unknown_location: bool,
    pub full_inventory: bool,
    pub scarce_resource: bool,
}

impl ComplexityInputs {
    pub fn from_context(goal: &Goal, ctx: &Context, weights: &ComplexityWeights) -> Self {
        Self {
            goal_weight: goal.kind.base_weight(),
            multiple_hostiles: ctx.hostiles() > 1,
            unknown_location: !ctx.location_known,
            full_inventory: ctx.weight_ratio >= weights.inventory_full_ratio,
            scarce_resource: ctx.flags.scarce_resources,
        }
    }

    /// Weighted sum clamped to `[0, 1]`.
    pub fn score(&self, weights: &ComplexityWeights) -> f64 {
        let mut total = self.goal_weight;
        if self.multiple_hostiles {
            total += weights.multiple_hostiles;
        }
        if self.unknown_location {
            total += weights.unknown_location;
        }
        if self.full_inventory {
            total += weights.inventory_full;
        }
        if self.scarce_resource {
            total += weights.scarce_resources;
        }
        if total.is_nan() {
            return 0.0;
        }
        total.clamp(0.0, 1.0)
    }
}
