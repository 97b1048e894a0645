use llm::ExtractedPlan;
use motor::Action;
use serde::{Deserialize, Serialize};

/// Which router tier produced a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Instant,
    Strategic,
    Local,
    Fallback,
}

/// One action to perform this cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub action: String,
    pub duration: f64,
    pub reason: String,
    pub provenance: Provenance,
}

impl ActionPlan {
    pub fn new(
        action: Action,
        duration: f64,
        reason: impl Into<String>,
        provenance: Provenance,
    ) -> Self {
        Self {
            action: action.name().to_string(),
            duration,
            reason: reason.into(),
            provenance,
        }
    }

    /// Wrap a model answer. The action name is passed through unchecked;
    /// the motor rejects names outside the vocabulary.
    pub fn from_extracted(plan: ExtractedPlan, provenance: Provenance) -> Self {
        Self {
            action: plan.action.to_ascii_uppercase(),
            duration: plan.duration,
            reason: plan.reason,
            provenance,
        }
    }
}

/// A table row: a plan without provenance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanEntry {
    pub action: Action,
    pub duration: f64,
    pub reason: &'static str,
}

impl PlanEntry {
    pub const fn new(action: Action, duration: f64, reason: &'static str) -> Self {
        Self {
            action,
            duration,
            reason,
        }
    }

    pub fn to_plan(self, provenance: Provenance) -> ActionPlan {
        ActionPlan::new(self.action, self.duration, self.reason, provenance)
    }
}
