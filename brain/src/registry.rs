use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::context::Context;
use crate::goal::{builtin_goals, Goal, GoalError, GoalKind, DEFAULT_GOAL_ID};

/// The set of goals, kept in insertion order.
///
/// Insertion order breaks priority ties. The permanent default goal can be
/// neither disabled nor removed.
#[derive(Clone, Debug)]
pub struct GoalRegistry {
    goals: Vec<Goal>,
    default_id: String,
}

impl Default for GoalRegistry {
    fn default() -> Self {
        Self::new(builtin_goals(), DEFAULT_GOAL_ID)
    }
}

impl GoalRegistry {
    /// Build a registry. Later goals reusing an id are dropped. The goal
    /// named `default_id` is created as a plain exploration goal if
    /// missing, and forced on.
    pub fn new(goals: impl IntoIterator<Item = Goal>, default_id: &str) -> Self {
        let mut registry = Self {
            goals: Vec::new(),
            default_id: default_id.to_string(),
        };
        for goal in goals {
            if let Err(e) = registry.add(goal) {
                warn!(error = %e, "skipping goal");
            }
        }
        if registry.position(default_id).is_none() {
            registry
                .goals
                .push(Goal::new(default_id, "Explore", GoalKind::Exploration, 1));
        }
        if let Some(i) = registry.position(default_id) {
            registry.goals[i].enabled = true;
        }
        registry
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.goals.iter().position(|g| g.id == id)
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn get(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn default_goal(&self) -> &Goal {
        // the constructor guarantees presence
        let i = self.position(&self.default_id).unwrap_or(0);
        &self.goals[i]
    }

    /// Enabled goals, highest priority first, insertion order among equals.
    pub fn active_goals(&self) -> Vec<&Goal> {
        let mut active: Vec<&Goal> = self.goals.iter().filter(|g| g.enabled).collect();
        active.sort_by(|a, b| b.priority.cmp(&a.priority));
        active
    }

    pub fn list_active(&self) -> Vec<String> {
        self.active_goals().into_iter().map(|g| g.id.clone()).collect()
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), GoalError> {
        if id == self.default_id && !enabled {
            return Err(GoalError::Permanent(id.to_string()));
        }
        let i = self
            .position(id)
            .ok_or_else(|| GoalError::NotFound(id.to_string()))?;
        if self.goals[i].enabled != enabled {
            info!(goal = id, enabled, "goal toggled");
        }
        self.goals[i].enabled = enabled;
        Ok(())
    }

    /// Apply several toggles. Unknown or refused ids are reported `false`.
    pub fn set_many(&mut self, changes: &BTreeMap<String, bool>) -> BTreeMap<String, bool> {
        changes
            .iter()
            .map(|(id, enabled)| (id.clone(), self.set_enabled(id, *enabled).is_ok()))
            .collect()
    }

    /// The enabled goal with the highest priority whose condition holds.
    pub fn highest_priority_active(&self, ctx: &Context) -> Option<&Goal> {
        // max_by_key returns the last of equal maxima; iterate reversed so
        // the earliest inserted wins
        self.goals
            .iter()
            .rev()
            .filter(|g| g.is_eligible(ctx))
            .max_by_key(|g| g.priority)
    }

    /// [`Self::highest_priority_active`], or the permanent default.
    pub fn current(&self, ctx: &Context) -> &Goal {
        self.highest_priority_active(ctx)
            .unwrap_or_else(|| self.default_goal())
    }

    pub fn add(&mut self, goal: Goal) -> Result<(), GoalError> {
        if self.position(&goal.id).is_some() {
            return Err(GoalError::Duplicate(goal.id));
        }
        info!(goal = %goal.id, priority = goal.priority, "goal added");
        self.goals.push(goal);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<Goal, GoalError> {
        if id == self.default_id {
            return Err(GoalError::Permanent(id.to_string()));
        }
        let i = self
            .position(id)
            .ok_or_else(|| GoalError::NotFound(id.to_string()))?;
        info!(goal = id, "goal removed");
        Ok(self.goals.remove(i))
    }

    pub fn record_outcome(&mut self, id: &str, success: bool) -> Result<(), GoalError> {
        let i = self
            .position(id)
            .ok_or_else(|| GoalError::NotFound(id.to_string()))?;
        self.goals[i].record(success);
        Ok(())
    }
}
