//! Decision core of the agent.
//!
//! Goals live in a [`GoalRegistry`]; each cycle a [`Context`] is built from
//! a perception frame, the [`Classifier`] reduces it to one [`Situation`],
//! and the [`Router`] climbs its tiers until it has an [`ActionPlan`].
//! [`Pipeline`] strings these together. An [`Atlas`] of visited places and
//! an [`ItemBook`] of item advice feed the prompts.

pub mod atlas;
pub mod complexity;
pub mod context;
pub mod fallback;
pub mod generator;
pub mod goal;
pub mod items;
pub mod pipeline;
pub mod plan;
pub mod prompt;
pub mod registry;
pub mod router;
pub mod situation;

pub use atlas::{Atlas, LocationKind, LocationRecord};
pub use complexity::{ComplexityInputs, ComplexityWeights};
pub use context::{Context, Entity, EntityKind, Flags};
pub use fallback::{fallback_plan, InstantTable, Partition};
pub use generator::GoalGenerator;
pub use goal::{builtin_goals, Goal, GoalError, GoalKind, DEFAULT_GOAL_ID};
pub use items::{Disposition, ItemAdvice, ItemBook, ItemError, ItemRecord, ITEMS_FILE};
pub use pipeline::Pipeline;
pub use plan::{ActionPlan, PlanEntry, Provenance};
pub use registry::GoalRegistry;
pub use router::{BackendHealth, Decision, Router, RouterConfig, TierError};
pub use situation::{Classifier, CoarseSignal, Situation};
