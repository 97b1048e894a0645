//! Tiered decision routing.
//!
//! Each cycle the [`Router`] tries, in order:
//!
//! 0. the instant table,
//! 1. an escalation check (complexity score, backend health, cooldown),
//! 2. the strategic backend, when escalated,
//! 3. the local backend,
//! 4. the deterministic fallback table.
//!
//! Tiers 2 and 3 may fail for any reason; tier 4 cannot, so `route` always
//! yields exactly one plan.

use std::sync::Arc;
use std::time::Duration;

use llm::{extract_plan, generate_within, Backend, BackendError, BackendProfile, ExtractError, Generation};
use memory::{KnowledgeStore, NoKnowledge};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::complexity::{ComplexityInputs, ComplexityWeights};
use crate::context::Context;
use crate::fallback::{fallback_plan, InstantTable};
use crate::goal::Goal;
use crate::items::{ItemAdvice, ItemBook};
use crate::plan::{ActionPlan, Provenance};
use crate::prompt::{local_prompt, strategic_prompt, PromptInput};
use crate::situation::Situation;

#[derive(Debug, Error)]
pub enum TierError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

#[derive(Clone, Debug)]
pub struct RouterConfig {
    pub escalation_threshold: f64,
    pub cooldown: Duration,
    pub strategic_timeout: Duration,
    pub local_timeout: Duration,
    /// Consecutive failures after which a backend is benched.
    pub strategic_failure_limit: u32,
    pub local_failure_limit: u32,
    /// How long a benched backend sits out before it is tried again.
    pub recovery_after: Duration,
    pub knowledge_hits: usize,
    pub weights: ComplexityWeights,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: 0.7,
            cooldown: Duration::from_secs(60),
            strategic_timeout: Duration::from_secs(30),
            local_timeout: Duration::from_secs(5),
            strategic_failure_limit: 3,
            local_failure_limit: 2,
            recovery_after: Duration::from_secs(300),
            knowledge_hits: 3,
            weights: ComplexityWeights::default(),
        }
    }
}

impl RouterConfig {
    /// Defaults with threshold, cooldown and timeout taken from `profile`.
    pub fn from_profile(profile: &BackendProfile) -> Self {
        Self {
            escalation_threshold: profile.escalation_threshold,
            cooldown: profile.cooldown,
            strategic_timeout: profile.timeout,
            ..Self::default()
        }
    }
}

/// Failure bookkeeping for one backend.
#[derive(Clone, Debug, Serialize)]
pub struct BackendHealth {
    pub consecutive_failures: u32,
    pub available: bool,
    #[serde(skip)]
    unavailable_since: Option<Instant>,
}

impl Default for BackendHealth {
    fn default() -> Self {
        Self {
            consecutive_failures: 0,
            available: true,
            unavailable_since: None,
        }
    }
}

impl BackendHealth {
    /// Whether the backend may be called now. A benched backend comes back
    /// after `recovery_after`, one failure short of being benched again.
    fn ready(&mut self, now: Instant, recovery_after: Duration, limit: u32) -> bool {
        if self.available {
            return true;
        }
        match self.unavailable_since {
            Some(since) if now.duration_since(since) >= recovery_after => {
                self.available = true;
                self.unavailable_since = None;
                self.consecutive_failures = limit.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    fn succeeded(&mut self) {
        self.consecutive_failures = 0;
        self.available = true;
        self.unavailable_since = None;
    }

    /// Returns true if this failure benched the backend.
    fn failed(&mut self, limit: u32, now: Instant) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.available && self.consecutive_failures >= limit {
            self.available = false;
            self.unavailable_since = Some(now);
            return true;
        }
        false
    }
}

/// Outcome of one routing pass.
#[derive(Clone, Debug, Serialize)]
pub struct Decision {
    pub plan: ActionPlan,
    pub goal_id: String,
    pub situation: Situation,
    pub complexity: f64,
    /// The strategic backend was asked this cycle.
    pub strategic_attempted: bool,
    /// The strategic backend produced the plan.
    pub escalated: bool,
}

pub struct Router {
    config: RouterConfig,
    profile: BackendProfile,
    instant: InstantTable,
    knowledge: Arc<dyn KnowledgeStore>,
    items: ItemBook,
    strategic: Option<Arc<dyn Backend>>,
    strategic_health: BackendHealth,
    local: Option<Arc<dyn Backend>>,
    local_health: BackendHealth,
    last_strategic_call: Option<Instant>,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            profile: BackendProfile::unknown(),
            instant: InstantTable::default(),
            knowledge: Arc::new(NoKnowledge),
            items: ItemBook::new(),
            strategic: None,
            strategic_health: BackendHealth::default(),
            local: None,
            local_health: BackendHealth::default(),
            last_strategic_call: None,
        }
    }

    pub fn with_strategic(mut self, backend: Arc<dyn Backend>, profile: BackendProfile) -> Self {
        self.strategic = Some(backend);
        self.profile = profile;
        self
    }

    pub fn with_local(mut self, backend: Arc<dyn Backend>) -> Self {
        self.local = Some(backend);
        self
    }

    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeStore>) -> Self {
        self.knowledge = knowledge;
        self
    }

    pub fn with_items(mut self, items: ItemBook) -> Self {
        self.items = items;
        self
    }

    pub fn with_instant_table(mut self, table: InstantTable) -> Self {
        self.instant = table;
        self
    }

    pub fn items(&self) -> &ItemBook {
        &self.items
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn strategic_health(&self) -> &BackendHealth {
        &self.strategic_health
    }

    pub fn local_health(&self) -> &BackendHealth {
        &self.local_health
    }

    pub fn last_strategic_call(&self) -> Option<Instant> {
        self.last_strategic_call
    }

    pub fn complexity(&self, goal: &Goal, ctx: &Context) -> f64 {
        ComplexityInputs::from_context(goal, ctx, &self.config.weights).score(&self.config.weights)
    }

    /// Tier 1: whether this cycle may go to the strategic backend.
    pub fn should_escalate(&mut self, complexity: f64, now: Instant) -> bool {
        if complexity < self.config.escalation_threshold || self.strategic.is_none() {
            return false;
        }
        let cooled = self
            .last_strategic_call
            .map_or(true, |at| now.duration_since(at) >= self.config.cooldown);
        cooled
            && self.strategic_health.ready(
                now,
                self.config.recovery_after,
                self.config.strategic_failure_limit,
            )
    }

    pub async fn route(&mut self, goal: &Goal, situation: Situation, ctx: &Context) -> Decision {
        let complexity = self.complexity(goal, ctx);
        let decision = |plan: ActionPlan, strategic_attempted: bool| Decision {
            escalated: plan.provenance == Provenance::Strategic,
            plan,
            goal_id: goal.id.clone(),
            situation,
            complexity,
            strategic_attempted,
        };

        if let Some(plan) = self.instant.get(situation) {
            debug!(situation = situation.key(), action = %plan.action, "instant plan");
            return decision(plan, false);
        }

        let attempted = self.should_escalate(complexity, Instant::now());
        if attempted {
            match self.ask_strategic(goal, situation, ctx).await {
                Ok(plan) => return decision(plan, true),
                Err(e) => {
                    let now = Instant::now();
                    if self
                        .strategic_health
                        .failed(self.config.strategic_failure_limit, now)
                    {
                        warn!(error = %e, "strategic backend marked unavailable");
                    } else {
                        warn!(error = %e, failures = self.strategic_health.consecutive_failures, "strategic tier failed");
                    }
                }
            }
        }

        if let Some(plan) = self.try_local(goal, situation, ctx).await {
            return decision(plan, attempted);
        }

        let plan = fallback_plan(situation, goal.kind);
        debug!(situation = situation.key(), action = %plan.action, "fallback plan");
        decision(plan, attempted)
    }

    async fn try_local(&mut self, goal: &Goal, situation: Situation, ctx: &Context) -> Option<ActionPlan> {
        let backend = self.local.clone()?;
        let limit = self.config.local_failure_limit;
        if !self
            .local_health
            .ready(Instant::now(), self.config.recovery_after, limit)
        {
            return None;
        }
        let input = PromptInput::new(goal, situation, ctx).with_items(self.item_advice(situation, ctx));
        let prompt = local_prompt(&input);
        let result = self.ask(backend.as_ref(), &Generation::terse(prompt), self.config.local_timeout, None).await;
        match result {
            Ok(plan) => {
                self.local_health.succeeded();
                Some(ActionPlan::from_extracted(plan, Provenance::Local))
            }
            Err(e) => {
                if self.local_health.failed(limit, Instant::now()) {
                    warn!(error = %e, "local backend marked unavailable");
                } else {
                    warn!(error = %e, failures = self.local_health.consecutive_failures, "local tier failed");
                }
                None
            }
        }
    }

    async fn ask_strategic(
        &mut self,
        goal: &Goal,
        situation: Situation,
        ctx: &Context,
    ) -> Result<ActionPlan, TierError> {
        let Some(backend) = self.strategic.clone() else {
            return Err(BackendError::InvalidResponse.into());
        };
        let knowledge = self.knowledge_for(goal, situation).await;
        let input = PromptInput::new(goal, situation, ctx)
            .with_knowledge(knowledge.as_deref())
            .with_items(self.item_advice(situation, ctx));
        let prompt = strategic_prompt(&self.profile, &input);
        let request = self.profile.generation(prompt);
        let profile = self.profile.clone();
        let plan = self
            .ask(backend.as_ref(), &request, self.config.strategic_timeout, Some(&profile))
            .await?;
        self.strategic_health.succeeded();
        self.last_strategic_call = Some(Instant::now());
        if let Some(strategy) = &plan.strategy {
            info!(%strategy, "strategic plan");
        }
        Ok(ActionPlan::from_extracted(plan, Provenance::Strategic))
    }

    async fn ask(
        &self,
        backend: &dyn Backend,
        request: &Generation,
        limit: Duration,
        profile: Option<&BackendProfile>,
    ) -> Result<llm::ExtractedPlan, TierError> {
        let text = generate_within(backend, request, limit).await?;
        let text = profile.map_or(text.as_str(), |p| p.clean(&text));
        debug!(backend = backend.name(), chars = text.len(), "backend replied");
        Ok(extract_plan(text)?)
    }

    /// Keep/sell/scrap hints, only where the plan is about items.
    fn item_advice(&self, situation: Situation, ctx: &Context) -> Vec<ItemAdvice> {
        match situation {
            Situation::LootAvailable
            | Situation::JunkVisible
            | Situation::Overweight
            | Situation::VendorNearby => self.items.advise(ctx),
            Situation::LowHealthCombat
            | Situation::EnemyDetected
            | Situation::Stuck
            | Situation::EventActive
            | Situation::FishingSpot
            | Situation::FishCaught
            | Situation::SeekWater
            | Situation::NormalExploration => Vec::new(),
        }
    }

    /// Canned guidance for the situation, else the best retrieved snippet.
    async fn knowledge_for(&self, goal: &Goal, situation: Situation) -> Option<String> {
        if let Some(entry) = self.knowledge.lookup(situation.key()) {
            return Some(entry);
        }
        let query = format!("{} {}", goal.name, situation.key().replace('_', " "));
        match self
            .knowledge
            .retrieve(&query, self.config.knowledge_hits)
            .await
        {
            Ok(hits) => hits.into_iter().next().map(|s| s.text),
            Err(e) => {
                debug!(error = %e, "knowledge lookup failed");
                None
            }
        }
    }
}
