use sensor::Frame;
use tracing::info;

use crate::atlas::Atlas;
use crate::context::Context;
use crate::goal::GoalError;
use crate::items::ItemBook;
use crate::registry::GoalRegistry;
use crate::router::{Decision, Router};
use crate::situation::{Classifier, Situation};

/// Goal registry, classifier, router and atlas wired into one
/// observe → classify → decide sequence.
pub struct Pipeline {
    registry: GoalRegistry,
    classifier: Classifier,
    router: Router,
    atlas: Atlas,
}

impl Pipeline {
    pub fn new(registry: GoalRegistry, classifier: Classifier, router: Router) -> Self {
        Self {
            registry,
            classifier,
            router,
            atlas: Atlas::new(),
        }
    }

    pub fn registry(&self) -> &GoalRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut GoalRegistry {
        &mut self.registry
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    pub fn items(&self) -> &ItemBook {
        self.router.items()
    }

    /// Build this cycle's context and note the location in the atlas.
    pub fn observe(&mut self, frame: &Frame) -> Context {
        let atlas = &self.atlas;
        let ctx = Context::from_frame(frame, |name| atlas.is_known(name));
        if let Some(place) = &ctx.location {
            if self.atlas.visit(place, ctx.flags.event_active, ctx.timestamp) {
                info!(location = %place, "new location discovered");
            }
        }
        ctx
    }

    pub fn classify(&self, ctx: &Context) -> Situation {
        self.classifier.classify(ctx, &self.registry.active_goals())
    }

    pub async fn decide(&mut self, ctx: &Context) -> Decision {
        let situation = self.classify(ctx);
        let goal = self.registry.current(ctx);
        self.router.route(goal, situation, ctx).await
    }

    pub fn record_outcome(&mut self, goal_id: &str, success: bool) -> Result<(), GoalError> {
        self.registry.record_outcome(goal_id, success)
    }
}
