use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use brain::{
    ActionPlan, Classifier, Context, Disposition, Flags, Goal, GoalKind, ItemBook, ItemRecord,
    Provenance, Router, RouterConfig, Situation,
};
use llm::{extract_plan, Backend, BackendError, BackendProfile, Generation};

/// Replies from a fixed script; errors once the script runs out.
#[derive(Default)]
struct Scripted {
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(replies: impl IntoIterator<Item = Result<String, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::default(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Backend for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &Generation) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Network("script exhausted".into())))
    }

    async fn probe(&self) -> Result<String, BackendError> {
        Ok("scripted".into())
    }
}

/// Never answers.
struct Hanging {
    calls: AtomicUsize,
}

#[async_trait]
impl Backend for Hanging {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn generate(&self, _request: &Generation) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    async fn probe(&self) -> Result<String, BackendError> {
        std::future::pending().await
    }
}

fn events_goal() -> Goal {
    Goal::new("do_public_events", "Public Events", GoalKind::PublicEvents, 8).enabled(true)
}

/// Two healthy hostiles at a known place during an event: scores 0.9.
fn crowded_event() -> Context {
    Context::default()
        .with_entity("scorched")
        .with_entity("ghoul")
        .with_location("Whitespring Resort", true)
        .with_flags(Flags {
            event_active: true,
            ..Flags::default()
        })
}

fn ok(text: &str) -> Result<String, BackendError> {
    Ok(text.to_string())
}

#[tokio::test]
async fn low_health_with_hostile_retreats_instantly() {
    let strategic = Scripted::new([]);
    let mut router = Router::new(RouterConfig::default())
        .with_strategic(strategic.clone(), BackendProfile::unknown());
    let goal = Goal::new("explore_and_map", "Explore", GoalKind::Exploration, 1).enabled(true);
    let ctx = Context::default()
        .with_entity("person")
        .with_entity("container")
        .with_health(0.2);

    let situation = Classifier::default().classify(&ctx, &[&goal]);
    assert_eq!(situation, Situation::LowHealthCombat);

    let decision = router.route(&goal, situation, &ctx).await;
    assert_eq!(decision.plan.action, "BACKWARD");
    assert!((decision.plan.duration - 3.0).abs() < f64::EPSILON);
    assert_eq!(decision.plan.provenance, Provenance::Instant);
    assert_eq!(strategic.calls(), 0);
}

#[tokio::test]
async fn safe_loot_is_collected_instantly() {
    let mut router = Router::new(RouterConfig::default());
    let goal = Goal::new("manage_inventory", "Inventory", GoalKind::Inventory, 5).enabled(true);
    let ctx = Context::default().with_entity("container");

    let situation = Classifier::default().classify(&ctx, &[&goal]);
    assert_eq!(situation, Situation::LootAvailable);

    let decision = router.route(&goal, situation, &ctx).await;
    assert_eq!(decision.plan.action, "INTERACT");
    assert_eq!(decision.plan.provenance, Provenance::Instant);
}

#[tokio::test(start_paused = true)]
async fn complex_situation_escalates_then_cools_down() {
    let strategic = Scripted::new([
        ok("Plan: {\"action\":\"VATS\",\"duration\":0.1,\"reason\":\"focus the closest\"}"),
        ok("{\"action\":\"AIM\"}"),
    ]);
    let mut router = Router::new(RouterConfig::default())
        .with_strategic(strategic.clone(), BackendProfile::unknown());
    let goal = events_goal();
    let ctx = crowded_event();
    let situation = Classifier::default().classify(&ctx, &[&goal]);
    assert_eq!(situation, Situation::EnemyDetected);

    let first = router.route(&goal, situation, &ctx).await;
    assert!((first.complexity - 0.9).abs() < 1e-9);
    assert!(first.strategic_attempted);
    assert!(first.escalated);
    assert_eq!(first.plan.provenance, Provenance::Strategic);
    assert_eq!(first.plan.reason, "focus the closest");
    assert!(router.last_strategic_call().is_some());

    let cooling = router.route(&goal, situation, &ctx).await;
    assert!(!cooling.strategic_attempted);
    assert!(!cooling.escalated);
    assert_eq!(cooling.plan.provenance, Provenance::Fallback);
    assert_eq!(strategic.calls(), 1);

    tokio::time::advance(Duration::from_secs(61)).await;
    let again = router.route(&goal, situation, &ctx).await;
    assert_eq!(again.plan.provenance, Provenance::Strategic);
    assert_eq!(again.plan.action, "AIM");
    assert_eq!(again.plan.reason, "AI decision");
}

#[tokio::test]
async fn low_complexity_skips_strategic() {
    let strategic = Scripted::new([ok("{\"action\":\"JUMP\"}")]);
    let local = Scripted::new([ok("{\"action\":\"STRAFE_LEFT\",\"duration\":0.5}")]);
    let mut router = Router::new(RouterConfig::default())
        .with_strategic(strategic.clone(), BackendProfile::unknown())
        .with_local(local.clone());
    let goal = Goal::new("explore_and_map", "Explore", GoalKind::Exploration, 1).enabled(true);
    let ctx = Context::default()
        .with_entity("ghoul")
        .with_location("Flatwoods", true);

    let decision = router.route(&goal, Situation::EnemyDetected, &ctx).await;
    assert!(!decision.escalated);
    assert_eq!(decision.plan.provenance, Provenance::Local);
    assert_eq!(decision.plan.action, "STRAFE_LEFT");
    assert_eq!(strategic.calls(), 0);
}

#[tokio::test]
async fn failing_backends_degrade_to_fallback() {
    let strategic = Scripted::new([
        ok("I think you should run away."),
        ok("Still no JSON, sorry."),
        ok("{ not even close"),
    ]);
    let local = Scripted::new([
        Err(BackendError::Network("connection refused".into())),
        ok("FORWARD"),
    ]);
    let mut router = Router::new(RouterConfig::default())
        .with_strategic(strategic.clone(), BackendProfile::unknown())
        .with_local(local.clone());
    let goal = events_goal();
    let ctx = crowded_event();

    let first = router.route(&goal, Situation::EnemyDetected, &ctx).await;
    assert!(first.strategic_attempted);
    assert!(!first.escalated);
    assert_eq!(first.plan.provenance, Provenance::Fallback);
    assert_eq!(first.plan.action, "VATS");
    assert_eq!(router.strategic_health().consecutive_failures, 1);
    assert_eq!(router.local_health().consecutive_failures, 1);

    let second = router.route(&goal, Situation::EnemyDetected, &ctx).await;
    assert_eq!(second.plan.provenance, Provenance::Fallback);
    assert!(!router.local_health().available);

    let third = router.route(&goal, Situation::EnemyDetected, &ctx).await;
    assert_eq!(third.plan.provenance, Provenance::Fallback);
    assert!(!router.strategic_health().available);
    assert_eq!(local.calls(), 2);
    assert_eq!(strategic.calls(), 3);

    let fourth = router.route(&goal, Situation::EnemyDetected, &ctx).await;
    assert_eq!(fourth.plan.provenance, Provenance::Fallback);
    assert!(!fourth.strategic_attempted);
    assert!(!fourth.escalated);
    assert_eq!(strategic.calls(), 3);
}

#[tokio::test]
async fn failed_escalation_answered_locally_is_not_escalated() {
    let strategic = Scripted::new([Err(BackendError::Status(503))]);
    let local = Scripted::new([ok("{\"action\":\"AIM\",\"duration\":0.5}")]);
    let mut router = Router::new(RouterConfig::default())
        .with_strategic(strategic.clone(), BackendProfile::unknown())
        .with_local(local.clone());
    let goal = events_goal();
    let ctx = crowded_event();

    let decision = router.route(&goal, Situation::EnemyDetected, &ctx).await;
    assert_eq!(decision.plan.provenance, Provenance::Local);
    assert_eq!(decision.plan.action, "AIM");
    assert!(decision.strategic_attempted);
    assert!(!decision.escalated);
    assert_eq!(strategic.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn hanging_backends_still_yield_a_plan() {
    let strategic = Arc::new(Hanging {
        calls: AtomicUsize::new(0),
    });
    let local = Arc::new(Hanging {
        calls: AtomicUsize::new(0),
    });
    let mut router = Router::new(RouterConfig::default())
        .with_strategic(strategic.clone(), BackendProfile::for_model("hermes"))
        .with_local(local.clone());
    let goal = events_goal();
    let ctx = crowded_event();

    for situation in Situation::ALL {
        let decision = router.route(&goal, situation, &ctx).await;
        assert!(!decision.plan.action.is_empty());
        assert!(matches!(
            decision.plan.provenance,
            Provenance::Instant | Provenance::Fallback
        ));
    }
    assert!(strategic.calls.load(Ordering::SeqCst) >= 1);
    assert!(local.calls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test(start_paused = true)]
async fn benched_strategic_backend_is_retried_after_recovery() {
    let strategic = Scripted::new([
        Err(BackendError::Timeout),
        Err(BackendError::Timeout),
        Err(BackendError::Timeout),
        ok("{\"action\":\"VATS\"}"),
    ]);
    let config = RouterConfig {
        recovery_after: Duration::from_secs(120),
        ..RouterConfig::default()
    };
    let mut router =
        Router::new(config).with_strategic(strategic.clone(), BackendProfile::unknown());
    let goal = events_goal();
    let ctx = crowded_event();

    for _ in 0..4 {
        router.route(&goal, Situation::EnemyDetected, &ctx).await;
    }
    assert_eq!(strategic.calls(), 3);
    assert!(!router.strategic_health().available);

    tokio::time::advance(Duration::from_secs(121)).await;
    let decision = router.route(&goal, Situation::EnemyDetected, &ctx).await;
    assert_eq!(decision.plan.provenance, Provenance::Strategic);
    assert_eq!(router.strategic_health().consecutive_failures, 0);
}

#[tokio::test]
async fn extracted_plan_survives_reserialization() {
    let local = Scripted::new([ok(
        "Sure: {\"action\":\"forward\",\"duration\":2.0} hope that helps",
    )]);
    let mut router = Router::new(RouterConfig::default()).with_local(local);
    let goal = Goal::new("explore_and_map", "Explore", GoalKind::Exploration, 1).enabled(true);
    let ctx = Context::default().with_location("Vault 76", true);

    let plan = router
        .route(&goal, Situation::NormalExploration, &ctx)
        .await
        .plan;
    assert_eq!(plan.action, "FORWARD");
    assert_eq!(plan.reason, "AI decision");

    let encoded = serde_json::to_string(&plan).unwrap();
    let again = ActionPlan::from_extracted(extract_plan(&encoded).unwrap(), Provenance::Local);
    assert_eq!(again, plan);
}

#[tokio::test]
async fn item_knowledge_reaches_the_local_prompt() {
    let local = Scripted::new([
        ok("{\"action\":\"INTERACT\",\"duration\":0.5}"),
        ok("{\"action\":\"VATS\"}"),
    ]);
    let items: ItemBook = [ItemRecord::new("Suitcase", Disposition::Keep)]
        .into_iter()
        .collect();
    let mut router = Router::new(RouterConfig::default())
        .with_local(local.clone())
        .with_items(items);
    let goal = Goal::new("manage_inventory", "Inventory", GoalKind::Inventory, 5).enabled(true);
    let ctx = Context::default()
        .with_entity("suitcase")
        .with_entity("bottle");

    router.route(&goal, Situation::JunkVisible, &ctx).await;
    let prompt = local.last_prompt().unwrap();
    assert!(prompt.contains("Items: suitcase: keep; bottle: scrap."), "{prompt}");

    router.route(&goal, Situation::EnemyDetected, &ctx).await;
    assert!(!local.last_prompt().unwrap().contains("Items:"));
}
