use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use brain::{
    Classifier, Disposition, GoalRegistry, ItemBook, ItemRecord, Pipeline, Router, RouterConfig,
};
use motor::{LoggingActuator, Motor};
use runtime::{server, Agent, AgentConfig, ControlHandle};
use sensor::{Frame, Hud, ScriptedPerception};
use serde_json::{json, Value};
use tokio::sync::watch;
use tower::ServiceExt;

fn spawn_agent() -> (ControlHandle, watch::Sender<bool>) {
    spawn_with(vec![Frame::inactive()], Router::new(RouterConfig::default()), false)
}

fn spawn_with(frames: Vec<Frame>, router: Router, autostart: bool) -> (ControlHandle, watch::Sender<bool>) {
    let (shutdown, rx) = watch::channel(false);
    let pipeline = Pipeline::new(GoalRegistry::default(), Classifier::default(), router);
    let (agent, control) = Agent::new(
        pipeline,
        Arc::new(ScriptedPerception::new(frames)),
        Motor::new(Arc::new(LoggingActuator)),
        AgentConfig {
            autostart,
            ..AgentConfig::default()
        },
        rx,
    );
    tokio::spawn(agent.run());
    (control, shutdown)
}

async fn call(control: &ControlHandle, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let res = server::router(control.clone()).oneshot(request).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn status_starts_idle_with_builtin_goals() {
    let (control, _shutdown) = spawn_agent();
    let (code, body) = call(&control, "GET", "/status", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["state"], "idle");
    assert_eq!(body["cycles"], 0);
    assert_eq!(body["goals"].as_array().unwrap().len(), 8);
    assert_eq!(body["active_goals"], json!(["explore_and_map"]));
    assert!(body.get("locations").is_none());
}

#[tokio::test]
async fn commands_change_run_state() {
    let (control, _shutdown) = spawn_agent();
    let (code, body) = call(&control, "POST", "/command", Some(json!({"command": "start"}))).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["state"], "running");

    let (code, body) = call(&control, "POST", "/command", Some(json!({"command": "pause"}))).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["state"], "paused");

    let (code, body) = call(&control, "POST", "/command", Some(json!({"command": "dance"}))).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("dance"));
}

#[tokio::test]
async fn toggling_goals() {
    let (control, _shutdown) = spawn_agent();
    let (code, _) = call(
        &control,
        "POST",
        "/goals/set",
        Some(json!({"goal_id": "manage_inventory", "enabled": true})),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    let (_, body) = call(&control, "GET", "/goals", None).await;
    assert_eq!(body["active"], json!(["manage_inventory", "explore_and_map"]));

    let (code, _) = call(
        &control,
        "POST",
        "/goals/set",
        Some(json!({"goal_id": "explore_and_map", "enabled": false})),
    )
    .await;
    assert_eq!(code, StatusCode::CONFLICT);

    let (code, _) = call(
        &control,
        "POST",
        "/goals/set",
        Some(json!({"goal_id": "moon_landing", "enabled": true})),
    )
    .await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn batch_reports_per_goal() {
    let (control, _shutdown) = spawn_agent();
    let (code, body) = call(
        &control,
        "POST",
        "/goals/batch",
        Some(json!({"goals": {"fishing": true, "nope": true, "explore_and_map": false}})),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(
        body["results"],
        json!({"explore_and_map": false, "fishing": true, "nope": false})
    );
}

#[tokio::test]
async fn custom_goals_are_generated_and_removable() {
    let (control, _shutdown) = spawn_agent();
    let goal = json!({
        "goal_id": "screws",
        "name": "Screw run",
        "description": "Farm screws from desk fans"
    });
    let (code, body) = call(&control, "POST", "/goals/custom", Some(goal.clone())).await;
    assert_eq!(code, StatusCode::CREATED);
    assert_eq!(body["kind"], "resource_farming");
    assert_eq!(body["enabled"], true);

    let (code, _) = call(&control, "POST", "/goals/custom", Some(goal)).await;
    assert_eq!(code, StatusCode::CONFLICT);

    let (code, body) = call(&control, "DELETE", "/goals/screws", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["id"], "screws");

    let (code, _) = call(&control, "DELETE", "/goals/screws", None).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    let (code, _) = call(&control, "DELETE", "/goals/explore_and_map", None).await;
    assert_eq!(code, StatusCode::CONFLICT);
}

#[tokio::test]
async fn blank_custom_goal_is_rejected() {
    let (control, _shutdown) = spawn_agent();
    let (code, _) = call(
        &control,
        "POST",
        "/goals/custom",
        Some(json!({"goal_id": " ", "name": "x", "description": ""})),
    )
    .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn suggestions_filter_by_query() {
    let (control, _shutdown) = spawn_agent();
    let (code, body) = call(&control, "GET", "/goals/suggestions?q=fish", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["suggestions"], json!(["Go fishing at a lake"]));
}

#[tokio::test]
async fn stopped_loop_answers_unavailable() {
    let (control, shutdown) = spawn_agent();
    shutdown.send_replace(true);
    let mut status = control.subscribe();
    status
        .wait_for(|s| s.state == runtime::RunState::Stopped)
        .await
        .unwrap();
    let (code, _) = call(&control, "POST", "/command", Some(json!({"command": "start"}))).await;
    assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn visited_places_are_listed() {
    let at = |place: &str| {
        Frame::new(true, Vec::new()).with_hud(Hud {
            location: Some(place.into()),
            ..Hud::default()
        })
    };
    let (control, _shutdown) = spawn_with(
        vec![at("Flatwoods"), at("Summersville Lake")],
        Router::new(RouterConfig::default()),
        true,
    );
    let mut status = control.subscribe();
    tokio::time::timeout(
        std::time::Duration::from_secs(10),
        status.wait_for(|s| s.known_locations >= 2),
    )
    .await
    .unwrap()
    .unwrap();

    let (code, body) = call(&control, "GET", "/world/locations", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["locations"]["Flatwoods"]["visits"], 1);
    assert_eq!(body["locations"]["Flatwoods"]["kind"], "general");
    assert_eq!(body["locations"]["Summersville Lake"]["kind"], "fishing");
}

#[tokio::test]
async fn item_knowledge_is_listed() {
    let items: ItemBook = [
        ItemRecord::new("Fixer", Disposition::Keep).god_roll(["Bloodied", "Explosive"]),
        ItemRecord::new("Pipe Pistol", Disposition::Sell),
    ]
    .into_iter()
    .collect();
    let (control, _shutdown) = spawn_with(
        vec![Frame::inactive()],
        Router::new(RouterConfig::default()).with_items(items),
        false,
    );

    let (code, body) = call(&control, "GET", "/world/items", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["god_rolls"], 1);
    assert_eq!(body["items"]["Fixer"]["action"], "keep");
    assert_eq!(body["items"]["Fixer"]["god_roll_effects"], json!(["Bloodied", "Explosive"]));
    assert_eq!(body["items"]["Pipe Pistol"]["action"], "sell");
}

#[tokio::test]
async fn world_is_empty_before_any_cycle() {
    let (control, _shutdown) = spawn_agent();
    let (code, body) = call(&control, "GET", "/world/locations", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!({"locations": {}, "count": 0}));
    let (_, body) = call(&control, "GET", "/world/items", None).await;
    assert_eq!(body, json!({"items": {}, "count": 0, "god_rolls": 0}));
}
