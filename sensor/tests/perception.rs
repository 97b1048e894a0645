use std::time::Duration;

use httpmock::Method::GET;
use httpmock::MockServer;
use sensor::{
    Detection, Frame, HttpPerception, Perception, Position, ScriptedPerception, SensorError, Size,
};
use serde_json::json;

#[tokio::test]
async fn http_frame_is_decoded() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/frame");
        then.status(200).json_body(json!({
            "active": true,
            "objects": [{"label": "container", "position": "center", "size": "large"}],
            "hud": {"health": 0.8, "location": "Flatwoods", "near_water": true}
        }));
    });

    let perception = HttpPerception::new(server.base_url());
    let frame = perception.capture().await.unwrap();
    mock.assert();
    assert!(frame.active);
    assert_eq!(
        frame.objects,
        vec![Detection::new("container", Position::Center, Size::Large)]
    );
    let hud = frame.hud.unwrap();
    assert_eq!(hud.location.as_deref(), Some("Flatwoods"));
    assert!(hud.near_water);
    assert!(!hud.stuck);
}

#[tokio::test]
async fn http_error_status_surfaces() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/frame");
        then.status(500);
    });

    let perception = HttpPerception::new(server.base_url());
    assert!(matches!(
        perception.capture().await,
        Err(SensorError::Status(500))
    ));
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/frame");
        then.status(200)
            .delay(Duration::from_secs(5))
            .json_body(json!({"active": true}));
    });

    let perception = HttpPerception::new(server.base_url()).with_timeout(Duration::from_millis(200));
    let started = std::time::Instant::now();
    let result = perception.capture().await;
    assert!(matches!(result, Err(SensorError::Timeout(t)) if t == Duration::from_millis(200)));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn scripted_frames_replay_then_hold() {
    let perception = ScriptedPerception::new([
        Frame::inactive(),
        Frame::new(true, vec![Detection::new("person", Position::Left, Size::Small)]),
    ]);
    assert!(!perception.capture().await.unwrap().active);
    assert!(perception.capture().await.unwrap().active);
    let held = perception.capture().await.unwrap();
    assert!(held.active);
    assert_eq!(held.objects[0].label, "person");
}
