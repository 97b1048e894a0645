use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use brain::{Classifier, GoalRegistry, Pipeline, Router, RouterConfig};
use llm::{Backend, BackendError, Generation};
use motor::{Action, Actuator, Motor, MotorError};
use runtime::{Agent, AgentConfig, ControlHandle, RunCommand, RunState, Status};
use sensor::{
    Detection, Frame, Hud, Perception, Position, ScriptedPerception, SensorError, Size,
};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

#[derive(Default)]
struct Recorder {
    performed: Mutex<Vec<(Action, Duration)>>,
}

impl Recorder {
    fn performed(&self) -> Vec<(Action, Duration)> {
        self.performed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Actuator for Recorder {
    async fn perform(&self, action: Action, duration: Duration) -> Result<(), MotorError> {
        self.performed.lock().unwrap().push((action, duration));
        Ok(())
    }
}

/// Local backend with a fixed answer.
struct Fixed(&'static str);

#[async_trait]
impl Backend for Fixed {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn generate(&self, _request: &Generation) -> Result<String, BackendError> {
        Ok(self.0.to_string())
    }

    async fn probe(&self) -> Result<String, BackendError> {
        Ok("fixed".into())
    }
}

/// Local backend that signals when asked and then never answers.
struct Stalled(Arc<Notify>);

#[async_trait]
impl Backend for Stalled {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn generate(&self, _request: &Generation) -> Result<String, BackendError> {
        self.0.notify_one();
        std::future::pending().await
    }

    async fn probe(&self) -> Result<String, BackendError> {
        Ok("stalled".into())
    }
}

/// Perception that signals when asked and then never returns a frame.
struct Frozen(Arc<Notify>);

#[async_trait]
impl Perception for Frozen {
    async fn capture(&self) -> Result<Frame, SensorError> {
        self.0.notify_one();
        std::future::pending().await
    }
}

fn fight() -> Frame {
    Frame::new(
        true,
        vec![Detection::new("person", Position::Center, Size::Large)],
    )
    .with_hud(Hud {
        health: Some(20.0),
        percent: true,
        ..Hud::default()
    })
}

fn quiet() -> Frame {
    Frame::new(true, Vec::new())
}

struct Running {
    control: ControlHandle,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Status>,
    actuator: Arc<Recorder>,
}

fn start(frames: Vec<Frame>, router: Router, autostart: bool) -> Running {
    let config = AgentConfig {
        autostart,
        ..AgentConfig::default()
    };
    launch(Arc::new(ScriptedPerception::new(frames)), router, config)
}

fn launch(perception: Arc<dyn Perception>, router: Router, config: AgentConfig) -> Running {
    let actuator = Arc::new(Recorder::default());
    let (shutdown, rx) = watch::channel(false);
    let pipeline = Pipeline::new(GoalRegistry::default(), Classifier::default(), router);
    let (agent, control) = Agent::new(
        pipeline,
        perception,
        Motor::new(actuator.clone()),
        config,
        rx,
    );
    Running {
        control,
        shutdown,
        task: tokio::spawn(agent.run()),
        actuator,
    }
}

impl Running {
    async fn until(&self, done: impl FnMut(&Status) -> bool) {
        let mut status = self.control.subscribe();
        let _ = status.wait_for(done).await;
    }

    async fn stop(self) -> (Status, Vec<(Action, Duration)>) {
        self.shutdown.send_replace(true);
        let status = self.task.await.unwrap();
        (status, self.actuator.performed())
    }
}

#[tokio::test(start_paused = true)]
async fn waits_for_game_then_acts() {
    let agent = start(
        vec![Frame::inactive(), fight(), quiet()],
        Router::new(RouterConfig::default()),
        true,
    );
    agent.until(|s| s.cycles >= 3).await;
    let (status, performed) = agent.stop().await;

    assert_eq!(status.state, RunState::Stopped);
    assert_eq!(performed[0], (Action::Backward, Duration::from_secs(3)));
    assert_eq!(performed[1], (Action::Forward, Duration::from_secs(2)));
    assert_eq!(status.provenance.instant, 1);
    assert!(status.provenance.fallback >= 2);
    assert_eq!(status.executions, status.cycles);
    let log: Vec<&str> = status.log.iter().map(|e| e.message.as_str()).collect();
    assert!(log.iter().any(|l| l.contains("WaitingForGame")));
    assert!(log.iter().any(|l| l.starts_with("low_health_combat -> BACKWARD")));
    let explore = status
        .goals
        .iter()
        .find(|g| g.id == "explore_and_map")
        .unwrap();
    assert_eq!(explore.successes, status.cycles);
}

#[tokio::test(start_paused = true)]
async fn unknown_model_action_is_rejected() {
    let router = Router::new(RouterConfig::default()).with_local(Arc::new(Fixed(
        r#"{"action": "DANCE", "duration": 2}"#,
    )));
    let agent = start(vec![quiet()], router, true);
    agent.until(|s| s.cycles >= 2).await;
    let (status, performed) = agent.stop().await;

    assert!(performed.is_empty());
    assert_eq!(status.executions, 0);
    assert_eq!(status.rejections, status.cycles);
    assert!(status.provenance.local >= 2);
    let explore = status
        .goals
        .iter()
        .find(|g| g.id == "explore_and_map")
        .unwrap();
    assert_eq!(explore.failures, status.cycles);
}

#[tokio::test(start_paused = true)]
async fn paused_loop_does_not_cycle() {
    let agent = start(vec![quiet()], Router::new(RouterConfig::default()), false);
    assert_eq!(
        agent.control.command(RunCommand::Start).await.unwrap(),
        RunState::Running
    );
    agent.until(|s| s.cycles >= 1).await;
    assert_eq!(
        agent.control.command(RunCommand::Pause).await.unwrap(),
        RunState::Paused
    );
    let cycles = agent.control.status().cycles;

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(agent.control.status().cycles, cycles);

    agent.control.command(RunCommand::Resume).await.unwrap();
    agent.until(|s| s.cycles > cycles).await;
    agent.stop().await;
}

#[tokio::test]
async fn shutdown_while_deciding_drops_the_plan() {
    let asked = Arc::new(Notify::new());
    let router =
        Router::new(RouterConfig::default()).with_local(Arc::new(Stalled(asked.clone())));
    let agent = start(vec![quiet()], router, true);
    asked.notified().await;
    let (status, performed) = agent.stop().await;

    assert!(performed.is_empty());
    assert_eq!(status.cycles, 1);
    assert_eq!(status.executions, 0);
    assert!(status.last_decision.is_none());
}

#[tokio::test]
async fn shutdown_while_capturing_stops_the_loop() {
    let asked = Arc::new(Notify::new());
    let config = AgentConfig {
        autostart: true,
        capture_timeout: Duration::from_secs(600),
        ..AgentConfig::default()
    };
    let agent = launch(
        Arc::new(Frozen(asked.clone())),
        Router::new(RouterConfig::default()),
        config,
    );
    asked.notified().await;
    let (status, performed) = tokio::time::timeout(Duration::from_secs(5), agent.stop())
        .await
        .expect("loop ignored shutdown during capture");

    assert_eq!(status.state, RunState::Stopped);
    assert_eq!(status.cycles, 0);
    assert!(performed.is_empty());
}

#[tokio::test(start_paused = true)]
async fn hung_capture_counts_as_no_game() {
    let config = AgentConfig {
        autostart: true,
        capture_timeout: Duration::from_secs(2),
        ..AgentConfig::default()
    };
    let agent = launch(
        Arc::new(Frozen(Arc::new(Notify::new()))),
        Router::new(RouterConfig::default()),
        config,
    );
    agent.until(|s| s.state == RunState::WaitingForGame).await;
    let (status, performed) = agent.stop().await;

    assert_eq!(status.cycles, 0);
    assert!(performed.is_empty());
    let log: Vec<&str> = status.log.iter().map(|e| e.message.as_str()).collect();
    assert!(log.iter().any(|l| l.contains("WaitingForGame")));
}
