//! The execution loop: observe, decide, act, repeat.

use std::sync::Arc;
use std::time::Duration;

use brain::Pipeline;
use motor::Motor;
use sensor::{Frame, Perception};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::control::{ControlHandle, Request};
use crate::status::{RunState, Status, StatusBoard};

const REQUEST_QUEUE: usize = 32;

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub cycle_delay: Duration,
    /// Poll interval while the game is not active.
    pub idle_poll: Duration,
    /// Upper bound on one perception capture.
    pub capture_timeout: Duration,
    pub autostart: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            cycle_delay: Duration::from_millis(1500),
            idle_poll: Duration::from_secs(3),
            capture_timeout: Duration::from_secs(10),
            autostart: false,
        }
    }
}

/// Owns the pipeline and the status board. Nothing else mutates them.
pub struct Agent {
    pipeline: Pipeline,
    perception: Arc<dyn Perception>,
    motor: Motor,
    board: StatusBoard,
    requests: mpsc::Receiver<Request>,
    requests_open: bool,
    shutdown: watch::Receiver<bool>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(
        pipeline: Pipeline,
        perception: Arc<dyn Perception>,
        motor: Motor,
        config: AgentConfig,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, ControlHandle) {
        let (tx, requests) = mpsc::channel(REQUEST_QUEUE);
        let (mut board, status) = StatusBoard::new();
        board.sync(&pipeline);
        board.publish();
        let agent = Self {
            pipeline,
            perception,
            motor,
            board,
            requests,
            requests_open: true,
            shutdown,
            config,
        };
        (agent, ControlHandle::new(tx, status))
    }

    /// Run until shutdown, returning the final status.
    pub async fn run(mut self) -> Status {
        info!("agent loop started");
        if self.config.autostart {
            self.board.set_state(RunState::Running);
        }
        self.publish();

        loop {
            if self.shutting_down() {
                break;
            }
            while let Ok(request) = self.requests.try_recv() {
                self.handle(request);
            }
            if self.board.state().is_active() {
                let Some(pause) = self.cycle().await else {
                    break;
                };
                if !self.wait(pause).await {
                    break;
                }
            } else if !self.wait_for_request().await {
                break;
            }
        }

        self.board.set_state(RunState::Stopped);
        self.publish();
        info!(cycles = self.board.status().cycles, "agent loop finished");
        self.board.status().clone()
    }

    /// One observe/decide/act pass. Returns how long to wait before the
    /// next one, or `None` when shutdown interrupted capture or decision.
    async fn cycle(&mut self) -> Option<Duration> {
        let capture = tokio::time::timeout(self.config.capture_timeout, self.perception.capture());
        let captured = tokio::select! {
            captured = capture => captured,
            _ = stopped(self.shutdown.clone()) => {
                info!("shutdown while capturing");
                return None;
            }
        };
        let frame = match captured {
            Ok(Ok(frame)) if frame.active => frame,
            Ok(Ok(_)) => return Some(self.wait_for_game("game not active")),
            Ok(Err(e)) => {
                warn!(error = %e, "perception failed");
                return Some(self.wait_for_game("perception unavailable"));
            }
            Err(_) => {
                warn!(timeout = ?self.config.capture_timeout, "perception timed out");
                return Some(self.wait_for_game("perception unavailable"));
            }
        };
        if self.board.state() == RunState::WaitingForGame {
            info!("game detected");
            self.board.set_state(RunState::Running);
        }
        self.board.record_cycle();

        let ctx = self.observe(&frame);
        if self.shutting_down() {
            return None;
        }

        let decision = tokio::select! {
            decision = self.pipeline.decide(&ctx) => decision,
            _ = stopped(self.shutdown.clone()) => {
                info!("shutdown while deciding, plan dropped");
                return None;
            }
        };
        debug!(
            goal = %decision.goal_id,
            situation = decision.situation.key(),
            complexity = decision.complexity,
            strategic_attempted = decision.strategic_attempted,
            escalated = decision.escalated,
            "decided"
        );
        self.board.record_decision(&decision);

        let plan = &decision.plan;
        let executed = self.motor.perform(&plan.action, plan.duration).await;
        self.board.record_execution(executed);
        if !executed {
            self.board.log(format!("rejected {}", plan.action));
        }
        if let Err(e) = self.pipeline.record_outcome(&decision.goal_id, executed) {
            debug!(error = %e, "outcome not recorded");
        }
        self.publish();
        Some(self.config.cycle_delay)
    }

    fn observe(&mut self, frame: &Frame) -> brain::Context {
        let known = self.pipeline.atlas().len();
        let ctx = self.pipeline.observe(frame);
        if self.pipeline.atlas().len() > known {
            if let Some(place) = &ctx.location {
                self.board.log(format!("discovered {place}"));
            }
        }
        ctx
    }

    fn wait_for_game(&mut self, why: &str) -> Duration {
        if self.board.state() != RunState::WaitingForGame {
            info!(reason = why, "waiting for game");
            self.board.set_state(RunState::WaitingForGame);
            self.publish();
        }
        self.config.idle_poll
    }

    /// Apply a request and publish before replying, so a caller that got
    /// its answer also sees the new status.
    fn handle(&mut self, request: Request) {
        match request {
            Request::Run { command, reply } => {
                let state = command.apply(self.board.state());
                self.board.set_state(state);
                self.publish();
                let _ = reply.send(state);
            }
            Request::SetGoal { id, enabled, reply } => {
                let result = self.pipeline.registry_mut().set_enabled(&id, enabled);
                if result.is_ok() {
                    let verb = if enabled { "enabled" } else { "disabled" };
                    self.board.log(format!("goal {id} {verb}"));
                }
                self.publish();
                let _ = reply.send(result);
            }
            Request::SetGoals { goals, reply } => {
                let applied = self.pipeline.registry_mut().set_many(&goals);
                self.board
                    .log(format!("batch update of {} goals", applied.len()));
                self.publish();
                let _ = reply.send(applied);
            }
            Request::AddGoal { goal, reply } => {
                let id = goal.id.clone();
                let result = self.pipeline.registry_mut().add(goal);
                if result.is_ok() {
                    self.board.log(format!("goal {id} added"));
                }
                self.publish();
                let _ = reply.send(result);
            }
            Request::RemoveGoal { id, reply } => {
                let result = self.pipeline.registry_mut().remove(&id);
                if result.is_ok() {
                    self.board.log(format!("goal {id} removed"));
                }
                self.publish();
                let _ = reply.send(result);
            }
        }
    }

    /// Sleep between cycles, applying requests as they arrive. Returns
    /// false on shutdown.
    async fn wait(&mut self, pause: Duration) -> bool {
        let sleep = tokio::time::sleep(pause);
        tokio::pin!(sleep);
        let shutdown = stopped(self.shutdown.clone());
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                request = self.requests.recv(), if self.requests_open => match request {
                    Some(request) => {
                        self.handle(request);
                        if !self.board.state().is_active() {
                            return true;
                        }
                    }
                    None => self.requests_open = false,
                },
                _ = &mut shutdown => return false,
            }
        }
    }

    /// Block while idle, paused or stopped. Returns false on shutdown or
    /// when no handle is left to wake the loop.
    async fn wait_for_request(&mut self) -> bool {
        if !self.requests_open {
            return false;
        }
        tokio::select! {
            request = self.requests.recv() => match request {
                Some(request) => {
                    self.handle(request);
                    true
                }
                None => {
                    self.requests_open = false;
                    false
                }
            },
            _ = stopped(self.shutdown.clone()) => false,
        }
    }

    fn shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn publish(&mut self) {
        self.board.sync(&self.pipeline);
        self.board.publish();
    }
}

/// Resolves once shutdown is requested or its sender is gone.
async fn stopped(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
