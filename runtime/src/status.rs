//! What the control surface can see of the loop.

use std::collections::VecDeque;

use brain::{BackendHealth, Decision, Goal, ItemRecord, LocationRecord, Pipeline, Provenance};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

/// Entries kept in the rolling log.
pub const LOG_CAPACITY: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    WaitingForGame,
    Running,
    Paused,
    Stopped,
}

impl RunState {
    /// Whether the loop should be cycling.
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Running | RunState::WaitingForGame)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProvenanceCounts {
    pub instant: u64,
    pub strategic: u64,
    pub local: u64,
    pub fallback: u64,
}

impl ProvenanceCounts {
    fn record(&mut self, provenance: Provenance) {
        let slot = match provenance {
            Provenance::Instant => &mut self.instant,
            Provenance::Strategic => &mut self.strategic,
            Provenance::Local => &mut self.local,
            Provenance::Fallback => &mut self.fallback,
        };
        *slot += 1;
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Status {
    pub state: RunState,
    pub cycles: u64,
    /// Plans the actuator accepted.
    pub executions: u64,
    /// Plans the motor or actuator refused.
    pub rejections: u64,
    pub provenance: ProvenanceCounts,
    pub last_decision: Option<Decision>,
    pub goals: Vec<Goal>,
    pub active_goals: Vec<String>,
    pub strategic: BackendHealth,
    pub local: BackendHealth,
    pub known_locations: usize,
    pub log: VecDeque<LogEntry>,
    /// Served by the world routes rather than with every status poll.
    #[serde(skip)]
    pub locations: Vec<LocationRecord>,
    #[serde(skip)]
    pub items: Vec<ItemRecord>,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            state: RunState::Idle,
            cycles: 0,
            executions: 0,
            rejections: 0,
            provenance: ProvenanceCounts::default(),
            last_decision: None,
            goals: Vec::new(),
            active_goals: Vec::new(),
            strategic: BackendHealth::default(),
            local: BackendHealth::default(),
            known_locations: 0,
            log: VecDeque::with_capacity(LOG_CAPACITY),
            locations: Vec::new(),
            items: Vec::new(),
        }
    }
}

/// Owned by the loop; every [`StatusBoard::publish`] hands a fresh
/// snapshot to the watchers.
pub struct StatusBoard {
    status: Status,
    tx: watch::Sender<Status>,
}

impl StatusBoard {
    pub fn new() -> (Self, watch::Receiver<Status>) {
        let status = Status::default();
        let (tx, rx) = watch::channel(status.clone());
        (Self { status, tx }, rx)
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn state(&self) -> RunState {
        self.status.state
    }

    pub fn set_state(&mut self, state: RunState) {
        if self.status.state != state {
            info!(from = ?self.status.state, to = ?state, "run state changed");
            self.log(format!("state: {state:?}"));
            self.status.state = state;
        }
    }

    pub fn log(&mut self, message: impl Into<String>) {
        let log = &mut self.status.log;
        if log.len() == LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(LogEntry {
            at: Utc::now(),
            message: message.into(),
        });
    }

    pub fn record_cycle(&mut self) {
        self.status.cycles += 1;
    }

    pub fn record_decision(&mut self, decision: &Decision) {
        self.status.provenance.record(decision.plan.provenance);
        self.log(format!(
            "{} -> {} {:.1}s ({:?}: {})",
            decision.situation.key(),
            decision.plan.action,
            decision.plan.duration,
            decision.plan.provenance,
            decision.plan.reason,
        ));
        self.status.last_decision = Some(decision.clone());
    }

    pub fn record_execution(&mut self, executed: bool) {
        if executed {
            self.status.executions += 1;
        } else {
            self.status.rejections += 1;
        }
    }

    /// Copy goals, backend health and atlas size from the pipeline.
    pub fn sync(&mut self, pipeline: &Pipeline) {
        let registry = pipeline.registry();
        self.status.goals = registry.goals().to_vec();
        self.status.active_goals = registry.list_active();
        self.status.strategic = pipeline.router().strategic_health().clone();
        self.status.local = pipeline.router().local_health().clone();
        self.status.known_locations = pipeline.atlas().len();
        self.status.locations = pipeline.atlas().records().cloned().collect();
        self.status.items = pipeline.items().records().cloned().collect();
    }

    pub fn publish(&self) {
        self.tx.send_replace(self.status.clone());
    }
}
