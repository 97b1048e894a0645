//! In-process handle for steering the agent loop.

use std::collections::BTreeMap;
use std::str::FromStr;

use brain::{Goal, GoalError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

use crate::status::{RunState, Status};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunCommand {
    Start,
    Stop,
    Pause,
    Resume,
}

impl FromStr for RunCommand {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(RunCommand::Start),
            "stop" => Ok(RunCommand::Stop),
            "pause" => Ok(RunCommand::Pause),
            "resume" => Ok(RunCommand::Resume),
            _ => Err(ControlError::UnknownCommand(s.to_string())),
        }
    }
}

impl RunCommand {
    /// State after applying the command to `current`.
    pub fn apply(self, current: RunState) -> RunState {
        match (self, current) {
            (RunCommand::Start, RunState::Running | RunState::WaitingForGame) => current,
            (RunCommand::Start, _) => RunState::Running,
            (RunCommand::Stop, _) => RunState::Stopped,
            (RunCommand::Pause, RunState::Running | RunState::WaitingForGame) => RunState::Paused,
            (RunCommand::Pause, _) => current,
            (RunCommand::Resume, RunState::Paused) => RunState::Running,
            (RunCommand::Resume, _) => current,
        }
    }
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error(transparent)]
    Goal(#[from] GoalError),
    #[error("agent loop is gone")]
    Closed,
}

/// Messages the loop applies between cycles.
pub enum Request {
    Run {
        command: RunCommand,
        reply: oneshot::Sender<RunState>,
    },
    SetGoal {
        id: String,
        enabled: bool,
        reply: oneshot::Sender<Result<(), GoalError>>,
    },
    SetGoals {
        goals: BTreeMap<String, bool>,
        reply: oneshot::Sender<BTreeMap<String, bool>>,
    },
    AddGoal {
        goal: Goal,
        reply: oneshot::Sender<Result<(), GoalError>>,
    },
    RemoveGoal {
        id: String,
        reply: oneshot::Sender<Result<Goal, GoalError>>,
    },
}

#[derive(Clone)]
pub struct ControlHandle {
    tx: mpsc::Sender<Request>,
    status: watch::Receiver<Status>,
}

impl ControlHandle {
    pub fn new(tx: mpsc::Sender<Request>, status: watch::Receiver<Status>) -> Self {
        Self { tx, status }
    }

    /// Latest published snapshot.
    pub fn status(&self) -> Status {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.status.clone()
    }

    async fn call<T>(
        &self,
        request: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, ControlError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(request(reply))
            .await
            .map_err(|_| ControlError::Closed)?;
        rx.await.map_err(|_| ControlError::Closed)
    }

    pub async fn command(&self, command: RunCommand) -> Result<RunState, ControlError> {
        self.call(|reply| Request::Run { command, reply }).await
    }

    pub async fn set_goal(&self, id: &str, enabled: bool) -> Result<(), ControlError> {
        let id = id.to_string();
        Ok(self
            .call(|reply| Request::SetGoal { id, enabled, reply })
            .await??)
    }

    pub async fn set_goals(
        &self,
        goals: BTreeMap<String, bool>,
    ) -> Result<BTreeMap<String, bool>, ControlError> {
        self.call(|reply| Request::SetGoals { goals, reply }).await
    }

    pub async fn add_goal(&self, goal: Goal) -> Result<(), ControlError> {
        Ok(self.call(|reply| Request::AddGoal { goal, reply }).await??)
    }

    pub async fn remove_goal(&self, id: &str) -> Result<Goal, ControlError> {
        let id = id.to_string();
        Ok(self.call(|reply| Request::RemoveGoal { id, reply }).await??)
    }
}
