//! Output side of the agent: named actions and the actuators that play them.
//!
//! [`Motor`] is the boundary every decision passes through. It parses the
//! action name, rejects anything outside the [`Action`] vocabulary without
//! touching the actuator, and bounds the hold duration.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

pub mod action;
pub mod actuator;

pub use action::Action;
pub use actuator::{Actuator, HttpActuator, LoggingActuator};

#[derive(Debug, Error)]
pub enum MotorError {
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    #[error("invalid duration {0}")]
    InvalidDuration(f64),
    #[error("actuator unreachable: {0}")]
    Unreachable(String),
    #[error("actuator returned status {0}")]
    Status(u16),
    #[error("actuator rejected action: {0}")]
    Rejected(String),
}

pub const MAX_DURATION: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct Motor {
    actuator: Arc<dyn Actuator>,
    max_duration: Duration,
}

impl Motor {
    pub fn new(actuator: Arc<dyn Actuator>) -> Self {
        Self {
            actuator,
            max_duration: MAX_DURATION,
        }
    }

    pub fn with_max_duration(mut self, max: Duration) -> Self {
        self.max_duration = max;
        self
    }

    /// Perform a named action, reporting only success.
    pub async fn perform(&self, name: &str, duration: f64) -> bool {
        match self.try_perform(name, duration).await {
            Ok(_) => true,
            Err(e) => {
                warn!(action = name, error = %e, "action rejected");
                false
            }
        }
    }

    pub async fn try_perform(&self, name: &str, duration: f64) -> Result<Action, MotorError> {
        let action: Action = name.parse()?;
        if !duration.is_finite() {
            return Err(MotorError::InvalidDuration(duration));
        }
        let secs = duration.clamp(0.0, self.max_duration.as_secs_f64());
        debug!(%action, secs, "dispatching");
        self.actuator
            .perform(action, Duration::from_secs_f64(secs))
            .await?;
        Ok(action)
    }
}
