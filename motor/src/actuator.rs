use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Action, MotorError};

/// Something that turns an [`Action`] into game input.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn perform(&self, action: Action, duration: Duration) -> Result<(), MotorError>;
}

/// Simple [`Actuator`] that only logs each action. Used for dry runs.
#[derive(Clone, Default)]
pub struct LoggingActuator;

#[async_trait]
impl Actuator for LoggingActuator {
    async fn perform(&self, action: Action, duration: Duration) -> Result<(), MotorError> {
        info!(%action, secs = duration.as_secs_f64(), "actuator perform");
        Ok(())
    }
}

/// Forwards actions to an external input-emulation service.
pub struct HttpActuator {
    http: reqwest::Client,
    url: String,
}

impl HttpActuator {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: format!("{}/perform", base_url.as_ref().trim_end_matches('/')),
        }
    }
}

#[derive(Serialize)]
struct PerformBody {
    action: Action,
    duration: f64,
}

#[derive(Deserialize)]
struct PerformReply {
    #[serde(default = "accepted")]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

fn accepted() -> bool {
    true
}

#[async_trait]
impl Actuator for HttpActuator {
    async fn perform(&self, action: Action, duration: Duration) -> Result<(), MotorError> {
        let resp = self
            .http
            .post(&self.url)
            .json(&PerformBody {
                action,
                duration: duration.as_secs_f64(),
            })
            // the service holds the key for `duration` before answering
            .timeout(duration + Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| MotorError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(MotorError::Status(resp.status().as_u16()));
        }
        let reply: PerformReply = resp.json().await.unwrap_or(PerformReply {
            success: true,
            error: None,
        });
        if reply.success {
            Ok(())
        } else {
            Err(MotorError::Rejected(
                reply.error.unwrap_or_else(|| action.to_string()),
            ))
        }
    }
}
