use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::frame::Frame;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("perception service unreachable: {0}")]
    Unreachable(String),
    #[error("perception service timed out after {0:?}")]
    Timeout(Duration),
    #[error("perception service returned status {0}")]
    Status(u16),
    #[error("malformed frame: {0}")]
    Malformed(String),
}

/// Source of perception frames: screen capture plus object detection.
#[async_trait]
pub trait Perception: Send + Sync {
    async fn capture(&self) -> Result<Frame, SensorError>;
}

/// Bound on one frame request, body included.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads frames from an external detection service.
pub struct HttpPerception {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpPerception {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: format!("{}/frame", base_url.as_ref().trim_end_matches('/')),
            timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn failed(&self, e: reqwest::Error) -> SensorError {
        if e.is_timeout() {
            SensorError::Timeout(self.timeout)
        } else {
            SensorError::Unreachable(e.to_string())
        }
    }
}

#[async_trait]
impl Perception for HttpPerception {
    async fn capture(&self) -> Result<Frame, SensorError> {
        let resp = self
            .http
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.failed(e))?;
        if !resp.status().is_success() {
            return Err(SensorError::Status(resp.status().as_u16()));
        }
        let frame: Frame = resp
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SensorError::Timeout(self.timeout)
                } else {
                    SensorError::Malformed(e.to_string())
                }
            })?;
        debug!(active = frame.active, objects = frame.objects.len(), "frame captured");
        Ok(frame)
    }
}

/// Replays a fixed sequence of frames, then repeats the last one.
///
/// Used for dry runs and tests.
pub struct ScriptedPerception {
    frames: Mutex<VecDeque<Frame>>,
    last: Mutex<Frame>,
}

impl ScriptedPerception {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: Mutex::new(frames.into_iter().collect()),
            last: Mutex::new(Frame::inactive()),
        }
    }
}

#[async_trait]
impl Perception for ScriptedPerception {
    async fn capture(&self) -> Result<Frame, SensorError> {
        let next = self
            .frames
            .lock()
            .map_err(|e| SensorError::Malformed(e.to_string()))?
            .pop_front();
        let mut last = self
            .last
            .lock()
            .map_err(|e| SensorError::Malformed(e.to_string()))?;
        if let Some(frame) = next {
            *last = frame;
        }
        Ok(last.clone())
    }
}
