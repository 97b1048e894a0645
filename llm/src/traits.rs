use async_trait::async_trait;
use thiserror::Error;

/// A prompt plus the sampling knobs a backend should apply to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Generation {
    pub prompt: String,
    pub max_context: u32,
    pub max_length: u32,
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub rep_pen: Option<f32>,
    pub stop: Vec<String>,
}

impl Generation {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_context: 2048,
            max_length: 300,
            temperature: 0.3,
            top_p: None,
            top_k: None,
            rep_pen: None,
            stop: Vec::new(),
        }
    }

    /// Knobs for the small local model: short, near-deterministic, one line.
    pub fn terse(prompt: impl Into<String>) -> Self {
        Self::new(prompt)
            .with_length(50)
            .with_temperature(0.1)
            .with_stop(["\n", "```"])
    }

    pub fn with_context(mut self, max_context: u32) -> Self {
        self.max_context = max_context;
        self
    }

    pub fn with_length(mut self, max_length: u32) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_rep_pen(mut self, rep_pen: f32) -> Self {
        self.rep_pen = Some(rep_pen);
        self
    }

    pub fn with_stop<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop = stop.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("backend returned status {0}")]
    Status(u16),
    #[error("invalid response")]
    InvalidResponse,
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

/// A text-generation service reached over HTTP.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Send a prompt and return the raw generated text.
    async fn generate(&self, request: &Generation) -> Result<String, BackendError>;

    /// Ask the server which model it is serving.
    async fn probe(&self) -> Result<String, BackendError>;
}
