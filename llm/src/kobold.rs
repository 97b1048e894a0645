//! Client for a KoboldCpp-compatible text generation server.
//!
//! This is the slow, strategic backend: larger models served remotely.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::traits::{Backend, BackendError, Generation};

pub struct KoboldClient {
    http: reqwest::Client,
    base: String,
}

impl KoboldClient {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base_url.as_ref().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    max_context_length: u32,
    max_length: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rep_pen: Option<f32>,
    #[serde(skip_serializing_if = "no_stops")]
    stop_sequence: &'a [String],
}

#[derive(Deserialize)]
struct GenerateReply {
    results: Vec<GeneratedText>,
}

#[derive(Deserialize)]
struct GeneratedText {
    text: String,
}

#[derive(Deserialize)]
struct ModelReply {
    result: String,
}

fn no_stops(stop: &&[String]) -> bool {
    stop.is_empty()
}

#[async_trait]
impl Backend for KoboldClient {
    fn name(&self) -> &str {
        "strategic"
    }

    async fn generate(&self, request: &Generation) -> Result<String, BackendError> {
        let body = GenerateBody {
            prompt: &request.prompt,
            max_context_length: request.max_context,
            max_length: request.max_length,
            temperature: request.temperature,
            top_p: request.top_p,
            top_k: request.top_k,
            rep_pen: request.rep_pen,
            stop_sequence: &request.stop,
        };
        debug!(base = %self.base, chars = request.prompt.len(), "kobold generate");
        let resp = self
            .http
            .post(format!("{}/api/v1/generate", self.base))
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(BackendError::Status(resp.status().as_u16()));
        }
        let reply: GenerateReply = resp
            .json()
            .await
            .map_err(|_| BackendError::InvalidResponse)?;
        reply
            .results
            .into_iter()
            .next()
            .map(|r| r.text)
            .ok_or(BackendError::InvalidResponse)
    }

    async fn probe(&self) -> Result<String, BackendError> {
        let resp = self
            .http
            .get(format!("{}/api/v1/model", self.base))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(BackendError::Status(resp.status().as_u16()));
        }
        let reply: ModelReply = resp
            .json()
            .await
            .map_err(|_| BackendError::InvalidResponse)?;
        Ok(reply.result)
    }
}
