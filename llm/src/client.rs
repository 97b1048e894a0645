//! HTTP client for a local Ollama server.
//!
//! [`OllamaClient`] is the fast backend: a small model on the same machine,
//! asked for one short line of JSON per request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::traits::{Backend, BackendError, Generation};

pub struct OllamaClient {
    http: reqwest::Client,
    base: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: impl AsRef<str>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base_url.as_ref().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: Options<'a>,
}

#[derive(Serialize)]
struct Options<'a> {
    temperature: f32,
    num_predict: u32,
    num_ctx: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
    #[serde(skip_serializing_if = "no_stops")]
    stop: &'a [String],
}

#[derive(Deserialize)]
struct GenerateReply {
    response: String,
}

#[derive(Deserialize)]
struct TagsReply {
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

fn no_stops(stop: &&[String]) -> bool {
    stop.is_empty()
}

#[async_trait]
impl Backend for OllamaClient {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate(&self, request: &Generation) -> Result<String, BackendError> {
        let body = GenerateBody {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            options: Options {
                temperature: request.temperature,
                num_predict: request.max_length,
                num_ctx: request.max_context,
                top_p: request.top_p,
                top_k: request.top_k,
                repeat_penalty: request.rep_pen,
                stop: &request.stop,
            },
        };
        debug!(model = %self.model, "ollama generate");
        let resp = self
            .http
            .post(format!("{}/api/generate", self.base))
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
        Ok(reply.response)
    }

    /// Confirms the server is up and returns the configured model, which is
    /// only reported when the server actually has it pulled.
    async fn probe(&self) -> Result<String, BackendError> {
        let resp = self
            .http
            .get(format!("{}/api/tags", self.base))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(BackendError::Status(resp.status().as_u16()));
        }
        let tags: TagsReply = resp
            .json()
            .await
            .map_err(|_| BackendError::InvalidResponse)?;
        tags.models
            .into_iter()
            .map(|m| m.name)
            .find(|name| {
                name == &self.model || name.strip_suffix(":latest") == Some(self.model.as_str())
            })
            .ok_or(BackendError::InvalidResponse)
    }
}
