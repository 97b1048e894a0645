//! Pull an action out of free-form model output.
//!
//! Models wrap their JSON in commentary, code fences or trailing chatter.
//! The contract is:
//!
//! 1. the first balanced `{ … }` object (brace counting aware of JSON
//!    strings) that parses is used;
//! 2. failing that, the span from the first `{` to the last `}` is tried;
//! 3. the object must name an action, either as `"action"` or as the first
//!    entry of `"immediate_actions"`;
//! 4. `duration` defaults to `1.0` and `reason` to `"AI decision"`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_DURATION: f64 = 1.0;
pub const DEFAULT_REASON: &str = "AI decision";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    #[error("no JSON object in response")]
    NoJson,
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("JSON object names no action")]
    MissingAction,
}

/// The fields a backend is asked to produce.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPlan {
    pub action: String,
    pub duration: f64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

/// Find the JSON object embedded in `text`.
pub fn extract_object(text: &str) -> Result<Map<String, Value>, ExtractError> {
    let mut last_err = None;
    for (start, _) in text.match_indices('{') {
        let Some(len) = balanced_len(&text[start..]) else {
            continue;
        };
        match serde_json::from_str::<Value>(&text[start..start + len]) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(_) => {}
            Err(e) => last_err = Some(e.to_string()),
        }
    }

    let (Some(first), Some(last)) = (text.find('{'), text.rfind('}')) else {
        return Err(match last_err {
            Some(e) => ExtractError::InvalidJson(e),
            None => ExtractError::NoJson,
        });
    };
    if last < first {
        return Err(ExtractError::NoJson);
    }
    match serde_json::from_str::<Value>(&text[first..=last]) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ExtractError::InvalidJson("not an object".into())),
        Err(e) => Err(ExtractError::InvalidJson(last_err.unwrap_or_else(|| e.to_string()))),
    }
}

/// Extract an [`ExtractedPlan`] from model output, applying defaults.
pub fn extract_plan(text: &str) -> Result<ExtractedPlan, ExtractError> {
    let object = extract_object(text)?;
    let strategy = object
        .get("strategy")
        .and_then(Value::as_str)
        .map(str::to_string);

    let entry = match object.get("action") {
        Some(_) => &object,
        None => object
            .get("immediate_actions")
            .and_then(Value::as_array)
            .and_then(|actions| actions.first())
            .and_then(Value::as_object)
            .ok_or(ExtractError::MissingAction)?,
    };

    let action = entry
        .get("action")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or(ExtractError::MissingAction)?
        .to_string();
    let duration = entry
        .get("duration")
        .and_then(|d| match d {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or(DEFAULT_DURATION);
    let reason = entry
        .get("reason")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_REASON.to_string());

    Ok(ExtractedPlan {
        action,
        duration,
        reason,
        strategy,
    })
}

/// Length of the brace-balanced prefix of `s`, which must start with `{`.
fn balanced_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
