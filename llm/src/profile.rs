//! Per-model tuning for the strategic backend.
//!
//! Different models warrant different escalation settings: a faster
//! instruction-tuned model gets a lower threshold and a shorter cooldown.
//! [`BackendProfile::for_model`] picks the values from the model name the
//! server reports.

use std::time::Duration;

use serde::Serialize;

use crate::traits::Generation;

const CHATML_END: &str = "<|im_end|>";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Hermes,
    Generic,
}

impl ModelFamily {
    pub fn detect(model: &str) -> Self {
        if model.to_ascii_lowercase().contains("hermes") {
            ModelFamily::Hermes
        } else {
            ModelFamily::Generic
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BackendProfile {
    pub model: String,
    pub family: ModelFamily,
    pub escalation_threshold: f64,
    pub cooldown: Duration,
    pub timeout: Duration,
}

impl BackendProfile {
    pub fn for_model(model: impl Into<String>) -> Self {
        let model = model.into();
        match ModelFamily::detect(&model) {
            ModelFamily::Hermes => Self {
                model,
                family: ModelFamily::Hermes,
                escalation_threshold: 0.6,
                cooldown: Duration::from_secs(30),
                timeout: Duration::from_secs(45),
            },
            ModelFamily::Generic => Self {
                model,
                family: ModelFamily::Generic,
                escalation_threshold: 0.7,
                cooldown: Duration::from_secs(60),
                timeout: Duration::from_secs(30),
            },
        }
    }

    /// Profile used when the server could not be asked for its model.
    pub fn unknown() -> Self {
        Self::for_model("unknown")
    }

    /// Lay out a system/user prompt pair the way the model family expects.
    pub fn format_prompt(&self, system: &str, user: &str) -> String {
        match self.family {
            ModelFamily::Hermes => format!(
                "<|im_start|>system\n{system}{CHATML_END}\n<|im_start|>user\n{user}{CHATML_END}\n<|im_start|>assistant\n"
            ),
            ModelFamily::Generic => format!("{system}\n\n{user}\n\nResponse:"),
        }
    }

    /// Sampling knobs for a strategic request.
    pub fn generation(&self, prompt: String) -> Generation {
        match self.family {
            ModelFamily::Hermes => Generation::new(prompt)
                .with_context(4096)
                .with_length(500)
                .with_temperature(0.4)
                .with_top_p(0.8)
                .with_top_k(40)
                .with_rep_pen(1.05)
                .with_stop([CHATML_END, "\n\n\n"]),
            ModelFamily::Generic => Generation::new(prompt)
                .with_context(2048)
                .with_length(300)
                .with_temperature(0.3)
                .with_top_p(0.9)
                .with_rep_pen(1.1),
        }
    }

    /// Strip end-of-turn markers the model may echo back.
    pub fn clean<'a>(&self, text: &'a str) -> &'a str {
        match self.family {
            ModelFamily::Hermes => text.split(CHATML_END).next().unwrap_or(text).trim(),
            ModelFamily::Generic => text.trim(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hermes_gets_faster_escalation() {
        let p = BackendProfile::for_model("Nous-Hermes-2-Mistral-7B.Q4_K_M");
        assert_eq!(p.family, ModelFamily::Hermes);
        assert_eq!(p.escalation_threshold, 0.6);
        assert_eq!(p.cooldown, Duration::from_secs(30));
        assert_eq!(p.timeout, Duration::from_secs(45));
    }

    #[test]
    fn other_models_use_defaults() {
        let p = BackendProfile::for_model("koboldcpp/llama-3-8b");
        assert_eq!(p.family, ModelFamily::Generic);
        assert_eq!(p.escalation_threshold, 0.7);
        assert_eq!(p.cooldown, Duration::from_secs(60));
    }

    #[test]
    fn hermes_output_is_cut_at_end_marker() {
        let p = BackendProfile::for_model("hermes");
        assert_eq!(p.clean(" {\"action\":\"VATS\"}<|im_end|>junk"), "{\"action\":\"VATS\"}");
    }

    #[test]
    fn chatml_prompt_ends_with_assistant_turn() {
        let p = BackendProfile::for_model("hermes");
        let prompt = p.format_prompt("sys", "usr");
        assert!(prompt.starts_with("<|im_start|>system\nsys"));
        assert!(prompt.ends_with("<|im_start|>assistant\n"));
        let g = p.generation(prompt);
        assert_eq!(g.max_context, 4096);
        assert_eq!(g.top_k, Some(40));
    }
}
