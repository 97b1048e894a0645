use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use brain::RouterConfig;
use clap::Parser;
use llm::BackendProfile;

use crate::agent::AgentConfig;

/// Runtime options. Command line wins over environment, environment over
/// the defaults below.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Goal-driven game automation agent")]
pub struct Config {
    /// Address of the control surface
    #[arg(long, env = "CONTROL_ADDR", default_value = "127.0.0.1:8000")]
    pub control_addr: SocketAddr,

    /// KoboldCpp-compatible server for strategic decisions
    #[arg(long, env = "STRATEGIC_URL")]
    pub strategic_url: Option<String>,

    /// Ollama server for fast local decisions
    #[arg(long, env = "LOCAL_URL", default_value = "http://127.0.0.1:11434")]
    pub local_url: String,

    #[arg(long, env = "LOCAL_MODEL", default_value = "qwen2:0.5b")]
    pub local_model: String,

    /// Skip the local tier entirely
    #[arg(long, env = "NO_LOCAL")]
    pub no_local: bool,

    /// Perception service; without it the agent waits for a game forever
    #[arg(long, env = "PERCEPTION_URL")]
    pub perception_url: Option<String>,

    /// Input service; without it actions are only logged
    #[arg(long, env = "ACTUATOR_URL")]
    pub actuator_url: Option<String>,

    /// Directory of `.txt` guides, `instant.json` and `items.json`
    #[arg(long, env = "KNOWLEDGE_DIR")]
    pub knowledge_dir: Option<PathBuf>,

    /// Overrides the threshold of the detected model profile
    #[arg(long, env = "ESCALATION_THRESHOLD")]
    pub escalation_threshold: Option<f64>,

    /// Overrides the cooldown of the detected model profile
    #[arg(long, env = "STRATEGIC_COOLDOWN_SECS")]
    pub strategic_cooldown_secs: Option<f64>,

    #[arg(long, env = "LOCAL_TIMEOUT_SECS", default_value_t = 5.0)]
    pub local_timeout_secs: f64,

    #[arg(long, env = "CYCLE_DELAY_SECS", default_value_t = 1.5)]
    pub cycle_delay_secs: f64,

    #[arg(long, env = "IDLE_POLL_SECS", default_value_t = 3.0)]
    pub idle_poll_secs: f64,

    /// Bound on one perception request
    #[arg(long, env = "CAPTURE_TIMEOUT_SECS", default_value_t = 5.0)]
    pub capture_timeout_secs: f64,

    /// Health ratio below which a fight is a retreat
    #[arg(long, env = "LOW_HEALTH", default_value_t = 0.3)]
    pub low_health: f64,

    /// Start cycling without waiting for a start command
    #[arg(long, env = "AUTOSTART")]
    pub autostart: bool,
}

impl Config {
    /// Router settings for the detected strategic profile, with overrides.
    pub fn router_config(&self, profile: &BackendProfile) -> RouterConfig {
        let mut config = RouterConfig::from_profile(profile);
        if let Some(threshold) = self.escalation_threshold {
            config.escalation_threshold = threshold.clamp(0.0, 1.0);
        }
        if let Some(cooldown) = self.strategic_cooldown_secs {
            config.cooldown = secs(cooldown);
        }
        config.local_timeout = secs(self.local_timeout_secs);
        config
    }

    /// Never zero, or every capture would fail at once.
    pub fn capture_timeout(&self) -> Duration {
        secs(self.capture_timeout_secs).max(MIN_CAPTURE_TIMEOUT)
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            cycle_delay: secs(self.cycle_delay_secs),
            idle_poll: secs(self.idle_poll_secs),
            capture_timeout: self.capture_timeout(),
            autostart: self.autostart,
        }
    }
}

const MIN_CAPTURE_TIMEOUT: Duration = Duration::from_millis(100);

/// Seconds to a duration; negative and non-finite values become zero.
fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value.min(86_400.0))
    } else {
        Duration::ZERO
    }
}
