//! Execution loop and control surface for the game agent.

pub mod agent;
pub mod config;
pub mod control;
pub mod logging;
pub mod server;
pub mod status;

pub use agent::{Agent, AgentConfig};
pub use config::Config;
pub use control::{ControlError, ControlHandle, RunCommand};
pub use logging::init_logging;
pub use status::{RunState, Status, StatusBoard};
