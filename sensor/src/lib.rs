//! Perception input for the agent.
//!
//! A [`Perception`] source yields [`Frame`]s: whether the game is active and
//! the labelled objects a detector found on screen. Capture and detection
//! themselves live in an external service.

pub mod frame;
pub mod perception;

pub use frame::{Detection, Frame, Hud, Position, Size};
pub use perception::{
    HttpPerception, Perception, ScriptedPerception, SensorError, DEFAULT_CAPTURE_TIMEOUT,
};
