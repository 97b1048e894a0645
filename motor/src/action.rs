use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::MotorError;

/// Every input the actuator knows how to emulate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    Backward,
    StrafeLeft,
    StrafeRight,
    Jump,
    Sprint,
    Interact,
    Reload,
    Vats,
    Attack,
    Aim,
    Map,
    PipBoy,
    Escape,
    Enter,
    Sneak,
    SmoothLook,
    Wait,
}

impl Action {
    pub const ALL: [Action; 18] = [
        Action::Forward,
        Action::Backward,
        Action::StrafeLeft,
        Action::StrafeRight,
        Action::Jump,
        Action::Sprint,
        Action::Interact,
        Action::Reload,
        Action::Vats,
        Action::Attack,
        Action::Aim,
        Action::Map,
        Action::PipBoy,
        Action::Escape,
        Action::Enter,
        Action::Sneak,
        Action::SmoothLook,
        Action::Wait,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::Forward => "FORWARD",
            Action::Backward => "BACKWARD",
            Action::StrafeLeft => "STRAFE_LEFT",
            Action::StrafeRight => "STRAFE_RIGHT",
            Action::Jump => "JUMP",
            Action::Sprint => "SPRINT",
            Action::Interact => "INTERACT",
            Action::Reload => "RELOAD",
            Action::Vats => "VATS",
            Action::Attack => "ATTACK",
            Action::Aim => "AIM",
            Action::Map => "MAP",
            Action::PipBoy => "PIPBOY",
            Action::Escape => "ESC",
            Action::Enter => "ENTER",
            Action::Sneak => "SNEAK",
            Action::SmoothLook => "SMOOTH_LOOK",
            Action::Wait => "WAIT",
        }
    }

    /// Comma separated list for prompts.
    pub fn vocabulary() -> String {
        Action::ALL
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = MotorError;

    /// Case-insensitive; accepts the raw key names `M`, `TAB` and `CTRL`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        let action = match upper.as_str() {
            "M" => Action::Map,
            "TAB" => Action::PipBoy,
            "CTRL" => Action::Sneak,
            "ESCAPE" => Action::Escape,
            other => Action::ALL
                .into_iter()
                .find(|a| a.name() == other)
                .ok_or_else(|| MotorError::UnknownAction(s.to_string()))?,
        };
        Ok(action)
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
