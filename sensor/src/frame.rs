use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Horizontal placement of a detection on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Center,
    Right,
}

impl Position {
    /// Classify by the box centre as a fraction of frame width.
    pub fn from_center(x_center: f64) -> Self {
        if x_center < 0.33 {
            Position::Left
        } else if x_center > 0.66 {
            Position::Right
        } else {
            Position::Center
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Position::Left => "on the left",
            Position::Center => "in the center",
            Position::Right => "on the right",
        }
    }
}

/// Apparent size, a rough proxy for distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Size {
    Small,
    Large,
    VeryLarge,
}

impl Size {
    /// Classify by box width as a fraction of frame width.
    pub fn from_width(relative_width: f64) -> Self {
        if relative_width > 0.4 {
            Size::VeryLarge
        } else if relative_width > 0.2 {
            Size::Large
        } else {
            Size::Small
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Size::Small => "small (far away)",
            Size::Large => "large (medium distance)",
            Size::VeryLarge => "very large (close)",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub position: Position,
    pub size: Size,
}

impl Detection {
    pub fn new(label: impl Into<String>, position: Position, size: Size) -> Self {
        Self {
            label: label.into(),
            position,
            size,
        }
    }

    /// Build a detection from a pixel bounding box `[x1, y1, x2, y2]`.
    pub fn from_bbox(label: impl Into<String>, bbox: [f64; 4], frame_width: f64) -> Self {
        let width = frame_width.max(1.0);
        let [x1, _, x2, _] = bbox;
        let center = (x1 + x2) / 2.0 / width;
        let relative = (x2 - x1).abs() / width;
        Self::new(label, Position::from_center(center), Size::from_width(relative))
    }

    pub fn describe(&self) -> String {
        format!(
            "{} {}, {}",
            self.label,
            self.position.describe(),
            self.size.describe()
        )
    }
}

/// Readings the perception service scrapes from the game HUD, when it can.
///
/// `health`, `weight_ratio` and `resource_ratio` are fractions in `[0, 1]`.
/// A service that reports percentages sets `percent` and sends `0..=100`.
/// Use the `*_fraction` accessors rather than the raw fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hud {
    pub location: Option<String>,
    pub health: Option<f64>,
    pub weight_ratio: Option<f64>,
    pub resource_ratio: Option<f64>,
    /// The three readings above are percentages.
    pub percent: bool,
    pub event_active: bool,
    pub near_water: bool,
    pub fish_caught: bool,
    pub stuck: bool,
    pub scarce_resources: bool,
}

impl Hud {
    pub fn health_fraction(&self) -> Option<f64> {
        self.health.map(|v| self.fraction(v))
    }

    pub fn weight_fraction(&self) -> Option<f64> {
        self.weight_ratio.map(|v| self.fraction(v))
    }

    pub fn resource_fraction(&self) -> Option<f64> {
        self.resource_ratio.map(|v| self.fraction(v))
    }

    /// Scale to a fraction and clamp. Non-finite readings count as empty.
    fn fraction(&self, value: f64) -> f64 {
        let v = if self.percent { value / 100.0 } else { value };
        if v.is_finite() {
            v.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// One perception snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Whether the game window is up and focused.
    pub active: bool,
    #[serde(default)]
    pub objects: Vec<Detection>,
    #[serde(default)]
    pub hud: Option<Hud>,
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(active: bool, objects: Vec<Detection>) -> Self {
        Self {
            active,
            objects,
            hud: None,
            captured_at: Utc::now(),
        }
    }

    pub fn inactive() -> Self {
        Self::new(false, Vec::new())
    }

    pub fn with_hud(mut self, hud: Hud) -> Self {
        self.hud = Some(hud);
        self
    }
}
