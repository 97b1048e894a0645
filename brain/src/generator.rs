//! Turns an operator's free-text goal description into a [`Goal`].
//!
//! Descriptions are matched against a list of patterns. A match supplies the
//! goal kind, a priority and guidance text for the strategic prompt.

use regex::Regex;
use tracing::warn;

use crate::goal::{Goal, GoalKind};

struct Template {
    pattern: &'static str,
    kind: GoalKind,
    priority: i32,
    guidance: &'static str,
}

/// First match wins, so selling comes before the resource words it
/// usually mentions.
const TEMPLATES: &[Template] = &[
    Template {
        pattern: r"(?i)\bdaily ops\b|\bops\b",
        kind: GoalKind::Custom,
        priority: 7,
        guidance: "Clear Daily Ops quickly: keep moving, use VATS on priority targets and revive teammates.",
    },
    Template {
        pattern: r"(?i)\b(public )?events?\b",
        kind: GoalKind::PublicEvents,
        priority: 8,
        guidance: "Watch for event notifications, travel to the event and stay near the objective until it completes.",
    },
    Template {
        pattern: r"(?i)\blegendar(y|ies)\b",
        kind: GoalKind::Custom,
        priority: 6,
        guidance: "Hunt starred legendary enemies, engage them with VATS and loot their bodies.",
    },
    Template {
        pattern: r"(?i)\bworkshops?\b",
        kind: GoalKind::Custom,
        priority: 7,
        guidance: "Claim workshops, build defenses and hold them against attackers.",
    },
    Template {
        pattern: r"(?i)\bchallenges?\b",
        kind: GoalKind::DailyChallenges,
        priority: 6,
        guidance: "Pick the quickest open challenge and complete it before moving on.",
    },
    Template {
        pattern: r"(?i)\b(xp|experience|level(ing)?( up)?)\b",
        kind: GoalKind::Custom,
        priority: 6,
        guidance: "Fight groups of weak enemies efficiently and keep moving between spawn areas.",
    },
    Template {
        pattern: r"(?i)\b(vendors?|sell|caps)\b",
        kind: GoalKind::VendorRounds,
        priority: 4,
        guidance: "Travel between vendors, selling surplus items until the daily caps limit is reached.",
    },
    Template {
        pattern: r"(?i)\b(screws?|springs?|adhesive|aluminum|steel|resources?|junk|scrap|farm(ing)?)\b",
        kind: GoalKind::ResourceFarming,
        priority: 5,
        guidance: "Search containers and pick up junk that contains the wanted components.",
    },
    Template {
        pattern: r"(?i)\b(kill|hunt|combat|fight)\w*\b",
        kind: GoalKind::Custom,
        priority: 5,
        guidance: "Seek out enemies and engage them, retreating when health runs low.",
    },
    Template {
        pattern: r"(?i)\bc\.?a\.?m\.?p\b",
        kind: GoalKind::CampMaintenance,
        priority: 4,
        guidance: "Return to camp, repair damaged structures and restock resource collectors.",
    },
    Template {
        pattern: r"(?i)\bfish(ing)?\b",
        kind: GoalKind::Fishing,
        priority: 3,
        guidance: "Find water, cast the line and reel in when a fish bites.",
    },
    Template {
        pattern: r"(?i)\b(explore|discover|map)\w*\b",
        kind: GoalKind::Exploration,
        priority: 3,
        guidance: "Head towards undiscovered markers and look around at each new location.",
    },
];

const SUGGESTIONS: &[&str] = &[
    "Complete public events",
    "Farm legendary enemies",
    "Run Daily Ops",
    "Farm screws and springs",
    "Level up by fighting enemies",
    "Sell junk to vendors",
    "Claim and defend workshops",
    "Repair my C.A.M.P.",
    "Finish daily challenges",
    "Explore and discover new locations",
    "Go fishing at a lake",
    "Hunt scorched",
];

pub struct GoalGenerator {
    templates: Vec<(Regex, &'static Template)>,
}

impl Default for GoalGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl GoalGenerator {
    pub fn new() -> Self {
        let templates = TEMPLATES
            .iter()
            .filter_map(|t| match Regex::new(t.pattern) {
                Ok(re) => Some((re, t)),
                Err(e) => {
                    warn!(pattern = t.pattern, error = %e, "bad goal pattern");
                    None
                }
            })
            .collect();
        Self { templates }
    }

    /// Build an enabled goal from a description. `priority` overrides the
    /// inferred one.
    pub fn generate(&self, id: &str, name: &str, description: &str, priority: Option<i32>) -> Goal {
        let matched = self
            .templates
            .iter()
            .find(|(re, _)| re.is_match(description) || re.is_match(name));
        let (kind, inferred, guidance) = match matched {
            Some((_, t)) => (t.kind, t.priority, t.guidance.to_string()),
            None => (
                GoalKind::Custom,
                keyword_priority(description),
                format!("Work towards this goal: {description}"),
            ),
        };
        Goal::new(id, name, kind, priority.unwrap_or(inferred))
            .with_description(description)
            .with_ai_context(guidance)
            .enabled(true)
    }

    /// Up to five example goals containing `partial`.
    pub fn suggestions(&self, partial: &str) -> Vec<&'static str> {
        let needle = partial.trim().to_lowercase();
        SUGGESTIONS
            .iter()
            .copied()
            .filter(|s| needle.is_empty() || s.to_lowercase().contains(&needle))
            .take(5)
            .collect()
    }
}

fn keyword_priority(description: &str) -> i32 {
    let lower = description.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if has(&["event", "daily", "legendary", "ops"]) {
        7
    } else if has(&["farm", "xp", "level", "workshop"]) {
        5
    } else {
        4
    }
}
