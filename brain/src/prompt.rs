//! Prompt text for the strategic and local backends.

use indoc::{formatdoc, indoc};
use llm::BackendProfile;
use motor::Action;

use crate::context::Context;
use crate::goal::Goal;
use crate::items::ItemAdvice;
use crate::situation::Situation;

/// Longest knowledge excerpt placed in a prompt, in chars.
pub const MAX_KNOWLEDGE_CHARS: usize = 300;

const SYSTEM: &str = indoc! {"
    You control a player character in Fallout 76 through keyboard and mouse.
    Choose the single next action that best serves the current goal while
    keeping the character alive. Answer with one JSON object and nothing else.
"};

const REPLY_SHAPE: &str = r#"{"action": "ACTION", "duration": 1.0, "reason": "short explanation"}"#;

/// Everything a prompt is built from.
pub struct PromptInput<'a> {
    pub goal: &'a Goal,
    pub situation: Situation,
    pub context: &'a Context,
    pub knowledge: Option<&'a str>,
    pub items: Vec<ItemAdvice>,
}

impl<'a> PromptInput<'a> {
    pub fn new(goal: &'a Goal, situation: Situation, context: &'a Context) -> Self {
        Self {
            goal,
            situation,
            context,
            knowledge: None,
            items: Vec::new(),
        }
    }

    pub fn with_knowledge(mut self, knowledge: Option<&'a str>) -> Self {
        self.knowledge = knowledge.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_items(mut self, items: Vec<ItemAdvice>) -> Self {
        self.items = items;
        self
    }

    /// `label: action` pairs, or `None` without advice.
    fn item_line(&self) -> Option<String> {
        if self.items.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .items
            .iter()
            .map(|a| format!("{}: {}", a.item, a.action))
            .collect();
        Some(pairs.join("; "))
    }
}

/// Compact natural-language account of the context.
pub fn describe(ctx: &Context, situation: Situation) -> String {
    let mut lines = vec![format!(
        "Situation: {}.",
        situation.key().replace('_', " ")
    )];
    if ctx.entities.is_empty() {
        lines.push("Nothing detected on screen.".to_string());
    } else {
        let seen: Vec<String> = ctx.entities.iter().map(|e| e.describe()).collect();
        lines.push(format!(
            "{} objects detected: {}.",
            seen.len(),
            seen.join("; ")
        ));
    }
    lines.push(format!(
        "Health {:.0}%, carry weight {:.0}%.",
        ctx.health * 100.0,
        ctx.weight_ratio * 100.0
    ));
    match (&ctx.location, ctx.location_known) {
        (Some(place), true) => lines.push(format!("Location: {place}.")),
        (Some(place), false) => lines.push(format!("Location: {place} (first visit).")),
        (None, _) => lines.push("Location: unknown.".to_string()),
    }
    let flags = ctx.flags;
    for (set, text) in [
        (flags.event_active, "A public event is running."),
        (flags.near_water, "Water is nearby."),
        (flags.fish_caught, "A fish is on the line."),
        (flags.stuck, "The character appears stuck."),
        (flags.scarce_resources, "Crafting resources are running low."),
    ] {
        if set {
            lines.push(text.to_string());
        }
    }
    lines.join("\n")
}

/// Full prompt for the strategic model.
pub fn strategic_prompt(profile: &BackendProfile, input: &PromptInput<'_>) -> String {
    let goal = input.goal;
    let guidance = goal
        .ai_context
        .as_deref()
        .map(|c| format!("Guidance: {c}\n"))
        .unwrap_or_default();
    let knowledge = input
        .knowledge
        .map(|k| format!("Relevant knowledge: {}\n", truncate(k, MAX_KNOWLEDGE_CHARS)))
        .unwrap_or_default();
    let items = input
        .item_line()
        .map(|line| format!("Item advice: {line}\n"))
        .unwrap_or_default();
    let user = formatdoc! {"
        Current goal: {name}
        Goal description: {description}
        {guidance}{situation}
        {knowledge}{items}Available actions: {actions}
        Reply with JSON only, shaped like {shape}
        ",
        name = goal.name,
        description = goal.description,
        situation = describe(input.context, input.situation),
        actions = Action::vocabulary(),
        shape = REPLY_SHAPE,
    };
    profile.format_prompt(SYSTEM.trim_end(), user.trim_end())
}

/// Short prompt for the small local model.
pub fn local_prompt(input: &PromptInput<'_>) -> String {
    let ctx = input.context;
    let seen: Vec<&str> = ctx.entities.iter().map(|e| e.label.as_str()).collect();
    let items = input
        .item_line()
        .map(|line| format!(" Items: {line}."))
        .unwrap_or_default();
    formatdoc! {"
        Fallout 76. Goal: {goal}. Situation: {situation}. Health {health:.0}%. Seen: {seen}.{items}
        Actions: {actions}
        One line of JSON: {shape}
        JSON:",
        goal = input.goal.name,
        situation = input.situation.key(),
        health = ctx.health * 100.0,
        seen = if seen.is_empty() { "nothing".to_string() } else { seen.join(", ") },
        actions = Action::vocabulary(),
        shape = REPLY_SHAPE,
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}
