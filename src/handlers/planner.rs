//! Explicit "add X to my plan" / "remind me to X" requests.

use std::sync::OnceLock;

use regex::Regex;

use super::HandlerContext;
use crate::types::{HandlerResult, Section};

fn add_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:please\s+)?add\s+(.+?)\s+to\s+(?:my\s+|the\s+)?(?:plan|planner|checklist|to-?do(?:\s+list)?|list)\b",
        )
        .unwrap()
    })
}

fn remind_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:please\s+)?remind\s+me\s+to\s+(.+?)[.!]?$").unwrap())
}

/// The item text the user asked to add.
pub fn extract_item(query: &str) -> Option<String> {
    let caps = add_re().captures(query).or_else(|| remind_re().captures(query))?;
    let item = caps.get(1)?.as_str().trim();
    if item.is_empty() {
        return None;
    }
    let mut chars = item.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().collect::<String>() + chars.as_str())
}

pub fn triggers(ctx: &HandlerContext<'_>) -> bool {
    add_re().is_match(ctx.query) || remind_re().is_match(ctx.query)
}

pub fn produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    match extract_item(ctx.query) {
        Some(item) => HandlerResult::handled()
            .section(Section::planner(&[item.as_str()]))
            .message(format!("Added \"{}\" to your planner.", item)),
        None => HandlerResult::declined(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{run, section_ids};

    #[test]
    fn test_extract_item() {
        assert_eq!(extract_item("add buy flowers to plan"), Some("Buy flowers".to_string()));
        assert_eq!(
            extract_item("Please add call the jeweller to my to-do list"),
            Some("Call the jeweller".to_string())
        );
        assert_eq!(extract_item("remind me to sign the cheques."), Some("Sign the cheques".to_string()));
        assert_eq!(extract_item("add more queue lines"), None);
    }

    #[test]
    fn test_add_to_plan_yields_single_line_planner() {
        let d = run("add buy flowers to plan");
        assert_eq!(d.handler, Some("add_to_planner"));
        assert_eq!(section_ids(&d), vec!["planner-actions"]);
        assert_eq!(d.result.sections[0].content, "[·] Buy flowers");
    }
}
