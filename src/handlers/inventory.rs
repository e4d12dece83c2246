//! Stock checks against the stores master.

use std::sync::OnceLock;

use regex::Regex;

use super::HandlerContext;
use crate::registry::{Record, RecordKind};
use crate::types::{HandlerResult, HighlightCard, RegistrationStatus, Section};

/// Items with fewer days of cover than this need an indent.
const LOW_COVER_DAYS: u32 = 5;

const STOCK_MARKERS: &[&str] = &[
    "stock",
    "stocks",
    "inventory",
    "stores",
    "do we have",
    "running low",
    "running out",
];

const QUANTITY_MARKERS: &[&str] = &["how much", "enough", "left"];

fn item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:stock of|inventory of|do we have(?: enough| any)?|running (?:low|out) (?:on|of)|how much)\s+([a-z][a-z ]*?)(?:\s+(?:left|in stock|in stores|for|today|this week)\b.*)?\??$",
        )
        .unwrap()
    })
}

pub fn triggers(ctx: &HandlerContext<'_>) -> bool {
    if ctx.mentions_any(STOCK_MARKERS) {
        return true;
    }
    // "how much ghee is left" only counts when the item is known
    ctx.mentions_any(QUANTITY_MARKERS)
        && ctx.lookup.search_kind(ctx.query, Some(RecordKind::Inventory)).is_match()
}

pub fn produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let lookup = ctx.lookup.search_kind(ctx.query, Some(RecordKind::Inventory));
    if let Some(record) = lookup.record {
        return known_item(record);
    }

    match extract_item(&ctx.folded) {
        Some(item) => unknown_item(&item),
        None => stores_overview(),
    }
}

/// Item named after "stock of", "do we have" and similar.
pub fn extract_item(folded: &str) -> Option<String> {
    let caps = item_re().captures(folded)?;
    let item = caps.get(1)?.as_str().trim();
    let item = item
        .strip_prefix("the ")
        .or_else(|| item.strip_prefix("any "))
        .unwrap_or(item)
        .trim();
    if item.is_empty() || matches!(item, "stock" | "inventory" | "stores") {
        return None;
    }
    Some(item.to_string())
}

fn known_item(record: Record) -> HandlerResult {
    let cover: Option<u32> = record
        .attribute_value("Days of cover")
        .and_then(|v| v.parse().ok());
    let low = cover.map(|d| d < LOW_COVER_DAYS).unwrap_or(false);

    let mut card = HighlightCard::new(format!("{} in stores", record.name))
        .status(if low { "Below reorder level" } else { "Adequate" });
    for attr in &record.attributes {
        card = card.field(&attr.label, attr.value.clone());
    }

    let mut result = HandlerResult::handled().section(Section::focus("inventory", "Inventory Check", card));
    if low {
        let checklist = [
            format!("Raise indent for {}", record.name),
            "Get three quotes from empanelled suppliers".to_string(),
            "Cut non-essential consumption until delivery".to_string(),
        ];
        result = result
            .section(Section::planner(&checklist).with_sub_title(format!("{} restock", record.name)))
            .message(format!(
                "{} is running low. I've added the restock steps to your planner.",
                record.name
            ));
    } else {
        result = result.message(format!("{} stock is adequate.", record.name));
    }
    result
}

fn unknown_item(item: &str) -> HandlerResult {
    let card = HighlightCard::new(format!("{} not found in stores master", item))
        .status(RegistrationStatus::Unregistered.label())
        .note("No stock record exists for this item.");
    let checklist = [
        format!("Register {} in the stores master", item),
        format!("Ask the storekeeper for a physical count of {}", item),
    ];
    HandlerResult::handled()
        .section(Section::focus("inventory", "Inventory Check", card))
        .section(Section::planner(&checklist).with_sub_title("Stores master"))
        .message(format!("I couldn't find {} in the stores master.", item))
}

fn stores_overview() -> HandlerResult {
    let card = HighlightCard::new("Stores overview")
        .status("1 item below reorder level")
        .field("Ghee", "9 days of cover")
        .field("Rice", "12 days of cover")
        .field("Besan", "3 days of cover");
    HandlerResult::handled()
        .section(Section::focus("inventory", "Inventory Check", card))
        .message("Here's where the stores stand.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{run, section_ids};

    #[test]
    fn test_extract_item() {
        assert_eq!(extract_item("do we have enough cardamom?"), Some("cardamom".to_string()));
        assert_eq!(extract_item("stock of camphor left"), Some("camphor".to_string()));
        assert_eq!(extract_item("how are things"), None);
    }

    #[test]
    fn test_low_cover_adds_indent() {
        let d = run("Do we have enough besan?");
        assert_eq!(d.handler, Some("inventory_check"));
        assert_eq!(section_ids(&d), vec!["focus-inventory", "planner-actions"]);
        assert!(d.result.sections[1].content.contains("Raise indent for Besan"));
    }

    #[test]
    fn test_adequate_stock_is_card_only() {
        let d = run("how much ghee is left");
        assert_eq!(d.handler, Some("inventory_check"));
        assert_eq!(section_ids(&d), vec!["focus-inventory"]);
        assert!(d.result.sections[0].content.contains("Adequate"));
    }

    #[test]
    fn test_unknown_item_is_unregistered() {
        let d = run("do we have saffron");
        assert_eq!(d.handler, Some("inventory_check"));
        assert!(d.result.sections[0].content.contains("New / Unregistered"));
        assert!(d.result.sections[1].content.contains("Register saffron"));
    }
}
