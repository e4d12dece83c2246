//! "Show / view / list / check X": one focus card for the named category,
//! no planner bundle.

use std::sync::OnceLock;

use regex::Regex;

use super::HandlerContext;
use crate::normalizer::mentions_any;
use crate::types::{HandlerResult, HighlightCard, Section};

fn command_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:please\s+)?(?:show|view|list|check|display)\b").unwrap())
}

/// Categories a quick action can open. Inventory goes to its own handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickCategory {
    Approvals,
    Appointments,
    Finance,
    Vip,
    Events,
    Assets,
    Staff,
}

impl QuickCategory {
    fn detect(folded: &str) -> Option<Self> {
        let table: &[(QuickCategory, &[&str])] = &[
            (QuickCategory::Approvals, &["approval", "approvals", "pending", "sanctions"]),
            (QuickCategory::Appointments, &["appointment", "appointments", "meetings", "calendar"]),
            (QuickCategory::Finance, &["finance", "hundi", "collections", "donations", "revenue"]),
            (QuickCategory::Vip, &["vip", "vips", "visitors", "dignitaries"]),
            (QuickCategory::Events, &["event", "events", "festivals", "utsavams"]),
            (QuickCategory::Assets, &["asset", "assets", "vehicles", "equipment"]),
            (QuickCategory::Staff, &["staff", "attendance", "roster", "employees"]),
        ];
        table
            .iter()
            .find(|(_, words)| mentions_any(folded, words))
            .map(|(category, _)| *category)
    }
}

pub fn triggers(ctx: &HandlerContext<'_>) -> bool {
    command_re().is_match(&ctx.folded) && QuickCategory::detect(&ctx.folded).is_some()
}

pub fn produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let Some(category) = QuickCategory::detect(&ctx.folded) else {
        return HandlerResult::declined();
    };

    let (slug, title, card) = match category {
        QuickCategory::Approvals => (
            "approvals",
            "Pending Approvals",
            HighlightCard::new("14 files awaiting your signature")
                .status("3 overdue")
                .field("Purchase orders", "6 (Rs 18.4 lakh)")
                .field("Works sanctions", "3 (Rs 42 lakh)")
                .field("Leave requests", "5")
                .note("Oldest item: gopuram scaffolding contract, pending 9 days."),
        ),
        QuickCategory::Appointments => (
            "appointments",
            "Today's Appointments",
            HighlightCard::new("5 appointments today")
                .field("10:00 AM", "District Collector, festival security")
                .field("12:30 PM", "Donor family, annadanam endowment")
                .field("3:00 PM", "Trust board review")
                .field("4:30 PM", "Engineering section, queue complex works")
                .field("6:00 PM", "Press briefing"),
        ),
        QuickCategory::Finance => (
            "finance",
            "Finance Snapshot",
            HighlightCard::new("Collections this week")
                .status("Up 8% on last week")
                .field("Hundi", "Rs 1.92 crore")
                .field("Seva tickets", "Rs 38.5 lakh")
                .field("Online donations", "Rs 21.0 lakh")
                .field("Prasadam sales", "Rs 14.2 lakh"),
        ),
        QuickCategory::Vip => (
            "vip-list",
            "Upcoming VIP Visits",
            HighlightCard::new("3 protocol visits this week")
                .field("Thursday", "High Court judge, family darshan")
                .field("Saturday", "Union minister, with delegation")
                .field("Sunday", "Consul general, cultural visit"),
        ),
        QuickCategory::Events => (
            "events",
            "Upcoming Events",
            HighlightCard::new("Next 14 days")
                .field("Ekadashi", "Vaikunta dwaram darshan")
                .field("Kalyanotsavam", "Weekly, Saturday 10:30 AM")
                .field("Teppotsavam", "Float festival, planning stage"),
        ),
        QuickCategory::Assets => (
            "assets",
            "Asset Register",
            HighlightCard::new("Assets needing attention")
                .status("4 open tickets")
                .field("Festival chariot", "Axle inspection due")
                .field("Generator 2", "Service overdue")
                .field("Queue complex lift", "Under repair"),
        ),
        QuickCategory::Staff => (
            "staff",
            "Staff Attendance",
            HighlightCard::new("Attendance today")
                .status("94% present")
                .field("Priests", "28 of 30")
                .field("Security", "112 of 118")
                .field("Kitchen", "64 of 70")
                .field("Sanitation", "81 of 85"),
        ),
    };

    HandlerResult::handled()
        .section(Section::focus(slug, title, card))
        .message(format!("Here's the {} view.", title.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{run, section_ids};

    #[test]
    fn test_detect_category() {
        assert_eq!(QuickCategory::detect("show pending approvals"), Some(QuickCategory::Approvals));
        assert_eq!(QuickCategory::detect("view hundi collections"), Some(QuickCategory::Finance));
        assert_eq!(QuickCategory::detect("check ghee stock"), None);
    }

    #[test]
    fn test_show_approvals_is_focus_only() {
        let d = run("Show pending approvals");
        assert_eq!(d.handler, Some("quick_action"));
        assert_eq!(section_ids(&d), vec!["focus-approvals"]);
        assert!(d.result.sections[0].title.contains("Approvals"));
    }

    #[test]
    fn test_command_verb_required() {
        let d = run("staff attendance is low today");
        assert_ne!(d.handler, Some("quick_action"));
    }
}
