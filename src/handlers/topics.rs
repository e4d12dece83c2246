//! Long-running administrative topics. Each one answers information requests
//! with a brief plus checklist and action requests with the checklist alone.

use super::{brief_or_checklist, HandlerContext};
use crate::actions::{procurement_actions, procurement_outlook, RiskTier};
use crate::registry::RecordKind;
use crate::types::{HandlerResult, HighlightCard};

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Prasadam production
// ---------------------------------------------------------------------------

pub fn production_triggers(ctx: &HandlerContext<'_>) -> bool {
    ctx.mentions_any(&["batch", "batches", "laddu", "laddus", "production", "boondi"])
}

pub fn production_produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let ghee_cover = ctx
        .lookup
        .search_kind("ghee", Some(RecordKind::Inventory))
        .record
        .and_then(|r| r.attribute_value("Days of cover").map(|v| format!("{} days", v)))
        .unwrap_or_else(|| "Unknown".to_string());

    let card = HighlightCard::new("Laddu prasadam production")
        .status("Batch 3 of 6 in progress")
        .field("Target today", "2.4 lakh laddus")
        .field("Produced so far", "1.1 lakh")
        .field("Ghee cover", ghee_cover)
        .field("Boondi kitchen", "Both shifts staffed")
        .note("Counter 4 ran short yesterday evening.");

    let checklist = lines(&[
        "Confirm batch 4 start with the potu supervisor",
        "Check ghee and besan issue against the batch sheet",
        "Send quality samples to the lab",
        "Open the reserve counter from 5 PM",
        "Reconcile token sales with laddus issued",
    ]);

    brief_or_checklist(
        ctx,
        "prasadam-production",
        "Prasadam Production",
        card,
        checklist,
        "Here's today's laddu production picture.",
    )
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

pub fn maintenance_triggers(ctx: &HandlerContext<'_>) -> bool {
    ctx.mentions_any(&[
        "maintenance", "repair", "repairs", "broken", "leak", "leaking", "chariot", "generator", "lift",
    ])
}

pub fn maintenance_produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let asset = ctx.lookup.search_kind(ctx.query, Some(RecordKind::Asset)).record;

    let mut card = HighlightCard::new("Open maintenance work").status("4 tickets open");
    match &asset {
        Some(record) => {
            card = card.field("Asset", record.name.clone());
            for attr in &record.attributes {
                card = card.field(&attr.label, attr.value.clone());
            }
        }
        None => {
            card = card
                .field("Generator 2", "Service overdue by 12 days")
                .field("Queue complex lift", "Motor replaced, testing")
                .field("North gopuram", "Scaffolding inspection pending");
        }
    }

    let subject = asset.as_ref().map(|r| r.name.as_str()).unwrap_or("open tickets");
    let checklist = vec![
        format!("Get an engineering estimate for {}", subject),
        "Confirm the contractor's work schedule".to_string(),
        "Keep a standby arrangement during repairs".to_string(),
        "Close completed tickets in the asset register".to_string(),
    ];

    brief_or_checklist(
        ctx,
        "maintenance",
        "Maintenance Status",
        card,
        checklist,
        "Here's the maintenance position.",
    )
}

// ---------------------------------------------------------------------------
// Peak season readiness
// ---------------------------------------------------------------------------

pub fn season_triggers(ctx: &HandlerContext<'_>) -> bool {
    ctx.mentions_any(&["season", "peak", "summer rush", "holidays", "vacation rush", "crowd forecast"])
}

pub fn season_produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let card = HighlightCard::new("Summer peak season readiness")
        .status("Starts in 3 weeks")
        .field("Forecast footfall", "85,000 per day")
        .field("Queue complex", "2 halls under repair")
        .field("Drinking water points", "48 of 60 ready")
        .field("Shade pandals", "Tender awarded");

    let checklist = lines(&[
        "Finish queue hall repairs before the first weekend",
        "Add 12 drinking water points on the ghat road",
        "Hire seasonal sanitation staff",
        "Extend annadanam hours to 10 PM",
        "Agree police bandobast with the district SP",
        "Publish darshan advisories in four languages",
    ]);

    brief_or_checklist(
        ctx,
        "season-readiness",
        "Peak Season Readiness",
        card,
        checklist,
        "Here's how ready we are for the peak season.",
    )
}

// ---------------------------------------------------------------------------
// Approvals
// ---------------------------------------------------------------------------

pub fn approvals_triggers(ctx: &HandlerContext<'_>) -> bool {
    ctx.mentions_any(&["approval", "approvals", "approve", "sanction", "sanctions", "pending files"])
}

pub fn approvals_produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let card = HighlightCard::new("Approvals pipeline")
        .status("14 pending, 3 overdue")
        .field("With you", "9 files")
        .field("With finance committee", "3 files, Rs 61 lakh")
        .field("With trust board", "2 works sanctions")
        .note("Two finance committee files cross the 15-day limit on Friday.");

    let checklist = lines(&[
        "Clear the nine files on your desk",
        "Ask the finance committee secretary for a decision date",
        "Put the two works sanctions on the board agenda",
        "Send reminders on anything older than a week",
    ]);

    brief_or_checklist(
        ctx,
        "approvals-overview",
        "Approvals Overview",
        card,
        checklist,
        "Here's where every approval is sitting.",
    )
}

// ---------------------------------------------------------------------------
// Government directives
// ---------------------------------------------------------------------------

pub fn directives_triggers(ctx: &HandlerContext<'_>) -> bool {
    ctx.mentions_any(&[
        "directive",
        "directives",
        "circular",
        "circulars",
        "government order",
        "commissioner",
        "endowments department",
    ])
}

pub fn directives_produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let card = HighlightCard::new("Endowments department directives")
        .status("2 need compliance reports")
        .field("Plastic-free premises", "Report due in 5 days")
        .field("Online seva booking audit", "Report due in 12 days")
        .field("Staff rationalisation", "For information");

    let checklist = lines(&[
        "Assign an owner for each open directive",
        "Collect photographs for the plastic-free report",
        "Pull seva booking logs for the audit",
        "Send compliance reports to the commissioner's office",
    ]);

    brief_or_checklist(
        ctx,
        "directives",
        "Government Directives",
        card,
        checklist,
        "These are the directives that need a response.",
    )
}

// ---------------------------------------------------------------------------
// Audit & compliance
// ---------------------------------------------------------------------------

pub fn auditor_triggers(ctx: &HandlerContext<'_>) -> bool {
    ctx.mentions_any(&["auditor", "auditors", "audit", "compliance", "inspection"])
}

pub fn auditor_produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let card = HighlightCard::new("Audit readiness")
        .status("Mostly ready")
        .field("Hundi counting registers", "Up to date")
        .field("Jewellery verification", "Last done 7 months ago")
        .field("Purchase files", "4 missing quotations")
        .field("Previous audit paras", "6 open of 19")
        .note("Jewellery verification is usually the first thing auditors ask for.");

    let checklist = lines(&[
        "Keep hundi counting registers and CCTV logs ready",
        "Complete the pending jewellery verification",
        "Trace the four missing purchase quotations",
        "Prepare replies on the six open audit paras",
        "Assign a section officer to accompany the audit team",
        "Book the conference hall for the document walkthrough",
    ]);

    brief_or_checklist(
        ctx,
        "auditor-compliance",
        "Audit Compliance",
        card,
        checklist,
        "Here's our audit readiness and what to close before the team arrives.",
    )
}

// ---------------------------------------------------------------------------
// Procurement
// ---------------------------------------------------------------------------

pub fn procurement_triggers(ctx: &HandlerContext<'_>) -> bool {
    ctx.mentions_any(&["procurement", "purchase", "supplier", "suppliers", "vendor", "tonnes", "tonnage", "consignment"])
}

pub fn procurement_produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let outlook = procurement_outlook(&mut *ctx.rng);
    log::debug!("Procurement outlook drawn: {:?}", outlook);

    let card = HighlightCard::new("Rice procurement for annadanam")
        .status(format!("{} risk", outlook.tier))
        .field("Target", format!("{} tonnes", outlook.target_tonnes))
        .field("Received", format!("{} tonnes", outlook.received_tonnes))
        .field("Progress", format!("{}%", outlook.progress_percent()));
    let card = match outlook.tier {
        RiskTier::High => card.note("Current stock will not last until the next consignment."),
        _ => card,
    };

    let checklist = procurement_actions(&outlook);
    brief_or_checklist(
        ctx,
        "procurement-progress",
        "Procurement Progress",
        card,
        checklist,
        "Here's the procurement position for this cycle.",
    )
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{run, section_ids};

    #[test]
    fn test_information_request_gets_brief_and_planner() {
        let d = run("government auditor is visiting tomorrow");
        assert_eq!(d.handler, Some("auditor_compliance"));
        assert_eq!(section_ids(&d), vec!["focus-auditor-compliance", "planner-actions"]);
        assert_eq!(d.result.sections[1].sub_title.as_deref(), Some("Audit Compliance"));
    }

    #[test]
    fn test_action_request_gets_planner_only() {
        let d = run("Prepare for the audit next week");
        assert_eq!(d.handler, Some("auditor_compliance"));
        assert_eq!(section_ids(&d), vec!["planner-actions"]);
        assert!(d.result.message.unwrap().contains("audit compliance"));
    }

    #[test]
    fn test_maintenance_uses_asset_record() {
        let d = run("what's the status of chariot repairs");
        assert_eq!(d.handler, Some("maintenance"));
        assert!(d.result.sections[0].content.contains("Festival Chariot"));
    }

    #[test]
    fn test_procurement_is_seeded() {
        let a = run("rice procurement progress");
        let b = run("rice procurement progress");
        assert_eq!(a.handler, Some("procurement_progress"));
        assert_eq!(a.result.sections, b.result.sections);
        assert!(a.result.sections[1].content.starts_with("[·] "));
    }

    #[test]
    fn test_directives_topic() {
        let d = run("any new circulars from the commissioner");
        assert_eq!(d.handler, Some("directives"));
        assert_eq!(section_ids(&d)[0], "focus-directives");
    }
}
