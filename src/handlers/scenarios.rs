//! Named recurring personas and events. These outrank every generic topic so
//! "Jeeyar Swamy's visit" never lands in the plain VIP brief.

use super::vip::parse_visit;
use super::HandlerContext;
use crate::facts;
use crate::types::{HandlerResult, HighlightCard, Section};

pub fn jeeyar_triggers(ctx: &HandlerContext<'_>) -> bool {
    ctx.mentions_any(&["jeeyar", "pontiff", "mangalasasanam"])
}

pub fn jeeyar_produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let visit = parse_visit(ctx);

    let arrival = visit
        .as_ref()
        .and_then(|v| v.time.clone())
        .unwrap_or_else(|| "After morning archana".to_string());

    let card = HighlightCard::new("Mangalasasanam by Jeeyar Swamy")
        .status("Peetadhipathi honours")
        .field("Reception", "Purna kumbham at the Mahadwaram")
        .field("Arrival", arrival)
        .field("Route", "Dhwajasthambham, main sanctum, Ramanuja sannidhi")
        .field("Duration", "About 90 minutes")
        .note("Keep the inner prakaram closed to general queue during the visit.");

    let checklist = [
        "Confirm Jeeyar Swamy's arrival time with the mutt office",
        "Arrange purna kumbham and vedic scholars at the Mahadwaram",
        "Reserve the inner prakaram for the procession",
        "Prepare sambhavana and vastram",
        "Inform the head priest about special archana",
        "Set up seating for the anugraha bhashanam",
        "Hold general darshan queue during the sanctum visit",
        "Brief security on the disciples' entry",
    ];

    let mut result = HandlerResult::handled()
        .section(Section::focus("jeeyar-visit", "Jeeyar Swamy Visit", card))
        .section(Section::planner(&checklist).with_sub_title("Jeeyar Swamy visit"))
        .message("Jeeyar Swamy's visit is on the calendar. Here's the reception plan.")
        .deferred();

    if let Some(v) = visit {
        result = result.vip_visit(v);
    }
    result
}

pub fn festival_triggers(ctx: &HandlerContext<'_>) -> bool {
    ctx.mentions_any(&["brahmotsavam", "brahmotsavams"])
}

pub fn festival_produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let card = HighlightCard::new("Brahmotsavam readiness")
        .status("Day 4 of 9")
        .field("Tonight's vahanam", "Garuda vahanam at 7 PM")
        .field("Expected footfall", "1.8 lakh")
        .field("Police deployment", "1,200 personnel")
        .field("Annadanam target", "95,000 meals")
        .note("Garuda seva draws the largest crowd of the festival.");

    let items = facts::aggregate(&format!("{} festival procession", ctx.query), Some(ctx.today));
    let schedule = items
        .iter()
        .map(|i| format!("{} - {}", i.time, i.description))
        .collect::<Vec<_>>()
        .join("\n");

    let checklist = [
        "Walk the mada streets procession route",
        "Confirm Garuda vahanam decoration is complete",
        "Open additional queue lines from 3 PM",
        "Double annadanam counters for the evening",
        "Position medical camps on all four streets",
        "Review CCTV control room staffing",
        "Issue lost-and-found announcements schedule",
    ];

    HandlerResult::handled()
        .section(Section::focus("brahmotsavam", "Brahmotsavam Brief", card))
        .section(Section::text("brahmotsavam-schedule", "Festival Schedule", schedule))
        .section(Section::planner(&checklist).with_sub_title("Brahmotsavam"))
        .message("Here's where Brahmotsavam stands today, with the festival schedule.")
}
