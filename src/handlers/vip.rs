//! Generic VIP / dignitary visits, plus the visit parser shared with the
//! named-persona scenarios.

use std::sync::OnceLock;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::Regex;

use super::{generated_checklist, HandlerContext};
use crate::registry::RecordKind;
use crate::types::{HandlerResult, HighlightCard, RegistrationStatus, Section, VipVisit};

const VISIT_MARKERS: &[&str] = &[
    "vip",
    "visit",
    "visits",
    "visiting",
    "dignitary",
    "dignitaries",
    "minister",
    "delegation",
    "governor",
];

const MONTHS: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const WEEKDAYS: &[(&str, Weekday)] = &[
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

fn visit_by_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bvisits?\s+(?:by|from|of)\s+(?:the\s+)?([a-z][a-z .']*?)(?:\s+(?:on|at|next|this|tomorrow|today|for)\b.*)?$")
            .unwrap()
    })
}

fn is_visiting_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:the\s+)?([a-z][a-z .']*?)\s+(?:is|are|will be)\s+(?:visiting|coming|arriving)\b")
            .unwrap()
    })
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})(?::(\d{2}))?\s?(am|pm)\b").unwrap())
}

fn day_month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})(?:st|nd|rd|th)?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\b")
            .unwrap()
    })
}

fn month_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+(\d{1,2})(?:st|nd|rd|th)?\b")
            .unwrap()
    })
}

fn purpose_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bfor\s+(?:the\s+)?([a-z][a-z ]+)$").unwrap())
}

pub fn triggers(ctx: &HandlerContext<'_>) -> bool {
    ctx.mentions_any(VISIT_MARKERS)
}

pub fn produce(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let visit = parse_visit(ctx);

    let visitor = visit
        .as_ref()
        .map(|v| v.visitor.clone())
        .unwrap_or_else(|| "Unnamed VIP".to_string());
    let status = visit
        .as_ref()
        .map(|v| v.registration.label())
        .unwrap_or("Details pending");

    let mut card = HighlightCard::new(format!("VIP visit: {}", visitor))
        .status(status)
        .field("Date", describe_date(visit.as_ref().and_then(|v| v.date), ctx.today))
        .field(
            "Time",
            visit
                .as_ref()
                .and_then(|v| v.time.clone())
                .unwrap_or_else(|| "To be confirmed".to_string()),
        );

    let lookup = ctx.lookup.search_kind(ctx.query, Some(RecordKind::Vip));
    match lookup.record {
        Some(record) => {
            for attr in record.attributes {
                card = card.field(&attr.label, attr.value);
            }
        }
        None => {
            card = card.note("Visitor is not in the VIP register. Verify identity with the protocol office.");
        }
    }

    let checklist = generated_checklist(ctx, Some(&visitor));
    let mut result = HandlerResult::handled()
        .section(Section::focus("vip-visit", "VIP Visit Brief", card))
        .section(Section::planner(&checklist).with_sub_title(format!("Visit of {}", visitor)))
        .message(format!(
            "I've checked the VIP register and prepared a protocol brief for {}.",
            visitor
        ))
        .deferred();

    if let Some(v) = visit {
        result = result.vip_visit(v);
    }
    result
}

/// Parse a visit out of the query. `None` when no visitor can be named.
pub fn parse_visit(ctx: &HandlerContext<'_>) -> Option<VipVisit> {
    let lookup = ctx.lookup.search_kind(ctx.query, Some(RecordKind::Vip));
    let (visitor, registration) = match lookup.record {
        Some(record) => (
            record.name,
            RegistrationStatus::Registered {
                record_id: record.id,
            },
        ),
        None => (extract_visitor_name(ctx.query)?, RegistrationStatus::Unregistered),
    };

    Some(VipVisit {
        visitor,
        registration,
        date: parse_visit_date(&ctx.folded, ctx.today),
        time: parse_visit_time(&ctx.folded),
        purpose: purpose_re()
            .captures(ctx.query)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string()),
    })
}

/// Name following "visit by ..." or preceding "... is visiting".
pub fn extract_visitor_name(query: &str) -> Option<String> {
    let raw = visit_by_re()
        .captures(query)
        .or_else(|| is_visiting_re().captures(query))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())?;

    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.is_empty() || words.len() > 6 {
        return None;
    }
    // "someone", "a vip" and the like don't name anybody
    if words.iter().all(|w| matches!(w.to_lowercase().as_str(), "a" | "an" | "some" | "someone" | "vip" | "vips" | "guest" | "guests")) {
        return None;
    }
    Some(title_case(&words))
}

fn title_case(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve "today", "tomorrow", weekday names and "12 march" style dates.
pub fn parse_visit_date(folded: &str, today: NaiveDate) -> Option<NaiveDate> {
    if folded.contains("day after tomorrow") {
        return today.checked_add_days(Days::new(2));
    }
    if folded.contains("tomorrow") {
        return today.checked_add_days(Days::new(1));
    }
    if folded.contains("today") || folded.contains("tonight") {
        return Some(today);
    }

    for (name, weekday) in WEEKDAYS {
        if folded.contains(name) {
            let current = today.weekday().num_days_from_monday();
            let target = weekday.num_days_from_monday();
            let ahead = match (target + 7 - current) % 7 {
                0 => 7,
                n => n,
            };
            return today.checked_add_days(Days::new(ahead as u64));
        }
    }

    let (day, month) = if let Some(c) = day_month_re().captures(folded) {
        (c.get(1)?.as_str(), c.get(2)?.as_str())
    } else if let Some(c) = month_day_re().captures(folded) {
        (c.get(2)?.as_str(), c.get(1)?.as_str())
    } else {
        return None;
    };
    let day: u32 = day.parse().ok()?;
    let month = MONTHS.iter().position(|m| *m == month)? as u32 + 1;

    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if this_year < today {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    } else {
        Some(this_year)
    }
}

/// "10am", "10:30 pm" → "10:00 AM", "10:30 PM".
pub fn parse_visit_time(folded: &str) -> Option<String> {
    let caps = time_re().captures(folded)?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    if hour == 0 || hour > 12 {
        return None;
    }
    let minutes = caps.get(2).map(|m| m.as_str()).unwrap_or("00");
    let period = caps.get(3)?.as_str().to_uppercase();
    Some(format!("{}:{} {}", hour, minutes, period))
}

fn describe_date(date: Option<NaiveDate>, today: NaiveDate) -> String {
    match date {
        Some(d) if d == today => "Today".to_string(),
        Some(d) if Some(d) == today.succ_opt() => format!("Tomorrow, {}", d.format("%-d %B")),
        Some(d) => d.format("%A, %-d %B %Y").to_string(),
        None => "To be confirmed".to_string(),
    }
}
