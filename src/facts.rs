//! Calendar fact aggregation.
//!
//! Three per-source generators each contribute a handful of canned items based
//! on what the query mentions. The union is sorted by time of day and capped.
//! Nothing here is random: the same query and date always give the same list.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::normalizer::{fold, mentions, mentions_any};
use crate::types::{CalendarItem, FactSource, HighlightCard};

/// At most this many items reach the brief.
pub const MAX_CALENDAR_ITEMS: usize = 5;

const EKADASHI_MARKERS: &[&str] = &["ekadashi", "ekadasi", "vaikunta"];

/// Build the chronologically ordered calendar for a query.
pub fn aggregate(query: &str, date: Option<NaiveDate>) -> Vec<CalendarItem> {
    let q = fold(query);

    let mut items = Vec::new();
    items.extend(ritual_items(&q));
    items.extend(operations_items(&q, date));
    items.extend(administration_items(&q, date));

    if mentions_any(&q, EKADASHI_MARKERS) {
        items.extend(ekadashi_sequence());
    }

    // Stable: equal times keep generator order
    items.sort_by_key(|item| time_key(&item.time));
    items.truncate(MAX_CALENDAR_ITEMS);
    items
}

fn ritual_items(q: &str) -> Vec<CalendarItem> {
    let mut items = vec![CalendarItem::new(
        "5:30 AM",
        "Suprabhatam seva and morning abhishekam",
        FactSource::Rituals,
    )];

    if mentions_any(q, &["festival", "utsavam", "procession", "brahmotsavam"]) {
        items.push(CalendarItem::new(
            "6PM",
            "Utsava murthy procession around the mada streets",
            FactSource::Rituals,
        ));
    }
    if mentions_any(q, &["kalyanam", "wedding", "marriage"]) {
        items.push(CalendarItem::new(
            "10:30 AM",
            "Kalyanotsavam in the main mandapam",
            FactSource::Rituals,
        ));
    }
    if mentions_any(q, &["evening", "aarti", "arati"]) {
        items.push(CalendarItem::new("7:15 PM", "Sandhya aarti", FactSource::Rituals));
    }

    items
}

fn operations_items(q: &str, date: Option<NaiveDate>) -> Vec<CalendarItem> {
    let mut items = Vec::new();

    if mentions_any(q, &["prasadam", "kitchen", "laddu", "annadanam", "food", "fasting"]) {
        items.push(CalendarItem::new(
            "11:00 AM",
            "Annadanam hall opens for first batch",
            FactSource::Operations,
        ));
    }
    if mentions_any(q, &["crowd", "darshan", "queue", "rush", "schedule"]) {
        items.push(CalendarItem::new(
            "8:00 AM",
            "Sarva darshan queue complex opens",
            FactSource::Operations,
        ));
    }

    let weekend = date
        .map(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .unwrap_or(false);
    if weekend {
        items.push(CalendarItem::new(
            "4PM",
            "Weekend crowd control shift change",
            FactSource::Operations,
        ));
    }

    if items.is_empty() {
        items.push(CalendarItem::new(
            "9:00 AM",
            "Operations stand-up with shift supervisors",
            FactSource::Operations,
        ));
    }
    items
}

fn administration_items(q: &str, date: Option<NaiveDate>) -> Vec<CalendarItem> {
    let mut items = Vec::new();

    if mentions_any(q, &["meeting", "board", "trust", "review"]) {
        items.push(CalendarItem::new(
            "3:00 PM",
            "Trust board review of pending sanctions",
            FactSource::Administration,
        ));
    }
    if mentions_any(q, &["vip", "visit", "dignitary"]) {
        items.push(CalendarItem::new(
            "11:30 AM",
            "Protocol briefing for VIP darshan",
            FactSource::Administration,
        ));
    }
    if mentions(q, "audit") || mentions(q, "auditor") {
        items.push(CalendarItem::new(
            "2:00 PM",
            "Document walkthrough with audit team",
            FactSource::Administration,
        ));
    }

    if date.map(|d| d.weekday() == Weekday::Mon).unwrap_or(false) {
        items.push(CalendarItem::new(
            "10:00 AM",
            "Weekly department heads meeting",
            FactSource::Administration,
        ));
    }

    if items.is_empty() {
        items.push(CalendarItem::new(
            "1:00 PM",
            "File disposal with the personal assistant",
            FactSource::Administration,
        ));
    }
    items
}

/// Fixed ritual sequence for the fortnightly fast.
fn ekadashi_sequence() -> Vec<CalendarItem> {
    vec![
        CalendarItem::new("4AM", "Vaikunta dwaram opens for darshan", FactSource::Observance),
        CalendarItem::new(
            "5:45 AM",
            "Vishnu Sahasranama parayanam",
            FactSource::Observance,
        ),
        CalendarItem::new(
            "12:00 PM",
            "Phalahar prasadam for fasting devotees",
            FactSource::Observance,
        ),
        CalendarItem::new("8PM", "Ekadashi jagaran bhajans", FactSource::Observance),
    ]
}

/// Convert a display time like "9:00 AM", "4PM" or "18:30" to minutes since
/// midnight. Unparseable times sort last.
pub fn time_key(time: &str) -> u32 {
    const UNPARSEABLE: u32 = 9999;

    let compact: String = time.trim().to_uppercase().split_whitespace().collect();
    let (clock, period) = match compact.find(['A', 'P']) {
        Some(pos) => (&compact[..pos], Some(&compact[pos..])),
        None => (compact.as_str(), None),
    };

    let mut parts = clock.splitn(2, ':');
    let hours: u32 = match parts.next().and_then(|h| h.parse().ok()) {
        Some(h) => h,
        None => return UNPARSEABLE,
    };
    let minutes: u32 = match parts.next() {
        Some(m) => match m.parse() {
            Ok(m) => m,
            Err(_) => return UNPARSEABLE,
        },
        None => 0,
    };
    if minutes >= 60 {
        return UNPARSEABLE;
    }

    let h24 = match period {
        Some(p) if p.starts_with('P') && hours != 12 => hours + 12,
        Some(p) if p.starts_with('A') && hours == 12 => 0,
        Some(_) if hours == 0 || hours > 12 => return UNPARSEABLE,
        _ => hours,
    };
    if h24 > 23 {
        return UNPARSEABLE;
    }

    h24 * 60 + minutes
}

/// Turn an aggregated calendar into a brief card.
pub fn calendar_card(items: &[CalendarItem], date: Option<NaiveDate>) -> HighlightCard {
    let headline = match date {
        Some(d) => format!("Schedule for {}", d.format("%A, %-d %B")),
        None => "Today's schedule".to_string(),
    };
    let mut card = HighlightCard::new(headline).status(format!("{} items", items.len()));
    for item in items {
        card = card.field(&item.time, item.description.clone());
    }
    card
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_key_formats() {
        assert_eq!(time_key("9:00 AM"), 540);
        assert_eq!(time_key("4PM"), 960);
        assert_eq!(time_key("4 PM"), 960);
        assert_eq!(time_key("12:00 PM"), 720);
        assert_eq!(time_key("12:30 AM"), 30);
        assert_eq!(time_key("18:30"), 1110);
        assert_eq!(time_key("soon"), 9999);
        assert_eq!(time_key("13 PM"), 9999);
    }

    #[test]
    fn test_ekadashi_sorted_chronologically() {
        let items = aggregate("ekadashi fasting schedule", None);
        assert!(!items.is_empty());
        assert!(items.len() <= MAX_CALENDAR_ITEMS);
        let keys: Vec<u32> = items.iter().map(|i| time_key(&i.time)).collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]), "not sorted: {:?}", keys);
        assert_eq!(items[0].time, "4AM");
        assert!(time_key(&items[0].time) <= time_key(&items[items.len() - 1].time));
    }

    #[test]
    fn test_ekadashi_sequence_only_when_mentioned() {
        let items = aggregate("today's schedule", None);
        assert!(items.iter().all(|i| i.source != FactSource::Observance));
    }

    #[test]
    fn test_truncates_to_five() {
        let items = aggregate(
            "ekadashi festival kalyanam evening prasadam crowd board vip audit",
            None,
        );
        assert_eq!(items.len(), MAX_CALENDAR_ITEMS);
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14);
        assert_eq!(aggregate("festival rush", date), aggregate("festival rush", date));
    }

    #[test]
    fn test_weekend_adds_crowd_shift() {
        let saturday = NaiveDate::from_ymd_opt(2026, 3, 14);
        let items = aggregate("my day", saturday);
        assert!(items.iter().any(|i| i.description.contains("Weekend")));
    }

    #[test]
    fn test_every_source_contributes_on_a_quiet_day() {
        let wednesday = NaiveDate::from_ymd_opt(2026, 3, 11);
        for date in [wednesday, None] {
            let items = aggregate("my day", date);
            for source in [FactSource::Rituals, FactSource::Operations, FactSource::Administration] {
                assert!(items.iter().any(|i| i.source == source), "{:?} missing", source);
            }
        }
        assert!(administration_items("my day", wednesday)
            .iter()
            .any(|i| i.description.contains("File disposal")));
    }

    #[test]
    fn test_calendar_card_has_one_field_per_item() {
        let items = aggregate("board meeting", None);
        let card = calendar_card(&items, None);
        assert_eq!(card.highlights.len(), items.len());
    }
}
