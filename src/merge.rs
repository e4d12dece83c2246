//! Section merge engine.
//!
//! Reconciles freshly produced sections with what is already on the canvas.
//! Focus cards are replaced wholesale; the planner accumulates. All functions
//! are pure `(existing, incoming) -> merged` transforms.

use crate::types::{Section, SectionPayload, FOCUS_ID_PREFIX};

/// Display categories that mark a section as a focus card even without the
/// `focus-` id prefix (cards restored from older layouts).
const CATEGORY_MARKERS: &[&str] = &[
    "appointments",
    "approvals",
    "finance",
    "vip",
    "events",
    "assets",
    "staff",
    "attendance",
    "inventory",
];

/// A highlighted brief slot. The planner is never a focus card.
pub fn is_focus_card(section: &Section) -> bool {
    if section.is_planner() {
        return false;
    }
    if section.id.starts_with(FOCUS_ID_PREFIX) {
        return true;
    }
    let title = section.title.to_lowercase();
    let id = section.id.to_lowercase();
    CATEGORY_MARKERS
        .iter()
        .any(|m| title.contains(m) || id.contains(m))
}

pub fn is_planner_section(section: &Section) -> bool {
    section.is_planner()
}

/// Remove every focus card from `existing`, put the incoming non-planner
/// sections in front, and fold the incoming planner into the existing one.
pub fn replace_focus_cards(existing: Vec<Section>, incoming: Vec<Section>) -> Vec<Section> {
    let kept: Vec<Section> = existing.into_iter().filter(|s| !is_focus_card(s)).collect();
    let (kept, existing_planner, planner_pos) = take_planners(kept);
    let (fresh, incoming_planner, _) = take_planners(incoming);

    let prepended = fresh.len();
    let mut merged = fresh;
    merged.extend(kept);

    let planner_pos = planner_pos.map(|p| p + prepended);
    place_planner(merged, merge_planner_sections(existing_planner, incoming_planner), planner_pos)
}

/// Append the incoming non-planner sections, folding any planner as above.
pub fn add_sections(existing: Vec<Section>, incoming: Vec<Section>) -> Vec<Section> {
    let (mut merged, existing_planner, planner_pos) = take_planners(existing);
    let (fresh, incoming_planner, _) = take_planners(incoming);
    merged.extend(fresh);

    place_planner(merged, merge_planner_sections(existing_planner, incoming_planner), planner_pos)
}

/// Concatenate two planner sections.
///
/// Content is joined with a newline (an empty side contributes nothing), the
/// incoming sub-title wins, and the existing `visible_content` is kept so an
/// in-progress reveal resumes instead of restarting.
pub fn merge_planner_sections(existing: Option<Section>, incoming: Option<Section>) -> Option<Section> {
    match (existing, incoming) {
        (None, None) => None,
        (Some(e), None) => Some(e),
        (None, Some(i)) => Some(i),
        (Some(mut e), Some(i)) => {
            let content = match (e.content.is_empty(), i.content.is_empty()) {
                (_, true) => e.content.clone(),
                (true, false) => i.content.clone(),
                (false, false) => format!("{}\n{}", e.content, i.content),
            };
            let lines: Vec<&str> = content.lines().collect();
            e.payload = SectionPayload::checklist_from_lines(&lines);
            e.content = content;
            if i.sub_title.is_some() {
                e.sub_title = i.sub_title;
            }
            Some(e)
        }
    }
}

/// Pull every planner out of `sections`, folded into one, along with the
/// index the first one occupied.
fn take_planners(sections: Vec<Section>) -> (Vec<Section>, Option<Section>, Option<usize>) {
    let mut rest = Vec::with_capacity(sections.len());
    let mut planner: Option<Section> = None;
    let mut position = None;

    for section in sections {
        if is_planner_section(&section) {
            if position.is_none() {
                position = Some(rest.len());
            }
            planner = merge_planner_sections(planner, Some(section));
        } else {
            rest.push(section);
        }
    }
    (rest, planner, position)
}

fn place_planner(mut sections: Vec<Section>, planner: Option<Section>, position: Option<usize>) -> Vec<Section> {
    if let Some(planner) = planner {
        match position {
            Some(pos) if pos <= sections.len() => sections.insert(pos, planner),
            _ => sections.push(planner),
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HighlightCard, PLANNER_TITLE};

    fn planner_count(sections: &[Section]) -> usize {
        sections.iter().filter(|s| s.title == PLANNER_TITLE).count()
    }

    fn revealed(mut s: Section) -> Section {
        s.visible_content = s.content.clone();
        s.is_visible = true;
        s
    }

    #[test]
    fn test_merge_with_empty_incoming_is_idempotent() {
        let p = Section::planner(&["A", "B"]);
        let empty = Section::planner::<&str>(&[]);
        let merged = merge_planner_sections(Some(p.clone()), Some(empty)).unwrap();
        assert_eq!(merged.content, p.content);
    }

    #[test]
    fn test_merge_preserves_visible_content_and_prefers_incoming_sub_title() {
        let existing = revealed(Section::planner(&["A"]).with_sub_title("Old"));
        let incoming = Section::planner(&["Buy flowers"]).with_sub_title("New");
        let merged = merge_planner_sections(Some(existing), Some(incoming)).unwrap();
        assert_eq!(merged.content, "[·] A\n[·] Buy flowers");
        assert_eq!(merged.visible_content, "[·] A");
        assert!(merged.content.starts_with(&merged.visible_content));
        assert_eq!(merged.sub_title.as_deref(), Some("New"));
        assert_eq!(
            merged.payload,
            SectionPayload::Checklist(vec!["A".into(), "Buy flowers".into()])
        );
    }

    #[test]
    fn test_replace_focus_keeps_planner_and_ordinary() {
        let existing = vec![
            revealed(Section::focus("a", "Brief A", HighlightCard::new("A"))),
            revealed(Section::planner(&["P"])),
            revealed(Section::text("notes", "Festival Notes", "O")),
        ];
        let incoming = vec![Section::focus("b", "Brief B", HighlightCard::new("B"))];
        let merged = replace_focus_cards(existing, incoming);

        let ids: Vec<&str> = merged.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["focus-b", "planner-actions", "notes"]);
        assert_eq!(merged[1].content, "[·] P");
    }

    #[test]
    fn test_replace_removes_category_titled_cards() {
        let legacy = Section::text("card-7", "Pending Approvals", "{}");
        let merged = replace_focus_cards(vec![legacy], vec![Section::focus("x", "X", HighlightCard::new("x"))]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "focus-x");
    }

    #[test]
    fn test_add_sections_appends_and_merges_planner() {
        let existing = vec![revealed(Section::planner(&["A"]))];
        let incoming = vec![
            Section::text("extra", "Extra", "more"),
            Section::planner(&["B"]),
        ];
        let merged = add_sections(existing, incoming);
        assert_eq!(planner_count(&merged), 1);
        assert_eq!(merged[0].content, "[·] A\n[·] B");
        assert_eq!(merged[1].id, "extra");
    }

    #[test]
    fn test_at_most_one_planner_across_calls() {
        let mut sections = Vec::new();
        for round in 0..4 {
            let incoming = vec![
                Section::focus("f", "F", HighlightCard::new("f")),
                Section::planner(&[format!("item {}", round)]),
            ];
            sections = if round % 2 == 0 {
                replace_focus_cards(sections, incoming)
            } else {
                add_sections(sections, incoming)
            };
            assert!(planner_count(&sections) <= 1);
        }
        let planner = sections.iter().find(|s| s.is_planner()).unwrap();
        assert_eq!(planner.content.lines().count(), 4);
    }

    #[test]
    fn test_planner_is_never_a_focus_card() {
        let planner = Section::planner(&["Approve staff leave"]).with_sub_title("Approvals");
        assert!(!is_focus_card(&planner));
    }
}
