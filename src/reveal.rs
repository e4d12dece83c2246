//! Section reveal state machine.
//!
//! `idle -> generating -> complete`, with `(current, typing_index)` tracking
//! progress inside the active section. The machine never touches the clock:
//! each [`RevealScheduler::step`] reports how long to wait before the next
//! one and the engine schedules it.
//!
//! Sections reveal strictly in list order. Atomic sections (focus cards and
//! component sections) show in one step; everything else grows one character
//! per tick and pauses to settle before handing over to the next section.

use crate::types::{GenerationStatus, Section, TimingConfig};

/// What the engine should do after a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Schedule the next step after this many milliseconds.
    pub next_delay_ms: Option<u64>,
    /// The first section of this query just became visible.
    pub planning_started: bool,
    /// Every section is revealed.
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct RevealScheduler {
    status: GenerationStatus,
    current: Option<usize>,
    /// Characters of the current section already exposed.
    typing_index: usize,
    /// The current section has waited its first tick.
    entered: bool,
    settling: bool,
    planning_notified: bool,
    char_tick_ms: u64,
    settle_ms: u64,
}

impl RevealScheduler {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            status: GenerationStatus::Idle,
            current: None,
            typing_index: 0,
            entered: false,
            settling: false,
            planning_notified: false,
            char_tick_ms: timing.char_tick_ms,
            settle_ms: timing.settle_ms,
        }
    }

    pub fn status(&self) -> GenerationStatus {
        self.status
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn typing_index(&self) -> usize {
        self.typing_index
    }

    /// A query was accepted; its sections arrive later.
    pub fn mark_generating(&mut self) {
        self.status = GenerationStatus::Generating;
        self.current = None;
        self.typing_index = 0;
        self.settling = false;
        self.entered = false;
    }

    /// Point the machine at the first section that still needs revealing.
    ///
    /// Returns the delay before the first step, or `None` when there is
    /// nothing to reveal and the query is already complete.
    pub fn begin(&mut self, sections: &[Section]) -> Option<u64> {
        self.status = GenerationStatus::Generating;
        self.planning_notified = false;
        self.settling = false;
        self.entered = false;

        match sections.iter().position(needs_reveal) {
            Some(idx) => {
                self.current = Some(idx);
                self.typing_index = sections[idx].visible_content.chars().count();
                Some(0)
            }
            None => {
                self.current = None;
                self.typing_index = 0;
                self.status = GenerationStatus::Complete;
                None
            }
        }
    }

    /// Run one step against the section list.
    pub fn step(&mut self, sections: &mut [Section]) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        if self.status != GenerationStatus::Generating {
            return outcome;
        }

        loop {
            let idx = match self.current {
                Some(idx) if idx < sections.len() => idx,
                _ => {
                    self.status = GenerationStatus::Complete;
                    outcome.completed = true;
                    return outcome;
                }
            };

            if self.settling {
                self.settling = false;
                self.advance(sections);
                continue;
            }

            let section = &mut sections[idx];
            if !section.is_visible {
                section.is_visible = true;
                if !self.planning_notified {
                    self.planning_notified = true;
                    outcome.planning_started = true;
                }
            }

            if section.is_atomic_reveal() {
                section.visible_content = section.content.clone();
                self.advance(sections);
                continue;
            }

            // Typed sections show their current prefix for one tick first
            if !self.entered {
                self.entered = true;
                outcome.next_delay_ms = Some(self.char_tick_ms);
                return outcome;
            }

            let offset = section.visible_content.len();
            match section.content.get(offset..).and_then(|rest| rest.chars().next()) {
                Some(c) => {
                    section.visible_content.push(c);
                    self.typing_index += 1;
                    log::trace!("Section {} at {}/{}", section.id, self.typing_index, section.content_chars());
                    if section.is_fully_revealed() {
                        self.settling = true;
                        outcome.next_delay_ms = Some(self.settle_ms);
                    } else {
                        outcome.next_delay_ms = Some(self.char_tick_ms);
                    }
                }
                None => {
                    self.settling = true;
                    outcome.next_delay_ms = Some(self.settle_ms);
                }
            }
            return outcome;
        }
    }

    /// Back to the initial state.
    pub fn reset(&mut self) {
        self.status = GenerationStatus::Idle;
        self.current = None;
        self.typing_index = 0;
        self.entered = false;
        self.settling = false;
        self.planning_notified = false;
    }

    /// Move past the current section and any that are already on screen.
    fn advance(&mut self, sections: &[Section]) {
        let mut idx = self.current.map(|i| i + 1).unwrap_or(0);
        while idx < sections.len() && !needs_reveal(&sections[idx]) {
            idx += 1;
        }
        self.current = Some(idx);
        self.entered = false;
        self.typing_index = sections
            .get(idx)
            .map(|s| s.visible_content.chars().count())
            .unwrap_or(0);
    }
}

fn needs_reveal(section: &Section) -> bool {
    !section.is_visible || !section.is_fully_revealed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HighlightCard;

    fn scheduler() -> RevealScheduler {
        RevealScheduler::new(&TimingConfig::default())
    }

    /// Step until complete, recording each section's visible prefix after
    /// every step.
    fn drain(r: &mut RevealScheduler, sections: &mut [Section]) -> Vec<Vec<String>> {
        let mut history = Vec::new();
        for _ in 0..10_000 {
            let outcome = r.step(sections);
            history.push(sections.iter().map(|s| s.visible_content.clone()).collect());
            if outcome.completed || outcome.next_delay_ms.is_none() {
                break;
            }
        }
        history
    }

    #[test]
    fn test_atomic_section_reveals_in_one_step() {
        let mut sections = vec![Section::focus("x", "X", HighlightCard::new("Headline"))];
        let mut r = scheduler();
        assert_eq!(r.begin(&sections), Some(0));

        let outcome = r.step(&mut sections);
        assert!(outcome.planning_started);
        assert!(outcome.completed);
        assert_eq!(sections[0].visible_content, sections[0].content);
        assert!(sections[0].is_visible);
        assert_eq!(r.status(), GenerationStatus::Complete);
    }

    #[test]
    fn test_typed_section_is_monotonic_prefix() {
        let mut sections = vec![Section::planner(&["Check the gates"])];
        let content = sections[0].content.clone();
        let mut r = scheduler();
        r.begin(&sections);

        let history = drain(&mut r, &mut sections);
        let lengths: Vec<usize> = history.iter().map(|h| h[0].len()).collect();
        assert!(lengths.windows(2).all(|w| w[0] <= w[1]));
        assert!(history.iter().all(|h| content.starts_with(&h[0])));
        assert!(history
            .iter()
            .any(|h| !h[0].is_empty() && h[0].len() < content.len()));
        assert_eq!(sections[0].visible_content, content);
        assert_eq!(r.status(), GenerationStatus::Complete);
    }

    #[test]
    fn test_settle_pause_before_next_section() {
        let mut sections = vec![
            Section::text("a", "A", "ab"),
            Section::focus("b", "B", HighlightCard::new("b")),
        ];
        let mut r = scheduler();
        r.begin(&sections);

        assert_eq!(r.step(&mut sections).next_delay_ms, Some(20));
        assert_eq!(r.step(&mut sections).next_delay_ms, Some(20));
        let last_char = r.step(&mut sections);
        assert_eq!(last_char.next_delay_ms, Some(400));
        assert!(!sections[1].is_visible);

        let handover = r.step(&mut sections);
        assert!(handover.completed);
        assert_eq!(sections[1].visible_content, sections[1].content);
    }

    #[test]
    fn test_begin_resumes_partially_revealed_section() {
        let mut planner = Section::planner(&["A", "B"]);
        planner.visible_content = "[·] A".to_string();
        planner.is_visible = true;
        let mut sections = vec![planner];

        let mut r = scheduler();
        r.begin(&sections);
        assert_eq!(r.typing_index(), 5);

        // First step holds the existing prefix
        r.step(&mut sections);
        assert_eq!(sections[0].visible_content, "[·] A");
        r.step(&mut sections);
        assert_eq!(sections[0].visible_content, "[·] A\n");
    }

    #[test]
    fn test_skips_sections_already_on_screen() {
        let mut done = Section::text("old", "Old", "done");
        done.visible_content = done.content.clone();
        done.is_visible = true;
        let mut sections = vec![done, Section::focus("new", "New", HighlightCard::new("n"))];

        let mut r = scheduler();
        r.begin(&sections);
        assert_eq!(r.current(), Some(1));
        assert!(r.step(&mut sections).completed);
    }

    #[test]
    fn test_new_query_clears_finished_index() {
        let mut sections = vec![Section::focus("a", "A", HighlightCard::new("a"))];
        let mut r = scheduler();
        r.begin(&sections);
        assert!(r.step(&mut sections).completed);
        assert_eq!(r.current(), Some(1));

        r.mark_generating();
        assert_eq!(r.status(), GenerationStatus::Generating);
        assert_eq!(r.current(), None);
        assert_eq!(r.typing_index(), 0);
    }

    #[test]
    fn test_nothing_to_reveal_completes_immediately() {
        let mut r = scheduler();
        assert_eq!(r.begin(&[]), None);
        assert_eq!(r.status(), GenerationStatus::Complete);
    }

    #[test]
    fn test_planning_notified_once_per_query() {
        let mut sections = vec![
            Section::focus("a", "A", HighlightCard::new("a")),
            Section::focus("b", "B", HighlightCard::new("b")),
        ];
        let mut r = scheduler();
        r.begin(&sections);
        let outcome = r.step(&mut sections);
        assert!(outcome.planning_started);
        assert!(sections.iter().all(|s| s.is_visible));

        sections.push(Section::focus("c", "C", HighlightCard::new("c")));
        r.begin(&sections);
        assert!(r.step(&mut sections).planning_started);
    }
}
