//! Canvas engine: the dispatcher that owns the on-screen state.
//!
//! `dispatch` is synchronous and infallible. It runs the handler chain at
//! once, fires the side-channel callbacks, and schedules every visible effect
//! on the virtual [`Timeline`]. Time only moves through [`CanvasEngine::advance`]
//! (tests, the tokio driver) so the reveal is fully deterministic.
//!
//! Supersession: each dispatch bumps `generation`. Timers carry the
//! generation they were scheduled under and are discarded on mismatch, so a
//! reveal tick from an earlier query can never write into a newer one.

use std::time::Duration;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::handlers::{default_chain, HandlerChain, HandlerContext};
use crate::merge::{add_sections, is_focus_card, replace_focus_cards};
use crate::normalizer::normalize;
use crate::registry::{RecordLookup, StaticRegistry};
use crate::reveal::RevealScheduler;
use crate::timeline::{Timeline, TimerEvent};
use crate::typewriter;
use crate::types::{
    kind_histogram, CanvasModule, CanvasSnapshot, ChatMessage, Config, GenerationStatus,
    HandlerResult, Section, VipVisit,
};

/// Reply for a suggestion chip nothing claimed.
pub const PROCESSED_REPLY: &str = "I've processed your request.";

/// System line shown when the first section of a query appears.
pub const PLANNING_NOTICE: &str = "Planning…";

const GENERIC_RECOMMENDATIONS: &[&str] = &[
    "I can help with that. Try \"Show pending approvals\" to see what needs your signature.",
    "You could start with \"Give me today's overview\" for the day's schedule.",
    "Try asking \"Do we have enough ghee?\" for a stores check.",
    "Ask about an upcoming VIP visit and I'll prepare a protocol brief.",
    "Try \"How is rice procurement going?\" for the procurement position.",
];

/// Upper bound on timers fired by one [`CanvasEngine::run_until_idle`].
const MAX_TIMERS_PER_RUN: usize = 1_000_000;

pub type VipVisitCallback = Box<dyn FnOnce(&VipVisit) + Send>;
pub type ModuleCallback = Box<dyn FnOnce(CanvasModule) + Send>;

/// Per-dispatch options.
#[derive(Default)]
pub struct DispatchOptions {
    /// Treat as a suggestion chip even without the marker prefix.
    pub is_recommendation: bool,
    /// Text to show in the chat instead of the query itself.
    pub display_query: Option<String>,
    pub on_vip_visit_parsed: Option<VipVisitCallback>,
    pub on_module_detected: Option<ModuleCallback>,
}

impl DispatchOptions {
    pub fn recommendation(mut self) -> Self {
        self.is_recommendation = true;
        self
    }

    pub fn display_query(mut self, text: impl Into<String>) -> Self {
        self.display_query = Some(text.into());
        self
    }

    pub fn on_vip_visit_parsed(mut self, f: impl FnOnce(&VipVisit) + Send + 'static) -> Self {
        self.on_vip_visit_parsed = Some(Box::new(f));
        self
    }

    pub fn on_module_detected(mut self, f: impl FnOnce(CanvasModule) + Send + 'static) -> Self {
        self.on_module_detected = Some(Box::new(f));
        self
    }
}

pub struct CanvasEngine {
    config: Config,
    chain: HandlerChain,
    lookup: Box<dyn RecordLookup>,
    rng: StdRng,
    today: Option<NaiveDate>,

    sections: Vec<Section>,
    messages: Vec<ChatMessage>,
    reveal: RevealScheduler,
    timeline: Timeline,
    generation: u64,
    /// Result waiting for its thinking delay to elapse.
    pending: Option<HandlerResult>,
}

impl CanvasEngine {
    pub fn new(config: Config) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            reveal: RevealScheduler::new(&config.timing),
            config,
            chain: default_chain(),
            lookup: Box::new(StaticRegistry::seeded()),
            rng,
            today: None,
            sections: Vec::new(),
            messages: Vec::new(),
            timeline: Timeline::new(),
            generation: 0,
            pending: None,
        }
    }

    /// Swap the record source.
    pub fn with_lookup(mut self, lookup: Box<dyn RecordLookup>) -> Self {
        self.lookup = lookup;
        self
    }

    /// Pin "today" instead of reading the clock in the configured timezone.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_chain(mut self, chain: HandlerChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status(&self) -> GenerationStatus {
        self.reveal.status()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn current_section_index(&self) -> Option<usize> {
        self.reveal.current()
    }

    pub fn typing_index(&self) -> usize {
        self.reveal.typing_index()
    }

    /// Virtual milliseconds elapsed since the engine was created.
    pub fn now_ms(&self) -> u64 {
        self.timeline.now_ms()
    }

    /// Time until the next scheduled effect, if any.
    pub fn next_wakeup(&self) -> Option<Duration> {
        self.timeline.until_next().map(Duration::from_millis)
    }

    /// Nothing left to reveal or type.
    pub fn is_idle(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        CanvasSnapshot {
            status: self.reveal.status(),
            sections: self.sections.clone(),
            messages: self.messages.clone(),
            current_section_index: self.reveal.current(),
        }
    }

    /// Put sections handed over by the rendering layer back on the canvas,
    /// as already revealed. Duplicate planners are folded into one.
    pub fn restore_sections(&mut self, sections: Vec<Section>) {
        self.sections = add_sections(sections, Vec::new())
            .into_iter()
            .map(|mut s| {
                s.visible_content = s.content.clone();
                s.is_visible = true;
                s
            })
            .collect();
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Route a query and schedule its effects. Returns immediately.
    pub fn dispatch(&mut self, query: &str, options: DispatchOptions) {
        let normalized = normalize(query);
        if normalized.clean_query.is_empty() {
            log::debug!("Ignoring empty query");
            return;
        }
        let is_recommendation = normalized.is_recommendation || options.is_recommendation;

        if self.reveal.status() == GenerationStatus::Generating {
            log::info!("Superseding in-flight reveal (generation {})", self.generation);
        }
        self.generation += 1;
        self.timeline.clear();

        // The user line finalises any reply still typing; its ticks went
        // with the clear above
        let shown = options
            .display_query
            .unwrap_or_else(|| normalized.clean_query.clone());
        typewriter::append(&mut self.messages, ChatMessage::user(shown));
        self.reveal.mark_generating();

        let today = self.today.unwrap_or_else(|| self.config.today());
        let dispatched = {
            let mut ctx = HandlerContext::new(
                &normalized.clean_query,
                is_recommendation,
                today,
                &self.config.user_name,
                &*self.lookup,
                &mut self.rng,
            );
            self.chain.dispatch(&mut ctx)
        };

        let mut result = dispatched.result;
        if let Some(name) = dispatched.handler {
            log::info!(
                "Dispatch #{} handled by {} ({} sections)",
                self.generation,
                name,
                result.sections.len()
            );
        } else {
            result.message = Some(self.fallback_reply(is_recommendation));
        }

        // At most once per dispatch, never retried
        if let (Some(visit), Some(callback)) = (&result.vip_visit, options.on_vip_visit_parsed) {
            log::info!("VIP visit parsed: {}", visit.visitor);
            callback(visit);
        }
        if let (Some(module), Some(callback)) = (result.module, options.on_module_detected) {
            log::info!("Module detected: {}", module);
            callback(module);
        }

        self.pending = Some(result);
        self.timeline.schedule(
            self.config.timing.thinking_delay_ms,
            self.generation,
            TimerEvent::ApplyReply,
        );
    }

    fn fallback_reply(&mut self, is_recommendation: bool) -> String {
        if is_recommendation {
            return PROCESSED_REPLY.to_string();
        }
        let idx = self.rng.random_range(0..GENERIC_RECOMMENDATIONS.len());
        GENERIC_RECOMMENDATIONS[idx].to_string()
    }

    /// Clear the canvas and chat back to their initial state.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.timeline.clear();
        self.sections.clear();
        self.messages.clear();
        self.pending = None;
        self.reveal.reset();
        log::info!("Canvas reset");
    }

    // =========================================================================
    // Time
    // =========================================================================

    /// Move virtual time forward, firing every timer that falls due.
    pub fn advance(&mut self, by: Duration) {
        let target = self.timeline.now_ms().saturating_add(by.as_millis() as u64);
        while let Some(timer) = self.timeline.pop_due(target) {
            self.fire(timer.token, timer.event);
        }
        self.timeline.advance_to(target);
    }

    /// Fire timers until none remain. Returns the virtual time that passed.
    pub fn run_until_idle(&mut self) -> Duration {
        let start = self.timeline.now_ms();
        for _ in 0..MAX_TIMERS_PER_RUN {
            let Some(deadline) = self.timeline.next_deadline() else {
                break;
            };
            if let Some(timer) = self.timeline.pop_due(deadline) {
                self.fire(timer.token, timer.event);
            }
        }
        Duration::from_millis(self.timeline.now_ms() - start)
    }

    fn fire(&mut self, token: u64, event: TimerEvent) {
        if let TimerEvent::ChatTick { message_id } = &event {
            if typewriter::step(&mut self.messages, message_id) {
                self.timeline
                    .schedule(self.config.timing.chat_tick_ms, token, event.clone());
            }
            return;
        }

        if token != self.generation {
            log::debug!("Discarding stale {:?} from generation {}", event, token);
            return;
        }

        match event {
            TimerEvent::ApplyReply => self.apply_reply(),
            TimerEvent::ApplySections => self.apply_sections(),
            TimerEvent::RevealStep => self.reveal_step(),
            TimerEvent::ChatTick { .. } => {}
        }
    }

    fn apply_reply(&mut self) {
        let deferred = self
            .pending
            .as_ref()
            .map(|r| r.needs_async_processing)
            .unwrap_or(false);

        if let Some(text) = self.pending.as_mut().and_then(|r| r.message.take()) {
            let message = ChatMessage::assistant(text);
            if let Some(id) = typewriter::append(&mut self.messages, message) {
                self.timeline.schedule(
                    self.config.timing.chat_tick_ms,
                    self.generation,
                    TimerEvent::ChatTick { message_id: id },
                );
            }
        }

        if deferred {
            self.timeline.schedule(
                self.config.timing.async_step_delay_ms,
                self.generation,
                TimerEvent::ApplySections,
            );
        } else {
            self.apply_sections();
        }
    }

    fn apply_sections(&mut self) {
        let incoming = self.pending.take().map(|r| r.sections).unwrap_or_default();

        if !incoming.is_empty() {
            let existing = std::mem::take(&mut self.sections);
            self.sections = if incoming.iter().any(is_focus_card) {
                replace_focus_cards(existing, incoming)
            } else {
                add_sections(existing, incoming)
            };
            log::debug!("Canvas now {:?}", kind_histogram(&self.sections));
        }

        match self.reveal.begin(&self.sections) {
            Some(delay) => self
                .timeline
                .schedule(delay, self.generation, TimerEvent::RevealStep),
            None => log::debug!("Dispatch #{} complete with nothing to reveal", self.generation),
        }
    }

    fn reveal_step(&mut self) {
        let outcome = self.reveal.step(&mut self.sections);
        if outcome.planning_started {
            typewriter::append(&mut self.messages, ChatMessage::system(PLANNING_NOTICE));
        }
        if let Some(delay) = outcome.next_delay_ms {
            self.timeline
                .schedule(delay, self.generation, TimerEvent::RevealStep);
        }
        if outcome.completed {
            log::debug!("Dispatch #{} fully revealed", self.generation);
        }
    }
}
