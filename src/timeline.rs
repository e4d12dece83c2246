//! Virtual timer queue.
//!
//! Every delay the engine uses (thinking delay, reveal ticks, settle pauses,
//! chat ticks) is a timer on this single logical clock. Nothing sleeps: the
//! engine is stepped forward explicitly, so tests control time exactly and
//! the tokio driver only has to sleep until [`Timeline::next_deadline`].
//!
//! Each timer carries the token that was current when it was scheduled. The
//! engine compares it on fire and drops timers from a superseded dispatch.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// What a timer does when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Apply a dispatch's chat reply (and its sections unless deferred).
    ApplyReply,
    /// Apply a deferred dispatch's sections.
    ApplySections,
    /// Advance the section reveal by one step.
    RevealStep,
    /// Type one more character of an assistant message.
    ChatTick { message_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub due_ms: u64,
    seq: u64,
    pub token: u64,
    pub event: TimerEvent,
}

// Min-heap on (due, seq): earliest first, FIFO among equal deadlines
impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct Timeline {
    now_ms: u64,
    seq: u64,
    queue: BinaryHeap<Timer>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn schedule(&mut self, delay_ms: u64, token: u64, event: TimerEvent) {
        self.seq += 1;
        self.queue.push(Timer {
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq: self.seq,
            token,
            event,
        });
    }

    /// Absolute time of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.peek().map(|t| t.due_ms)
    }

    /// Milliseconds from now until the earliest pending timer.
    pub fn until_next(&self) -> Option<u64> {
        self.next_deadline().map(|d| d.saturating_sub(self.now_ms))
    }

    /// Pop the earliest timer due at or before `until_ms`, moving the clock to
    /// its deadline.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Timer> {
        if self.next_deadline()? > until_ms {
            return None;
        }
        let timer = self.queue.pop()?;
        self.now_ms = self.now_ms.max(timer.due_ms);
        Some(timer)
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn advance_to(&mut self, ms: u64) {
        self.now_ms = self.now_ms.max(ms);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop every pending timer. The clock keeps its position.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
