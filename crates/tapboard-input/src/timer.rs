#![forbid(unsafe_code)]

//! Cancelable deadlines for the single-threaded event loop.
//!
//! The host owns the clock: it asks for [`TimerQueue::next_deadline`],
//! sleeps until then, and polls. Every timer is tagged with the queue's
//! generation at scheduling time. [`TimerQueue::advance_generation`] retires
//! all outstanding timers at once; retired timers that come due are dropped
//! instead of firing.
//!
//! # Invariants
//!
//! 1. At most one timer per [`TimerKind`] is pending.
//! 2. A timer fires at most once, and never after a generation change.
//! 3. Due timers fire in deadline order.

use std::time::{Duration, Instant};

use smallvec::SmallVec;

/// What a timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    LongPress,
    Repeat,
    HidePreview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    kind: TimerKind,
    deadline: Instant,
    generation: u64,
}

/// Pending deadlines for one state machine.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    pending: SmallVec<[Pending; 3]>,
    generation: u64,
}

impl TimerQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind` to fire `delay` after `now`, replacing any pending one.
    pub fn schedule(&mut self, kind: TimerKind, now: Instant, delay: Duration) {
        self.cancel(kind);
        self.pending.push(Pending {
            kind,
            deadline: now + delay,
            generation: self.generation,
        });
    }

    /// Disarm `kind`, returning whether it was pending.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.kind != kind);
        before != self.pending.len()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Whether a live timer of `kind` is pending.
    #[must_use]
    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.live().any(|p| p.kind == kind)
    }

    /// Earliest live deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.live().map(|p| p.deadline).min()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Retire every outstanding timer; returns the new generation.
    pub fn advance_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Remove and return the live timers due at `now`, earliest first.
    pub fn expired(&mut self, now: Instant) -> SmallVec<[TimerKind; 3]> {
        let mut due: SmallVec<[Pending; 3]> = SmallVec::new();
        self.pending.retain(|p| {
            if p.deadline <= now {
                due.push(*p);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|p| p.deadline);

        let generation = self.generation;
        due.into_iter()
            .filter(|p| {
                let live = p.generation == generation;
                if !live {
                    tracing::debug!(
                        kind = ?p.kind,
                        timer_generation = p.generation,
                        generation,
                        "stale timer dropped"
                    );
                }
                live
            })
            .map(|p| p.kind)
            .collect()
    }

    fn live(&self) -> impl Iterator<Item = &Pending> {
        self.pending
            .iter()
            .filter(move |p| p.generation == self.generation)
    }
}
