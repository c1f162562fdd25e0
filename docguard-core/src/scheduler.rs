use crate::types::{Category, SuggestionId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

/// Deferred presentation work. None of these touch document content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VisualEffect {
    /// Scroll the results panel to an absolute offset
    ScrollPanel { top: f32 },
    /// Remove the transient highlight from a card group
    ClearGroupHighlight { category: Category },
    /// Bring a suggestion card into view
    RevealCard { id: SuggestionId },
}

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    due: Duration,
    effect: VisualEffect,
}

/// Single-threaded virtual clock for deferred, cancellable visual effects.
#[derive(Debug, Default)]
pub struct EffectScheduler {
    now: Duration,
    next_id: u64,
    pending: Vec<Timer>,
}

impl EffectScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, effect: VisualEffect) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Timer {
            id,
            due: self.now + delay,
            effect,
        });
        id
    }

    /// Returns false if the timer already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    /// Cancel whatever occupies `slot`, then schedule into it
    pub fn reschedule(
        &mut self,
        slot: &mut Option<TimerId>,
        delay: Duration,
        effect: VisualEffect,
    ) -> TimerId {
        if let Some(previous) = slot.take() {
            self.cancel(previous);
        }
        let id = self.schedule(delay, effect);
        *slot = Some(id);
        id
    }

    /// Move the clock forward and return every effect that came due,
    /// ordered by due time and then by scheduling order.
    pub fn advance(&mut self, by: Duration) -> Vec<VisualEffect> {
        self.now += by;
        let now = self.now;

        let (mut due, pending): (Vec<Timer>, Vec<Timer>) =
            self.pending.drain(..).partition(|t| t.due <= now);
        self.pending = pending;

        due.sort_by_key(|t| (t.due, t.id));
        due.into_iter().map(|t| t.effect).collect()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|t| t.id == id)
    }

    pub fn pending(&self) -> Vec<VisualEffect> {
        let mut timers: Vec<&Timer> = self.pending.iter().collect();
        timers.sort_by_key(|t| (t.due, t.id));
        timers.into_iter().map(|t| t.effect).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
