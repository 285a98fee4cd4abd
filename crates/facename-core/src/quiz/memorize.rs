//! Timed memorization slideshow.

use crate::error::{Result, TrainerError};
use crate::model::FacePairRecord;

/// Seconds each pair is shown when nothing else is configured.
pub const DEFAULT_DISPLAY_TIME: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemorizeState {
    Loading,
    Memorizing,
    Paused,
    Completed,
}

/// What a call to [`MemorizationSession::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// Countdown decremented; carries the remaining seconds.
    Counted(u32),
    /// Countdown ran out and the next pair is now shown.
    Advanced(usize),
    /// Countdown ran out on the last pair.
    Completed,
    /// Paused, loading or already complete: nothing changed.
    Idle,
}

/// Shows pairs one at a time with a per-pair countdown.
#[derive(Debug, Clone)]
pub struct MemorizationSession {
    pairs: Vec<FacePairRecord>,
    index: usize,
    remaining: u32,
    display_time: u32,
    state: MemorizeState,
}

impl MemorizationSession {
    pub fn new(display_time: u32) -> Self {
        let display_time = display_time.max(1);
        Self {
            pairs: Vec::new(),
            index: 0,
            remaining: display_time,
            display_time,
            state: MemorizeState::Loading,
        }
    }

    /// Start memorizing `pairs` from the first one.
    pub fn load(&mut self, pairs: Vec<FacePairRecord>) -> Result<()> {
        if pairs.is_empty() {
            return Err(TrainerError::InvalidParameter("nothing to memorize".into()));
        }
        self.pairs = pairs;
        self.show(0);
        Ok(())
    }

    pub fn state(&self) -> MemorizeState {
        self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn display_time(&self) -> u32 {
        self.display_time
    }

    pub fn current(&self) -> Option<&FacePairRecord> {
        match self.state {
            MemorizeState::Memorizing | MemorizeState::Paused => self.pairs.get(self.index),
            _ => None,
        }
    }

    pub fn pairs(&self) -> &[FacePairRecord] {
        &self.pairs
    }

    /// Fraction of the slideshow reached, `(i + 1) / N`.
    pub fn progress(&self) -> f64 {
        if self.pairs.is_empty() {
            return 0.0;
        }
        (self.index + 1) as f64 / self.pairs.len() as f64
    }

    /// One second passed.
    pub fn tick(&mut self) -> TickEvent {
        if self.state != MemorizeState::Memorizing {
            return TickEvent::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return TickEvent::Counted(self.remaining);
        }
        if self.index + 1 >= self.pairs.len() {
            self.state = MemorizeState::Completed;
            TickEvent::Completed
        } else {
            self.show(self.index + 1);
            TickEvent::Advanced(self.index)
        }
    }

    /// Pause or resume. The remaining time is kept.
    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            MemorizeState::Memorizing => MemorizeState::Paused,
            MemorizeState::Paused => MemorizeState::Memorizing,
            other => other,
        };
    }

    /// Show the next pair, or complete after the last one.
    pub fn next(&mut self) {
        if !self.is_showing() {
            return;
        }
        if self.index + 1 >= self.pairs.len() {
            self.state = MemorizeState::Completed;
        } else {
            self.show_keeping_pause(self.index + 1);
        }
    }

    /// Show the previous pair. No effect on the first one.
    pub fn prev(&mut self) {
        if self.is_showing() && self.index > 0 {
            self.show_keeping_pause(self.index - 1);
        }
    }

    /// Go through the pairs again from the first one.
    pub fn review(&mut self) {
        if !self.pairs.is_empty() {
            self.show(0);
        }
    }

    /// Ids of the memorized pairs in display order.
    pub fn face_ids(&self) -> Vec<String> {
        self.pairs.iter().map(|p| p.id.clone()).collect()
    }

    fn is_showing(&self) -> bool {
        matches!(self.state, MemorizeState::Memorizing | MemorizeState::Paused)
    }

    fn show(&mut self, index: usize) {
        self.index = index;
        self.remaining = self.display_time;
        self.state = MemorizeState::Memorizing;
    }

    fn show_keeping_pause(&mut self, index: usize) {
        let paused = self.state == MemorizeState::Paused;
        self.show(index);
        if paused {
            self.state = MemorizeState::Paused;
        }
    }
}

impl Default for MemorizationSession {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_TIME)
    }
}
