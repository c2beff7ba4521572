//! Review queue
//!
//! The drafts fetched by the last refresh and the index of the card on top.
//! Every refresh bumps a generation counter so an advance scheduled against
//! an older list cannot skip a card in the new one.

use swipemail_protocol::DraftRecord;

#[derive(Debug, Clone, Default)]
pub struct ReviewQueue {
    drafts: Vec<DraftRecord>,
    index: usize,
    generation: u64,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a freshly fetched list and start from its first draft.
    pub fn replace(&mut self, drafts: Vec<DraftRecord>) {
        self.drafts = drafts;
        self.index = 0;
        self.generation += 1;
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current(&self) -> Option<&DraftRecord> {
        self.drafts.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.drafts.len() - self.index
    }

    /// Nothing left to review.
    pub fn is_exhausted(&self) -> bool {
        self.index >= self.drafts.len()
    }

    /// Move past the current draft if the list is still `generation`.
    pub fn advance(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.is_exhausted() {
            return false;
        }
        self.index += 1;
        true
    }
}

/// Header counter, e.g. `3 drafts remaining`. `None` when nothing is left.
pub fn remaining_label(remaining: usize) -> Option<String> {
    match remaining {
        0 => None,
        1 => Some("1 draft remaining".to_string()),
        n => Some(format!("{} drafts remaining", n)),
    }
}
