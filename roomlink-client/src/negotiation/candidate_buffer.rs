use roomlink_core::CandidatePayload;
use std::collections::VecDeque;

/// Remote candidates that arrived before both descriptions were applied.
#[derive(Debug, Default)]
pub struct CandidateBuffer {
    pending: VecDeque<CandidatePayload>,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, candidate: CandidatePayload) {
        self.pending.push_back(candidate);
    }

    /// Empties the buffer, returning candidates in arrival order.
    pub fn take_all(&mut self) -> Vec<CandidatePayload> {
        self.pending.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
