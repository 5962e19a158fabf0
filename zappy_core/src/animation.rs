use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    Broadcast,
    IncantationStart,
    IncantationSuccess,
    IncantationFailure,
}

/// A one-shot visual cue for the renderer, consumed exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationEvent {
    pub kind: AnimationKind,
    pub x: u32,
    pub y: u32,
    pub duration: Duration,
    pub team: Option<String>,
}

/// FIFO of pending cues. When no consumer drains it, the oldest cue is
/// dropped once `limit` is reached.
#[derive(Debug, Clone)]
pub struct AnimationQueue {
    pending: VecDeque<AnimationEvent>,
    limit: usize,
}

impl AnimationQueue {
    pub fn new(limit: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Returns `true` when an older cue had to be discarded.
    pub fn push(&mut self, event: AnimationEvent) -> bool {
        let overflowed = self.pending.len() >= self.limit;
        if overflowed {
            self.pending.pop_front();
        }
        self.pending.push_back(event);
        overflowed
    }

    pub fn pop(&mut self) -> Option<AnimationEvent> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
