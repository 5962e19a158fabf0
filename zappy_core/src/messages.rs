use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

pub const SERVER_SOURCE: &str = "SERVER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Broadcast,
    Egg,
    Event,
    Incantation,
    Resource,
    Death,
    Victory,
    Info,
    Error,
}

impl MessageCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageCategory::Broadcast => "BROADCAST",
            MessageCategory::Egg => "EGG",
            MessageCategory::Event => "EVENT",
            MessageCategory::Incantation => "INCANTATION",
            MessageCategory::Resource => "RESOURCE",
            MessageCategory::Death => "DEATH",
            MessageCategory::Victory => "VICTORY",
            MessageCategory::Info => "INFO",
            MessageCategory::Error => "ERROR",
        }
    }
}

/// One human-readable log line.
///
/// `important` entries are exempt from capacity eviction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub text: String,
    pub category: MessageCategory,
    pub source: String,
    pub important: bool,
}

impl Message {
    pub fn new(
        text: impl Into<String>,
        category: MessageCategory,
        source: impl Into<String>,
        important: bool,
    ) -> Self {
        Self {
            text: text.into(),
            category,
            source: source.into(),
            important,
        }
    }

    pub fn server(text: impl Into<String>, category: MessageCategory, important: bool) -> Self {
        Self::new(text, category, SERVER_SOURCE, important)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.category.as_str(), self.source, self.text)
    }
}

/// Oldest-first message log with a soft ceiling.
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: VecDeque<Message>,
    ceiling: usize,
    eviction_batch: usize,
}

impl MessageLog {
    pub fn new(ceiling: usize, eviction_batch: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            ceiling,
            eviction_batch,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.entries.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    /// Once the log has reached its ceiling, drop up to one batch of the oldest
    /// non-important entries. Returns how many were removed.
    pub fn evict(&mut self) -> usize {
        if self.entries.len() < self.ceiling {
            return 0;
        }
        let mut budget = self.eviction_batch;
        self.entries.retain(|message| {
            if budget > 0 && !message.important {
                budget -= 1;
                false
            } else {
                true
            }
        });
        self.eviction_batch - budget
    }
}
