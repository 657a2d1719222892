//! Per-agent conversation history.

use writers_room_types::dialog::DialogEvent;

/// Turn-taking looks at the last three entries, so a bounded history never
/// keeps fewer.
const MIN_RETAINED: usize = 3;

/// Ordered dialog lines an agent has observed in its current scene.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    events: Vec<DialogEvent>,
    limit: Option<usize>,
}

impl ConversationHistory {
    /// Unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps only the newest `limit` entries (at least three).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::new(),
            limit: Some(limit.max(MIN_RETAINED)),
        }
    }

    pub fn push(&mut self, event: DialogEvent) {
        self.events.push(event);
        if let Some(limit) = self.limit {
            if self.events.len() > limit {
                let excess = self.events.len() - limit;
                self.events.drain(..excess);
            }
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Newest entry.
    pub fn last(&self) -> Option<&DialogEvent> {
        self.events.last()
    }

    /// Entry immediately preceding the newest one.
    pub fn previous(&self) -> Option<&DialogEvent> {
        self.events.len().checked_sub(2).map(|i| &self.events[i])
    }

    /// Up to `n` most recent entries, oldest first.
    pub fn recent(&self, n: usize) -> &[DialogEvent] {
        let start = self.events.len().saturating_sub(n);
        &self.events[start..]
    }

    /// How many of the last `n` entries were spoken by `name`.
    pub fn authored_in_last(&self, name: &str, n: usize) -> usize {
        self.recent(n).iter().filter(|e| e.from == name).count()
    }
}
