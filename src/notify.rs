//! Transient, non-blocking user notifications (toasts).

use std::collections::VecDeque;

/// Ticks a toast stays visible. The UI ticks every 300ms.
pub const DEFAULT_TTL_TICKS: u16 = 14;

const MAX_VISIBLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    ticks_left: u16,
}

#[derive(Debug, Default)]
pub struct Notifications {
    items: VecDeque<Notification>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NotificationLevel::Error => tracing::warn!(%message, "notify"),
            _ => tracing::info!(%message, "notify"),
        }
        self.items.push_back(Notification {
            level,
            message,
            ticks_left: DEFAULT_TTL_TICKS,
        });
        while self.items.len() > MAX_VISIBLE {
            self.items.pop_front();
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Error, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Info, message);
    }

    /// Ages every toast by one tick and drops the expired ones.
    pub fn tick(&mut self) {
        for item in self.items.iter_mut() {
            item.ticks_left = item.ticks_left.saturating_sub(1);
        }
        self.items.retain(|n| n.ticks_left > 0);
    }

    pub fn dismiss_all(&mut self) {
        self.items.clear();
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, level: NotificationLevel) -> usize {
        self.items.iter().filter(|n| n.level == level).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire_after_ttl() {
        let mut notes = Notifications::new();
        notes.success("copied");
        for _ in 0..DEFAULT_TTL_TICKS - 1 {
            notes.tick();
        }
        assert_eq!(notes.len(), 1);
        notes.tick();
        assert!(notes.is_empty());
    }

    #[test]
    fn test_only_recent_toasts_are_kept() {
        let mut notes = Notifications::new();
        for i in 0..5 {
            notes.info(format!("n{}", i));
        }
        assert_eq!(notes.len(), MAX_VISIBLE);
        assert_eq!(notes.iter().next().map(|n| n.message.as_str()), Some("n2"));
        assert_eq!(notes.iter().last().map(|n| n.message.as_str()), Some("n4"));
    }

    #[test]
    fn test_count_by_level() {
        let mut notes = Notifications::new();
        notes.error("a");
        notes.success("b");
        notes.error("c");
        assert_eq!(notes.count(NotificationLevel::Error), 2);
        assert_eq!(notes.count(NotificationLevel::Success), 1);
    }
}
