//! User-visible notifications and presentation signals.
//!
//! Notifications are toast messages with a fixed lifetime. Signals are
//! fire-and-forget triggers (pulse, chime, alarm) for whatever renders the
//! reactor; the store buffers them and the consumer drains the buffer.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use ignition_logic::model::HabitCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Critical,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Bounded notification queue. Oldest entries are dropped past `capacity`.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    items: Vec<Notification>,
    capacity: usize,
    ttl: Duration,
}

impl NotificationQueue {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            items: Vec::new(),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn push(&mut self, id: String, message: impl Into<String>, kind: NotificationKind, now: DateTime<Utc>) {
        self.items.push(Notification {
            id,
            message: message.into(),
            kind,
            created_at: now,
            expires_at: now + self.ttl,
        });
        if self.items.len() > self.capacity {
            let overflow = self.items.len() - self.capacity;
            self.items.drain(..overflow);
        }
    }

    /// Remove by id. Unknown ids are ignored.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drop every notification past its lifetime.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.items.len();
        self.items.retain(|n| !n.is_expired(now));
        before - self.items.len()
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Presentation trigger emitted by a state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum Signal {
    ReactorPulse,
    CompletionChime { category: HabitCategory },
    ArtifactUnlocked { id: String },
    CriticalAlarm,
    QuestCreated { id: String },
    QuestCompleted { id: String },
    EventSpawned { id: String },
    EventClaimed { id: String },
    StreakBroken { habit_id: String },
    HibernationChanged { on: bool },
    BurnoutWarning,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut queue = NotificationQueue::new(2, Duration::seconds(5));
        queue.push("a".into(), "first", NotificationKind::Info, now());
        queue.push("b".into(), "second", NotificationKind::Info, now());
        queue.push("c".into(), "third", NotificationKind::Info, now());
        let ids: Vec<_> = queue.items().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_prune_after_ttl() {
        let mut queue = NotificationQueue::new(5, Duration::seconds(5));
        queue.push("a".into(), "old", NotificationKind::Warning, now());
        queue.push("b".into(), "new", NotificationKind::Success, now() + Duration::seconds(3));
        assert_eq!(queue.prune(now() + Duration::seconds(4)), 0);
        assert_eq!(queue.prune(now() + Duration::seconds(5)), 1);
        assert_eq!(queue.items()[0].id, "b");
    }

    #[test]
    fn test_remove_unknown_is_ignored() {
        let mut queue = NotificationQueue::new(5, Duration::seconds(5));
        queue.push("a".into(), "x", NotificationKind::Error, now());
        assert!(!queue.remove("zzz"));
        assert!(queue.remove("a"));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_signal_json_shape() {
        let json = serde_json::to_string(&Signal::StreakBroken {
            habit_id: "h1".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"signal":"streak_broken","habit_id":"h1"}"#);
    }
}
