use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::data::Fixtures;

/// Entries kept per in-memory log
pub const LOG_CAPACITY: usize = 200;

/// Newest-first log that drops its oldest entry past `capacity`
#[derive(Debug)]
pub struct CappedLog<T> {
    entries: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T: Clone> CappedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, entry: T) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `limit` entries matching `keep`, newest first
    pub fn recent<F>(&self, limit: usize, keep: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| keep(e))
            .take(limit)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    App,
}

impl Channel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "email" => Some(Channel::Email),
            "sms" => Some(Channel::Sms),
            "app" | "push" => Some(Channel::App),
            _ => None,
        }
    }

    pub fn id_prefix(&self) -> &'static str {
        match self {
            Channel::Email => "EM",
            Channel::Sms => "SM",
            Channel::App => "PA",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLogEntry {
    pub id: String,
    pub channel: Channel,
    pub recipient: String,
    pub subject: Option<String>,
    pub message: String,
    pub tags: Vec<String>,
    pub status: String,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNotification {
    pub id: String,
    pub channel: Channel,
    pub recipient: String,
    pub subject: Option<String>,
    pub message: String,
    pub run_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub status: String,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityIssue {
    pub id: String,
    pub lot_id: String,
    pub issue: String,
    pub detail: Option<String>,
    pub severity: String,
    pub ts: DateTime<Utc>,
}

/// Everything a tool handler may touch
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub fixtures: Fixtures,
    pub notifications: Arc<CappedLog<NotificationLogEntry>>,
    pub scheduled: Arc<CappedLog<ScheduledNotification>>,
    pub quality_issues: Arc<CappedLog<QualityIssue>>,
}

impl ToolContext {
    pub fn new(fixtures: Fixtures) -> Self {
        Self {
            fixtures,
            notifications: Arc::new(CappedLog::new(LOG_CAPACITY)),
            scheduled: Arc::new(CappedLog::new(LOG_CAPACITY)),
            quality_issues: Arc::new(CappedLog::new(LOG_CAPACITY)),
        }
    }
}

/// `PREFIX-<epoch millis>-<4 hex>`
pub fn new_id(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), &suffix[..4])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capped_log_keeps_newest() {
        let log = CappedLog::new(3);
        for i in 0..5 {
            log.push(i);
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.recent(10, |_| true), vec![4, 3, 2]);
        assert_eq!(log.recent(10, |v| v % 2 == 0), vec![4, 2]);
        assert_eq!(log.recent(1, |_| true), vec![4]);
    }

    #[test]
    fn test_notification_log_caps_at_200() {
        let log = CappedLog::new(LOG_CAPACITY);
        for i in 0..250 {
            log.push(i);
        }
        assert_eq!(log.len(), LOG_CAPACITY);
        assert_eq!(log.recent(1, |_| true), vec![249]);
    }

    #[test]
    fn test_ids_are_prefixed_and_unique() {
        let a = new_id("BX");
        let b = new_id("BX");
        assert!(a.starts_with("BX-"));
        assert_ne!(a, b);
    }
}
