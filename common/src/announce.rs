use serde::{Deserialize, Serialize};

use crate::constants::ANNOUNCEMENT_TTL_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
}

/// Short-lived broadcast notice layered on top of state updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub text: String,
    pub kind: Severity,
    /// Suggested display duration in milliseconds.
    pub duration: u64,
}

impl Announcement {
    pub fn new(text: impl Into<String>, kind: Severity) -> Self {
        Announcement {
            text: text.into(),
            kind,
            duration: ANNOUNCEMENT_TTL_MS as u64,
        }
    }
}

/// Retains at most the single most recent announcement. Pushing replaces any
/// older entry, and the slot expires a few seconds after its last update.
#[derive(Debug, Default)]
pub struct AnnouncementBus {
    current: Option<(Announcement, i64)>,
}

impl AnnouncementBus {
    pub fn new() -> Self {
        AnnouncementBus::default()
    }

    pub fn push(&mut self, announcement: Announcement, now_ms: i64) {
        self.current = Some((announcement, now_ms));
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// The retained announcements for an outgoing broadcast, dropping the
    /// slot first if it has gone stale.
    pub fn recent(&mut self, now_ms: i64) -> Vec<Announcement> {
        if let Some((_, updated_ms)) = self.current {
            if now_ms - updated_ms > ANNOUNCEMENT_TTL_MS {
                self.current = None;
            }
        }
        self.current.iter().map(|(a, _)| a.clone()).collect()
    }
}
