use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review verdict for one homework submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Submitted, waiting for a reviewer.
    Pending,
    /// Reviewer accepted the work.
    Approved,
    /// Reviewer returned the work with comments.
    Rejected,
    /// A reviewer picked the work up.
    Reviewing,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Reviewing => "reviewing",
        }
    }

    /// Human-readable verdict line used in change notifications.
    pub fn verdict(&self) -> &'static str {
        match self {
            Self::Pending => "The work is queued for review.",
            Self::Approved => "The work passed review: the reviewer liked everything. Hooray!",
            Self::Rejected => "The work was reviewed: the reviewer has comments.",
            Self::Reviewing => "The work was picked up by a reviewer.",
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last-known state for one tracked submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub status: SubmissionStatus,
    /// When the most recent successful poll observed this submission.
    pub last_checked_at: DateTime<Utc>,
}

/// In-memory map of last-reported statuses, keyed by submission id.
///
/// The store is the sole source of truth for "what was last reported".
/// The poll loop is its only writer: an entry appears after the first
/// successful poll that observes the id (seeding), and a changed status
/// overwrites the entry only after the notification for that change was
/// accepted by the notifier. Entries are never removed — submissions the
/// remote service stops returning simply stay at their last status.
#[derive(Debug, Default)]
pub struct StatusStore {
    entries: HashMap<String, StatusEntry>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&StatusEntry> {
        self.entries.get(id)
    }

    /// Unconditional overwrite. Callers are responsible for the
    /// advance-only-after-confirmed-send ordering.
    pub fn set(&mut self, id: impl Into<String>, status: SubmissionStatus, at: DateTime<Utc>) {
        self.entries.insert(
            id.into(),
            StatusEntry {
                status,
                last_checked_at: at,
            },
        );
    }

    /// Ids seen by at least one successful poll.
    pub fn known_ids(&self) -> HashSet<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
