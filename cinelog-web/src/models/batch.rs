//! Batch disambiguation state
//!
//! Everything a batch needs between two requests lives in these types. They
//! are plain serializable values: the controller takes a state in and hands a
//! new one back, and the web layer stores it with the login session.
//!
//! Lifecycle: `Draining` while titles remain queued, `Confirming` once the
//! queue has been finalized into a confirmation set. Commit, cancel or logout
//! discards the session.

use cinelog_common::titles::normalize_title;
use cinelog_common::{Candidate, MovieId, MovieRecord};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Raw titles awaiting resolution, processed head first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingQueue(VecDeque<String>);

impl PendingQueue {
    pub fn head(&self) -> Option<&str> {
        self.0.front().map(String::as_str)
    }

    pub fn pop_head(&mut self) -> Option<String> {
        self.0.pop_front()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// A decided title: the candidate id it resolved to and the query it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub query_title: String,
    pub id: MovieId,
}

/// Confirmed candidate ids, append-only while the queue drains
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionAccumulator(Vec<Selection>);

impl SelectionAccumulator {
    pub fn push(&mut self, selection: Selection) {
        self.0.push(selection);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selection> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Selection> {
        self.0
    }
}

/// One fully detailed record awaiting the user's final confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationEntry {
    pub query_title: String,
    pub record: MovieRecord,
}

/// Output of finalizing a drained queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingConfirmationSet(Vec<ConfirmationEntry>);

impl PendingConfirmationSet {
    pub fn new(entries: Vec<ConfirmationEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[ConfirmationEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Queue, accumulator and the choice currently on screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchState {
    pub queue: PendingQueue,
    pub accumulator: SelectionAccumulator,
    /// Candidates presented for the head title while it awaits a user choice.
    /// `None` means the head has not been searched yet.
    #[serde(default)]
    pub awaiting_choice: Option<Vec<Candidate>>,
}

impl BatchState {
    /// Build a batch from raw titles
    ///
    /// Drops blank titles, titles already in the catalog and repeats within
    /// the batch; all comparisons use the normalized title. The surviving
    /// titles keep their original spelling and order.
    pub fn from_titles<I, S>(titles: I, catalog_titles: &[String]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: HashSet<String> = catalog_titles.iter().map(|t| normalize_title(t)).collect();
        let mut queue = VecDeque::new();

        for title in titles {
            let title: String = title.into();
            let title = title.trim().to_string();
            let normalized = normalize_title(&title);
            if normalized.is_empty() || !seen.insert(normalized) {
                continue;
            }
            queue.push_back(title);
        }

        Self {
            queue: PendingQueue(queue),
            accumulator: SelectionAccumulator::default(),
            awaiting_choice: None,
        }
    }

    /// Drop the head title and forget any choice shown for it
    pub(crate) fn retire_head(&mut self) -> Option<String> {
        self.awaiting_choice = None;
        self.queue.pop_head()
    }
}

/// Everything stored for one login session's batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "data", rename_all = "snake_case")]
pub enum BatchSession {
    Draining(BatchState),
    Confirming(PendingConfirmationSet),
}

/// External input for the title awaiting a choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    /// None of the candidates is right; drop the title
    Reject,
    /// The user picked this candidate
    Select(MovieId),
    /// The form was submitted without picking anything
    NoSelection,
}
