use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::models::normalize_label;

/// Outcome of offering a label to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Matched a known label; carries its stored display form
    Existing(String),
    /// Registered as a new label
    New(String),
    /// Cap reached; mapped onto the closest known label
    Redirected { proposed: String, label: String },
}

impl Admission {
    /// The label the observation should carry
    pub fn label(&self) -> &str {
        match self {
            Admission::Existing(label) | Admission::New(label) => label,
            Admission::Redirected { label, .. } => label,
        }
    }
}

/// Running set of topic labels for one transcript, capped at `max_topics`
///
/// Shared by all concurrent classification requests of a run. Admission is
/// atomic, so the cap holds regardless of request interleaving.
#[derive(Debug)]
pub struct LabelRegistry {
    max_topics: usize,
    labels: Mutex<Vec<String>>,
}

impl LabelRegistry {
    pub fn new(max_topics: usize) -> Self {
        Self {
            max_topics: max_topics.max(1),
            labels: Mutex::new(Vec::new()),
        }
    }

    /// Seed with labels from an earlier run, respecting the cap
    pub fn with_labels<I, S>(max_topics: usize, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = Self::new(max_topics);
        for label in labels {
            registry.admit(label.as_ref());
        }
        registry
    }

    pub fn max_topics(&self) -> usize {
        self.max_topics
    }

    /// Known labels in registration order
    pub fn snapshot(&self) -> Vec<String> {
        self.labels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.labels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.max_topics
    }

    /// Offer a cleaned label
    pub fn admit(&self, proposed: &str) -> Admission {
        let key = normalize_label(proposed);
        let mut labels = self.labels.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = labels.iter().find(|l| normalize_label(l) == key) {
            return Admission::Existing(existing.clone());
        }

        if labels.len() < self.max_topics {
            labels.push(proposed.to_string());
            return Admission::New(proposed.to_string());
        }

        let label = closest_label(&key, &labels).to_string();
        Admission::Redirected {
            proposed: proposed.to_string(),
            label,
        }
    }
}

/// Known label sharing the most words with `key`; ties go to the earliest
///
/// `labels` must be non-empty.
fn closest_label<'a>(key: &str, labels: &'a [String]) -> &'a str {
    let wanted: HashSet<&str> = key.split_whitespace().collect();

    let mut best = labels[0].as_str();
    let mut best_overlap = 0usize;
    for label in labels {
        let normalized = normalize_label(label);
        let overlap = normalized
            .split_whitespace()
            .filter(|w| wanted.contains(w))
            .count();
        if overlap > best_overlap {
            best = label;
            best_overlap = overlap;
        }
    }
    best
}
