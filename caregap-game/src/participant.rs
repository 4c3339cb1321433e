//! Participant ledger shared by the journey and board variants.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;

use crate::catalog::{Catalog, Category, SupportKind};

/// Earned support tokens; order is earn order, counts are what matter.
pub type TokenPouch = SmallVec<[SupportKind; 8]>;

/// Classification of a recent-activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Ok,
    Delay,
    Support,
    Move,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub kind: LogKind,
    pub title: String,
    pub detail: String,
}

/// Bounded most-recent-first activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentLog {
    cap: usize,
    entries: VecDeque<LogEntry>,
}

impl RecentLog {
    #[must_use]
    pub fn with_cap(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            entries: VecDeque::with_capacity(cap.max(1)),
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.cap);
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cumulative severity applied per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTotals([u32; 6]);

impl CategoryTotals {
    #[must_use]
    pub const fn get(&self, category: Category) -> u32 {
        self.0[category.index()]
    }

    pub fn add(&mut self, category: Category, amount: u32) {
        let slot = &mut self.0[category.index()];
        *slot = slot.saturating_add(amount);
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.0.iter().copied().fold(0, u32::saturating_add)
    }

    /// `(category, amount)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, u32)> + '_ {
        Category::ALL.into_iter().map(|category| (category, self.get(category)))
    }
}

/// One patient or player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    /// Days waited (journey) or spaces lost (board).
    pub delay: u32,
    pub stress: u32,
    /// Step index (journey) or board space (board).
    pub position: u32,
    #[serde(default)]
    pub tokens: TokenPouch,
    #[serde(default)]
    pub totals: CategoryTotals,
    pub log: RecentLog,
}

impl Participant {
    #[must_use]
    pub fn new(id: impl Into<String>, log_cap: usize) -> Self {
        Self {
            id: id.into(),
            delay: 0,
            stress: 0,
            position: 0,
            tokens: TokenPouch::new(),
            totals: CategoryTotals::default(),
            log: RecentLog::with_cap(log_cap),
        }
    }

    #[must_use]
    pub fn with_token(mut self, kind: SupportKind) -> Self {
        self.tokens.push(kind);
        self
    }

    pub fn award(&mut self, kind: SupportKind) {
        self.tokens.push(kind);
    }

    #[must_use]
    pub fn token_count(&self, kind: SupportKind) -> usize {
        self.tokens.iter().filter(|held| **held == kind).count()
    }

    /// Distinct token kinds with counts, in first-earned order.
    #[must_use]
    pub fn token_counts(&self) -> Vec<(SupportKind, usize)> {
        let mut counts: Vec<(SupportKind, usize)> = Vec::new();
        for kind in &self.tokens {
            if let Some(entry) = counts.iter_mut().find(|(seen, _)| seen == kind) {
                entry.1 += 1;
            } else {
                counts.push((*kind, 1));
            }
        }
        counts
    }

    /// Whether any held token may cancel an event of `category`.
    #[must_use]
    pub fn has_cover_for(&self, category: Category, catalog: &Catalog) -> bool {
        self.tokens.iter().any(|kind| catalog.covers(*kind, category))
    }

    /// Remove and return the most recently earned token covering `category`.
    pub fn take_cover_for(&mut self, category: Category, catalog: &Catalog) -> Option<SupportKind> {
        let index = self
            .tokens
            .iter()
            .rposition(|kind| catalog.covers(*kind, category))?;
        Some(self.tokens.remove(index))
    }

    /// Add a resolved delay to the running totals.
    pub fn apply_delay(&mut self, category: Category, severity: u32, stress: u32) {
        self.delay = self.delay.saturating_add(severity);
        self.stress = self.stress.saturating_add(stress);
        self.totals.add(category, severity);
    }

    pub fn note(&mut self, kind: LogKind, title: impl Into<String>, detail: impl Into<String>) {
        self.log.push(LogEntry {
            kind,
            title: title.into(),
            detail: detail.into(),
        });
    }
}
