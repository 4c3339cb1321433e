//! End-of-run result calculation
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::catalog::Category;
use crate::participant::{CategoryTotals, Participant};

/// Final numbers for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantTotals {
    pub id: String,
    /// Days waited (journey) or spaces lost to setbacks (board).
    pub delay: u32,
    pub stress: u32,
    pub position: u32,
    pub tokens_held: usize,
    pub by_category: CategoryTotals,
}

impl From<&Participant> for ParticipantTotals {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id.clone(),
            delay: participant.delay,
            stress: participant.stress,
            position: participant.position,
            tokens_held: participant.tokens.len(),
            by_category: participant.totals,
        }
    }
}

/// Outcome of a two-patient journey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneySummary {
    pub seed: u64,
    pub steps_completed: usize,
    pub finished: bool,
    pub patient_a: ParticipantTotals,
    pub patient_b: ParticipantTotals,
    pub equity_gap: u32,
}

impl JourneySummary {
    #[must_use]
    pub fn new(
        seed: u64,
        steps_completed: usize,
        finished: bool,
        a: &Participant,
        b: &Participant,
    ) -> Self {
        Self {
            seed,
            steps_completed,
            finished,
            patient_a: a.into(),
            patient_b: b.into(),
            equity_gap: equity_gap(a.delay, b.delay),
        }
    }

    /// `(category, days A, days B)` rows in catalog order.
    #[must_use]
    pub fn category_rows(&self) -> Vec<(Category, u32, u32)> {
        Category::ALL
            .into_iter()
            .map(|category| {
                (
                    category,
                    self.patient_a.by_category.get(category),
                    self.patient_b.by_category.get(category),
                )
            })
            .collect()
    }

    /// Id of the patient who waited longer, if the waits differ.
    #[must_use]
    pub fn longer_wait(&self) -> Option<&str> {
        match self.patient_a.delay.cmp(&self.patient_b.delay) {
            std::cmp::Ordering::Greater => Some(&self.patient_a.id),
            std::cmp::Ordering::Less => Some(&self.patient_b.id),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Absolute difference in days waited.
#[must_use]
pub const fn equity_gap(days_a: u32, days_b: u32) -> u32 {
    days_a.abs_diff(days_b)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub rank: usize,
    pub totals: ParticipantTotals,
}

/// Outcome of a board race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub seed: u64,
    pub turns: u32,
    pub finished: bool,
    pub winner: Option<String>,
    pub standings: Vec<Standing>,
}

/// Rank players: the winner first, then furthest along, fewest spaces lost,
/// seating order.
#[must_use]
pub fn rank_standings(players: &[Participant], winner: Option<usize>) -> Vec<Standing> {
    let mut order: Vec<usize> = (0..players.len()).collect();
    order.sort_by_key(|&idx| {
        let player = &players[idx];
        (
            winner != Some(idx),
            Reverse(player.position),
            player.delay,
            idx,
        )
    });
    order
        .into_iter()
        .enumerate()
        .map(|(rank, idx)| Standing {
            rank: rank + 1,
            totals: (&players[idx]).into(),
        })
        .collect()
}
