//! Read-only projection of a journey run for renderers.
use serde::{Deserialize, Serialize};

use super::{JourneyRun, PatientId};
use crate::catalog::Category;
use crate::modifiers::{self, SeverityBounds};
use crate::numbers::{round_f64_to_i64, usize_to_f64};
use crate::participant::LogEntry;
use crate::progression::LoopPhase;

/// A pending event with the effect it would have if resolved now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEffect {
    pub category: Category,
    pub title: String,
    pub days: u32,
    pub stress: u32,
    pub why: String,
    pub can_intervene: bool,
}

impl PendingEffect {
    /// `"7 days, +3 stress"`.
    #[must_use]
    pub fn effect_line(&self) -> String {
        format!("{} days, +{} stress", self.days, self.stress)
    }

    /// `"🧾 Insurance: Prior auth requested"`.
    #[must_use]
    pub fn headline(&self) -> String {
        format!(
            "{} {}: {}",
            self.category.icon(),
            self.category.name(),
            self.title
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientView {
    pub id: String,
    pub days: u32,
    pub stress: u32,
    pub step_name: String,
    pub progress_pct: i64,
    /// `(label, count)` per held token kind.
    pub tokens: Vec<(String, usize)>,
    pub log: Vec<LogEntry>,
    pub pending: Option<PendingEffect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyView {
    pub seed: u64,
    pub phase: LoopPhase,
    pub current_step: String,
    pub paused: bool,
    pub auto_resolve: bool,
    pub time_remaining: Option<u32>,
    pub equity_gap: u32,
    pub patients: [PatientView; 2],
}

impl JourneyView {
    /// The more severe pending effect, preferring A on ties.
    #[must_use]
    pub fn head_event(&self) -> Option<&PendingEffect> {
        match (&self.patients[0].pending, &self.patients[1].pending) {
            (Some(a), Some(b)) => Some(if a.days >= b.days { a } else { b }),
            (a, b) => a.as_ref().or(b.as_ref()),
        }
    }
}

impl JourneyRun {
    /// Snapshot the run for display.
    #[must_use]
    pub fn view(&self) -> JourneyView {
        let last_step = self.step_count().saturating_sub(1).max(1);
        let patients = PatientId::ALL.map(|id| {
            let patient = self.patient(id);
            let step = usize::try_from(patient.position).unwrap_or(usize::MAX);
            let pct = usize_to_f64(step.min(last_step)) / usize_to_f64(last_step) * 100.0;
            let pending = self
                .pending()
                .and_then(|pending| pending.event(id))
                .map(|event| {
                    let adjusted =
                        modifiers::resolve(event, &self.mitigations(id), SeverityBounds::JOURNEY);
                    PendingEffect {
                        category: event.category,
                        title: event.title.clone(),
                        days: adjusted.severity,
                        stress: adjusted.secondary,
                        why: event.why.clone(),
                        can_intervene: patient.has_cover_for(event.category, self.catalog()),
                    }
                });
            PatientView {
                id: patient.id.clone(),
                days: patient.delay,
                stress: patient.stress,
                step_name: self.catalog().step_name(step).to_string(),
                progress_pct: round_f64_to_i64(pct),
                tokens: patient
                    .token_counts()
                    .into_iter()
                    .map(|(kind, count)| (self.catalog().support_label(kind), count))
                    .collect(),
                log: patient.log.iter().cloned().collect(),
                pending,
            }
        });
        JourneyView {
            seed: self.seed(),
            phase: self.phase(),
            current_step: self
                .pending()
                .map_or_else(|| String::from("Press Next Step"), |p| p.step_name.clone()),
            paused: self.is_paused(),
            auto_resolve: self.auto_resolve(),
            time_remaining: self.time_remaining(),
            equity_gap: self.summary().equity_gap,
            patients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JourneyTuning;
    use crate::journey::JourneyAction;

    #[test]
    fn fresh_view_prompts_for_first_step() {
        let run = JourneyRun::new(42, JourneyTuning::default());
        let view = run.view();
        assert_eq!(view.current_step, "Press Next Step");
        assert_eq!(view.patients[0].step_name, "Diagnosis");
        assert_eq!(view.patients[0].progress_pct, 0);
        assert_eq!(view.patients[1].tokens.len(), 1);
        assert!(view.head_event().is_none());
    }

    #[test]
    fn progress_reaches_one_hundred_at_final_step() {
        let mut run = JourneyRun::new(42, JourneyTuning::default()).with_auto_resolve(false);
        for _ in 0..9 {
            run.apply(JourneyAction::Advance);
            run.apply(JourneyAction::Resolve);
        }
        let view = run.view();
        assert_eq!(view.patients[0].progress_pct, 100);
        assert_eq!(view.patients[1].step_name, "Start Treatment");
        assert_eq!(view.phase, LoopPhase::Terminal);
    }
}
