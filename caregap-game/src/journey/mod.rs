//! Two patients, one diagnosis.
//!
//! Both patients walk the same care pathway. Each step may reveal a
//! non-medical delay per patient; the delay is held as pending until it is
//! resolved (manually or by the countdown) or cancelled with a support token.
//! Supports and levers are read when the delay is applied, not when it is
//! drawn, so toggling them during a countdown changes the result.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::catalog::{self, Catalog, EventCard, SupportKind};
use crate::config::JourneyTuning;
use crate::modifiers::{
    self, MitigationSet, PersonalSupport, PersonalSupports, PolicyLever, PolicyLevers,
    SeverityBounds,
};
use crate::participant::{LogKind, Participant};
use crate::progression::{Ignored, LoopControl, LoopPhase, Outcome, TaskKind, TickResult};
use crate::result::JourneySummary;
use crate::rng::RngBundle;

pub mod view;
pub use view::{JourneyView, PatientView, PendingEffect};

/// Which of the two patients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientId {
    A,
    B,
}

impl PatientId {
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Events revealed by the most recent step, awaiting resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingStep {
    pub step_index: usize,
    pub step_name: String,
    pub a: Option<EventCard>,
    pub b: Option<EventCard>,
}

impl PendingStep {
    #[must_use]
    pub const fn event(&self, patient: PatientId) -> Option<&EventCard> {
        match patient {
            PatientId::A => self.a.as_ref(),
            PatientId::B => self.b.as_ref(),
        }
    }

    fn take_event(&mut self, patient: PatientId) -> Option<EventCard> {
        match patient {
            PatientId::A => self.a.take(),
            PatientId::B => self.b.take(),
        }
    }

    #[must_use]
    pub const fn is_clear(&self) -> bool {
        self.a.is_none() && self.b.is_none()
    }
}

/// Requests accepted by a journey run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyAction {
    Advance,
    Resolve,
    Intervene(PatientId),
    /// One second of real time.
    Tick,
    SetPaused(bool),
    SetAutoResolve(bool),
    SetSupport {
        patient: PatientId,
        support: PersonalSupport,
        enabled: bool,
    },
    SetLever {
        lever: PolicyLever,
        enabled: bool,
    },
}

/// A complete two-patient run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyRun {
    seed: u64,
    rng: RngBundle,
    steps_taken: usize,
    control: LoopControl,
    #[serde(default)]
    pending: Option<PendingStep>,
    supports: [PersonalSupports; 2],
    levers: PolicyLevers,
    tuning: JourneyTuning,
    patients: [Participant; 2],
    #[serde(skip, default = "catalog::shared")]
    catalog: Arc<Catalog>,
}

impl JourneyRun {
    /// Fresh run on the compiled-in catalog.
    #[must_use]
    pub fn new(seed: u64, tuning: JourneyTuning) -> Self {
        Self::with_catalog(seed, tuning, catalog::shared())
    }

    #[must_use]
    pub fn with_catalog(seed: u64, tuning: JourneyTuning, catalog: Arc<Catalog>) -> Self {
        let patients = PatientId::ALL.map(|id| {
            Participant::new(id.label(), tuning.log_cap).with_token(SupportKind::Navigator)
        });
        Self {
            seed,
            rng: RngBundle::from_user_seed(seed),
            steps_taken: 0,
            control: LoopControl::new(true),
            pending: None,
            supports: [PersonalSupports::default(); 2],
            levers: PolicyLevers::default(),
            tuning,
            patients,
            catalog,
        }
    }

    #[must_use]
    pub fn with_levers(mut self, levers: PolicyLevers) -> Self {
        self.levers = levers;
        self
    }

    #[must_use]
    pub fn with_supports(mut self, patient: PatientId, supports: PersonalSupports) -> Self {
        self.supports[patient.index()] = supports;
        self
    }

    #[must_use]
    pub fn with_auto_resolve(mut self, enabled: bool) -> Self {
        self.control.auto_resolve = enabled;
        self
    }

    /// Reattach the catalog after deserialization.
    pub fn rehydrate(&mut self, catalog: Arc<Catalog>) {
        self.catalog = catalog;
    }

    /// Reject restored state whose pending step does not match the steps taken.
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        self.tuning.validate().map_err(|err| err.to_string())?;
        if let Some(pending) = &self.pending
            && pending.step_index >= self.steps_taken
        {
            return Err(format!(
                "pending step {} not yet reached after {} steps",
                pending.step_index, self.steps_taken
            ));
        }
        Ok(())
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn phase(&self) -> LoopPhase {
        self.control.phase
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.control.phase.is_terminal()
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.control.paused
    }

    #[must_use]
    pub const fn auto_resolve(&self) -> bool {
        self.control.auto_resolve
    }

    #[must_use]
    pub fn time_remaining(&self) -> Option<u32> {
        self.control.time_remaining()
    }

    #[must_use]
    pub const fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Index of the step patients are currently on, once the first step is revealed.
    #[must_use]
    pub const fn step_index(&self) -> Option<usize> {
        self.steps_taken.checked_sub(1)
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.catalog.steps.len().max(1)
    }

    #[must_use]
    pub const fn pending(&self) -> Option<&PendingStep> {
        self.pending.as_ref()
    }

    #[must_use]
    pub const fn patient(&self, id: PatientId) -> &Participant {
        &self.patients[id.index()]
    }

    #[must_use]
    pub const fn supports(&self, id: PatientId) -> PersonalSupports {
        self.supports[id.index()]
    }

    #[must_use]
    pub const fn levers(&self) -> PolicyLevers {
        self.levers
    }

    #[must_use]
    pub const fn tuning(&self) -> &JourneyTuning {
        &self.tuning
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn rng_draws(&self) -> u64 {
        self.rng.total_draws()
    }

    #[must_use]
    pub const fn mitigations(&self, id: PatientId) -> MitigationSet {
        MitigationSet::new(self.supports[id.index()], self.levers)
    }

    #[must_use]
    pub fn summary(&self) -> JourneySummary {
        JourneySummary::new(
            self.seed,
            self.steps_completed(),
            self.is_terminal(),
            &self.patients[0],
            &self.patients[1],
        )
    }

    fn steps_completed(&self) -> usize {
        if self.pending.is_some() {
            self.steps_taken.saturating_sub(1)
        } else {
            self.steps_taken
        }
    }

    /// Apply one request in place.
    pub fn apply(&mut self, action: JourneyAction) -> Outcome {
        if self.is_terminal() {
            return Outcome::Ignored(Ignored::Terminal);
        }
        let outcome = match action {
            JourneyAction::Advance => self.advance(),
            JourneyAction::Resolve => self.resolve(),
            JourneyAction::Intervene(patient) => self.intervene(patient),
            JourneyAction::Tick => self.tick(),
            JourneyAction::SetPaused(paused) => self.set_paused(paused),
            JourneyAction::SetAutoResolve(enabled) => self.set_auto_resolve(enabled),
            JourneyAction::SetSupport {
                patient,
                support,
                enabled,
            } => self.set_support(patient, support, enabled),
            JourneyAction::SetLever { lever, enabled } => self.set_lever(lever, enabled),
        };
        log::debug!(
            "journey {} {:?} -> {:?} (phase {:?})",
            self.seed,
            action,
            outcome,
            self.control.phase
        );
        outcome
    }

    fn advance(&mut self) -> Outcome {
        if let Err(reason) = self.control.check_advance() {
            return Outcome::Ignored(reason);
        }
        if self.steps_taken >= self.step_count() {
            return self.finish();
        }

        let step_index = self.steps_taken;
        self.steps_taken += 1;
        let position = u32::try_from(step_index).unwrap_or(u32::MAX);
        for patient in &mut self.patients {
            patient.position = position;
        }

        let threshold = self.tuning.occurrence_threshold(step_index);
        let a = self.roll_event(threshold);
        let b = self.roll_event(threshold);
        for id in PatientId::ALL {
            self.maybe_award_token(id);
        }

        self.pending = Some(PendingStep {
            step_index,
            step_name: self.catalog.step_name(step_index).to_string(),
            a,
            b,
        });
        self.control.begin_pending(self.tuning.countdown_secs);
        Outcome::Advanced
    }

    fn roll_event(&mut self, threshold: f64) -> Option<EventCard> {
        if self.rng.events.next_f64() > threshold {
            return None;
        }
        let deck = &self.catalog.events.events;
        let idx = self.rng.events.pick_index(deck.len());
        deck.get(idx).cloned()
    }

    fn maybe_award_token(&mut self, id: PatientId) {
        if self.rng.rewards.next_f64() >= self.tuning.token_award_chance {
            return;
        }
        let supports = &self.catalog.supports;
        let idx = self.rng.rewards.pick_index(supports.len());
        let Some(def) = supports.get(idx) else {
            return;
        };
        let patient = &mut self.patients[id.index()];
        patient.award(def.kind);
        patient.note(
            LogKind::Support,
            format!("Token gained: {} {}", def.name, def.icon),
            "Supports reduce delays. Not everyone gets them.",
        );
    }

    fn resolve(&mut self) -> Outcome {
        if self.control.phase != LoopPhase::PendingResolution {
            return Outcome::Ignored(Ignored::WrongPhase);
        }
        self.resolve_pending()
    }

    fn resolve_pending(&mut self) -> Outcome {
        let Some(pending) = self.pending.take() else {
            return Outcome::Ignored(Ignored::NoPendingEvent);
        };
        for id in PatientId::ALL {
            self.apply_one(id, pending.event(id), &pending.step_name);
        }
        self.control.finish_resolution();
        if self.steps_taken >= self.step_count() {
            self.finish()
        } else {
            Outcome::Resolved
        }
    }

    fn apply_one(&mut self, id: PatientId, event: Option<&EventCard>, step_name: &str) {
        let Some(event) = event else {
            self.patients[id.index()].note(
                LogKind::Ok,
                format!("✅ {step_name}"),
                "No extra delay on this step.",
            );
            return;
        };
        let adjusted = modifiers::resolve(event, &self.mitigations(id), SeverityBounds::JOURNEY);
        let patient = &mut self.patients[id.index()];
        patient.apply_delay(event.category, adjusted.severity, adjusted.secondary);
        patient.note(
            LogKind::Delay,
            format!(
                "{} {} (+{} days)",
                event.category.icon(),
                event.title,
                adjusted.severity
            ),
            event.why.clone(),
        );
    }

    fn intervene(&mut self, id: PatientId) -> Outcome {
        if self.control.phase != LoopPhase::PendingResolution {
            return Outcome::Ignored(Ignored::WrongPhase);
        }
        let Some(category) = self
            .pending
            .as_ref()
            .and_then(|pending| pending.event(id))
            .map(|event| event.category)
        else {
            return Outcome::Ignored(Ignored::NoPendingEvent);
        };
        let patient = &mut self.patients[id.index()];
        let Some(token) = patient.take_cover_for(category, &self.catalog) else {
            return Outcome::Ignored(Ignored::NoCoveringToken);
        };
        patient.note(
            LogKind::Support,
            format!("🛡️ Canceled: {} delay", category.name()),
            "A support resource prevented this delay.",
        );

        let all_clear = self.pending.as_mut().is_some_and(|pending| {
            pending.take_event(id);
            pending.is_clear()
        });
        if all_clear && self.resolve_pending() == Outcome::Finished {
            return Outcome::Finished;
        }
        Outcome::Intervened(token)
    }

    fn tick(&mut self) -> Outcome {
        if self.control.paused {
            return Outcome::Ignored(Ignored::Paused);
        }
        match self.control.tick() {
            TickResult::Idle => Outcome::Ignored(Ignored::NoScheduledTask),
            TickResult::Counting(left) => Outcome::Counting(left),
            TickResult::Fired(TaskKind::AutoResolve) => self.resolve_pending(),
        }
    }

    fn set_paused(&mut self, paused: bool) -> Outcome {
        if self.control.paused == paused {
            return Outcome::Ignored(Ignored::Unchanged);
        }
        self.control.paused = paused;
        Outcome::Updated
    }

    fn set_auto_resolve(&mut self, enabled: bool) -> Outcome {
        if self.control.auto_resolve == enabled {
            return Outcome::Ignored(Ignored::Unchanged);
        }
        self.control.auto_resolve = enabled;
        if self.control.phase == LoopPhase::PendingResolution {
            if enabled {
                self.control
                    .schedule(TaskKind::AutoResolve, self.tuning.countdown_secs);
            } else {
                self.control.cancel();
            }
        }
        Outcome::Updated
    }

    fn set_support(&mut self, id: PatientId, support: PersonalSupport, enabled: bool) -> Outcome {
        let supports = &mut self.supports[id.index()];
        if supports.is_active(support) == enabled {
            return Outcome::Ignored(Ignored::Unchanged);
        }
        supports.set(support, enabled);
        Outcome::Updated
    }

    fn set_lever(&mut self, lever: PolicyLever, enabled: bool) -> Outcome {
        if self.levers.is_active(lever) == enabled {
            return Outcome::Ignored(Ignored::Unchanged);
        }
        self.levers.set(lever, enabled);
        Outcome::Updated
    }

    fn finish(&mut self) -> Outcome {
        if self.control.mark_terminal() {
            let summary = self.summary();
            log::info!(
                "journey {} finished: A waited {} days, B waited {} days, gap {}",
                self.seed,
                summary.patient_a.delay,
                summary.patient_b.delay,
                summary.equity_gap
            );
            Outcome::Finished
        } else {
            Outcome::Ignored(Ignored::Terminal)
        }
    }
}

/// Pure form of [`JourneyRun::apply`].
#[must_use]
pub fn reduce(mut run: JourneyRun, action: JourneyAction) -> JourneyRun {
    run.apply(action);
    run
}
