//! Board race: two to four players roll along a fixed track.
//!
//! After each roll a gate may draw a card. Setbacks push the player back
//! (mitigated by the same resolver the journey uses, in spaces), boosts move
//! them forward. A player standing on the final space wins immediately,
//! however they got there.
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::catalog::{self, BoardCard, Catalog, Category};
use crate::config::BoardTuning;
use crate::constants::BOARD_DIE_FACES;
use crate::modifiers::{
    self, MitigationSet, PersonalSupport, PersonalSupports, PolicyLever, PolicyLevers,
    SeverityBounds,
};
use crate::participant::{LogEntry, LogKind, Participant};
use crate::progression::{Ignored, LoopControl, LoopPhase, Outcome, TaskKind, TickResult};
use crate::result::{BoardSummary, rank_standings};
use crate::rng::RngBundle;

/// Card drawn for the player whose turn it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCard {
    pub player: usize,
    pub card: BoardCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardAction {
    Roll,
    Resolve,
    Intervene(usize),
    Tick,
    SetPaused(bool),
    SetAutoResolve(bool),
    SetSupport {
        player: usize,
        support: PersonalSupport,
        enabled: bool,
    },
    SetLever {
        lever: PolicyLever,
        enabled: bool,
    },
}

/// A complete board race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardRun {
    seed: u64,
    rng: RngBundle,
    turn: u32,
    current: usize,
    #[serde(default)]
    last_roll: Option<u32>,
    control: LoopControl,
    #[serde(default)]
    pending: Option<PendingCard>,
    supports: Vec<PersonalSupports>,
    levers: PolicyLevers,
    tuning: BoardTuning,
    players: Vec<Participant>,
    #[serde(default)]
    winner: Option<usize>,
    #[serde(skip, default = "catalog::shared")]
    catalog: Arc<Catalog>,
}

impl BoardRun {
    #[must_use]
    pub fn new(seed: u64, tuning: BoardTuning) -> Self {
        Self::with_catalog(seed, tuning, catalog::shared())
    }

    #[must_use]
    pub fn with_catalog(seed: u64, tuning: BoardTuning, catalog: Arc<Catalog>) -> Self {
        let count = tuning.players.clamp(2, 4);
        let players = (1..=count)
            .map(|n| Participant::new(format!("P{n}"), tuning.log_cap))
            .collect();
        Self {
            seed,
            rng: RngBundle::from_user_seed(seed),
            turn: 0,
            current: 0,
            last_roll: None,
            control: LoopControl::new(true),
            pending: None,
            supports: vec![PersonalSupports::default(); count],
            levers: PolicyLevers::default(),
            tuning,
            players,
            winner: None,
            catalog,
        }
    }

    #[must_use]
    pub fn with_levers(mut self, levers: PolicyLevers) -> Self {
        self.levers = levers;
        self
    }

    #[must_use]
    pub fn with_auto_resolve(mut self, enabled: bool) -> Self {
        self.control.auto_resolve = enabled;
        self
    }

    pub fn rehydrate(&mut self, catalog: Arc<Catalog>) {
        self.catalog = catalog;
    }

    /// Reject restored state whose indices or positions fall outside the board.
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        self.tuning.validate().map_err(|err| err.to_string())?;
        let count = self.players.len();
        if !(2..=4).contains(&count) || count != self.tuning.players {
            return Err(format!(
                "{count} players recorded for a {}-player board",
                self.tuning.players
            ));
        }
        if self.supports.len() != count {
            return Err(format!(
                "{} support sets for {count} players",
                self.supports.len()
            ));
        }
        if self.current >= count {
            return Err(format!("current player {} out of range", self.current));
        }
        if let Some(winner) = self.winner
            && winner >= count
        {
            return Err(format!("winner {winner} out of range"));
        }
        if let Some(pending) = &self.pending
            && pending.player >= count
        {
            return Err(format!("pending card for player {} out of range", pending.player));
        }
        let finish = self.tuning.finish_space();
        if let Some(player) = self.players.iter().find(|p| p.position > finish) {
            return Err(format!(
                "{} stands on space {} past the finish {finish}",
                player.id, player.position
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

    /// Rolls made so far.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Seat index of the player to act.
    #[must_use]
    pub const fn current_player(&self) -> usize {
        self.current
    }

    #[must_use]
    pub const fn last_roll(&self) -> Option<u32> {
        self.last_roll
    }

    #[must_use]
    pub fn players(&self) -> &[Participant] {
        &self.players
    }

    #[must_use]
    pub const fn pending(&self) -> Option<&PendingCard> {
        self.pending.as_ref()
    }

    #[must_use]
    pub const fn winner(&self) -> Option<usize> {
        self.winner
    }

    #[must_use]
    pub fn time_remaining(&self) -> Option<u32> {
        self.control.time_remaining()
    }

    #[must_use]
    pub const fn tuning(&self) -> &BoardTuning {
        &self.tuning
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn levers(&self) -> PolicyLevers {
        self.levers
    }

    #[must_use]
    pub const fn rng_draws(&self) -> u64 {
        self.rng.total_draws()
    }

    #[must_use]
    pub fn mitigations(&self, player: usize) -> MitigationSet {
        let personal = self.supports.get(player).copied().unwrap_or_default();
        MitigationSet::new(personal, self.levers)
    }

    #[must_use]
    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            seed: self.seed,
            turns: self.turn,
            finished: self.is_terminal(),
            winner: self.winner.map(|idx| self.players[idx].id.clone()),
            standings: rank_standings(&self.players, self.winner),
        }
    }

    pub fn apply(&mut self, action: BoardAction) -> Outcome {
        if self.is_terminal() {
            return Outcome::Ignored(Ignored::Terminal);
        }
        let outcome = match action {
            BoardAction::Roll => self.roll(),
            BoardAction::Resolve => self.resolve(),
            BoardAction::Intervene(player) => self.intervene(player),
            BoardAction::Tick => self.tick(),
            BoardAction::SetPaused(paused) => {
                if self.control.paused == paused {
                    Outcome::Ignored(Ignored::Unchanged)
                } else {
                    self.control.paused = paused;
                    Outcome::Updated
                }
            }
            BoardAction::SetAutoResolve(enabled) => self.set_auto_resolve(enabled),
            BoardAction::SetSupport {
                player,
                support,
                enabled,
            } => match self.supports.get_mut(player) {
                Some(set) if set.is_active(support) != enabled => {
                    set.set(support, enabled);
                    Outcome::Updated
                }
                _ => Outcome::Ignored(Ignored::Unchanged),
            },
            BoardAction::SetLever { lever, enabled } => {
                if self.levers.is_active(lever) == enabled {
                    Outcome::Ignored(Ignored::Unchanged)
                } else {
                    self.levers.set(lever, enabled);
                    Outcome::Updated
                }
            }
        };
        log::debug!(
            "board {} turn {} {:?} -> {:?}",
            self.seed,
            self.turn,
            action,
            outcome
        );
        outcome
    }

    fn roll(&mut self) -> Outcome {
        if let Err(reason) = self.control.check_advance() {
            return Outcome::Ignored(reason);
        }
        let player = self.current;
        let roll = u32::try_from(self.rng.dice.pick_index(BOARD_DIE_FACES) + 1).unwrap_or(1);
        let turn = self.turn;
        self.turn = self.turn.saturating_add(1);
        self.last_roll = Some(roll);

        let target = self.players[player].position.saturating_add(roll);
        self.players[player].note(
            LogKind::Move,
            format!("🎲 Rolled {roll}"),
            format!("Moved to space {}.", target.min(self.tuning.finish_space())),
        );
        if self.settle_position(player, target) {
            return self.finish();
        }

        let landed = self.players[player].position;
        if self.tuning.is_support_space(landed) {
            self.award_token(player);
        }

        if self.rng.events.next_f64() <= self.tuning.occurrence_threshold(turn) {
            let deck = &self.catalog.board.cards;
            let idx = self.rng.events.pick_index(deck.len());
            if let Some(card) = deck.get(idx).cloned() {
                self.pending = Some(PendingCard { player, card });
                self.control.begin_pending(self.tuning.countdown_secs);
                return Outcome::Advanced;
            }
        }
        self.end_turn();
        Outcome::Advanced
    }

    fn award_token(&mut self, player: usize) {
        let supports = &self.catalog.supports;
        let idx = self.rng.rewards.pick_index(supports.len());
        let Some(def) = supports.get(idx) else {
            return;
        };
        let participant = &mut self.players[player];
        participant.award(def.kind);
        participant.note(
            LogKind::Support,
            format!("Support space: {} {}", def.name, def.icon),
            "Supports reduce delays. Not everyone gets them.",
        );
    }

    /// Move a player to `target`, clamped to the final space. Returns `true`
    /// when the player now stands on the final space and has won.
    fn settle_position(&mut self, player: usize, target: u32) -> bool {
        let finish = self.tuning.finish_space();
        let position = target.min(finish);
        self.players[player].position = position;
        if position == finish && self.winner.is_none() {
            self.winner = Some(player);
        }
        self.winner == Some(player)
    }

    fn end_turn(&mut self) {
        self.control.finish_resolution();
        self.current = (self.current + 1) % self.players.len().max(1);
    }

    fn resolve(&mut self) -> Outcome {
        if self.control.phase != LoopPhase::PendingResolution {
            return Outcome::Ignored(Ignored::WrongPhase);
        }
        self.resolve_pending()
    }

    fn resolve_pending(&mut self) -> Outcome {
        let Some(PendingCard { player, card }) = self.pending.take() else {
            return Outcome::Ignored(Ignored::NoPendingEvent);
        };
        match &card {
            BoardCard::Setback { .. } => {
                if let Some(event) = card.as_event() {
                    let adjusted =
                        modifiers::resolve(&event, &self.mitigations(player), SeverityBounds::BOARD);
                    let participant = &mut self.players[player];
                    participant.position = participant.position.saturating_sub(adjusted.severity);
                    participant.apply_delay(event.category, adjusted.severity, adjusted.secondary);
                    participant.note(
                        LogKind::Delay,
                        format!(
                            "{} {} (-{} spaces)",
                            event.category.icon(),
                            event.title,
                            adjusted.severity
                        ),
                        event.why,
                    );
                }
            }
            BoardCard::Boost { title, spaces, why } => {
                let target = self.players[player].position.saturating_add(*spaces);
                self.players[player].note(
                    LogKind::Move,
                    format!("⏩ {title} (+{spaces} spaces)"),
                    why.clone(),
                );
                if self.settle_position(player, target) {
                    return self.finish();
                }
            }
        }
        self.end_turn();
        Outcome::Resolved
    }

    fn intervene(&mut self, player: usize) -> Outcome {
        if self.control.phase != LoopPhase::PendingResolution {
            return Outcome::Ignored(Ignored::WrongPhase);
        }
        let Some(category) = self
            .pending
            .as_ref()
            .filter(|pending| pending.player == player)
            .and_then(|pending| pending.card.category())
        else {
            return Outcome::Ignored(Ignored::NoPendingEvent);
        };
        let Some(participant) = self.players.get_mut(player) else {
            return Outcome::Ignored(Ignored::NoPendingEvent);
        };
        let Some(token) = participant.take_cover_for(category, &self.catalog) else {
            return Outcome::Ignored(Ignored::NoCoveringToken);
        };
        participant.note(
            LogKind::Support,
            format!("🛡️ Canceled: {} setback", category.name()),
            "A support resource prevented this setback.",
        );
        self.pending = None;
        self.end_turn();
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

    fn finish(&mut self) -> Outcome {
        self.pending = None;
        if !self.control.mark_terminal() {
            return Outcome::Ignored(Ignored::Terminal);
        }
        if let Some(winner) = self.winner {
            log::info!(
                "board {} finished after {} turns: {} wins",
                self.seed,
                self.turn,
                self.players[winner].id
            );
        }
        Outcome::Finished
    }

    #[must_use]
    pub fn view(&self) -> BoardView {
        let pending = self.pending.as_ref().map(|pending| {
            let (category, spaces, can_intervene) = match &pending.card {
                BoardCard::Setback { .. } => {
                    let event = pending.card.as_event();
                    let spaces = event.as_ref().map_or(0, |event| {
                        modifiers::resolve(event, &self.mitigations(pending.player), SeverityBounds::BOARD)
                            .severity
                    });
                    let category = pending.card.category();
                    let can = category.is_some_and(|cat| {
                        self.players[pending.player].has_cover_for(cat, &self.catalog)
                    });
                    (category, -i64::from(spaces), can)
                }
                BoardCard::Boost { spaces, .. } => (None, i64::from(*spaces), false),
            };
            CardView {
                player: self.players[pending.player].id.clone(),
                title: pending.card.title().to_string(),
                why: pending.card.why().to_string(),
                category,
                spaces,
                can_intervene,
            }
        });
        BoardView {
            seed: self.seed,
            phase: self.control.phase,
            turn: self.turn,
            finish_space: self.tuning.finish_space(),
            current_player: self.players[self.current].id.clone(),
            last_roll: self.last_roll,
            paused: self.control.paused,
            time_remaining: self.control.time_remaining(),
            pending,
            players: self
                .players
                .iter()
                .map(|player| PlayerView {
                    id: player.id.clone(),
                    position: player.position,
                    spaces_lost: player.delay,
                    stress: player.stress,
                    tokens: player
                        .token_counts()
                        .into_iter()
                        .map(|(kind, count)| (self.catalog.support_label(kind), count))
                        .collect(),
                    log: player.log.iter().cloned().collect(),
                })
                .collect(),
            winner: self.winner.map(|idx| self.players[idx].id.clone()),
        }
    }
}

/// Pure form of [`BoardRun::apply`].
#[must_use]
pub fn reduce(mut run: BoardRun, action: BoardAction) -> BoardRun {
    run.apply(action);
    run
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub player: String,
    pub title: String,
    pub why: String,
    pub category: Option<Category>,
    /// Signed movement if resolved now.
    pub spaces: i64,
    pub can_intervene: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: String,
    pub position: u32,
    pub spaces_lost: u32,
    pub stress: u32,
    pub tokens: Vec<(String, usize)>,
    pub log: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    pub seed: u64,
    pub phase: LoopPhase,
    pub turn: u32,
    pub finish_space: u32,
    pub current_player: String,
    pub last_roll: Option<u32>,
    pub paused: bool,
    pub time_remaining: Option<u32>,
    pub pending: Option<CardView>,
    pub players: Vec<PlayerView>,
    pub winner: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SupportKind;

    fn manual(seed: u64) -> BoardRun {
        BoardRun::new(seed, BoardTuning::default()).with_auto_resolve(false)
    }

    fn setback(category: Category, spaces: u32) -> BoardCard {
        BoardCard::Setback {
            category,
            title: String::from("setback"),
            spaces,
            stress: 2,
            why: String::new(),
        }
    }

    fn play_out(run: &mut BoardRun) -> usize {
        let mut actions = 0;
        while !run.is_terminal() && actions < 10_000 {
            if run.phase() == LoopPhase::PendingResolution {
                run.apply(BoardAction::Resolve);
            } else {
                run.apply(BoardAction::Roll);
            }
            actions += 1;
        }
        actions
    }

    #[test]
    fn turns_rotate_between_players() {
        let mut run = manual(4);
        assert_eq!(run.current_player(), 0);
        run.apply(BoardAction::Roll);
        if run.phase() == LoopPhase::PendingResolution {
            run.apply(BoardAction::Resolve);
        }
        assert_eq!(run.current_player(), 1);
        assert!(run.last_roll().is_some_and(|roll| (1..=6).contains(&roll)));
    }

    #[test]
    fn race_ends_with_single_winner_on_final_space() {
        for seed in [1_u64, 2, 3, 42, 1_000] {
            let mut run = manual(seed);
            play_out(&mut run);
            assert!(run.is_terminal(), "seed {seed} never finished");
            let winner = run.winner().expect("winner");
            assert_eq!(run.players()[winner].position, 31);
            let summary = run.summary();
            assert_eq!(summary.standings[0].totals.id, run.players()[winner].id);
            assert_eq!(
                run.apply(BoardAction::Roll),
                Outcome::Ignored(Ignored::Terminal)
            );
        }
    }

    #[test]
    fn boost_onto_final_space_wins_like_a_roll() {
        let mut run = manual(9);
        run.players[0].position = 29;
        run.pending = Some(PendingCard {
            player: 0,
            card: BoardCard::Boost {
                title: String::from("Open slot"),
                spaces: 4,
                why: String::new(),
            },
        });
        run.control.begin_pending(5);
        assert_eq!(run.apply(BoardAction::Resolve), Outcome::Finished);
        assert_eq!(run.winner(), Some(0));
        assert_eq!(run.players()[0].position, 31);
    }

    #[test]
    fn setback_is_mitigated_and_floored_at_start() {
        let mut run = manual(10).with_levers(PolicyLevers {
            transit: true,
            ..PolicyLevers::default()
        });
        run.players[1].position = 1;
        run.current = 1;
        run.pending = Some(PendingCard {
            player: 1,
            card: setback(Category::Transport, 5),
        });
        run.control.begin_pending(5);
        assert_eq!(run.apply(BoardAction::Resolve), Outcome::Resolved);
        assert_eq!(run.players()[1].position, 0);
        assert_eq!(run.players()[1].delay, 3);
        assert_eq!(run.current_player(), 0);
    }

    #[test]
    fn intervention_cancels_covered_setback_only() {
        let mut run = manual(11);
        run.players[0].award(SupportKind::RideVoucher);
        run.pending = Some(PendingCard {
            player: 0,
            card: setback(Category::Clinic, 4),
        });
        run.control.begin_pending(5);
        assert_eq!(
            run.apply(BoardAction::Intervene(0)),
            Outcome::Ignored(Ignored::NoCoveringToken)
        );
        assert_eq!(
            run.apply(BoardAction::Intervene(1)),
            Outcome::Ignored(Ignored::NoPendingEvent)
        );
        run.players[0].award(SupportKind::Navigator);
        assert_eq!(
            run.apply(BoardAction::Intervene(0)),
            Outcome::Intervened(SupportKind::Navigator)
        );
        assert_eq!(run.players()[0].tokens.as_slice(), &[SupportKind::RideVoucher]);
        assert_eq!(run.phase(), LoopPhase::Resolved);
        assert_eq!(run.players()[0].delay, 0);
    }

    #[test]
    fn same_seed_same_race() {
        let mut a = manual(2024);
        let mut b = manual(2024);
        play_out(&mut a);
        play_out(&mut b);
        assert_eq!(a.summary(), b.summary());
        assert_eq!(a.rng_draws(), b.rng_draws());
    }

    #[test]
    fn four_player_view_lists_everyone() {
        let tuning = BoardTuning {
            players: 4,
            ..BoardTuning::default()
        };
        let run = BoardRun::new(5, tuning);
        let view = run.view();
        assert_eq!(view.players.len(), 4);
        assert_eq!(view.current_player, "P1");
        assert_eq!(view.finish_space, 31);
        assert!(view.pending.is_none());
    }

    #[test]
    fn restored_card_for_missing_player_is_rejected() {
        let mut run = manual(12);
        assert_eq!(run.check_consistency(), Ok(()));
        run.pending = Some(PendingCard {
            player: 6,
            card: setback(Category::Insurance, 3),
        });
        let json = crate::Snapshot::board(&run).to_json().expect("serialize");
        assert!(matches!(
            crate::Snapshot::from_json(&json),
            Err(crate::SnapshotError::Inconsistent(_))
        ));
    }
}
