//! Chemo Dash: a three-lane timed runner.
//!
//! The run advances in fixed 50 ms ticks. Barriers and pickups scroll down
//! the lanes toward the player; a barrier that reaches the player in the same
//! lane is either cleared (the right move was active) or hits. Positions and
//! timers are integers (thousandths of a pixel, milliseconds) so a snapshot
//! resumes bit-for-bit.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    DASH_BASE_SPEED, DASH_CLEAR_SCORE, DASH_CLOCK_MS, DASH_COIN_CHANCE, DASH_COIN_SCORE,
    DASH_DESPAWN_Y, DASH_HELP_CHANCE, DASH_HELP_SCORE, DASH_HIT_CLOCK_PENALTY_MS,
    DASH_HIT_SCORE_PENALTY, DASH_HIT_WINDOW, DASH_JUMP_MS, DASH_LANES, DASH_PLAYER_Y,
    DASH_SECOND_COIN_CHANCE, DASH_SLIDE_MS, DASH_SPAWN_GAP_MAX, DASH_SPAWN_GAP_MIN,
    DASH_SPAWN_GAP_RAMP, DASH_SPAWN_Y, DASH_SPEED_RAMP, DASH_START_LANE, DASH_START_SHIELD,
    DASH_TICK_MS, DASH_WIN_SCORE,
};
use crate::numbers::{i64_to_f64, round_f64_to_i64};
use crate::progression::Ignored;
use crate::rng::RngBundle;

const PILOT_JUMP_LEAD: f64 = 160.0;
const PILOT_SLIDE_LEAD: f64 = 110.0;
const PILOT_LANE_LEAD: f64 = 300.0;
const PILOT_PICKUP_LEAD: f64 = 250.0;

fn milli(px: f64) -> i64 {
    round_f64_to_i64(px * 1000.0)
}

/// Move that gets the player past a barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clearance {
    Jump,
    Slide,
    /// Only being in another lane helps.
    AvoidLane,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierKind {
    Traffic,
    BusDelay,
    Paperwork,
    Insurance,
}

impl BarrierKind {
    pub const ALL: [Self; 4] = [Self::Traffic, Self::BusDelay, Self::Paperwork, Self::Insurance];

    #[must_use]
    pub const fn clearance(self) -> Clearance {
        match self {
            Self::Traffic | Self::Insurance => Clearance::Jump,
            Self::Paperwork => Clearance::Slide,
            Self::BusDelay => Clearance::AvoidLane,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Traffic => "TRAFFIC",
            Self::BusDelay => "BUS DELAY",
            Self::Paperwork => "PAPERWORK",
            Self::Insurance => "INSURANCE",
        }
    }
}

impl fmt::Display for BarrierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    Coin,
    Help,
}

/// Something scrolling down a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane<K> {
    pub kind: K,
    pub lane: u8,
    /// Vertical position in thousandths of a pixel.
    pub y_milli: i64,
}

pub type Barrier = Lane<BarrierKind>;
pub type Pickup = Lane<PickupKind>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashInput {
    Left,
    Right,
    Jump,
    Slide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashAction {
    Input(DashInput),
    /// One fixed 50 ms step.
    Tick,
    SetPaused(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashEnding {
    MadeIt,
    Missed,
}

impl DashEnding {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::MadeIt => "YOU MADE IT TO CHEMO",
            Self::Missed => "YOU MISSED THE APPOINTMENT",
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MadeIt => "Even with skill, delays still happen.\nSupports make it survivable.",
            Self::Missed => "Not because you played badly.\nBecause delays stacked unfairly.",
        }
    }

    /// Suggestions shown under either ending.
    #[must_use]
    pub const fn what_could_help() -> [&'static str; 3] {
        [
            "flexible clinic hours",
            "reliable transportation",
            "paid sick leave / caregiver support",
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashOutcome {
    Moved,
    Ticked,
    Updated,
    Finished(DashEnding),
    Ignored(Ignored),
}

/// Tallies kept for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashStats {
    pub ticks: u32,
    pub cleared: u32,
    pub hits: u32,
    pub shields_spent: u32,
    pub clock_lost_ms: i64,
    pub help_collected: u32,
}

/// A complete Chemo Dash run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashRun {
    seed: u64,
    rng: RngBundle,
    time_left_ms: i64,
    lane: u8,
    air_ms: u32,
    slide_ms: u32,
    score: u32,
    coins: u32,
    shield: u32,
    spawn_in_ms: i64,
    #[serde(default)]
    barriers: Vec<Barrier>,
    #[serde(default)]
    pickups: Vec<Pickup>,
    #[serde(default)]
    stats: DashStats,
    #[serde(default)]
    paused: bool,
    #[serde(default)]
    ending: Option<DashEnding>,
}

impl DashRun {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: RngBundle::from_user_seed(seed),
            time_left_ms: DASH_CLOCK_MS,
            lane: DASH_START_LANE,
            air_ms: 0,
            slide_ms: 0,
            score: 0,
            coins: 0,
            shield: DASH_START_SHIELD,
            spawn_in_ms: 0,
            barriers: Vec::new(),
            pickups: Vec::new(),
            stats: DashStats::default(),
            paused: false,
            ending: None,
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Reject restored state with a lane or clock the runner cannot hold.
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        if self.lane >= DASH_LANES {
            return Err(format!("runner lane {} out of range", self.lane));
        }
        if !(0..=DASH_CLOCK_MS).contains(&self.time_left_ms) {
            return Err(format!("clock {} ms out of range", self.time_left_ms));
        }
        let stray = self
            .barriers
            .iter()
            .map(|barrier| barrier.lane)
            .chain(self.pickups.iter().map(|pickup| pickup.lane))
            .find(|lane| *lane >= DASH_LANES);
        if let Some(lane) = stray {
            return Err(format!("object in lane {lane} out of range"));
        }
        Ok(())
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub const fn coins(&self) -> u32 {
        self.coins
    }

    #[must_use]
    pub const fn shield(&self) -> u32 {
        self.shield
    }

    #[must_use]
    pub const fn lane(&self) -> u8 {
        self.lane
    }

    #[must_use]
    pub const fn is_airborne(&self) -> bool {
        self.air_ms > 0
    }

    #[must_use]
    pub const fn is_sliding(&self) -> bool {
        self.slide_ms > 0
    }

    #[must_use]
    pub const fn time_left_ms(&self) -> i64 {
        self.time_left_ms
    }

    /// Whole seconds shown on the clock.
    #[must_use]
    pub const fn display_seconds(&self) -> i64 {
        if self.time_left_ms <= 0 {
            0
        } else {
            (self.time_left_ms + 999) / 1000
        }
    }

    #[must_use]
    pub const fn ending(&self) -> Option<DashEnding> {
        self.ending
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.ending.is_some()
    }

    #[must_use]
    pub const fn stats(&self) -> DashStats {
        self.stats
    }

    #[must_use]
    pub fn barriers(&self) -> &[Barrier] {
        &self.barriers
    }

    #[must_use]
    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    #[must_use]
    pub const fn rng_draws(&self) -> u64 {
        self.rng.total_draws()
    }

    pub fn apply(&mut self, action: DashAction) -> DashOutcome {
        if self.ending.is_some() {
            return DashOutcome::Ignored(Ignored::Terminal);
        }
        match action {
            DashAction::Input(input) => self.input(input),
            DashAction::Tick => self.tick(),
            DashAction::SetPaused(paused) => {
                if self.paused == paused {
                    DashOutcome::Ignored(Ignored::Unchanged)
                } else {
                    self.paused = paused;
                    DashOutcome::Updated
                }
            }
        }
    }

    fn input(&mut self, input: DashInput) -> DashOutcome {
        if self.paused {
            return DashOutcome::Ignored(Ignored::Paused);
        }
        let changed = match input {
            DashInput::Left if self.lane > 0 => {
                self.lane -= 1;
                true
            }
            DashInput::Right if self.lane + 1 < DASH_LANES => {
                self.lane += 1;
                true
            }
            DashInput::Jump if !self.is_airborne() => {
                self.air_ms = DASH_JUMP_MS;
                true
            }
            DashInput::Slide if !self.is_airborne() && !self.is_sliding() => {
                self.slide_ms = DASH_SLIDE_MS;
                true
            }
            _ => false,
        };
        if changed {
            DashOutcome::Moved
        } else {
            DashOutcome::Ignored(Ignored::Unchanged)
        }
    }

    /// Seconds of clock consumed, penalties included.
    fn elapsed_secs(&self) -> f64 {
        i64_to_f64((DASH_CLOCK_MS - self.time_left_ms).max(0)) / 1000.0
    }

    fn spawn_gap_ms(&self) -> i64 {
        let gap = DASH_SPAWN_GAP_RAMP
            .mul_add(-self.elapsed_secs(), DASH_SPAWN_GAP_MAX)
            .clamp(DASH_SPAWN_GAP_MIN, DASH_SPAWN_GAP_MAX);
        round_f64_to_i64(gap * 1000.0)
    }

    fn scroll_per_tick_milli(&self) -> i64 {
        let speed = DASH_SPEED_RAMP.mul_add(self.elapsed_secs(), DASH_BASE_SPEED);
        milli(speed * f64::from(DASH_TICK_MS) / 1000.0)
    }

    fn random_lane(&mut self) -> u8 {
        u8::try_from(self.rng.dice.pick_index(usize::from(DASH_LANES))).unwrap_or(0)
    }

    fn spawn(&mut self) {
        let roll = self.rng.events.next_f64();
        if roll < DASH_COIN_CHANCE {
            self.spawn_pickup(PickupKind::Coin);
            if self.rng.events.next_f64() < DASH_SECOND_COIN_CHANCE {
                self.spawn_pickup(PickupKind::Coin);
            }
        } else if roll < DASH_HELP_CHANCE {
            self.spawn_pickup(PickupKind::Help);
        } else {
            let kind = BarrierKind::ALL[self.rng.dice.pick_index(BarrierKind::ALL.len())];
            let lane = self.random_lane();
            self.barriers.push(Barrier {
                kind,
                lane,
                y_milli: milli(DASH_SPAWN_Y),
            });
        }
    }

    fn spawn_pickup(&mut self, kind: PickupKind) {
        let lane = self.random_lane();
        self.pickups.push(Pickup {
            kind,
            lane,
            y_milli: milli(DASH_SPAWN_Y),
        });
    }

    fn at_player(&self, lane: u8, y_milli: i64) -> bool {
        lane == self.lane && (y_milli - milli(DASH_PLAYER_Y)).abs() < milli(DASH_HIT_WINDOW)
    }

    fn tick(&mut self) -> DashOutcome {
        if self.paused {
            return DashOutcome::Ignored(Ignored::Paused);
        }
        let dt = i64::from(DASH_TICK_MS);
        self.stats.ticks = self.stats.ticks.saturating_add(1);
        self.air_ms = self.air_ms.saturating_sub(DASH_TICK_MS);
        self.slide_ms = self.slide_ms.saturating_sub(DASH_TICK_MS);

        self.spawn_in_ms -= dt;
        if self.spawn_in_ms <= 0 {
            self.spawn_in_ms = self.spawn_gap_ms();
            self.spawn();
        }

        let step = self.scroll_per_tick_milli();
        self.scroll_barriers(step);
        self.scroll_pickups(step);

        self.time_left_ms -= dt;
        if self.time_left_ms <= 0 {
            return self.finish();
        }
        DashOutcome::Ticked
    }

    fn scroll_barriers(&mut self, step: i64) {
        let despawn = milli(DASH_DESPAWN_Y);
        let barriers = std::mem::take(&mut self.barriers);
        let mut kept = Vec::with_capacity(barriers.len());
        for mut barrier in barriers {
            barrier.y_milli += step;
            if self.at_player(barrier.lane, barrier.y_milli) {
                self.meet_barrier(barrier.kind);
            } else if barrier.y_milli <= despawn {
                kept.push(barrier);
            }
        }
        self.barriers = kept;
    }

    fn meet_barrier(&mut self, kind: BarrierKind) {
        let cleared = match kind.clearance() {
            Clearance::Jump => self.is_airborne(),
            Clearance::Slide => self.is_sliding(),
            Clearance::AvoidLane => false,
        };
        if cleared {
            self.score = self.score.saturating_add(DASH_CLEAR_SCORE);
            self.stats.cleared += 1;
            return;
        }
        self.stats.hits += 1;
        if self.shield > 0 {
            self.shield -= 1;
            self.stats.shields_spent += 1;
        } else {
            self.time_left_ms -= DASH_HIT_CLOCK_PENALTY_MS;
            self.stats.clock_lost_ms += DASH_HIT_CLOCK_PENALTY_MS;
        }
        self.score = self.score.saturating_sub(DASH_HIT_SCORE_PENALTY);
        log::debug!("dash {} hit by {kind} in lane {}", self.seed, self.lane);
    }

    fn scroll_pickups(&mut self, step: i64) {
        let despawn = milli(DASH_DESPAWN_Y);
        let pickups = std::mem::take(&mut self.pickups);
        let mut kept = Vec::with_capacity(pickups.len());
        for mut pickup in pickups {
            pickup.y_milli += step;
            if self.at_player(pickup.lane, pickup.y_milli) {
                match pickup.kind {
                    PickupKind::Coin => {
                        self.coins += 1;
                        self.score = self.score.saturating_add(DASH_COIN_SCORE);
                    }
                    PickupKind::Help => {
                        self.shield += 1;
                        self.stats.help_collected += 1;
                        self.score = self.score.saturating_add(DASH_HELP_SCORE);
                    }
                }
            } else if pickup.y_milli <= despawn {
                kept.push(pickup);
            }
        }
        self.pickups = kept;
    }

    fn finish(&mut self) -> DashOutcome {
        let ending = if self.score >= DASH_WIN_SCORE {
            DashEnding::MadeIt
        } else {
            DashEnding::Missed
        };
        self.time_left_ms = self.time_left_ms.max(0);
        self.ending = Some(ending);
        log::info!(
            "dash {} finished: {:?} with score {} ({} coins, {} hits)",
            self.seed,
            ending,
            self.score,
            self.coins,
            self.stats.hits
        );
        DashOutcome::Finished(ending)
    }

    /// Distance in pixels from the nearest approaching barrier in `lane`.
    fn threat_distance(&self, lane: u8) -> Option<f64> {
        let player = milli(DASH_PLAYER_Y);
        self.barriers
            .iter()
            .filter(|barrier| barrier.lane == lane && barrier.y_milli < player)
            .map(|barrier| i64_to_f64(player - barrier.y_milli) / 1000.0)
            .min_by(f64::total_cmp)
    }

    fn lane_is_clear(&self, lane: u8, lead: f64) -> bool {
        self.threat_distance(lane).is_none_or(|dist| dist > lead)
    }

    /// A reasonable next move for headless play: clear the nearest barrier,
    /// dodge bus delays, and drift toward pickups in a clear lane.
    #[must_use]
    pub fn pilot_input(&self) -> Option<DashInput> {
        if self.is_finished() {
            return None;
        }
        let nearest = self
            .barriers
            .iter()
            .filter(|barrier| barrier.lane == self.lane && barrier.y_milli < milli(DASH_PLAYER_Y))
            .max_by_key(|barrier| barrier.y_milli);
        if let Some(barrier) = nearest {
            let dist = i64_to_f64(milli(DASH_PLAYER_Y) - barrier.y_milli) / 1000.0;
            match barrier.kind.clearance() {
                Clearance::Jump if dist <= PILOT_JUMP_LEAD && !self.is_airborne() => {
                    return Some(DashInput::Jump);
                }
                Clearance::Slide
                    if dist <= PILOT_SLIDE_LEAD && !self.is_airborne() && !self.is_sliding() =>
                {
                    return Some(DashInput::Slide);
                }
                Clearance::AvoidLane if dist <= PILOT_LANE_LEAD => {
                    return self.dodge();
                }
                _ => {}
            }
            if dist <= PILOT_LANE_LEAD {
                return None;
            }
        }
        self.chase_pickup()
    }

    fn dodge(&self) -> Option<DashInput> {
        let left = self.lane.checked_sub(1);
        let right = (self.lane + 1 < DASH_LANES).then_some(self.lane + 1);
        [(left, DashInput::Left), (right, DashInput::Right)]
            .into_iter()
            .filter_map(|(lane, input)| lane.map(|lane| (lane, input)))
            .find(|(lane, _)| self.lane_is_clear(*lane, PILOT_LANE_LEAD))
            .map(|(_, input)| input)
    }

    fn chase_pickup(&self) -> Option<DashInput> {
        let player = milli(DASH_PLAYER_Y);
        let target = self
            .pickups
            .iter()
            .filter(|pickup| pickup.y_milli < player)
            .filter(|pickup| i64_to_f64(player - pickup.y_milli) / 1000.0 <= PILOT_PICKUP_LEAD)
            .max_by_key(|pickup| pickup.y_milli)?;
        let input = match target.lane.cmp(&self.lane) {
            std::cmp::Ordering::Less => DashInput::Left,
            std::cmp::Ordering::Greater => DashInput::Right,
            std::cmp::Ordering::Equal => return None,
        };
        let next_lane = if input == DashInput::Left {
            self.lane - 1
        } else {
            self.lane + 1
        };
        self.lane_is_clear(next_lane, PILOT_LANE_LEAD)
            .then_some(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(seed: u64) -> DashRun {
        let mut run = DashRun::new(seed);
        run.spawn_in_ms = i64::MAX / 2;
        run
    }

    fn barrier_near(run: &mut DashRun, kind: BarrierKind) {
        run.barriers.push(Barrier {
            kind,
            lane: run.lane,
            y_milli: milli(DASH_PLAYER_Y - 60.0),
        });
    }

    #[test]
    fn jump_clears_traffic() {
        let mut run = quiet(1);
        barrier_near(&mut run, BarrierKind::Traffic);
        assert_eq!(run.apply(DashAction::Input(DashInput::Jump)), DashOutcome::Moved);
        run.apply(DashAction::Tick);
        assert_eq!(run.score(), 12);
        assert_eq!(run.stats().cleared, 1);
        assert!(run.barriers().is_empty());
    }

    #[test]
    fn slide_clears_paperwork_but_not_traffic() {
        let mut run = quiet(2);
        barrier_near(&mut run, BarrierKind::Paperwork);
        run.apply(DashAction::Input(DashInput::Slide));
        run.apply(DashAction::Tick);
        assert_eq!(run.score(), 12);

        barrier_near(&mut run, BarrierKind::Traffic);
        run.apply(DashAction::Tick);
        assert_eq!(run.stats().hits, 1);
        assert_eq!(run.shield(), 0);
        assert_eq!(run.score(), 2);
    }

    #[test]
    fn bus_delay_always_hits_in_lane() {
        let mut run = quiet(3);
        barrier_near(&mut run, BarrierKind::BusDelay);
        run.apply(DashAction::Input(DashInput::Jump));
        run.apply(DashAction::Tick);
        assert_eq!(run.stats().hits, 1);
    }

    #[test]
    fn hit_without_shield_costs_clock_and_floors_score() {
        let mut run = quiet(4);
        run.shield = 0;
        let before = run.time_left_ms();
        barrier_near(&mut run, BarrierKind::Insurance);
        run.apply(DashAction::Tick);
        assert_eq!(run.score(), 0);
        assert_eq!(run.time_left_ms(), before - 6_000 - 50);
        assert_eq!(run.stats().clock_lost_ms, 6_000);
    }

    #[test]
    fn barrier_in_other_lane_passes() {
        let mut run = quiet(5);
        run.barriers.push(Barrier {
            kind: BarrierKind::Traffic,
            lane: 0,
            y_milli: milli(DASH_PLAYER_Y - 60.0),
        });
        run.apply(DashAction::Tick);
        assert_eq!(run.stats().hits, 0);
        assert_eq!(run.barriers().len(), 1);
    }

    #[test]
    fn pickups_add_coins_and_shields() {
        let mut run = quiet(6);
        for kind in [PickupKind::Coin, PickupKind::Help] {
            run.pickups.push(Pickup {
                kind,
                lane: 1,
                y_milli: milli(DASH_PLAYER_Y - 60.0),
            });
        }
        run.apply(DashAction::Tick);
        assert_eq!(run.coins(), 1);
        assert_eq!(run.shield(), 2);
        assert_eq!(run.score(), 23);
    }

    #[test]
    fn lanes_are_bounded_and_moves_do_not_stack() {
        let mut run = quiet(7);
        assert_eq!(run.apply(DashAction::Input(DashInput::Left)), DashOutcome::Moved);
        assert_eq!(
            run.apply(DashAction::Input(DashInput::Left)),
            DashOutcome::Ignored(Ignored::Unchanged)
        );
        run.apply(DashAction::Input(DashInput::Jump));
        assert_eq!(
            run.apply(DashAction::Input(DashInput::Jump)),
            DashOutcome::Ignored(Ignored::Unchanged)
        );
        assert_eq!(
            run.apply(DashAction::Input(DashInput::Slide)),
            DashOutcome::Ignored(Ignored::Unchanged)
        );
        for _ in 0..15 {
            run.apply(DashAction::Tick);
        }
        assert!(!run.is_airborne());
    }

    #[test]
    fn clock_expiry_decides_the_ending() {
        let mut run = quiet(8);
        run.time_left_ms = 100;
        run.score = 220;
        assert_eq!(run.apply(DashAction::Tick), DashOutcome::Ticked);
        assert_eq!(
            run.apply(DashAction::Tick),
            DashOutcome::Finished(DashEnding::MadeIt)
        );
        assert_eq!(
            run.apply(DashAction::Tick),
            DashOutcome::Ignored(Ignored::Terminal)
        );

        let mut short = quiet(9);
        short.time_left_ms = 50;
        short.score = 219;
        assert_eq!(
            short.apply(DashAction::Tick),
            DashOutcome::Finished(DashEnding::Missed)
        );
    }

    #[test]
    fn spawn_gap_shrinks_to_floor() {
        let mut run = quiet(10);
        assert_eq!(run.spawn_gap_ms(), 650);
        run.time_left_ms = 0;
        assert_eq!(run.spawn_gap_ms(), 320);
        run.time_left_ms = 30_000;
        assert_eq!(run.spawn_gap_ms(), 470);
    }

    #[test]
    fn paused_run_ignores_ticks_and_inputs() {
        let mut run = DashRun::new(11);
        run.apply(DashAction::SetPaused(true));
        assert_eq!(run.apply(DashAction::Tick), DashOutcome::Ignored(Ignored::Paused));
        assert_eq!(
            run.apply(DashAction::Input(DashInput::Right)),
            DashOutcome::Ignored(Ignored::Paused)
        );
        assert_eq!(run.time_left_ms(), 60_000);
    }

    #[test]
    fn pilot_reacts_to_nearest_barrier() {
        let mut run = quiet(12);
        barrier_near(&mut run, BarrierKind::Paperwork);
        assert_eq!(run.pilot_input(), Some(DashInput::Slide));
        run.barriers.clear();
        barrier_near(&mut run, BarrierKind::BusDelay);
        assert!(matches!(
            run.pilot_input(),
            Some(DashInput::Left | DashInput::Right)
        ));
    }
}
