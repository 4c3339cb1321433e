//! Centralized balance and tuning constants for the Care Gap simulations.
//!
//! These values define the deterministic math for the core simulations.
//! Runtime-tunable values live in [`crate::config`] and default to the
//! numbers below; everything else can only change through a code change.

// Storage keys -------------------------------------------------------------
pub const DEFAULT_SAVE_SLOT: &str = "twoPatientsSimV2";
pub(crate) const SNAPSHOT_VERSION: u32 = 2;

// Random stream domain tags ------------------------------------------------
pub(crate) const STREAM_EVENTS: &[u8] = b"events";
pub(crate) const STREAM_REWARDS: &[u8] = b"rewards";
pub(crate) const STREAM_DICE: &[u8] = b"dice";

// Journey tuning -----------------------------------------------------------
pub(crate) const JOURNEY_OCCURRENCE_BASE: f64 = 0.55;
pub(crate) const JOURNEY_OCCURRENCE_PER_STEP: f64 = 0.03;
pub(crate) const JOURNEY_TOKEN_AWARD_CHANCE: f64 = 0.22;
pub(crate) const JOURNEY_MAX_DAYS: u32 = 30;
pub(crate) const JOURNEY_MAX_STRESS: u32 = 10;
pub(crate) const JOURNEY_STRESS_SPIKE_DAYS: i64 = 8;
pub(crate) const COUNTDOWN_SECONDS: u32 = 5;
pub(crate) const RECENT_LOG_CAP: usize = 10;

// Mitigation deltas --------------------------------------------------------
pub(crate) const SUPPORT_REDUCTION: i64 = 2;
pub(crate) const LEVER_REDUCTION: i64 = 2;
pub(crate) const NAVIGATOR_PROGRAM_REDUCTION: i64 = 1;
pub(crate) const NAVIGATOR_STRESS_RELIEF: i64 = 1;

// Board tuning -------------------------------------------------------------
pub(crate) const BOARD_SPACES: u32 = 32;
pub(crate) const BOARD_PLAYERS: usize = 2;
pub(crate) const BOARD_DIE_FACES: usize = 6;
pub(crate) const BOARD_SUPPORT_SPACE_EVERY: u32 = 5;
pub(crate) const BOARD_OCCURRENCE_BASE: f64 = 0.35;
pub(crate) const BOARD_OCCURRENCE_PER_TURN: f64 = 0.02;
pub(crate) const BOARD_OCCURRENCE_CAP: f64 = 0.85;
pub(crate) const BOARD_MAX_SETBACK: u32 = 6;
pub(crate) const BOARD_MAX_STRESS: u32 = 10;

// Dash tuning --------------------------------------------------------------
pub(crate) const DASH_TICK_MS: u32 = 50;
pub(crate) const DASH_CLOCK_MS: i64 = 60_000;
pub(crate) const DASH_LANES: u8 = 3;
pub(crate) const DASH_START_LANE: u8 = 1;
pub(crate) const DASH_START_SHIELD: u32 = 1;
pub(crate) const DASH_SPAWN_Y: f64 = 86.0;
pub(crate) const DASH_PLAYER_Y: f64 = 421.0;
pub(crate) const DASH_DESPAWN_Y: f64 = 620.0;
pub(crate) const DASH_HIT_WINDOW: f64 = 40.0;
pub(crate) const DASH_BASE_SPEED: f64 = 520.0;
pub(crate) const DASH_SPEED_RAMP: f64 = 2.8;
pub(crate) const DASH_SPAWN_GAP_MAX: f64 = 0.65;
pub(crate) const DASH_SPAWN_GAP_MIN: f64 = 0.32;
pub(crate) const DASH_SPAWN_GAP_RAMP: f64 = 0.006;
pub(crate) const DASH_COIN_CHANCE: f64 = 0.38;
pub(crate) const DASH_SECOND_COIN_CHANCE: f64 = 0.25;
pub(crate) const DASH_HELP_CHANCE: f64 = 0.46;
pub(crate) const DASH_JUMP_MS: u32 = 750;
pub(crate) const DASH_SLIDE_MS: u32 = 320;
pub(crate) const DASH_CLEAR_SCORE: u32 = 12;
pub(crate) const DASH_HIT_SCORE_PENALTY: u32 = 10;
pub(crate) const DASH_HIT_CLOCK_PENALTY_MS: i64 = 6_000;
pub(crate) const DASH_COIN_SCORE: u32 = 8;
pub(crate) const DASH_HELP_SCORE: u32 = 15;
pub(crate) const DASH_WIN_SCORE: u32 = 220;
