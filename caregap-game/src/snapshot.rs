//! Versioned run snapshots and the storage backends that hold them.
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;

use crate::board::BoardRun;
use crate::catalog::Catalog;
use crate::constants::SNAPSHOT_VERSION;
use crate::dash::DashRun;
use crate::journey::JourneyRun;
use crate::seed::SimVariant;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("inconsistent snapshot: {0}")]
    Inconsistent(String),
    #[error("invalid save slot name: {0:?}")]
    InvalidSlot(String),
    #[error("snapshot storage I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Any run, tagged by variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", content = "state", rename_all = "snake_case")]
pub enum RunSnapshot {
    Journey(JourneyRun),
    Board(BoardRun),
    Dash(DashRun),
}

impl RunSnapshot {
    #[must_use]
    pub const fn variant(&self) -> SimVariant {
        match self {
            Self::Journey(_) => SimVariant::Journey,
            Self::Board(_) => SimVariant::Board,
            Self::Dash(_) => SimVariant::Dash,
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        match self {
            Self::Journey(run) => run.seed(),
            Self::Board(run) => run.seed(),
            Self::Dash(run) => run.seed(),
        }
    }

    /// Check the restored state before any engine code indexes into it.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Inconsistent` naming the first value out of range.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let checked = match self {
            Self::Journey(run) => run.check_consistency(),
            Self::Board(run) => run.check_consistency(),
            Self::Dash(run) => run.check_consistency(),
        };
        checked.map_err(SnapshotError::Inconsistent)
    }

    /// Reattach content tables skipped during serialization.
    pub fn rehydrate(&mut self, catalog: &Arc<Catalog>) {
        match self {
            Self::Journey(run) => run.rehydrate(Arc::clone(catalog)),
            Self::Board(run) => run.rehydrate(Arc::clone(catalog)),
            Self::Dash(_) => {}
        }
    }
}

/// On-disk envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub run: RunSnapshot,
}

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

impl Snapshot {
    #[must_use]
    pub const fn new(run: RunSnapshot) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            run,
        }
    }

    #[must_use]
    pub fn journey(run: &JourneyRun) -> Self {
        Self::new(RunSnapshot::Journey(run.clone()))
    }

    #[must_use]
    pub fn board(run: &BoardRun) -> Self {
        Self::new(RunSnapshot::Board(run.clone()))
    }

    #[must_use]
    pub fn dash(run: &DashRun) -> Self {
        Self::new(RunSnapshot::Dash(run.clone()))
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a snapshot, checking the version before the body and the
    /// body's consistency after it.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` for malformed JSON, an unknown version, or
    /// state out of range for its run.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let header: VersionHeader = serde_json::from_str(json)?;
        if header.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: header.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.run.validate()?;
        Ok(snapshot)
    }

    #[must_use]
    pub fn into_journey(self) -> Option<JourneyRun> {
        match self.run {
            RunSnapshot::Journey(run) => Some(run),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_board(self) -> Option<BoardRun> {
        match self.run {
            RunSnapshot::Board(run) => Some(run),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_dash(self) -> Option<DashRun> {
        match self.run {
            RunSnapshot::Dash(run) => Some(run),
            _ => None,
        }
    }
}

/// Named save slots that outlive a run. Backends decide where the text goes;
/// loading always goes through [`Snapshot::from_json`].
pub trait SnapshotStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a snapshot into `slot`, replacing what was there.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save(&self, slot: &str, snapshot: &Snapshot) -> Result<(), Self::Error>;

    /// Load the snapshot in `slot`; `Ok(None)` when the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot exists but cannot be read or parsed.
    fn load(&self, slot: &str) -> Result<Option<Snapshot>, Self::Error>;

    /// Remove the snapshot in `slot`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be removed.
    fn delete(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Load a snapshot, treating a missing or unreadable save as nothing to load.
pub fn load_or_nothing<S: SnapshotStorage>(storage: &S, slot: &str) -> Option<Snapshot> {
    match storage.load(slot) {
        Ok(Some(snapshot)) => Some(snapshot),
        Ok(None) => {
            log::info!("no save found in slot {slot}");
            None
        }
        Err(err) => {
            log::warn!("discarding save in slot {slot}: {err}");
            None
        }
    }
}

/// Journey-only variant of [`load_or_nothing`].
pub fn load_journey_or_nothing<S: SnapshotStorage>(storage: &S, slot: &str) -> Option<JourneyRun> {
    let snapshot = load_or_nothing(storage, slot)?;
    let variant = snapshot.run.variant();
    let run = snapshot.into_journey();
    if run.is_none() {
        log::warn!("slot {slot} holds a {variant} run, not a journey");
    }
    run
}

/// In-process storage keyed by slot; stores the serialized text so corrupt
/// saves behave like they would on disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    saves: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place raw text into a slot.
    pub fn insert_raw(&self, slot: &str, text: impl Into<String>) {
        self.saves.borrow_mut().insert(slot.to_string(), text.into());
    }

    #[must_use]
    pub fn raw(&self, slot: &str) -> Option<String> {
        self.saves.borrow().get(slot).cloned()
    }
}

impl SnapshotStorage for MemoryStorage {
    type Error = SnapshotError;

    fn save(&self, slot: &str, snapshot: &Snapshot) -> Result<(), Self::Error> {
        let json = snapshot.to_json()?;
        self.insert_raw(slot, json);
        Ok(())
    }

    fn load(&self, slot: &str) -> Result<Option<Snapshot>, Self::Error> {
        self.raw(slot).map(|text| Snapshot::from_json(&text)).transpose()
    }

    fn delete(&self, slot: &str) -> Result<(), Self::Error> {
        self.saves.borrow_mut().remove(slot);
        Ok(())
    }
}

/// One JSON file per slot under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, slot: &str) -> Result<PathBuf, SnapshotError> {
        let valid = !slot.is_empty()
            && slot
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(SnapshotError::InvalidSlot(slot.to_string()));
        }
        Ok(self.dir.join(format!("{slot}.json")))
    }
}

impl SnapshotStorage for FileStorage {
    type Error = SnapshotError;

    fn save(&self, slot: &str, snapshot: &Snapshot) -> Result<(), Self::Error> {
        let path = self.slot_path(slot)?;
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn load(&self, slot: &str) -> Result<Option<Snapshot>, Self::Error> {
        let path = self.slot_path(slot)?;
        match fs::read_to_string(&path) {
            Ok(text) => Snapshot::from_json(&text).map(Some),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn delete(&self, slot: &str) -> Result<(), Self::Error> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoardTuning, JourneyTuning};
    use crate::constants::DEFAULT_SAVE_SLOT;
    use crate::journey::JourneyAction;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "caregap-snapshot-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn memory_storage_roundtrips_journey() {
        let storage = MemoryStorage::new();
        let mut run = JourneyRun::new(42, JourneyTuning::default());
        run.apply(JourneyAction::Advance);
        storage
            .save(DEFAULT_SAVE_SLOT, &Snapshot::journey(&run))
            .expect("save");
        let loaded = load_journey_or_nothing(&storage, DEFAULT_SAVE_SLOT).expect("load");
        assert_eq!(loaded, run);
        storage.delete(DEFAULT_SAVE_SLOT).expect("delete");
        assert!(load_or_nothing(&storage, DEFAULT_SAVE_SLOT).is_none());
    }

    #[test]
    fn malformed_save_is_nothing_to_load() {
        let storage = MemoryStorage::new();
        storage.insert_raw("broken", "{ not json");
        assert!(matches!(
            storage.load("broken"),
            Err(SnapshotError::Malformed(_))
        ));
        assert!(load_or_nothing(&storage, "broken").is_none());
    }

    fn tampered(snapshot: &Snapshot, edit: impl FnOnce(&mut serde_json::Value)) -> String {
        let mut value = serde_json::to_value(snapshot).expect("to value");
        edit(&mut value["run"]["state"]);
        value.to_string()
    }

    #[test]
    fn board_turn_past_last_player_is_nothing_to_load() {
        let storage = MemoryStorage::new();
        let board = BoardRun::new(3, BoardTuning::default());
        let json = Snapshot::board(&board).to_json().expect("serialize");
        assert!(json.contains("\"current\":0"));
        storage.insert_raw("slot", json.replace("\"current\":0", "\"current\":7"));
        assert!(matches!(
            storage.load("slot"),
            Err(SnapshotError::Inconsistent(_))
        ));
        assert!(load_or_nothing(&storage, "slot").is_none());
    }

    #[test]
    fn board_winner_and_positions_are_checked() {
        let snapshot = Snapshot::board(&BoardRun::new(4, BoardTuning::default()));
        let bad_winner = tampered(&snapshot, |state| state["winner"] = 5.into());
        assert!(matches!(
            Snapshot::from_json(&bad_winner),
            Err(SnapshotError::Inconsistent(_))
        ));
        let past_finish = tampered(&snapshot, |state| {
            state["players"][0]["position"] = 999.into();
        });
        assert!(matches!(
            Snapshot::from_json(&past_finish),
            Err(SnapshotError::Inconsistent(_))
        ));
        let lost_player = tampered(&snapshot, |state| {
            if let Some(players) = state["players"].as_array_mut() {
                players.pop();
            }
        });
        assert!(matches!(
            Snapshot::from_json(&lost_player),
            Err(SnapshotError::Inconsistent(_))
        ));
        let bad_tuning = tampered(&snapshot, |state| {
            state["tuning"]["countdown_secs"] = 0.into();
        });
        assert!(matches!(
            Snapshot::from_json(&bad_tuning),
            Err(SnapshotError::Inconsistent(_))
        ));
    }

    #[test]
    fn dash_lane_out_of_range_is_nothing_to_load() {
        let storage = MemoryStorage::new();
        let json = tampered(&Snapshot::dash(&DashRun::new(8)), |state| {
            state["lane"] = 255.into();
        });
        storage.insert_raw("slot", json);
        assert!(matches!(
            storage.load("slot"),
            Err(SnapshotError::Inconsistent(_))
        ));
        assert!(load_or_nothing(&storage, "slot").is_none());

        let clock = tampered(&Snapshot::dash(&DashRun::new(8)), |state| {
            state["time_left_ms"] = i64::MAX.into();
        });
        assert!(Snapshot::from_json(&clock).is_err());
    }

    #[test]
    fn journey_pending_step_must_be_reached() {
        let mut run = JourneyRun::new(11, JourneyTuning::default());
        run.apply(JourneyAction::Advance);
        let json = tampered(&Snapshot::journey(&run), |state| {
            state["steps_taken"] = 0.into();
        });
        assert!(matches!(
            Snapshot::from_json(&json),
            Err(SnapshotError::Inconsistent(_))
        ));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let storage = MemoryStorage::new();
        storage.insert_raw("old", r#"{ "version": 1, "run": {} }"#);
        assert!(matches!(
            storage.load("old"),
            Err(SnapshotError::UnsupportedVersion {
                found: 1,
                expected: 2
            })
        ));
    }

    #[test]
    fn wrong_variant_is_nothing_to_load() {
        let storage = MemoryStorage::new();
        let board = BoardRun::new(5, BoardTuning::default());
        storage.save("slot", &Snapshot::board(&board)).expect("save");
        assert!(load_journey_or_nothing(&storage, "slot").is_none());
        let snapshot = load_or_nothing(&storage, "slot").expect("snapshot");
        assert_eq!(snapshot.run.variant(), SimVariant::Board);
        assert_eq!(snapshot.run.seed(), 5);
    }

    #[test]
    fn file_storage_roundtrips_and_deletes() {
        let dir = temp_dir("file");
        let storage = FileStorage::new(&dir);
        let dash = DashRun::new(9);
        storage.save("dash_slot", &Snapshot::dash(&dash)).expect("save");
        assert!(dir.join("dash_slot.json").exists());
        let loaded = storage.load("dash_slot").expect("load").expect("present");
        assert_eq!(loaded.into_dash(), Some(dash));
        storage.delete("dash_slot").expect("delete");
        storage.delete("dash_slot").expect("delete twice");
        assert!(storage.load("dash_slot").expect("load").is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_storage_rejects_path_like_slots() {
        let storage = FileStorage::new(temp_dir("slots"));
        assert!(matches!(
            storage.load("../escape"),
            Err(SnapshotError::InvalidSlot(_))
        ));
        assert!(matches!(storage.load(""), Err(SnapshotError::InvalidSlot(_))));
    }
}
