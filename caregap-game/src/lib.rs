//! Care Gap Simulation Engine
//!
//! Platform-agnostic core logic for the care-access simulations: the
//! two-patient journey, the board race, and the Chemo Dash runner.
//! This crate provides all mechanics without UI or platform-specific dependencies.

pub mod board;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod dash;
pub mod journey;
pub mod modifiers;
pub mod numbers;
pub mod participant;
pub mod progression;
pub mod report;
pub mod result;
pub mod rng;
pub mod seed;
pub mod snapshot;

use std::sync::Arc;

// Re-export commonly used types
pub use board::{BoardAction, BoardRun, BoardView, CardView, PendingCard, PlayerView};
pub use catalog::{BoardCard, Catalog, Category, EventCard, SupportDef, SupportKind};
pub use config::{BoardTuning, ConfigError, JourneyTuning, SimConfig};
pub use constants::DEFAULT_SAVE_SLOT;
pub use dash::{
    BarrierKind, Clearance, DashAction, DashEnding, DashInput, DashOutcome, DashRun, DashStats,
    PickupKind,
};
pub use journey::{
    JourneyAction, JourneyRun, JourneyView, PatientId, PatientView, PendingEffect, PendingStep,
};
pub use modifiers::{
    AdjustedEvent, Mitigation, MitigationSet, PersonalSupport, PersonalSupports, PolicyLever,
    PolicyLevers, SeverityBounds,
};
pub use participant::{CategoryTotals, LogEntry, LogKind, Participant, RecentLog};
pub use progression::{Ignored, LoopPhase, Outcome};
pub use result::{BoardSummary, JourneySummary, ParticipantTotals, Standing, equity_gap};
pub use rng::{RandomSource, RngBundle, StreamCursor};
pub use seed::{
    SimVariant, decode_to_seed, encode_friendly, generate_code_from_entropy, parse_seed_param,
    share_query,
};
pub use snapshot::{
    FileStorage, MemoryStorage, RunSnapshot, Snapshot, SnapshotError, SnapshotStorage,
    load_or_nothing,
};

/// Source of the catalog and tuning a [`SimEngine`] builds runs from.
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the content tables (steps, decks, supports).
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;

    /// Load the tuning document.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or is out of range.
    fn load_config(&self) -> Result<SimConfig, Self::Error>;
}

/// Loader backed by the tables compiled into this crate, with an optional
/// JSON tuning override.
#[derive(Debug, Clone, Default)]
pub struct StaticDataLoader {
    config_json: Option<String>,
}

impl StaticDataLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config_json(json: impl Into<String>) -> Self {
        Self {
            config_json: Some(json.into()),
        }
    }
}

impl DataLoader for StaticDataLoader {
    type Error = ConfigError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Ok(Catalog::load_from_static())
    }

    fn load_config(&self) -> Result<SimConfig, Self::Error> {
        self.config_json
            .as_deref()
            .map_or_else(|| Ok(SimConfig::default()), SimConfig::from_json)
    }
}

/// Main engine for creating, saving, and restoring runs
pub struct SimEngine<L, S>
where
    L: DataLoader,
    S: SnapshotStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> SimEngine<L, S>
where
    L: DataLoader,
    S: SnapshotStorage,
{
    /// Create a new engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Start a two-patient journey.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or configuration cannot be loaded.
    pub fn create_journey(&self, seed: u64) -> Result<JourneyRun, L::Error> {
        let config = self.data_loader.load_config()?;
        let catalog = Arc::new(self.data_loader.load_catalog()?);
        Ok(JourneyRun::with_catalog(seed, config.journey, catalog))
    }

    /// Start a board race.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or configuration cannot be loaded.
    pub fn create_board(&self, seed: u64) -> Result<BoardRun, L::Error> {
        let config = self.data_loader.load_config()?;
        let catalog = Arc::new(self.data_loader.load_catalog()?);
        Ok(BoardRun::with_catalog(seed, config.board, catalog))
    }

    /// Start a Chemo Dash run.
    #[must_use]
    pub fn create_dash(&self, seed: u64) -> DashRun {
        DashRun::new(seed)
    }

    /// Save a snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub fn save(&self, slot: &str, snapshot: &Snapshot) -> Result<(), S::Error> {
        self.storage.save(slot, snapshot)
    }

    /// Load a snapshot and reattach fresh content tables
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded or rehydrated.
    pub fn load(&self, slot: &str) -> Result<Option<Snapshot>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        if let Some(mut snapshot) = self.storage.load(slot).map_err(Into::into)? {
            // Rehydrate with fresh data
            let catalog = Arc::new(self.data_loader.load_catalog().map_err(Into::into)?);
            snapshot.run.rehydrate(&catalog);
            Ok(Some(snapshot))
        } else {
            Ok(None)
        }
    }

    /// Load a snapshot, reporting corrupt or missing saves as nothing to load.
    pub fn load_or_nothing(&self, slot: &str) -> Option<Snapshot> {
        let mut snapshot = snapshot::load_or_nothing(&self.storage, slot)?;
        match self.data_loader.load_catalog() {
            Ok(catalog) => snapshot.run.rehydrate(&Arc::new(catalog)),
            Err(err) => log::warn!("keeping bundled catalog for slot {slot}: {err}"),
        }
        Some(snapshot)
    }

    /// Delete a saved snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete(&self, slot: &str) -> Result<(), S::Error> {
        self.storage.delete(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_catalog(&self) -> Result<Catalog, Self::Error> {
            Ok(Catalog::empty())
        }

        fn load_config(&self) -> Result<SimConfig, Self::Error> {
            Ok(SimConfig::default())
        }
    }

    #[test]
    fn engine_creates_and_roundtrips_runs() {
        let engine = SimEngine::new(FixtureLoader, MemoryStorage::default());
        let mut run = engine.create_journey(0xABCD).unwrap();
        run.apply(JourneyAction::SetLever {
            lever: PolicyLever::Transit,
            enabled: true,
        });
        run.apply(JourneyAction::Advance);
        engine.save(DEFAULT_SAVE_SLOT, &Snapshot::journey(&run)).unwrap();

        let loaded = engine
            .load(DEFAULT_SAVE_SLOT)
            .unwrap()
            .expect("save exists")
            .into_journey()
            .expect("journey");
        assert!(loaded.levers().transit);
        assert_eq!(loaded.catalog(), &Catalog::empty());
        assert_eq!(loaded.step_index(), Some(0));
        assert!(engine.load("missing-slot").unwrap().is_none());
    }

    #[test]
    fn empty_catalog_journey_finishes_after_one_step() {
        let engine = SimEngine::new(FixtureLoader, MemoryStorage::default());
        let mut run = engine.create_journey(3).unwrap().with_auto_resolve(false);
        assert_eq!(run.apply(JourneyAction::Advance), Outcome::Advanced);
        assert_eq!(run.pending().map(|p| p.step_name.as_str()), Some("Diagnosis"));
        assert_eq!(run.apply(JourneyAction::Resolve), Outcome::Finished);
    }

    #[test]
    fn corrupt_slot_loads_as_nothing() {
        let storage = MemoryStorage::default();
        storage.insert_raw(DEFAULT_SAVE_SLOT, "][");
        let engine = SimEngine::new(StaticDataLoader::new(), storage);
        assert!(engine.load_or_nothing(DEFAULT_SAVE_SLOT).is_none());
        assert!(engine.load(DEFAULT_SAVE_SLOT).is_err());
    }

    #[test]
    fn static_loader_applies_config_override() {
        let loader =
            StaticDataLoader::with_config_json(r#"{ "board": { "players": 3, "spaces": 20 } }"#);
        let engine = SimEngine::new(loader, MemoryStorage::default());
        let board = engine.create_board(1).unwrap();
        assert_eq!(board.players().len(), 3);
        assert_eq!(board.tuning().finish_space(), 19);

        let bad = SimEngine::new(
            StaticDataLoader::with_config_json(r#"{ "journey": { "countdown_secs": 0 } }"#),
            MemoryStorage::default(),
        );
        assert!(matches!(
            bad.create_journey(1),
            Err(ConfigError::RangeViolation { .. })
        ));
    }
}
