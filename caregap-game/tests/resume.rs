use caregap_game::{
    BoardAction, BoardRun, BoardTuning, DashAction, DashRun, FileStorage, JourneyAction,
    JourneyRun, JourneyTuning, LoopPhase, MemoryStorage, Outcome, SimEngine, SimVariant,
    Snapshot, SnapshotError, SnapshotStorage, StaticDataLoader, DEFAULT_SAVE_SLOT,
};

fn reload(snapshot: &Snapshot) -> Snapshot {
    let json = snapshot.to_json().expect("serialize");
    Snapshot::from_json(&json).expect("parse")
}

#[test]
fn journey_resumes_mid_countdown() {
    let mut run = JourneyRun::new(42, JourneyTuning::default());
    run.apply(JourneyAction::Advance);
    run.apply(JourneyAction::Tick);
    run.apply(JourneyAction::Tick);
    assert_eq!(run.phase(), LoopPhase::PendingResolution);

    let mut resumed = reload(&Snapshot::journey(&run))
        .into_journey()
        .expect("journey");
    assert_eq!(resumed, run);
    assert_eq!(resumed.time_remaining(), run.time_remaining());
    assert_eq!(resumed.pending(), run.pending());

    while !run.is_terminal() {
        let action = if run.phase() == LoopPhase::PendingResolution {
            JourneyAction::Tick
        } else {
            JourneyAction::Advance
        };
        assert_eq!(run.apply(action), resumed.apply(action));
    }
    assert_eq!(run.summary(), resumed.summary());
}

#[test]
fn board_resumes_with_identical_rolls() {
    let mut run = BoardRun::new(7, BoardTuning::default()).with_auto_resolve(false);
    for _ in 0..9 {
        let action = if run.phase() == LoopPhase::PendingResolution {
            BoardAction::Resolve
        } else {
            BoardAction::Roll
        };
        run.apply(action);
    }
    let mut resumed = reload(&Snapshot::board(&run)).into_board().expect("board");
    assert_eq!(resumed, run);
    for _ in 0..40 {
        let action = if run.phase() == LoopPhase::PendingResolution {
            BoardAction::Resolve
        } else {
            BoardAction::Roll
        };
        assert_eq!(run.apply(action), resumed.apply(action));
        assert_eq!(run.last_roll(), resumed.last_roll());
    }
}

#[test]
fn snapshot_variant_is_checked_on_unwrap() {
    let snapshot = reload(&Snapshot::dash(&DashRun::new(3)));
    assert_eq!(snapshot.run.variant(), SimVariant::Dash);
    assert_eq!(snapshot.run.seed(), 3);
    assert!(snapshot.clone().into_journey().is_none());
    assert!(snapshot.into_dash().is_some());
}

#[test]
fn future_versions_are_rejected() {
    let json = Snapshot::journey(&JourneyRun::new(1, JourneyTuning::default()))
        .to_json()
        .expect("serialize")
        .replacen("\"version\":2", "\"version\":99", 1);
    assert!(matches!(
        Snapshot::from_json(&json),
        Err(SnapshotError::UnsupportedVersion { found: 99, .. })
    ));
}

#[test]
fn engine_saves_to_disk_and_resumes() {
    let dir = std::env::temp_dir().join(format!("caregap-resume-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let engine = SimEngine::new(StaticDataLoader::new(), FileStorage::new(&dir));

    let mut dash = engine.create_dash(12);
    for _ in 0..100 {
        dash.apply(DashAction::Tick);
    }
    engine
        .save(DEFAULT_SAVE_SLOT, &Snapshot::dash(&dash))
        .expect("save");
    let loaded = engine
        .load(DEFAULT_SAVE_SLOT)
        .expect("load")
        .and_then(Snapshot::into_dash)
        .expect("dash snapshot");
    assert_eq!(loaded, dash);

    engine.delete(DEFAULT_SAVE_SLOT).expect("delete");
    assert!(engine.load_or_nothing(DEFAULT_SAVE_SLOT).is_none());
    assert!(matches!(
        engine.storage().save("../escape", &Snapshot::dash(&dash)),
        Err(SnapshotError::InvalidSlot(_))
    ));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn loaded_journey_reattaches_catalog() {
    let engine = SimEngine::new(StaticDataLoader::new(), MemoryStorage::new());
    let mut run = engine.create_journey(21).expect("create");
    assert_eq!(run.apply(JourneyAction::Advance), Outcome::Advanced);
    engine
        .save("slot-a", &Snapshot::journey(&run))
        .expect("save");
    let loaded = engine
        .load_or_nothing("slot-a")
        .and_then(Snapshot::into_journey)
        .expect("journey");
    assert_eq!(loaded.catalog().steps.len(), 9);
    assert_eq!(loaded.view().current_step, run.view().current_step);
}
