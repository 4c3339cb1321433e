use caregap_game::{DashAction, DashEnding, DashOutcome, DashRun, Ignored};

const TICK_LIMIT: u32 = 1_200;

fn drive(run: &mut DashRun, piloted: bool, ticks: u32) {
    for _ in 0..ticks {
        if run.is_finished() {
            return;
        }
        if piloted && let Some(input) = run.pilot_input() {
            run.apply(DashAction::Input(input));
        }
        run.apply(DashAction::Tick);
    }
}

fn finish(seed: u64, piloted: bool) -> DashRun {
    let mut run = DashRun::new(seed);
    drive(&mut run, piloted, TICK_LIMIT + 1);
    run
}

#[test]
fn runs_end_before_the_clock_runs_out() {
    for seed in [1_u64, 42, 777] {
        for piloted in [false, true] {
            let run = finish(seed, piloted);
            assert!(run.is_finished(), "seed {seed} piloted {piloted}");
            assert!(run.stats().ticks <= TICK_LIMIT);
            assert!(run.time_left_ms() <= 0);
        }
    }
}

#[test]
fn same_seed_same_run() {
    assert_eq!(finish(42, true), finish(42, true));
    assert_eq!(finish(42, false), finish(42, false));
}

#[test]
fn piloting_beats_idling() {
    let mut piloted_hits = 0;
    let mut idle_hits = 0;
    for seed in 0..6 {
        piloted_hits += finish(seed, true).stats().hits;
        idle_hits += finish(seed, false).stats().hits;
    }
    assert!(piloted_hits <= idle_hits);
}

#[test]
fn ending_follows_score() {
    for seed in 0..4 {
        let run = finish(seed, true);
        let expected = if run.score() >= 220 {
            DashEnding::MadeIt
        } else {
            DashEnding::Missed
        };
        assert_eq!(run.ending(), Some(expected));
    }
}

#[test]
fn snapshot_mid_run_resumes_exactly() {
    let mut straight = DashRun::new(99);
    drive(&mut straight, true, 300);
    let json = serde_json::to_string(&straight).expect("serialize");
    let mut resumed: DashRun = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(resumed, straight);

    drive(&mut straight, true, TICK_LIMIT);
    drive(&mut resumed, true, TICK_LIMIT);
    assert_eq!(resumed, straight);
}

#[test]
fn pause_freezes_the_run() {
    let mut run = DashRun::new(5);
    drive(&mut run, false, 40);
    assert_eq!(run.apply(DashAction::SetPaused(true)), DashOutcome::Updated);
    let frozen = run.clone();
    for _ in 0..50 {
        assert_eq!(
            run.apply(DashAction::Tick),
            DashOutcome::Ignored(Ignored::Paused)
        );
    }
    assert_eq!(run, frozen);
    assert_eq!(run.apply(DashAction::SetPaused(false)), DashOutcome::Updated);
    assert_eq!(run.apply(DashAction::Tick), DashOutcome::Ticked);
}

#[test]
fn finished_run_ignores_everything() {
    let mut run = finish(8, false);
    let done = run.clone();
    assert_eq!(
        run.apply(DashAction::Tick),
        DashOutcome::Ignored(Ignored::Terminal)
    );
    assert_eq!(run, done);
}
