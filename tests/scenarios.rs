//! concrete end-to-end scenarios exercising `PuzzleTimer` + `Penalties` +
//! `Solve` + `AverageCalculator` together across their module boundaries.

use cubetimer_core::clock::FakeClock;
use cubetimer_core::penalties::{Penalty, NO_PENALTIES};
use cubetimer_core::solve::{PuzzleType, Solve};
use cubetimer_core::stats::AverageCalculator;
use cubetimer_core::store::SolveStore;
use cubetimer_core::timer::{PendingSolve, PuzzleTimer, TimerConfig, TimerCue, TimerStage};
use cubetimer_core::{SolveId, TIME_DNF};
use std::collections::HashMap;

#[derive(Default)]
struct VecStore {
    next_id: SolveId,
    rows: HashMap<SolveId, Solve>,
}

impl SolveStore for VecStore {
    fn add(&mut self, solve: Solve) -> SolveId {
        self.next_id += 1;
        let id = self.next_id;
        self.rows.insert(id, solve.with_id(id));
        id
    }
    fn update(&mut self, solve: Solve) {
        self.rows.insert(solve.id(), solve);
    }
    fn delete(&mut self, id: SolveId) {
        self.rows.remove(&id);
    }
    fn exists(&self, id: SolveId) -> bool {
        self.rows.contains_key(&id)
    }
    fn get(&self, id: SolveId) -> Option<Solve> {
        self.rows.get(&id).cloned()
    }
}

fn armed(inspection_ms: i64) -> PuzzleTimer<FakeClock, VecStore> {
    let config = TimerConfig {
        inspection_duration_ms: inspection_ms,
        ..TimerConfig::default()
    };
    let mut timer = PuzzleTimer::new(config, FakeClock::new(0, 1_700_000_000_000), VecStore::default());
    timer.attach_pending(PendingSolve {
        puzzle_type: PuzzleType::ThreeByThree,
        category: "Normal".into(),
        scramble: "R U R' U'".into(),
    });
    timer
}

#[test]
fn scenario_1_standard_3x3_solve() {
    let mut timer = armed(15_000);

    timer.on_touch_down(100_000).unwrap();
    timer.on_touch_up(100_050).unwrap(); // InspectionReadyToStart -> InspectionStarted
    timer.on_touch_down(108_000).unwrap();
    timer.on_touch_up(108_050).unwrap(); // InspectionSolveReadyToStart -> SolveStarted
    timer.on_touch_down(120_350).unwrap(); // SolveStarted -> Stopping -> Stopped

    let solve = timer.state().attached_solve().expect("solve committed");
    assert_eq!(solve.exact_time_ms(), 12_300);
    assert_eq!(solve.penalties(), NO_PENALTIES);
    assert_eq!(solve.get_time(), 12_300);
    assert_eq!(timer.state().stage(), TimerStage::Stopped);
}

#[test]
fn scenario_2_inspection_overrun_plus_two() {
    let mut timer = armed(15_000);
    timer.on_touch_down(0).unwrap();
    timer.on_touch_up(0).unwrap();

    timer.poll(15_500).unwrap();

    assert_eq!(timer.state().in_progress_penalties().pre_plus_twos(), 1);
    assert!(timer.state().cues().has_fired(TimerCue::InspectionOverrun));
}

#[test]
fn scenario_3_inspection_dnf() {
    let mut timer = armed(15_000);
    timer.on_touch_down(0).unwrap();
    timer.on_touch_up(0).unwrap();

    timer.poll(17_001).unwrap();

    assert!(timer.state().cues().has_fired(TimerCue::InspectionTimeOut));
    assert_eq!(timer.state().stage(), TimerStage::Stopped);
    let solve = timer.state().attached_solve().expect("dnf solve committed");
    assert!(solve.penalties().pre_dnf());
    assert!(!solve.penalties().has_post_penalties());
}

#[test]
fn scenario_4_post_stop_plus_two_then_annul() {
    let mut timer = armed(15_000);
    timer.on_touch_down(100_000).unwrap();
    timer.on_touch_up(100_050).unwrap();
    timer.on_touch_down(108_000).unwrap();
    timer.on_touch_up(108_050).unwrap();
    timer.on_touch_down(120_350).unwrap();

    let solve = timer.state().attached_solve().unwrap().clone();
    assert_eq!(solve.get_time(), 12_300);

    let bumped = solve.with_penalties_adjusting_time(NO_PENALTIES.incur_post_start(Penalty::PlusTwo));
    assert_eq!(bumped.get_time(), 14_300);

    let annulled = bumped.with_penalties_adjusting_time(
        bumped.penalties().annul_post_start(Penalty::PlusTwo),
    );
    assert_eq!(annulled.get_time(), 12_300);
}

#[test]
fn scenario_5_cancel_during_solve() {
    let mut timer = armed(15_000);
    timer.on_touch_down(100_000).unwrap();
    timer.on_touch_up(100_050).unwrap();
    timer.on_touch_down(108_000).unwrap();
    timer.on_touch_up(108_050).unwrap();
    assert_eq!(timer.state().stage(), TimerStage::SolveStarted);

    timer.cancel(110_000);

    assert_eq!(timer.state().stage(), TimerStage::Unused);
    assert!(timer.state().attached_solve().is_none());
    assert!(timer.store().get(1).is_none());
}

#[test]
fn scenario_6_ao5_with_one_dnf_disqualify_false() {
    let mut calc = AverageCalculator::new(5, false).unwrap();
    for t in [500, 250, 150, 400, 200] {
        calc.add_time(t).unwrap();
    }
    assert_eq!(calc.current().average, 280);

    calc.add_time(TIME_DNF).unwrap();
    calc.add_time(800).unwrap();

    let view = calc.current();
    assert_eq!(view.window, vec![150, 400, 200, TIME_DNF, 800]);
    assert_eq!(view.average, 460);
}
