//! interactive terminal demo: drives a [`PuzzleTimer`] from a menu of
//! simulated touch events, printing every cue/state/refresh callback.

use clap::Parser;
use colored::Colorize;
use cubetimer_core::clock::{Clock, SystemClock};
use cubetimer_core::solve::PuzzleType;
use cubetimer_core::store::{SolveEvent, SolveStore};
use cubetimer_core::timer::{PendingSolve, PuzzleTimer, TimerConfig};
use cubetimer_core::SolveId;
use dialoguer::Select;
use std::collections::HashMap;

#[derive(Parser)]
#[command(author, version, about = "drive a PuzzleTimer from a terminal menu")]
struct Args {
    #[arg(long, default_value_t = 15_000)]
    inspection_ms: i64,
    #[arg(long)]
    hold_to_start: bool,
}

struct TerminalStore {
    next_id: SolveId,
    rows: HashMap<SolveId, cubetimer_core::solve::Solve>,
}

impl TerminalStore {
    fn new() -> Self {
        Self {
            next_id: 0,
            rows: HashMap::new(),
        }
    }
}

impl SolveStore for TerminalStore {
    fn add(&mut self, solve: cubetimer_core::solve::Solve) -> SolveId {
        self.next_id += 1;
        let id = self.next_id;
        self.rows.insert(id, solve.with_id(id));
        id
    }
    fn update(&mut self, solve: cubetimer_core::solve::Solve) {
        self.rows.insert(solve.id(), solve);
    }
    fn delete(&mut self, id: SolveId) {
        self.rows.remove(&id);
    }
    fn exists(&self, id: SolveId) -> bool {
        self.rows.contains_key(&id)
    }
    fn get(&self, id: SolveId) -> Option<cubetimer_core::solve::Solve> {
        self.rows.get(&id).cloned()
    }
}

fn main() -> anyhow::Result<()> {
    cubetimer_core::init_logging();
    let args = Args::parse();

    let config = TimerConfig {
        inspection_duration_ms: args.inspection_ms,
        hold_to_start_enabled: args.hold_to_start,
        ..TimerConfig::default()
    };
    let mut timer = PuzzleTimer::new(config, SystemClock, TerminalStore::new());
    timer.attach_pending(PendingSolve {
        puzzle_type: PuzzleType::ThreeByThree,
        category: "Normal".into(),
        scramble: "R U R' U' F' U F".into(),
    });
    timer.listeners_mut().on_cue = Some(Box::new(|cue| {
        println!("{} {:?}", "cue".yellow(), cue);
    }));
    timer.listeners_mut().on_state = Some(Box::new(|state| {
        println!("{} {:?}", "stage".cyan(), state.stage());
    }));

    loop {
        let choices = ["touch down", "touch up", "cancel", "quit"];
        let selection = Select::new()
            .with_prompt("cubetimer")
            .items(&choices)
            .default(0)
            .interact()?;
        let now = SystemClock.mono();
        match choices[selection] {
            "touch down" => timer.on_touch_down(now)?,
            "touch up" => timer.on_touch_up(now)?,
            "cancel" => timer.cancel(now),
            "quit" => break,
            _ => unreachable!(),
        }
        timer.poll(now)?;
        if let Some(solve) = timer.state().attached_solve() {
            println!(
                "{} {} ms (penalties: {})",
                "last solve".green(),
                solve.get_time(),
                solve.penalties()
            );
            timer.on_solve_changed(SolveEvent::OneSolveAdded(solve.clone()));
        }
    }
    Ok(())
}
