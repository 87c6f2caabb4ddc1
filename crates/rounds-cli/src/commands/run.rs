use std::io::Write;
use std::time::Duration;

use clap::Args;
use rounds_core::format::{format_duration, format_time};
use rounds_core::storage::RoutineStore;
use rounds_core::{Config, CueKind, CuePlayer, Event, Phase, Routine, SessionEngine, TickDriver};
use tokio::sync::mpsc;

#[derive(Args)]
pub struct RunArgs {
    /// Routine id (defaults to the last-used routine)
    routine_id: Option<String>,
    /// Stream raw events as JSON lines
    #[arg(long)]
    json: bool,
    /// Suppress terminal-bell cues
    #[arg(long)]
    no_audio: bool,
}

/// Terminal-bell cue player. Timer correctness never depends on it.
struct TerminalBell;

impl CuePlayer for TerminalBell {
    fn play(&mut self, kind: CueKind) {
        let bell = match kind {
            CueKind::Warning => "\x07",
            CueKind::Complete => "\x07\x07",
        };
        print!("{bell}");
        let _ = std::io::stdout().flush();
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = RoutineStore::open()?;
    let config = Config::load_or_default();

    let id = match args.routine_id {
        Some(id) => id,
        None => store
            .preferences()
            .last_used_routine_id
            .clone()
            .ok_or("no routine id given and no last-used routine")?,
    };
    let routine = store
        .get(&id)
        .cloned()
        .ok_or_else(|| format!("routine not found: {id}"))?;
    store.set_last_used(&id)?;

    let mut engine = SessionEngine::new(routine.clone())?;
    let audio = config.audio.enabled && store.preferences().audio_enabled && !args.no_audio;
    if audio {
        engine = engine.with_cue_player(Box::new(TerminalBell));
    }

    if !args.json {
        println!(
            "{} -- {} exercise(s), {} cycle(s), {} total",
            routine.name,
            routine.exercise_count(),
            routine.total_cycles,
            format_duration(routine.total_duration_secs()),
        );
        if !config.timer.auto_start {
            print!("Press Enter to start...");
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
        }
    }

    let period = Duration::from_millis(config.timer.tick_interval_ms.max(10));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(drive(engine, &routine, period, args.json))
}

async fn drive(
    engine: SessionEngine,
    routine: &Routine,
    period: Duration,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut driver = TickDriver::with_period(engine, period);
    let started = driver.lock().start();
    if let Some(event) = started {
        emit(&event, routine, json);
    }
    driver.start(tx);

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        let done = matches!(event, Event::WorkoutCompleted { .. });
                        emit(&event, routine, json);
                        if done {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                driver.stop();
                let stopped = driver.lock().stop();
                if let Some(event) = stopped {
                    emit(&event, routine, json);
                }
                break;
            }
        }
    }
    Ok(())
}

fn emit(event: &Event, routine: &Routine, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{line}");
        }
        return;
    }

    match event {
        Event::SessionStarted {
            cycle,
            exercise_index,
            duration_secs,
            ..
        } => print_exercise(routine, *cycle, *exercise_index, *duration_secs),
        Event::PhaseStarted {
            phase,
            cycle,
            exercise_index,
            duration_secs,
            ..
        } => match phase {
            Phase::Exercise => print_exercise(routine, *cycle, *exercise_index, *duration_secs),
            Phase::Rest => println!(
                "[cycle {cycle}/{}] rest ({})",
                routine.total_cycles,
                format_time(*duration_secs),
            ),
        },
        Event::Warning { remaining_secs, .. } => {
            println!("  {}s left", remaining_secs.ceil() as u64);
        }
        Event::WorkoutCompleted { .. } => println!("Workout complete!"),
        Event::SessionStopped { .. } => println!("Stopped."),
        _ => {}
    }
}

fn print_exercise(routine: &Routine, cycle: u32, exercise_index: usize, duration_secs: f64) {
    let name = routine
        .exercises
        .get(exercise_index)
        .map(|e| e.name.as_str())
        .unwrap_or("?");
    println!(
        "[cycle {cycle}/{}] {name} ({})",
        routine.total_cycles,
        format_time(duration_secs),
    );
}
