use clap::Subcommand;
use rounds_core::format::format_duration;
use rounds_core::storage::{ExerciseDraft, RoutineDraft, RoutineStore};
use rounds_core::Routine;

#[derive(Subcommand)]
pub enum RoutineAction {
    /// List saved routines with computed durations
    List,
    /// Print one routine as JSON
    Show {
        /// Routine id
        id: String,
    },
    /// Create a routine
    Create {
        /// Routine name
        name: String,
        /// Exercise as NAME:SECONDS (repeatable, in order)
        #[arg(long = "exercise", short = 'e', required = true)]
        exercises: Vec<String>,
        /// Rest between exercises in seconds
        #[arg(long, default_value = "10")]
        rest: u32,
        /// Number of repeat cycles
        #[arg(long, default_value = "1")]
        cycles: u32,
    },
    /// Replace a routine's definition, keeping its id
    Update {
        /// Routine id
        id: String,
        /// New routine name
        name: String,
        /// Exercise as NAME:SECONDS (repeatable, in order)
        #[arg(long = "exercise", short = 'e', required = true)]
        exercises: Vec<String>,
        /// Rest between exercises in seconds
        #[arg(long, default_value = "10")]
        rest: u32,
        /// Number of repeat cycles
        #[arg(long, default_value = "1")]
        cycles: u32,
    },
    /// Delete a routine
    Delete {
        /// Routine id
        id: String,
    },
    /// Copy a routine under a new id
    Duplicate {
        /// Routine id
        id: String,
    },
}

/// Summary row for `routine list`: identity plus durations recomputed from
/// the stored definition.
fn summary(routine: &Routine) -> serde_json::Value {
    serde_json::json!({
        "id": routine.id,
        "name": routine.name,
        "exercise_count": routine.exercise_count(),
        "total_cycles": routine.total_cycles,
        "cycle_duration": format_duration(routine.cycle_duration_secs()),
        "total_duration": format_duration(routine.total_duration_secs()),
    })
}

fn parse_exercise_spec(spec: &str) -> Result<ExerciseDraft, String> {
    let (name, duration) = spec
        .rsplit_once(':')
        .ok_or_else(|| format!("invalid exercise '{spec}', expected NAME:SECONDS"))?;
    let duration_seconds = duration
        .parse::<u32>()
        .map_err(|_| format!("invalid duration in '{spec}', expected whole seconds"))?;
    if name.trim().is_empty() {
        return Err(format!("invalid exercise '{spec}', name is empty"));
    }
    Ok(ExerciseDraft {
        name: name.trim().to_string(),
        duration_seconds,
    })
}

pub fn run(action: RoutineAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = RoutineStore::open()?;

    match action {
        RoutineAction::List => {
            let rows: Vec<_> = store.list().iter().map(summary).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        RoutineAction::Show { id } => {
            let routine = store
                .get(&id)
                .ok_or_else(|| format!("routine not found: {id}"))?;
            println!("{}", serde_json::to_string_pretty(routine)?);
        }
        RoutineAction::Create {
            name,
            exercises,
            rest,
            cycles,
        } => {
            let exercises = exercises
                .iter()
                .map(|s| parse_exercise_spec(s))
                .collect::<Result<Vec<_>, _>>()?;
            let routine = store.create(RoutineDraft {
                name,
                exercises,
                rest_seconds: rest,
                total_cycles: cycles,
            })?;
            println!("{}", serde_json::to_string_pretty(&summary(&routine))?);
        }
        RoutineAction::Update {
            id,
            name,
            exercises,
            rest,
            cycles,
        } => {
            let exercises = exercises
                .iter()
                .map(|s| parse_exercise_spec(s))
                .collect::<Result<Vec<_>, _>>()?;
            let routine = store.update(
                &id,
                RoutineDraft {
                    name,
                    exercises,
                    rest_seconds: rest,
                    total_cycles: cycles,
                },
            )?;
            println!("{}", serde_json::to_string_pretty(&summary(&routine))?);
        }
        RoutineAction::Delete { id } => {
            store.delete(&id)?;
            println!("{{\"deleted\": \"{id}\"}}");
        }
        RoutineAction::Duplicate { id } => {
            let copy = store.duplicate(&id)?;
            println!("{}", serde_json::to_string_pretty(&summary(&copy))?);
        }
    }

    Ok(())
}
