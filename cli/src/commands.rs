use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use repcoach_core::{
    CoachConfig, CoachConfigExt, ExerciseLibrary, FlowOutcome, TransportState,
    pause_duration_options,
};

use crate::context::CliContext;

/// How long `reset` waits for a workout to wind down
const RESET_GRACE: Duration = Duration::from_secs(2);

pub async fn load_library(path: &Path, ctx: &CliContext) -> Result<(), String> {
    let library = ExerciseLibrary::load(path).map_err(|e| error_chain(&e))?;

    println!(
        "loaded {} exercises in {} groups from {}",
        library.exercise_count(),
        library.groups.len(),
        path.display()
    );
    *ctx.library.write().await = library;
    *ctx.library_path.write().await = Some(path.to_path_buf());
    Ok(())
}

pub async fn list(ctx: &CliContext) -> Result<(), String> {
    let library = ctx.library.read().await;
    if library.is_empty() {
        println!("No exercises loaded");
        return Ok(());
    }

    println!("{:<6} {:<30} {:>6} {:>10}", "Id", "Exercise", "Sets", "Done");
    println!("{}", "-".repeat(56));
    for exercise in &library.exercises {
        print_exercise_row(exercise);
    }
    for group in &library.groups {
        println!("group {} - {} ({} exercises)", group.id, group.name, group.exercises.len());
        for exercise in &group.exercises {
            print_exercise_row(exercise);
        }
    }
    Ok(())
}

fn print_exercise_row(exercise: &repcoach_core::Exercise) {
    let marker = if exercise.selected_for_player { "*" } else { " " };
    println!(
        "{:<6} {:<30} {:>6} {:>10}",
        format!("{}{}", exercise.id, marker),
        exercise.exercise_name,
        exercise.sets,
        format!("{}/{}", exercise.completed_sets, exercise.sets)
    );
}

pub async fn start_exercise(id: u32, ctx: &CliContext) -> Result<(), String> {
    let mut exercise = ctx
        .library
        .read()
        .await
        .find_exercise(id)
        .cloned()
        .ok_or_else(|| format!("error: no exercise with id {id}"))?;

    let mut tasks = ctx.tasks.lock().await;
    if tasks.workout_running() {
        return Err("error: a workout is already running, reset it first".to_string());
    }

    let flow = ctx.flow().await;
    ctx.transport.set(TransportState::Running);
    println!("starting {}", exercise.exercise_name);

    let ctx = ctx.clone();
    tasks.workout = Some(tokio::spawn(async move {
        let outcome = flow.run(&mut exercise, &ctx.progress).await;
        if let Some(stored) = ctx.library.write().await.find_exercise_mut(exercise.id) {
            stored.completed_sets = exercise.completed_sets;
        }
        finish(&ctx, outcome, &exercise.exercise_name);
    }));
    Ok(())
}

pub async fn start_group(id: u32, ctx: &CliContext) -> Result<(), String> {
    let mut group = ctx
        .library
        .read()
        .await
        .find_group(id)
        .cloned()
        .ok_or_else(|| format!("error: no group with id {id}"))?;

    let mut tasks = ctx.tasks.lock().await;
    if tasks.workout_running() {
        return Err("error: a workout is already running, reset it first".to_string());
    }

    let flow = ctx.flow().await;
    ctx.transport.set(TransportState::Running);
    println!("starting group {}", group.name);

    let ctx = ctx.clone();
    tasks.workout = Some(tokio::spawn(async move {
        let outcome = flow.run_group(&mut group, &ctx.progress).await;
        if let Some(stored) = ctx.library.write().await.find_group_mut(group.id) {
            for (stored, ran) in stored.exercises.iter_mut().zip(&group.exercises) {
                stored.completed_sets = ran.completed_sets;
            }
        }
        finish(&ctx, outcome, &group.name);
    }));
    Ok(())
}

fn finish(ctx: &CliContext, outcome: FlowOutcome, name: &str) {
    match outcome {
        FlowOutcome::Completed => {
            ctx.transport.set(TransportState::Idle);
            println!("\n{name} complete");
        }
        FlowOutcome::Cancelled => println!("\n{name} stopped"),
    }
}

pub async fn pause(ctx: &CliContext) -> Result<(), String> {
    match ctx.transport.get() {
        TransportState::Running => {
            ctx.transport.set(TransportState::Paused);
            println!("paused");
            Ok(())
        }
        state => Err(format!("error: nothing to pause ({state})")),
    }
}

pub async fn resume(ctx: &CliContext) -> Result<(), String> {
    match ctx.transport.get() {
        TransportState::Paused => {
            ctx.transport.set(TransportState::Running);
            println!("resumed");
            Ok(())
        }
        state => Err(format!("error: nothing to resume ({state})")),
    }
}

/// Reset the transport, let the workout wind down, then return to idle
pub async fn reset(ctx: &CliContext) -> Result<(), String> {
    ctx.transport.set(TransportState::Reset);

    let handle = ctx.tasks.lock().await.workout.take();
    if let Some(mut handle) = handle
        && tokio::time::timeout(RESET_GRACE, &mut handle).await.is_err()
    {
        tracing::warn!("workout did not stop after reset, aborting it");
        handle.abort();
    }

    ctx.transport.set(TransportState::Idle);
    ctx.progress.send_replace(Default::default());
    println!("reset");
    Ok(())
}

pub async fn status(ctx: &CliContext) -> Result<(), String> {
    let progress = ctx.progress.borrow().clone();
    println!("transport: {}", ctx.transport.get());
    println!("{progress}");
    Ok(())
}

pub fn pause_options() -> Result<(), String> {
    let labels: Vec<String> = pause_duration_options()
        .into_iter()
        .map(|o| format!("{:>5}", o.label))
        .collect();
    for row in labels.chunks(12) {
        println!("{}", row.join(" "));
    }
    Ok(())
}

pub async fn show_config(ctx: &CliContext) -> Result<(), String> {
    if let Ok(path) = CoachConfig::config_path() {
        println!("# {}", path.display());
    }
    let config = ctx.config.read().await;
    let text = toml::to_string_pretty(&*config).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

/// Write the library back to where it was loaded from (or `path`), and the config
pub async fn save(path: Option<PathBuf>, ctx: &CliContext) -> Result<(), String> {
    let target = match path {
        Some(path) => Some(path),
        None => ctx.library_path.read().await.clone(),
    };

    if let Some(target) = target {
        ctx.library
            .read()
            .await
            .save(&target)
            .map_err(|e| error_chain(&e))?;
        println!("library saved to {}", target.display());
        *ctx.library_path.write().await = Some(target);
    }

    ctx.config.read().await.save().map_err(|e| error_chain(&e))?;
    println!("config saved");
    Ok(())
}

pub async fn exit(ctx: &CliContext) {
    ctx.transport.set(TransportState::Reset);
    ctx.tasks.lock().await.abort_all().await;
    let _ = write!(std::io::stdout(), "quitting...");
    let _ = std::io::stdout().flush();
}

/// Render an error with its sources, one per line
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = format!("error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use repcoach_core::Platform;
    use tempfile::TempDir;

    const LIBRARY: &str = r#"
[[exercise]]
id = 1
exercise_name = "Plank"
repetitions_per_set = 3
repetition_duration_ms = 60000
sets = 2
"#;

    async fn loaded() -> (TempDir, CliContext) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.toml");
        std::fs::write(&path, LIBRARY).unwrap();

        let ctx = CliContext::new(CoachConfig::default(), Platform::headless());
        load_library(&path, &ctx).await.unwrap();
        (dir, ctx)
    }

    #[tokio::test]
    async fn unknown_exercise_is_an_error() {
        let (_dir, ctx) = loaded().await;
        let err = start_exercise(99, &ctx).await.unwrap_err();
        assert!(err.contains("99"));
        assert_eq!(ctx.transport.get(), TransportState::Idle);
    }

    #[tokio::test]
    async fn pause_and_resume_need_a_matching_state() {
        let (_dir, ctx) = loaded().await;
        assert!(pause(&ctx).await.is_err());
        assert!(resume(&ctx).await.is_err());
    }

    #[tokio::test]
    async fn start_pause_resume_reset() {
        let (_dir, ctx) = loaded().await;

        start_exercise(1, &ctx).await.unwrap();
        assert_eq!(ctx.transport.get(), TransportState::Running);
        assert!(start_exercise(1, &ctx).await.is_err(), "one workout at a time");

        pause(&ctx).await.unwrap();
        assert_eq!(ctx.transport.get(), TransportState::Paused);
        resume(&ctx).await.unwrap();
        assert_eq!(ctx.transport.get(), TransportState::Running);

        reset(&ctx).await.unwrap();
        assert_eq!(ctx.transport.get(), TransportState::Idle);
        assert!(!ctx.tasks.lock().await.workout_running());
        assert_eq!(ctx.progress.borrow().exercise_id, None);
    }

    #[tokio::test]
    async fn save_writes_the_library_back() {
        let (dir, ctx) = loaded().await;
        let copy = dir.path().join("copy.toml");

        ctx.library.read().await.save(&copy).unwrap();
        let reloaded = ExerciseLibrary::load(&copy).unwrap();
        assert_eq!(reloaded, *ctx.library.read().await);
    }
}
