use std::path::PathBuf;
use std::sync::Arc;

use repcoach_core::{
    CoachConfig, ExerciseFlow, ExerciseLibrary, FlowProgress, IdAllocator, Platform, Transport,
};
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;

#[derive(Default)]
pub struct BackgroundTasks {
    pub workout: Option<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn workout_running(&self) -> bool {
        self.workout.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub async fn abort_all(&mut self) {
        if let Some(handle) = self.workout.take() {
            handle.abort();
        }
    }
}

/// Holds all shared state for the CLI application.
/// This is a lightweight container - logic lives in the individual state types.
#[derive(Clone)]
pub struct CliContext {
    pub config: Arc<RwLock<CoachConfig>>,
    pub library: Arc<RwLock<ExerciseLibrary>>,
    /// Where `save` writes the library. None until a library is loaded.
    pub library_path: Arc<RwLock<Option<PathBuf>>>,
    pub transport: Transport,
    pub progress: Arc<watch::Sender<FlowProgress>>,
    pub tasks: Arc<Mutex<BackgroundTasks>>,
    platform: Platform,
    ids: IdAllocator,
}

impl CliContext {
    pub fn new(config: CoachConfig, platform: Platform) -> Self {
        let (progress, _) = watch::channel(FlowProgress::default());
        Self {
            config: Arc::new(RwLock::new(config)),
            library: Arc::new(RwLock::new(ExerciseLibrary::default())),
            library_path: Arc::new(RwLock::new(None)),
            transport: Transport::default(),
            progress: Arc::new(progress),
            tasks: Arc::new(Mutex::new(BackgroundTasks::default())),
            platform,
            ids: IdAllocator::new(),
        }
    }

    /// A flow for one workout, sharing this session's transport and id sequence
    pub async fn flow(&self) -> ExerciseFlow {
        ExerciseFlow::new(
            self.transport.clone(),
            self.platform.clone(),
            self.config.read().await.clone(),
            self.ids.clone(),
        )
    }
}
