mod config;
mod error;
mod library;

pub use config::CoachConfigExt;
pub use error::{ConfigError, LibraryError};
pub use library::ExerciseLibrary;
