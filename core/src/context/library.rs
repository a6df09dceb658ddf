//! Exercise library stored as TOML

use std::path::Path;

use serde::{Deserialize, Serialize};

use repcoach_types::{Exercise, Group};

use super::LibraryError;

/// Every exercise and group the user has defined
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLibrary {
    #[serde(default, rename = "group", skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
    /// Exercises that belong to no group
    #[serde(default, rename = "exercise", skip_serializing_if = "Vec::is_empty")]
    pub exercises: Vec<Exercise>,
}

impl ExerciseLibrary {
    /// Load a library from a TOML file. A missing file is an empty library.
    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| LibraryError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| LibraryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| LibraryError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(LibraryError::Serialize)?;
        std::fs::write(path, content).map_err(|source| LibraryError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find an exercise by id, standalone ones first, then inside groups
    pub fn find_exercise(&self, id: u32) -> Option<&Exercise> {
        self.exercises
            .iter()
            .chain(self.groups.iter().flat_map(|g| g.exercises.iter()))
            .find(|e| e.id == id)
    }

    pub fn find_exercise_mut(&mut self, id: u32) -> Option<&mut Exercise> {
        self.exercises
            .iter_mut()
            .chain(self.groups.iter_mut().flat_map(|g| g.exercises.iter_mut()))
            .find(|e| e.id == id)
    }

    pub fn find_group(&self, id: u32) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn find_group_mut(&mut self, id: u32) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    /// Number of exercises including those inside groups
    pub fn exercise_count(&self) -> usize {
        self.exercises.len() + self.groups.iter().map(|g| g.exercises.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.exercise_count() == 0
    }
}
