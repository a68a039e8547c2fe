//! Persistence of per-iteration diffs.
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use log::{debug, trace};

use crate::{
    diff::DiffDatabase,
    utils::error::{FactError, FactResult},
};

/// Receives the diff of every iteration of a session.
pub trait DiffSink {
    /// Discard everything persisted by a previous session.
    fn reset(&mut self) -> FactResult<()>;

    /// Persist the diff of `iteration`. Relations without changes are skipped.
    fn persist(&mut self, iteration: usize, diff: &DiffDatabase) -> FactResult<()>;
}

fn persistence_error(path: &Path) -> impl FnOnce(std::io::Error) -> FactError + '_ {
    move |source| FactError::Persistence {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes `<root>/<iteration>/<Relation>.facts`, one file per changed
/// relation.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn iteration_dir(&self, iteration: usize) -> PathBuf {
        self.root.join(iteration.to_string())
    }
}

impl DiffSink for DirectorySink {
    fn reset(&mut self) -> FactResult<()> {
        if self.root.exists() {
            debug!("Removing previous output under '{}'", self.root.display());
            std::fs::remove_dir_all(&self.root).map_err(persistence_error(&self.root))?;
        }
        std::fs::create_dir_all(&self.root).map_err(persistence_error(&self.root))
    }

    fn persist(&mut self, iteration: usize, diff: &DiffDatabase) -> FactResult<()> {
        let dir = self.iteration_dir(iteration);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(persistence_error(&dir))?;
        }
        std::fs::create_dir_all(&dir).map_err(persistence_error(&dir))?;

        for (name, block) in diff.serialize_blocks() {
            let path = dir.join(format!("{}.facts", name));
            trace!("Writing '{}'", path.display());
            std::fs::write(&path, block).map_err(persistence_error(&path))?;
        }
        Ok(())
    }
}

/// Keeps the serialized blocks of every iteration in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    pub batches: Vec<(usize, BTreeMap<String, String>)>,
    pub resets: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch(&self, iteration: usize) -> Option<&BTreeMap<String, String>> {
        self.batches
            .iter()
            .find(|(index, _)| *index == iteration)
            .map(|(_, blocks)| blocks)
    }
}

impl DiffSink for MemorySink {
    fn reset(&mut self) -> FactResult<()> {
        self.batches.clear();
        self.resets += 1;
        Ok(())
    }

    fn persist(&mut self, iteration: usize, diff: &DiffDatabase) -> FactResult<()> {
        self.batches.push((iteration, diff.serialize_blocks()));
        Ok(())
    }
}
