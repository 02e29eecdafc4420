// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Declarative registry of generated artifacts.
///
/// Tasks that generate files declare the glob patterns of their outputs
/// here; the `clean` and `clobber` tasks expand and delete them.
use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    analytics::Os,
    config::Settings,
    error::{self, Error},
    tasks::TaskName,
};

/// Which bulk deletion a pattern belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,)]
pub enum CleanupScope
{
    /// Intermediate build output, removed by `clean`.
    Clean,
    /// Generated data, removed by `clobber` in addition to the clean set.
    Clobber,
}

impl CleanupScope
{
    /// Whether a pattern registered under `self` is removed by `requested`.
    pub fn covered_by(self, requested: Self,) -> bool
    {
        self <= requested
    }
}

/// One registered pattern.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct CleanupEntry
{
    /// Task producing the matching paths.
    pub task:    TaskName,
    pub scope:   CleanupScope,
    /// Glob relative to the repository root.
    pub pattern: String,
}

/// Patterns of generated paths, grouped by owning task.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct CleanupRegistry
{
    entries: Vec<CleanupEntry,>,
}

impl CleanupRegistry
{
    /// Registry for the outputs of the standard tasks under `settings`.
    pub fn standard(settings: &Settings,) -> Self
    {
        let data = display(&settings.data_root,);
        let api = display(&settings.api_root,);
        let mut registry = Self::default();

        registry.register(TaskName::Formulae, CleanupScope::Clobber, [
            format!("{data}/formula"),
            format!("{api}/formula"),
            "formula".to_owned(),
            format!("{data}/formula_canonical.json"),
        ],);
        registry.register(TaskName::Cask, CleanupScope::Clobber, [
            format!("{data}/cask"),
            format!("{api}/cask"),
            "cask".to_owned(),
        ],);
        registry.register(
            TaskName::Analytics,
            CleanupScope::Clobber,
            [Os::Mac, Os::Linux].into_iter().flat_map(|os| {
                [format!("{data}/{}", os.directory_name()), format!("{api}/{}", os.directory_name())]
            },),
        );
        registry.register(TaskName::Build, CleanupScope::Clean, [
            display(&settings.site_dir,),
            ".jekyll-cache".to_owned(),
            ".jekyll-metadata".to_owned(),
        ],);

        registry
    }

    /// Declares that `task` produces paths matching each of `patterns`.
    pub fn register<I,>(&mut self, task: TaskName, scope: CleanupScope, patterns: I,)
    where
        I: IntoIterator<Item = String,>,
    {
        self.entries.extend(patterns.into_iter().map(|pattern| CleanupEntry {
            task,
            scope,
            pattern,
        },),);
    }

    /// Patterns declared by `task`.
    pub fn patterns_for(&self, task: TaskName,) -> Vec<&str,>
    {
        self.entries.iter().filter(|entry| entry.task == task,).map(|entry| entry.pattern.as_str(),).collect()
    }

    /// Existing paths below `root` removed by a `scope` cleanup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a registered pattern is not a valid
    /// glob.
    pub fn paths(&self, root: &Path, scope: CleanupScope,) -> Result<Vec<PathBuf,>, Error,>
    {
        let mut paths = Vec::new();
        for entry in self.entries.iter().filter(|entry| entry.scope.covered_by(scope,),) {
            let pattern = root.join(&entry.pattern,);
            let matches = glob::glob(&pattern.to_string_lossy(),).map_err(|e| {
                Error::validation(format!("invalid cleanup pattern '{}': {e}", entry.pattern),)
            },)?;
            for path in matches {
                match path {
                    Ok(path,) => paths.push(path,),
                    Err(e,) => warn!("Skipping unreadable path while expanding {}: {}", entry.pattern, e),
                }
            }
        }
        paths.sort();
        paths.dedup();
        Ok(paths,)
    }

    /// Deletes every path matched by a `scope` cleanup below `root`.
    ///
    /// Returns the removed paths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when a path cannot be removed.
    pub fn remove(&self, root: &Path, scope: CleanupScope,) -> Result<Vec<PathBuf,>, Error,>
    {
        let paths = self.paths(root, scope,)?;
        let mut removed = Vec::with_capacity(paths.len(),);

        for path in paths {
            // A directory matched earlier may already contain this path.
            let Ok(metadata,) = fs::symlink_metadata(&path,) else {
                continue;
            };

            let result =
                if metadata.is_dir() { fs::remove_dir_all(&path,) } else { fs::remove_file(&path,) };
            result.map_err(|e| error::io_error(&path, e,),)?;
            debug!("Removed {}", path.display());
            removed.push(path,);
        }

        info!("Removed {} generated paths", removed.len());
        Ok(removed,)
    }
}

fn display(path: &Path,) -> String
{
    path.to_string_lossy().into_owned()
}
