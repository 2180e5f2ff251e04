// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A pipeline definition file watched for changes.

use crate::definition::PipelineDefinition;
use crate::error::{PipelineError, Result};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A definition file and the modification time of its last read.
#[derive(Debug, Clone)]
pub struct PipelineSource {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl PipelineSource {
    /// Watches `path`. Nothing is read until [`Self::read`] or [`Self::poll`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            last_modified: None,
        }
    }

    /// The watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    /// Reads and parses the file, remembering its modification time.
    ///
    /// ## Errors
    /// * `Io` - If the file cannot be read.
    /// * `Parse` - If the content is not a valid definition.
    pub fn read(&mut self) -> Result<PipelineDefinition> {
        let modified = self.modified();
        let text = fs::read_to_string(&self.path).map_err(|source| PipelineError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.last_modified = modified;
        PipelineDefinition::from_ron(&text)
    }

    /// Whether the file changed since the last read.
    pub fn has_changed(&self) -> bool {
        match (self.modified(), self.last_modified) {
            (Some(now), Some(then)) => now != then,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Re-reads the file if it changed. `Ok(None)` when nothing changed.
    ///
    /// A failed parse still records the new modification time, so a broken file is
    /// reported once and not on every poll.
    pub fn poll(&mut self) -> anyhow::Result<Option<PipelineDefinition>> {
        if !self.has_changed() {
            return Ok(None);
        }
        let definition = self
            .read()
            .with_context(|| format!("reloading pipeline '{}'", self.path.display()))?;
        Ok(Some(definition))
    }
}
