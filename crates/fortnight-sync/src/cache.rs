//! Session cache.
//!
//! A local fallback seed, one JSON record per line, so a fresh session can
//! paint the calendar before the first remote fetch resolves. Never
//! authoritative: a successful hydrate overwrites it, and load failures
//! degrade to an empty seed rather than erroring the session.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::wire::TaskRecord;

const CACHE_ENV_VAR: &str = "FORTNIGHT_CACHE";
const CACHE_DIR: &str = "fortnight";
const CACHE_FILE: &str = "tasks.cache";

#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The platform cache location, overridable with `FORTNIGHT_CACHE`.
    /// `None` when the platform reports no cache directory.
    pub fn resolve() -> Option<Self> {
        if let Ok(raw) = std::env::var(CACHE_ENV_VAR) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(Self::at(trimmed));
            }
        }

        dirs::cache_dir().map(|dir| Self::at(dir.join(CACHE_DIR).join(CACHE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort load. A missing file is an empty seed; a corrupt line is
    /// skipped with a warning rather than poisoning the rest.
    #[tracing::instrument(skip(self), fields(file = %self.path.display()))]
    pub fn load(&self) -> Vec<TaskRecord> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) => {
                debug!(error = %err, "no readable session cache");
                return Vec::new();
            }
        };

        let reader = BufReader::new(file);
        let mut out = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(line = idx + 1, error = %err, "unreadable cache line; stopping");
                    break;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<TaskRecord>(trimmed) {
                Ok(record) => out.push(record),
                Err(err) => {
                    warn!(line = idx + 1, error = %err, "skipping corrupt cache line");
                }
            }
        }

        debug!(count = out.len(), "loaded session cache");
        out
    }

    /// Atomic rewrite via temp file + persist, so a crash mid-write never
    /// leaves a half-written seed.
    #[tracing::instrument(skip(self, records), fields(file = %self.path.display(), count = records.len()))]
    pub fn store(&self, records: &[TaskRecord]) -> anyhow::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let mut temp = NamedTempFile::new_in(dir)?;
        for record in records {
            let serialized = serde_json::to_string(record)?;
            writeln!(temp, "{serialized}")?;
        }
        temp.flush()?;

        temp.persist(&self.path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.path.display(), err))?;

        Ok(())
    }
}
