use spendsort_core::RuleSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read rules: {0}")]
    Io(#[from] io::Error),
    #[error("Rules file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Could not write rules: {0}")]
    Io(#[from] io::Error),
    #[error("Could not encode rules: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where a rule set lives between runs.
///
/// `load` returns the default rule set when nothing has been saved yet.
/// `save` replaces the whole stored rule set; a failed save must leave the
/// previous content readable.
pub trait RuleBackend: Send + Sync {
    fn load(&self) -> Result<RuleSet, LoadError>;
    fn save(&self, rules: &RuleSet) -> Result<(), PersistError>;
}

// ── JSON file backend ─────────────────────────────────────────────────────────

/// Stores the rule set as one pretty-printed JSON object.
///
/// Saves go to a sibling `.tmp` file which is then renamed over the target, so
/// readers only ever see a complete file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "rules.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RuleBackend for JsonFileBackend {
    fn load(&self) -> Result<RuleSet, LoadError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No rules file at {}, starting empty", self.path.display());
                return Ok(RuleSet::default());
            }
            Err(e) => return Err(e.into()),
        };
        let rules = serde_json::from_str(&raw)?;
        tracing::info!("Loaded rules from {}", self.path.display());
        Ok(rules)
    }

    fn save(&self, rules: &RuleSet) -> Result<(), PersistError> {
        let raw = serde_json::to_vec_pretty(rules)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.tmp_path();
        let written = fs::File::create(&tmp_path).and_then(|mut file| {
            file.write_all(&raw)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&tmp_path, &self.path)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::debug!("Saved {} categories to {}", rules.len(), self.path.display());
        Ok(())
    }
}

// ── In-memory backend (tests and ephemeral sessions) ──────────────────────────

/// Keeps the saved rule set in memory. Writes can be made to fail on demand to
/// exercise persist-error handling.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    stored: Mutex<Option<RuleSet>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: RuleSet) -> Self {
        Self {
            stored: Mutex::new(Some(rules)),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The last successfully saved rule set, if any.
    pub fn stored(&self) -> Option<RuleSet> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RuleBackend for MemoryBackend {
    fn load(&self) -> Result<RuleSet, LoadError> {
        Ok(self.stored().unwrap_or_default())
    }

    fn save(&self, rules: &RuleSet) -> Result<(), PersistError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::other("simulated write failure").into());
        }
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = Some(rules.clone());
        Ok(())
    }
}

impl<B: RuleBackend + ?Sized> RuleBackend for std::sync::Arc<B> {
    fn load(&self) -> Result<RuleSet, LoadError> {
        (**self).load()
    }

    fn save(&self, rules: &RuleSet) -> Result<(), PersistError> {
        (**self).save(rules)
    }
}
