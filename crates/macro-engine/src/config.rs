//! Engine configuration, read from RON.
use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Sizing of the action pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Workers kept alive even when idle.
    pub min_workers: usize,
    /// Hard cap on concurrently running workers.
    pub max_workers: usize,
    /// How long a worker above the minimum may sit idle before exiting.
    pub keep_alive_ms: u64,
    /// Run workers at raised scheduling priority where supported.
    pub elevated_priority: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            min_workers: 4,
            max_workers: 32,
            keep_alive_ms: 30_000,
            elevated_priority: true,
        }
    }
}

impl ExecutorConfig {
    /// Idle timeout as a `Duration`.
    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::Config("executor.max_workers must be at least 1".into()));
        }
        if self.min_workers > self.max_workers {
            return Err(Error::Config(format!(
                "executor.min_workers ({}) exceeds max_workers ({})",
                self.min_workers, self.max_workers
            )));
        }
        Ok(())
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Action pool sizing.
    pub executor: ExecutorConfig,
    /// Refuse rules whose key condition would match every key.
    pub require_key: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executor: ExecutorConfig::default(),
            require_key: true,
        }
    }
}

impl Config {
    /// Parse and validate a RON document. Missing fields take defaults.
    pub fn from_ron(s: &str) -> Result<Self> {
        let cfg: Self = ron::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a RON file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_ron(&source).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.executor.validate()
    }
}
