//! Runtime configuration.
//!
//! [`Config`] is an ordinary value: pass it to a [`Dataloader`](crate::loader::Dataloader)
//! or use its `seed` for initialisers. For programs that prefer a single
//! process-wide setting, [`init`] installs one exactly once at startup and
//! [`global`] reads it back afterwards.
//!
//! # Lifecycle
//!
//! 1. Call [`init`] before any batching or initialisation work.
//! 2. Read with [`global`]; the value never changes afterwards.
//!
//! If [`init`] is never called, [`global`] returns [`Config::default`].

use crate::{Error, Result};
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};

static GLOBAL: OnceCell<Config> = OnceCell::new();
static DEFAULT: Lazy<Config> = Lazy::new(Config::default);

/// Seed and batching settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Random seed for shuffling and weight initialisation.
    pub seed: u64,
    /// Graphs per batch.
    pub batch_size: usize,
    /// Shuffle dataset order every epoch.
    pub shuffle: bool,
    /// Drop the trailing batch if it is smaller than `batch_size`.
    pub drop_last: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 42,
            batch_size: 32,
            shuffle: false,
            drop_last: false,
        }
    }
}

impl Config {
    /// Parse a JSON object. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".into()));
        }
        Ok(())
    }
}

/// Install the process-wide configuration.
///
/// Fails if the configuration is invalid or was already installed.
pub fn init(config: Config) -> Result<&'static Config> {
    config.validate()?;
    let mut fresh = false;
    let installed = GLOBAL.get_or_init(|| {
        fresh = true;
        config
    });
    if !fresh {
        return Err(Error::InvalidConfig(
            "global config already initialized".into(),
        ));
    }
    log::debug!("global config initialized: {installed:?}");
    Ok(installed)
}

/// The process-wide configuration, or the default if [`init`] was never called.
pub fn global() -> &'static Config {
    GLOBAL.get().unwrap_or(&DEFAULT)
}
