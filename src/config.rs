//! Engine-wide configuration, loaded from a TOML file: default transaction
//! mode, lock poll interval, and overall run deadline.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::mode::TxnMode;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_mode")]
    pub default_mode: String,
    #[serde(default = "default_lock_poll_secs")]
    pub lock_poll_secs: u64,
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    #[serde(default)]
    pub no_lock: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_mode: default_mode(),
            lock_poll_secs: default_lock_poll_secs(),
            deadline_secs: default_deadline_secs(),
            no_lock: false,
        }
    }
}

fn default_mode() -> String {
    "per-file".to_string()
}

fn default_lock_poll_secs() -> u64 {
    2
}

fn default_deadline_secs() -> u64 {
    300
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("could not read config file '{}': {}", path.display(), e)
        })?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if present; falls back to defaults when the file is
    /// simply absent (a missing config file is not an error for a CLI that
    /// works fine unconfigured). A present-but-unparsable file still fails.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        TxnMode::parse(&self.default_mode)
            .map_err(|e| anyhow::anyhow!("config.default_mode: {e}"))?;
        if self.lock_poll_secs == 0 {
            anyhow::bail!("config.lock_poll_secs must be greater than 0");
        }
        if self.deadline_secs == 0 {
            anyhow::bail!("config.deadline_secs must be greater than 0");
        }
        Ok(())
    }

    pub fn mode(&self) -> TxnMode {
        TxnMode::parse(&self.default_mode).expect("validated at load time")
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub fn lock_poll_interval(&self) -> Duration {
        Duration::from_secs(self.lock_poll_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.mode(), TxnMode::PerFile);
        assert_eq!(cfg.deadline(), Duration::from_secs(300));
    }

    #[test]
    fn rejects_invalid_mode() {
        let mut cfg = EngineConfig::default();
        cfg.default_mode = "bogus".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let mut cfg = EngineConfig::default();
        cfg.lock_poll_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn loads_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbmigrate.toml");
        std::fs::write(&path, "default_mode = \"all\"\nlock_poll_secs = 5\n").unwrap();
        let cfg = EngineConfig::load(&path).unwrap();
        assert_eq!(cfg.mode(), TxnMode::All);
        assert_eq!(cfg.lock_poll_secs, 5);
    }
}
