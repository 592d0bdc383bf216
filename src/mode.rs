//! Transaction-mode parsing.

use crate::error::{EngineError, Result};
use std::fmt;

/// Transaction granularity for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnMode {
    /// One transaction wraps the whole run. Incompatible with any
    /// `.no-db-txn.` file.
    All,
    /// Each transactional file gets its own transaction; non-transactional
    /// files run directly on the pool.
    PerFile,
    /// No transactions anywhere.
    None,
}

impl TxnMode {
    /// Parse exactly the lowercase literals `all`, `per-file`, `none`.
    /// Anything else — including case variants and prefixes — fails.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(TxnMode::All),
            "per-file" => Ok(TxnMode::PerFile),
            "none" => Ok(TxnMode::None),
            other => Err(EngineError::InvalidMode(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxnMode::All => "all",
            TxnMode::PerFile => "per-file",
            TxnMode::None => "none",
        }
    }
}

impl fmt::Display for TxnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_literals() {
        assert_eq!(TxnMode::parse("all").unwrap(), TxnMode::All);
        assert_eq!(TxnMode::parse("per-file").unwrap(), TxnMode::PerFile);
        assert_eq!(TxnMode::parse("none").unwrap(), TxnMode::None);
    }

    #[test]
    fn rejects_case_variants_and_prefixes() {
        assert!(TxnMode::parse("All").is_err());
        assert!(TxnMode::parse("ALL").is_err());
        assert!(TxnMode::parse("al").is_err());
        assert!(TxnMode::parse("per_file").is_err());
        assert!(TxnMode::parse("").is_err());
    }

    #[test]
    fn error_message_enumerates_valid_values() {
        let err = TxnMode::parse("bogus").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("all"));
        assert!(msg.contains("per-file"));
        assert!(msg.contains("none"));
    }
}
