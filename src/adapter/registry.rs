//! Process-wide adapter registry.
//!
//! Populated once, at first access, from the four reference adapters. A
//! deployment that links in a fifth driver would add another entry here —
//! the registry is a plain map, not a plugin system, matching the scale the
//! source operates at.

use super::{cql::CqlAdapter, mysql::MySqlAdapter, postgres::PostgresAdapter, sqlite::SqliteAdapter, Adapter};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

pub const DRIVER_POSTGRES: &str = "postgres";
pub const DRIVER_MYSQL: &str = "mysql";
pub const DRIVER_SQLITE3: &str = "sqlite3";
pub const DRIVER_CQL: &str = "cql";

static REGISTRY: Lazy<HashMap<&'static str, Arc<dyn Adapter>>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, Arc<dyn Adapter>> = HashMap::new();
    m.insert(DRIVER_POSTGRES, Arc::new(PostgresAdapter));
    m.insert(DRIVER_MYSQL, Arc::new(MySqlAdapter));
    m.insert(DRIVER_SQLITE3, Arc::new(SqliteAdapter));
    m.insert(DRIVER_CQL, Arc::new(CqlAdapter));
    m
});

/// Look up an adapter by driver name. Returns `None` for anything not
/// registered, which callers turn into `EngineError::UnknownDriver`.
pub fn lookup(driver: &str) -> Option<Arc<dyn Adapter>> {
    REGISTRY.get(driver).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_four_reference_drivers_registered() {
        for name in [DRIVER_POSTGRES, DRIVER_MYSQL, DRIVER_SQLITE3, DRIVER_CQL] {
            assert!(lookup(name).is_some(), "missing adapter for {name}");
        }
    }

    #[test]
    fn unknown_driver_is_none() {
        assert!(lookup("oracle").is_none());
    }

    #[test]
    fn locking_capability_matches_spec_table() {
        assert!(lookup(DRIVER_POSTGRES).unwrap().supports_locking());
        assert!(lookup(DRIVER_MYSQL).unwrap().supports_locking());
        assert!(!lookup(DRIVER_SQLITE3).unwrap().supports_locking());
        assert!(!lookup(DRIVER_CQL).unwrap().supports_locking());
    }
}
