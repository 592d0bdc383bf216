//! MySQL reference adapter.

use super::any_sql::AnySqlBackend;
use super::{Adapter, Backend, DBMIGRATE_VERSIONS_TABLE};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

const TRY_LOCK_SQL: &str = "SELECT CAST(GET_LOCK(?, 0) AS CHAR)";
const UNLOCK_SQL: &str = "SELECT CAST(RELEASE_LOCK(?) AS CHAR)";

pub struct MySqlAdapter;

#[async_trait]
impl Adapter for MySqlAdapter {
    fn name(&self) -> &'static str {
        "mysql"
    }

    // MySQL has no schema-qualification concept for this table; `schema` is
    // accepted for trait-shape parity with Postgres but always ignored, per
    // the bookkeeping-table contract (no schema prefix on this dialect).
    fn create_versions_table_sql(&self, _schema: Option<&str>) -> String {
        format!("CREATE TABLE IF NOT EXISTS {DBMIGRATE_VERSIONS_TABLE} (version char(14) NOT NULL PRIMARY KEY)")
    }

    fn select_existing_versions_sql(&self, _schema: Option<&str>) -> String {
        format!("SELECT version FROM {DBMIGRATE_VERSIONS_TABLE} ORDER BY version ASC")
    }

    fn insert_new_version_sql(&self, _schema: Option<&str>) -> String {
        format!("INSERT INTO {DBMIGRATE_VERSIONS_TABLE} (version) VALUES (?)")
    }

    fn delete_old_version_sql(&self, _schema: Option<&str>) -> String {
        format!("DELETE FROM {DBMIGRATE_VERSIONS_TABLE} WHERE version = ?")
    }

    fn ping_query(&self) -> Option<&'static str> {
        Some("SELECT 1")
    }

    fn create_database_query(&self, name: &str) -> Option<String> {
        Some(format!("CREATE DATABASE IF NOT EXISTS `{}`", name.replace('`', "``")))
    }

    fn base_database_url(&self, url: &str) -> Option<Result<(String, String)>> {
        Some(crate::url::rewrite_database(url, "mysql"))
    }

    fn supports_locking(&self) -> bool {
        true
    }

    async fn connect(&self, url: &str) -> Result<Arc<dyn Backend>> {
        let backend = AnySqlBackend::connect(url, Some((TRY_LOCK_SQL, UNLOCK_SQL))).await?;
        Ok(Arc::new(backend))
    }
}
