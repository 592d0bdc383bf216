//! SQLite3 reference adapter. Single-writer file database with no
//! server-side lock primitive; `supports_locking` is `false` and there is no
//! admin database to speak of.

use super::any_sql::AnySqlBackend;
use super::{qualified_table, Adapter, Backend};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub struct SqliteAdapter;

#[async_trait]
impl Adapter for SqliteAdapter {
    fn name(&self) -> &'static str {
        "sqlite3"
    }

    fn create_versions_table_sql(&self, schema: Option<&str>) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (version char(14) NOT NULL PRIMARY KEY)",
            qualified_table(schema)
        )
    }

    fn select_existing_versions_sql(&self, schema: Option<&str>) -> String {
        format!(
            "SELECT version FROM {} ORDER BY version ASC",
            qualified_table(schema)
        )
    }

    fn insert_new_version_sql(&self, schema: Option<&str>) -> String {
        format!("INSERT INTO {} (version) VALUES (?)", qualified_table(schema))
    }

    fn delete_old_version_sql(&self, schema: Option<&str>) -> String {
        format!("DELETE FROM {} WHERE version = ?", qualified_table(schema))
    }

    fn ping_query(&self) -> Option<&'static str> {
        Some("SELECT 1")
    }

    fn supports_locking(&self) -> bool {
        false
    }

    async fn connect(&self, url: &str) -> Result<Arc<dyn Backend>> {
        let backend = AnySqlBackend::connect(url, None).await?;
        Ok(Arc::new(backend))
    }
}
