//! Postgres reference adapter.

use super::any_sql::AnySqlBackend;
use super::{qualified_table, Adapter, Backend};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

const TRY_LOCK_SQL: &str = "SELECT pg_try_advisory_lock($1::bigint)::text";
const UNLOCK_SQL: &str = "SELECT pg_advisory_unlock($1::bigint)::text";

pub struct PostgresAdapter;

#[async_trait]
impl Adapter for PostgresAdapter {
    fn name(&self) -> &'static str {
        "postgres"
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
        format!("INSERT INTO {} (version) VALUES ($1)", qualified_table(schema))
    }

    fn delete_old_version_sql(&self, schema: Option<&str>) -> String {
        format!("DELETE FROM {} WHERE version = $1", qualified_table(schema))
    }

    fn ping_query(&self) -> Option<&'static str> {
        Some("SELECT 1")
    }

    fn create_database_query(&self, name: &str) -> Option<String> {
        Some(format!("CREATE DATABASE \"{}\"", name.replace('"', "\"\"")))
    }

    fn create_schema_query(&self, name: &str) -> Option<String> {
        Some(format!("CREATE SCHEMA IF NOT EXISTS \"{}\"", name.replace('"', "\"\"")))
    }

    fn base_database_url(&self, url: &str) -> Option<Result<(String, String)>> {
        Some(crate::url::rewrite_database(url, "postgres"))
    }

    fn supports_locking(&self) -> bool {
        true
    }

    async fn connect(&self, url: &str) -> Result<Arc<dyn Backend>> {
        let backend = AnySqlBackend::connect(url, Some((TRY_LOCK_SQL, UNLOCK_SQL))).await?;
        Ok(Arc::new(backend))
    }
}
