//! Versions store: the in-memory set of applied versions loaded from the
//! bookkeeping table.
//!
//! Membership is the only operation this engine actually needs, so a plain
//! `HashSet` is all that's required here.

use crate::adapter::{Adapter, Backend};
use crate::error::{EngineError, Result};
use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct VersionsStore {
    versions: HashSet<String>,
}

impl VersionsStore {
    /// Best-effort creates the bookkeeping table, then loads every applied
    /// version. If the select fails, the combined error surfaces the
    /// creation failure as context and the select failure as cause.
    pub async fn load(
        adapter: &dyn Adapter,
        backend: &dyn Backend,
        schema: Option<&str>,
    ) -> Result<Self> {
        let create_sql = adapter.create_versions_table_sql(schema);
        let select_sql = adapter.select_existing_versions_sql(schema);

        let create_err = backend.execute(&create_sql).await.err();

        match backend.query_versions(&select_sql).await {
            Ok(rows) => {
                let versions = rows.into_iter().map(|v| v.trim().to_string()).collect();
                Ok(Self { versions })
            }
            Err(select_err) => {
                let base = anyhow::Error::new(select_err);
                let wrapped = match create_err {
                    Some(ce) => base.context(format!("creating versions table also failed: {ce}")),
                    None => base,
                };
                Err(EngineError::VersionsLoad(wrapped))
            }
        }
    }

    pub fn contains(&self, version: &str) -> bool {
        self.versions.contains(version)
    }

    pub fn insert(&mut self, version: impl Into<String>) {
        self.versions.insert(version.into());
    }

    pub fn remove(&mut self, version: &str) {
        self.versions.remove(version);
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_iter_for_test<I: IntoIterator<Item = String>>(it: I) -> Self {
        Self {
            versions: it.into_iter().collect(),
        }
    }
}
