//! Migration catalogue: discovery and ordering of migration files.

use std::path::Path;

/// Direction a migration file runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// One discovered `.sql` migration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Path relative to the migrations directory, using forward slashes.
    pub filename: String,
    pub version: String,
    pub direction: Direction,
    /// False iff the filename contains the literal substring `.no-db-txn.`.
    pub transactional: bool,
}

impl MigrationFile {
    /// Parse a filename of the form
    /// `<version>_<description>[.no-db-txn].{up,down}.sql`.
    /// Returns `None` for names that don't end in the canonical
    /// `.up.sql` / `.down.sql` suffix — the leading dot is required on
    /// both directions.
    pub fn parse(filename: &str) -> Option<Self> {
        let direction = if filename.ends_with(".up.sql") {
            Direction::Up
        } else if filename.ends_with(".down.sql") {
            Direction::Down
        } else {
            return None;
        };

        let version = filename.split('_').next().unwrap_or(filename).to_string();
        let transactional = !filename.contains(".no-db-txn.");

        Some(MigrationFile {
            filename: filename.to_string(),
            version,
            direction,
            transactional,
        })
    }
}

/// The frozen, ordered set of migration files discovered under `root`.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    files: Vec<MigrationFile>,
}

impl Catalogue {
    /// Walk `root` recursively, keeping every leaf entry whose name ends in
    /// `.sql` and parses into a [`MigrationFile`]. Non-`.sql` entries are
    /// ignored. Duplicate version+direction pairs are rejected.
    pub fn discover(root: &Path) -> anyhow::Result<Self> {
        let mut files = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for entry in walkdir::WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = match entry.file_name().to_str() {
                Some(n) => n,
                None => continue,
            };
            if !name.ends_with(".sql") {
                continue;
            }
            let Some(file) = MigrationFile::parse(name) else {
                continue;
            };

            let key = (file.version.clone(), file.direction);
            anyhow::ensure!(
                seen.insert(key),
                "duplicate migration for version {} direction {:?}",
                file.version,
                file.direction
            );
            files.push(file);
        }

        Ok(Self { files })
    }

    /// Build a catalogue directly from filenames, for tests and for callers
    /// that already have a listing (e.g. embedded migrations).
    pub fn from_filenames<I, S>(names: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut files = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for name in names {
            let name = name.as_ref();
            if !name.ends_with(".sql") {
                continue;
            }
            let Some(file) = MigrationFile::parse(name) else {
                continue;
            };
            let key = (file.version.clone(), file.direction);
            anyhow::ensure!(
                seen.insert(key),
                "duplicate migration for version {} direction {:?}",
                file.version,
                file.direction
            );
            files.push(file);
        }
        Ok(Self { files })
    }

    /// Up-migrations, ascending by version (stable sort).
    pub fn ascending_up(&self) -> Vec<&MigrationFile> {
        let mut v: Vec<&MigrationFile> = self
            .files
            .iter()
            .filter(|f| f.direction == Direction::Up)
            .collect();
        v.sort_by(|a, b| a.version.cmp(&b.version));
        v
    }

    /// Down-migrations, descending by version (stable sort).
    pub fn descending_down(&self) -> Vec<&MigrationFile> {
        let mut v: Vec<&MigrationFile> = self
            .files
            .iter()
            .filter(|f| f.direction == Direction::Down)
            .collect();
        v.sort_by(|a, b| b.version.cmp(&a.version));
        v
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_version_up_and_down() {
        let f = MigrationFile::parse("20240101_create_t.up.sql").unwrap();
        assert_eq!(f.version, "20240101");
        assert_eq!(f.direction, Direction::Up);
        assert!(f.transactional);

        let f = MigrationFile::parse("20240101_create_t.down.sql").unwrap();
        assert_eq!(f.direction, Direction::Down);
    }

    #[test]
    fn detects_no_db_txn_marker() {
        let f = MigrationFile::parse("20240103_idx.no-db-txn.up.sql").unwrap();
        assert!(!f.transactional);
        assert_eq!(f.version, "20240103");
    }

    #[test]
    fn rejects_names_without_leading_dot_suffix() {
        // "up.sql" / "down.sql" without the leading dot must not match.
        assert!(MigrationFile::parse("20240101_createup.sql").is_none());
        assert!(MigrationFile::parse("just_a_file.sql").is_none());
    }

    #[test]
    fn ignores_non_sql_entries() {
        assert!(MigrationFile::parse("README.md").is_none());
    }

    #[test]
    fn round_trips_version_extraction() {
        // filename = v + "_" + rest  =>  extracted token = v
        for (v, rest) in [("20240101", "a.up.sql"), ("weird-token", "x.down.sql")] {
            let filename = format!("{v}_{rest}");
            let f = MigrationFile::parse(&filename).unwrap();
            assert_eq!(f.version, v);
        }
    }

    #[test]
    fn ascending_and_descending_ordering() {
        let cat = Catalogue::from_filenames([
            "20240103_c.up.sql",
            "20240101_a.up.sql",
            "20240102_b.up.sql",
            "20240103_c.down.sql",
            "20240101_a.down.sql",
            "20240102_b.down.sql",
        ])
        .unwrap();

        let up_versions: Vec<_> = cat.ascending_up().iter().map(|f| f.version.clone()).collect();
        assert_eq!(up_versions, vec!["20240101", "20240102", "20240103"]);

        let down_versions: Vec<_> = cat
            .descending_down()
            .iter()
            .map(|f| f.version.clone())
            .collect();
        assert_eq!(down_versions, vec!["20240103", "20240102", "20240101"]);
    }

    #[test]
    fn rejects_duplicate_version_direction() {
        let err = Catalogue::from_filenames(["20240101_a.up.sql", "20240101_b.up.sql"]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
