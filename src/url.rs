//! URL sanitiser: normalises a `(driver, url)` pair, inferring the driver
//! from a URL scheme where possible, and failing with a distinguished error
//! for opaque DSN forms rather than guessing.

use crate::error::{EngineError, Result};

/// Resolve an explicit driver name, or infer one from `url`'s scheme.
///
/// Scheme inference is intentionally weak: only URLs containing `://` with
/// a parseable scheme yield an inferred driver. DSN forms without a scheme
/// (`user:pw@tcp(host:port)/db`, bare filenames, `host:port?keyspace=...`)
/// fail with [`EngineError::DriverRequired`] rather than guessing.
pub fn resolve_driver(explicit_driver: Option<&str>, url: &str) -> Result<String> {
    if let Some(driver) = explicit_driver {
        return Ok(driver.to_string());
    }

    if !url.contains("://") {
        return Err(EngineError::DriverRequired);
    }

    let parsed = url::Url::parse(url).map_err(|_| EngineError::DriverRequired)?;
    match parsed.scheme() {
        "postgres" | "postgresql" => Ok("postgres".to_string()),
        "mysql" => Ok("mysql".to_string()),
        "sqlite" | "sqlite3" => Ok("sqlite3".to_string()),
        "cql" | "cassandra" | "scylla" => Ok("cql".to_string()),
        _ => Err(EngineError::DriverRequired),
    }
}

/// Validates `(driver, url)`: ensures the URL is non-empty and the driver is
/// set (explicit or inferred).
pub fn sanitise(explicit_driver: Option<&str>, url: &str) -> Result<(String, String)> {
    if url.trim().is_empty() {
        return Err(EngineError::MissingUrl);
    }
    let driver = resolve_driver(explicit_driver, url)?;
    Ok((driver, url.to_string()))
}

/// Rewrites a `postgres://`/`mysql://`-style URL's path component to point
/// at `admin_db`, preserving every query parameter, returning
/// `(admin_url, original_db_name)`.
pub fn rewrite_database(url: &str, admin_db: &str) -> Result<(String, String)> {
    let mut parsed = url::Url::parse(url).map_err(|e| EngineError::Connection(e.to_string()))?;
    let original_db = parsed
        .path_segments()
        .and_then(|mut s| s.next())
        .unwrap_or("")
        .to_string();
    parsed.set_path(&format!("/{admin_db}"));
    Ok((parsed.to_string(), original_db))
}

/// Rewrites the `keyspace=` query parameter (CQL has no path-based database
/// name) to `admin_keyspace`, returning `(admin_url, original_keyspace)`.
/// CQL connection strings are frequently bare `host:port?keyspace=...` DSNs
/// rather than `scheme://` URLs, so this works on the query string directly
/// rather than requiring a parseable URL.
pub fn rewrite_keyspace(url: &str, admin_keyspace: &str) -> Result<(String, String)> {
    let (base, query) = match url.split_once('?') {
        Some((b, q)) => (b, q),
        None => (url, ""),
    };

    let mut original_keyspace = String::new();
    let mut pairs: Vec<(String, String)> = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        if k == "keyspace" {
            original_keyspace = v.to_string();
            pairs.push((k.to_string(), admin_keyspace.to_string()));
        } else {
            pairs.push((k.to_string(), v.to_string()));
        }
    }
    if !pairs.iter().any(|(k, _)| k == "keyspace") {
        pairs.push(("keyspace".to_string(), admin_keyspace.to_string()));
    }

    let rebuilt_query = pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    Ok((format!("{base}?{rebuilt_query}"), original_keyspace))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_driver_from_scheme() {
        assert_eq!(
            resolve_driver(None, "postgres://u:p@host/db").unwrap(),
            "postgres"
        );
        assert_eq!(resolve_driver(None, "mysql://u:p@host/db").unwrap(), "mysql");
        assert_eq!(
            resolve_driver(None, "sqlite://./data.db").unwrap(),
            "sqlite3"
        );
    }

    #[test]
    fn explicit_driver_wins_over_inference() {
        assert_eq!(
            resolve_driver(Some("mysql"), "postgres://u:p@host/db").unwrap(),
            "mysql"
        );
    }

    #[test]
    fn opaque_dsn_requires_explicit_driver() {
        assert!(matches!(
            resolve_driver(None, "user:pw@tcp(host:3306)/db"),
            Err(EngineError::DriverRequired)
        ));
        assert!(matches!(
            resolve_driver(None, "host:9042?keyspace=ks"),
            Err(EngineError::DriverRequired)
        ));
        assert!(matches!(
            resolve_driver(None, "./relative/path.db"),
            Err(EngineError::DriverRequired)
        ));
    }

    #[test]
    fn missing_url_is_rejected() {
        assert!(matches!(sanitise(Some("postgres"), ""), Err(EngineError::MissingUrl)));
    }

    #[test]
    fn rewrite_database_preserves_query_params() {
        let (admin_url, db) =
            rewrite_database("postgres://u:p@host:5432/myapp?sslmode=disable", "postgres").unwrap();
        assert_eq!(db, "myapp");
        assert!(admin_url.starts_with("postgres://u:p@host:5432/postgres"));
        assert!(admin_url.contains("sslmode=disable"));
    }

    #[test]
    fn rewrite_keyspace_replaces_existing_param() {
        let (admin_url, ks) = rewrite_keyspace("host:9042?keyspace=myapp", "system").unwrap();
        assert_eq!(ks, "myapp");
        assert!(admin_url.contains("keyspace=system"));
    }

    #[test]
    fn rewrite_keyspace_adds_param_when_absent() {
        let (admin_url, ks) = rewrite_keyspace("host:9042", "system").unwrap();
        assert_eq!(ks, "");
        assert!(admin_url.contains("keyspace=system"));
    }
}
