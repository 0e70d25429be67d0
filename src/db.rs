use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::record::CompanyRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot open store {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("cannot create store directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("store write failed: {0}")]
    Write(#[from] rusqlite::Error),
    #[error("row serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// External tabular store, one row per company keyed by homepage URL.
pub trait RecordSink {
    fn upsert(&mut self, record: &CompanyRecord, schema: &[String]) -> Result<Upsert, SinkError>;
}

pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path).map_err(|source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn stats(&self) -> Result<Stats, SinkError> {
        let total: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM companies", [], |r| r.get(0))?;
        let mut stmt = self.conn.prepare(
            "SELECT status, COUNT(*) FROM companies GROUP BY status ORDER BY COUNT(*) DESC, status",
        )?;
        let by_status = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Stats { total, by_status })
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS companies (
            key         TEXT PRIMARY KEY,
            homepage    TEXT NOT NULL,
            domain      TEXT NOT NULL,
            status      TEXT NOT NULL CHECK(status IN ('CY','CN','C?','X')),
            row_json    TEXT NOT NULL,
            first_seen  TEXT NOT NULL,
            last_seen   TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_companies_status ON companies(status);
        ",
    )
}

impl RecordSink for SqliteSink {
    fn upsert(&mut self, record: &CompanyRecord, schema: &[String]) -> Result<Upsert, SinkError> {
        let key = record.key();
        let row: serde_json::Map<String, serde_json::Value> = schema
            .iter()
            .map(|c| (c.clone(), serde_json::Value::String(record.value(c))))
            .collect();
        let row_json = serde_json::to_string(&row)?;
        let status = record.value("Target Status");
        let status = if status.is_empty() { "X".to_string() } else { status };
        let now = record.last_seen.to_rfc3339();

        let tx = self.conn.transaction()?;
        let exists = tx
            .query_row("SELECT 1 FROM companies WHERE key = ?1", params![key], |_| Ok(()))
            .optional()?
            .is_some();
        let outcome = if exists {
            // first_seen is left untouched
            tx.execute(
                "UPDATE companies
                 SET homepage = ?2, domain = ?3, status = ?4, row_json = ?5, last_seen = ?6
                 WHERE key = ?1",
                params![key, record.homepage_url, record.domain, status, row_json, now],
            )?;
            Upsert::Updated
        } else {
            tx.execute(
                "INSERT INTO companies (key, homepage, domain, status, row_json, first_seen, last_seen)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    key,
                    record.homepage_url,
                    record.domain,
                    status,
                    row_json,
                    record.first_seen.to_rfc3339(),
                    now
                ],
            )?;
            Upsert::Inserted
        };
        tx.commit()?;
        Ok(outcome)
    }
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub by_status: Vec<(String, usize)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::StatusPolicy;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn schema() -> Vec<String> {
        ["Company Name", "Target Status", "Phone"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn first_seen(sink: &SqliteSink, key: &str) -> String {
        sink.conn
            .query_row("SELECT first_seen FROM companies WHERE key = ?1", params![key], |r| r.get(0))
            .unwrap()
    }

    fn row_json(sink: &SqliteSink, key: &str) -> serde_json::Value {
        let raw: String = sink
            .conn
            .query_row("SELECT row_json FROM companies WHERE key = ?1", params![key], |r| r.get(0))
            .unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn upsert_is_keyed_by_normalized_homepage() {
        let dir = TempDir::new().unwrap();
        let mut sink = SqliteSink::open(&dir.path().join("nested/companies.sqlite")).unwrap();

        let mut rec = CompanyRecord::new("https://Example-Shop.com/", "example-shop.com", "Manual");
        rec.company_name = "Example Shop".into();
        rec.finalize(&BTreeSet::new(), StatusPolicy::default());
        assert_eq!(sink.upsert(&rec, &schema()).unwrap(), Upsert::Inserted);
        let seen = first_seen(&sink, "https://example-shop.com/");

        let mut again = CompanyRecord::new(" https://example-shop.com/ ", "example-shop.com", "Manual");
        again.phone = "(608) 555-0142".into();
        again.record_error("https://example-shop.com/about", "transport");
        again.finalize(&BTreeSet::new(), StatusPolicy::default());
        assert_eq!(sink.upsert(&again, &schema()).unwrap(), Upsert::Updated);

        assert_eq!(first_seen(&sink, "https://example-shop.com/"), seen);
        let row = row_json(&sink, "https://example-shop.com/");
        assert_eq!(row["Phone"], "(608) 555-0142");
        assert_eq!(row["Target Status"], "X");
        assert_eq!(row["Company Name"], "");
    }

    #[test]
    fn stats_group_by_status() {
        let dir = TempDir::new().unwrap();
        let mut sink = SqliteSink::open(&dir.path().join("c.sqlite")).unwrap();
        for (url, err) in [("https://a.com/", false), ("https://b.com/", true), ("https://c.com/", true)] {
            let mut rec = CompanyRecord::new(url, url, "");
            if err {
                rec.record_error(url, "transport");
            }
            rec.finalize(&BTreeSet::new(), StatusPolicy::default());
            sink.upsert(&rec, &schema()).unwrap();
        }
        let s = sink.stats().unwrap();
        assert_eq!(s.total, 3);
        assert_eq!(s.by_status, vec![("X".to_string(), 2), ("C?".to_string(), 1)]);
    }
}
