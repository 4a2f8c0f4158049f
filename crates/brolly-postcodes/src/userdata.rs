//! SQLite table of saved postcodes, one row per email.
//!
//! The `postcodes` column holds a JSON document `{"postcodes": [...]}`.
//! Every call opens its own connection and commits before returning.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::StoreError;

/// How long a writer waits for another connection's transaction
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Default, Serialize, Deserialize)]
struct PostcodeDocument {
    postcodes: Vec<String>,
}

/// Handle to the user data database file.
#[derive(Debug, Clone)]
pub struct UserDataDb {
    path: PathBuf,
}

impl UserDataDb {
    /// Use the database at `path`, creating the file, its directory and the
    /// table if needed.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let db = Self { path };
        db.connect()?;
        tracing::info!("User data database at {}", db.path.display());
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS userdata (
                email TEXT PRIMARY KEY,
                postcodes TEXT NOT NULL
            );
            "#,
        )?;
        Ok(conn)
    }

    fn parse(email: &str, raw: &str) -> Result<PostcodeDocument, StoreError> {
        serde_json::from_str(raw).map_err(|source| StoreError::Corrupt {
            email: email.to_string(),
            source,
        })
    }

    fn encode(doc: &PostcodeDocument) -> String {
        // A Vec<String> always serializes
        serde_json::to_string(doc).unwrap_or_else(|_| r#"{"postcodes":[]}"#.to_string())
    }

    /// Saved postcodes for `email`, creating an empty record on first sight.
    ///
    /// Lookup and insert share one immediate transaction, so a table created
    /// without a key on `email` still ends up with a single row per email.
    pub fn postcodes_or_create(&self, email: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT postcodes FROM userdata WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;

        let doc = match existing {
            Some(raw) => Self::parse(email, &raw)?,
            None => {
                let doc = PostcodeDocument::default();
                tx.execute(
                    "INSERT INTO userdata (email, postcodes) VALUES (?1, ?2)",
                    params![email, Self::encode(&doc)],
                )?;
                tracing::debug!("Created user data record for {}", email);
                doc
            }
        };

        tx.commit()?;
        Ok(doc.postcodes)
    }

    /// Append `postcode` to the list for `email` and return the new list.
    ///
    /// Read, append and write happen in one immediate transaction so two
    /// concurrent appends cannot drop each other's postcode.
    pub fn append_postcode(&self, email: &str, postcode: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT postcodes FROM userdata WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;

        let mut doc = match &existing {
            Some(raw) => Self::parse(email, raw)?,
            None => PostcodeDocument::default(),
        };
        doc.postcodes.push(postcode.to_string());
        let encoded = Self::encode(&doc);

        if existing.is_some() {
            tx.execute(
                "UPDATE userdata SET postcodes = ?1 WHERE email = ?2",
                params![encoded, email],
            )?;
        } else {
            tx.execute(
                "INSERT INTO userdata (email, postcodes) VALUES (?1, ?2)",
                params![email, encoded],
            )?;
        }

        tx.commit()?;
        tracing::debug!("Saved postcode {} for {}", postcode, email);
        Ok(doc.postcodes)
    }

    /// Number of user records.
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM userdata", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn create_test_db() -> (tempfile::TempDir, UserDataDb) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db = UserDataDb::new(dir.path().join("databases").join("userdata.db"))
            .expect("Failed to create database");
        (dir, db)
    }

    #[test]
    fn test_new_creates_missing_directory() {
        let (_dir, db) = create_test_db();
        assert!(db.path().exists());
        assert_eq!(db.count().unwrap(), 0);
    }

    #[test]
    fn test_unseen_email_gets_empty_record() {
        let (_dir, db) = create_test_db();

        let postcodes = db.postcodes_or_create("new@example.com").unwrap();
        assert!(postcodes.is_empty());
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn test_repeat_reads_do_not_duplicate_record() {
        let (_dir, db) = create_test_db();

        db.postcodes_or_create("same@example.com").unwrap();
        db.postcodes_or_create("same@example.com").unwrap();
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn test_table_without_key_gets_one_record_per_email() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("userdata.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE userdata (email TEXT, postcodes TEXT);")
            .unwrap();
        let db = UserDataDb::new(&path).unwrap();

        for _ in 0..3 {
            assert!(db.postcodes_or_create("keyless@example.com").unwrap().is_empty());
        }
        assert_eq!(db.count().unwrap(), 1);

        db.append_postcode("keyless@example.com", "SW1A 1AA").unwrap();
        assert_eq!(db.postcodes_or_create("keyless@example.com").unwrap(), vec!["SW1A 1AA"]);
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn test_append_preserves_order() {
        let (_dir, db) = create_test_db();
        db.postcodes_or_create("a@example.com").unwrap();

        db.append_postcode("a@example.com", "SW1A 1AA").unwrap();
        db.append_postcode("a@example.com", "EH1 1YZ").unwrap();
        let list = db.append_postcode("a@example.com", "M1 1AE").unwrap();

        assert_eq!(list, vec!["SW1A 1AA", "EH1 1YZ", "M1 1AE"]);
        assert_eq!(db.postcodes_or_create("a@example.com").unwrap(), list);
    }

    #[test]
    fn test_append_without_record_creates_it() {
        let (_dir, db) = create_test_db();

        let list = db.append_postcode("late@example.com", "CF10 1EP").unwrap();
        assert_eq!(list, vec!["CF10 1EP"]);
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn test_records_are_per_email() {
        let (_dir, db) = create_test_db();

        db.append_postcode("one@example.com", "SW1A 1AA").unwrap();
        assert!(db.postcodes_or_create("two@example.com").unwrap().is_empty());
        assert_eq!(db.postcodes_or_create("one@example.com").unwrap(), vec!["SW1A 1AA"]);
    }

    #[test]
    fn test_reads_document_written_by_other_tools() {
        let (_dir, db) = create_test_db();
        let conn = Connection::open(db.path()).unwrap();
        conn.execute(
            "INSERT INTO userdata VALUES (?1, ?2)",
            params!["legacy@example.com", r#"{ "postcodes" : ["BT1 5GS"] }"#],
        )
        .unwrap();

        assert_eq!(db.postcodes_or_create("legacy@example.com").unwrap(), vec!["BT1 5GS"]);
    }

    #[test]
    fn test_corrupt_document_is_reported() {
        let (_dir, db) = create_test_db();
        let conn = Connection::open(db.path()).unwrap();
        conn.execute(
            "INSERT INTO userdata VALUES (?1, ?2)",
            params!["broken@example.com", "not json"],
        )
        .unwrap();

        let err = db.postcodes_or_create("broken@example.com").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));

        let err = db.append_postcode("broken@example.com", "SW1A 1AA").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
