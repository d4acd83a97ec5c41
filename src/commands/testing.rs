//! Temporary SQLite store for command tests.

use recipebox::db::{init_db, SqliteDocumentStore};
use tempfile::TempDir;

pub struct TestContext {
    pub store: SqliteDocumentStore,
    _temp_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(temp_dir.path().join("test.db")).await.unwrap();
        Self {
            store: SqliteDocumentStore::new(pool),
            _temp_dir: temp_dir,
        }
    }
}
