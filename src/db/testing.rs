//! Test support: temporary SQLite stores and a failure-injecting wrapper.

use std::cell::Cell;
use tempfile::TempDir;

use super::store::{
    Collection, Document, DocumentSnapshot, DocumentStore, Fields, Query, StoreError, WriteBatch,
};
use super::{init_db, SqliteDocumentStore};

pub struct TestContext {
    pub store: SqliteDocumentStore,
    _temp_dir: TempDir, // Keep alive for duration of test
}

impl TestContext {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(db_path).await.unwrap();
        Self {
            store: SqliteDocumentStore::new(pool),
            _temp_dir: temp_dir,
        }
    }
}

/// Wraps a real store, counts calls and fails chosen operations on demand.
///
/// Every call yields once before touching the inner store, so concurrent
/// callers on the same task interleave at the suspension point.
pub struct FlakyStore {
    ctx: TestContext,
    calls: Cell<usize>,
    fail_adds: Cell<usize>,
    fail_updates: Cell<usize>,
    fail_commits: Cell<usize>,
    fail_sets: Cell<usize>,
}

impl FlakyStore {
    pub async fn new() -> Self {
        Self {
            ctx: TestContext::new().await,
            calls: Cell::new(0),
            fail_adds: Cell::new(0),
            fail_updates: Cell::new(0),
            fail_commits: Cell::new(0),
            fail_sets: Cell::new(0),
        }
    }

    pub fn inner(&self) -> &SqliteDocumentStore {
        &self.ctx.store
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn fail_next_adds(&self, n: usize) {
        self.fail_adds.set(n);
    }

    pub fn fail_next_updates(&self, n: usize) {
        self.fail_updates.set(n);
    }

    pub fn fail_next_commits(&self, n: usize) {
        self.fail_commits.set(n);
    }

    pub fn fail_next_sets(&self, n: usize) {
        self.fail_sets.set(n);
    }

    async fn enter(&self, budget: &Cell<usize>) -> Result<(), StoreError> {
        self.calls.set(self.calls.get() + 1);
        tokio::task::yield_now().await;
        if budget.get() > 0 {
            budget.set(budget.get() - 1);
            return Err(StoreError::Io(std::io::Error::other("injected failure")));
        }
        Ok(())
    }
}

impl DocumentStore for FlakyStore {
    async fn add(&self, collection: Collection, fields: Fields) -> Result<String, StoreError> {
        self.enter(&self.fail_adds).await?;
        self.inner().add(collection, fields).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        self.enter(&Cell::new(0)).await?;
        self.inner().get(collection, id).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.enter(&self.fail_updates).await?;
        self.inner().update(collection, id, fields).await
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
        merge: bool,
    ) -> Result<(), StoreError> {
        self.enter(&self.fail_sets).await?;
        self.inner().set(collection, id, fields, merge).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.enter(&Cell::new(0)).await?;
        self.inner().delete(collection, id).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, StoreError> {
        self.enter(&Cell::new(0)).await?;
        self.inner().query(query).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.enter(&self.fail_commits).await?;
        self.inner().commit(batch).await
    }
}
