use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::store::{
    merge_into, Collection, Document, DocumentSnapshot, DocumentStore, Fields, Query,
    StoreError, WriteBatch,
};

/// [`DocumentStore`] backed by a single SQLite `documents` table.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    data: String,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn now() -> String {
        Utc::now().to_rfc3339()
    }

    fn new_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    async fn fetch(
        conn: &mut SqliteConnection,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM documents WHERE collection = ? AND id = ?")
                .bind(collection.name())
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        match row {
            Some((data,)) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn write(
        conn: &mut SqliteConnection,
        collection: Collection,
        id: &str,
        doc: &Document,
    ) -> Result<(), StoreError> {
        let data = serde_json::to_string(doc)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data) VALUES (?, ?, ?)
            ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(collection.name())
        .bind(id)
        .bind(&data)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn apply_update(
        conn: &mut SqliteConnection,
        collection: Collection,
        id: &str,
        fields: Fields,
        now: &str,
    ) -> Result<(), StoreError> {
        let mut doc = Self::fetch(conn, collection, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;
        merge_into(&mut doc, fields.resolve(now));
        Self::write(conn, collection, id, &doc).await
    }
}

impl DocumentStore for SqliteDocumentStore {
    async fn add(&self, collection: Collection, fields: Fields) -> Result<String, StoreError> {
        let id = Self::new_id();
        let doc = fields.resolve(&Self::now());
        let data = serde_json::to_string(&doc)?;

        sqlx::query("INSERT INTO documents (collection, id, data) VALUES (?, ?, ?)")
            .bind(collection.name())
            .bind(&id)
            .bind(&data)
            .execute(&self.pool)
            .await?;

        tracing::debug!(collection = %collection, %id, "document created");
        Ok(id)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, collection, id).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        Self::apply_update(&mut tx, collection, id, fields, &Self::now()).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
        merge: bool,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let incoming = fields.resolve(&Self::now());
        let doc = if merge {
            let mut existing = Self::fetch(&mut tx, collection, id)
                .await?
                .unwrap_or_default();
            merge_into(&mut existing, incoming);
            existing
        } else {
            incoming
        };

        Self::write(&mut tx, collection, id, &doc).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.name())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let rows: Vec<DocumentRow> =
            sqlx::query_as("SELECT id, data FROM documents WHERE collection = ?")
                .bind(query.collection.name())
                .fetch_all(&self.pool)
                .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            docs.push(DocumentSnapshot {
                id: row.id,
                data: serde_json::from_str(&row.data)?,
            });
        }
        Ok(query.apply(docs))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let now = Self::now();
        let mut tx = self.pool.begin().await?;
        // Dropping the transaction on error rolls every update back.
        for update in batch.into_updates() {
            Self::apply_update(&mut tx, update.collection, &update.id, update.fields, &now)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::{Direction, Filter};
    use crate::db::testing::TestContext;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_and_get() {
        let ctx = TestContext::new().await;
        let store = &ctx.store;

        let id = store
            .add(
                Collection::Recipes,
                Fields::new()
                    .set("title", "Pasta")
                    .server_timestamp("createdAt"),
            )
            .await
            .unwrap();
        assert!(!id.is_empty());

        let doc = store.get(Collection::Recipes, &id).await.unwrap().unwrap();
        assert_eq!(doc["title"], json!("Pasta"));
        assert!(doc["createdAt"].as_str().is_some());

        // Same id, different collection
        assert!(store
            .get(Collection::Ingredients, &id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let ctx = TestContext::new().await;

        let result = ctx
            .store
            .update(Collection::Recipes, "nope", Fields::new().set("title", "x"))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert!(ctx
            .store
            .get(Collection::Recipes, "nope")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let ctx = TestContext::new().await;
        let store = &ctx.store;

        let id = store
            .add(
                Collection::Recipes,
                Fields::new().set("title", "Soup").set("minutes", 10),
            )
            .await
            .unwrap();
        store
            .update(Collection::Recipes, &id, Fields::new().set("minutes", 25))
            .await
            .unwrap();

        let doc = store.get(Collection::Recipes, &id).await.unwrap().unwrap();
        assert_eq!(doc["title"], json!("Soup"));
        assert_eq!(doc["minutes"], json!(25));
    }

    #[tokio::test]
    async fn test_set_merge_preserves_other_fields() {
        let ctx = TestContext::new().await;
        let store = &ctx.store;

        let id = store
            .add(
                Collection::Cuisines,
                Fields::new().set("name", "Thai").set("count", 3),
            )
            .await
            .unwrap();

        store
            .set(
                Collection::Cuisines,
                &id,
                Fields::new().set("name", "Lao"),
                true,
            )
            .await
            .unwrap();
        let doc = store.get(Collection::Cuisines, &id).await.unwrap().unwrap();
        assert_eq!(doc["name"], json!("Lao"));
        assert_eq!(doc["count"], json!(3));

        store
            .set(
                Collection::Cuisines,
                &id,
                Fields::new().set("name", "Khmer"),
                false,
            )
            .await
            .unwrap();
        let doc = store.get(Collection::Cuisines, &id).await.unwrap().unwrap();
        assert_eq!(doc["name"], json!("Khmer"));
        assert!(!doc.contains_key("count"));
    }

    #[tokio::test]
    async fn test_set_creates_missing_document() {
        let ctx = TestContext::new().await;

        ctx.store
            .set(
                Collection::UserSettings,
                "user1",
                Fields::new().set("ingredientGroups", json!(["Other"])),
                true,
            )
            .await
            .unwrap();

        let doc = ctx
            .store
            .get(Collection::UserSettings, "user1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["ingredientGroups"], json!(["Other"]));
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let ctx = TestContext::new().await;
        let store = &ctx.store;

        for (user, name, order) in [("u1", "B", 1), ("u1", "A", 0), ("u2", "C", 0)] {
            store
                .add(
                    Collection::Cuisines,
                    Fields::new()
                        .set("userId", user)
                        .set("name", name)
                        .set("order", order),
                )
                .await
                .unwrap();
        }

        let docs = store
            .query(
                &Query::new(Collection::Cuisines)
                    .where_eq("userId", "u1")
                    .order_by("order", Direction::Ascending),
            )
            .await
            .unwrap();
        let names: Vec<&str> = docs
            .iter()
            .map(|d| d.data["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["A", "B"]);

        let none = store
            .query(&Query::new(Collection::Cuisines).filter(Filter::eq("userId", "u3")))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_commit_is_atomic() {
        let ctx = TestContext::new().await;
        let store = &ctx.store;

        let id = store
            .add(Collection::Cuisines, Fields::new().set("order", 5))
            .await
            .unwrap();

        let mut batch = WriteBatch::new();
        batch.update(Collection::Cuisines, &id, Fields::new().set("order", 0));
        batch.update(Collection::Cuisines, "missing", Fields::new().set("order", 1));

        let result = store.commit(batch).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));

        let doc = store.get(Collection::Cuisines, &id).await.unwrap().unwrap();
        assert_eq!(doc["order"], json!(5));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let ctx = TestContext::new().await;
        let store = &ctx.store;

        let id = store
            .add(Collection::Ingredients, Fields::new().set("name", "Egg"))
            .await
            .unwrap();
        store.delete(Collection::Ingredients, &id).await.unwrap();
        store.delete(Collection::Ingredients, &id).await.unwrap();
        assert!(store
            .get(Collection::Ingredients, &id)
            .await
            .unwrap()
            .is_none());
    }
}
