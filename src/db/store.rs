//! Document store abstraction.
//!
//! The application only talks to persistence through [`DocumentStore`]:
//! per-document CRUD, filtered queries and atomic write batches over a
//! handful of named collections. Documents are JSON objects.

use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A stored document body.
pub type Document = Map<String, Value>;

/// Collections used by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Recipes,
    Ingredients,
    Cuisines,
    UserSettings,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Recipes => "recipes",
            Collection::Ingredients => "ingredients",
            Collection::Cuisines => "cuisines",
            Collection::UserSettings => "userSettings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors returned by store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Malformed document data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No document to update: {collection}/{id}")]
    NotFound { collection: Collection, id: String },

    #[error("Not signed in (set user_id in the config file or RECIPEBOX_USER_ID)")]
    NotSignedIn,
}

/// A single field value in a write.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(Value),
    /// Replaced by the store's current time when the write is applied.
    ServerTimestamp,
}

/// An ordered set of field writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), FieldValue::Value(value.into()));
        self
    }

    pub fn server_timestamp(mut self, key: impl Into<String>) -> Self {
        self.0.insert(key.into(), FieldValue::ServerTimestamp);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the writes into plain JSON, stamping server timestamps with `now`.
    pub fn resolve(self, now: &str) -> Document {
        self.0
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    FieldValue::Value(v) => v,
                    FieldValue::ServerTimestamp => Value::String(now.to_string()),
                };
                (key, value)
            })
            .collect()
    }
}

/// Shallow-merges `fields` over `target`.
pub fn merge_into(target: &mut Document, fields: Document) {
    for (key, value) in fields {
        target.insert(key, value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    ArrayContains,
}

/// A `where(field, op, value)` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    pub fn array_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::ArrayContains, value)
    }

    /// Returns true if `doc` satisfies this clause. Missing fields never match.
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = doc.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => compare_values(actual, &self.value) == Some(Ordering::Equal),
            FilterOp::Lt => compare_values(actual, &self.value) == Some(Ordering::Less),
            FilterOp::Le => matches!(
                compare_values(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::Gt => compare_values(actual, &self.value) == Some(Ordering::Greater),
            FilterOp::Ge => matches!(
                compare_values(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::ArrayContains => actual
                .as_array()
                .is_some_and(|items| items.contains(&self.value)),
        }
    }
}

/// Orders two JSON values of the same kind. Values of different kinds are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            (a == b).then_some(Ordering::Equal)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A collection query: all filters must match.
///
/// When ordered, documents lacking the order field are excluded and ties
/// are broken by document id.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: Collection,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(field, value))
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Applies the filters and ordering to an unordered set of documents.
    pub fn apply(&self, docs: Vec<DocumentSnapshot>) -> Vec<DocumentSnapshot> {
        let mut matched: Vec<DocumentSnapshot> = docs
            .into_iter()
            .filter(|snap| self.filters.iter().all(|f| f.matches(&snap.data)))
            .collect();

        match &self.order_by {
            Some(order) => {
                matched.retain(|snap| snap.data.contains_key(&order.field));
                matched.sort_by(|a, b| {
                    let ord = compare_values(&a.data[&order.field], &b.data[&order.field])
                        .unwrap_or(Ordering::Equal);
                    let ord = match order.direction {
                        Direction::Ascending => ord,
                        Direction::Descending => ord.reverse(),
                    };
                    ord.then_with(|| a.id.cmp(&b.id))
                });
            }
            None => matched.sort_by(|a, b| a.id.cmp(&b.id)),
        }
        matched
    }
}

/// A document returned by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    pub data: Document,
}

/// A pending update inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchUpdate {
    pub collection: Collection,
    pub id: String,
    pub fields: Fields,
}

/// Updates committed atomically: either every update applies or none does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    updates: Vec<BatchUpdate>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, collection: Collection, id: impl Into<String>, fields: Fields) {
        self.updates.push(BatchUpdate {
            collection,
            id: id.into(),
            fields,
        });
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn into_updates(self) -> Vec<BatchUpdate> {
        self.updates
    }
}

/// Remote document database.
///
/// `update` fails with [`StoreError::NotFound`] when the document does not
/// exist; `set` creates it. `delete` of a missing document succeeds.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    async fn add(&self, collection: Collection, fields: Fields) -> Result<String, StoreError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    async fn update(&self, collection: Collection, id: &str, fields: Fields)
        -> Result<(), StoreError>;

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
        merge: bool,
    ) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;

    async fn query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, StoreError>;

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    async fn add(&self, collection: Collection, fields: Fields) -> Result<String, StoreError> {
        (**self).add(collection, fields).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        (**self).get(collection, id).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        (**self).update(collection, id, fields).await
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
        merge: bool,
    ) -> Result<(), StoreError> {
        (**self).set(collection, id, fields, merge).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        (**self).delete(collection, id).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, StoreError> {
        (**self).query(query).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        (**self).commit(batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snap(id: &str, data: Value) -> DocumentSnapshot {
        DocumentSnapshot {
            id: id.to_string(),
            data: data.as_object().unwrap().clone(),
        }
    }

    #[test]
    fn test_fields_resolve_server_timestamp() {
        let doc = Fields::new()
            .set("title", "Pasta")
            .server_timestamp("updatedAt")
            .resolve("2026-01-01T00:00:00+00:00");

        assert_eq!(doc["title"], json!("Pasta"));
        assert_eq!(doc["updatedAt"], json!("2026-01-01T00:00:00+00:00"));
    }

    #[test]
    fn test_filter_matches() {
        let doc = json!({"userId": "u1", "minutes": 20, "relatedIngredients": ["a", "b"]});
        let doc = doc.as_object().unwrap();

        assert!(Filter::eq("userId", "u1").matches(doc));
        assert!(!Filter::eq("userId", "u2").matches(doc));
        assert!(Filter::new("minutes", FilterOp::Gt, 10).matches(doc));
        assert!(Filter::new("minutes", FilterOp::Le, 20).matches(doc));
        assert!(!Filter::new("minutes", FilterOp::Lt, 20).matches(doc));
        assert!(Filter::array_contains("relatedIngredients", "b").matches(doc));
        assert!(!Filter::array_contains("relatedIngredients", "c").matches(doc));
        assert!(!Filter::eq("missing", "x").matches(doc));
    }

    #[test]
    fn test_query_orders_and_excludes_missing_field() {
        let docs = vec![
            snap("c", json!({"order": 0})),
            snap("a", json!({"order": 2})),
            snap("b", json!({"name": "no order"})),
            snap("d", json!({"order": 1})),
        ];

        let ordered = Query::new(Collection::Cuisines)
            .order_by("order", Direction::Ascending)
            .apply(docs.clone());
        let ids: Vec<&str> = ordered.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d", "a"]);

        let desc = Query::new(Collection::Cuisines)
            .order_by("order", Direction::Descending)
            .apply(docs);
        assert_eq!(desc[0].id, "a");
    }

    #[test]
    fn test_write_batch_collects_updates() {
        let mut batch = WriteBatch::new();
        assert!(batch.is_empty());
        batch.update(Collection::Cuisines, "c1", Fields::new().set("order", 0));
        batch.update(Collection::Cuisines, "c2", Fields::new().set("order", 1));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.into_updates()[1].id, "c2");
    }
}
