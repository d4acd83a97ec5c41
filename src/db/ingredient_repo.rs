use serde_json::Value;

use super::store::{Collection, DocumentStore, Fields, Filter, Query, StoreError, WriteBatch};
use crate::models::{group_by_category, DocumentExt, GroupSection, Ingredient, ShoppingList};

pub struct IngredientRepository<S> {
    store: S,
    user_id: String,
}

impl<S: DocumentStore> IngredientRepository<S> {
    pub fn new(store: S, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
        }
    }

    fn owned(&self) -> Query {
        Query::new(Collection::Ingredients).where_eq("userId", self.user_id.as_str())
    }

    async fn fetch(&self, query: Query) -> Result<Vec<Ingredient>, StoreError> {
        let mut ingredients: Vec<Ingredient> = self
            .store
            .query(&query)
            .await?
            .into_iter()
            .map(|snap| Ingredient::from_document(snap.id, &snap.data))
            .collect();
        ingredients.sort_by_key(|i| i.name.to_lowercase());
        Ok(ingredients)
    }

    /// All of the user's ingredients, sorted by name.
    pub async fn list(&self) -> Result<Vec<Ingredient>, StoreError> {
        self.fetch(self.owned()).await
    }

    /// Ingredients partitioned by category in the given group order.
    pub async fn grouped(&self, groups: &[String]) -> Result<Vec<GroupSection>, StoreError> {
        Ok(group_by_category(groups, self.list().await?))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Ingredient>, StoreError> {
        let doc = self.store.get(Collection::Ingredients, id).await?;
        Ok(doc
            .map(|data| Ingredient::from_document(id, &data))
            .filter(|ingredient| ingredient.user_id == self.user_id))
    }

    pub async fn set_to_buy(&self, id: &str, to_buy: bool) -> Result<(), StoreError> {
        self.store
            .update(
                Collection::Ingredients,
                id,
                Fields::new()
                    .set("toBuy", to_buy)
                    .server_timestamp("updatedAt"),
            )
            .await
    }

    pub async fn shopping_list(&self, groups: &[String]) -> Result<ShoppingList, StoreError> {
        let to_buy = self.fetch(self.owned().where_eq("toBuy", true)).await?;
        Ok(ShoppingList::new(groups, to_buy))
    }

    /// Deletes an ingredient after unlinking it from every recipe that
    /// references it. Returns the number of recipes touched.
    pub async fn delete(&self, id: &str) -> Result<usize, StoreError> {
        let linked = self
            .store
            .query(
                &Query::new(Collection::Recipes)
                    .where_eq("userId", self.user_id.as_str())
                    .filter(Filter::array_contains("relatedIngredients", id)),
            )
            .await?;

        let mut batch = WriteBatch::new();
        for recipe in &linked {
            let remaining: Vec<Value> = recipe
                .data
                .string_list("relatedIngredients")
                .into_iter()
                .filter(|related| related != id)
                .map(Value::String)
                .collect();
            batch.update(
                Collection::Recipes,
                recipe.id.as_str(),
                Fields::new()
                    .set("relatedIngredients", remaining)
                    .server_timestamp("updatedAt"),
            );
        }

        let touched = batch.len();
        if !batch.is_empty() {
            self.store.commit(batch).await?;
        }
        self.store.delete(Collection::Ingredients, id).await?;
        tracing::info!(%id, recipes = touched, "ingredient deleted");
        Ok(touched)
    }

    /// Moves every ingredient in category `from` to `to` in one batch.
    pub async fn recategorize(&self, from: &str, to: &str) -> Result<usize, StoreError> {
        let docs = self
            .store
            .query(&self.owned().where_eq("category", from))
            .await?;

        let mut batch = WriteBatch::new();
        for doc in &docs {
            batch.update(
                Collection::Ingredients,
                doc.id.as_str(),
                Fields::new()
                    .set("category", to)
                    .server_timestamp("updatedAt"),
            );
        }
        let moved = batch.len();
        self.store.commit(batch).await?;
        Ok(moved)
    }
}
