use serde_json::Value;

use super::store::{Collection, DocumentStore, Fields, Query, StoreError};
use crate::models::{CuisineRef, Recipe};

pub struct RecipeRepository<S> {
    store: S,
    user_id: String,
}

impl<S: DocumentStore> RecipeRepository<S> {
    pub fn new(store: S, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
        }
    }

    /// The user's recipes, newest first.
    pub async fn list(&self) -> Result<Vec<Recipe>, StoreError> {
        let docs = self
            .store
            .query(&Query::new(Collection::Recipes).where_eq("userId", self.user_id.as_str()))
            .await?;

        let mut recipes: Vec<Recipe> = docs
            .into_iter()
            .map(|snap| Recipe::from_document(snap.id, &snap.data))
            .collect();
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recipes)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Recipe>, StoreError> {
        let doc = self.store.get(Collection::Recipes, id).await?;
        Ok(doc
            .map(|data| Recipe::from_document(id, &data))
            .filter(|recipe| recipe.user_id == self.user_id))
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(Collection::Recipes, id).await?;
        tracing::info!(%id, "recipe deleted");
        Ok(())
    }

    /// Copies a recipe under the title "<title> Copy". Linked ingredients
    /// are not copied.
    pub async fn duplicate(&self, id: &str) -> Result<Option<String>, StoreError> {
        let Some(source) = self.get(id).await? else {
            return Ok(None);
        };

        let fields = Fields::new()
            .set("userId", self.user_id.as_str())
            .set("title", format!("{} Copy", source.title))
            .set("cuisines", CuisineRef::list_to_value(&source.cuisines))
            .set("cuisine", CuisineRef::legacy_name(&source.cuisines))
            .set("minutes", source.minutes)
            .set("servings", source.servings)
            .set("ingredients", source.ingredients.as_str())
            .set("instructions", source.instructions.as_str())
            .set("rating", source.rating)
            .set("imageUrl", source.image_url.unwrap_or_default())
            .set("imagePosition", serde_json::json!({ "top": source.image_position.top }))
            .server_timestamp("createdAt")
            .server_timestamp("updatedAt");

        let new_id = self.store.add(Collection::Recipes, fields).await?;
        tracing::info!(source = %id, id = %new_id, "recipe duplicated");
        Ok(Some(new_id))
    }

    /// Adds or removes the "Favorites" entry. Returns false if the recipe
    /// was already in the requested state.
    pub async fn set_favorite(&self, id: &str, favorite: bool) -> Result<bool, StoreError> {
        let recipe = self.get(id).await?.ok_or_else(|| StoreError::NotFound {
            collection: Collection::Recipes,
            id: id.to_string(),
        })?;
        if recipe.is_favorite() == favorite {
            return Ok(false);
        }

        let mut cuisines: Vec<CuisineRef> = recipe
            .cuisines
            .into_iter()
            .filter(|c| !c.is_favorites())
            .collect();
        if favorite {
            cuisines.push(CuisineRef::favorites());
        }

        self.store
            .update(
                Collection::Recipes,
                id,
                Fields::new()
                    .set("cuisines", CuisineRef::list_to_value(&cuisines))
                    .set("cuisine", Value::String(CuisineRef::legacy_name(&cuisines)))
                    .server_timestamp("updatedAt"),
            )
            .await?;
        Ok(true)
    }
}
