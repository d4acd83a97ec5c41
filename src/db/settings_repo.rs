use serde_json::Value;

use super::store::{Collection, DocumentStore, Fields, StoreError};
use crate::models::{normalize_groups, UserSettings};

pub struct SettingsRepository<S> {
    store: S,
    user_id: String,
}

impl<S: DocumentStore> SettingsRepository<S> {
    pub fn new(store: S, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
        }
    }

    /// Loads the ingredient group order, writing the defaults the first
    /// time a user has none.
    pub async fn load_groups(&self) -> Result<Vec<String>, StoreError> {
        let doc = self
            .store
            .get(Collection::UserSettings, &self.user_id)
            .await?;

        let has_groups = doc
            .as_ref()
            .and_then(|d| d.get("ingredientGroups"))
            .and_then(Value::as_array)
            .is_some_and(|groups| !groups.is_empty());

        let settings = doc
            .as_ref()
            .map(UserSettings::from_document)
            .unwrap_or_default();

        if !has_groups {
            tracing::debug!(user = %self.user_id, "writing default ingredient groups");
            self.save_groups(&settings.ingredient_groups).await?;
        }
        Ok(settings.ingredient_groups)
    }

    /// Writes the full group list; "Other" is forced last.
    pub async fn save_groups(&self, groups: &[String]) -> Result<(), StoreError> {
        let groups = normalize_groups(groups);
        self.store
            .set(
                Collection::UserSettings,
                &self.user_id,
                Fields::new().set("ingredientGroups", groups),
                true,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::TestContext;
    use crate::models::DEFAULT_GROUPS;
    use serde_json::json;

    #[tokio::test]
    async fn test_first_load_writes_defaults() {
        let ctx = TestContext::new().await;
        let repo = SettingsRepository::new(&ctx.store, "u1");

        let groups = repo.load_groups().await.unwrap();
        assert_eq!(groups, DEFAULT_GROUPS);

        let doc = ctx
            .store
            .get(Collection::UserSettings, "u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["ingredientGroups"], json!(DEFAULT_GROUPS));
    }

    #[tokio::test]
    async fn test_save_keeps_other_last_and_preserves_fields() {
        let ctx = TestContext::new().await;
        ctx.store
            .set(
                Collection::UserSettings,
                "u1",
                Fields::new().set("theme", "dark"),
                false,
            )
            .await
            .unwrap();

        let repo = SettingsRepository::new(&ctx.store, "u1");
        repo.save_groups(&["Other".to_string(), "Herbs".to_string()])
            .await
            .unwrap();

        assert_eq!(repo.load_groups().await.unwrap(), vec!["Herbs", "Other"]);
        let doc = ctx
            .store
            .get(Collection::UserSettings, "u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["theme"], json!("dark"));
    }
}
