use super::{DropPosition, OrderError, RejectReason, ReorderList, SentinelPolicy};
use crate::db::{DocumentStore, IngredientRepository, SettingsRepository, StoreError};
use crate::models::OTHER_GROUP;

/// Ingredient groups in display order, "Other" pinned last.
pub struct GroupOrder<S> {
    store: S,
    user_id: String,
    list: ReorderList,
}

impl<S: DocumentStore> GroupOrder<S> {
    pub fn new<I, T>(store: S, user_id: impl Into<String>, groups: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            store,
            user_id: user_id.into(),
            list: ReorderList::new(SentinelPolicy::Trailing(OTHER_GROUP.to_string()), groups),
        }
    }

    /// Loads the saved group order, writing the defaults on first use.
    pub async fn load(store: S, user_id: &str) -> Result<Self, StoreError> {
        let groups = SettingsRepository::new(&store, user_id).load_groups().await?;
        Ok(Self::new(store, user_id, groups))
    }

    pub fn list(&self) -> &ReorderList {
        &self.list
    }

    pub fn groups(&self) -> Vec<String> {
        self.list.rows().to_vec()
    }

    /// Reorders locally, then persists the whole list.
    pub async fn drop_row(
        &mut self,
        dragged: &str,
        target: &str,
        position: DropPosition,
    ) -> Result<(), OrderError> {
        if let Err(e) = self.list.apply_drop(dragged, target, position) {
            tracing::warn!(%dragged, %target, %position, error = %e, "group drop rejected");
            return Err(e);
        }
        self.persist().await
    }

    /// Writes the full ordered name list, "Other" last.
    pub async fn persist(&self) -> Result<(), OrderError> {
        let mut groups: Vec<String> = self.list.movable().map(str::to_string).collect();
        groups.push(OTHER_GROUP.to_string());

        let settings = SettingsRepository::new(&self.store, self.user_id.as_str());
        if let Err(e) = settings.save_groups(&groups).await {
            tracing::error!(error = %e, "failed to save ingredient groups");
            return Err(e.into());
        }
        Ok(())
    }

    /// Adds a group at the top. Returns false for blank or existing names.
    pub async fn add_group(&mut self, name: &str) -> Result<bool, OrderError> {
        let name = name.trim();
        if name.is_empty() || !self.list.insert_front(name) {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Deletes a group after moving its ingredients to "Other". Returns the
    /// number of ingredients moved.
    pub async fn delete_group(&mut self, name: &str) -> Result<usize, OrderError> {
        if self.list.is_sentinel(name) {
            return Err(OrderError::Rejected(RejectReason::SentinelNotDraggable));
        }
        if !self.list.contains(name) {
            return Err(OrderError::UnknownRow(name.to_string()));
        }

        let moved = IngredientRepository::new(&self.store, self.user_id.as_str())
            .recategorize(name, OTHER_GROUP)
            .await?;
        self.list.remove(name)?;
        self.persist().await?;
        tracing::info!(group = %name, moved, "ingredient group deleted");
        Ok(moved)
    }
}
