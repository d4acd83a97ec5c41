use super::{DropPosition, OrderError, ReorderList, SentinelPolicy};
use crate::db::{
    Collection, CuisineRepository, CuisineSort, DocumentStore, Fields, StoreError, WriteBatch,
};

/// Row id of the synthetic Favorites row pinned at the top.
pub const FAVORITES_ROW: &str = "FAVORITES";

/// Cuisine rows ordered by their `order` rank.
pub struct CuisineOrder<S> {
    store: S,
    list: ReorderList,
}

impl<S: DocumentStore> CuisineOrder<S> {
    pub fn new<I, T>(store: S, cuisine_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            store,
            list: ReorderList::new(SentinelPolicy::Leading(FAVORITES_ROW.to_string()), cuisine_ids),
        }
    }

    /// Loads the user's cuisines in their saved order.
    pub async fn load(store: S, user_id: &str) -> Result<Self, StoreError> {
        let view = CuisineRepository::new(&store, user_id)
            .list(CuisineSort::Order, None)
            .await?;
        let ids: Vec<String> = view.cuisines.into_iter().map(|c| c.id).collect();
        Ok(Self::new(store, ids))
    }

    pub fn list(&self) -> &ReorderList {
        &self.list
    }

    /// Reorders locally, then persists the whole order.
    ///
    /// A rejected drop changes nothing. When the write fails the local
    /// order is kept and the error is returned.
    pub async fn drop_row(
        &mut self,
        dragged: &str,
        target: &str,
        position: DropPosition,
    ) -> Result<(), OrderError> {
        if let Err(e) = self.list.apply_drop(dragged, target, position) {
            tracing::warn!(%dragged, %target, %position, error = %e, "cuisine drop rejected");
            return Err(e);
        }
        self.persist().await
    }

    /// Writes `order = index` for every cuisine row in one batch.
    pub async fn persist(&self) -> Result<(), OrderError> {
        let mut batch = WriteBatch::new();
        for (index, id) in self.list.movable().enumerate() {
            batch.update(Collection::Cuisines, id, Fields::new().set("order", index));
        }

        let rows = batch.len();
        if let Err(e) = self.store.commit(batch).await {
            tracing::error!(error = %e, "failed to save cuisine order");
            return Err(e.into());
        }
        tracing::debug!(rows, "cuisine order saved");
        Ok(())
    }
}
