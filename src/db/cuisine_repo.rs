use serde::Serialize;
use std::cmp::Ordering;

use super::store::{Collection, Direction, DocumentStore, Fields, Query, StoreError};
use crate::models::{Cuisine, CuisineCounts, CuisineIcon, Recipe};

/// Name given to a freshly created cuisine.
pub const NEW_CUISINE_NAME: &str = "Cuisine";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CuisineSort {
    /// Saved drag-and-drop rank; unranked cuisines last.
    #[default]
    Order,
    Name,
    /// Creation time, newest first by default.
    Date,
    /// Recipe count, highest first by default.
    Count,
}

impl CuisineSort {
    pub fn default_direction(self) -> Direction {
        match self {
            CuisineSort::Order | CuisineSort::Name => Direction::Ascending,
            CuisineSort::Date | CuisineSort::Count => Direction::Descending,
        }
    }

    fn compare(self, a: &Cuisine, b: &Cuisine) -> Ordering {
        let by_name = || a.name.to_lowercase().cmp(&b.name.to_lowercase());
        match self {
            CuisineSort::Order => match (a.order, b.order) {
                (Some(x), Some(y)) => x.cmp(&y).then_with(by_name),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => by_name(),
            },
            CuisineSort::Name => by_name(),
            CuisineSort::Date => a.created_at.cmp(&b.created_at),
            CuisineSort::Count => a.count.cmp(&b.count).then_with(|| by_name().reverse()),
        }
    }

    /// Sorts in place; ties fall back to the name.
    pub fn sort(self, cuisines: &mut [Cuisine], direction: Direction) {
        cuisines.sort_by(|a, b| {
            let ord = self.compare(a, b);
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
    }
}

/// The cuisine list as shown to the user: the synthetic Favorites row's
/// count followed by the user's cuisines with recomputed counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CuisineView {
    pub favorites: u32,
    pub cuisines: Vec<Cuisine>,
}

pub struct CuisineRepository<S> {
    store: S,
    user_id: String,
}

impl<S: DocumentStore> CuisineRepository<S> {
    pub fn new(store: S, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
        }
    }

    pub async fn create(&self) -> Result<String, StoreError> {
        let id = self
            .store
            .add(
                Collection::Cuisines,
                Fields::new()
                    .set("userId", self.user_id.as_str())
                    .set("name", NEW_CUISINE_NAME)
                    .set("count", 0)
                    .server_timestamp("createdAt"),
            )
            .await?;
        tracing::info!(%id, "cuisine created");
        Ok(id)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Cuisine>, StoreError> {
        let doc = self.store.get(Collection::Cuisines, id).await?;
        Ok(doc
            .map(|data| Cuisine::from_document(id, &data))
            .filter(|cuisine| cuisine.user_id == self.user_id))
    }

    /// Loads cuisines with counts recomputed from the user's recipes.
    pub async fn list(
        &self,
        sort: CuisineSort,
        direction: Option<Direction>,
    ) -> Result<CuisineView, StoreError> {
        let mut cuisines: Vec<Cuisine> = self
            .store
            .query(&Query::new(Collection::Cuisines).where_eq("userId", self.user_id.as_str()))
            .await?
            .into_iter()
            .map(|snap| Cuisine::from_document(snap.id, &snap.data))
            .collect();

        let recipes: Vec<Recipe> = self
            .store
            .query(&Query::new(Collection::Recipes).where_eq("userId", self.user_id.as_str()))
            .await?
            .into_iter()
            .map(|snap| Recipe::from_document(snap.id, &snap.data))
            .collect();

        let counts = CuisineCounts::from_recipes(&recipes);
        counts.apply(&mut cuisines);
        sort.sort(
            &mut cuisines,
            direction.unwrap_or_else(|| sort.default_direction()),
        );

        Ok(CuisineView {
            favorites: counts.favorites(),
            cuisines,
        })
    }

    pub async fn rename(&self, id: &str, name: &str) -> Result<(), StoreError> {
        self.store
            .update(Collection::Cuisines, id, Fields::new().set("name", name.trim()))
            .await
    }

    pub async fn set_icon(&self, id: &str, icon: &CuisineIcon) -> Result<(), StoreError> {
        self.store
            .update(
                Collection::Cuisines,
                id,
                Fields::new().set("iconUrl", icon.to_stored()),
            )
            .await
    }

    /// Deletes the cuisine only. Recipes keep their references; readers
    /// drop ids that no longer resolve.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(Collection::Cuisines, id).await?;
        tracing::info!(%id, "cuisine deleted");
        Ok(())
    }
}
