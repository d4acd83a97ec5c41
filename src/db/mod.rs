mod cuisine_repo;
mod ingredient_repo;
mod recipe_repo;
mod settings_repo;
mod sqlite;
mod store;
#[cfg(test)]
pub(crate) mod testing;

pub use cuisine_repo::{CuisineRepository, CuisineSort, CuisineView};
pub use ingredient_repo::IngredientRepository;
pub use recipe_repo::RecipeRepository;
pub use settings_repo::SettingsRepository;
pub use sqlite::SqliteDocumentStore;
pub use store::{
    Collection, Direction, Document, DocumentSnapshot, DocumentStore, FieldValue, Fields, Filter,
    FilterOp, Query, StoreError, WriteBatch,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations
pub async fn init_db(path: PathBuf) -> Result<SqlitePool, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());
    let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Rejects writes when nobody is signed in.
pub fn require_user(user_id: Option<&str>) -> Result<&str, StoreError> {
    user_id.ok_or(StoreError::NotSignedIn)
}
