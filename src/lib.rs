//! Recipebox Library
//!
//! Document store, models, autosave drafts and row ordering shared by the
//! `recipebox` command line.

pub mod db;
pub mod draft;
pub mod identity;
pub mod models;
pub mod ordering;

pub use db::{
    init_db, CuisineRepository, DocumentStore, IngredientRepository, RecipeRepository,
    SettingsRepository, SqliteDocumentStore, StoreError,
};
pub use draft::{DraftError, DraftSession};
pub use identity::{ConfiguredUser, IdentityProvider};
pub use models::{Cuisine, Ingredient, Recipe, ShoppingList};
pub use ordering::{CuisineOrder, DropPosition, GroupOrder, OrderError, ReorderList};
