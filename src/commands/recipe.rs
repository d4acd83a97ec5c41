use clap::{Args, Subcommand};

use super::{confirm, truncate, OutputFormat};
use recipebox::db::{
    require_user, CuisineRepository, CuisineSort, DocumentStore, IngredientRepository,
    RecipeRepository,
};
use recipebox::draft::{DraftSession, RecipeField, RecipeForm};
use recipebox::identity::IdentityProvider;
use recipebox::models::{stars, CuisineRef, ImagePosition, Recipe, FAVORITES, MAX_RATING};

#[derive(Args)]
pub struct RecipeCommand {
    #[command(subcommand)]
    pub command: RecipeSubcommand,
}

/// Values for `new` and `edit`; each one given is saved as its own edit.
#[derive(Args, Clone, Default)]
pub struct RecipeFields {
    /// Recipe title
    #[arg(long)]
    title: Option<String>,

    /// Cuisine ID or name (can be repeated; replaces the current cuisines)
    #[arg(long = "cuisine", value_name = "CUISINE")]
    cuisines: Vec<String>,

    /// Total time in minutes
    #[arg(long)]
    minutes: Option<i64>,

    /// Number of servings
    #[arg(long)]
    servings: Option<i64>,

    /// Ingredient list as free text
    #[arg(long)]
    ingredients: Option<String>,

    /// Cooking instructions
    #[arg(long)]
    instructions: Option<String>,

    /// Rating from 0 to 5 stars
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=MAX_RATING as i64))]
    rating: Option<u8>,

    /// Cover image URL
    #[arg(long)]
    image_url: Option<String>,

    /// Remove the cover image
    #[arg(long, conflicts_with = "image_url")]
    remove_image: bool,

    /// Vertical offset of the cover image, e.g. "-40px"
    #[arg(long, value_name = "OFFSET", allow_hyphen_values = true)]
    image_top: Option<String>,

    /// Link an ingredient by ID or name (can be repeated)
    #[arg(long = "ingredient", value_name = "INGREDIENT")]
    link: Vec<String>,

    /// Unlink an ingredient by ID or name (can be repeated)
    #[arg(long = "unlink-ingredient", value_name = "INGREDIENT")]
    unlink: Vec<String>,
}

impl RecipeFields {
    fn has_values(&self) -> bool {
        self.title.is_some()
            || !self.cuisines.is_empty()
            || self.minutes.is_some()
            || self.servings.is_some()
            || self.ingredients.is_some()
            || self.instructions.is_some()
            || self.rating.is_some()
            || self.image_url.is_some()
            || self.remove_image
            || self.image_top.is_some()
            || !self.link.is_empty()
            || !self.unlink.is_empty()
    }
}

#[derive(Subcommand)]
pub enum RecipeSubcommand {
    /// Create a new recipe
    New {
        #[command(flatten)]
        fields: RecipeFields,
    },

    /// Edit an existing recipe
    Edit {
        /// Recipe ID or title
        identifier: String,

        #[command(flatten)]
        fields: RecipeFields,
    },

    /// List all recipes, newest first
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only show favorites
        #[arg(long)]
        favorites: bool,
    },

    /// Show a recipe's details
    Show {
        /// Recipe ID or title
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a recipe
    Delete {
        /// Recipe ID or title
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Copy a recipe under a new title
    Duplicate {
        /// Recipe ID or title
        identifier: String,
    },

    /// Add a recipe to Favorites
    Favorite {
        /// Recipe ID or title
        identifier: String,
    },

    /// Remove a recipe from Favorites
    Unfavorite {
        /// Recipe ID or title
        identifier: String,
    },
}

impl RecipeCommand {
    pub async fn run<S, I>(&self, store: &S, identity: &I) -> Result<(), Box<dyn std::error::Error>>
    where
        S: DocumentStore,
        I: IdentityProvider,
    {
        let user_id = require_user(identity.current_user_id())?;
        let repo = RecipeRepository::new(store, user_id);

        match &self.command {
            RecipeSubcommand::New { fields } => {
                if !fields.has_values() {
                    return Err("Nothing to save. Provide at least one field.".into());
                }

                let session: DraftSession<_, _, RecipeForm> = DraftSession::new(store, identity);
                session.open_for_create();
                let id = save_fields(&session, store, user_id, fields).await?;

                let Some(id) = id else {
                    return Err("Nothing to save. Provide at least one field besides links.".into());
                };
                let created = find_recipe(&repo, &id).await?;
                println!("Created recipe:");
                println!("{}", created);
                Ok(())
            }

            RecipeSubcommand::Edit { identifier, fields } => {
                if !fields.has_values() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }
                let recipe = find_recipe(&repo, identifier).await?;

                let session: DraftSession<_, _, RecipeForm> = DraftSession::new(store, identity);
                if !session.open_for_edit(&recipe.id).await? {
                    return Err(format!("Recipe not found: {}", identifier).into());
                }
                save_fields(&session, store, user_id, fields).await?;

                let updated = find_recipe(&repo, &recipe.id).await?;
                println!("Updated recipe:");
                println!("{}", updated);
                Ok(())
            }

            RecipeSubcommand::List { format, favorites } => {
                let mut recipes = repo.list().await?;
                if *favorites {
                    recipes.retain(Recipe::is_favorite);
                }
                drop_deleted_cuisines(store, user_id, &mut recipes).await?;

                if recipes.is_empty() {
                    println!("No recipes found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&recipes)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<32}  {:<30}  {:<5}  CUISINES", "ID", "TITLE", "STARS");
                        println!("{}", "-".repeat(90));
                        for recipe in &recipes {
                            let cuisines: Vec<&str> =
                                recipe.cuisines.iter().map(CuisineRef::name).collect();
                            println!(
                                "{:<32}  {:<30}  {:<5}  {}",
                                recipe.id,
                                truncate(recipe.display_title(), 30),
                                stars(recipe.rating),
                                cuisines.join(", ")
                            );
                        }
                        println!("\nTotal: {} recipe(s)", recipes.len());
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Show { identifier, format } => {
                let mut recipe = find_recipe(&repo, identifier).await?;
                drop_deleted_cuisines(store, user_id, std::slice::from_mut(&mut recipe)).await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&recipe)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", recipe);
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Delete { identifier, force } => {
                let recipe = find_recipe(&repo, identifier).await?;

                if !force && !confirm(&format!("Delete recipe '{}'?", recipe.display_title()))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                repo.delete(&recipe.id).await?;
                println!("Deleted recipe: {}", recipe.display_title());
                Ok(())
            }

            RecipeSubcommand::Duplicate { identifier } => {
                let recipe = find_recipe(&repo, identifier).await?;
                match repo.duplicate(&recipe.id).await? {
                    Some(new_id) => {
                        println!("Duplicated '{}' as {}", recipe.display_title(), new_id);
                        Ok(())
                    }
                    None => Err(format!("Recipe not found: {}", identifier).into()),
                }
            }

            RecipeSubcommand::Favorite { identifier } => {
                let recipe = find_recipe(&repo, identifier).await?;
                if repo.set_favorite(&recipe.id, true).await? {
                    println!("Added '{}' to {}", recipe.display_title(), FAVORITES);
                } else {
                    println!("'{}' is already in {}", recipe.display_title(), FAVORITES);
                }
                Ok(())
            }

            RecipeSubcommand::Unfavorite { identifier } => {
                let recipe = find_recipe(&repo, identifier).await?;
                if repo.set_favorite(&recipe.id, false).await? {
                    println!("Removed '{}' from {}", recipe.display_title(), FAVORITES);
                } else {
                    println!("'{}' is not in {}", recipe.display_title(), FAVORITES);
                }
                Ok(())
            }
        }
    }
}

/// Looks a recipe up by ID, then by title (case-insensitive).
async fn find_recipe<S: DocumentStore>(
    repo: &RecipeRepository<S>,
    identifier: &str,
) -> Result<Recipe, Box<dyn std::error::Error>> {
    if let Some(recipe) = repo.get(identifier).await? {
        return Ok(recipe);
    }
    repo.list()
        .await?
        .into_iter()
        .find(|r| r.title.eq_ignore_ascii_case(identifier.trim()))
        .ok_or_else(|| format!("Recipe not found: {}", identifier).into())
}

/// Removes references to cuisines that were deleted after the recipe was
/// saved. The stored recipes are left as they are.
async fn drop_deleted_cuisines<L: DocumentStore>(
    store: &L,
    user_id: &str,
    recipes: &mut [Recipe],
) -> Result<(), Box<dyn std::error::Error>> {
    let known: Vec<String> = CuisineRepository::new(store, user_id)
        .list(CuisineSort::Name, None)
        .await?
        .cuisines
        .into_iter()
        .map(|c| c.id)
        .collect();
    for recipe in recipes {
        recipe.cuisines = recipe.live_cuisines(&known).cloned().collect();
    }
    Ok(())
}

/// Autosaves each given field, applies link changes, then closes the panel.
/// Returns the draft's ID, or `None` if no document was ever created.
async fn save_fields<S, I, L>(
    session: &DraftSession<S, I, RecipeForm>,
    store: &L,
    user_id: &str,
    fields: &RecipeFields,
) -> Result<Option<String>, Box<dyn std::error::Error>>
where
    S: DocumentStore,
    I: IdentityProvider,
    L: DocumentStore,
{
    let mut edits = Vec::new();
    if let Some(title) = &fields.title {
        edits.push(RecipeField::Title(title.clone()));
    }
    if !fields.cuisines.is_empty() {
        let mut cuisines = resolve_cuisines(store, user_id, &fields.cuisines).await?;
        // Favorites is managed by favorite/unfavorite; keep it.
        let favorite = session
            .form_snapshot()
            .cuisines
            .iter()
            .any(CuisineRef::is_favorites);
        if favorite && !cuisines.iter().any(CuisineRef::is_favorites) {
            cuisines.push(CuisineRef::favorites());
        }
        edits.push(RecipeField::Cuisines(cuisines));
    }
    if let Some(minutes) = fields.minutes {
        edits.push(RecipeField::Minutes(minutes));
    }
    if let Some(servings) = fields.servings {
        edits.push(RecipeField::Servings(servings));
    }
    if let Some(ingredients) = &fields.ingredients {
        edits.push(RecipeField::Ingredients(ingredients.clone()));
    }
    if let Some(instructions) = &fields.instructions {
        edits.push(RecipeField::Instructions(instructions.clone()));
    }
    if let Some(rating) = fields.rating {
        edits.push(RecipeField::Rating(rating));
    }
    if let Some(url) = &fields.image_url {
        edits.push(RecipeField::ImageUrl(Some(url.clone())));
    }
    if fields.remove_image {
        edits.push(RecipeField::ImageUrl(None));
    }
    if let Some(top) = &fields.image_top {
        edits.push(RecipeField::ImagePosition(ImagePosition { top: top.clone() }));
    }

    for edit in edits {
        session.autosave_field(edit).await?;
    }

    if !fields.link.is_empty() || !fields.unlink.is_empty() {
        let ingredients = IngredientRepository::new(store, user_id).list().await?;
        let lookup = |identifier: &String| {
            ingredients
                .iter()
                .find(|i| i.id == *identifier || i.name.eq_ignore_ascii_case(identifier.trim()))
                .map(|i| i.id.clone())
                .ok_or_else(|| format!("Ingredient not found: {}", identifier))
        };
        for identifier in &fields.link {
            let id = lookup(identifier)?;
            session.edit_form(|form| form.select_ingredient(id));
        }
        for identifier in &fields.unlink {
            let id = lookup(identifier)?;
            session.edit_form(|form| form.deselect_ingredient(&id));
        }
    }

    let id = session.active_id();
    session.close().await?;
    Ok(id)
}

/// Maps cuisine IDs or names to stored cuisine references. "Favorites"
/// maps to the synthetic favorites entry.
async fn resolve_cuisines<L: DocumentStore>(
    store: &L,
    user_id: &str,
    identifiers: &[String],
) -> Result<Vec<CuisineRef>, Box<dyn std::error::Error>> {
    let view = CuisineRepository::new(store, user_id)
        .list(CuisineSort::Name, None)
        .await?;

    let mut refs: Vec<CuisineRef> = Vec::new();
    for identifier in identifiers {
        let identifier = identifier.trim();
        let cuisine_ref = if identifier.eq_ignore_ascii_case(FAVORITES) {
            CuisineRef::favorites()
        } else {
            let cuisine = view
                .cuisines
                .iter()
                .find(|c| c.id == identifier || c.name.eq_ignore_ascii_case(identifier))
                .ok_or_else(|| format!("Cuisine not found: {}", identifier))?;
            CuisineRef::Ref {
                id: cuisine.id.clone(),
                name: cuisine.name.clone(),
            }
        };
        if !refs.contains(&cuisine_ref) {
            refs.push(cuisine_ref);
        }
    }
    Ok(refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::TestContext;
    use recipebox::db::{Collection, Fields};
    use recipebox::identity::ConfiguredUser;

    async fn add_cuisine(ctx: &TestContext, name: &str) -> String {
        ctx.store
            .add(
                Collection::Cuisines,
                Fields::new().set("userId", "u1").set("name", name),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_recipe_saves_given_fields() {
        let ctx = TestContext::new().await;
        let thai = add_cuisine(&ctx, "Thai").await;
        let user = ConfiguredUser::signed_in("u1");

        let fields = RecipeFields {
            title: Some("Pad Thai".into()),
            cuisines: vec!["thai".into()],
            minutes: Some(25),
            rating: Some(4),
            image_top: Some("-40px".into()),
            ..Default::default()
        };
        let session: DraftSession<_, _, RecipeForm> = DraftSession::new(&ctx.store, &user);
        session.open_for_create();
        let id = save_fields(&session, &ctx.store, "u1", &fields)
            .await
            .unwrap()
            .unwrap();

        let recipe = RecipeRepository::new(&ctx.store, "u1")
            .get(&id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(recipe.title, "Pad Thai");
        assert_eq!(recipe.minutes, 25);
        assert_eq!(recipe.rating, 4);
        assert_eq!(recipe.image_position.top, "-40px");
        assert_eq!(
            recipe.cuisines,
            vec![CuisineRef::Ref {
                id: thai,
                name: "Thai".into()
            }]
        );
        assert!(recipe.created_at.is_some());
    }

    #[tokio::test]
    async fn test_edit_cuisines_keeps_favorite() {
        let ctx = TestContext::new().await;
        add_cuisine(&ctx, "Thai").await;
        let user = ConfiguredUser::signed_in("u1");
        let repo = RecipeRepository::new(&ctx.store, "u1");

        let session: DraftSession<_, _, RecipeForm> = DraftSession::new(&ctx.store, &user);
        session.open_for_create();
        let fields = RecipeFields {
            title: Some("Curry".into()),
            ..Default::default()
        };
        let id = save_fields(&session, &ctx.store, "u1", &fields)
            .await
            .unwrap()
            .unwrap();
        repo.set_favorite(&id, true).await.unwrap();

        assert!(session.open_for_edit(&id).await.unwrap());
        let fields = RecipeFields {
            cuisines: vec!["Thai".into()],
            ..Default::default()
        };
        save_fields(&session, &ctx.store, "u1", &fields).await.unwrap();

        let recipe = repo.get(&id).await.unwrap().unwrap();
        assert!(recipe.is_favorite());
        assert_eq!(recipe.cuisines[0].name(), "Thai");
        assert_eq!(recipe.title, "Curry");
    }

    #[tokio::test]
    async fn test_unknown_cuisine_is_an_error() {
        let ctx = TestContext::new().await;
        let result = resolve_cuisines(&ctx.store, "u1", &["Martian".to_string()]).await;
        assert!(result.unwrap_err().to_string().contains("Cuisine not found"));
    }

    #[tokio::test]
    async fn test_deleted_cuisine_is_not_rendered() {
        let ctx = TestContext::new().await;
        let cuisines = CuisineRepository::new(&ctx.store, "u1");
        let gone = cuisines.create().await.unwrap();
        cuisines.rename(&gone, "Atlantean").await.unwrap();
        let kept = add_cuisine(&ctx, "Thai").await;
        let id = ctx
            .store
            .add(
                Collection::Recipes,
                Fields::new()
                    .set("userId", "u1")
                    .set("title", "Sea Stew")
                    .set(
                        "cuisines",
                        serde_json::json!([
                            {"id": gone, "name": "Atlantean"},
                            {"id": kept, "name": "Thai"},
                            "Favorites"
                        ]),
                    ),
            )
            .await
            .unwrap();
        cuisines.delete(&gone).await.unwrap();

        let repo = RecipeRepository::new(&ctx.store, "u1");
        let mut recipes = vec![find_recipe(&repo, &id).await.unwrap()];
        drop_deleted_cuisines(&ctx.store, "u1", &mut recipes)
            .await
            .unwrap();

        let shown = format!("{}", recipes[0]);
        assert!(!shown.contains("Atlantean"));
        assert!(shown.contains("Thai"));
        assert!(recipes[0].is_favorite());
        let json = serde_json::to_string(&recipes).unwrap();
        assert!(!json.contains("Atlantean"));

        // The stored recipe still holds the reference.
        assert_eq!(find_recipe(&repo, &id).await.unwrap().cuisines.len(), 3);
    }

    #[tokio::test]
    async fn test_find_recipe_by_title() {
        let ctx = TestContext::new().await;
        let id = ctx
            .store
            .add(
                Collection::Recipes,
                Fields::new().set("userId", "u1").set("title", "Pasta"),
            )
            .await
            .unwrap();
        let repo = RecipeRepository::new(&ctx.store, "u1");

        assert_eq!(find_recipe(&repo, "pasta").await.unwrap().id, id);
        assert_eq!(find_recipe(&repo, &id).await.unwrap().title, "Pasta");
        assert!(find_recipe(&repo, "Soup").await.is_err());
    }
}
