use clap::{Args, Subcommand};

use super::{confirm, OutputFormat};
use recipebox::db::{
    require_user, DocumentStore, IngredientRepository, RecipeRepository, SettingsRepository,
};
use recipebox::draft::{DraftSession, IngredientField, IngredientForm};
use recipebox::identity::IdentityProvider;
use recipebox::models::Ingredient;

#[derive(Args)]
pub struct IngredientCommand {
    #[command(subcommand)]
    pub command: IngredientSubcommand,
}

/// Values for `new` and `edit`; each one given is saved as its own edit.
#[derive(Args, Clone, Default)]
pub struct IngredientFields {
    /// Ingredient name
    #[arg(long)]
    name: Option<String>,

    /// Ingredient group (defaults to Other)
    #[arg(long)]
    category: Option<String>,

    /// Amount to buy, e.g. "2 cans"
    #[arg(long)]
    quantity: Option<String>,

    /// Free-form notes
    #[arg(long)]
    notes: Option<String>,

    /// Put on (true) or take off (false) the shopping list
    #[arg(long)]
    to_buy: Option<bool>,

    /// Image URL
    #[arg(long)]
    image_url: Option<String>,

    /// Remove the image
    #[arg(long, conflicts_with = "image_url")]
    remove_image: bool,

    /// Vertical image offset in pixels
    #[arg(long, allow_negative_numbers = true)]
    image_offset_y: Option<f64>,

    /// Link a recipe by ID or title (can be repeated)
    #[arg(long = "recipe", value_name = "RECIPE")]
    link: Vec<String>,
}

impl IngredientFields {
    fn has_values(&self) -> bool {
        self.name.is_some()
            || self.category.is_some()
            || self.quantity.is_some()
            || self.notes.is_some()
            || self.to_buy.is_some()
            || self.image_url.is_some()
            || self.remove_image
            || self.image_offset_y.is_some()
            || !self.link.is_empty()
    }
}

#[derive(Subcommand)]
pub enum IngredientSubcommand {
    /// Create a new ingredient
    New {
        #[command(flatten)]
        fields: IngredientFields,
    },

    /// Edit an existing ingredient
    Edit {
        /// Ingredient ID or name
        identifier: String,

        #[command(flatten)]
        fields: IngredientFields,
    },

    /// List ingredients by group
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete an ingredient and unlink it from recipes
    Delete {
        /// Ingredient ID or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Put an ingredient on the shopping list
    Buy {
        /// Ingredient ID or name
        identifier: String,

        /// Take it off the list instead
        #[arg(long)]
        clear: bool,
    },
}

impl IngredientCommand {
    pub async fn run<S, I>(&self, store: &S, identity: &I) -> Result<(), Box<dyn std::error::Error>>
    where
        S: DocumentStore,
        I: IdentityProvider,
    {
        let user_id = require_user(identity.current_user_id())?;
        let repo = IngredientRepository::new(store, user_id);

        match &self.command {
            IngredientSubcommand::New { fields } => {
                if !fields.has_values() {
                    return Err("Nothing to save. Provide at least one field.".into());
                }

                let session: DraftSession<_, _, IngredientForm> =
                    DraftSession::new(store, identity);
                session.open_for_create();
                let Some(id) = save_fields(&session, store, user_id, fields).await? else {
                    return Err("Nothing to save. Provide at least one field besides links.".into());
                };

                let created = find_ingredient(&repo, &id).await?;
                println!("Created ingredient:");
                println!("  {}", created);
                Ok(())
            }

            IngredientSubcommand::Edit { identifier, fields } => {
                if !fields.has_values() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }
                let ingredient = find_ingredient(&repo, identifier).await?;

                let session: DraftSession<_, _, IngredientForm> =
                    DraftSession::new(store, identity);
                if !session.open_for_edit(&ingredient.id).await? {
                    return Err(format!("Ingredient not found: {}", identifier).into());
                }
                save_fields(&session, store, user_id, fields).await?;

                let updated = find_ingredient(&repo, &ingredient.id).await?;
                println!("Updated ingredient:");
                println!("  {}", updated);
                Ok(())
            }

            IngredientSubcommand::List { format } => {
                let groups = SettingsRepository::new(store, user_id).load_groups().await?;
                let sections = repo.grouped(&groups).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&sections)?);
                    }
                    OutputFormat::Text => {
                        let total: usize = sections.iter().map(|s| s.items.len()).sum();
                        if total == 0 {
                            println!("No ingredients found");
                            return Ok(());
                        }
                        for section in sections.iter().filter(|s| !s.items.is_empty()) {
                            println!("{} ({})", section.group, section.items.len());
                            for item in &section.items {
                                println!("  {}  {}", item.id, item);
                            }
                            println!();
                        }
                        println!("Total: {} ingredient(s)", total);
                    }
                }
                Ok(())
            }

            IngredientSubcommand::Delete { identifier, force } => {
                let ingredient = find_ingredient(&repo, identifier).await?;

                if !force
                    && !confirm(&format!(
                        "Delete ingredient '{}'?",
                        ingredient.display_name()
                    ))?
                {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                let unlinked = repo.delete(&ingredient.id).await?;
                println!("Deleted ingredient: {}", ingredient.display_name());
                if unlinked > 0 {
                    println!("Unlinked from {} recipe(s)", unlinked);
                }
                Ok(())
            }

            IngredientSubcommand::Buy { identifier, clear } => {
                let ingredient = find_ingredient(&repo, identifier).await?;
                repo.set_to_buy(&ingredient.id, !clear).await?;
                if *clear {
                    println!("Removed '{}' from the shopping list", ingredient.display_name());
                } else {
                    println!("Added '{}' to the shopping list", ingredient.display_name());
                }
                Ok(())
            }
        }
    }
}

/// Looks an ingredient up by ID, then by name (case-insensitive).
async fn find_ingredient<S: DocumentStore>(
    repo: &IngredientRepository<S>,
    identifier: &str,
) -> Result<Ingredient, Box<dyn std::error::Error>> {
    if let Some(ingredient) = repo.get(identifier).await? {
        return Ok(ingredient);
    }
    repo.list()
        .await?
        .into_iter()
        .find(|i| i.name.eq_ignore_ascii_case(identifier.trim()))
        .ok_or_else(|| format!("Ingredient not found: {}", identifier).into())
}

/// Autosaves each given field, links recipes, then closes the panel.
/// Returns the draft's ID, or `None` if no document was ever created.
async fn save_fields<S, I, L>(
    session: &DraftSession<S, I, IngredientForm>,
    store: &L,
    user_id: &str,
    fields: &IngredientFields,
) -> Result<Option<String>, Box<dyn std::error::Error>>
where
    S: DocumentStore,
    I: IdentityProvider,
    L: DocumentStore,
{
    let mut edits = Vec::new();
    if let Some(name) = &fields.name {
        edits.push(IngredientField::Name(name.clone()));
    }
    if let Some(category) = &fields.category {
        let groups = SettingsRepository::new(store, user_id).load_groups().await?;
        let group = groups
            .iter()
            .find(|g| g.eq_ignore_ascii_case(category.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown group: {} (groups: {})",
                    category,
                    groups.join(", ")
                )
            })?;
        edits.push(IngredientField::Category(group.clone()));
    }
    if let Some(quantity) = &fields.quantity {
        edits.push(IngredientField::Quantity(quantity.clone()));
    }
    if let Some(notes) = &fields.notes {
        edits.push(IngredientField::Notes(notes.clone()));
    }
    if let Some(to_buy) = fields.to_buy {
        edits.push(IngredientField::ToBuy(to_buy));
    }
    if let Some(url) = &fields.image_url {
        edits.push(IngredientField::ImageUrl(Some(url.clone())));
    }
    if fields.remove_image {
        edits.push(IngredientField::ImageUrl(None));
    }
    if let Some(offset) = fields.image_offset_y {
        edits.push(IngredientField::ImageOffsetY(offset));
    }

    for edit in edits {
        session.autosave_field(edit).await?;
    }

    if !fields.link.is_empty() {
        let recipes = RecipeRepository::new(store, user_id).list().await?;
        for identifier in &fields.link {
            let recipe = recipes
                .iter()
                .find(|r| r.id == *identifier || r.title.eq_ignore_ascii_case(identifier.trim()))
                .ok_or_else(|| format!("Recipe not found: {}", identifier))?;
            let id = recipe.id.clone();
            session.edit_form(|form| form.select_recipe(id));
        }
    }

    let id = session.active_id();
    session.close().await?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::TestContext;
    use recipebox::db::{Collection, Fields};
    use recipebox::identity::ConfiguredUser;
    use recipebox::models::OTHER_GROUP;

    #[tokio::test]
    async fn test_new_ingredient_resolves_group_case_insensitively() {
        let ctx = TestContext::new().await;
        let user = ConfiguredUser::signed_in("u1");

        let session: DraftSession<_, _, IngredientForm> = DraftSession::new(&ctx.store, &user);
        session.open_for_create();
        let fields = IngredientFields {
            name: Some("Oat milk".into()),
            category: Some("dairy".into()),
            to_buy: Some(true),
            ..Default::default()
        };
        let id = save_fields(&session, &ctx.store, "u1", &fields)
            .await
            .unwrap()
            .unwrap();

        let repo = IngredientRepository::new(&ctx.store, "u1");
        let saved = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(saved.category, "Dairy");
        assert!(saved.to_buy);
        assert_eq!(find_ingredient(&repo, "OAT MILK").await.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_unknown_group_writes_nothing() {
        let ctx = TestContext::new().await;
        let user = ConfiguredUser::signed_in("u1");

        let session: DraftSession<_, _, IngredientForm> = DraftSession::new(&ctx.store, &user);
        session.open_for_create();
        let fields = IngredientFields {
            name: Some("Saffron".into()),
            category: Some("Spices".into()),
            ..Default::default()
        };
        let err = save_fields(&session, &ctx.store, "u1", &fields)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown group"));
        assert!(IngredientRepository::new(&ctx.store, "u1")
            .list()
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_link_recipe_is_written_on_close() {
        let ctx = TestContext::new().await;
        let user = ConfiguredUser::signed_in("u1");
        let recipe_id = ctx
            .store
            .add(
                Collection::Recipes,
                Fields::new().set("userId", "u1").set("title", "Pasta"),
            )
            .await
            .unwrap();

        let session: DraftSession<_, _, IngredientForm> = DraftSession::new(&ctx.store, &user);
        session.open_for_create();
        let fields = IngredientFields {
            name: Some("Basil".into()),
            link: vec!["pasta".into()],
            ..Default::default()
        };
        let id = save_fields(&session, &ctx.store, "u1", &fields)
            .await
            .unwrap()
            .unwrap();

        let saved = IngredientRepository::new(&ctx.store, "u1")
            .get(&id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.recipes, vec![recipe_id]);
        assert_eq!(saved.category, OTHER_GROUP);
    }
}
