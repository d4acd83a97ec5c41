use clap::{Args, Subcommand, ValueEnum};

use super::{confirm, hover_position, OutputFormat, Position};
use recipebox::db::{require_user, CuisineRepository, CuisineSort, Direction, DocumentStore};
use recipebox::identity::IdentityProvider;
use recipebox::models::{Cuisine, CuisineIcon, FAVORITES};
use recipebox::ordering::{CuisineOrder, FAVORITES_ROW};

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum SortBy {
    /// Saved drag-and-drop order
    #[default]
    Order,
    Name,
    /// Creation date
    Date,
    /// Number of recipes
    Count,
}

impl From<SortBy> for CuisineSort {
    fn from(sort: SortBy) -> Self {
        match sort {
            SortBy::Order => CuisineSort::Order,
            SortBy::Name => CuisineSort::Name,
            SortBy::Date => CuisineSort::Date,
            SortBy::Count => CuisineSort::Count,
        }
    }
}

#[derive(Args)]
pub struct CuisineCommand {
    #[command(subcommand)]
    pub command: CuisineSubcommand,
}

#[derive(Subcommand)]
pub enum CuisineSubcommand {
    /// Create a new cuisine
    New {
        /// Cuisine name (defaults to "Cuisine")
        name: Option<String>,

        /// Emoji, image URL, or SVG icon JSON
        #[arg(long)]
        icon: Option<String>,
    },

    /// List cuisines with recipe counts
    List {
        /// Sort key
        #[arg(long, value_enum, default_value = "order")]
        sort: SortBy,

        /// Sort ascending
        #[arg(long, conflicts_with = "desc")]
        asc: bool,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Rename a cuisine
    Rename {
        /// Cuisine ID or name
        identifier: String,

        /// New name
        name: String,
    },

    /// Delete a cuisine
    Delete {
        /// Cuisine ID or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Set a cuisine's icon
    Icon {
        /// Cuisine ID or name
        identifier: String,

        /// Emoji, image URL, SVG icon JSON, or "default"
        icon: String,
    },

    /// Move a cuisine next to another one
    Move {
        /// Cuisine ID or name to move
        identifier: String,

        /// Cuisine ID or name to drop on ("favorites" for the top)
        target: String,

        /// Side of the target to drop on
        #[arg(long, value_enum, default_value = "before")]
        position: Position,
    },
}

impl CuisineCommand {
    pub async fn run<S, I>(&self, store: &S, identity: &I) -> Result<(), Box<dyn std::error::Error>>
    where
        S: DocumentStore,
        I: IdentityProvider,
    {
        let user_id = require_user(identity.current_user_id())?;
        let repo = CuisineRepository::new(store, user_id);

        match &self.command {
            CuisineSubcommand::New { name, icon } => {
                let id = repo.create().await?;
                if let Some(name) = name.as_deref().filter(|n| !n.trim().is_empty()) {
                    repo.rename(&id, name).await?;
                }
                if let Some(icon) = icon {
                    repo.set_icon(&id, &CuisineIcon::from_stored(Some(icon))).await?;
                }

                let created = find_cuisine(&repo, &id).await?;
                println!("Created cuisine:");
                println!("  {}  {}", created.id, created);
                Ok(())
            }

            CuisineSubcommand::List {
                sort,
                asc,
                desc,
                format,
            } => {
                let direction = match (*asc, *desc) {
                    (true, _) => Some(Direction::Ascending),
                    (_, true) => Some(Direction::Descending),
                    _ => None,
                };
                let view = repo.list((*sort).into(), direction).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&view)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<32}  ★ {} ({})", FAVORITES_ROW, FAVORITES, view.favorites);
                        for cuisine in &view.cuisines {
                            println!("{:<32}  {}", cuisine.id, cuisine);
                        }
                        println!("\nTotal: {} cuisine(s)", view.cuisines.len());
                    }
                }
                Ok(())
            }

            CuisineSubcommand::Rename { identifier, name } => {
                if name.trim().is_empty() {
                    return Err("Cuisine name cannot be empty".into());
                }
                let cuisine = find_cuisine(&repo, identifier).await?;
                repo.rename(&cuisine.id, name).await?;
                println!("Renamed '{}' to '{}'", cuisine.name, name.trim());
                Ok(())
            }

            CuisineSubcommand::Delete { identifier, force } => {
                let cuisine = find_cuisine(&repo, identifier).await?;

                if !force && !confirm(&format!("Delete cuisine '{}'?", cuisine.name))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                repo.delete(&cuisine.id).await?;
                println!("Deleted cuisine: {}", cuisine.name);
                Ok(())
            }

            CuisineSubcommand::Icon { identifier, icon } => {
                let cuisine = find_cuisine(&repo, identifier).await?;
                let icon = if icon.eq_ignore_ascii_case("default") {
                    CuisineIcon::Default
                } else {
                    CuisineIcon::from_stored(Some(icon))
                };
                repo.set_icon(&cuisine.id, &icon).await?;
                println!("Set icon of '{}' to {}", cuisine.name, icon);
                Ok(())
            }

            CuisineSubcommand::Move {
                identifier,
                target,
                position,
            } => {
                let dragged = find_cuisine(&repo, identifier).await?;
                let target_id = if target.eq_ignore_ascii_case(FAVORITES) {
                    FAVORITES_ROW.to_string()
                } else {
                    find_cuisine(&repo, target).await?.id
                };

                let mut order = CuisineOrder::load(store, user_id).await?;
                let side = hover_position(order.list(), &dragged.id, &target_id, *position)?;
                order.drop_row(&dragged.id, &target_id, side).await?;
                println!("Moved '{}'", dragged.name);
                Ok(())
            }
        }
    }
}

/// Looks a cuisine up by ID, then by name (case-insensitive).
async fn find_cuisine<S: DocumentStore>(
    repo: &CuisineRepository<S>,
    identifier: &str,
) -> Result<Cuisine, Box<dyn std::error::Error>> {
    if let Some(cuisine) = repo.get(identifier).await? {
        return Ok(cuisine);
    }
    repo.list(CuisineSort::Name, None)
        .await?
        .cuisines
        .into_iter()
        .find(|c| c.name.eq_ignore_ascii_case(identifier.trim()))
        .ok_or_else(|| format!("Cuisine not found: {}", identifier).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::TestContext;
    use recipebox::identity::ConfiguredUser;

    #[tokio::test]
    async fn test_find_cuisine_by_id_or_name() {
        let ctx = TestContext::new().await;
        let repo = CuisineRepository::new(&ctx.store, "u1");
        let id = repo.create().await.unwrap();
        repo.rename(&id, "Italian").await.unwrap();

        assert_eq!(find_cuisine(&repo, "italian").await.unwrap().id, id);
        assert_eq!(find_cuisine(&repo, &id).await.unwrap().name, "Italian");
        assert!(find_cuisine(&repo, "Greek").await.is_err());
    }

    async fn names_in_order(ctx: &TestContext) -> Vec<String> {
        CuisineRepository::new(&ctx.store, "u1")
            .list(CuisineSort::Order, None)
            .await
            .unwrap()
            .cuisines
            .into_iter()
            .map(|c| c.name)
            .collect()
    }

    #[tokio::test]
    async fn test_move_uses_drop_indicator() {
        let ctx = TestContext::new().await;
        let user = ConfiguredUser::signed_in("u1");
        for name in ["A", "B", "C"] {
            let cmd = CuisineCommand {
                command: CuisineSubcommand::New {
                    name: Some(name.to_string()),
                    icon: None,
                },
            };
            cmd.run(&ctx.store, &user).await.unwrap();
        }
        let order = CuisineOrder::load(&ctx.store, "u1").await.unwrap();
        order.persist().await.unwrap();
        let start = names_in_order(&ctx).await;

        let move_cmd = |identifier: &str, target: &str, position: Position| CuisineCommand {
            command: CuisineSubcommand::Move {
                identifier: identifier.to_string(),
                target: target.to_string(),
                position,
            },
        };

        // The top half of the first row indicates "after" it.
        let last = start[2].clone();
        move_cmd(&last, &start[0], Position::Before)
            .run(&ctx.store, &user)
            .await
            .unwrap();
        assert_eq!(names_in_order(&ctx).await, vec![start[0].clone(), last.clone(), start[1].clone()]);

        move_cmd(&last, "favorites", Position::Before)
            .run(&ctx.store, &user)
            .await
            .unwrap();
        assert_eq!(names_in_order(&ctx).await, vec![last.clone(), start[0].clone(), start[1].clone()]);

        assert!(move_cmd(&last, &last, Position::After)
            .run(&ctx.store, &user)
            .await
            .is_err());
    }

    #[test]
    fn test_sort_by_maps_to_cuisine_sort() {
        assert_eq!(CuisineSort::from(SortBy::Count), CuisineSort::Count);
        assert_eq!(CuisineSort::from(SortBy::default()), CuisineSort::Order);
    }
}
