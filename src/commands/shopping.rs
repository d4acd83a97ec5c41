use clap::{Args, Subcommand};

use super::OutputFormat;
use recipebox::db::{require_user, DocumentStore, IngredientRepository, SettingsRepository};
use recipebox::identity::IdentityProvider;

#[derive(Args)]
pub struct ShoppingCommand {
    #[command(subcommand)]
    pub command: ShoppingSubcommand,
}

#[derive(Subcommand)]
pub enum ShoppingSubcommand {
    /// Show ingredients marked to buy, by group
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ShoppingCommand {
    pub async fn run<S, I>(&self, store: &S, identity: &I) -> Result<(), Box<dyn std::error::Error>>
    where
        S: DocumentStore,
        I: IdentityProvider,
    {
        let user_id = require_user(identity.current_user_id())?;

        match &self.command {
            ShoppingSubcommand::List { format } => {
                let groups = SettingsRepository::new(store, user_id).load_groups().await?;
                let list = IngredientRepository::new(store, user_id)
                    .shopping_list(&groups)
                    .await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&list)?);
                    }
                    OutputFormat::Text => {
                        if list.is_empty() {
                            println!("No items in your shopping list.");
                            return Ok(());
                        }
                        print!("{}", list);
                        println!("\nTotal: {} item(s)", list.item_count());
                    }
                }
                Ok(())
            }
        }
    }
}
