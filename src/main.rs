use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    ConfigCommand, CuisineCommand, GroupCommand, IngredientCommand, RecipeCommand,
    ShoppingCommand,
};
use config::Config;
use recipebox::db::{init_db, SqliteDocumentStore};

#[derive(Parser)]
#[command(name = "recipebox")]
#[command(version)]
#[command(about = "Recipes, ingredients and a shopping list", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage recipes
    Recipe(RecipeCommand),

    /// Manage ingredients
    Ingredient(IngredientCommand),

    /// Manage cuisines
    Cuisine(CuisineCommand),

    /// Manage ingredient groups
    Group(GroupCommand),

    /// Show the shopping list
    Shopping(ShoppingCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(config: &Config) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.value.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn open_store(config: &Config) -> Result<SqliteDocumentStore, Box<dyn std::error::Error>> {
    let pool = init_db(config.database_path.value.clone()).await?;
    Ok(SqliteDocumentStore::new(pool))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;
    init_tracing(&config);
    let identity = config.identity();

    match cli.command {
        Some(Commands::Recipe(cmd)) => {
            let store = open_store(&config).await?;
            cmd.run(&store, &identity).await?;
        }
        Some(Commands::Ingredient(cmd)) => {
            let store = open_store(&config).await?;
            cmd.run(&store, &identity).await?;
        }
        Some(Commands::Cuisine(cmd)) => {
            let store = open_store(&config).await?;
            cmd.run(&store, &identity).await?;
        }
        Some(Commands::Group(cmd)) => {
            let store = open_store(&config).await?;
            cmd.run(&store, &identity).await?;
        }
        Some(Commands::Shopping(cmd)) => {
            let store = open_store(&config).await?;
            cmd.run(&store, &identity).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
