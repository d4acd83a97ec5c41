mod config_cmd;
mod cuisine;
mod group;
mod ingredient;
mod recipe;
mod shopping;
#[cfg(test)]
mod testing;

pub use config_cmd::ConfigCommand;
pub use cuisine::CuisineCommand;
pub use group::GroupCommand;
pub use ingredient::IngredientCommand;
pub use recipe::RecipeCommand;
pub use shopping::ShoppingCommand;

use clap::ValueEnum;
use std::io::{self, Write};

use recipebox::ordering::{DropPosition, ReorderList};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Side of the target row for `move` commands.
#[derive(Clone, Copy, ValueEnum, Default)]
pub enum Position {
    #[default]
    Before,
    After,
}

impl From<Position> for DropPosition {
    fn from(position: Position) -> Self {
        match position {
            Position::Before => DropPosition::Before,
            Position::After => DropPosition::After,
        }
    }
}

/// The drop side the list would indicate while `dragged` hovers `target`
/// on the requested side. Errors where no indicator would be shown.
fn hover_position(
    list: &ReorderList,
    dragged: &str,
    target: &str,
    requested: Position,
) -> Result<DropPosition, String> {
    list.drag_over(dragged, target, requested.into())
        .ok_or_else(|| format!("Cannot drop '{}' on '{}'", dragged, target))
}

/// Asks a `[y/N]` question on stdin.
fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let cut: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
