use clap::{Args, Subcommand};

use super::{confirm, hover_position, OutputFormat, Position};
use recipebox::db::{require_user, DocumentStore};
use recipebox::identity::IdentityProvider;
use recipebox::models::OTHER_GROUP;
use recipebox::ordering::GroupOrder;

#[derive(Args)]
pub struct GroupCommand {
    #[command(subcommand)]
    pub command: GroupSubcommand,
}

#[derive(Subcommand)]
pub enum GroupSubcommand {
    /// List ingredient groups in display order
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a group at the top
    Add {
        /// Group name
        name: String,
    },

    /// Delete a group; its ingredients move to Other
    Delete {
        /// Group name
        name: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Move a group next to another one
    Move {
        /// Group to move
        name: String,

        /// Group to drop on
        target: String,

        /// Side of the target to drop on
        #[arg(long, value_enum, default_value = "before")]
        position: Position,
    },
}

impl GroupCommand {
    pub async fn run<S, I>(&self, store: &S, identity: &I) -> Result<(), Box<dyn std::error::Error>>
    where
        S: DocumentStore,
        I: IdentityProvider,
    {
        let user_id = require_user(identity.current_user_id())?;
        let mut order = GroupOrder::load(store, user_id).await?;

        match &self.command {
            GroupSubcommand::List { format } => {
                let groups = order.groups();
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&groups)?);
                    }
                    OutputFormat::Text => {
                        for (i, group) in groups.iter().enumerate() {
                            println!("{:>2}. {}", i + 1, group);
                        }
                    }
                }
                Ok(())
            }

            GroupSubcommand::Add { name } => {
                if name.trim().is_empty() {
                    return Err("Group name cannot be empty".into());
                }
                if !order.add_group(name).await? {
                    return Err(format!("Group already exists: {}", name.trim()).into());
                }
                println!("Added group: {}", name.trim());
                Ok(())
            }

            GroupSubcommand::Delete { name, force } => {
                let name = canonical(&order.groups(), name);
                if name == OTHER_GROUP {
                    return Err(format!("The {} group cannot be deleted", OTHER_GROUP).into());
                }

                if !force
                    && !confirm(&format!(
                        "Delete group '{}'? Its ingredients move to {}.",
                        name, OTHER_GROUP
                    ))?
                {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                let moved = order.delete_group(&name).await?;
                println!("Deleted group: {}", name);
                if moved > 0 {
                    println!("Moved {} ingredient(s) to {}", moved, OTHER_GROUP);
                }
                Ok(())
            }

            GroupSubcommand::Move {
                name,
                target,
                position,
            } => {
                let groups = order.groups();
                let name = canonical(&groups, name);
                let target = canonical(&groups, target);
                let side = hover_position(order.list(), &name, &target, *position)?;
                order.drop_row(&name, &target, side).await?;
                println!("Moved '{}'", name);
                Ok(())
            }
        }
    }
}

/// The stored spelling of a group name typed in any case.
fn canonical(groups: &[String], name: &str) -> String {
    let name = name.trim();
    groups
        .iter()
        .find(|g| g.eq_ignore_ascii_case(name))
        .cloned()
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_group_name() {
        let groups = vec!["Dairy".to_string(), "Other".to_string()];
        assert_eq!(canonical(&groups, " dairy "), "Dairy");
        assert_eq!(canonical(&groups, "other"), "Other");
        assert_eq!(canonical(&groups, "Spices"), "Spices");
    }
}
