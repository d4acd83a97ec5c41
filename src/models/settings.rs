use serde::Serialize;
use std::fmt;

use super::fields::DocumentExt;
use super::ingredient::Ingredient;
use crate::db::Document;

/// The fixed catch-all ingredient group.
pub const OTHER_GROUP: &str = "Other";

pub const DEFAULT_GROUPS: [&str; 6] = ["Fruits", "Vegetables", "Dairy", "Carbs", "Seeds", OTHER_GROUP];

/// Per-user settings (`userSettings/{uid}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub ingredient_groups: Vec<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            ingredient_groups: DEFAULT_GROUPS.iter().map(|g| g.to_string()).collect(),
        }
    }
}

impl UserSettings {
    /// Reads settings; a missing or empty group list yields the defaults.
    pub fn from_document(doc: &Document) -> Self {
        let groups = doc.string_list("ingredientGroups");
        if groups.is_empty() {
            return Self::default();
        }
        Self {
            ingredient_groups: normalize_groups(groups),
        }
    }
}

/// Trims names, drops blanks and duplicates, and puts "Other" last exactly once.
pub fn normalize_groups<I, S>(groups: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for group in groups {
        let group = group.as_ref().trim();
        if group.is_empty() || group == OTHER_GROUP || out.iter().any(|g| g == group) {
            continue;
        }
        out.push(group.to_string());
    }
    out.push(OTHER_GROUP.to_string());
    out
}

/// Ingredients under one group heading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSection {
    pub group: String,
    pub items: Vec<Ingredient>,
}

/// Partitions ingredients by category in group order. Categories that are
/// not a known group land in "Other"; empty groups are kept.
pub fn group_by_category(groups: &[String], ingredients: Vec<Ingredient>) -> Vec<GroupSection> {
    let mut sections: Vec<GroupSection> = groups
        .iter()
        .map(|g| GroupSection {
            group: g.clone(),
            items: Vec::new(),
        })
        .collect();
    if !sections.iter().any(|s| s.group == OTHER_GROUP) {
        sections.push(GroupSection {
            group: OTHER_GROUP.to_string(),
            items: Vec::new(),
        });
    }

    for ingredient in ingredients {
        let idx = sections
            .iter()
            .position(|s| s.group == ingredient.category)
            .or_else(|| sections.iter().position(|s| s.group == OTHER_GROUP));
        if let Some(idx) = idx {
            sections[idx].items.push(ingredient);
        }
    }
    sections
}

/// Ingredients marked to buy, grouped for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingList {
    pub sections: Vec<GroupSection>,
}

impl ShoppingList {
    pub fn new(groups: &[String], ingredients: Vec<Ingredient>) -> Self {
        let to_buy = ingredients.into_iter().filter(|i| i.to_buy).collect();
        let sections = group_by_category(groups, to_buy)
            .into_iter()
            .filter(|s| !s.items.is_empty())
            .collect();
        Self { sections }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", section.group)?;
            writeln!(f, "{}", "-".repeat(section.group.chars().count()))?;
            for item in &section.items {
                write!(f, "  {}", item.display_name())?;
                if let Some(quantity) = &item.quantity {
                    write!(f, "  {}", quantity)?;
                }
                if let Some(notes) = &item.notes {
                    write!(f, "  ({})", notes)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
