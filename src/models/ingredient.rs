use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::fields::DocumentExt;
use super::settings::OTHER_GROUP;
use crate::db::Document;

/// A pantry or shopping ingredient (`ingredients` collection).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub category: String,
    pub quantity: Option<String>,
    pub notes: Option<String>,
    pub to_buy: bool,
    pub image_url: Option<String>,
    pub image_offset_y: f64,
    pub recipes: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            name: name.into(),
            category: OTHER_GROUP.to_string(),
            quantity: None,
            notes: None,
            to_buy: false,
            image_url: None,
            image_offset_y: 0.0,
            recipes: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_to_buy(mut self, to_buy: bool) -> Self {
        self.to_buy = to_buy;
        self
    }

    pub fn from_document(id: impl Into<String>, doc: &Document) -> Self {
        Self {
            id: id.into(),
            user_id: doc.str_field("userId").unwrap_or_default().to_string(),
            name: doc.str_field("name").unwrap_or_default().to_string(),
            category: doc
                .non_empty_str("category")
                .unwrap_or_else(|| OTHER_GROUP.to_string()),
            quantity: doc.text_field("quantity"),
            notes: doc.non_empty_str("notes"),
            to_buy: doc.bool_field("toBuy").unwrap_or(false),
            image_url: doc.non_empty_str("imageUrl"),
            image_offset_y: doc.float_field("imageOffsetY").unwrap_or(0.0),
            recipes: doc.string_list("recipes"),
            created_at: doc.timestamp("createdAt"),
            updated_at: doc.timestamp("updatedAt"),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Untitled"
        } else {
            &self.name
        }
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.to_buy { "[x]" } else { "[ ]" };
        write!(f, "{} {}", mark, self.display_name())?;
        if let Some(quantity) = &self.quantity {
            write!(f, " ({})", quantity)?;
        }
        if let Some(notes) = &self.notes {
            write!(f, " - {}", notes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_document_defaults() {
        let doc = json!({"name": "Basil", "category": ""});
        let ingredient = Ingredient::from_document("i1", doc.as_object().unwrap());

        assert_eq!(ingredient.category, "Other");
        assert!(!ingredient.to_buy);
        assert_eq!(ingredient.quantity, None);
        assert_eq!(ingredient.image_offset_y, 0.0);
    }

    #[test]
    fn test_from_document_reads_fields() {
        let doc = json!({
            "name": "Milk",
            "category": "Dairy",
            "quantity": 2,
            "notes": "oat",
            "toBuy": true,
            "imageOffsetY": -14.5,
            "recipes": ["r1"]
        });
        let ingredient = Ingredient::from_document("i2", doc.as_object().unwrap());

        assert_eq!(ingredient.category, "Dairy");
        assert_eq!(ingredient.quantity.as_deref(), Some("2"));
        assert!(ingredient.to_buy);
        assert_eq!(ingredient.image_offset_y, -14.5);
        assert_eq!(ingredient.recipes, vec!["r1"]);
        assert_eq!(format!("{}", ingredient), "[x] Milk (2) - oat");
    }
}
