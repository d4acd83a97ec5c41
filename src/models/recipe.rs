use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::cuisine::CuisineRef;
use super::fields::DocumentExt;
use crate::db::Document;

pub const MAX_RATING: u8 = 5;

/// Vertical placement of a cover image, as a CSS offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePosition {
    pub top: String,
}

impl Default for ImagePosition {
    fn default() -> Self {
        Self {
            top: "0px".to_string(),
        }
    }
}

impl ImagePosition {
    pub fn from_value(value: Option<&Value>) -> Self {
        value
            .and_then(|v| v.get("top"))
            .and_then(Value::as_str)
            .map(|top| Self {
                top: top.to_string(),
            })
            .unwrap_or_default()
    }
}

/// A recipe (`recipes` collection).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub cuisines: Vec<CuisineRef>,
    pub minutes: i64,
    pub servings: i64,
    pub ingredients: String,
    pub instructions: String,
    pub rating: u8,
    pub image_url: Option<String>,
    pub image_position: ImagePosition,
    pub related_ingredients: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Recipe {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            title: title.into(),
            cuisines: Vec::new(),
            minutes: 0,
            servings: 0,
            ingredients: String::new(),
            instructions: String::new(),
            rating: 0,
            image_url: None,
            image_position: ImagePosition::default(),
            related_ingredients: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_cuisines(mut self, cuisines: Vec<CuisineRef>) -> Self {
        self.cuisines = cuisines;
        self
    }

    /// Builds a recipe from a stored document; each absent field takes its default.
    pub fn from_document(id: impl Into<String>, doc: &Document) -> Self {
        Self {
            id: id.into(),
            user_id: doc.str_field("userId").unwrap_or_default().to_string(),
            title: doc.str_field("title").unwrap_or_default().to_string(),
            cuisines: CuisineRef::list_from_document(doc),
            minutes: doc.int_field("minutes").unwrap_or(0),
            servings: doc.int_field("servings").unwrap_or(0),
            ingredients: doc.str_field("ingredients").unwrap_or_default().to_string(),
            instructions: doc.str_field("instructions").unwrap_or_default().to_string(),
            rating: clamp_rating(doc.int_field("rating").unwrap_or(0)),
            image_url: doc.non_empty_str("imageUrl"),
            image_position: ImagePosition::from_value(doc.get("imagePosition")),
            related_ingredients: doc.string_list("relatedIngredients"),
            created_at: doc.timestamp("createdAt"),
            updated_at: doc.timestamp("updatedAt"),
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    pub fn is_favorite(&self) -> bool {
        self.cuisines.iter().any(CuisineRef::is_favorites)
    }

    /// Cuisine entries that still resolve: references to deleted cuisines
    /// are dropped, legacy names and favorites are kept.
    pub fn live_cuisines<'a>(&'a self, known_ids: &'a [String]) -> impl Iterator<Item = &'a CuisineRef> {
        self.cuisines.iter().filter(move |c| match c.id() {
            Some(id) => known_ids.iter().any(|known| known == id),
            None => true,
        })
    }
}

pub fn clamp_rating(rating: i64) -> u8 {
    rating.clamp(0, MAX_RATING as i64) as u8
}

pub fn stars(rating: u8) -> String {
    let filled = rating.min(MAX_RATING) as usize;
    format!(
        "{}{}",
        "★".repeat(filled),
        "☆".repeat(MAX_RATING as usize - filled)
    )
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.display_title();
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.chars().count()))?;
        writeln!(f, "Rating: {}", stars(self.rating))?;

        if !self.cuisines.is_empty() {
            let names: Vec<&str> = self.cuisines.iter().map(CuisineRef::name).collect();
            writeln!(f, "Cuisines: {}", names.join(", "))?;
        }
        if self.minutes > 0 {
            writeln!(f, "Time: {} min", self.minutes)?;
        }
        if self.servings > 0 {
            writeln!(f, "Servings: {}", self.servings)?;
        }
        if !self.ingredients.is_empty() {
            writeln!(f, "\nIngredients:\n{}", self.ingredients)?;
        }
        if !self.instructions.is_empty() {
            writeln!(f, "\nInstructions:\n{}", self.instructions)?;
        }
        if !self.related_ingredients.is_empty() {
            writeln!(
                f,
                "\nLinked ingredients: {}",
                self.related_ingredients.join(", ")
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_document_defaults_missing_fields() {
        let doc = json!({"title": "Pasta", "userId": "u1"});
        let recipe = Recipe::from_document("r1", doc.as_object().unwrap());

        assert_eq!(recipe.id, "r1");
        assert_eq!(recipe.title, "Pasta");
        assert_eq!(recipe.rating, 0);
        assert_eq!(recipe.minutes, 0);
        assert!(recipe.cuisines.is_empty());
        assert!(recipe.image_url.is_none());
        assert_eq!(recipe.image_position.top, "0px");
    }

    #[test]
    fn test_from_document_reads_all_fields() {
        let doc = json!({
            "title": "Curry",
            "cuisines": [{"id": "c1", "name": "Thai"}, "Favorites"],
            "minutes": 40,
            "servings": "4",
            "rating": 9,
            "imageUrl": "data:image/png;base64,AAAA",
            "imagePosition": {"top": "-12px"},
            "relatedIngredients": ["i1", "i2"],
            "createdAt": "2026-01-11T10:00:00Z"
        });
        let recipe = Recipe::from_document("r2", doc.as_object().unwrap());

        assert_eq!(recipe.cuisines.len(), 2);
        assert!(recipe.is_favorite());
        assert_eq!(recipe.servings, 4);
        assert_eq!(recipe.rating, MAX_RATING);
        assert_eq!(recipe.image_position.top, "-12px");
        assert_eq!(recipe.related_ingredients, vec!["i1", "i2"]);
        assert!(recipe.created_at.is_some());
    }

    #[test]
    fn test_live_cuisines_filters_deleted_references() {
        let recipe = Recipe::new("Mix").with_cuisines(vec![
            CuisineRef::Ref {
                id: "gone".into(),
                name: "Old".into(),
            },
            CuisineRef::Ref {
                id: "c1".into(),
                name: "Thai".into(),
            },
            CuisineRef::LegacyName("Italian".into()),
        ]);
        let known = vec!["c1".to_string()];
        let names: Vec<&str> = recipe.live_cuisines(&known).map(CuisineRef::name).collect();
        assert_eq!(names, vec!["Thai", "Italian"]);
    }

    #[test]
    fn test_display() {
        let mut recipe = Recipe::new("Soup");
        recipe.rating = 3;
        recipe.minutes = 20;
        let output = format!("{}", recipe);
        assert!(output.contains("Soup"));
        assert!(output.contains("★★★☆☆"));
        assert!(output.contains("Time: 20 min"));

        assert_eq!(Recipe::new("  ").display_title(), "Untitled");
    }
}
