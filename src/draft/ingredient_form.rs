use serde_json::{json, Value};

use super::form::{DraftForm, FormField};
use crate::db::{Collection, Document, Fields};
use crate::models::{Ingredient, OTHER_GROUP};

#[derive(Debug, Clone, PartialEq)]
pub enum IngredientField {
    Name(String),
    Category(String),
    Quantity(String),
    Notes(String),
    ToBuy(bool),
    ImageUrl(Option<String>),
    ImageOffsetY(f64),
}

fn category_or_other(category: &str) -> &str {
    match category.trim() {
        "" => OTHER_GROUP,
        trimmed => trimmed,
    }
}

fn text_or_null(text: &str) -> Value {
    match text.trim() {
        "" => Value::Null,
        trimmed => Value::String(trimmed.to_string()),
    }
}

impl FormField for IngredientField {
    fn name(&self) -> &'static str {
        match self {
            IngredientField::Name(_) => "name",
            IngredientField::Category(_) => "category",
            IngredientField::Quantity(_) => "quantity",
            IngredientField::Notes(_) => "notes",
            IngredientField::ToBuy(_) => "toBuy",
            IngredientField::ImageUrl(_) => "imageUrl",
            IngredientField::ImageOffsetY(_) => "imageOffsetY",
        }
    }

    fn value(&self) -> Value {
        match self {
            IngredientField::Name(s) => Value::String(s.trim().to_string()),
            IngredientField::Category(s) => Value::String(category_or_other(s).to_string()),
            IngredientField::Quantity(s) | IngredientField::Notes(s) => text_or_null(s),
            IngredientField::ToBuy(b) => Value::Bool(*b),
            IngredientField::ImageUrl(url) => Value::String(url.clone().unwrap_or_default()),
            IngredientField::ImageOffsetY(y) => json!(y),
        }
    }
}

/// Ingredient editing panel state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientForm {
    pub name: String,
    /// Empty means "Other".
    pub category: String,
    pub quantity: String,
    pub notes: String,
    pub to_buy: bool,
    pub image_url: Option<String>,
    pub image_offset_y: f64,
    /// Recipe ids picked in the panel; written on finalize only.
    pub recipes: Vec<String>,
}

impl IngredientForm {
    pub fn select_recipe(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.recipes.contains(&id) {
            self.recipes.push(id);
        }
    }
}

impl DraftForm for IngredientForm {
    type Field = IngredientField;
    const COLLECTION: Collection = Collection::Ingredients;
    const KIND: &'static str = "ingredient";

    fn apply(&mut self, field: &IngredientField) {
        match field {
            IngredientField::Name(s) => self.name = s.clone(),
            IngredientField::Category(s) => self.category = s.clone(),
            IngredientField::Quantity(s) => self.quantity = s.clone(),
            IngredientField::Notes(s) => self.notes = s.clone(),
            IngredientField::ToBuy(b) => self.to_buy = *b,
            IngredientField::ImageUrl(url) => {
                self.image_url = url.clone().filter(|u| !u.is_empty())
            }
            IngredientField::ImageOffsetY(y) => self.image_offset_y = *y,
        }
    }

    fn populate(&mut self, doc: &Document) {
        let ingredient = Ingredient::from_document("", doc);
        *self = Self {
            name: ingredient.name,
            category: ingredient.category,
            quantity: ingredient.quantity.unwrap_or_default(),
            notes: ingredient.notes.unwrap_or_default(),
            to_buy: ingredient.to_buy,
            image_url: ingredient.image_url,
            image_offset_y: ingredient.image_offset_y,
            recipes: ingredient.recipes,
        };
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new()
            .set("name", self.name.trim())
            .set("category", category_or_other(&self.category))
            .set("quantity", text_or_null(&self.quantity))
            .set("notes", text_or_null(&self.notes))
            .set("toBuy", self.to_buy)
            .set("recipes", self.recipes.clone());
        // Image fields are only written while an image is set.
        if let Some(url) = &self.image_url {
            fields = fields
                .set("imageUrl", url.as_str())
                .set("imageOffsetY", self.image_offset_y);
        }
        fields
    }

    fn clear_selection(&mut self) {
        self.recipes.clear();
    }
}
