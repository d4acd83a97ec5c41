use serde_json::{json, Value};

use super::form::{DraftForm, FormField};
use crate::db::{Collection, Document, Fields};
use crate::models::{clamp_rating, CuisineRef, ImagePosition, Recipe};

#[derive(Debug, Clone, PartialEq)]
pub enum RecipeField {
    Title(String),
    Cuisines(Vec<CuisineRef>),
    Minutes(i64),
    Servings(i64),
    Ingredients(String),
    Instructions(String),
    Rating(u8),
    /// `None` removes the cover image.
    ImageUrl(Option<String>),
    ImagePosition(ImagePosition),
}

impl FormField for RecipeField {
    fn name(&self) -> &'static str {
        match self {
            RecipeField::Title(_) => "title",
            RecipeField::Cuisines(_) => "cuisines",
            RecipeField::Minutes(_) => "minutes",
            RecipeField::Servings(_) => "servings",
            RecipeField::Ingredients(_) => "ingredients",
            RecipeField::Instructions(_) => "instructions",
            RecipeField::Rating(_) => "rating",
            RecipeField::ImageUrl(_) => "imageUrl",
            RecipeField::ImagePosition(_) => "imagePosition",
        }
    }

    fn value(&self) -> Value {
        match self {
            RecipeField::Title(s) | RecipeField::Ingredients(s) | RecipeField::Instructions(s) => {
                Value::String(s.clone())
            }
            RecipeField::Cuisines(refs) => CuisineRef::list_to_value(refs),
            RecipeField::Minutes(n) | RecipeField::Servings(n) => json!((*n).max(0)),
            RecipeField::Rating(r) => json!(clamp_rating(*r as i64)),
            RecipeField::ImageUrl(url) => Value::String(url.clone().unwrap_or_default()),
            RecipeField::ImagePosition(pos) => json!({ "top": pos.top }),
        }
    }
}

/// Recipe editing panel state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeForm {
    pub title: String,
    pub cuisines: Vec<CuisineRef>,
    pub minutes: i64,
    pub servings: i64,
    pub ingredients: String,
    pub instructions: String,
    pub rating: u8,
    pub image_url: Option<String>,
    pub image_position: ImagePosition,
    /// Ingredient ids picked in the panel; written on finalize only.
    pub related_ingredients: Vec<String>,
}

impl RecipeForm {
    pub fn select_ingredient(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.related_ingredients.contains(&id) {
            self.related_ingredients.push(id);
        }
    }

    pub fn deselect_ingredient(&mut self, id: &str) {
        self.related_ingredients.retain(|i| i != id);
    }
}

impl DraftForm for RecipeForm {
    type Field = RecipeField;
    const COLLECTION: Collection = Collection::Recipes;
    const KIND: &'static str = "recipe";

    fn apply(&mut self, field: &RecipeField) {
        match field {
            RecipeField::Title(s) => self.title = s.clone(),
            RecipeField::Cuisines(refs) => self.cuisines = refs.clone(),
            RecipeField::Minutes(n) => self.minutes = (*n).max(0),
            RecipeField::Servings(n) => self.servings = (*n).max(0),
            RecipeField::Ingredients(s) => self.ingredients = s.clone(),
            RecipeField::Instructions(s) => self.instructions = s.clone(),
            RecipeField::Rating(r) => self.rating = clamp_rating(*r as i64),
            RecipeField::ImageUrl(url) => self.image_url = url.clone().filter(|u| !u.is_empty()),
            RecipeField::ImagePosition(pos) => self.image_position = pos.clone(),
        }
    }

    fn populate(&mut self, doc: &Document) {
        let recipe = Recipe::from_document("", doc);
        *self = Self {
            title: recipe.title,
            cuisines: recipe.cuisines,
            minutes: recipe.minutes,
            servings: recipe.servings,
            ingredients: recipe.ingredients,
            instructions: recipe.instructions,
            rating: recipe.rating,
            image_url: recipe.image_url,
            image_position: recipe.image_position,
            related_ingredients: recipe.related_ingredients,
        };
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .set("title", self.title.trim())
            .set("cuisines", CuisineRef::list_to_value(&self.cuisines))
            .set("cuisine", CuisineRef::legacy_name(&self.cuisines))
            .set("minutes", self.minutes)
            .set("servings", self.servings)
            .set("ingredients", self.ingredients.as_str())
            .set("instructions", self.instructions.as_str())
            .set("rating", self.rating)
            .set("imageUrl", self.image_url.clone().unwrap_or_default())
            .set("imagePosition", json!({ "top": self.image_position.top }))
            .set("relatedIngredients", self.related_ingredients.clone())
    }

    fn clear_selection(&mut self) {
        self.related_ingredients.clear();
    }
}
