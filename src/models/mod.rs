mod cuisine;
mod fields;
mod ingredient;
mod recipe;
mod settings;

pub use cuisine::{Cuisine, CuisineCounts, CuisineIcon, CuisineRef, SvgIcon, FAVORITES};
pub use fields::DocumentExt;
pub use ingredient::Ingredient;
pub use recipe::{clamp_rating, stars, ImagePosition, Recipe, MAX_RATING};
pub use settings::{
    group_by_category, normalize_groups, GroupSection, ShoppingList, UserSettings, DEFAULT_GROUPS,
    OTHER_GROUP,
};
