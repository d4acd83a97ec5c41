use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;

use super::fields::DocumentExt;
use super::recipe::Recipe;
use crate::db::Document;

/// Name of the synthetic favorites cuisine recorded on recipes.
pub const FAVORITES: &str = "Favorites";

/// Icon shown for cuisines without a custom one.
pub const DEFAULT_ICON_PATH: &str = "Images/cuisine.png";

/// A cuisine entry on a recipe.
///
/// Older recipes store a bare name; newer ones store `{id, name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CuisineRef {
    LegacyName(String),
    Ref { id: String, name: String },
}

impl CuisineRef {
    pub fn name(&self) -> &str {
        match self {
            CuisineRef::LegacyName(name) => name,
            CuisineRef::Ref { name, .. } => name,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            CuisineRef::LegacyName(_) => None,
            CuisineRef::Ref { id, .. } => Some(id),
        }
    }

    pub fn favorites() -> Self {
        CuisineRef::LegacyName(FAVORITES.to_string())
    }

    pub fn is_favorites(&self) -> bool {
        self.name() == FAVORITES
    }

    /// Reads a stored entry. Objects without an id fall back to their name.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) if !name.is_empty() => Some(CuisineRef::LegacyName(name.clone())),
            Value::Object(map) => {
                let name = map.get("name").and_then(Value::as_str).unwrap_or_default();
                match map.get("id").and_then(Value::as_str).filter(|id| !id.is_empty()) {
                    Some(id) => Some(CuisineRef::Ref {
                        id: id.to_string(),
                        name: name.to_string(),
                    }),
                    None if !name.is_empty() => Some(CuisineRef::LegacyName(name.to_string())),
                    None => None,
                }
            }
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            CuisineRef::LegacyName(name) => Value::String(name.clone()),
            CuisineRef::Ref { id, name } => json!({ "id": id, "name": name }),
        }
    }

    /// Reads a recipe's cuisine list, falling back to the legacy single `cuisine` field.
    pub fn list_from_document(doc: &Document) -> Vec<Self> {
        match doc.get("cuisines").and_then(Value::as_array) {
            Some(items) => items.iter().filter_map(Self::from_value).collect(),
            None => doc
                .non_empty_str("cuisine")
                .map(|name| vec![CuisineRef::LegacyName(name)])
                .unwrap_or_default(),
        }
    }

    pub fn list_to_value(refs: &[Self]) -> Value {
        Value::Array(refs.iter().map(Self::to_value).collect())
    }

    /// Name kept in the legacy `cuisine` field: the first entry's name.
    pub fn legacy_name(refs: &[Self]) -> String {
        refs.first()
            .map(|r| r.name().to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for CuisineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An icon picked from the SVG icon set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SvgIcon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub svg: String,
}

/// A cuisine's icon.
///
/// Stored as a single `iconUrl` string holding an emoji, an image path/URL,
/// or a serialized [`SvgIcon`]; decoded once here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CuisineIcon {
    Default,
    Emoji { emoji: String },
    Image { url: String },
    Svg { icon: SvgIcon },
}

impl CuisineIcon {
    pub fn from_stored(stored: Option<&str>) -> Self {
        let raw = match stored.map(str::trim) {
            None | Some("") => return CuisineIcon::Default,
            Some(s) if s == DEFAULT_ICON_PATH => return CuisineIcon::Default,
            Some(s) => s,
        };

        if raw.starts_with('{') {
            if let Ok(icon) = serde_json::from_str::<SvgIcon>(raw) {
                return CuisineIcon::Svg { icon };
            }
        }
        if is_image_reference(raw) {
            CuisineIcon::Image {
                url: raw.to_string(),
            }
        } else {
            CuisineIcon::Emoji {
                emoji: raw.to_string(),
            }
        }
    }

    pub fn to_stored(&self) -> String {
        match self {
            CuisineIcon::Default => DEFAULT_ICON_PATH.to_string(),
            CuisineIcon::Emoji { emoji } => emoji.clone(),
            CuisineIcon::Image { url } => url.clone(),
            // SvgIcon has only string fields; serialization cannot fail.
            CuisineIcon::Svg { icon } => serde_json::to_string(icon).unwrap_or_default(),
        }
    }
}

fn is_image_reference(s: &str) -> bool {
    s.starts_with("data:") || s.starts_with("Images/") || s.starts_with("http")
}

impl fmt::Display for CuisineIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CuisineIcon::Default => write!(f, "-"),
            CuisineIcon::Emoji { emoji } => write!(f, "{}", emoji),
            CuisineIcon::Image { url } => write!(f, "[img {}]", url),
            CuisineIcon::Svg { icon } => {
                write!(f, "[svg {}]", icon.name.as_deref().unwrap_or("icon"))
            }
        }
    }
}

/// A user-defined cuisine (`cuisines` collection).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cuisine {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Recomputed from recipes on load; the stored value is not trusted.
    pub count: u32,
    pub icon: CuisineIcon,
    pub order: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Cuisine {
    pub fn from_document(id: impl Into<String>, doc: &Document) -> Self {
        Self {
            id: id.into(),
            user_id: doc.str_field("userId").unwrap_or_default().to_string(),
            name: doc
                .non_empty_str("name")
                .unwrap_or_else(|| "Untitled".to_string()),
            count: doc.int_field("count").unwrap_or(0).max(0) as u32,
            icon: CuisineIcon::from_stored(doc.str_field("iconUrl")),
            order: doc.int_field("order"),
            created_at: doc.timestamp("createdAt"),
        }
    }
}

impl fmt::Display for Cuisine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.icon, self.name, self.count)
    }
}

/// Recipe counts per cuisine, keyed by id for `{id, name}` entries and by
/// name for legacy entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CuisineCounts {
    by_id: HashMap<String, u32>,
    by_name: HashMap<String, u32>,
}

impl CuisineCounts {
    pub fn from_recipes<'a>(recipes: impl IntoIterator<Item = &'a Recipe>) -> Self {
        let mut counts = Self::default();
        for recipe in recipes {
            for cuisine in &recipe.cuisines {
                match cuisine {
                    CuisineRef::Ref { id, .. } => *counts.by_id.entry(id.clone()).or_default() += 1,
                    CuisineRef::LegacyName(name) => {
                        *counts.by_name.entry(name.clone()).or_default() += 1
                    }
                }
            }
        }
        counts
    }

    /// Count for a cuisine: by id when any recipe references it by id,
    /// otherwise by name.
    pub fn count_for(&self, cuisine: &Cuisine) -> u32 {
        match self.by_id.get(&cuisine.id) {
            Some(count) => *count,
            None => self.by_name.get(&cuisine.name).copied().unwrap_or(0),
        }
    }

    pub fn favorites(&self) -> u32 {
        self.by_name.get(FAVORITES).copied().unwrap_or(0)
    }

    /// Replaces each cuisine's stored count with the recomputed one.
    pub fn apply(&self, cuisines: &mut [Cuisine]) {
        for cuisine in cuisines {
            cuisine.count = self.count_for(cuisine);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_cuisine_ref_from_value() {
        assert_eq!(
            CuisineRef::from_value(&json!("Thai")),
            Some(CuisineRef::LegacyName("Thai".into()))
        );
        assert_eq!(
            CuisineRef::from_value(&json!({"id": "c1", "name": "Thai"})),
            Some(CuisineRef::Ref {
                id: "c1".into(),
                name: "Thai".into()
            })
        );
        assert_eq!(
            CuisineRef::from_value(&json!({"name": "Lao"})),
            Some(CuisineRef::LegacyName("Lao".into()))
        );
        assert_eq!(CuisineRef::from_value(&json!({})), None);
        assert_eq!(CuisineRef::from_value(&json!(3)), None);
    }

    #[test]
    fn test_cuisine_ref_serializes_in_stored_shape() {
        let refs = vec![
            CuisineRef::favorites(),
            CuisineRef::Ref {
                id: "c1".into(),
                name: "Thai".into(),
            },
        ];
        assert_eq!(
            serde_json::to_value(&refs).unwrap(),
            json!(["Favorites", {"id": "c1", "name": "Thai"}])
        );
        assert_eq!(CuisineRef::list_to_value(&refs), serde_json::to_value(&refs).unwrap());
    }

    #[test]
    fn test_list_from_document_falls_back_to_legacy_field() {
        let legacy = doc(json!({"cuisine": "Italian"}));
        assert_eq!(
            CuisineRef::list_from_document(&legacy),
            vec![CuisineRef::LegacyName("Italian".into())]
        );

        let both = doc(json!({"cuisine": "Italian", "cuisines": []}));
        assert!(CuisineRef::list_from_document(&both).is_empty());

        assert!(CuisineRef::list_from_document(&doc(json!({}))).is_empty());
    }

    #[test]
    fn test_cuisine_json_uses_stored_field_names() {
        let cuisine = Cuisine::from_document(
            "c1",
            &doc(json!({"userId": "u1", "name": "Thai", "order": 2})),
        );
        let value = serde_json::to_value(&cuisine).unwrap();
        assert_eq!(value["userId"], json!("u1"));
        assert_eq!(value["order"], json!(2));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("user_id").is_none());
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn test_icon_from_stored() {
        assert_eq!(CuisineIcon::from_stored(None), CuisineIcon::Default);
        assert_eq!(
            CuisineIcon::from_stored(Some(DEFAULT_ICON_PATH)),
            CuisineIcon::Default
        );
        assert_eq!(
            CuisineIcon::from_stored(Some("🍜")),
            CuisineIcon::Emoji { emoji: "🍜".into() }
        );
        assert_eq!(
            CuisineIcon::from_stored(Some("https://example.com/a.png")),
            CuisineIcon::Image {
                url: "https://example.com/a.png".into()
            }
        );
        assert_eq!(
            CuisineIcon::from_stored(Some(r#"{"name":"bowl","svg":"<svg></svg>"}"#)),
            CuisineIcon::Svg {
                icon: SvgIcon {
                    name: Some("bowl".into()),
                    svg: "<svg></svg>".into()
                }
            }
        );
    }

    #[test]
    fn test_icon_stored_form_is_stable() {
        let icon = CuisineIcon::Svg {
            icon: SvgIcon {
                name: None,
                svg: "<svg/>".into(),
            },
        };
        assert_eq!(CuisineIcon::from_stored(Some(&icon.to_stored())), icon);
    }

    #[test]
    fn test_counts_prefer_id_then_name() {
        let recipes = vec![
            Recipe::new("A").with_cuisines(vec![
                CuisineRef::Ref {
                    id: "c1".into(),
                    name: "Thai".into(),
                },
                CuisineRef::favorites(),
            ]),
            Recipe::new("B").with_cuisines(vec![CuisineRef::LegacyName("Italian".into())]),
            Recipe::new("C").with_cuisines(vec![CuisineRef::LegacyName("Italian".into())]),
        ];
        let counts = CuisineCounts::from_recipes(&recipes);

        let thai = Cuisine::from_document("c1", &doc(json!({"name": "Thai", "count": 99})));
        let italian = Cuisine::from_document("c2", &doc(json!({"name": "Italian"})));
        let empty = Cuisine::from_document("c3", &doc(json!({"name": "Greek"})));

        assert_eq!(counts.count_for(&thai), 1);
        assert_eq!(counts.count_for(&italian), 2);
        assert_eq!(counts.count_for(&empty), 0);
        assert_eq!(counts.favorites(), 1);

        let mut cuisines = vec![thai];
        counts.apply(&mut cuisines);
        assert_eq!(cuisines[0].count, 1);
    }
}
