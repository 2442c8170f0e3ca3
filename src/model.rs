use serde::{Deserialize, Deserializer, Serialize};

/// Default number of items a search returns
pub const DEFAULT_RESULT_LIMIT: usize = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeImages {
    #[serde(rename = "mediumImageUrl", default)]
    pub medium: Option<String>,
    #[serde(rename = "foodImageUrl", default)]
    pub food: Option<String>,
    #[serde(rename = "smallImageUrl", default)]
    pub small: Option<String>,
}

/// A single recipe as returned by the ranking and search endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeItem {
    #[serde(rename = "recipeId")]
    pub id: u64,
    #[serde(rename = "recipeTitle", default)]
    pub title: String,
    #[serde(rename = "recipeUrl", default)]
    pub url: String,
    #[serde(flatten)]
    pub images: RecipeImages,
    #[serde(rename = "recipeDescription", default)]
    pub description: String,
    #[serde(rename = "recipeMaterial", default)]
    pub ingredients: Vec<String>,
    #[serde(rename = "recipePublishday", default)]
    pub publish_date: Option<String>,
    #[serde(rename = "recipeIndication", default)]
    pub prep_time_label: Option<String>,
    #[serde(rename = "recipeCost", default)]
    pub cost_label: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub pickup: Option<u8>,
    #[serde(default)]
    pub shop: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_rank")]
    pub rank: Option<String>,
}

impl RecipeItem {
    /// Lowercased text searched by keyword filtering
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(
            self.title.len() + self.description.len() + self.ingredients.len() * 8,
        );
        text.push_str(&self.title);
        text.push('\n');
        text.push_str(&self.description);
        for ingredient in &self.ingredients {
            text.push('\n');
            text.push_str(ingredient);
        }
        text.to_lowercase()
    }
}

// Upstream sends rank as "1" in rankings but some variants use a bare number
fn deserialize_rank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RankValue {
        Text(String),
        Number(u64),
    }

    Ok(match Option::<RankValue>::deserialize(deserializer)? {
        Some(RankValue::Text(text)) if !text.trim().is_empty() => Some(text),
        Some(RankValue::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

/// Parameters of a single search invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub keyword: Option<String>,
    pub category_id: Option<String>,
    pub result_limit: usize,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            keyword: None,
            category_id: None,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Set the maximum number of items; zero is raised to one
    pub fn result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit.max(1);
        self
    }

    /// Explicit category id, ignoring blank values
    pub(crate) fn explicit_category(&self) -> Option<&str> {
        self.category_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Normalized outcome of one search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub items: Vec<RecipeItem>,
    pub last_updated: Option<String>,
    pub result_limit: usize,
    pub total_matched: Option<usize>,
}
