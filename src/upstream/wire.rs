//! Raw payloads of the upstream recipe API.

use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Body of a ranking or search response before normalization
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchResponse {
    /// Either a flat item array or a paginated envelope; kept untyped until classified
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: Option<String>,
}

/// Paginated result envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub recipe: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub hits: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub count: Option<u64>,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: Option<String>,
}

/// Shape of the `result` field, decided by inspecting the JSON value
#[derive(Debug, Clone)]
pub enum RawResult {
    Items(Vec<Value>),
    Envelope(Envelope),
    Missing,
}

impl RawResult {
    pub fn classify(result: Option<Value>) -> Self {
        match result {
            Some(Value::Array(items)) => RawResult::Items(items),
            Some(object @ Value::Object(_)) => match serde_json::from_value(object) {
                Ok(envelope) => RawResult::Envelope(envelope),
                Err(e) => {
                    warn!("Malformed result envelope: {}", e);
                    RawResult::Missing
                }
            },
            _ => RawResult::Missing,
        }
    }
}

/// Body of the category list endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryListResponse {
    #[serde(default)]
    pub result: CategoryResponse,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryResponse {
    #[serde(default)]
    pub large: Vec<RawCategory>,
    #[serde(default)]
    pub medium: Vec<RawCategory>,
    #[serde(default)]
    pub small: Vec<RawCategory>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCategory {
    #[serde(rename = "categoryId", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "categoryName", default)]
    pub name: String,
    #[serde(rename = "categoryUrl", default)]
    pub url: Option<String>,
    #[serde(
        rename = "parentCategoryId",
        default,
        deserialize_with = "optional_string_or_number"
    )]
    pub parent_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(u64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::Text(text) => text,
            StringOrNumber::Number(number) => number.to_string(),
        }
    }
}

// Large category ids arrive as strings, medium and small ones as numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?
        .map(String::from)
        .filter(|id| !id.is_empty()))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::Number(number)) => Some(number),
        Some(StringOrNumber::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

/// Extract the upstream error message embedded in a payload, if any
pub fn embedded_error(body: &Value) -> Option<String> {
    let code = body.get("error").filter(|code| !code.is_null())?;
    let description = body
        .get("error_description")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    match (description, code.as_str()) {
        (Some(description), _) => Some(description.to_string()),
        (None, Some(code)) => Some(code.to_string()),
        (None, None) => Some(code.to_string()),
    }
}
