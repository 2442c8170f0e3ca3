use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

use crate::error::SearchError;
use crate::upstream::wire::RawCategory;
use crate::upstream::{CategoryResponse, RecipeApi};

/// Separator joining ancestor ids into the composite ranking id
pub const COMPOSITE_SEPARATOR: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CategoryTier {
    Large,
    Medium,
    Small,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub tier: CategoryTier,
    pub url: Option<String>,
    /// Id expected by the ranking endpoint (`large-medium-small`)
    pub ranking_id: String,
}

/// Indexed large → medium → small taxonomy, immutable once built
#[derive(Debug, Clone, Default)]
pub struct CategoryHierarchy {
    large: Vec<Category>,
    children: HashMap<String, Vec<Category>>,
    by_ranking_id: HashMap<String, Category>,
}

impl CategoryHierarchy {
    pub fn from_response(response: CategoryResponse) -> Self {
        // large and medium ids live in separate key spaces upstream
        let medium_parents: HashMap<String, Option<String>> = response
            .medium
            .iter()
            .map(|c| (c.id.clone(), c.parent_id.clone()))
            .collect();

        let mut hierarchy = CategoryHierarchy::default();

        for raw in response.large {
            let (category, _) = build(raw, CategoryTier::Large, &medium_parents);
            hierarchy.large.push(category.clone());
            hierarchy.index(category);
        }
        for raw in response.medium {
            let (category, parent) = build(raw, CategoryTier::Medium, &medium_parents);
            hierarchy.insert_child(category, parent);
        }
        for raw in response.small {
            let (category, parent) = build(raw, CategoryTier::Small, &medium_parents);
            hierarchy.insert_child(category, parent);
        }

        debug!(
            "Built category hierarchy: {} large, {} indexed",
            hierarchy.large.len(),
            hierarchy.by_ranking_id.len()
        );
        hierarchy
    }

    fn insert_child(&mut self, category: Category, parent_ranking_id: Option<String>) {
        match parent_ranking_id {
            Some(parent) => self
                .children
                .entry(parent)
                .or_default()
                .push(category.clone()),
            None => warn!(
                "Category '{}' ({}) has no parent id",
                category.name, category.id
            ),
        }
        self.index(category);
    }

    fn index(&mut self, category: Category) {
        self.by_ranking_id
            .entry(category.ranking_id.clone())
            .or_insert(category);
    }

    /// Top-level categories in upstream order
    pub fn large(&self) -> &[Category] {
        &self.large
    }

    /// Children of the category with this ranking id, in upstream order
    pub fn children(&self, parent_ranking_id: &str) -> &[Category] {
        self.children
            .get(parent_ranking_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get(&self, ranking_id: &str) -> Option<&Category> {
        self.by_ranking_id.get(ranking_id)
    }

    /// Ranking ids of the large tier, used when no category is selected
    pub fn fallback_ids(&self) -> Vec<String> {
        self.large.iter().map(|c| c.ranking_id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.large.is_empty() && self.children.is_empty()
    }
}

/// Build a category along with the ranking id of its parent
fn build(
    raw: RawCategory,
    tier: CategoryTier,
    medium_parents: &HashMap<String, Option<String>>,
) -> (Category, Option<String>) {
    let mut chain = ancestors(raw.parent_id.as_deref(), tier, medium_parents);
    let parent_ranking_id = (!chain.is_empty()).then(|| join(&chain));
    chain.push(raw.id.clone());

    let category = Category {
        ranking_id: join(&chain),
        id: raw.id,
        name: raw.name,
        parent_id: raw.parent_id,
        tier,
        url: raw.url,
    };
    (category, parent_ranking_id)
}

/// Ancestor ids from the top down; a small category's parent is always a medium one
fn ancestors(
    parent_id: Option<&str>,
    tier: CategoryTier,
    medium_parents: &HashMap<String, Option<String>>,
) -> Vec<String> {
    match (tier, parent_id) {
        (CategoryTier::Large, _) | (_, None) => Vec::new(),
        (CategoryTier::Medium, Some(large)) => vec![large.to_string()],
        (CategoryTier::Small, Some(medium)) => match medium_parents.get(medium) {
            Some(Some(large)) => vec![large.clone(), medium.to_string()],
            _ => vec![medium.to_string()],
        },
    }
}

fn join(ids: &[String]) -> String {
    ids.join(&COMPOSITE_SEPARATOR.to_string())
}

/// Fetch the taxonomy and build its index
pub async fn load_categories(
    api: &dyn RecipeApi,
    cancel: &CancellationToken,
) -> Result<CategoryHierarchy, SearchError> {
    let response = api.fetch_categories(cancel).await?;
    Ok(CategoryHierarchy::from_response(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, name: &str, parent: Option<&str>) -> RawCategory {
        RawCategory {
            id: id.to_string(),
            name: name.to_string(),
            url: None,
            parent_id: parent.map(str::to_string),
        }
    }

    fn sample() -> CategoryHierarchy {
        CategoryHierarchy::from_response(CategoryResponse {
            large: vec![raw("10", "肉", None), raw("11", "魚", None)],
            medium: vec![
                raw("275", "牛肉", Some("10")),
                raw("276", "豚肉", Some("10")),
                raw("70", "サーモン", Some("11")),
            ],
            small: vec![raw("516", "牛すじ", Some("275"))],
        })
    }

    #[test]
    fn test_composite_ids() {
        let hierarchy = sample();
        assert_eq!(hierarchy.large()[0].ranking_id, "10");
        assert_eq!(hierarchy.children("10")[0].ranking_id, "10-275");
        assert_eq!(hierarchy.children("10-275")[0].ranking_id, "10-275-516");
        assert!(hierarchy.children("275").is_empty());
        assert_eq!(
            hierarchy.get("10-275-516").map(|c| c.tier),
            Some(CategoryTier::Small)
        );
    }

    #[test]
    fn test_children_keep_upstream_order() {
        let hierarchy = sample();
        let names: Vec<&str> = hierarchy
            .children("10")
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["牛肉", "豚肉"]);
        assert!(hierarchy.children("999").is_empty());
    }

    #[test]
    fn test_fallback_ids_are_large_tier() {
        assert_eq!(sample().fallback_ids(), vec!["10", "11"]);
    }

    #[test]
    fn test_orphan_keeps_resolvable_chain() {
        let hierarchy = CategoryHierarchy::from_response(CategoryResponse {
            large: vec![],
            medium: vec![],
            small: vec![raw("516", "牛すじ", Some("275"))],
        });
        assert_eq!(hierarchy.children("275")[0].ranking_id, "275-516");
    }

    #[test]
    fn test_shared_ids_across_tiers_stay_apart() {
        let hierarchy = CategoryHierarchy::from_response(CategoryResponse {
            large: vec![raw("10", "肉", None), raw("11", "魚", None)],
            medium: vec![raw("10", "鮭", Some("11"))],
            small: vec![raw("5", "鮭フレーク", Some("10"))],
        });

        assert_eq!(hierarchy.large()[0].ranking_id, "10");
        assert!(hierarchy.children("10").is_empty());
        assert_eq!(hierarchy.children("11")[0].ranking_id, "11-10");
        assert_eq!(hierarchy.children("11-10")[0].ranking_id, "11-10-5");
        assert_eq!(hierarchy.get("10").map(|c| c.tier), Some(CategoryTier::Large));
        assert_eq!(
            hierarchy.get("11-10").map(|c| c.tier),
            Some(CategoryTier::Medium)
        );
    }
}
