use mockito::{Matcher, Server};
use recipe_ranking_search::upstream::RawSearchResponse;
use recipe_ranking_search::{normalize, RecipeSearch, SearchRequest, SourceEndpoint};
use serde_json::json;

#[test]
fn test_envelope_and_flat_shapes_agree_on_items() {
    let flat: RawSearchResponse = serde_json::from_value(json!({
        "result": [{"recipeId": 1}, {"recipeId": 2}]
    }))
    .unwrap();
    let envelope: RawSearchResponse = serde_json::from_value(json!({
        "result": {"recipe": [{"recipeId": 1}, {"recipeId": 2}], "page": 1, "hits": 2, "count": 2}
    }))
    .unwrap();

    let flat = normalize(flat);
    let envelope = normalize(envelope);
    let ids = |items: &[recipe_ranking_search::RecipeItem]| -> Vec<u64> {
        items.iter().map(|i| i.id).collect()
    };
    assert_eq!(ids(&flat.items), ids(&envelope.items));
    assert!(flat.items.iter().all(|i| i.rank.is_none()));
    assert_eq!(envelope.items[1].rank.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_search_endpoint_envelope_end_to_end() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/Recipe/Search/20170426")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("categoryId".into(), "30".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("hits".into(), "5".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "result": {
                    "recipe": [
                        {"recipeId": 10, "recipeTitle": "鶏の照り焼き 簡単", "recipeMaterial": ["鶏もも肉"]},
                        {"recipeId": 11, "recipeTitle": "鮭のムニエル", "recipeMaterial": ["鮭"]},
                        {"recipeId": 12, "recipeTitle": "簡単 鶏ハム", "recipeMaterial": ["鶏むね肉"]}
                    ],
                    "page": 1,
                    "hits": 5,
                    "count": 3,
                    "lastUpdated": "2024-06-01 12:00:00"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let session = RecipeSearch::builder()
        .application_id("test-app")
        .base_url(server.url())
        .source(SourceEndpoint::Search)
        .build()
        .unwrap();

    let request = SearchRequest::new()
        .category("30")
        .keyword("鶏 簡単")
        .result_limit(5);
    let result = session
        .search(request)
        .await
        .into_result()
        .unwrap()
        .unwrap();

    let ids: Vec<u64> = result.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![10, 12]);
    assert_eq!(result.items[1].rank.as_deref(), Some("2"));
    assert_eq!(result.last_updated.as_deref(), Some("2024-06-01 12:00:00"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_malformed_result_is_empty_not_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/Recipe/CategoryRanking/20170426")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"result": "unavailable"}).to_string())
        .create_async()
        .await;

    let session = RecipeSearch::builder()
        .application_id("test-app")
        .base_url(server.url())
        .build()
        .unwrap();

    let result = session
        .search(SearchRequest::new().category("10"))
        .await
        .into_result()
        .unwrap()
        .unwrap();
    assert!(result.items.is_empty());
    assert_eq!(result.total_matched, Some(0));
}
