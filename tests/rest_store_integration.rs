//! Integration tests for the REST store adapter against a stubbed HTTP
//! server: request shapes, auth headers, and error mapping.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shelfwork::core::types::{CollectionId, ItemId, NodeId, Slug};
use shelfwork::store::{ContentStore, NodeDraft, NodePatch, RestStore, StoreError};

fn collection() -> CollectionId {
    CollectionId::new("home.blocks").unwrap()
}

fn store_for(server: &MockServer, token: Option<&str>) -> RestStore {
    RestStore::new(
        server.uri(),
        token.map(String::from),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn list_parses_items_and_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections/home.blocks/items"))
        .and(header("authorization", "Bearer swk_secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "blk_1", "position": 0, "active": true, "payload": {"title": "Hero"}},
            {"id": "blk_2", "position": 1, "active": false}
        ])))
        .mount(&server)
        .await;

    let store = store_for(&server, Some("swk_secret"));
    let items = store.list(&collection()).await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id.as_str(), "blk_1");
    assert_eq!(items[0].payload["title"], "Hero");
    assert!(!items[1].active);
}

#[tokio::test]
async fn batch_order_sends_ordered_id_list() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/collections/home.blocks/order"))
        .and(body_json(json!({"ordered": ["blk_3", "blk_1", "blk_2"]})))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    let ordered = vec![
        ItemId::new("blk_3").unwrap(),
        ItemId::new("blk_1").unwrap(),
        ItemId::new("blk_2").unwrap(),
    ];
    store
        .update_positions_batch(&collection(), &ordered)
        .await
        .unwrap();
}

#[tokio::test]
async fn update_position_and_active_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/collections/home.blocks/items/blk_2/position"))
        .and(body_json(json!({"position": 4})))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/collections/home.blocks/items/blk_2/active"))
        .and(body_json(json!({"active": false})))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    let item = ItemId::new("blk_2").unwrap();
    store.update_position(&collection(), &item, 4).await.unwrap();
    store.update_active(&collection(), &item, false).await.unwrap();
}

#[tokio::test]
async fn create_node_posts_draft_and_parses_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/categories"))
        .and(body_json(json!({
            "parent_id": "cat_1",
            "name": "New Arrivals",
            "slug": "new-arrivals",
            "active": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "cat_9",
            "name": "New Arrivals",
            "slug": "new-arrivals",
            "parent_id": "cat_1",
            "active": true
        })))
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    let parent = NodeId::new("cat_1").unwrap();
    let created = store
        .create_node(
            Some(&parent),
            NodeDraft {
                name: "New Arrivals".into(),
                slug: Slug::new("new-arrivals").unwrap(),
                active: true,
                campaign: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(created.id.as_str(), "cat_9");
    assert_eq!(created.parent_id, Some(parent));
    assert!(created.children.is_empty());
}

#[tokio::test]
async fn patch_clears_campaign_with_explicit_null() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/categories/cat_3"))
        .and(body_json(json!({"campaign": null})))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    store
        .update_node(
            &NodeId::new("cat_3").unwrap(),
            NodePatch::set_campaign(None),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn fetch_tree_parses_nested_forest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/categories/tree"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "cat_1", "name": "Shoes", "slug": "shoes", "active": true,
                "children": [
                    {"id": "cat_2", "name": "Boots", "slug": "boots", "active": true,
                     "parent_id": "cat_1",
                     "campaign": {"starts_at": "2026-06-01T00:00:00Z",
                                   "ends_at": "2026-06-15T00:00:00Z",
                                   "show_countdown": true}}
                ]
            }
        ])))
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    let forest = store.fetch_tree().await.unwrap();

    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].children.len(), 1);
    let boots = &forest[0].children[0];
    assert_eq!(boots.slug.as_str(), "boots");
    let window = boots.campaign.unwrap();
    assert!(window.show_countdown);
    assert!(window.starts_at.unwrap() < window.ends_at.unwrap());
}

#[tokio::test]
async fn error_statuses_map_to_store_errors() {
    let server = MockServer::start().await;
    for (status, node, body) in [
        (404, "cat_404", json!({"message": "no such category"})),
        (409, "cat_409", json!({"message": "category has children"})),
        (422, "cat_422", json!({"message": "cycle detected"})),
        (429, "cat_429", json!({"message": "slow down"})),
    ] {
        Mock::given(method("DELETE"))
            .and(path(format!("/categories/{node}")))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
    }

    async fn delete(store: &RestStore, name: &str) -> Result<(), StoreError> {
        store.delete_node(&NodeId::new(name).unwrap()).await
    }

    let store = store_for(&server, Some("swk_secret"));
    assert!(matches!(
        delete(&store, "cat_404").await,
        Err(StoreError::NotFound(message)) if message == "no such category"
    ));
    assert!(matches!(
        delete(&store, "cat_409").await,
        Err(StoreError::NotEmpty(_))
    ));
    assert!(matches!(
        delete(&store, "cat_422").await,
        Err(StoreError::ApiError { status: 422, .. })
    ));
    assert!(matches!(
        delete(&store, "cat_429").await,
        Err(StoreError::RateLimited)
    ));
}

#[tokio::test]
async fn unauthorized_without_token_is_auth_required() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/categories/tree"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let unauthenticated = store_for(&server, None);
    assert!(matches!(
        unauthenticated.fetch_tree().await,
        Err(StoreError::AuthRequired)
    ));

    let expired = store_for(&server, Some("swk_stale"));
    assert!(matches!(
        expired.fetch_tree().await,
        Err(StoreError::AuthFailed(_))
    ));
}
