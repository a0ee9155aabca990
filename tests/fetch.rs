use dashboard::fetch::{ApiClient, FetchError, SanctionsBackend};
use dashboard::query::QueryState;
use mockito::{Matcher, Server};
use serde_json::json;

fn entity_json(id: &str) -> serde_json::Value {
    json!({
        "entity_id": id,
        "name": format!("Entity {id}"),
        "program": "CYBER2",
        "authority": "OFAC",
        "source_url": "https://sanctionslist.example/entry",
        "addresses": [
            {"address": "0xabc", "chain": "ethereum", "date": "2023-08-08"}
        ]
    })
}

#[tokio::test]
async fn paged_shape_is_decoded() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/risk/sanctions/latest")
        .match_query(Matcher::Exact("limit=50&offset=0".into()))
        .with_body(json!({"items": [entity_json("e1")], "total": 97}).to_string())
        .create_async()
        .await;

    let api = ApiClient::new(server.url());
    let page = api.sanctions_page(&QueryState::default()).await.unwrap();
    assert_eq!(page.total, 97);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].entity_id, "e1");
    assert_eq!(page.items[0].addresses[0].chain, "ethereum");
    mock.assert_async().await;
}

#[tokio::test]
async fn legacy_bare_array_falls_back_to_page_length() {
    let mut server = Server::new_async().await;
    let rows: Vec<_> = (0..12).map(|i| entity_json(&format!("e{i}"))).collect();
    let _mock = server
        .mock("GET", "/risk/sanctions/latest")
        .match_query(Matcher::Any)
        .with_body(serde_json::Value::Array(rows).to_string())
        .create_async()
        .await;

    let api = ApiClient::new(server.url());
    let query = QueryState::default();
    let page = api.sanctions_page(&query).await.unwrap();
    // Inexact by design: the array length stands in for the count, so the
    // walk degrades to a single page.
    assert_eq!(page.total, 12);
    assert_eq!(query.total_pages(page.total), 1);
}

#[tokio::test]
async fn active_filters_reach_the_wire() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/risk/sanctions/latest")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "50".into()),
            Matcher::UrlEncoded("offset".into(), "100".into()),
            Matcher::UrlEncoded("search".into(), "tornado".into()),
            Matcher::UrlEncoded("authority".into(), "OFAC".into()),
        ]))
        .with_body(json!({"items": [], "total": 0}).to_string())
        .create_async()
        .await;

    let mut query = QueryState::default();
    query.raw_search = "tornado".into();
    query.commit_search();
    query.select_authority("OFAC".into());
    query.page_index = 2;

    let api = ApiClient::new(server.url());
    api.sanctions_page(&query).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn non_success_status_maps_to_http_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/risk/sanctions/latest")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let api = ApiClient::new(server.url());
    let err = api
        .sanctions_page(&QueryState::default())
        .await
        .unwrap_err();
    match &err {
        FetchError::Http(status) => assert_eq!(status.as_u16(), 503),
        other => panic!("expected http error, got {other:?}"),
    }
    assert_eq!(err.kind(), "http");
}

#[tokio::test]
async fn unrecognised_body_maps_to_shape_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/risk/sanctions/latest")
        .match_query(Matcher::Any)
        .with_body(json!({"unexpected": true}).to_string())
        .create_async()
        .await;

    let api = ApiClient::new(server.url());
    let err = api
        .sanctions_page(&QueryState::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Shape(_)));
    assert_eq!(err.kind(), "shape");
}

#[tokio::test]
async fn unreachable_host_maps_to_transport_error() {
    // Nothing listens on port 9; the request fails before any response.
    let api = ApiClient::new("http://127.0.0.1:9");
    let err = api
        .sanctions_page(&QueryState::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
    assert_eq!(err.kind(), "transport");
}
