//! `SteamSource` against a local HTTP stub: request shapes, status and
//! payload classification, and the game lookup chain.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use std::time::Duration;

use common::{Reply, StubServer};
use serde_json::json;
use steamwatch_types::ItemKind;
use steamwatch_upstream::{
    Description, ItemState, Lookup, SteamSource, UpstreamError, UpstreamSource,
};

const WORKSHOP_PATH: &str = "/ISteamRemoteStorage/GetPublishedFileDetails/v1/";
const APP_DETAILS_PATH: &str = "/store/appdetails";
const NEWS_PATH: &str = "/ISteamNews/GetNewsForApp/v2/";

fn workshop_item(result: i64, time_updated: i64) -> serde_json::Value {
    json!({
        "response": {
            "result": 1,
            "resultcount": 1,
            "publishedfiledetails": [{
                "publishedfileid": "42",
                "result": result,
                "title": "Ace Mod",
                "time_updated": time_updated
            }]
        }
    })
}

fn available(id: &str, name: &str) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    body.insert(
        id.to_owned(),
        json!({ "success": true, "data": { "name": name } }),
    );
    serde_json::Value::Object(body)
}

fn news(dates: &[i64]) -> serde_json::Value {
    let items: Vec<_> = dates.iter().map(|date| json!({ "date": date })).collect();
    json!({ "appnews": { "appid": 730, "newsitems": items } })
}

fn source(stub: &StubServer, api_key: Option<&str>) -> SteamSource {
    SteamSource::new(&stub.client_config(api_key)).unwrap()
}

#[tokio::test]
async fn workshop_lookup_posts_a_single_item_form() {
    let stub = StubServer::start(|_| Reply::ok(workshop_item(1, 1_700_000_150))).await;

    let lookup = source(&stub, None).fetch(ItemKind::WorkshopMod, "42").await;

    assert_eq!(
        lookup,
        Ok(Lookup::Found(ItemState {
            update_timestamp: 1_700_000_150,
            title: Some("Ace Mod".to_owned()),
        }))
    );
    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path(), WORKSHOP_PATH);
    assert!(requests[0].body.contains("itemcount=1"));
    assert!(requests[0].body.contains("publishedfileids%5B0%5D=42"));
}

#[tokio::test]
async fn workshop_result_code_other_than_ok_is_not_found() {
    let stub = StubServer::start(|_| Reply::ok(workshop_item(9, 0))).await;

    let lookup = source(&stub, None).fetch(ItemKind::WorkshopMod, "42").await;

    assert_eq!(lookup, Ok(Lookup::NotFound));
}

#[tokio::test]
async fn server_error_is_a_status_failure() {
    let stub = StubServer::start(|_| Reply::Json(500, "{}".to_owned())).await;

    let lookup = source(&stub, None).fetch(ItemKind::WorkshopMod, "42").await;

    assert_eq!(
        lookup,
        Err(UpstreamError::Status {
            endpoint: "workshop",
            status: 500,
        })
    );
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let stub = StubServer::start(|_| Reply::Json(200, "<html>busy</html>".to_owned())).await;

    let lookup = source(&stub, None).fetch(ItemKind::WorkshopMod, "42").await;

    assert!(matches!(
        lookup,
        Err(UpstreamError::Malformed { endpoint: "workshop", .. })
    ));
}

#[tokio::test]
async fn unanswered_request_times_out() {
    let stub = StubServer::start(|_| Reply::Hang).await;
    let mut config = stub.client_config(None);
    config.request_timeout = Duration::from_millis(200);

    let lookup = SteamSource::new(&config)
        .unwrap()
        .fetch(ItemKind::WorkshopMod, "42")
        .await;

    assert_eq!(lookup, Err(UpstreamError::Timeout { endpoint: "workshop" }));
}

#[tokio::test]
async fn unavailable_game_is_not_found_without_a_news_call() {
    let stub = StubServer::start(|_| Reply::ok(json!({ "7": { "success": false } }))).await;

    let lookup = source(&stub, None).fetch(ItemKind::Game, "7").await;

    assert_eq!(lookup, Ok(Lookup::NotFound));
    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path(), APP_DETAILS_PATH);
    assert_eq!(requests[0].query(), "appids=7");
}

#[tokio::test]
async fn null_app_details_is_malformed_not_missing() {
    let stub = StubServer::start(|_| Reply::Json(200, "null".to_owned())).await;

    let lookup = source(&stub, None).fetch(ItemKind::Game, "7").await;

    assert!(matches!(
        lookup,
        Err(UpstreamError::Malformed { endpoint: "appdetails", .. })
    ));
    assert_eq!(stub.requests().len(), 1);
}

#[tokio::test]
async fn available_game_takes_newest_news_date_and_sends_key() {
    let stub = StubServer::start(|request| {
        if request.path() == APP_DETAILS_PATH {
            Reply::ok(available("730", "Counter-Strike 2"))
        } else {
            Reply::ok(news(&[1_700_000_500, 1_600_000_000]))
        }
    })
    .await;

    let lookup = source(&stub, Some("SECRET")).fetch(ItemKind::Game, "730").await;

    assert_eq!(
        lookup,
        Ok(Lookup::Found(ItemState {
            update_timestamp: 1_700_000_500,
            title: None,
        }))
    );
    let requests = stub.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].query(), "appids=730");
    assert_eq!(requests[1].path(), NEWS_PATH);
    let query = requests[1].query();
    assert!(query.contains("appid=730"));
    assert!(query.contains("count=1"));
    assert!(query.contains("key=SECRET"));
}

#[tokio::test]
async fn game_without_news_is_no_change_and_sends_no_key() {
    let stub = StubServer::start(|request| {
        if request.path() == APP_DETAILS_PATH {
            Reply::ok(available("730", "Counter-Strike 2"))
        } else {
            Reply::ok(news(&[]))
        }
    })
    .await;

    let lookup = source(&stub, None).fetch(ItemKind::Game, "730").await;

    assert_eq!(lookup, Ok(Lookup::NoChange));
    let requests = stub.requests();
    assert_eq!(requests.len(), 2);
    assert!(!requests[1].query().contains("key="));
}

#[tokio::test]
async fn news_failure_surfaces_as_transient() {
    let stub = StubServer::start(|request| {
        if request.path() == APP_DETAILS_PATH {
            Reply::ok(available("730", "Counter-Strike 2"))
        } else {
            Reply::Json(503, String::new())
        }
    })
    .await;

    let lookup = source(&stub, None).fetch(ItemKind::Game, "730").await;

    assert_eq!(
        lookup,
        Err(UpstreamError::Status {
            endpoint: "news",
            status: 503,
        })
    );
}

#[tokio::test]
async fn describe_game_uses_store_name_and_news_date() {
    let stub = StubServer::start(|request| {
        if request.path() == APP_DETAILS_PATH {
            Reply::ok(available("730", "Counter-Strike 2"))
        } else {
            Reply::ok(news(&[1_700_000_500]))
        }
    })
    .await;

    let described = source(&stub, None).describe(ItemKind::Game, "730").await;

    assert_eq!(
        described,
        Ok(Some(Description {
            name: "Counter-Strike 2".to_owned(),
            update_timestamp: Some(1_700_000_500),
        }))
    );
}

#[tokio::test]
async fn describe_workshop_mod_uses_title() {
    let stub = StubServer::start(|_| Reply::ok(workshop_item(1, 99))).await;

    let described = source(&stub, None).describe(ItemKind::WorkshopMod, "42").await;

    assert_eq!(
        described,
        Ok(Some(Description {
            name: "Ace Mod".to_owned(),
            update_timestamp: Some(99),
        }))
    );
}
