//! Integration test: full page flow against a local capture server.
//!
//! Configures an entity, runs page requests through the curl-backed
//! forwarder, and asserts on what the external endpoint received.

mod common;

use pfwd_core::config::PfwdConfig;
use pfwd_core::events::EventPayload;
use pfwd_core::forwarder::{ParameterForwarder, Stage};
use pfwd_core::page::PageContext;
use pfwd_core::request::QueryParams;
use pfwd_core::session::Session;
use pfwd_core::settings::{
    SettingValue, KEY_AUTHENTICATION_BEARER, KEY_ENABLED, KEY_PARAM_NAME, KEY_REQUEST_URL,
};
use pfwd_core::store::Store;
use serde_json::{json, Map};
use tempfile::tempdir;

async fn forwarder_for(url: &str, store: &Store) -> ParameterForwarder {
    forwarder_with_token(url, "tok", store).await
}

async fn forwarder_with_token(url: &str, token: &str, store: &Store) -> ParameterForwarder {
    store.upsert_entity("42", &Map::new()).await.unwrap();
    let pf = ParameterForwarder::with_curl(store.clone(), &PfwdConfig::default());
    pf.new_settings(
        "42",
        &[
            (KEY_ENABLED.to_string(), SettingValue::Bool(true)),
            (KEY_REQUEST_URL.to_string(), SettingValue::Text(url.to_string())),
            (KEY_AUTHENTICATION_BEARER.to_string(), SettingValue::Text(token.to_string())),
            (KEY_PARAM_NAME.to_string(), SettingValue::Text("p".to_string())),
        ],
    )
    .await
    .unwrap();
    pf
}

fn payload() -> EventPayload {
    EventPayload::from_pairs([("surveyId", "42")])
}

#[tokio::test]
async fn page_request_posts_form_with_bearer_and_publishes_json() {
    let (url, captured) = common::capture_server::start(r#"{"ok":true}"#);
    let state_dir = tempdir().unwrap();
    let store = Store::open_at(state_dir.path().join("pfwd.db")).await.unwrap();
    let pf = forwarder_for(&url, &store).await;

    let mut session = Session::new();
    let mut page = PageContext::new();
    let out = pf
        .before_page(&payload(), &QueryParams::parse("p=alice"), &mut session, &mut page)
        .await;

    assert_eq!(out.stage, Stage::Done);
    assert_eq!(page.forward_result(), Some(&json!({"ok": true})));

    let reqs = captured.lock().unwrap().clone();
    assert_eq!(reqs.len(), 1);
    let req = &reqs[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/get");
    assert_eq!(req.body, "p=alice");
    assert_eq!(req.header("Authorization"), Some("Bearer tok"));
    assert_eq!(
        req.header("Content-Type"),
        Some("application/x-www-form-urlencoded")
    );
}

#[tokio::test]
async fn session_value_survives_store_round_trip() {
    let (url, captured) = common::capture_server::start("[1,2,3]");
    let state_dir = tempdir().unwrap();
    let store = Store::open_at(state_dir.path().join("pfwd.db")).await.unwrap();
    let pf = forwarder_for(&url, &store).await;

    let mut session = store.load_session("visitor").await.unwrap();
    let mut page = PageContext::new();
    pf.before_page(&payload(), &QueryParams::parse("p=bob+smith"), &mut session, &mut page)
        .await;
    assert!(session.is_dirty());
    store.save_session("visitor", &session).await.unwrap();

    let mut session = store.load_session("visitor").await.unwrap();
    let mut page = PageContext::new();
    let out = pf
        .before_page(&payload(), &QueryParams::default(), &mut session, &mut page)
        .await;
    assert_eq!(out.result, Some(json!([1, 2, 3])));
    assert!(!session.is_dirty());

    let reqs = captured.lock().unwrap().clone();
    assert_eq!(reqs.len(), 2);
    assert_eq!(reqs[1].body, "p=bob+smith");
}

#[tokio::test]
async fn non_json_reply_publishes_null() {
    let (url, captured) = common::capture_server::start("<html>maintenance</html>");
    let state_dir = tempdir().unwrap();
    let store = Store::open_at(state_dir.path().join("pfwd.db")).await.unwrap();
    let pf = forwarder_for(&url, &store).await;

    let mut session = Session::new();
    let mut page = PageContext::new();
    let out = pf
        .before_page(&payload(), &QueryParams::parse("p=alice"), &mut session, &mut page)
        .await;
    assert_eq!(out.stage, Stage::Done);
    assert!(page.forward_result().is_none());
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unreachable_endpoint_degrades_to_null() {
    let state_dir = tempdir().unwrap();
    let store = Store::open_at(state_dir.path().join("pfwd.db")).await.unwrap();
    let pf = forwarder_for("http://127.0.0.1:1/get", &store).await;

    let mut session = Session::new();
    let mut page = PageContext::new();
    let out = pf
        .before_page(&payload(), &QueryParams::parse("p=alice"), &mut session, &mut page)
        .await;
    assert_eq!(out.stage, Stage::Forwarded);
    assert!(page.forward_result().is_none());
}

#[tokio::test]
async fn bearer_token_is_sent_byte_for_byte() {
    let (url, captured) = common::capture_server::start("{}");
    let state_dir = tempdir().unwrap();
    let store = Store::open_at(state_dir.path().join("pfwd.db")).await.unwrap();
    let pf = forwarder_with_token(&url, " spaced token ", &store).await;

    let mut session = Session::new();
    let mut page = PageContext::new();
    pf.before_page(&payload(), &QueryParams::parse("p=alice"), &mut session, &mut page)
        .await;

    let reqs = captured.lock().unwrap().clone();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].header("Authorization"), Some("Bearer  spaced token "));
}
