use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use pinka_api::{AppState, AppStateInner, router};
use pinka_auth::signed_payload;
use pinka_db::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "T";

fn app() -> Router {
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        bot_token: SECRET.into(),
    });
    router(state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(path: &str, body: &Value) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_bot(body: &Value, token: Option<&str>) -> Request<Body> {
    let mut req = Request::post("/api/users/ensure-bot")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        req = req.header("x-bot-token", token);
    }
    req.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let (status, body) = send(&app, Request::get("/api/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn ensure_returns_verified_user() {
    let app = app();
    let init_data = signed_payload(
        &[("auth_date", "1700000000"), ("user", r#"{"id":123,"username":"a"}"#)],
        SECRET,
    );
    let (status, body) = send(
        &app,
        post_json("/api/users/ensure", &json!({ "initData": init_data })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["user"]["tgId"], json!(123));
    assert_eq!(body["user"]["username"], json!("a"));
    assert_eq!(body["user"]["launchCount"], json!(1));
    assert_eq!(body["user"]["botStartCount"], json!(0));
    assert_eq!(body["user"]["presenceSource"], json!("MINIAPP"));
}

#[tokio::test]
async fn ensure_rejects_tampered_hash() {
    let app = app();
    let init_data = signed_payload(
        &[("auth_date", "1700000000"), ("user", r#"{"id":123}"#)],
        SECRET,
    );
    let (prefix, hash) = init_data.rsplit_once("hash=").unwrap();
    let flip = if hash.starts_with('0') { "1" } else { "0" };
    let tampered = format!("{prefix}hash={flip}{}", &hash[1..]);

    let (status, _) = send(
        &app,
        post_json("/api/users/ensure", &json!({ "initData": tampered })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ensure_requires_init_data() {
    let app = app();
    let (status, body) = send(&app, post_json("/api/users/ensure", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], json!(false));
}

#[tokio::test]
async fn ensure_rejects_malformed_user_payload() {
    let app = app();
    let init_data = signed_payload(
        &[("auth_date", "1700000000"), ("user", "not-json")],
        SECRET,
    );
    let (status, _) = send(
        &app,
        post_json("/api/users/ensure", &json!({ "initData": init_data })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ensure_bot_requires_exact_token() {
    let app = app();
    let body = json!({ "tgId": 555 });

    let (status, _) = send(&app, post_bot(&body, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, post_bot(&body, Some("not-it"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ensure_bot_validates_tg_id() {
    let app = app();

    let (status, _) = send(&app, post_bot(&json!({}), Some(SECRET))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, post_bot(&json!({ "tgId": 0 }), Some(SECRET))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ensure_bot_rejects_non_integer_tg_id() {
    let app = app();

    for bad in [json!("abc"), json!(5.5), json!(null), json!([555])] {
        let (status, body) =
            send(&app, post_bot(&json!({ "tgId": bad.clone() }), Some(SECRET))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "tgId={bad}");
        assert_eq!(body["ok"], json!(false), "tgId={bad}");
        assert!(body["error"].is_string(), "tgId={bad}");
    }
}

#[tokio::test]
async fn ensure_bot_twice_counts_both_starts() {
    let app = app();
    let body = json!({ "tgId": 555, "username": "bot_user" });

    let (status, _) = send(&app, post_bot(&body, Some(SECRET))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, res) = send(&app, post_bot(&body, Some(SECRET))).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(res["user"]["botStartCount"], json!(2));
    assert_eq!(res["user"]["launchCount"], json!(0));
    assert_eq!(res["user"]["presenceSource"], json!("BOT"));
}

#[tokio::test]
async fn both_channels_merge_into_one_record() {
    let app = app();
    let init_data = signed_payload(
        &[("auth_date", "1700000000"), ("user", r#"{"id":123,"username":"a"}"#)],
        SECRET,
    );
    send(
        &app,
        post_json("/api/users/ensure", &json!({ "initData": init_data })),
    )
    .await;
    let (_, res) = send(&app, post_bot(&json!({ "tgId": 123 }), Some(SECRET))).await;

    assert_eq!(res["user"]["launchCount"], json!(1));
    assert_eq!(res["user"]["botStartCount"], json!(1));
    assert_eq!(res["user"]["presenceSource"], json!("BOT+MINIAPP"));

    let (_, listing) = send(
        &app,
        Request::get("/api/users").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(listing["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn card_creation_allocates_kid() {
    let app = app();
    let body = json!({
        "cardNo": "777",
        "issuer": "Pinka Plus",
        "cardType": "Personality",
        "series": "Creme",
        "collectionName": "VOID",
        "ownerTgId": 71846656,
    });

    let (status, res) = send(&app, post_json("/api/cards", &body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let kid = res["card"]["kid"].as_str().unwrap();
    assert_eq!(kid.len(), 32);
    assert!(kid.chars().all(|c| c.is_ascii_hexdigit()));

    let (_, listing) = send(&app, Request::get("/api/cards").body(Body::empty()).unwrap()).await;
    assert_eq!(listing["cards"][0]["kid"], json!(kid));
}

#[tokio::test]
async fn card_creation_validates_fields() {
    let app = app();

    let (status, _) = send(
        &app,
        post_json("/api/cards", &json!({ "issuer": "Pinka Plus" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json(
            "/api/cards",
            &json!({
                "issuer": "Pinka Plus",
                "cardType": "Personality",
                "series": "Creme",
                "collectionName": "VOID",
                "ownerTgId": -1,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
