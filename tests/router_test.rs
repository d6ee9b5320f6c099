mod common;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::png;
use estate_hub::config::AppConfig;
use estate_hub::server::{router, AppState};

const BOUNDARY: &str = "estate-hub-test-boundary";

fn app() -> Router {
    router(AppState::in_memory(AppConfig::default()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn multipart_request(uri: &str, parts: &[(&str, &str, &str, Vec<u8>)]) -> Request<Body> {
    let mut body = Vec::new();
    for (field, file_name, content_type, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn listing_body(title: &str, price: i64) -> Value {
    json!({
        "title": title,
        "property_type": "apartment",
        "listing_type": "rent",
        "price": price,
        "location": { "city": "Mumbai", "district": "Bandra" },
        "bedrooms": 2,
        "bathrooms": 2
    })
}

#[tokio::test]
async fn health_check() {
    let (status, body) = send(&app(), empty_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn created_property_is_listed_until_deleted() {
    let app = app();

    let (status, created) = send(
        &app,
        json_request("POST", "/api/properties", listing_body("Bandra 2BHK", 85_000)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], "PROP-00001");
    assert_eq!(created["images"], json!([]));

    let (_, listed) = send(&app, empty_request("GET", "/api/properties?district=bandra")).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, empty_request("DELETE", "/api/properties/PROP-00001")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = send(&app, empty_request("GET", "/api/properties")).await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, body) = send(&app, empty_request("GET", "/api/properties/PROP-00001")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, empty_request("DELETE", "/api/properties/PROP-00001")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn listing_filters_by_price() {
    let app = app();
    for (title, price) in [("Cheap", 20_000), ("Mid", 60_000), ("Pricey", 150_000)] {
        send(&app, json_request("POST", "/api/properties", listing_body(title, price))).await;
    }

    let (_, listed) = send(
        &app,
        empty_request("GET", "/api/properties?min_price=30000&sort=price_desc"),
    )
    .await;
    let titles: Vec<_> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Pricey", "Mid"]);
}

#[tokio::test]
async fn multipart_upload_attaches_images() {
    let app = app();
    send(&app, json_request("POST", "/api/properties", listing_body("Sea face", 300_000))).await;

    let request = multipart_request(
        "/api/properties/PROP-00001/images",
        &[
            ("thumbnail", "front.png", "image/png", png(24, 16)),
            ("images", "front.png", "image/png", png(24, 16)),
            ("images", "balcony.png", "image/png", png(24, 16)),
            ("images", "notes.txt", "text/plain", b"hello".to_vec()),
        ],
    );
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    let thumbnail = body["property"]["thumbnail_image"].as_str().unwrap();
    assert!(thumbnail.contains("/properties/PROP-00001/"));
    assert!(thumbnail.ends_with("/thumbnail.webp"));
    assert_eq!(body["property"]["images"].as_array().unwrap().len(), 1);
    assert_eq!(body["notices"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn multipart_upload_requires_image_thumbnail() {
    let app = app();
    send(&app, json_request("POST", "/api/properties", listing_body("Plot", 10_000))).await;

    let request = multipart_request(
        "/api/properties/PROP-00001/images",
        &[("thumbnail", "deed.pdf", "application/pdf", b"%PDF-1.4".to_vec())],
    );
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn registration_enforces_password_policy_and_login_locks() {
    let app = app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            json!({
                "name": "Arjun",
                "email": "arjun@example.com",
                "phone": "+91 90000 12345",
                "password": "9000012345"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, user) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            json!({
                "name": "Arjun",
                "email": "arjun@example.com",
                "phone": "+91 90000 12345",
                "password": "terrace-garden",
                "role": "agent"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(user["security"].get("password_hash").is_none());
    assert!(user["agent"].is_object());

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "arjun@example.com", "password": "terrace-garden" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut last = StatusCode::OK;
    for _ in 0..5 {
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/login",
                json!({ "email": "arjun@example.com", "password": "wrong-guess" }),
            ),
        )
        .await;
        last = status;
    }
    assert_eq!(last, StatusCode::LOCKED);
}

#[tokio::test]
async fn agent_view_totals_are_kept() {
    let app = app();
    let (_, agent) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            json!({
                "name": "Farah",
                "email": "farah@example.com",
                "password": "open-plan-loft",
                "role": "agent"
            }),
        ),
    )
    .await;
    let agent_id = agent["id"].as_str().unwrap().to_string();

    let mut body = listing_body("Farah's listing", 40_000);
    body["agent_id"] = json!(agent_id);
    send(&app, json_request("POST", "/api/properties", body)).await;

    send(&app, empty_request("POST", "/api/properties/PROP-00001/views")).await;
    send(&app, empty_request("DELETE", "/api/properties/PROP-00001")).await;

    let (_, owned) = send(
        &app,
        empty_request("GET", &format!("/api/agents/{agent_id}/properties")),
    )
    .await;
    assert!(owned.as_array().unwrap().is_empty());

    let (_, agent) = send(&app, empty_request("GET", &format!("/api/users/{agent_id}"))).await;
    assert_eq!(agent["agent"]["total_properties"], 1);
    assert_eq!(agent["agent"]["total_views"], 1);
}

#[tokio::test]
async fn refresh_reports_no_listeners() {
    let (status, body) = send(&app(), empty_request("POST", "/api/events/refresh")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delivered"], 0);
}

#[tokio::test]
async fn profile_update_keeps_role_credentials_and_totals() {
    let app = app();
    let (_, agent) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            json!({
                "name": "Ishaan",
                "email": "ishaan@example.com",
                "password": "corner-plot-9",
                "role": "agent"
            }),
        ),
    )
    .await;
    let agent_id = agent["id"].as_str().unwrap().to_string();

    let mut body = listing_body("Ishaan's flat", 55_000);
    body["agent_id"] = json!(agent_id);
    send(&app, json_request("POST", "/api/properties", body)).await;
    send(&app, empty_request("POST", "/api/properties/PROP-00001/views")).await;

    let (_, mut fetched) = send(&app, empty_request("GET", &format!("/api/users/{agent_id}"))).await;
    fetched["role"] = json!("admin");
    fetched["agent"]["total_views"] = json!(0);
    fetched["agent"]["total_properties"] = json!(0);
    fetched["bio"] = json!("Flats near the station");

    let (status, updated) = send(
        &app,
        json_request("PUT", &format!("/api/users/{agent_id}"), fetched),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["role"], "agent");
    assert_eq!(updated["profile"]["bio"], "Flats near the station");
    assert_eq!(updated["agent"]["total_views"], 1);
    assert_eq!(updated["agent"]["total_properties"], 1);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "ishaan@example.com", "password": "corner-plot-9" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleted_property_rejects_views_and_images() {
    let app = app();
    send(&app, json_request("POST", "/api/properties", listing_body("Retired", 5_000))).await;
    send(&app, empty_request("DELETE", "/api/properties/PROP-00001")).await;

    let (status, _) = send(&app, empty_request("POST", "/api/properties/PROP-00001/views")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = multipart_request(
        "/api/properties/PROP-00001/images",
        &[("thumbnail", "front.png", "image/png", png(8, 8))],
    );
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, all) = send(&app, empty_request("GET", "/api/admin/properties")).await;
    assert_eq!(all[0]["views"], 0);
    assert!(all[0]["thumbnail_image"].is_null());
}
