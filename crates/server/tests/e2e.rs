use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use configs::AppConfig;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use service::storage::{Backend, DocumentId};
use tower::Service;
use uuid::Uuid;

use server::auth::Claims;
use server::routes;
use server::startup::{build_cors, build_state};

const SECRET: &str = "test-secret";

struct TestApp {
    router: Router,
    data_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

fn write_json(dir: &Path, name: &str, value: Value) -> anyhow::Result<()> {
    std::fs::write(dir.join(name), serde_json::to_vec_pretty(&value)?)?;
    Ok(())
}

async fn build_app() -> anyhow::Result<TestApp> {
    let data_dir = std::env::temp_dir().join(format!("heritage-e2e-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&data_dir)?;
    write_json(&data_dir, "users.json", json!([
        {"id": 1, "name": "Kavya", "email": "kavya@example.com", "bookmarks": [], "itineraries": []}
    ]))?;
    write_json(&data_dir, "heritage.json", json!([
        {"id": 1, "name": "Shore Temple", "location": "Mahabalipuram", "category": "Temple", "entry_fee": "₹40"},
        {"id": 2, "name": "Fort St. George", "location": "Chennai", "category": "Fort"},
        {"id": 3, "name": "Pancha Rathas", "location": "Mahabalipuram", "category": "Temple"}
    ]))?;
    write_json(&data_dir, "crafts.json", json!([
        {"id": 1, "name": "Kanchipuram Silk Sarees", "category": "Textile", "priceRange": "₹5000+"}
    ]))?;
    write_json(&data_dir, "lang.json", json!({"en": {"title": "Heritage Explorer"}}))?;

    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = SECRET.into();
    cfg.storage.data_dir = data_dir.clone();
    let backend = Backend::file(&data_dir);
    let router = routes::build_router(build_state(&cfg, &backend), build_cors(&cfg.cors.origins()));
    Ok(TestApp { router, data_dir })
}

fn token_for(user_id: DocumentId) -> anyhow::Result<String> {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize;
    Ok(encode(&Header::default(), &Claims { user_id, exp }, &EncodingKey::from_secret(SECRET.as_bytes()))?)
}

async fn send(app: &TestApp, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let resp = app.router.clone().call(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    Ok((status, body))
}

fn get(uri: &str, token: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {t}"));
    }
    Ok(builder.body(Body::empty())?)
}

fn post(uri: &str, token: &str, body: Value) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(&body)?))?)
}

#[tokio::test]
async fn health_and_docs() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, body) = send(&app, get("/api/health", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("OK"));

    let (status, body) = send(&app, get("/api-docs/openapi.json", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/bookmarks/add").is_some());
    Ok(())
}

#[tokio::test]
async fn catalog_lists_filters_and_lang() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, body) = send(&app, get("/api/heritage", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(3));

    let (_, temples) = send(&app, get("/api/heritage?category=Temple", None)?).await?;
    let names: Vec<&str> = temples.as_array().into_iter().flatten().filter_map(|d| d["name"].as_str()).collect();
    assert_eq!(names, vec!["Shore Temple", "Pancha Rathas"]);

    let (status, market) = send(&app, get("/api/marketplace", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(market, json!([]));

    let (_, lang) = send(&app, get("/api/lang", None)?).await?;
    assert_eq!(lang["en"]["title"], json!("Heritage Explorer"));
    Ok(())
}

#[tokio::test]
async fn storage_failure_is_a_generic_500() -> anyhow::Result<()> {
    let app = build_app().await?;
    std::fs::write(app.data_dir.join("crafts.json"), b"{ not json")?;
    let (status, body) = send(&app, get("/api/crafts", None)?).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Server error"}));
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_valid_token() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, body) = send(&app, get("/api/bookmarks", None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Access token required"));

    let (status, _) = send(&app, get("/api/bookmarks", Some("not-a-jwt"))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let expired = encode(
        &Header::default(),
        &Claims { user_id: DocumentId::Int(1), exp: 1 },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )?;
    let (status, _) = send(&app, get("/api/itinerary", Some(&expired))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn bookmark_flow() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = token_for(DocumentId::Int(1))?;

    let (status, body) = send(&app, post("/api/bookmarks/add", &token, json!({"placeName": "Shore Temple"}))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Bookmark added", "bookmarks": ["Shore Temple"]}));

    let (status, body) = send(&app, post("/api/bookmarks/add", &token, json!({"placeName": "Shore Temple"}))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Already bookmarked"));

    send(&app, post("/api/bookmarks/add", &token, json!({"placeName": "Pancha Rathas"}))?).await?;
    let (_, body) = send(&app, post("/api/bookmarks/remove", &token, json!({"placeName": "Shore Temple"}))?).await?;
    assert_eq!(body["bookmarks"], json!(["Pancha Rathas"]));

    let (_, body) = send(&app, get("/api/bookmarks", Some(&token))?).await?;
    assert_eq!(body, json!({"bookmarks": ["Pancha Rathas"]}));

    // string ids from the account service still find integer file ids
    let text_token = token_for(DocumentId::Text("1".into()))?;
    let (status, _) = send(&app, get("/api/bookmarks", Some(&text_token))?).await?;
    assert_eq!(status, StatusCode::OK);

    let stranger = token_for(DocumentId::Int(42))?;
    let (status, body) = send(&app, get("/api/bookmarks", Some(&stranger))?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("User not found"));
    Ok(())
}

#[tokio::test]
async fn itinerary_generate_save_list() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = token_for(DocumentId::Int(1))?;

    let req = json!({"travelers": 2, "duration": "3", "budget": 10000, "interests": ["temples"]});
    let (status, generated) = send(&app, post("/api/itinerary/generate", &token, req)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(generated["summary"]["packageName"], json!("Chennai Weekend Package"));
    assert_eq!(generated["summary"]["estimatedTotalCost"], json!(16000));
    assert_eq!(generated["summary"]["budgetMatch"], json!(false));
    assert_eq!(generated["itinerary"][1]["places"][0]["entry_fee"], json!("₹40"));
    assert_eq!(generated["itinerary"][2]["places"][0]["entry_fee"], json!("₹5000+"));

    let (status, body) = send(&app, post("/api/itinerary/generate", &token, json!({"duration": 6}))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid duration selected"));

    let huge = json!({"travelers": i64::MAX, "duration": 3});
    let (status, body) = send(&app, post("/api/itinerary/generate", &token, huge)?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid number of travelers"));

    let (status, saved) = send(&app, post("/api/itinerary/save", &token, json!({"itineraryData": generated}))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["message"], json!("Itinerary saved"));
    assert_eq!(saved["itinerary"]["title"], json!("Chennai Weekend Package"));
    assert_eq!(saved["itinerary"]["estimatedCost"], json!(16000));

    let (_, listed) = send(&app, get("/api/itinerary", Some(&token))?).await?;
    assert_eq!(listed["itineraries"], Value::Array(vec![saved["itinerary"].clone()]));
    Ok(())
}

#[tokio::test]
async fn cors_allows_configured_origin() -> anyhow::Result<()> {
    let app = build_app().await?;
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/heritage")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "GET")
        .body(Body::empty())?;
    let resp = app.router.clone().call(req).await?;
    let allowed = resp.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok());
    assert_eq!(allowed, Some("http://localhost:5173"));
    assert_eq!(
        resp.headers().get("access-control-allow-credentials").and_then(|v| v.to_str().ok()),
        Some("true")
    );

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/heritage")
        .header("origin", "https://evil.example")
        .header("access-control-request-method", "GET")
        .body(Body::empty())?;
    let resp = app.router.clone().call(req).await?;
    assert!(resp.headers().get("access-control-allow-origin").is_none());
    Ok(())
}
