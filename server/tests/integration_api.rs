use axum::body::Body;
use axum::extract::Query;
use axum::http::{Request, StatusCode};
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::{build_app, AppConfig};
use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;
use tokio::net::TcpListener;
use tower::ServiceExt;

fn write_dataset(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("consolidated_data.json");
    let data = json!({
        "b1": {
            "title": "Great Gatsby",
            "authors": ["F. Scott Fitzgerald"],
            "narrators": [{"id": "n1", "name": "Jake Gyllenhaal"}],
            "genres": ["Classics"],
            "idDownload": "DL-1",
            "language": "en"
        },
        "b2": {
            "title": "Great Expectations",
            "authors": [{"id": "a2", "name": "Charles Dickens"}],
            "narrators": ["Simon Vance"],
            "genres": ["Classics", "Great Books"],
            "idDownload": "DL-2"
        },
        "b3": {
            "title": "Bleak House",
            "authors": ["Charles Dickens"],
            "narrators": ["Sean Barrett"],
            "genres": ["Drama"],
            "idDownload": "DL-3"
        },
        "b4": {"title": "Hard Times", "authors": ["Charles Dickens"], "genres": ["Satire"], "idDownload": "DL-4"},
        "b5": {"title": "Oliver Twist", "authors": ["Charles Dickens"], "genres": ["Drama"], "idDownload": "DL-5"}
    });
    fs::write(&path, serde_json::to_vec(&data).unwrap()).unwrap();
    path
}

fn app_with(data_path: std::path::PathBuf, redirect_template: Option<String>) -> Router {
    build_app(AppConfig {
        data_path,
        redirect_template,
        redirect_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn keys(json: &Value) -> Vec<String> {
    json["data"].as_object().unwrap().keys().cloned().collect()
}

#[tokio::test]
async fn lists_everything_without_query() {
    let dir = tempdir().unwrap();
    let app = app_with(write_dataset(dir.path()), None);

    let (status, json) = call(app, "/api/audiobooks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(keys(&json), vec!["b1", "b2", "b3", "b4", "b5"]);
    assert_eq!(json["pagination"], json!({"total": 5, "per_page": 20, "current_page": 1, "total_pages": 1}));
    assert_eq!(json["data"]["b1"]["language"], "en");
}

#[tokio::test]
async fn query_terms_are_anded() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path());

    let (_, json) = call(app_with(path.clone(), None), "/api/audiobooks?query=great").await;
    assert_eq!(keys(&json), vec!["b1", "b2"]);
    let (_, json) = call(app_with(path.clone(), None), "/api/audiobooks?query=great%20gatsby").await;
    assert_eq!(keys(&json), vec!["b1"]);
    let (_, json) = call(app_with(path, None), "/api/audiobooks?query=gatsby+expectations").await;
    assert_eq!(json["pagination"]["total"], 0);
}

#[tokio::test]
async fn type_restricts_to_field() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path());

    // "books" only appears in a genre
    let (_, json) = call(app_with(path.clone(), None), "/api/audiobooks?query=books&type=title").await;
    assert_eq!(json["pagination"]["total"], 0);
    let (_, json) = call(app_with(path.clone(), None), "/api/audiobooks?query=books&type=genre").await;
    assert_eq!(keys(&json), vec!["b2"]);
    let (_, json) = call(app_with(path.clone(), None), "/api/audiobooks?query=dickens&type=author").await;
    assert_eq!(keys(&json), vec!["b2", "b3", "b4", "b5"]);
    let (_, json) = call(app_with(path, None), "/api/audiobooks?query=gyllenhaal&type=narrator").await;
    assert_eq!(keys(&json), vec!["b1"]);
}

#[tokio::test]
async fn out_of_range_page_is_clamped() {
    let dir = tempdir().unwrap();
    let app = app_with(write_dataset(dir.path()), None);

    let (status, json) = call(app, "/api/audiobooks?page=99&per_page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(keys(&json), vec!["b5"]);
    assert_eq!(json["pagination"], json!({"total": 5, "per_page": 2, "current_page": 3, "total_pages": 3}));
}

#[tokio::test]
async fn per_page_bounds_are_validated() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path());

    let (status, json) = call(app_with(path.clone(), None), "/api/audiobooks?per_page=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(keys(&json), vec!["b1"]);
    let (status, _) = call(app_with(path.clone(), None), "/api/audiobooks?per_page=100").await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = call(app_with(path.clone(), None), "/api/audiobooks?per_page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("per_page"));
    let (status, _) = call(app_with(path.clone(), None), "/api/audiobooks?per_page=101").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(app_with(path.clone(), None), "/api/audiobooks?page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, json) = call(app_with(path.clone(), None), "/api/audiobooks?page=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("Failed to deserialize query string"));
    let (status, json) = call(app_with(path, None), "/api/audiobooks?type=publisher").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("publisher"));
}

#[tokio::test]
async fn book_lookup_by_primary_then_download_id() {
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path());

    let (status, by_primary) = call(app_with(path.clone(), None), "/api/book/b2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_primary["title"], "Great Expectations");
    let (status, by_download) = call(app_with(path.clone(), None), "/api/book/DL-2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_download, by_primary);

    let (status, json) = call(app_with(path, None), "/api/book/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({"error": "Audiobook not found"}));
}

#[tokio::test]
async fn missing_dataset_serves_empty_catalog() {
    let dir = tempdir().unwrap();
    let app = app_with(dir.path().join("nowhere.json"), None);

    let (status, json) = call(app.clone(), "/api/audiobooks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pagination"]["total"], 0);
    assert_eq!(json["pagination"]["total_pages"], 1);
    let (status, _) = call(app, "/api/audiobooks?query=great").await;
    assert_eq!(status, StatusCode::OK);
}

/// Stand-in for the download host: redirects to a file URL keyed by `id`.
async fn spawn_download_host() -> SocketAddr {
    let app = Router::new()
        .route(
            "/api/v1/redirectdownload/tituloaudilibro.mp3",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let id = q.get("id").cloned().unwrap_or_default();
                let id: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
                Redirect::temporary(&format!("/files/{id}.mp3"))
            }),
        )
        .route("/files/:name", get(|| async { "audio" }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn redirect_follows_to_final_url() {
    let addr = spawn_download_host().await;
    let template = format!("http://{addr}{}", server::REDIRECT_PATH_TEMPLATE);
    let dir = tempdir().unwrap();
    let app = app_with(write_dataset(dir.path()), Some(template));

    let (status, json) = call(app, "/api/redirect/DL-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["url"], format!("http://{addr}/files/DL-1.mp3"));
}

#[tokio::test]
async fn redirect_keeps_reserved_characters_in_id() {
    let addr = spawn_download_host().await;
    let template = format!("http://{addr}{}", server::REDIRECT_PATH_TEMPLATE);
    let dir = tempdir().unwrap();
    let path = write_dataset(dir.path());

    // DL#1 and DL&x=1 must reach the host whole
    let (status, json) = call(app_with(path.clone(), Some(template.clone())), "/api/redirect/DL%231").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["url"], format!("http://{addr}/files/DL%231.mp3"));
    let (status, json) = call(app_with(path, Some(template)), "/api/redirect/DL%26x%3D1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["url"], format!("http://{addr}/files/DL%26x%3D1.mp3"));
}

#[tokio::test]
async fn redirect_failure_is_500_with_message() {
    // bind then drop to get a port nothing listens on
    let port = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap().port();
    let template = format!("http://127.0.0.1:{port}/api/v1/redirectdownload/tituloaudilibro.mp3?a=0&id={{id}}");
    let dir = tempdir().unwrap();
    let app = app_with(write_dataset(dir.path()), Some(template));

    let (status, json) = call(app, "/api/redirect/DL-1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!json["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn redirect_without_host_is_500() {
    let dir = tempdir().unwrap();
    let app = app_with(write_dataset(dir.path()), None);
    let (status, json) = call(app, "/api/redirect/DL-1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "redirect host not configured");
}

#[tokio::test]
async fn health_and_cors() {
    let dir = tempdir().unwrap();
    let app = app_with(write_dataset(dir.path()), None);
    let req = Request::get("/health")
        .header("Origin", "http://example.org")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}
