use anyhow::Result;
use axum::{extract::{rejection::QueryRejection, Path, Query, State}, http::{HeaderValue, StatusCode}, routing::get, Json, Router};
use catalog::{paginate, Catalog, FieldType, PageInfo, Record, MAX_PER_PAGE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const DEFAULT_DATA_PATH: &str = "public/data/consolidated_data.json";
pub const REDIRECT_PATH_TEMPLATE: &str = "/api/v1/redirectdownload/tituloaudilibro.mp3?a=0&id={id}";
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    /// Download URL with an `{id}` placeholder; `None` disables `/api/redirect`.
    pub redirect_template: Option<String>,
    pub redirect_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            redirect_template: None,
            redirect_timeout: Duration::from_secs(15),
        }
    }
}

/// `https://{host}/api/v1/redirectdownload/...&id={id}`
pub fn redirect_template_for_host(host: &str) -> String {
    format!("https://{}{}", host.trim_end_matches('/'), REDIRECT_PATH_TEMPLATE)
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    #[serde(rename = "type", default)]
    pub field: FieldType,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}
fn default_page() -> usize { 1 }
fn default_per_page() -> usize { 20 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub data: BTreeMap<String, Record>,
    pub pagination: PageInfo,
}

#[derive(Serialize)]
pub struct RedirectResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { error: message.into() }))
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub http: reqwest::Client,
    pub redirect_template: Option<Arc<str>>,
}

pub fn build_app(config: AppConfig) -> Result<Router> {
    // A bad dataset degrades to an empty catalog rather than failing startup
    let catalog = Catalog::load(&config.data_path);
    build_app_with_catalog(catalog, &config)
}

pub fn build_app_with_catalog(catalog: Catalog, config: &AppConfig) -> Result<Router> {
    let http = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(config.redirect_timeout)
        .build()?;
    if config.redirect_template.is_none() {
        tracing::warn!("no download host configured; /api/redirect will answer 500");
    }
    let app_state = AppState {
        catalog: Arc::new(catalog),
        http,
        redirect_template: config.redirect_template.as_deref().map(Arc::from),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/audiobooks", get(search_handler))
        .route("/api/book/:id", get(book_handler))
        .route("/api/redirect/:id", get(redirect_handler))
        .with_state(app_state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

/// Any origin unless `CORS_ALLOW_ORIGIN` lists specific ones.
fn cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
        .max_age(Duration::from_secs(3600));
    let origins: Vec<HeaderValue> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(AllowOrigin::list(origins))
    }
}

pub async fn search_handler(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params.map_err(|rej| api_error(StatusCode::BAD_REQUEST, rej.body_text()))?;
    if params.page < 1 {
        return Err(api_error(StatusCode::BAD_REQUEST, "page must be >= 1"));
    }
    if !(1..=MAX_PER_PAGE).contains(&params.per_page) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("per_page must be between 1 and {MAX_PER_PAGE}"),
        ));
    }

    let catalog = &state.catalog;
    let hits = catalog.search(params.query.as_deref(), params.field);
    let (page_ids, pagination) = paginate(&hits, params.page, params.per_page);

    let mut data = BTreeMap::new();
    for &doc_id in page_ids {
        if let (Some(id), Some(record)) = (catalog.store.record_id(doc_id), catalog.store.record(doc_id)) {
            data.insert(id.to_string(), record.clone());
        }
    }
    tracing::debug!(query = ?params.query, field = ?params.field, total = pagination.total, "search");
    Ok(Json(SearchResponse { data, pagination }))
}

pub async fn book_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record>, ApiError> {
    match state.catalog.store.lookup(&id) {
        Some((_, record)) => Ok(Json(record.clone())),
        None => Err(api_error(StatusCode::NOT_FOUND, "Audiobook not found")),
    }
}

/// Resolve the download URL for `id` by following the host's redirects.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RedirectResponse>, ApiError> {
    let template = state
        .redirect_template
        .as_deref()
        .ok_or_else(|| api_error(StatusCode::INTERNAL_SERVER_ERROR, "redirect host not configured"))?;
    // the id lands in the query string
    let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
    let target = template.replace("{id}", &encoded);

    match state.http.head(&target).send().await {
        Ok(resp) => {
            tracing::debug!(%id, status = %resp.status(), url = %resp.url(), "resolved download url");
            Ok(Json(RedirectResponse { url: resp.url().to_string() }))
        }
        Err(err) => {
            tracing::error!(%id, error = %err, "redirect resolution failed");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
        }
    }
}
