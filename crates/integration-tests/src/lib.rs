//! Integration tests for Cornershop.
//!
//! Each test starts an in-process mock of the backend REST API, then serves
//! the real storefront or admin router against it on a loopback port. A
//! cookie-keeping HTTP client drives the pages like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cornershop-integration-tests
//! ```
//!
//! # Mock backend
//!
//! - `shopper@example.com` / `secret` signs in as a regular user (`u1`)
//! - `admin@example.com` / `secret` signs in as an admin (`a1`)
//! - The cart appends a new line on every add, as the real backend does
//! - Every request is recorded with its `Cookie` header
//! - Coupon `SAVE10` takes 10% off the cart total
//! - [`MockBackend::set_failing`] makes every GET answer 500

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{Method, StatusCode};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

/// Password accepted for both mock accounts.
pub const PASSWORD: &str = "secret";
pub const SHOPPER_EMAIL: &str = "shopper@example.com";
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// One request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path including the `/api` prefix.
    pub path: String,
    pub cookie: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    requests: Vec<Recorded>,
    carts: HashMap<String, Vec<Value>>,
    categories: Vec<Value>,
    failing: bool,
}

type Shared = Arc<Mutex<Inner>>;

fn lock(state: &Shared) -> MutexGuard<'_, Inner> {
    state.lock().expect("mock backend state poisoned")
}

/// In-process stand-in for the backend REST API.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(Inner {
            categories: vec![json!({ "_id": "c1", "name": "Tea" })],
            ..Inner::default()
        }));
        let addr = serve(router(state.clone())).await;
        Self { addr, state }
    }

    /// Base URL to configure the apps with.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        lock(&self.state).requests.clone()
    }

    /// Requests matching `method` and `path` exactly.
    #[must_use]
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// Raw cart lines stored for a user.
    #[must_use]
    pub fn cart_lines(&self, user_id: &str) -> usize {
        lock(&self.state).carts.get(user_id).map_or(0, Vec::len)
    }

    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }
}

/// Serve `router` on an ephemeral loopback port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback port");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    addr
}

/// Start the storefront against `backend` and return its base URL.
pub async fn start_storefront(backend: &MockBackend) -> String {
    use cornershop_storefront::config::StorefrontConfig;
    use cornershop_storefront::state::AppState;

    let api_url = backend.api_url();
    let config = StorefrontConfig::from_lookup(|key| match key {
        "STOREFRONT_BASE_URL" => Some("http://127.0.0.1:3000".to_string()),
        "CORNERSHOP_API_URL" => Some(api_url.clone()),
        "CORNERSHOP_API_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .expect("storefront config");
    let state = AppState::new(config).expect("storefront state");
    let addr = serve(cornershop_storefront::app(state)).await;
    format!("http://{addr}")
}

/// Start the admin panel against `backend` and return its base URL.
pub async fn start_admin(backend: &MockBackend) -> String {
    use cornershop_admin::config::AdminConfig;
    use cornershop_admin::state::AppState;

    let api_url = backend.api_url();
    let config = AdminConfig::from_lookup(|key| match key {
        "ADMIN_BASE_URL" => Some("http://127.0.0.1:3001".to_string()),
        "CORNERSHOP_API_URL" => Some(api_url.clone()),
        "CORNERSHOP_API_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .expect("admin config");
    let state = AppState::new(config).expect("admin state");
    let addr = serve(cornershop_admin::app(state)).await;
    format!("http://{addr}")
}

/// A client that keeps cookies and does not follow redirects.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("HTTP client")
}

/// Undo the HTML escaping of attribute values so hrefs can be compared.
#[must_use]
pub fn unescape(html: &str) -> String {
    html.replace("&#x2f;", "/")
        .replace("&#47;", "/")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&#38;", "&")
        .replace("&amp;", "&")
}

// =============================================================================
// Mock routes
// =============================================================================

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/product", get(products))
        .route("/product/{id}", get(product))
        .route("/category", get(categories).post(create_category))
        .route("/offers", get(empty_list))
        .route("/order", get(empty_list))
        .route("/coupon", get(empty_list))
        .route("/coupon/validate", post(validate_coupon))
        .route("/user/login", post(login))
        .route("/user/logout", post(acknowledge))
        .route("/cart", post(add_to_cart))
        .route("/cart/{user_id}", get(cart).put(set_quantity))
        .route("/cart/{user_id}/{product_id}", delete(remove_from_cart));

    Router::new()
        .nest("/api", api)
        .layer(from_fn_with_state(state.clone(), record))
        .with_state(state)
}

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn catalog() -> Vec<Value> {
    vec![
        json!({
            "_id": "p1",
            "name": "Green tea",
            "description": "Loose leaf sencha",
            "price": 12.5,
            "category": "c1",
            "stock": 10,
            "images": []
        }),
        json!({
            "_id": "p2",
            "name": "Ceramic mug",
            "description": "Holds 350ml",
            "price": 30,
            "discountPrice": 24,
            "category": "c1",
            "stock": 4,
            "images": []
        }),
    ]
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let cookie = request
        .headers()
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let failing = {
        let mut inner = lock(&state);
        inner.requests.push(Recorded {
            method: request.method().to_string(),
            path: request.uri().path().to_owned(),
            cookie,
        });
        inner.failing
    };

    if failing && request.method() == Method::GET {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "database unavailable" })),
        )
            .into_response();
    }
    next.run(request).await
}

async fn products() -> Response {
    ok(Value::Array(catalog()))
}

async fn product(Path(id): Path<String>) -> Response {
    match catalog().into_iter().find(|p| p["_id"] == id.as_str()) {
        Some(found) => ok(found),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Product not found" })),
        )
            .into_response(),
    }
}

async fn categories(State(state): State<Shared>) -> Response {
    ok(Value::Array(lock(&state).categories.clone()))
}

async fn create_category(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut inner = lock(&state);
    let id = format!("c{}", inner.categories.len() + 1);
    let mut category = body;
    category["_id"] = Value::String(id);
    inner.categories.push(category.clone());
    ok(category)
}

async fn empty_list() -> Response {
    ok(json!([]))
}

fn acknowledged() -> Response {
    Json(json!({ "success": true })).into_response()
}

async fn acknowledge() -> Response {
    acknowledged()
}

/// `SAVE10` takes 10% off; every other code is refused.
async fn validate_coupon(Json(body): Json<Value>) -> Response {
    let total = body["total"].as_f64().unwrap_or_default();
    if body["code"] != "SAVE10" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "Coupon is not valid" })),
        )
            .into_response();
    }
    let discount = (total * 10.0).round() / 100.0;
    ok(json!({ "code": "SAVE10", "discount": discount, "total": total - discount }))
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let (id, name, role) = match (email, password) {
        (SHOPPER_EMAIL, PASSWORD) => ("u1", "Sam Shopper", "user"),
        (ADMIN_EMAIL, PASSWORD) => ("a1", "Alex Admin", "admin"),
        _ => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "success": false, "message": "Invalid credentials" })),
            )
                .into_response();
        }
    };

    let user = json!({ "_id": id, "name": name, "email": email, "role": role });
    (
        [(SET_COOKIE, format!("token=tok-{id}; Path=/; HttpOnly"))],
        Json(json!({ "success": true, "data": user })),
    )
        .into_response()
}

async fn cart(State(state): State<Shared>, Path(user_id): Path<String>) -> Response {
    let items = lock(&state).carts.get(&user_id).cloned().unwrap_or_default();
    ok(json!({ "userId": user_id, "items": items }))
}

async fn add_to_cart(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let user_id = body["userId"].as_str().unwrap_or_default().to_owned();
    let line = json!({
        "productId": body["productId"],
        "name": body["name"],
        "price": body["price"],
        "quantity": body["quantity"],
    });
    lock(&state).carts.entry(user_id).or_default().push(line);
    acknowledged()
}

async fn set_quantity(
    State(state): State<Shared>,
    Path(user_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let product_id = body["productId"].clone();
    {
        let mut inner = lock(&state);
        let lines = inner.carts.entry(user_id).or_default();
        let template = lines.iter().find(|l| l["productId"] == product_id).cloned();
        lines.retain(|l| l["productId"] != product_id);
        if let Some(mut line) = template {
            line["quantity"] = body["quantity"].clone();
            lines.push(line);
        }
    }
    acknowledged()
}

async fn remove_from_cart(
    State(state): State<Shared>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> Response {
    if let Some(lines) = lock(&state).carts.get_mut(&user_id) {
        lines.retain(|l| l["productId"] != product_id.as_str());
    }
    acknowledged()
}
