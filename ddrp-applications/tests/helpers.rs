//! Shared fixtures: signed-looking tokens and an in-process mock backend

#![allow(dead_code)]

use axum::{
    extract::{Form, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ddrp_applications::{Notice, NoticeBoard, SessionManager};
use ddrp_client::{ApiClientConfig, BackendClient};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

static TRACING: LazyLock<()> = LazyLock::new(|| {
    let level = if std::env::var("TEST_LOG").is_ok() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
});

pub fn init_tracing() {
    LazyLock::force(&TRACING);
}

/// Token whose payload segment is `payload`; the signature is never checked client-side
pub fn jwt(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}

pub fn token_for(role: &str, user_id: &str, expires_in_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + expires_in_secs;
    jwt(&json!({ "sub": user_id, "role": role, "user_id": user_id, "exp": exp }))
}

pub fn admin_token() -> String {
    token_for("admin", "admin-1", 3600)
}

pub fn customer_token() -> String {
    token_for("customer", "u-1", 3600)
}

pub fn expired_token() -> String {
    token_for("admin", "admin-1", -3600)
}

/// Everything received so far
pub fn drain(receiver: &mut broadcast::Receiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = receiver.try_recv() {
        notices.push(notice);
    }
    notices
}

pub fn messages(receiver: &mut broadcast::Receiver<Notice>) -> Vec<String> {
    drain(receiver).into_iter().map(|n| n.message).collect()
}

/// Mutable backend state shared with the handlers
#[derive(Default)]
pub struct MockState {
    pub admin_tokens: Mutex<HashSet<String>>,
    pub customer_tokens: Mutex<HashSet<String>>,
    pub orders: Mutex<Vec<Value>>,
    pub invoices: Mutex<Vec<Value>>,
    pub invoice_requests: Mutex<Vec<Value>>,
    pub requests: AtomicUsize,
    pub validate_calls: AtomicUsize,
}

impl MockState {
    pub fn accept_admin(&self, token: &str) {
        self.admin_tokens.lock().unwrap().insert(token.to_string());
    }

    pub fn accept_customer(&self, token: &str) {
        self.customer_tokens.lock().unwrap().insert(token.to_string());
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string)
    }

    fn is_admin(&self, headers: &HeaderMap) -> bool {
        Self::bearer(headers).is_some_and(|t| self.admin_tokens.lock().unwrap().contains(&t))
    }

    fn is_known(&self, headers: &HeaderMap) -> bool {
        self.is_admin(headers)
            || Self::bearer(headers)
                .is_some_and(|t| self.customer_tokens.lock().unwrap().contains(&t))
    }
}

type Shared = Arc<MockState>;

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn unauthorized() -> Response {
    detail(StatusCode::UNAUTHORIZED, "Could not validate credentials")
}

pub fn order_json(id: &str, user_id: &str, product: &str, status: &str) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "product": product,
        "quantity": 100,
        "status": status,
        "order_date": "2024-06-01T09:30:00",
        "user_name": "Asha"
    })
}

async fn login(State(state): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let password_ok = form.get("password").map(String::as_str) == Some("secret");
    let token = match form.get("username").map(String::as_str) {
        Some("admin@ddrp.test") if password_ok => {
            let token = admin_token();
            state.accept_admin(&token);
            token
        }
        Some("customer@ddrp.test") if password_ok => {
            let token = customer_token();
            state.accept_customer(&token);
            token
        }
        _ => return detail(StatusCode::UNAUTHORIZED, "Incorrect username or password"),
    };
    Json(json!({ "access_token": token, "token_type": "bearer" })).into_response()
}

async fn validate_token(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    state.validate_calls.fetch_add(1, Ordering::SeqCst);
    if state.is_known(&headers) {
        Json(json!({ "valid": true })).into_response()
    } else {
        unauthorized()
    }
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if body["email"] == "taken@ddrp.test" {
        detail(StatusCode::BAD_REQUEST, "Email already registered")
    } else {
        Json(json!({ "id": "u-9" })).into_response()
    }
}

async fn list_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !state.is_admin(&headers) {
        return unauthorized();
    }
    Json(Value::Array(state.orders.lock().unwrap().clone())).into_response()
}

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !state.is_known(&headers) {
        return unauthorized();
    }
    let mut orders = state.orders.lock().unwrap();
    let id = format!("ord-{}", orders.len() + 1);
    let mut order = order_json(&id, "u-1", "", "Pending");
    order["product"] = body["product"].clone();
    order["quantity"] = body["quantity"].clone();
    orders.push(order.clone());
    Json(order).into_response()
}

async fn user_orders(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !state.is_known(&headers) {
        return unauthorized();
    }
    let orders: Vec<Value> = state
        .orders
        .lock()
        .unwrap()
        .iter()
        .filter(|o| o["user_id"] == user_id.as_str())
        .cloned()
        .collect();
    Json(Value::Array(orders)).into_response()
}

async fn delete_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !state.is_admin(&headers) {
        return unauthorized();
    }
    let mut orders = state.orders.lock().unwrap();
    let before = orders.len();
    orders.retain(|o| o["id"] != id.as_str());
    if orders.len() == before {
        detail(StatusCode::NOT_FOUND, "Order not found")
    } else {
        Json(json!({ "message": "Order deleted" })).into_response()
    }
}

async fn update_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !state.is_admin(&headers) {
        return unauthorized();
    }
    let mut orders = state.orders.lock().unwrap();
    match orders.iter_mut().find(|o| o["id"] == id.as_str()) {
        Some(order) => {
            order["status"] = body["status"].clone();
            Json(order.clone()).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Order not found"),
    }
}

async fn create_invoice(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !state.is_admin(&headers) {
        return unauthorized();
    }
    if body["customer_name"] == "Reject Me" {
        return detail(StatusCode::BAD_REQUEST, "Invalid GSTIN");
    }
    state.invoice_requests.lock().unwrap().push(body.clone());

    let mut invoices = state.invoices.lock().unwrap();
    let id = format!("inv-{}", invoices.len() + 1);
    let invoice = json!({
        "id": id,
        "order_id": body["order_id"],
        "invoice_number": format!("DDRP-{:04}", invoices.len() + 1),
        "customer_name": body["customer_name"],
        "customer_email": body["customer_email"],
        "line_items": [],
        "subtotal": 0.0, "total_cgst": 0.0, "total_sgst": 0.0, "total_igst": 0.0,
        "total_tax": 0.0, "discount_amount": 0.0, "final_amount": 0.0,
        "status": "Pending", "issue_date": "2024-06-02", "due_date": "2024-07-02"
    });
    invoices.push(invoice.clone());
    Json(invoice).into_response()
}

async fn list_invoices(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !state.is_admin(&headers) {
        return unauthorized();
    }
    Json(Value::Array(state.invoices.lock().unwrap().clone())).into_response()
}

async fn list_raw_materials(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !state.is_admin(&headers) {
        return unauthorized();
    }
    Json(json!([{
        "id": "rm-1",
        "order_id": "ord-1",
        "batch_no": "B-7",
        "recipe_no": "R-2",
        "raw_material_quantity": 25.5,
        "rubber_type": "Natural",
        "arrival_date": "2024-06-01"
    }]))
    .into_response()
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/token", post(login))
        .route("/validate_token", get(validate_token))
        .route("/register", post(register))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(user_orders).delete(delete_order))
        .route("/orders/{id}/status", put(update_status))
        .route("/invoices", get(list_invoices))
        .route("/invoices/gst", post(create_invoice))
        .route("/raw-materials", get(list_raw_materials))
        .with_state(state)
}

/// Mock backend bound to an ephemeral port
pub struct TestBackend {
    pub address: String,
    pub state: Arc<MockState>,
    pub client: BackendClient,
}

impl TestBackend {
    pub async fn spawn() -> Self {
        init_tracing();

        let state = Arc::new(MockState::default());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let address = format!("http://{}", listener.local_addr().unwrap());

        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = BackendClient::new(ApiClientConfig::new(address.clone())).unwrap();
        Self {
            address,
            state,
            client,
        }
    }

    /// Session manager validating against this backend, with in-memory storage
    pub fn session_manager(&self) -> Arc<SessionManager> {
        Arc::new(SessionManager::new(
            Arc::new(ddrp_applications::MemorySessionStore::new()),
            Arc::new(self.client.clone()),
            NoticeBoard::default(),
        ))
    }
}
