//! In-process fake cluster for integration tests
//!
//! Serves the admin/data routes and `/query/service` from one actix-web app
//! bound to two ephemeral ports, keeps buckets, documents and users in
//! memory, and records every request it receives.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::net::TcpListener;
use std::sync::Mutex;

use actix_web::http::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use cbrest_rs::{Client, ConnectionConfig};
use serde_json::{json, Value};

/// Basic credentials for Administrator:password
pub const DEFAULT_AUTH: &str = "Basic QWRtaW5pc3RyYXRvcjpwYXNzd29yZA==";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub form: Vec<(String, String)>,
    pub json: Option<Value>,
}

impl RecordedRequest {
    pub fn form_field(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct ClusterData {
    buckets: BTreeMap<String, Value>,
    documents: BTreeMap<(String, String), Value>,
    users: BTreeMap<String, Vec<(String, String)>>,
    requests: Vec<RecordedRequest>,
    failing_paths: HashSet<String>,
    pools_status: u16,
}

pub struct FakeState {
    expected_auth: String,
    data: Mutex<ClusterData>,
}

impl FakeState {
    fn record(&self, req: &HttpRequest, form: Vec<(String, String)>, json: Option<Value>) {
        let header = |name: HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let recorded = RecordedRequest {
            method: req.method().to_string(),
            path: req.path().to_string(),
            content_type: header(CONTENT_TYPE),
            authorization: header(AUTHORIZATION),
            form,
            json,
        };
        self.data.lock().unwrap().requests.push(recorded);
    }

    /// Auth and injected-failure checks shared by every authenticated route
    fn reject(&self, req: &HttpRequest) -> Option<HttpResponse> {
        let authorized = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v == self.expected_auth)
            .unwrap_or(false);
        if !authorized {
            return Some(HttpResponse::Unauthorized().body(""));
        }

        if self.data.lock().unwrap().failing_paths.contains(req.path()) {
            return Some(
                HttpResponse::BadRequest()
                    .json(json!({"errors": {"_": "injected failure"}})),
            );
        }

        None
    }
}

pub struct FakeCluster {
    pub state: web::Data<FakeState>,
    pub admin_port: u16,
    pub query_port: u16,
}

impl FakeCluster {
    pub async fn start() -> Self {
        Self::start_with_auth(DEFAULT_AUTH).await
    }

    pub async fn start_with_auth(expected_auth: &str) -> Self {
        let admin = TcpListener::bind("127.0.0.1:0").unwrap();
        let query = TcpListener::bind("127.0.0.1:0").unwrap();
        let admin_port = admin.local_addr().unwrap().port();
        let query_port = query.local_addr().unwrap().port();

        let state = web::Data::new(FakeState {
            expected_auth: expected_auth.to_string(),
            data: Mutex::new(ClusterData {
                pools_status: 200,
                ..ClusterData::default()
            }),
        });

        let app_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_state.clone())
                .configure(configure)
        })
        .workers(1)
        .disable_signals()
        .listen(admin)
        .unwrap()
        .listen(query)
        .unwrap()
        .run();

        tokio::spawn(server);

        Self {
            state,
            admin_port,
            query_port,
        }
    }

    pub fn config(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: "127.0.0.1".to_string(),
            admin_port: self.admin_port,
            query_port: self.query_port,
            ..ConnectionConfig::default()
        }
    }

    pub fn client(&self) -> Client {
        client_for(self.config())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.data.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request recorded")
    }

    /// Make every authenticated call to `path` answer 400
    pub fn fail_path(&self, path: &str) {
        self.state
            .data
            .lock()
            .unwrap()
            .failing_paths
            .insert(path.to_string());
    }

    pub fn set_pools_status(&self, status: u16) {
        self.state.data.lock().unwrap().pools_status = status;
    }
}

/// Client that ignores system proxy settings, so loopback calls stay local
pub fn client_for(config: ConnectionConfig) -> Client {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    Client::with_http_client(config, http).unwrap()
}

/// A port nothing is listening on
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

type Form = web::Form<Vec<(String, String)>>;

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().body("Requested resource not found.\r\n")
}

fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/pools", web::get().to(pools))
        .route("/pools/default", web::post().to(setup_step))
        .route("/node/controller/setupServices", web::post().to(setup_step))
        .route("/settings/web", web::post().to(setup_step))
        .route("/settings/indexes", web::post().to(setup_step))
        .route("/settings/rbac/users/local/{id}", web::put().to(put_user))
        .route("/settings/rbac/users/local/{id}", web::delete().to(delete_user))
        .route("/pools/default/buckets", web::get().to(list_buckets))
        .route("/pools/default/buckets", web::post().to(create_bucket))
        // Specific bucket sub-routes before the bare bucket routes
        .route(
            "/pools/default/buckets/{bucket}/controller/doFlush",
            web::post().to(flush_bucket),
        )
        .route(
            "/pools/default/buckets/{bucket}/docs/{key}",
            web::get().to(get_document),
        )
        .route(
            "/pools/default/buckets/{bucket}/docs/{key}",
            web::post().to(insert_document),
        )
        .route("/pools/default/buckets/{bucket}", web::get().to(get_bucket))
        .route("/pools/default/buckets/{bucket}", web::post().to(edit_bucket))
        .route("/pools/default/buckets/{bucket}", web::delete().to(delete_bucket))
        .route("/query/service", web::post().to(query_service));
}

async fn pools(req: HttpRequest, state: web::Data<FakeState>) -> HttpResponse {
    state.record(&req, Vec::new(), None);
    let status = state.data.lock().unwrap().pools_status;
    let status = actix_web::http::StatusCode::from_u16(status).unwrap();
    HttpResponse::build(status).json(json!({"isAdminCreds": false, "pools": []}))
}

async fn setup_step(req: HttpRequest, form: Form, state: web::Data<FakeState>) -> HttpResponse {
    state.record(&req, form.into_inner(), None);
    if let Some(rejection) = state.reject(&req) {
        return rejection;
    }
    HttpResponse::Ok().body("")
}

async fn put_user(
    req: HttpRequest,
    path: web::Path<String>,
    form: Form,
    state: web::Data<FakeState>,
) -> HttpResponse {
    let form = form.into_inner();
    state.record(&req, form.clone(), None);
    if let Some(rejection) = state.reject(&req) {
        return rejection;
    }
    state
        .data
        .lock()
        .unwrap()
        .users
        .insert(path.into_inner(), form);
    HttpResponse::Ok().body("\"\"")
}

async fn delete_user(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<FakeState>,
) -> HttpResponse {
    state.record(&req, Vec::new(), None);
    if let Some(rejection) = state.reject(&req) {
        return rejection;
    }
    match state.data.lock().unwrap().users.remove(&path.into_inner()) {
        Some(_) => HttpResponse::Ok().body("\"\""),
        None => HttpResponse::NotFound().body("\"User was not found.\""),
    }
}

async fn list_buckets(req: HttpRequest, state: web::Data<FakeState>) -> HttpResponse {
    state.record(&req, Vec::new(), None);
    if let Some(rejection) = state.reject(&req) {
        return rejection;
    }
    let buckets: Vec<Value> = state.data.lock().unwrap().buckets.values().cloned().collect();
    HttpResponse::Ok().json(buckets)
}

async fn create_bucket(req: HttpRequest, form: Form, state: web::Data<FakeState>) -> HttpResponse {
    let form = form.into_inner();
    state.record(&req, form.clone(), None);
    if let Some(rejection) = state.reject(&req) {
        return rejection;
    }

    let name = match form.iter().find(|(k, _)| k == "name") {
        Some((_, name)) => name.clone(),
        None => {
            return HttpResponse::BadRequest()
                .json(json!({"errors": {"name": "Bucket name needs to be specified"}}))
        }
    };

    let mut data = state.data.lock().unwrap();
    if data.buckets.contains_key(&name) {
        return HttpResponse::BadRequest()
            .json(json!({"errors": {"name": "Bucket with given name already exists"}}));
    }

    let mut bucket = serde_json::Map::new();
    for (key, value) in form {
        bucket.insert(key, Value::String(value));
    }
    data.buckets.insert(name, Value::Object(bucket));
    HttpResponse::Accepted().body("")
}

async fn get_bucket(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<FakeState>,
) -> HttpResponse {
    state.record(&req, Vec::new(), None);
    if let Some(rejection) = state.reject(&req) {
        return rejection;
    }
    match state.data.lock().unwrap().buckets.get(&path.into_inner()) {
        Some(bucket) => HttpResponse::Ok().json(bucket),
        None => not_found(),
    }
}

async fn edit_bucket(
    req: HttpRequest,
    path: web::Path<String>,
    form: Form,
    state: web::Data<FakeState>,
) -> HttpResponse {
    let form = form.into_inner();
    state.record(&req, form.clone(), None);
    if let Some(rejection) = state.reject(&req) {
        return rejection;
    }
    let mut data = state.data.lock().unwrap();
    match data.buckets.get_mut(&path.into_inner()) {
        Some(Value::Object(bucket)) => {
            for (key, value) in form {
                bucket.insert(key, Value::String(value));
            }
            HttpResponse::Ok().body("")
        }
        _ => not_found(),
    }
}

async fn delete_bucket(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<FakeState>,
) -> HttpResponse {
    state.record(&req, Vec::new(), None);
    if let Some(rejection) = state.reject(&req) {
        return rejection;
    }
    let name = path.into_inner();
    let mut data = state.data.lock().unwrap();
    match data.buckets.remove(&name) {
        Some(_) => {
            data.documents.retain(|(bucket, _), _| *bucket != name);
            HttpResponse::Ok().body("")
        }
        None => not_found(),
    }
}

async fn flush_bucket(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<FakeState>,
) -> HttpResponse {
    state.record(&req, Vec::new(), None);
    if let Some(rejection) = state.reject(&req) {
        return rejection;
    }
    let name = path.into_inner();
    let mut data = state.data.lock().unwrap();
    if !data.buckets.contains_key(&name) {
        return not_found();
    }
    data.documents.retain(|(bucket, _), _| *bucket != name);
    HttpResponse::Ok().body("")
}

async fn get_document(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    state: web::Data<FakeState>,
) -> HttpResponse {
    state.record(&req, Vec::new(), None);
    if let Some(rejection) = state.reject(&req) {
        return rejection;
    }
    let (bucket, key) = path.into_inner();
    match state.data.lock().unwrap().documents.get(&(bucket, key.clone())) {
        Some(doc) => HttpResponse::Ok().json(json!({
            "meta": {"id": key, "rev": "1-0000000000000001", "flags": 0},
            "json": doc,
        })),
        None => HttpResponse::NotFound().json(json!({"error": "not_found", "reason": "not found"})),
    }
}

async fn insert_document(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    form: Form,
    state: web::Data<FakeState>,
) -> HttpResponse {
    let form = form.into_inner();
    state.record(&req, form.clone(), None);
    if let Some(rejection) = state.reject(&req) {
        return rejection;
    }
    let (bucket, key) = path.into_inner();

    let value = match form.iter().find(|(k, _)| k == "value") {
        Some((_, raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(value) => value,
            Err(_) => return HttpResponse::BadRequest().json(json!({"value": "Invalid JSON"})),
        },
        None => return HttpResponse::BadRequest().json(json!({"value": "Missing value"})),
    };

    let mut data = state.data.lock().unwrap();
    if !data.buckets.contains_key(&bucket) {
        return not_found();
    }
    data.documents.insert((bucket, key), value);
    HttpResponse::Ok().body("")
}

/// Echoes the request body back as the single result row.
/// Statements `FAIL` and `NO_RESULTS` trigger a 500 and a results-less body.
async fn query_service(
    req: HttpRequest,
    body: web::Json<Value>,
    state: web::Data<FakeState>,
) -> HttpResponse {
    let body = body.into_inner();
    state.record(&req, Vec::new(), Some(body.clone()));
    if let Some(rejection) = state.reject(&req) {
        return rejection;
    }

    match body.get("statement").and_then(Value::as_str) {
        Some("FAIL") => HttpResponse::InternalServerError().json(json!({
            "errors": [{"code": 3000, "msg": "syntax error"}],
            "status": "fatal",
        })),
        Some("NO_RESULTS") => HttpResponse::Ok().json(json!({"status": "success"})),
        _ => HttpResponse::Ok().json(json!({
            "requestID": "5b2b8f3e",
            "results": [{"echo": body}],
            "status": "success",
        })),
    }
}
