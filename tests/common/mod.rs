#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use phishguard_client::config::AppConfig;
use phishguard_client::gateway::{CredentialStore, MemoryCredentialStore};
use phishguard_client::App;

pub const PASSWORD: &str = "correct-horse-battery";

/// One request as the mock backend saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

/// Knobs a test can turn, before or during a run
#[derive(Debug, Clone)]
pub struct Behavior {
    pub valid_tokens: HashSet<String>,
    pub children: Vec<Value>,
    pub analytics: Value,
    pub logs: Vec<Value>,
    /// Respond without the `children` / `logs` fields
    pub omit_lists: bool,
    /// Respond with `children` / `logs` set to null
    pub null_lists: bool,
    /// Route name -> artificial latency
    pub delays: HashMap<&'static str, Duration>,
    /// Route names answering 500
    pub failing: HashSet<&'static str>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            valid_tokens: HashSet::from(["t1".to_string()]),
            children: vec![
                json!({ "_id": "c1", "name": "Mia", "deviceId": "dev-aaaaaaaaaaaa", "isActive": true, "filteringLevel": "strict" }),
                json!({ "_id": "c2", "name": "Leo", "deviceId": "dev-bbbbbbbbbbbb", "isActive": false }),
            ],
            analytics: json!({ "total": 200, "blocked": 47 }),
            logs: (0..10)
                .map(|i| {
                    let status = if i % 2 == 0 { "blocked" } else { "allowed" };
                    json!({
                        "_id": format!("l{}", i),
                        "domain": format!("site{}.example", i),
                        "childId": { "_id": "c1", "name": "Mia" },
                        "status": status,
                        "timestamp": format!("2026-10-{:02}T12:00:00Z", 18 - i)
                    })
                })
                .collect(),
            omit_lists: false,
            null_lists: false,
            delays: HashMap::new(),
            failing: HashSet::new(),
        }
    }
}

#[derive(Default)]
pub struct MockState {
    pub requests: Mutex<Vec<Recorded>>,
    pub behavior: Mutex<Behavior>,
}

pub struct MockBackend {
    pub port: u16,
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Result<Self> {
        Self::with_behavior(Behavior::default()).await
    }

    pub async fn with_behavior(behavior: Behavior) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = Arc::new(MockState {
            requests: Mutex::new(Vec::new()),
            behavior: Mutex::new(behavior),
        });

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind mock backend")?;
        let router = router(Arc::clone(&state));
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self { port, base_url, state })
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    pub fn update(&self, f: impl FnOnce(&mut Behavior)) {
        f(&mut self.state.behavior.lock().unwrap());
    }

    /// App wired to this backend with an in-memory credential
    pub fn app(&self, token: Option<&str>) -> (App, Arc<MemoryCredentialStore>) {
        let credentials = Arc::new(match token {
            Some(token) => MemoryCredentialStore::with_token(token),
            None => MemoryCredentialStore::new(),
        });
        let store: Arc<dyn CredentialStore> = credentials.clone();
        let app = App::new(AppConfig::for_api_url(self.base_url.clone()), store).expect("app");
        (app, credentials)
    }
}

fn router(state: Arc<MockState>) -> Router {
    let api = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify", post(acknowledge))
        .route("/auth/forgot-password", post(acknowledge))
        .route("/auth/reset-password", post(acknowledge))
        .route("/auth/me", get(me))
        .route("/child/add", post(child_add))
        .route("/child/list", get(child_list))
        .route("/child/remove/:id", delete(child_remove))
        .route("/child/:id", get(child_get).put(child_update))
        .route("/activity/history", get(history))
        .route("/activity/analytics", get(analytics));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
        .with_state(state)
}

async fn record(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    let recorded = Recorded {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        authorization: request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    state.requests.lock().unwrap().push(recorded);
    next.run(request).await
}

type Reply = Result<Response, Response>;

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Shared preamble: latency, forced failure, bearer check
async fn guard(state: &MockState, headers: &HeaderMap, route: &'static str) -> Result<Behavior, Response> {
    let behavior = state.behavior.lock().unwrap().clone();

    if let Some(delay) = behavior.delays.get(route) {
        tokio::time::sleep(*delay).await;
    }

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match token {
        Some(token) if behavior.valid_tokens.contains(token) => {}
        _ => return Err(error(StatusCode::UNAUTHORIZED, "Invalid or expired token")),
    }

    if behavior.failing.contains(route) {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, &format!("{} unavailable", route)));
    }

    Ok(behavior)
}

async fn register(Json(body): Json<Value>) -> Reply {
    if body["email"] == "taken@example.com" {
        return Err(error(StatusCode::CONFLICT, "Email already registered"));
    }
    Ok((StatusCode::CREATED, Json(json!({ "message": "Verification email sent" }))).into_response())
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    if body["password"] != PASSWORD {
        return Err(error(StatusCode::BAD_REQUEST, "Invalid email or password"));
    }
    state.behavior.lock().unwrap().valid_tokens.insert("t1".to_string());
    Ok(Json(json!({ "token": "t1", "user": { "id": "u1", "name": "Parent" } })).into_response())
}

async fn acknowledge(Json(_body): Json<Value>) -> Reply {
    Ok(Json(json!({ "message": "ok" })).into_response())
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    guard(&state, &headers, "me").await?;
    Ok(Json(json!({ "user": { "_id": "u1", "name": "Parent", "email": "parent@example.com" } })).into_response())
}

async fn child_list(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    let behavior = guard(&state, &headers, "children").await?;
    if behavior.omit_lists {
        return Ok(Json(json!({})).into_response());
    }
    if behavior.null_lists {
        return Ok(Json(json!({ "children": null })).into_response());
    }
    Ok(Json(json!({ "children": behavior.children })).into_response())
}

async fn child_get(State(state): State<Arc<MockState>>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    let behavior = guard(&state, &headers, "child").await?;
    match behavior.children.iter().find(|c| c["_id"] == id.as_str()) {
        Some(child) => Ok(Json(json!({ "child": child })).into_response()),
        None => Err(error(StatusCode::NOT_FOUND, "Child not found")),
    }
}

async fn child_add(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    guard(&state, &headers, "child").await?;
    let mut child = body;
    child["_id"] = json!("c9");
    state.behavior.lock().unwrap().children.push(child.clone());
    Ok((StatusCode::CREATED, Json(json!({ "child": child }))).into_response())
}

async fn child_update(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    guard(&state, &headers, "child").await?;
    let mut behavior = state.behavior.lock().unwrap();
    let child = behavior
        .children
        .iter_mut()
        .find(|c| c["_id"] == id.as_str())
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Child not found"))?;
    if let (Some(target), Some(changes)) = (child.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            target.insert(key.clone(), value.clone());
        }
    }
    Ok(Json(child.clone()).into_response())
}

async fn child_remove(State(state): State<Arc<MockState>>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    guard(&state, &headers, "child").await?;
    state.behavior.lock().unwrap().children.retain(|c| c["_id"] != id.as_str());
    Ok(Json(json!({ "message": "Child removed" })).into_response())
}

async fn history(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let behavior = guard(&state, &headers, "history").await?;
    if behavior.omit_lists {
        return Ok(Json(json!({ "total": 0 })).into_response());
    }
    if behavior.null_lists {
        return Ok(Json(json!({ "logs": null, "total": null })).into_response());
    }
    let limit = params
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(behavior.logs.len());
    let logs: Vec<Value> = behavior.logs.iter().take(limit).cloned().collect();
    Ok(Json(json!({ "logs": logs, "total": behavior.logs.len() })).into_response())
}

async fn analytics(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    let behavior = guard(&state, &headers, "analytics").await?;
    Ok(Json(behavior.analytics).into_response())
}
