//! In-process stand-in for the collaboration backend.
//!
//! Serves the HTTP API from memory and runs a tiny STOMP broker on
//! `/ws-docs` that relays JOIN/LEAVE/EDIT the way the real server does.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc, Notify, RwLock};
use uuid::Uuid;

use collab_docs::clients::ApiClient;
use collab_docs::models::{EditMessage, MessageKind};
use collab_docs::storage::LocalStorage;
use collab_docs::ws::stomp::{Command, Frame};
use collab_docs::{AppContext, Config};

type ApiReply = Result<Response, (StatusCode, Json<Value>)>;

struct User {
    password: String,
    email: String,
}

#[derive(Clone)]
pub struct StoredDoc {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub owner: String,
    pub collaborators: BTreeSet<String>,
}

#[derive(Clone)]
pub struct StoredVersion {
    pub id: i64,
    pub doc_id: Uuid,
    pub author: String,
    pub content: String,
}

#[derive(Default)]
pub struct BackendState {
    users: RwLock<HashMap<String, User>>,
    tokens: RwLock<HashMap<String, String>>,
    pub docs: RwLock<Vec<StoredDoc>>,
    pub versions: RwLock<Vec<StoredVersion>>,
    topics: RwLock<HashMap<String, broadcast::Sender<String>>>,
    members: RwLock<HashMap<Uuid, Vec<String>>>,
    drop_sockets: Notify,
}

impl BackendState {
    async fn topic(&self, destination: &str) -> broadcast::Sender<String> {
        let mut topics = self.topics.write().await;
        topics
            .entry(destination.to_string())
            .or_insert_with(|| {
                let (tx, _rx) = broadcast::channel(100);
                tx
            })
            .clone()
    }

    async fn user_for(&self, token: &str) -> Option<String> {
        self.tokens.read().await.get(token).cloned()
    }

    async fn issue_token(&self, username: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens
            .write()
            .await
            .insert(token.clone(), username.to_string());
        token
    }
}

pub struct FakeBackend {
    pub base_url: String,
    pub state: Arc<BackendState>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        let app = Router::new()
            .route("/users/register", post(register))
            .route("/users/login", post(login))
            .route("/users/me", get(me).put(update_me).delete(delete_me))
            .route("/users/me/password", axum::routing::put(change_password))
            .route("/docs", get(list_docs).post(create_doc))
            .route("/docs/:id", get(get_doc).put(update_doc).delete(delete_doc))
            .route("/docs/:id/share", post(share_doc))
            .route("/docs/:id/share/:username", delete(revoke_doc))
            .route("/docs/:id/versions", get(list_versions))
            .route("/docs/:id/snapshot", post(snapshot_doc))
            .route("/ws-docs", get(ws_upgrade))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn config(&self) -> Config {
        Config {
            api_base_url: self.base_url.clone(),
            edit_debounce_ms: 50,
            request_timeout_secs: 5,
            ..Config::default()
        }
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(self.base_url.clone(), reqwest::Client::new())
    }

    /// Context with its own storage file, nobody signed in
    pub fn context(&self, dir: &tempfile::TempDir) -> AppContext {
        AppContext::with_parts(
            self.config(),
            self.api(),
            LocalStorage::new(dir.path().join("storage.json")),
        )
    }

    /// Register a user directly and hand back a token for it
    pub async fn add_user(&self, username: &str, password: &str) -> String {
        self.state.users.write().await.insert(
            username.to_string(),
            User {
                password: password.to_string(),
                email: format!("{}@example.com", username),
            },
        );
        self.state.issue_token(username).await
    }

    pub async fn add_doc(&self, owner: &str, title: &str, content: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.docs.write().await.push(StoredDoc {
            id,
            title: title.to_string(),
            content: content.to_string(),
            owner: owner.to_string(),
            collaborators: BTreeSet::new(),
        });
        id
    }

    pub async fn add_version(&self, doc_id: Uuid, author: &str, content: &str) -> i64 {
        let mut versions = self.state.versions.write().await;
        let id = versions.len() as i64 + 1;
        versions.push(StoredVersion {
            id,
            doc_id,
            author: author.to_string(),
            content: content.to_string(),
        });
        id
    }

    /// Broadcast a message on a document topic as if some client had sent it
    pub async fn publish(&self, doc_id: Uuid, msg: &EditMessage) {
        let topic = self.state.topic(&format!("/topic/doc/{}", doc_id)).await;
        let _ = topic.send(serde_json::to_string(msg).unwrap());
    }

    /// Cut every open realtime socket without a goodbye
    pub fn drop_connections(&self) {
        self.state.drop_sockets.notify_waiters();
    }

    pub async fn doc_content(&self, doc_id: Uuid) -> Option<String> {
        self.state
            .docs
            .read()
            .await
            .iter()
            .find(|d| d.id == doc_id)
            .map(|d| d.content.clone())
    }
}

/* -----------------------------
   HTTP handlers
------------------------------ */

fn error(status: StatusCode, key: &str, message: &str) -> (StatusCode, Json<Value>) {
    let mut body = serde_json::Map::new();
    body.insert(key.to_string(), Value::String(message.to_string()));
    (status, Json(Value::Object(body)))
}

fn ok(body: Value) -> ApiReply {
    Ok(Json(body).into_response())
}

fn no_content() -> ApiReply {
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn authenticate(
    state: &BackendState,
    headers: &HeaderMap,
) -> Result<String, (StatusCode, Json<Value>)> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "error", "Unauthorized"))?;
    state
        .user_for(token)
        .await
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "error", "Unauthorized"))
}

fn doc_json(doc: &StoredDoc) -> Value {
    json!({
        "id": doc.id,
        "title": doc.title,
        "content": doc.content,
        "ownerUsername": doc.owner,
        "collaborators": doc.collaborators,
        "createdAt": Utc::now(),
    })
}

fn can_see(doc: &StoredDoc, user: &str) -> bool {
    doc.owner == user || doc.collaborators.contains(user)
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
}

async fn register(State(state): State<Arc<BackendState>>, Json(body): Json<RegisterBody>) -> ApiReply {
    let mut users = state.users.write().await;
    if users.contains_key(&body.username) {
        return Err(error(StatusCode::CONFLICT, "message", "Username already exists"));
    }
    users.insert(
        body.username.clone(),
        User {
            password: body.password,
            email: body.email.clone(),
        },
    );
    drop(users);
    let token = state.issue_token(&body.username).await;
    ok(json!({ "username": body.username, "token": token, "email": body.email }))
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(state): State<Arc<BackendState>>, Json(body): Json<LoginBody>) -> ApiReply {
    let email = {
        let users = state.users.read().await;
        match users.get(&body.username) {
            Some(user) if user.password == body.password => user.email.clone(),
            _ => return Err(error(StatusCode::UNAUTHORIZED, "message", "Invalid credentials")),
        }
    };
    let token = state.issue_token(&body.username).await;
    ok(json!({ "token": token, "id": 1, "username": body.username, "email": email }))
}

async fn me(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> ApiReply {
    let user = authenticate(&state, &headers).await?;
    let email = state
        .users
        .read()
        .await
        .get(&user)
        .map(|u| u.email.clone())
        .unwrap_or_default();
    ok(json!({ "id": 1, "username": user, "email": email }))
}

#[derive(Deserialize)]
struct EmailBody {
    email: String,
}

async fn update_me(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<EmailBody>,
) -> ApiReply {
    let user = authenticate(&state, &headers).await?;
    if let Some(u) = state.users.write().await.get_mut(&user) {
        u.email = body.email.clone();
    }
    ok(json!({ "id": 1, "username": user, "email": body.email }))
}

async fn delete_me(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> ApiReply {
    let user = authenticate(&state, &headers).await?;
    state.users.write().await.remove(&user);
    state.docs.write().await.retain(|d| d.owner != user);
    no_content()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordBody {
    current_password: String,
    new_password: String,
}

async fn change_password(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<PasswordBody>,
) -> ApiReply {
    let user = authenticate(&state, &headers).await?;
    let mut users = state.users.write().await;
    match users.get_mut(&user) {
        Some(u) if u.password == body.current_password => {
            u.password = body.new_password;
            ok(json!({ "message": "Password updated" }))
        }
        _ => Err(error(StatusCode::BAD_REQUEST, "message", "Current password is incorrect")),
    }
}

async fn list_docs(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> ApiReply {
    let user = authenticate(&state, &headers).await?;
    let docs = state.docs.read().await;
    let visible: Vec<Value> = docs
        .iter()
        .filter(|d| can_see(d, &user))
        .map(|d| {
            json!({
                "id": d.id,
                "title": d.title,
                "ownerUsername": d.owner,
                "collaborators": d.collaborators,
            })
        })
        .collect();
    ok(Value::Array(visible))
}

#[derive(Deserialize)]
struct DocBody {
    title: String,
    content: String,
}

async fn create_doc(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<DocBody>,
) -> ApiReply {
    let user = authenticate(&state, &headers).await?;
    let doc = StoredDoc {
        id: Uuid::new_v4(),
        title: body.title,
        content: body.content,
        owner: user,
        collaborators: BTreeSet::new(),
    };
    let reply = doc_json(&doc);
    state.docs.write().await.push(doc);
    ok(reply)
}

async fn get_doc(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiReply {
    let user = authenticate(&state, &headers).await?;
    let docs = state.docs.read().await;
    match docs.iter().find(|d| d.id == id && can_see(d, &user)) {
        Some(doc) => ok(doc_json(doc)),
        None => Err(error(StatusCode::NOT_FOUND, "error", "not found")),
    }
}

async fn update_doc(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<DocBody>,
) -> ApiReply {
    let user = authenticate(&state, &headers).await?;
    let mut docs = state.docs.write().await;
    match docs.iter_mut().find(|d| d.id == id && can_see(d, &user)) {
        Some(doc) => {
            doc.title = body.title;
            doc.content = body.content;
            ok(doc_json(doc))
        }
        None => Err(error(StatusCode::NOT_FOUND, "error", "not found")),
    }
}

async fn delete_doc(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiReply {
    let user = authenticate(&state, &headers).await?;
    let mut docs = state.docs.write().await;
    let before = docs.len();
    docs.retain(|d| !(d.id == id && d.owner == user));
    if docs.len() == before {
        return Err(error(StatusCode::FORBIDDEN, "error", "Only the owner can delete"));
    }
    no_content()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareBody {
    collaborator_username: String,
}

async fn share_doc(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<ShareBody>,
) -> ApiReply {
    let user = authenticate(&state, &headers).await?;
    if !state.users.read().await.contains_key(&body.collaborator_username) {
        return Err(error(StatusCode::NOT_FOUND, "message", "User not found"));
    }
    let mut docs = state.docs.write().await;
    match docs.iter_mut().find(|d| d.id == id && d.owner == user) {
        Some(doc) => {
            doc.collaborators.insert(body.collaborator_username);
            ok(json!({ "message": "Shared" }))
        }
        None => Err(error(StatusCode::FORBIDDEN, "error", "Only the owner can share")),
    }
}

async fn revoke_doc(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path((id, username)): Path<(Uuid, String)>,
) -> ApiReply {
    let user = authenticate(&state, &headers).await?;
    let mut docs = state.docs.write().await;
    match docs.iter_mut().find(|d| d.id == id && d.owner == user) {
        Some(doc) => {
            doc.collaborators.remove(&username);
            no_content()
        }
        None => Err(error(StatusCode::FORBIDDEN, "error", "Only the owner can revoke")),
    }
}

async fn list_versions(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiReply {
    authenticate(&state, &headers).await?;
    let versions = state.versions.read().await;
    let list: Vec<Value> = versions
        .iter()
        .filter(|v| v.doc_id == id)
        .map(|v| {
            json!({
                "id": v.id,
                "documentId": v.doc_id,
                "createdAt": "2024-05-01T10:00:00",
                "authorUsername": v.author,
                "content": v.content,
            })
        })
        .collect();
    ok(Value::Array(list))
}

async fn snapshot_doc(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiReply {
    let user = authenticate(&state, &headers).await?;
    let content = {
        let docs = state.docs.read().await;
        match docs.iter().find(|d| d.id == id) {
            Some(doc) => doc.content.clone(),
            None => return Err(error(StatusCode::NOT_FOUND, "error", "not found")),
        }
    };
    let mut versions = state.versions.write().await;
    let vid = versions.len() as i64 + 1;
    versions.push(StoredVersion {
        id: vid,
        doc_id: id,
        author: user,
        content,
    });
    no_content()
}

/* -----------------------------
   STOMP broker
------------------------------ */

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

async fn ws_upgrade(
    State(state): State<Arc<BackendState>>,
    Query(query): Query<TokenQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, query.token, state))
}

async fn handle_socket(socket: WebSocket, token: Option<String>, state: Arc<BackendState>) {
    let (mut sender, mut receiver) = socket.split();

    // 1. Handshake, an unknown token gets an ERROR frame
    let user = match token {
        Some(token) => state.user_for(&token).await,
        None => None,
    };
    match receiver.next().await {
        Some(Ok(Message::Text(text))) => match Frame::decode(&text) {
            Ok(Some(frame)) if frame.command == Command::Connect => {}
            _ => return,
        },
        _ => return,
    }
    let Some(user) = user else {
        let frame = Frame::new(Command::Error).header("message", "Unauthorized");
        let _ = sender.send(Message::Text(frame.encode())).await;
        return;
    };
    let connected = Frame::new(Command::Connected).header("version", "1.2");
    if sender.send(Message::Text(connected.encode())).await.is_err() {
        return;
    }

    // 2. One writer task, fed by every subscription
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut subscriptions = Vec::new();
    let mut message_id = 0u64;
    loop {
        let text = tokio::select! {
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => text,
                _ => break,
            },
            _ = state.drop_sockets.notified() => break,
        };
        let frame = match Frame::decode(&text) {
            Ok(Some(frame)) => frame,
            _ => continue,
        };
        match frame.command {
            Command::Subscribe => {
                let destination = frame.get("destination").unwrap_or_default().to_string();
                let id = frame.get("id").unwrap_or_default().to_string();
                let mut rx = state.topic(&destination).await.subscribe();
                let out = out_tx.clone();
                message_id += 1000;
                let mut next_id = message_id;
                subscriptions.push(tokio::spawn(async move {
                    while let Ok(body) = rx.recv().await {
                        next_id += 1;
                        let msg = Frame::new(Command::Message)
                            .header("destination", &destination)
                            .header("subscription", &id)
                            .header("message-id", &next_id.to_string())
                            .body(body);
                        if out.send(msg.encode()).is_err() {
                            break;
                        }
                    }
                }));
            }
            Command::Send => {
                let destination = frame.get("destination").unwrap_or_default();
                let Some(doc_id) = destination
                    .strip_prefix("/app/edit/")
                    .and_then(|id| Uuid::parse_str(id).ok())
                else {
                    continue;
                };
                let Ok(mut msg) = serde_json::from_str::<EditMessage>(&frame.body) else {
                    continue;
                };
                relay(&state, &user, doc_id, &mut msg).await;
                let topic = state.topic(&format!("/topic/doc/{}", doc_id)).await;
                let _ = topic.send(serde_json::to_string(&msg).unwrap());
            }
            Command::Disconnect => break,
            _ => {}
        }
    }

    for task in subscriptions {
        task.abort();
    }
    writer.abort();
}

/// Apply a client message the way the server does before broadcasting it
async fn relay(state: &BackendState, user: &str, doc_id: Uuid, msg: &mut EditMessage) {
    match msg.kind {
        MessageKind::Join | MessageKind::Leave => {
            let mut members = state.members.write().await;
            let list = members.entry(doc_id).or_default();
            if msg.kind == MessageKind::Join {
                if !list.iter().any(|m| m == user) {
                    list.push(user.to_string());
                }
            } else {
                list.retain(|m| m != user);
            }
            msg.content = Some(list.join(","));
        }
        MessageKind::Edit => {
            let mut docs = state.docs.write().await;
            if let Some(doc) = docs.iter_mut().find(|d| d.id == doc_id) {
                doc.content = msg.content_or_empty().to_string();
            }
        }
        _ => {}
    }
}
