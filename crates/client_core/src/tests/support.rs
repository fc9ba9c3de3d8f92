//! In-process stand-in for the chat backend, shared by the unit tests.

use std::{collections::VecDeque, sync::Arc};

use axum::{
    extract::State,
    http::{header, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

pub struct StubReply {
    pub status: StatusCode,
    pub body: String,
    pub gate: Option<oneshot::Receiver<()>>,
}

impl StubReply {
    pub fn json(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
            gate: None,
        }
    }

    pub fn raw(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            gate: None,
        }
    }

    /// Holds the response until the returned sender fires (or is dropped).
    pub fn gated(body: Value) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let reply = Self {
            status: StatusCode::OK,
            body: body.to_string(),
            gate: Some(rx),
        };
        (reply, tx)
    }
}

#[derive(Clone)]
struct StubState {
    chat_replies: Arc<Mutex<VecDeque<StubReply>>>,
    panel_reply: Arc<Mutex<Option<StubReply>>>,
    chat_requests: Arc<Mutex<Vec<Value>>>,
}

pub struct StubServer {
    pub base_url: String,
    pub chat_requests: Arc<Mutex<Vec<Value>>>,
}

type StubResponse = (StatusCode, [(header::HeaderName, &'static str); 1], String);

async fn respond(reply: Option<StubReply>) -> StubResponse {
    let Some(reply) = reply else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "application/json")],
            "{}".to_string(),
        );
    };
    if let Some(gate) = reply.gate {
        let _ = gate.await;
    }
    (
        reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
}

async fn handle_chat(State(state): State<StubState>, Json(payload): Json<Value>) -> StubResponse {
    state.chat_requests.lock().await.push(payload);
    let reply = state.chat_replies.lock().await.pop_front();
    respond(reply).await
}

async fn handle_panel(State(state): State<StubState>) -> StubResponse {
    let reply = state.panel_reply.lock().await.take();
    respond(reply).await
}

impl StubServer {
    pub async fn start(chat_replies: Vec<StubReply>, panel_reply: Option<StubReply>) -> Self {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let state = StubState {
            chat_replies: Arc::new(Mutex::new(chat_replies.into())),
            panel_reply: Arc::new(Mutex::new(panel_reply)),
            chat_requests: Arc::new(Mutex::new(Vec::new())),
        };
        let chat_requests = Arc::clone(&state.chat_requests);
        let app = Router::new()
            .route("/api/handlechat", post(handle_chat))
            .route("/api/getpaneldata", get(handle_panel))
            .with_state(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            base_url: format!("http://{addr}/api"),
            chat_requests,
        }
    }

    pub fn chat_url(&self) -> url::Url {
        url::Url::parse(&format!("{}/handlechat", self.base_url)).expect("chat url")
    }

    pub fn panel_url(&self) -> url::Url {
        url::Url::parse(&format!("{}/getpaneldata", self.base_url)).expect("panel url")
    }
}
