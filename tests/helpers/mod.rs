//! Scripted Bookwyrm instance for integration tests
//!
//! A tiny axum server on an ephemeral port. Tests stub path → response
//! mappings and can inspect the conditional headers the importer sent.
//! Unstubbed paths answer 404, which doubles as the "minimal profile with
//! no outbox" condition.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Uri};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub etag: Option<String>,
    pub body: Option<Value>,
}

impl StubResponse {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            etag: None,
            body: Some(body),
        }
    }

    pub fn json_with_etag(body: Value, etag: &str) -> Self {
        Self {
            status: 200,
            etag: Some(etag.to_string()),
            body: Some(body),
        }
    }

    pub fn not_modified(etag: &str) -> Self {
        Self {
            status: 304,
            etag: Some(etag.to_string()),
            body: None,
        }
    }

    pub fn error(status: u16, body: &str) -> Self {
        Self {
            status,
            etag: None,
            body: Some(Value::String(body.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
}

#[derive(Default)]
pub struct ScriptedInstance {
    responses: Mutex<HashMap<String, StubResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedInstance {
    pub fn stub(&self, path: &str, response: StubResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
    }

    pub fn stub_json(&self, path: &str, body: Value) {
        self.stub(path, StubResponse::json(body));
    }

    pub fn requests_for(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

/// Running scripted instance plus the base URL the importer should target
pub struct TestInstance {
    pub instance: Arc<ScriptedInstance>,
    /// `http://127.0.0.1:PORT`; passed verbatim as the instance domain
    pub base: String,
}

impl TestInstance {
    pub async fn start() -> Self {
        let instance = Arc::new(ScriptedInstance::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new()
            .fallback(handle_request)
            .with_state(instance.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            instance,
            base: format!("http://{}", addr),
        }
    }

    /// Absolute URL on this instance for stub bodies referencing objects.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

async fn handle_request(
    State(instance): State<Arc<ScriptedInstance>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let path = uri.path().to_string();

    instance.requests.lock().unwrap().push(RecordedRequest {
        path: path.clone(),
        if_none_match: header(&headers, "if-none-match"),
        if_modified_since: header(&headers, "if-modified-since"),
    });

    let stub = instance.responses.lock().unwrap().get(&path).cloned();
    let Some(stub) = stub else {
        return Response::builder()
            .status(404)
            .body(Body::from("not stubbed"))
            .unwrap();
    };

    let mut builder = Response::builder().status(stub.status);
    if let Some(etag) = &stub.etag {
        builder = builder.header("ETag", etag);
    }
    match stub.body {
        Some(body) => builder
            .header("Content-Type", "application/activity+json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
