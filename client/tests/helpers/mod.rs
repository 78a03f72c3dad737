//! Shared helpers for pipeline integration tests.
//!
//! [`MockService`] is an in-process `axum` stand-in for the training and
//! prediction service, bound to an ephemeral port.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use sd_client::config::Config;
use sd_client::detection::DetectionEvent;
use sd_client::AppState;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

/// One sample the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedUpload {
    pub label: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: usize,
}

/// Observable state of the mock service.
#[derive(Default)]
pub struct MockState {
    pub uploads: Mutex<Vec<ReceivedUpload>>,
    /// Labels answered with `{"status": "error"}`.
    pub reject_labels: Mutex<Vec<String>>,
    /// When set, each upload waits for a permit before answering.
    pub upload_gate: Mutex<Option<Arc<Semaphore>>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub inventory: Mutex<BTreeMap<String, u64>>,
    pub models: Mutex<Vec<Value>>,
    pub trained: Mutex<Vec<String>>,
    pub predicted_with: Mutex<Vec<String>>,
}

impl MockState {
    pub fn upload_labels(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.label.clone())
            .collect()
    }

    fn inventory_json(&self) -> Value {
        let per_class = self.inventory.lock().unwrap().clone();
        let total: u64 = per_class.values().sum();
        json!({ "total_samples": total, "samples_per_class": per_class })
    }
}

/// Running mock service.
pub struct MockService {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockService {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let router = Router::new()
            .route("/api/upload_sample", post(upload_sample))
            .route("/api/samples", get(samples))
            .route("/api/clear_samples", delete(clear_samples))
            .route("/api/predict", post(predict))
            .route("/api/train", post(train))
            .route("/api/models", get(models))
            .route("/api/model/{name}", delete(delete_model))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Hold every upload until permits are added to the returned semaphore.
    pub fn gate_uploads(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.state.upload_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn reject_label(&self, label: &str) {
        self.state.reject_labels.lock().unwrap().push(label.to_string());
    }

    pub fn add_model(&self, name: &str, accuracy: f64) {
        self.state.models.lock().unwrap().push(json!({
            "name": name,
            "accuracy": accuracy,
            "n_samples": 20,
            "classes": ["A", "E"],
        }));
    }

    pub fn seed_inventory(&self, label: &str, count: u64) {
        self.state
            .inventory
            .lock()
            .unwrap()
            .insert(label.to_string(), count);
    }
}

async fn upload_sample(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Response {
    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(now, Ordering::SeqCst);

    let mut label = None;
    let mut file = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        match field.name() {
            Some("label") => label = Some(field.text().await.unwrap()),
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.unwrap().len();
                file = Some((file_name, content_type, bytes));
            }
            _ => {}
        }
    }

    let gate = state.upload_gate.lock().unwrap().clone();
    if let Some(gate) = gate {
        gate.acquire().await.unwrap().forget();
    }

    let response = match (label, file) {
        (Some(label), Some((file_name, content_type, bytes))) => {
            state.uploads.lock().unwrap().push(ReceivedUpload {
                label: label.clone(),
                file_name,
                content_type,
                bytes,
            });
            if state.reject_labels.lock().unwrap().contains(&label) {
                Json(json!({ "status": "error", "message": "Could not store sample" }))
                    .into_response()
            } else {
                *state.inventory.lock().unwrap().entry(label).or_default() += 1;
                Json(json!({ "status": "success", "message": "Sample saved" })).into_response()
            }
        }
        _ => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "file and label are required" })),
        )
            .into_response(),
    };

    state.in_flight.fetch_sub(1, Ordering::SeqCst);
    response
}

async fn samples(State(state): State<Arc<MockState>>) -> Json<Value> {
    Json(state.inventory_json())
}

async fn clear_samples(State(state): State<Arc<MockState>>) -> Json<Value> {
    state.inventory.lock().unwrap().clear();
    Json(json!({ "message": "All samples deleted" }))
}

async fn predict(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Response {
    let mut model = String::new();
    let mut has_file = false;
    while let Some(field) = multipart.next_field().await.unwrap() {
        match field.name() {
            Some("model") => model = field.text().await.unwrap(),
            Some("file") => has_file = !field.bytes().await.unwrap().is_empty(),
            _ => {}
        }
    }
    state.predicted_with.lock().unwrap().push(model.clone());

    let known = state
        .models
        .lock()
        .unwrap()
        .iter()
        .any(|m| m["name"] == model.as_str());
    if !known || !has_file {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": format!("Model '{model}' not found") })),
        )
            .into_response();
    }

    Json(json!({
        "prediction": "A",
        "confidence": 0.8,
        "all_predictions": [
            { "class": "E", "confidence": 0.15 },
            { "class": "A", "confidence": 0.8 },
            { "class": "I", "confidence": 0.05 },
        ],
    }))
    .into_response()
}

async fn train(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Json<Value> {
    let mut name = String::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() == Some("name") {
            name = field.text().await.unwrap();
        }
    }
    state.trained.lock().unwrap().push(name.clone());
    state.models.lock().unwrap().push(json!({
        "name": name,
        "accuracy": 0.875,
        "n_samples": 12,
        "classes": ["A", "E"],
    }));
    Json(json!({ "accuracy": 0.875, "message": "Model trained" }))
}

async fn models(State(state): State<Arc<MockState>>) -> Json<Value> {
    Json(json!({ "models": state.models.lock().unwrap().clone() }))
}

async fn delete_model(State(state): State<Arc<MockState>>, Path(name): Path<String>) -> Response {
    let mut models = state.models.lock().unwrap();
    let before = models.len();
    models.retain(|m| m["name"] != name.as_str());
    if models.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": format!("Model '{name}' not found") })),
        )
            .into_response();
    }
    Json(json!({ "message": "Model deleted" })).into_response()
}

/// Pipeline wired to `mock` with a synthetic camera.
pub fn test_app(mock: &MockService) -> AppState {
    AppState::start(Config::default_for_test(&mock.base_url)).unwrap()
}

/// Pipeline with the camera running, a first frame decoded and one hand in view.
pub async fn ready_app(mock: &MockService) -> AppState {
    let app = test_app(mock);
    app.camera.start(None).await.unwrap();
    show_hands(&app, 1).await;
    app.camera
        .subscribe()
        .wait_for(|f| f.as_ref().is_some_and(|f| !f.is_empty()))
        .await
        .unwrap();
    app
}

/// Report `n` hands and wait until the gate reflects it.
pub async fn show_hands(app: &AppState, n: usize) {
    app.detection.sender().send(DetectionEvent::with_hands(n));
    let expected = u32::try_from(n).unwrap();
    app.detection
        .subscribe()
        .wait_for(|s| s.hands_present == expected)
        .await
        .unwrap();
}

/// Wait until every queued sample has been attempted.
pub async fn wait_drained(app: &AppState) {
    tokio::time::timeout(Duration::from_secs(10), async {
        app.session
            .subscribe()
            .wait_for(|v| v.recording.queued_count == 0)
            .await
            .unwrap();
    })
    .await
    .expect("queue did not drain");
}
