//! Fake upstream service
//!
//! One axum app on a random local port serves every endpoint the fetchers
//! and the classifier call. Dropping the handle shuts it down.

use super::constants::*;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpListener;

pub struct FakeService {
    /// Base URL, e.g. "http://127.0.0.1:12345"
    pub base_url: String,

    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeService {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let app = make_app();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Fake service failed");
        });

        let service = Self {
            base_url,
            _shutdown_tx: Some(shutdown_tx),
        };
        service.wait_for_ready().await;
        service
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");
        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVICE_READY_TIMEOUT_MS);

        while start.elapsed() < timeout {
            if client.get(self.url("/api/tags")).send().await.is_ok() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("Fake service did not become ready within {:?}", timeout);
    }
}

impl Drop for FakeService {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn make_app() -> Router {
    Router::new()
        .route("/appreviews/{app_id}", get(app_reviews))
        .route("/api.php", get(steamspy))
        .route("/regional", get(regional_page))
        .route("/api/generate", post(generate))
        .route("/api/tags", get(tags))
}

fn review(id: &str, votes_up: u64, voted_up: bool, language: &str, text: &str) -> Value {
    json!({
        "recommendationid": id,
        "author": { "steamid": "7656", "playtime_at_review": 90 },
        "language": language,
        "review": text,
        "timestamp_created": 1_700_000_000,
        "voted_up": voted_up,
        "votes_up": votes_up,
        "votes_funny": 1,
        "weighted_vote_score": "0.5123",
        "steam_purchase": true
    })
}

async fn app_reviews(
    Path(app_id): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    match app_id {
        APP_MISSING => return StatusCode::NOT_FOUND.into_response(),
        APP_STEAM_FAILURE => return Json(json!({ "success": 2 })).into_response(),
        _ => {}
    }

    let cursor = params.get("cursor").map(String::as_str).unwrap_or("*");
    let body = match cursor {
        "*" => json!({
            "success": 1,
            "cursor": "page2",
            "reviews": [
                review("r1", 5, true, "english", "Fine\u{0007} game"),
                review("r2", 50, false, "schinese", "太难了"),
                review("r3", 10, true, "english", "Good"),
            ]
        }),
        "page2" => json!({
            "success": 1,
            "cursor": "page3",
            "reviews": [
                review("r3", 10, true, "english", "Good"),
                review("r4", 30, true, "schinese", "很好"),
                review("r5", 1, false, "english", &"x".repeat(2500)),
            ]
        }),
        _ => json!({ "success": 1, "cursor": "page3", "reviews": [] }),
    };
    Json(body).into_response()
}

async fn steamspy(Query(params): Query<HashMap<String, String>>) -> Response {
    if params.get("request").map(String::as_str) != Some("appdetails") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let app_id: u64 = params
        .get("appid")
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();
    match app_id {
        APP_MISSING => StatusCode::NOT_FOUND.into_response(),
        APP_WITHOUT_PLAYTIME => Json(json!({ "appid": app_id, "name": "No data" })).into_response(),
        _ => Json(json!({
            "appid": app_id,
            "name": "Some game",
            "median_forever": MEDIAN_PLAYTIME_MINUTES
        }))
        .into_response(),
    }
}

async fn regional_page(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("appID").map(String::as_str) {
        Some("404") => StatusCode::NOT_FOUND.into_response(),
        Some("300") => Html("<html><body><p>No scores yet</p></body></html>").into_response(),
        _ => Html(
            r#"<html><body>
                <table>
                  <tr><th>Region</th><th>Language</th><th>Score</th></tr>
                  <tr><td>China</td><td>schinese</td><td>71.5</td></tr>
                  <tr><td>United States</td><td>english</td><td>1,088</td></tr>
                </table>
               </body></html>"#,
        )
        .into_response(),
    }
}

fn scores_reply(dominant: &str) -> String {
    let mut emotions = serde_json::Map::new();
    for name in [
        "Anger",
        "Disgust",
        "Anticipation",
        "Fear",
        "Joy",
        "Sadness",
        "Trust",
        "Surprise",
    ] {
        let value = if name == dominant { 0.9 } else { 0.1 };
        emotions.insert(name.to_string(), json!(value));
    }
    json!({ "confidence": 0.8, "emotions": emotions }).to_string()
}

async fn generate(Json(request): Json<Value>) -> Response {
    let prompt = request["prompt"].as_str().unwrap_or_default();
    if request["stream"] != json!(false) || request["format"] != json!("json") {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let reply = if prompt.contains(BROKEN_REVIEW) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response();
    } else if prompt.contains(PROSE_REVIEW) {
        "I think this review is mostly positive.".to_string()
    } else if prompt.contains(JOYFUL_REVIEW) {
        scores_reply("Joy")
    } else if prompt.contains(ANGRY_REVIEW) {
        scores_reply("Anger")
    } else {
        scores_reply("Trust")
    };

    Json(json!({
        "model": FAKE_MODEL,
        "response": reply,
        "done": true,
        "eval_count": 42
    }))
    .into_response()
}

async fn tags() -> Json<Value> {
    Json(json!({ "models": [{ "name": FAKE_MODEL }] }))
}
