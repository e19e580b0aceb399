use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, routes, Build, Rocket, State};
use serde::{Deserialize, Serialize};

use common::ServerConfig;

use crate::pipeline::{NewsPipeline, NewsResult};
use crate::topics::{strip_emoji, PRESET_TOPICS};

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub pipeline: Arc<NewsPipeline>,
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    timeout_seconds: u64,
}

/// Request body for `/api/v1/news`.
#[derive(Deserialize)]
struct NewsRequest {
    topic: String,
}

#[derive(Serialize)]
struct TopicEntry {
    topic: &'static str,
    label: &'static str,
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

#[get("/api/v1/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let uptime = (Utc::now() - state.started_at).num_seconds();
    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        timeout_seconds: state.pipeline.timeout().as_secs(),
    })
}

#[get("/api/v1/topics")]
async fn topics() -> Json<Vec<TopicEntry>> {
    Json(
        PRESET_TOPICS
            .iter()
            .map(|&topic| TopicEntry {
                topic,
                label: strip_emoji(topic),
            })
            .collect(),
    )
}

/// Search news for a topic. Upstream failures still answer 200 with the message in `summary`.
#[post("/api/v1/news", data = "<body>")]
async fn news(state: &State<AppState>, body: Json<NewsRequest>) -> Result<Json<NewsResult>, Status> {
    let topic = body.topic.trim();
    if topic.is_empty() {
        return Err(Status::BadRequest);
    }
    Ok(Json(state.pipeline.fetch_news(topic).await))
}

/// Build the Rocket instance with managed state, bound per the `[server]` config section.
pub fn build_rocket(pipeline: Arc<NewsPipeline>, server: &ServerConfig) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("address", server.bind().to_string()))
        .merge(("port", server.port()));

    let state = AppState {
        started_at: Utc::now(),
        pipeline,
    };

    rocket::custom(figment)
        .manage(state)
        .mount("/", routes![health, status, topics, news])
}

/// Launch the HTTP API; blocks until Rocket shuts down (SIGINT/SIGTERM etc.).
pub async fn launch_rocket(pipeline: Arc<NewsPipeline>, server: &ServerConfig) -> Result<()> {
    tracing::info!(bind = %server.bind(), port = server.port(), "Starting Rocket HTTP server");
    build_rocket(pipeline, server)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
