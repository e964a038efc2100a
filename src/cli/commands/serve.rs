//! HTTP API server for the course assistant front end.
//!
//! Provides endpoints for questions, quizzes, video uploads and the corpus listing.

use crate::cli::Output;
use crate::config::{ServerSettings, Settings};
use crate::corpus::VideoSummary;
use crate::error::SigmaError;
use crate::orchestrator::{Orchestrator, UploadOutcome};
use crate::rag::{Answer, Intent, Language, QuizItem, QuizOutcome};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<&str>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let mut server = settings.server.clone();
    if let Some(host) = host {
        server.host = host.to_string();
    }
    if let Some(port) = port {
        server.port = port;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let passages = orchestrator.corpus().len();
    let app = router(Arc::new(AppState { orchestrator }), &server);

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Serving {} passages on {}", passages, addr);

    Output::header("Sigma API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Passages loaded", &passages.to_string());
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /");
    Output::kv("Ask", "POST /ask");
    Output::kv("Quiz", "POST /quiz");
    Output::kv("Upload", "POST /upload_video");
    Output::kv("Videos", "GET  /videos");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>, server: &ServerSettings) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/ask", post(ask))
        .route("/quiz", post(quiz))
        .route("/upload_video", post(upload_video))
        .route("/videos", get(list_videos))
        .layer(DefaultBodyLimit::max(server.max_upload_mb.saturating_mul(1024 * 1024)))
        .layer(cors_layer(&server.allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    intent: Option<String>,
}

#[derive(Deserialize)]
struct QuizRequest {
    question: String,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Serialize)]
struct QuizResponse {
    quiz: Vec<QuizItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<String>,
}

impl From<QuizOutcome> for QuizResponse {
    fn from(outcome: QuizOutcome) -> Self {
        match outcome {
            QuizOutcome::Parsed(quiz) => Self {
                quiz,
                raw: None,
            },
            QuizOutcome::Unparsed(raw) => Self {
                quiz: Vec::new(),
                raw: Some(raw),
            },
        }
    }
}

#[derive(Serialize)]
struct VideoListResponse {
    videos: Vec<VideoSummary>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Library error rendered as a JSON response without internal details.
struct ApiError(SigmaError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_upstream() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        error!("Request failed: {}", self.0);

        (
            status,
            Json(ErrorResponse {
                error: self.0.user_message(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "RAG Backend is working!" }))
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<Answer>, ApiError> {
    let language = Language::from_code(req.language.as_deref());
    let intent = Intent::from_name(req.intent.as_deref());

    state
        .orchestrator
        .rag()
        .ask(&req.question, language, intent)
        .await
        .map(Json)
        .map_err(ApiError)
}

async fn quiz(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuizRequest>,
) -> Result<Json<QuizResponse>, ApiError> {
    let language = Language::from_code(req.language.as_deref());

    state
        .orchestrator
        .rag()
        .quiz(&req.question, language)
        .await
        .map(|outcome| Json(outcome.into()))
        .map_err(ApiError)
}

async fn upload_video(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut title: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return upload_rejected(StatusCode::BAD_REQUEST, &format!("Invalid upload: {}", e)),
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                match field.bytes().await {
                    Ok(bytes) => file = Some((filename, bytes.to_vec())),
                    Err(e) => {
                        return upload_rejected(StatusCode::BAD_REQUEST, &format!("Invalid upload: {}", e))
                    }
                }
            }
            "title" => title = field.text().await.ok(),
            _ => {}
        }
    }

    let Some((filename, bytes)) = file else {
        return upload_rejected(StatusCode::BAD_REQUEST, "No file uploaded.");
    };

    info!("Received upload '{}' ({} bytes)", filename, bytes.len());
    let outcome = state
        .orchestrator
        .upload(&bytes, &filename, title.as_deref())
        .await;
    Json(outcome).into_response()
}

fn upload_rejected(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(UploadOutcome {
            success: false,
            video_id: None,
            title: None,
            chunks: None,
            message: Some(message.to_string()),
        }),
    )
        .into_response()
}

async fn list_videos(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let videos = state.orchestrator.corpus().videos();
    Json(VideoListResponse {
        total: videos.len(),
        videos,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Corpus, SqliteSnapshot};
    use crate::embedding::Embedder;
    use crate::testing::{passage, FailingEmbedder, FixedTranscriber, KeywordEmbedder, RecordingGenerator};
    use crate::transcription::TranscriptSegment;

    const VOCABULARY: &[&str] = &["flex", "grid"];

    async fn spawn(dir: &std::path::Path, embedder: Arc<dyn Embedder>, reply: &str) -> String {
        let mut settings = Settings::default();
        settings.corpus.upload_dir = dir.join("uploads").to_string_lossy().to_string();

        let corpus = Arc::new(Corpus::open(Box::new(SqliteSnapshot::in_memory().unwrap())).unwrap());
        corpus
            .append(vec![passage("Video 12 - Flexbox", 12, "flex basics", vec![1.0, 0.0])])
            .unwrap();

        let orchestrator = Orchestrator::with_components(
            settings.clone(),
            corpus,
            Arc::new(FixedTranscriber::new(vec![TranscriptSegment::new(0.0, 3.0, "grid layout")])),
            embedder,
            Arc::new(RecordingGenerator::new(reply)),
        )
        .unwrap();

        let app = router(Arc::new(AppState { orchestrator }), &settings.server);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_ask_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(dir.path(), Arc::new(KeywordEmbedder::new(VOCABULARY)), "Flexbox is...").await;

        let body: serde_json::Value = reqwest::Client::new()
            .post(format!("{}/ask", base))
            .json(&serde_json::json!({ "question": "what is flex?", "language": "xx" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["answer"], "Flexbox is...");
        assert_eq!(body["matches"][0]["number"], 12);
        assert_eq!(body["matches"][0]["title"], "Video 12 - Flexbox");
    }

    #[tokio::test]
    async fn test_upstream_failure_maps_to_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(dir.path(), Arc::new(FailingEmbedder), "unused").await;

        let response = reqwest::Client::new()
            .post(format!("{}/ask", base))
            .json(&serde_json::json!({ "question": "flex?" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(!body["error"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_quiz_endpoint_returns_raw_text_when_unparsable() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(dir.path(), Arc::new(KeywordEmbedder::new(VOCABULARY)), "no json here").await;

        let body: serde_json::Value = reqwest::Client::new()
            .post(format!("{}/quiz", base))
            .json(&serde_json::json!({ "question": "flex" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["quiz"], serde_json::json!([]));
        assert_eq!(body["raw"], "no json here");
    }

    #[tokio::test]
    async fn test_quiz_endpoint_returns_parsed_items_under_quiz() {
        let dir = tempfile::tempdir().unwrap();
        let reply = r#"[{"question":"q","options":["a","b"],"answer":"a","explanation":"e"}]"#;
        let base = spawn(dir.path(), Arc::new(KeywordEmbedder::new(VOCABULARY)), reply).await;

        let body: serde_json::Value = reqwest::Client::new()
            .post(format!("{}/quiz", base))
            .json(&serde_json::json!({ "question": "flex" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["quiz"][0]["answer"], "a");
        assert_eq!(body["quiz"][0]["options"], serde_json::json!(["a", "b"]));
        assert!(body.get("questions").is_none());
        assert!(body.get("raw").is_none());
    }

    #[tokio::test]
    async fn test_health_message() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(dir.path(), Arc::new(KeywordEmbedder::new(VOCABULARY)), "ok").await;

        let body: serde_json::Value = reqwest::get(format!("{}/", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["message"], "RAG Backend is working!");
    }

    #[tokio::test]
    async fn test_upload_and_list_videos() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(dir.path(), Arc::new(KeywordEmbedder::new(VOCABULARY)), "ok").await;
        let client = reqwest::Client::new();

        let boundary = "sigma-test-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nGrid intro\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"grid.mp4\"\r\n\
             Content-Type: video/mp4\r\n\r\nnot really a video\r\n--{b}--\r\n",
            b = boundary
        );

        let outcome: serde_json::Value = client
            .post(format!("{}/upload_video", base))
            .header("content-type", format!("multipart/form-data; boundary={}", boundary))
            .body(body)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(outcome["success"], true);
        assert_eq!(outcome["title"], "Grid intro");
        assert_eq!(outcome["chunks"], 1);

        let listing: serde_json::Value = client
            .get(format!("{}/videos", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(listing["total"], 2);
        assert_eq!(listing["videos"][1]["title"], "Grid intro");
        assert_eq!(listing["videos"][1]["number"], -1);
        assert_eq!(listing["videos"][1]["source"], "user_video");
    }

    #[tokio::test]
    async fn test_upload_without_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(dir.path(), Arc::new(KeywordEmbedder::new(VOCABULARY)), "ok").await;

        let boundary = "sigma-test-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nNothing\r\n--{b}--\r\n",
            b = boundary
        );
        let response = reqwest::Client::new()
            .post(format!("{}/upload_video", base))
            .header("content-type", format!("multipart/form-data; boundary={}", boundary))
            .body(body)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let outcome: serde_json::Value = response.json().await.unwrap();
        assert_eq!(outcome["success"], false);
        assert_eq!(outcome["message"], "No file uploaded.");
    }
}
