use anyhow::Result;
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod error;
mod github;
mod models;
mod validate;
mod velocity;

use error::AnalysisError;
use github::GithubClient;
use models::VelocityPoint;

#[derive(Clone)]
pub struct AppState {
    pub github: GithubClient,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let token = std::env::var("GITHUB_TOKEN").ok();
    let api_url =
        std::env::var("GITHUB_API_URL").unwrap_or_else(|_| "https://api.github.com".into());
    tracing::info!("GitHub token configured: {}", token.is_some());

    let state = AppState {
        github: GithubClient::new(api_url, token),
    };

    let app = build_router(state);

    let addr = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Velocity service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub data: Vec<VelocityPoint>,
}

async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AnalysisError> {
    let repo = validate::parse_repo_url(&request.url)?;
    tracing::info!("Analyzing commit velocity for {}/{}", repo.owner, repo.name);

    let details = state
        .github
        .fetch_recent_commits(&repo, request.token.as_deref())
        .await?;
    let commits = velocity::reconcile(details);
    let points = velocity::build_series(&commits);

    tracing::info!(
        "Computed {} velocity points from {} analyzable commits for {}/{}",
        points.len(),
        commits.len(),
        repo.owner,
        repo.name
    );

    Ok(Json(AnalyzeResponse {
        success: true,
        data: points,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn test_router() -> Router {
        // Base URL points at a closed port; any request against it
        // would surface as a transport error, not a 400.
        let state = AppState {
            github: GithubClient::new("http://127.0.0.1:9".to_string(), None),
        };
        build_router(state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn analyze_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_probe_responds() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn malformed_url_is_rejected_before_any_request() {
        let response = test_router()
            .oneshot(analyze_request(r#"{"url": "not-a-url"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], serde_json::json!(false));
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("invalid repository URL"));
    }

    #[tokio::test]
    async fn wrong_host_is_rejected() {
        let response = test_router()
            .oneshot(analyze_request(
                r#"{"url": "https://gitlab.com/octocat/demo"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], serde_json::json!(false));
    }
}
