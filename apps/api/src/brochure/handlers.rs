//! Axum route handlers for the Brochure API.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::brochure::generator::BrochureRequest;
use crate::brochure::jobs::{run_job, JobRecord, JobStatus};
use crate::brochure::layout_kind::LayoutKind;
use crate::errors::AppError;
use crate::render::ExportError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

fn default_generate_images() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CreateBrochureRequest {
    pub hotel_name: String,
    pub location: String,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default = "default_generate_images")]
    pub generate_images: bool,
}

/// Free-form "Name, Location, anything else" request.
#[derive(Debug, Deserialize)]
pub struct PromptBrochureRequest {
    pub prompt: String,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default = "default_generate_images")]
    pub generate_images: bool,
}

#[derive(Debug, Serialize)]
pub struct JobAcceptedResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub status_url: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/brochures
///
/// Validates the request, registers a pending job and starts it in the
/// background. Responds 202 immediately.
pub async fn handle_create_brochure(
    State(state): State<AppState>,
    Json(request): Json<CreateBrochureRequest>,
) -> Result<(StatusCode, Json<JobAcceptedResponse>), AppError> {
    let request = build_request(
        &request.hotel_name,
        &request.location,
        request.layout.as_deref(),
        request.generate_images,
    )?;
    Ok(accept(&state, request).await)
}

/// POST /api/v1/brochures/from-prompt
///
/// The first comma-separated part is the hotel name, the second the location.
pub async fn handle_create_from_prompt(
    State(state): State<AppState>,
    Json(request): Json<PromptBrochureRequest>,
) -> Result<(StatusCode, Json<JobAcceptedResponse>), AppError> {
    let (hotel_name, location) = parse_prompt(&request.prompt)?;
    let request = build_request(
        &hotel_name,
        &location,
        request.layout.as_deref(),
        request.generate_images,
    )?;
    Ok(accept(&state, request).await)
}

/// GET /api/v1/brochures/:job_id/status
pub async fn handle_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRecord>, AppError> {
    let job = find_job(&state, job_id).await?;
    Ok(Json(job))
}

/// GET /api/v1/brochures/:job_id/download
///
/// Streams the exported file. 409 until the job has completed.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let job = find_job(&state, job_id).await?;
    let artifact = match (job.status, job.artifact) {
        (JobStatus::Completed, Some(artifact)) => artifact,
        (JobStatus::Completed, None) => {
            return Err(AppError::Internal(anyhow!(
                "job {job_id} is completed but records no artifact"
            )))
        }
        _ => return Err(AppError::JobNotReady(job_id.to_string())),
    };

    let bytes = tokio::fs::read(&artifact.path)
        .await
        .map_err(|source| ExportError::Io {
            path: artifact.path.clone(),
            source,
        })?;
    let filename = artifact
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("brochure.{}", artifact.format.extension()));

    Ok((
        [
            (header::CONTENT_TYPE, artifact.format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn build_request(
    hotel_name: &str,
    location: &str,
    layout: Option<&str>,
    generate_images: bool,
) -> Result<BrochureRequest, AppError> {
    if hotel_name.trim().is_empty() {
        return Err(AppError::Validation("hotel_name cannot be empty".to_string()));
    }
    let layout = match layout {
        Some(name) => name.parse::<LayoutKind>()?,
        None => LayoutKind::default(),
    };

    Ok(BrochureRequest {
        hotel_name: hotel_name.trim().to_string(),
        location: location.trim().to_string(),
        layout,
        generate_images,
    })
}

fn parse_prompt(prompt: &str) -> Result<(String, String), AppError> {
    let (name, rest) = prompt.split_once(',').ok_or_else(|| {
        AppError::Validation(
            "prompt must be of the form 'Hotel Name, Location'".to_string(),
        )
    })?;
    let location = rest.split(',').next().unwrap_or_default();
    Ok((name.trim().to_string(), location.trim().to_string()))
}

async fn accept(state: &AppState, request: BrochureRequest) -> (StatusCode, Json<JobAcceptedResponse>) {
    let job = state.jobs.create(&request).await;
    info!(
        "Job {} accepted for '{}' ({})",
        job.job_id, request.hotel_name, request.layout
    );

    tokio::spawn(run_job(
        state.jobs.clone(),
        state.generator.clone(),
        job.job_id,
        request,
    ));

    (
        StatusCode::ACCEPTED,
        Json(JobAcceptedResponse {
            job_id: job.job_id,
            status: job.status,
            status_url: format!("/api/v1/brochures/{}/status", job.job_id),
        }),
    )
}

async fn find_job(state: &AppState, job_id: Uuid) -> Result<JobRecord, AppError> {
    state
        .jobs
        .get(job_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brochure::generator::{BrochureGenerator, OutputSettings};
    use crate::brochure::jobs::JobStore;
    use crate::collaborators::{
        CollaboratorError, ImageGenerator, ImageRequest, TextGenerator, TextRequest,
    };
    use crate::layout::{default_font_roles, FontSet};
    use crate::routes::build_router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use image::RgbaImage;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct Offline;

    #[async_trait]
    impl TextGenerator for Offline {
        async fn generate(&self, _request: &TextRequest) -> Result<String, CollaboratorError> {
            Err(CollaboratorError::EmptyResponse)
        }
    }

    #[async_trait]
    impl ImageGenerator for Offline {
        async fn generate(&self, _request: &ImageRequest) -> Result<RgbaImage, CollaboratorError> {
            Err(CollaboratorError::EmptyResponse)
        }
    }

    fn app(dir: &std::path::Path) -> Router {
        let generator = BrochureGenerator::new(
            Arc::new(Offline),
            Arc::new(Offline),
            Arc::new(FontSet::embedded().unwrap()),
            default_font_roles(),
            OutputSettings {
                images_dir: dir.join("images"),
                brochures_dir: dir.join("brochures"),
                export_pdf: false,
            },
        );
        build_router(AppState {
            generator: Arc::new(generator),
            jobs: JobStore::default(),
        })
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_parse_prompt_takes_first_two_parts() {
        let (name, location) = parse_prompt("Grand Vista, Maldives, overwater villas").unwrap();
        assert_eq!(name, "Grand Vista");
        assert_eq!(location, "Maldives");
    }

    #[test]
    fn test_parse_prompt_without_comma_is_rejected() {
        assert!(matches!(
            parse_prompt("Grand Vista in the Maldives"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_build_request_defaults_layout() {
        let request = build_request(" Azure Reef ", "Bali", None, true).unwrap();
        assert_eq!(request.hotel_name, "Azure Reef");
        assert_eq!(request.layout, LayoutKind::FullBleed);
        assert!(matches!(
            build_request("Azure Reef", "Bali", Some("zine"), true),
            Err(AppError::InvalidLayout(_))
        ));
        assert!(matches!(
            build_request("  ", "Bali", None, true),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_layout_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let (status, body) = send(
            &app,
            post(
                "/api/v1/brochures",
                json!({"hotel_name": "Azure Reef", "location": "Bali", "layout": "zine"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "INVALID_LAYOUT");
    }

    #[tokio::test]
    async fn test_unknown_job_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let uri = format!("/api/v1/brochures/{}/status", Uuid::new_v4());
        let (status, _) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_prompt_job_runs_to_download() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let (status, body) = send(
            &app,
            post(
                "/api/v1/brochures/from-prompt",
                json!({"prompt": "Grand Vista, Maldives", "generate_images": false}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let accepted: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(accepted["status"], "pending");
        let status_url = accepted["status_url"].as_str().unwrap().to_string();
        let job_id = accepted["job_id"].as_str().unwrap().to_string();

        let mut job = Value::Null;
        for _ in 0..600 {
            let (_, body) = send(&app, get(&status_url)).await;
            job = serde_json::from_slice(&body).unwrap();
            if job["status"] == "completed" || job["status"] == "failed" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(job["status"], "completed", "{job}");
        assert_eq!(job["artifact"]["format"], "png");

        let (status, bytes) = send(&app, get(&format!("/api/v1/brochures/{job_id}/download"))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[tokio::test]
    async fn test_download_before_completion_is_409() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = JobStore::default();
        let generator = BrochureGenerator::new(
            Arc::new(Offline),
            Arc::new(Offline),
            Arc::new(FontSet::embedded().unwrap()),
            default_font_roles(),
            OutputSettings {
                images_dir: dir.path().join("images"),
                brochures_dir: dir.path().join("brochures"),
                export_pdf: false,
            },
        );
        let request = build_request("Azure Reef", "Bali", None, false).unwrap();
        let job = jobs.create(&request).await;
        let app = build_router(AppState {
            generator: Arc::new(generator),
            jobs,
        });

        let (status, body) = send(
            &app,
            get(&format!("/api/v1/brochures/{}/download", job.job_id)),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "JOB_NOT_READY");
    }

    #[tokio::test]
    async fn test_completed_job_without_artifact_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = JobStore::default();
        let request = build_request("Azure Reef", "Bali", None, false).unwrap();
        let mut job = jobs.create(&request).await;
        job.status = JobStatus::Completed;
        jobs.insert(job.clone()).await;

        let generator = BrochureGenerator::new(
            Arc::new(Offline),
            Arc::new(Offline),
            Arc::new(FontSet::embedded().unwrap()),
            default_font_roles(),
            OutputSettings {
                images_dir: dir.path().join("images"),
                brochures_dir: dir.path().join("brochures"),
                export_pdf: false,
            },
        );
        let app = build_router(AppState {
            generator: Arc::new(generator),
            jobs,
        });

        let (status, body) = send(
            &app,
            get(&format!("/api/v1/brochures/{}/download", job.job_id)),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "An internal server error occurred");
    }
}
