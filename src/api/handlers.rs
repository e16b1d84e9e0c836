use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

use crate::approval;
use crate::campus::CampusDirectory;
use crate::catalog::FormKind;
use crate::error::{Result, ServerError};
use crate::intake::{IntakeService, Submission, SubmittedFile};

/// Application state shared across handlers
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub intake: IntakeService,
    pub campuses: Arc<CampusDirectory>,
    /// Fixed base for emailed links; falls back to the request's Host header
    pub public_url: Option<String>,
}

impl AppState {
    fn base_url(&self, headers: &HeaderMap) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| get_base_url(headers))
    }
}

/// Get base URL from request headers
fn get_base_url(headers: &HeaderMap) -> String {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|host| {
            // Treat port 443 or a bare non-localhost name as HTTPS
            if host.ends_with(":443") || (!host.contains(':') && !host.starts_with("localhost")) {
                format!("https://{}", host.trim_end_matches(":443"))
            } else {
                format!("http://{}", host)
            }
        })
        .unwrap_or_else(|| "http://localhost:8787".to_string())
}

fn invalid_multipart(e: MultipartError) -> ServerError {
    ServerError::InvalidRequest(format!("malformed multipart body: {}", e))
}

/// Drain the multipart body into a [`Submission`]. Parts with a filename are files.
async fn read_submission(mut multipart: Multipart) -> Result<Submission> {
    let mut submission = Submission::new();

    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match file_name {
            Some(file_name) => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(invalid_multipart)?;
                submission.push_file(SubmittedFile {
                    field_name: name,
                    file_name,
                    content_type,
                    data,
                });
            }
            None => {
                let value = field.text().await.map_err(invalid_multipart)?;
                submission.push_text(name, value);
            }
        }
    }

    Ok(submission)
}

/// POST /submit - Record a form submission
pub async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<serde_json::Value>> {
    let multipart = multipart.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;
    let submission = read_submission(multipart).await?;
    tracing::debug!("Received submission with {} file part(s)", submission.files().len());

    let app_id = state
        .intake
        .submit(submission, &state.base_url(&headers))
        .await?;

    Ok(Json(json!({ "success": true, "appId": app_id })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApproveQuery {
    pub id: String,
    pub role: String,
    pub action: String,
}

/// GET /approve - Record the director's decision from an emailed link
pub async fn approve(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ApproveQuery>,
) -> Result<String> {
    let outcome = approval::record_decision(&state.db, &query.id, &query.role, &query.action).await?;
    Ok(outcome.to_string())
}

/// GET /forms - Catalog for the renderer
pub async fn forms(State(state): State<Arc<AppState>>) -> Response {
    let views: Vec<_> = FormKind::ALL
        .into_iter()
        .map(|kind| kind.definition().view(&state.campuses))
        .collect();
    Json(views).into_response()
}

/// GET /forms/:id - One catalog entry
pub async fn form(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match FormKind::by_id(&id) {
        Some(kind) => Json(kind.definition().view(&state.campuses)).into_response(),
        None => not_found().await.into_response(),
    }
}

/// GET /health - Health check
pub async fn health() -> &'static str {
    "ok"
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entities::{Application, DecisionStatus, FileAttachment};
    use crate::testing::{self, MemoryStore, RecordingMailer};
    use axum::{body::Body, http::Request, Router};
    use sea_orm::{EntityTrait, PaginatorTrait};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "intakeTestBoundary";

    struct Harness {
        _temp_dir: TempDir,
        db: Arc<DatabaseConnection>,
        mailer: Arc<RecordingMailer>,
        app: Router,
    }

    async fn harness_with(store: MemoryStore) -> Harness {
        let temp_dir = TempDir::new().unwrap();
        let db = testing::test_db(&temp_dir).await;
        let mailer = Arc::new(RecordingMailer::default());
        let state = Arc::new(AppState {
            db: db.clone(),
            intake: testing::intake_service(db.clone(), Arc::new(store), mailer.clone()),
            campuses: Arc::new(CampusDirectory::default()),
            public_url: None,
        });
        Harness {
            _temp_dir: temp_dir,
            db,
            mailer,
            app: crate::api::router(state, 1024 * 1024),
        }
    }

    async fn harness() -> Harness {
        harness_with(MemoryStore::new()).await
    }

    /// Files are `(field, file name, content type, bytes)`.
    fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        for (name, file_name, content_type, data) in files {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: {}\r\n\r\n",
                    BOUNDARY, name, file_name, content_type
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn submit_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/submit")
            .header(header::HOST, "localhost:8787")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn read_body(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn read_json(response: Response) -> serde_json::Value {
        serde_json::from_str(&read_body(response).await).unwrap()
    }

    #[test]
    fn test_get_base_url() {
        let mut headers = HeaderMap::new();
        assert_eq!(get_base_url(&headers), "http://localhost:8787");

        headers.insert(header::HOST, "localhost:8787".parse().unwrap());
        assert_eq!(get_base_url(&headers), "http://localhost:8787");

        headers.insert(header::HOST, "portal.sssihl.edu.in".parse().unwrap());
        assert_eq!(get_base_url(&headers), "https://portal.sssihl.edu.in");

        headers.insert(header::HOST, "portal.sssihl.edu.in:443".parse().unwrap());
        assert_eq!(get_base_url(&headers), "https://portal.sssihl.edu.in");
    }

    #[tokio::test]
    async fn test_submit_success() {
        let h = harness().await;
        let body = multipart_body(
            &[
                ("formType", "Duplicate Grade Card"),
                ("email", "a@b.edu"),
                ("applicantName", "Jane Doe"),
                ("regNo", "123"),
                ("campus", "Anantapur Campus"),
            ],
            &[
                ("affidavit", "affidavit.pdf", "application/pdf", &b"%PDF-1"[..]),
                ("gradeCard", "card.png", "image/png", &b"\x89PNG"[..]),
                ("sbiReceipt", "receipt.pdf", "application/pdf", &b"%PDF-3"[..]),
            ],
        );

        let response = h.app.clone().oneshot(submit_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = read_json(response).await;
        assert_eq!(json["success"], true);
        let app_id = json["appId"].as_str().unwrap().to_string();
        assert!(app_id.starts_with("APP-"));

        let attachments = FileAttachment::find().all(h.db.as_ref()).await.unwrap();
        assert_eq!(attachments.len(), 3);
        for attachment in &attachments {
            let expected = match attachment.file_name.as_str() {
                "card.png" => "image/png",
                _ => "application/pdf",
            };
            assert_eq!(attachment.file_type, expected, "{}", attachment.file_name);
        }

        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "results@sssihl.edu.in");
        assert!(sent[0].html_body.contains(&format!(
            "http://localhost:8787/approve?id={}&role=Director&action=Reject",
            app_id
        )));
    }

    #[tokio::test]
    async fn test_submit_unknown_form_type() {
        let h = harness().await;
        let body = multipart_body(&[("formType", "Hostel Leave"), ("email", "a@b.edu")], &[]);

        let response = h.app.clone().oneshot(submit_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = read_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Unknown form type: Hostel Leave");
        assert_eq!(Application::find().count(h.db.as_ref()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_submit_without_multipart_body() {
        let h = harness().await;
        let request = Request::builder()
            .method("POST")
            .uri("/submit")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_submit_upload_failure_is_500() {
        let h = harness_with(MemoryStore::failing_on("gradeCard")).await;
        let body = multipart_body(
            &[("formType", "retotaling"), ("campus", "Nandigiri Campus")],
            &[("gradeCard", "card.pdf", "application/pdf", &b"%PDF"[..])],
        );

        let response = h.app.clone().oneshot(submit_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = read_json(response).await;
        assert!(json.get("success").is_none());
        assert!(json["error"].as_str().unwrap().contains("refused"));
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_approve_flow() {
        let h = harness().await;
        let body = multipart_body(&[("formType", "CGPA to Marks Conversion"), ("cgpa", "8.4")], &[]);
        let json = read_json(h.app.clone().oneshot(submit_request(body)).await.unwrap()).await;
        let app_id = json["appId"].as_str().unwrap().to_string();

        let response = h
            .app
            .clone()
            .oneshot(get(&format!("/approve?id={}&role=Director&action=Approve", app_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_body(response).await,
            format!("Application {} approved by Director", app_id)
        );

        let row = Application::find_by_id(app_id.clone())
            .one(h.db.as_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.director_status, DecisionStatus::Approved);

        let response = h
            .app
            .clone()
            .oneshot(get(&format!("/approve?id={}&role=Dean&action=Reject", app_id)))
            .await
            .unwrap();
        assert_eq!(
            read_body(response).await,
            format!("Application {}: no action taken for role Dean", app_id)
        );
    }

    #[tokio::test]
    async fn test_approve_without_params() {
        let h = harness().await;
        let response = h.app.clone().oneshot(get("/approve")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_body(response).await,
            "Application : no action taken for role "
        );
    }

    #[tokio::test]
    async fn test_catalog_routes() {
        let h = harness().await;

        let response = h.app.clone().oneshot(get("/forms")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = read_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 9);

        let response = h.app.clone().oneshot(get("/forms/migration")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = read_json(response).await;
        assert_eq!(json["formType"], "Application for Migration Certificate");

        let response = h.app.clone().oneshot(get("/forms/hostel-leave")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_and_fallback() {
        let h = harness().await;

        let response = h.app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_body(response).await, "ok");

        let response = h.app.clone().oneshot(get("/admin")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(read_body(response).await, "Not Found");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let h = harness().await;
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/submit")
            .header(header::ORIGIN, "https://forms.sssihl.edu.in")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
