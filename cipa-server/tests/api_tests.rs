//! HTTP round trips through the full router
//!
//! Each test gets its own in-memory database and a temporary root folder for
//! signature files.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::Engine;
use cipa_common::config::{ServiceConfig, TomlConfig};
use cipa_common::documents::DOCX_MIME;
use cipa_common::events::EventBus;
use cipa_common::models::{Branch, Candidate, Collaborator};
use cipa_server::services::Notifier;
use cipa_server::{build_router, db, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
const OTHER_PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

#[derive(Default)]
struct CountingNotifier {
    calls: AtomicUsize,
}

impl CountingNotifier {
    fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn candidate_approved(
        &self,
        _candidate: &Candidate,
        _collaborator: Option<&Collaborator>,
    ) -> cipa_common::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct TestApp {
    app: Router,
    pool: SqlitePool,
    notifier: Arc<CountingNotifier>,
    root: TempDir,
    branch: Branch,
}

async fn setup() -> TestApp {
    let pool = cipa_common::db::init_memory_database().await.unwrap();
    let root = tempfile::tempdir().unwrap();
    let toml = TomlConfig {
        public_base_url: Some("https://rh.example.com.br".to_string()),
        ..TomlConfig::default()
    };
    let config = ServiceConfig::resolve(Some(root.path()), Some(0), &toml);

    let notifier = Arc::new(CountingNotifier::default());
    let state = AppState::new(pool.clone(), EventBus::new(100), config)
        .unwrap()
        .with_notifier(notifier.clone());
    let app = build_router(state);

    let branch = Branch {
        id: Uuid::new_v4(),
        company_name: "Metalúrgica Exemplo S.A.".to_string(),
        branch_name: "Unidade Joinville".to_string(),
        cnpj: "12.345.678/0001-90".to_string(),
        cnae: "2511-0/00".to_string(),
        city: "Joinville".to_string(),
        logo_url: None,
    };
    db::branches::insert_branch(&pool, &branch).await.unwrap();

    TestApp {
        app,
        pool,
        notifier,
        root,
        branch,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn add_collaborator(&self, name: &str, active: bool) -> Uuid {
        let collaborator = Collaborator {
            id: Uuid::new_v4(),
            branch_id: self.branch.id,
            name: name.to_string(),
            job_title: Some("Operador de Máquinas".to_string()),
            email: Some(format!("{}@example.com.br", name.to_lowercase().replace(' ', "."))),
            active,
        };
        db::collaborators::insert_collaborator(&self.pool, &collaborator)
            .await
            .unwrap();
        collaborator.id
    }

    async fn create_term(&self) -> Uuid {
        let (status, term) = self
            .json(
                "POST",
                &format!("/api/branches/{}/terms", self.branch.id),
                json!({
                    "year_label": "2024/2025",
                    "start_date": "2024-06-15",
                    "end_date": "2025-06-14",
                    "previous_posse_date": "2023-06-15"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(term["status"], "ELECTION");
        term["id"].as_str().unwrap().parse().unwrap()
    }

    fn stored_signature_files(&self) -> usize {
        let dir = self.root.path().join("signatures");
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "png"))
                .count(),
            Err(_) => 0,
        }
    }
}

fn data_url(bytes: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

// ============================================================================
// Health and dimensioning
// ============================================================================

#[tokio::test]
async fn test_health_reports_database() {
    let t = setup().await;
    let (status, body) = t.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "cipa-server");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_nr5_dimensioning_by_cnae() {
    let t = setup().await;
    let (status, body) = t
        .get("/api/nr5/dimensioning?cnae=4711-3/02&employees=45")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group"]["code"], "C-24");
    assert_eq!(body["efetivos"], 1);
    assert_eq!(body["suplentes"], 1);

    let (status, _) = t.get("/api/nr5/dimensioning?cnae=%20&employees=45").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_branch_dimensioning_counts_only_active_collaborators() {
    let t = setup().await;
    for i in 0..20 {
        t.add_collaborator(&format!("Ativo {}", i), true).await;
    }
    t.add_collaborator("Desligado", false).await;

    let (status, body) = t
        .get(&format!("/api/branches/{}/dimensioning", t.branch.id))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employees"], 20);
    assert_eq!(body["efetivos"], 1);
    assert_eq!(body["suplentes"], 1);
}

// ============================================================================
// Election calendar
// ============================================================================

#[tokio::test]
async fn test_calendar_preview_shifts_weekend_dates() {
    let t = setup().await;
    let (status, body) = t.get("/api/calendar/preview?anchor=2023-06-15").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["term_end"], "2024-06-15");
    let milestones = body["milestones"].as_array().unwrap();
    assert_eq!(milestones.len(), 8);

    let inauguration = milestones
        .iter()
        .find(|m| m["id"] == "inauguration")
        .unwrap();
    assert_eq!(inauguration["date"], "2024-06-14");
    assert_eq!(inauguration["weekday"], "sexta-feira");
}

#[tokio::test]
async fn test_milestone_completion_is_persisted() {
    let t = setup().await;
    let term_id = t.create_term().await;

    let (status, body) = t
        .json(
            "PUT",
            &format!("/api/terms/{}/milestones/convocation", term_id),
            json!({ "completed": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["percentage"], 13);

    let (status, body) = t.get(&format!("/api/terms/{}/calendar", term_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], 1);
    assert_eq!(body["total"], 8);
    assert_eq!(body["percentage"], 13);
    let convocation = body["calendar"]["milestones"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["id"] == "convocation")
        .unwrap()
        .clone();
    assert_eq!(convocation["completed"], true);

    let (status, body) = t
        .json(
            "PUT",
            &format!("/api/terms/{}/milestones/convocation", term_id),
            json!({ "completed": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["percentage"], 0);

    let (status, _) = t
        .json(
            "PUT",
            &format!("/api/terms/{}/milestones/posse", term_id),
            json!({ "completed": true }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calendar_without_anchor_is_null() {
    let t = setup().await;
    let (status, term) = t
        .json(
            "POST",
            &format!("/api/branches/{}/terms", t.branch.id),
            json!({
                "year_label": "2024/2025",
                "start_date": "2024-06-15",
                "end_date": "2025-06-14"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = t
        .get(&format!("/api/terms/{}/calendar", term["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["calendar"].is_null());
    assert_eq!(body["percentage"], 0);
}

// ============================================================================
// Terms
// ============================================================================

#[tokio::test]
async fn test_term_status_only_moves_forward() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let uri = format!("/api/terms/{}/status", term_id);

    let (status, body) = t.json("POST", &uri, json!({ "status": "ACTIVE" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ACTIVE");

    let (status, body) = t.json("POST", &uri, json!({ "status": "ELECTION" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "UNPROCESSABLE");
}

#[tokio::test]
async fn test_term_rejects_inverted_dates() {
    let t = setup().await;
    let (status, _) = t
        .json(
            "POST",
            &format!("/api/branches/{}/terms", t.branch.id),
            json!({
                "year_label": "2024/2025",
                "start_date": "2025-06-14",
                "end_date": "2024-06-15"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_resources_return_404() {
    let t = setup().await;
    let missing = Uuid::new_v4();

    let (status, body) = t.get(&format!("/api/terms/{}", missing)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = t.get(&format!("/api/candidates/{}/status", missing)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t.get(&format!("/api/sign/{}", missing)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Members
// ============================================================================

#[tokio::test]
async fn test_member_cannot_be_added_twice() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let collaborator_id = t.add_collaborator("Maria Souza", true).await;
    let uri = format!("/api/terms/{}/members", term_id);
    let request = json!({
        "collaborator_id": collaborator_id,
        "role": "PRESIDENTE",
        "origin": "EMPREGADOR"
    });

    let (status, _) = t.json("POST", &uri, request.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = t.json("POST", &uri, request).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = t.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["collaborator_name"], "Maria Souza");
}

// ============================================================================
// Candidates
// ============================================================================

#[tokio::test]
async fn test_register_with_signature_is_approved_once() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let collaborator_id = t.add_collaborator("João Lima", true).await;

    let (status, body) = t
        .json(
            "POST",
            &format!("/api/terms/{}/candidates", term_id),
            json!({ "collaborator_id": collaborator_id, "data_url": data_url(PNG_BYTES) }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "APPROVED");
    assert!(body["signature_url"]
        .as_str()
        .unwrap()
        .starts_with("/files/signatures/"));
    assert_eq!(t.notifier.count(), 1);
    assert_eq!(t.stored_signature_files(), 1);
}

#[tokio::test]
async fn test_duplicate_registration_returns_existing_candidacy() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let collaborator_id = t.add_collaborator("Ana Costa", true).await;
    let uri = format!("/api/terms/{}/candidates", term_id);

    let (status, first) = t
        .json("POST", &uri, json!({ "collaborator_id": collaborator_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["status"], "PENDING_SIGNATURE");

    let (status, body) = t
        .json(
            "POST",
            &uri,
            json!({ "collaborator_id": collaborator_id, "data_url": data_url(PNG_BYTES) }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_CANDIDACY");
    assert_eq!(body["existing"]["id"], first["id"]);
    assert_eq!(body["existing"]["status"], "PENDING_SIGNATURE");

    // Rejected before anything was written
    assert_eq!(t.stored_signature_files(), 0);
    assert_eq!(t.notifier.count(), 0);
}

#[tokio::test]
async fn test_invalid_signature_creates_nothing() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let collaborator_id = t.add_collaborator("Pedro Alves", true).await;
    let uri = format!("/api/terms/{}/candidates", term_id);

    let (status, _) = t
        .json(
            "POST",
            &uri,
            json!({ "collaborator_id": collaborator_id, "data_url": "data:image/gif;base64,R0lGODlh" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .json(
            "POST",
            &uri,
            json!({
                "collaborator_id": collaborator_id,
                "signature_url": "/files/signatures/never-uploaded.png"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = t.get(&uri).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_insert_discards_new_signature_file() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let collaborator_id = t.add_collaborator("Carla Dias", true).await;

    sqlx::query(
        "CREATE TRIGGER reject_candidates BEFORE INSERT ON candidates \
         BEGIN SELECT RAISE(ABORT, 'disk full'); END",
    )
    .execute(&t.pool)
    .await
    .unwrap();

    let (status, _) = t
        .json(
            "POST",
            &format!("/api/terms/{}/candidates", term_id),
            json!({ "collaborator_id": collaborator_id, "data_url": data_url(PNG_BYTES) }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(t.stored_signature_files(), 0);
    assert_eq!(t.notifier.count(), 0);
}

#[tokio::test]
async fn test_attach_signature_is_idempotent_and_rejects_a_different_one() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let collaborator_id = t.add_collaborator("Bruno Rocha", true).await;

    let (_, candidate) = t
        .json(
            "POST",
            &format!("/api/terms/{}/candidates", term_id),
            json!({ "collaborator_id": collaborator_id }),
        )
        .await;
    let uri = format!("/api/candidates/{}/signature", candidate["id"].as_str().unwrap());

    let (status, body) = t
        .json("POST", &uri, json!({ "data_url": data_url(PNG_BYTES) }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transitioned"], true);
    assert_eq!(body["candidate"]["status"], "APPROVED");
    let signature_url = body["candidate"]["signature_url"].clone();

    let (status, body) = t
        .json("POST", &uri, json!({ "signature_url": signature_url }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transitioned"], false);

    let (status, _) = t
        .json("POST", &uri, json!({ "data_url": data_url(OTHER_PNG_BYTES) }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(t.notifier.count(), 1);
}

#[tokio::test]
async fn test_remote_handoff_flow() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let collaborator_id = t.add_collaborator("Luiza Melo", true).await;

    let (_, candidate) = t
        .json(
            "POST",
            &format!("/api/terms/{}/candidates", term_id),
            json!({ "collaborator_id": collaborator_id }),
        )
        .await;
    let candidate_id = candidate["id"].as_str().unwrap().to_string();

    let (status, handoff) = t
        .json(
            "POST",
            &format!("/api/candidates/{}/handoff", candidate_id),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = handoff["token"].as_str().unwrap().to_string();
    assert_eq!(
        handoff["signing_url"],
        format!("https://rh.example.com.br/assinar/{}", token)
    );

    let (status, body) = t
        .get(&format!("/api/candidates/{}/status", candidate_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING_SIGNATURE");
    assert_eq!(body["awaiting_remote_signature"], true);

    let (status, info) = t.get(&format!("/api/sign/{}", token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["collaborator_name"], "Luiza Melo");
    assert_eq!(info["term_year_label"], "2024/2025");

    let (status, result) = t
        .json(
            "POST",
            &format!("/api/sign/{}", token),
            json!({ "data_url": data_url(PNG_BYTES) }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["status"], "APPROVED");
    assert_eq!(t.notifier.count(), 1);

    let (_, body) = t
        .get(&format!("/api/candidates/{}/status", candidate_id))
        .await;
    assert_eq!(body["status"], "APPROVED");
    assert_eq!(body["awaiting_remote_signature"], false);

    // Single use
    let (status, body) = t
        .json(
            "POST",
            &format!("/api/sign/{}", token),
            json!({ "data_url": data_url(PNG_BYTES) }),
        )
        .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"]["code"], "GONE");
    assert_eq!(t.notifier.count(), 1);

    // Approved candidacies cannot be handed off again
    let (status, _) = t
        .json(
            "POST",
            &format!("/api/candidates/{}/handoff", candidate_id),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancelled_handoff_link_is_gone() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let collaborator_id = t.add_collaborator("Rafael Nunes", true).await;

    let (_, candidate) = t
        .json(
            "POST",
            &format!("/api/terms/{}/candidates", term_id),
            json!({ "collaborator_id": collaborator_id }),
        )
        .await;
    let handoff_uri = format!("/api/candidates/{}/handoff", candidate["id"].as_str().unwrap());

    let (_, handoff) = t.json("POST", &handoff_uri, json!({})).await;
    let token = handoff["token"].as_str().unwrap().to_string();

    let (status, _) = t
        .send(
            Request::builder()
                .method("DELETE")
                .uri(&handoff_uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = t.get(&format!("/api/sign/{}", token)).await;
    assert_eq!(status, StatusCode::GONE);

    let (status, _) = t
        .send(
            Request::builder()
                .method("DELETE")
                .uri(&handoff_uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_candidate_removes_unshared_signature() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let collaborator_id = t.add_collaborator("Sofia Ramos", true).await;

    let (_, candidate) = t
        .json(
            "POST",
            &format!("/api/terms/{}/candidates", term_id),
            json!({ "collaborator_id": collaborator_id, "data_url": data_url(PNG_BYTES) }),
        )
        .await;
    assert_eq!(t.stored_signature_files(), 1);

    let (status, _) = t
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/candidates/{}", candidate["id"].as_str().unwrap()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(t.stored_signature_files(), 0);
}

// ============================================================================
// Signature files
// ============================================================================

#[tokio::test]
async fn test_multipart_upload_is_served_back() {
    let t = setup().await;
    let boundary = "cipa-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"signature\"; filename=\"assinatura.png\"\r\n\
             Content-Type: image/png\r\n\r\n",
            b = boundary
        )
        .as_bytes(),
    );
    body.extend_from_slice(PNG_BYTES);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let (status, stored) = t
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/signatures")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let url = stored["url"].as_str().unwrap().to_string();

    // Same content, same file
    let (status, again) = t
        .json("POST", "/api/signatures", json!({ "data_url": data_url(PNG_BYTES) }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["url"], url.as_str());

    let response = t
        .app
        .clone()
        .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], PNG_BYTES);
}

// ============================================================================
// Sick leave
// ============================================================================

#[tokio::test]
async fn test_certificate_accumulation_warns_at_sixteen_days() {
    let t = setup().await;
    let collaborator_id = t.add_collaborator("Paulo Teixeira", true).await;

    let (status, first) = t
        .json(
            "POST",
            "/api/certificates",
            json!({
                "collaborator_id": collaborator_id,
                "start_date": "2024-03-01",
                "days": 10,
                "cid": "M54.5"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["assessment"]["is_at_risk"], false);

    let draft = json!({
        "collaborator_id": collaborator_id,
        "start_date": "2024-04-15",
        "days": 6,
        "cid": "M51.1"
    });
    let (status, assessment) = t.json("POST", "/api/certificates/evaluate", draft.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assessment["total"], 16);
    assert_eq!(assessment["is_at_risk"], true);

    // Evaluation does not save
    let (_, list) = t
        .get(&format!("/api/collaborators/{}/certificates", collaborator_id))
        .await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = t.json("POST", "/api/certificates", draft).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, summary) = t
        .get(&format!("/api/branches/{}/absenteeism", t.branch.id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        summary["collaborator_names"][collaborator_id.to_string()],
        "Paulo Teixeira"
    );

    let (status, _) = t
        .json(
            "POST",
            "/api/certificates",
            json!({ "collaborator_id": collaborator_id, "start_date": "2024-05-01", "days": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_certificate_days_upper_bound() {
    let t = setup().await;
    let collaborator_id = t.add_collaborator("Renata Prado", true).await;

    let (status, _) = t
        .json(
            "POST",
            "/api/certificates",
            json!({
                "collaborator_id": collaborator_id,
                "start_date": "2024-03-01",
                "days": 10,
                "cid": "J06"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = t
        .json(
            "POST",
            "/api/certificates/evaluate",
            json!({
                "collaborator_id": collaborator_id,
                "start_date": "2024-03-01",
                "days": i64::MAX,
                "cid": "J11"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = t
        .json(
            "POST",
            "/api/certificates",
            json!({ "collaborator_id": collaborator_id, "start_date": "2024-05-01", "days": 367 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = t
        .json(
            "POST",
            "/api/certificates/evaluate",
            json!({ "collaborator_id": collaborator_id, "start_date": "2024-03-20", "days": 366, "cid": "J11" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 376);
}

// ============================================================================
// Documents
// ============================================================================

#[tokio::test]
async fn test_election_notice_requires_location_then_downloads() {
    let t = setup().await;
    let term_id = t.create_term().await;

    let (status, list) = t.get(&format!("/api/terms/{}/documents", term_id)).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 6);
    let notice = list.iter().find(|d| d["kind"] == "election_notice").unwrap();
    assert_eq!(notice["available"], true);
    let minutes = list
        .iter()
        .find(|d| d["kind"] == "inauguration_minutes")
        .unwrap();
    assert_eq!(minutes["available"], false);

    let uri = format!("/api/terms/{}/documents/election_notice", term_id);
    let (status, body) = t.get(&uri).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("local da eleição"));

    let (status, _) = t
        .json(
            "PUT",
            &format!("/api/terms/{}", term_id),
            json!({
                "year_label": "2024/2025",
                "start_date": "2024-06-15",
                "end_date": "2025-06-14",
                "previous_posse_date": "2023-06-15",
                "election_location": "Refeitório principal",
                "election_start_time": "08:00:00",
                "election_end_time": "17:00:00"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let response = t
        .app
        .clone()
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], DOCX_MIME);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("Edital_Convocacao_2024-2025.docx"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"PK"));

    let (status, _) = t
        .get(&format!("/api/terms/{}/documents/inauguration_minutes", term_id))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = t
        .get(&format!("/api/terms/{}/documents/boletim", term_id))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_insert_keeps_file_referenced_by_another_candidacy() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let first = t.add_collaborator("Helena Duarte", true).await;
    let second = t.add_collaborator("Igor Campos", true).await;
    let uri = format!("/api/terms/{}/candidates", term_id);

    let (status, candidate) = t
        .json(
            "POST",
            &uri,
            json!({ "collaborator_id": first, "data_url": data_url(PNG_BYTES) }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let name = candidate["signature_url"]
        .as_str()
        .unwrap()
        .rsplit('/')
        .next()
        .unwrap()
        .to_string();

    // The next upload of the same bytes writes the file afresh
    std::fs::remove_file(t.root.path().join("signatures").join(&name)).unwrap();

    sqlx::query(
        "CREATE TRIGGER reject_candidates BEFORE INSERT ON candidates \
         BEGIN SELECT RAISE(ABORT, 'disk full'); END",
    )
    .execute(&t.pool)
    .await
    .unwrap();

    let (status, _) = t
        .json(
            "POST",
            &uri,
            json!({ "collaborator_id": second, "data_url": data_url(PNG_BYTES) }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(t.root.path().join("signatures").join(&name).is_file());
}

// ============================================================================
// Meetings and action plans
// ============================================================================

async fn create_meeting(t: &TestApp, term_id: Uuid) -> String {
    let (status, meeting) = t
        .json(
            "POST",
            &format!("/api/terms/{}/meetings", term_id),
            json!({
                "kind": "ORDINARY",
                "date": "2024-08-20",
                "title": "Inspeção do setor de prensas",
                "description": "Levantamento de riscos na linha 2"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    meeting["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_meeting_crud() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let meeting_id = create_meeting(&t, term_id).await;
    let uri = format!("/api/meetings/{}", meeting_id);

    let (status, meeting) = t.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(meeting["kind"], "ORDINARY");
    assert_eq!(meeting["term_id"], term_id.to_string());

    let (status, meeting) = t
        .json(
            "PUT",
            &uri,
            json!({
                "kind": "EXTRAORDINARY",
                "date": "2024-08-22",
                "title": "Acidente na linha 2"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(meeting["kind"], "EXTRAORDINARY");
    assert_eq!(meeting["date"], "2024-08-22");
    assert_eq!(meeting["description"], "");

    let (status, _) = t
        .json(
            "PUT",
            &uri,
            json!({ "kind": "ORDINARY", "date": "2024-08-22", "title": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, list) = t.get(&format!("/api/terms/{}/meetings", term_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "Acidente na linha 2");

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap()
    };
    let (status, _) = t.send(delete()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = t.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = t.send(delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_action_plan_crud_and_term_listing() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let responsible = t.add_collaborator("Marcos Vieira", true).await;
    let meeting_id = create_meeting(&t, term_id).await;
    let plans_uri = format!("/api/meetings/{}/action-plans", meeting_id);
    let term_plans_uri = format!("/api/terms/{}/action-plans", term_id);

    let (status, plan) = t
        .json(
            "POST",
            &plans_uri,
            json!({
                "description": "Instalar proteção na prensa 3",
                "deadline": "2024-09-30",
                "responsible_id": responsible
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(plan["status"], "PENDING");
    let plan_uri = format!("/api/action-plans/{}", plan["id"].as_str().unwrap());

    let (status, _) = t
        .json(
            "POST",
            &plans_uri,
            json!({ "description": "Sinalizar área", "deadline": "2024-09-30", "responsible_id": Uuid::new_v4() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, by_meeting) = t.get(&plans_uri).await;
    assert_eq!(by_meeting.as_array().unwrap().len(), 1);
    let (status, by_term) = t.get(&term_plans_uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_term.as_array().unwrap().len(), 1);
    assert_eq!(by_term[0]["id"], plan["id"]);

    let (status, updated) = t
        .json(
            "PUT",
            &plan_uri,
            json!({
                "description": "Instalar proteção na prensa 3",
                "deadline": "2024-10-15",
                "responsible_id": responsible,
                "status": "DONE"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "DONE");
    assert_eq!(updated["deadline"], "2024-10-15");

    let (status, _) = t
        .send(
            Request::builder()
                .method("DELETE")
                .uri(&plan_uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, by_term) = t.get(&term_plans_uri).await;
    assert!(by_term.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_meeting_minutes_download() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let responsible = t.add_collaborator("Tatiane Borges", true).await;
    let meeting_id = create_meeting(&t, term_id).await;

    let (status, _) = t
        .json(
            "POST",
            &format!("/api/meetings/{}/action-plans", meeting_id),
            json!({
                "description": "Revisar procedimento de bloqueio",
                "deadline": "2024-09-15",
                "responsible_id": responsible
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/meetings/{}/minutes", meeting_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], DOCX_MIME);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("Ata_Reuniao_2024-08-20.docx"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"PK"));

    let (status, _) = t
        .get(&format!("/api/meetings/{}/minutes", Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Term deletion
// ============================================================================

async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

const TERM_TABLES: [&str; 6] = [
    "members",
    "meetings",
    "action_plans",
    "candidates",
    "handoff_sessions",
    "term_milestones",
];

#[tokio::test]
async fn test_term_delete_cascades_to_dependent_records() {
    let t = setup().await;
    let term_id = t.create_term().await;
    let member = t.add_collaborator("Olga Pires", true).await;
    let pending = t.add_collaborator("Vitor Mendes", true).await;
    let signed = t.add_collaborator("Wagner Lopes", true).await;

    let (status, _) = t
        .json(
            "POST",
            &format!("/api/terms/{}/members", term_id),
            json!({ "collaborator_id": member, "role": "SECRETARIO", "origin": "EMPREGADOR" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let meeting_id = create_meeting(&t, term_id).await;
    let (status, _) = t
        .json(
            "POST",
            &format!("/api/meetings/{}/action-plans", meeting_id),
            json!({ "description": "Treinar brigada", "deadline": "2024-10-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let candidates_uri = format!("/api/terms/{}/candidates", term_id);
    let (_, candidate) = t
        .json("POST", &candidates_uri, json!({ "collaborator_id": pending }))
        .await;
    let (status, _) = t
        .json(
            "POST",
            &format!("/api/candidates/{}/handoff", candidate["id"].as_str().unwrap()),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = t
        .json(
            "POST",
            &candidates_uri,
            json!({ "collaborator_id": signed, "data_url": data_url(PNG_BYTES) }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = t
        .json(
            "PUT",
            &format!("/api/terms/{}/milestones/convocation", term_id),
            json!({ "completed": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let expected_before = [1, 1, 1, 2, 1, 1];
    for (table, expected) in TERM_TABLES.iter().zip(expected_before) {
        assert_eq!(count_rows(&t.pool, table).await, expected, "{} before delete", table);
    }
    assert_eq!(t.stored_signature_files(), 1);

    let (status, _) = t
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/terms/{}", term_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for table in TERM_TABLES {
        assert_eq!(count_rows(&t.pool, table).await, 0, "{} after delete", table);
    }
    assert_eq!(count_rows(&t.pool, "collaborators").await, 3);
    assert_eq!(t.stored_signature_files(), 0);

    let (status, _) = t.get(&format!("/api/terms/{}", term_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_term_delete_keeps_signature_shared_with_another_term() {
    let t = setup().await;
    let first_term = t.create_term().await;
    let second_term = t.create_term().await;
    let collaborator_id = t.add_collaborator("Yara Fontes", true).await;

    for term_id in [first_term, second_term] {
        let (status, _) = t
            .json(
                "POST",
                &format!("/api/terms/{}/candidates", term_id),
                json!({ "collaborator_id": collaborator_id, "data_url": data_url(PNG_BYTES) }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    assert_eq!(t.stored_signature_files(), 1);

    let delete = |term_id: Uuid| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/terms/{}", term_id))
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = t.send(delete(first_term)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(t.stored_signature_files(), 1);

    let (status, _) = t.send(delete(second_term)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(t.stored_signature_files(), 0);
}
