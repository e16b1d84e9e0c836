//! Shared fixtures and test doubles.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbBackend, QueryResult, Set, Statement};
use tempfile::TempDir;

use crate::campus::CampusDirectory;
use crate::db::{self, entities::application, entities::DecisionStatus};
use crate::intake::{IntakeService, Integrations};
use crate::mail::{MailError, Mailer, OutgoingEmail};
use crate::storage::{FileStore, StorageError, StorageResult, StoredFile};

/// Fresh SQLite file with all tables created.
pub async fn test_db(temp_dir: &TempDir) -> Arc<DatabaseConnection> {
    let db = db::init_database(&db::sqlite_url(&temp_dir.path().join("test.db")))
        .await
        .unwrap();
    Arc::new(db)
}

/// Pending parent row, so detail and attachment rows satisfy their foreign keys.
pub async fn seed_application(db: &DatabaseConnection, id: &str) {
    application::ActiveModel {
        id: Set(id.to_string()),
        student_email: Set("a@b.edu".to_string()),
        form_type: Set("Duplicate Grade Card".to_string()),
        applicant_name: Set("Jane Doe".to_string()),
        reg_no: Set("123".to_string()),
        campus: Set("Anantapur Campus".to_string()),
        director_status: Set(DecisionStatus::Pending),
        created_at: Set(0),
        updated_at: Set(0),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn detail_row(db: &DatabaseConnection, table: &str, app_id: &str) -> Option<QueryResult> {
    db.query_one(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        format!("SELECT * FROM {} WHERE application_id = ?", table),
        [app_id.into()],
    ))
    .await
    .unwrap()
}

pub fn intake_service(
    db: Arc<DatabaseConnection>,
    store: Arc<MemoryStore>,
    mailer: Arc<RecordingMailer>,
) -> IntakeService {
    IntakeService::new(
        db,
        Arc::new(CampusDirectory::default()),
        Some(Integrations {
            files: store,
            mailer,
        }),
    )
}

/// Keeps uploads in memory; optionally fails every upload for one field.
#[derive(Default)]
pub struct MemoryStore {
    fail_field: Option<String>,
    uploads: Mutex<Vec<(String, Bytes)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(field: &str) -> Self {
        Self {
            fail_field: Some(field.to_string()),
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<(String, Bytes)> {
        self.uploads.lock().clone()
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn upload(&self, name: &str, _content_type: &str, data: Bytes) -> StorageResult<StoredFile> {
        if let Some(field) = &self.fail_field {
            if name.contains(&format!("_{}_", field)) {
                return Err(StorageError::Provider(format!("upload of {} refused", name)));
            }
        }
        self.uploads.lock().push((name.to_string(), data));
        Ok(StoredFile {
            id: format!("mem-{}", name),
            web_view_link: None,
        })
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

/// Captures every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().push(email.clone());
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "recording"
    }
}
