//! Submission intake pipeline.
//!
//! One call to [`IntakeService::submit`] runs the whole sequence for a
//! submission: application row, detail row, concurrent uploads with their
//! attachment rows, file-slot back-fill, director notification. Steps are not
//! atomic with respect to each other; a failure part-way leaves the earlier
//! writes in place and is reported to the caller as a 500.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::campus::CampusDirectory;
use crate::catalog::{FormDefinition, FormKind};
use crate::db::{self, entities::application, entities::file_attachment, entities::DecisionStatus};
use crate::error::{Result, ServerError};
use crate::mail::Mailer;
use crate::notify::{self, NotificationDetails};
use crate::storage::{FileStore, StoredFile};

/// One file part of a submission.
#[derive(Clone, Debug)]
pub struct SubmittedFile {
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl SubmittedFile {
    /// An untouched browser file input arrives as a part with no name and no bytes.
    pub fn is_blank(&self) -> bool {
        self.file_name.is_empty() && self.data.is_empty()
    }
}

/// Flat bundle of named text values and file parts, in arrival order.
#[derive(Debug, Default)]
pub struct Submission {
    fields: Vec<(String, String)>,
    files: Vec<SubmittedFile>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn push_file(&mut self, file: SubmittedFile) {
        self.files.push(file);
    }

    /// First value sent under `name`.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn text_or_empty(&self, name: &str) -> String {
        self.text(name).unwrap_or_default().to_string()
    }

    pub fn files(&self) -> &[SubmittedFile] {
        &self.files
    }

    /// `formType` wins; `formId` is consulted when `formType` is missing or unknown.
    pub fn form_kind(&self) -> Result<FormKind> {
        let form_type = self.text("formType");
        let form_id = self.text("formId");

        form_type
            .and_then(FormKind::resolve)
            .or_else(|| form_id.and_then(FormKind::resolve))
            .ok_or_else(|| {
                ServerError::UnknownFormType(form_type.or(form_id).unwrap_or_default().to_string())
            })
    }
}

/// Issues `APP-<unix millis>` ids, bumping to the next free millisecond on collision.
#[derive(Debug, Default)]
pub struct AppIdGenerator {
    last: AtomicI64,
}

impl AppIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        self.next_at(now)
    }

    fn next_at(&self, now_millis: i64) -> String {
        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now_millis.max(prev + 1);
            match self
                .last
                .compare_exchange(prev, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return format!("APP-{}", candidate),
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Upload and notification collaborators. Absent when integrations are disabled.
#[derive(Clone)]
pub struct Integrations {
    pub files: Arc<dyn FileStore>,
    pub mailer: Arc<dyn Mailer>,
}

#[derive(Debug)]
struct UploadedAttachment {
    field_name: String,
    stored: StoredFile,
}

pub struct IntakeService {
    db: Arc<DatabaseConnection>,
    ids: AppIdGenerator,
    campuses: Arc<CampusDirectory>,
    integrations: Option<Integrations>,
}

impl IntakeService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        campuses: Arc<CampusDirectory>,
        integrations: Option<Integrations>,
    ) -> Self {
        Self {
            db,
            ids: AppIdGenerator::new(),
            campuses,
            integrations,
        }
    }

    /// Run the intake sequence and return the new application id.
    ///
    /// `base_url` is where the approve/reject links in the notification point.
    pub async fn submit(&self, mut submission: Submission, base_url: &str) -> Result<String> {
        let app_id = self.ids.next_id();
        let kind = submission.form_kind()?;
        let def = kind.definition();

        self.insert_application(&submission, def, &app_id).await?;
        db::insert_detail(&self.db, def, &app_id, |key| submission.text(key)).await?;

        let files: Vec<SubmittedFile> = std::mem::take(&mut submission.files)
            .into_iter()
            .filter(|file| !file.is_blank())
            .collect();

        tracing::info!(
            "Recorded {} for {} ({} file(s))",
            app_id,
            kind.label(),
            files.len()
        );

        let Some(integrations) = &self.integrations else {
            if !files.is_empty() {
                tracing::warn!(
                    "Integrations disabled; discarding {} file(s) for {}",
                    files.len(),
                    app_id
                );
            }
            return Ok(app_id);
        };

        let uploaded = self.upload_all(&integrations.files, &app_id, files).await?;

        let assignments = slot_assignments(def, &uploaded);
        db::backfill_file_slots(&self.db, def, &app_id, &assignments).await?;

        let campus = submission.text("campus").unwrap_or_default();
        let recipient = self.campuses.recipient_for(campus);
        let email = notify::director_notification(
            recipient,
            &NotificationDetails {
                app_id: &app_id,
                form_type: def.label,
                applicant_name: submission.text("applicantName").unwrap_or_default(),
                student_email: submission.text("email").unwrap_or_default(),
            },
            base_url,
        )?;
        integrations.mailer.send(&email).await?;

        tracing::info!(
            "Notified {} about {} via {}",
            recipient,
            app_id,
            integrations.mailer.kind()
        );

        Ok(app_id)
    }

    async fn insert_application(
        &self,
        submission: &Submission,
        def: &FormDefinition,
        app_id: &str,
    ) -> Result<()> {
        let now = db::unix_now();
        let row = application::ActiveModel {
            id: Set(app_id.to_string()),
            student_email: Set(submission.text_or_empty("email")),
            form_type: Set(def.label.to_string()),
            applicant_name: Set(submission.text_or_empty("applicantName")),
            reg_no: Set(submission.text_or_empty("regNo")),
            campus: Set(submission.text_or_empty("campus")),
            director_status: Set(DecisionStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };
        row.insert(self.db.as_ref()).await?;
        Ok(())
    }

    /// Start every upload at once, wait for all of them, then fail with the
    /// first error if any upload failed.
    async fn upload_all(
        &self,
        store: &Arc<dyn FileStore>,
        app_id: &str,
        files: Vec<SubmittedFile>,
    ) -> Result<Vec<UploadedAttachment>> {
        let handles: Vec<_> = files
            .into_iter()
            .map(|file| {
                let store = Arc::clone(store);
                let db = Arc::clone(&self.db);
                let app_id = app_id.to_string();
                tokio::spawn(store_attachment(store, db, app_id, file))
            })
            .collect();

        let mut uploaded = Vec::with_capacity(handles.len());
        let mut first_error = None;

        for handle in handles {
            let outcome = handle
                .await
                .map_err(|e| ServerError::Internal(format!("upload task failed: {}", e)))
                .and_then(|result| result);
            match outcome {
                Ok(attachment) => uploaded.push(attachment),
                Err(e) => {
                    tracing::error!("Upload for {} failed: {}", app_id, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(uploaded),
        }
    }
}

async fn store_attachment(
    store: Arc<dyn FileStore>,
    db: Arc<DatabaseConnection>,
    app_id: String,
    file: SubmittedFile,
) -> Result<UploadedAttachment> {
    let object_name = format!("{}_{}_{}", app_id, file.field_name, file.file_name);
    let stored = store
        .upload(&object_name, &file.content_type, file.data)
        .await?;

    file_attachment::ActiveModel {
        application_id: Set(app_id),
        field_name: Set(file.field_name.clone()),
        file_name: Set(file.file_name),
        provider_file_id: Set(stored.id.clone()),
        file_type: Set(file.content_type),
        web_view_link: Set(stored.web_view_link.clone()),
        created_at: Set(db::unix_now()),
        ..Default::default()
    }
    .insert(db.as_ref())
    .await?;

    Ok(UploadedAttachment {
        field_name: file.field_name,
        stored,
    })
}

/// Slot column → provider id for every upload that fills a named slot.
/// A slot sent twice keeps its first upload.
fn slot_assignments(
    def: &FormDefinition,
    uploaded: &[UploadedAttachment],
) -> Vec<(&'static str, String)> {
    let mut assignments: Vec<(&'static str, String)> = Vec::new();
    for attachment in uploaded {
        if let Some(slot) = def.file_slot(&attachment.field_name) {
            if !assignments.iter().any(|(column, _)| *column == slot.column) {
                assignments.push((slot.column, attachment.stored.id.clone()));
            }
        }
    }
    assignments
}
