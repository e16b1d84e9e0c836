//! Director notification: template registry and approve/reject links.

use once_cell::sync::Lazy;
use serde::Serialize;
use tera::{Context, Tera};

use crate::approval::{ApprovalAction, ApproverRole};
use crate::mail::OutgoingEmail;

/// Global template engine instance with embedded templates.
pub static TEMPLATES: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();

    tera.add_raw_templates(vec![("notification.html", NOTIFICATION_TEMPLATE)])
        .expect("Failed to load templates");

    tera
});

/// What the director needs to see about one submission.
#[derive(Debug, Serialize)]
pub struct NotificationDetails<'a> {
    pub app_id: &'a str,
    pub form_type: &'a str,
    pub applicant_name: &'a str,
    pub student_email: &'a str,
}

/// Link that records `action` for `app_id` when opened.
pub fn decision_link(base_url: &str, app_id: &str, role: ApproverRole, action: ApprovalAction) -> String {
    format!(
        "{}/approve?id={}&role={}&action={}",
        base_url.trim_end_matches('/'),
        app_id,
        role.as_str(),
        action.as_str()
    )
}

/// Render the notification for `recipient`.
pub fn director_notification(
    recipient: &str,
    details: &NotificationDetails<'_>,
    base_url: &str,
) -> Result<OutgoingEmail, tera::Error> {
    let role = ApproverRole::Director;

    let mut context = Context::new();
    context.insert("app", details);
    context.insert(
        "approve_url",
        &decision_link(base_url, details.app_id, role, ApprovalAction::Approve),
    );
    context.insert(
        "reject_url",
        &decision_link(base_url, details.app_id, role, ApprovalAction::Reject),
    );

    Ok(OutgoingEmail {
        to: recipient.to_string(),
        subject: format!("New Application: {} - {}", details.form_type, details.app_id),
        html_body: TEMPLATES.render("notification.html", &context)?,
    })
}

const NOTIFICATION_TEMPLATE: &str = r##"<h3>New Application Received</h3>
<p><strong>App ID:</strong> {{ app.app_id }}</p>
<p><strong>Form:</strong> {{ app.form_type }}</p>
<p><strong>Student:</strong> {{ app.applicant_name }} ({{ app.student_email }})</p>
<p><a href="{{ approve_url | safe }}">Approve</a> |
   <a href="{{ reject_url | safe }}">Reject</a></p>
"##;
