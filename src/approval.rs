//! Director decisions recorded from the emailed links.
//!
//! The link carries everything: application id, role and action. There is no
//! existence check and no guard against re-firing; the last call wins.

use std::fmt;

use sea_orm::sea_query::Expr;
use sea_orm::{ActiveEnum, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use crate::db::{self, entities::application, entities::DecisionStatus};

/// Roles allowed to decide on an application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApproverRole {
    Director,
}

impl ApproverRole {
    /// Exact, case-sensitive match on the role name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Director" => Some(ApproverRole::Director),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApproverRole::Director => "Director",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalAction {
    Approve,
    Reject,
}

impl ApprovalAction {
    /// Only the exact keyword `Approve` approves; anything else rejects.
    pub fn from_param(value: &str) -> Self {
        if value == "Approve" {
            ApprovalAction::Approve
        } else {
            ApprovalAction::Reject
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalAction::Approve => "Approve",
            ApprovalAction::Reject => "Reject",
        }
    }

    pub fn status(&self) -> DecisionStatus {
        match self {
            ApprovalAction::Approve => DecisionStatus::Approved,
            ApprovalAction::Reject => DecisionStatus::Rejected,
        }
    }
}

/// What a call to the approval link did.
#[derive(Debug, PartialEq, Eq)]
pub enum DecisionOutcome {
    Recorded {
        app_id: String,
        role: ApproverRole,
        status: DecisionStatus,
        rows_affected: u64,
    },
    Ignored {
        app_id: String,
        role: String,
    },
}

impl fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionOutcome::Recorded {
                app_id,
                role,
                status,
                ..
            } => {
                let verb = match status {
                    DecisionStatus::Approved => "approved",
                    DecisionStatus::Rejected => "rejected",
                    DecisionStatus::Pending => "reset",
                };
                write!(f, "Application {} {} by {}", app_id, verb, role.as_str())
            }
            DecisionOutcome::Ignored { app_id, role } => {
                write!(f, "Application {}: no action taken for role {}", app_id, role)
            }
        }
    }
}

/// Apply `action` to `app_id` if `role` is recognized.
pub async fn record_decision(
    db: &DatabaseConnection,
    app_id: &str,
    role: &str,
    action: &str,
) -> Result<DecisionOutcome, DbErr> {
    let Some(role) = ApproverRole::parse(role) else {
        tracing::info!("Ignoring decision on {} from unrecognized role {:?}", app_id, role);
        return Ok(DecisionOutcome::Ignored {
            app_id: app_id.to_string(),
            role: role.to_string(),
        });
    };

    let status = ApprovalAction::from_param(action).status();
    let result = application::Entity::update_many()
        .col_expr(application::Column::DirectorStatus, Expr::value(status.into_value()))
        .col_expr(application::Column::UpdatedAt, Expr::value(db::unix_now()))
        .filter(application::Column::Id.eq(app_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        tracing::warn!("Decision for unknown application {}", app_id);
    } else {
        tracing::info!("Application {} marked {:?} by {}", app_id, status, role.as_str());
    }

    Ok(DecisionOutcome::Recorded {
        app_id: app_id.to_string(),
        role,
        status,
        rows_affected: result.rows_affected,
    })
}
