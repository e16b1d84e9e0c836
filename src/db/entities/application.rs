//! Application entity (one row per submission, whatever the form)

use sea_orm::entity::prelude::*;
use sea_orm::prelude::StringLen;

/// Director review outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DecisionStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String, // APP-<unix millis>
    pub student_email: String,
    pub form_type: String, // canonical catalog label
    pub applicant_name: String,
    pub reg_no: String,
    pub campus: String,
    pub director_status: DecisionStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::file_attachment::Entity")]
    FileAttachments,
}

impl Related<super::file_attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FileAttachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
