//! Database module for SQLite persistence using SeaORM

pub mod entities;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use sea_orm::sea_query::{Alias, Expr, Query, SimpleExpr};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement, Value};

use crate::catalog::{ColumnKind, FormDefinition, FormKind};

/// Connection URL for a SQLite file, created on first use.
pub fn sqlite_url(db_path: &Path) -> String {
    format!("sqlite:{}?mode=rwc", db_path.display())
}

/// Initialize database connection and create tables
pub async fn init_database(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    tracing::info!("Connecting to database: {}", db_url);

    let db = Database::connect(db_url).await?;

    // Create tables
    create_tables(&db).await?;

    Ok(db)
}

/// Seconds since the epoch, as stored in `created_at`/`updated_at`.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

async fn execute_sql(db: &DatabaseConnection, sql: String) -> Result<(), DbErr> {
    db.execute(Statement::from_string(db.get_database_backend(), sql))
        .await?;
    Ok(())
}

/// Create all tables if they don't exist
async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Applications table (one per submission)
    execute_sql(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS applications (
            id TEXT PRIMARY KEY,
            student_email TEXT NOT NULL DEFAULT '',
            form_type TEXT NOT NULL,
            applicant_name TEXT NOT NULL DEFAULT '',
            reg_no TEXT NOT NULL DEFAULT '',
            campus TEXT NOT NULL DEFAULT '',
            director_status TEXT NOT NULL DEFAULT 'PENDING',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#
        .to_string(),
    )
    .await?;

    // File attachments table (one per stored upload)
    execute_sql(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS file_attachments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            application_id TEXT NOT NULL,
            field_name TEXT NOT NULL DEFAULT '',
            file_name TEXT NOT NULL,
            provider_file_id TEXT NOT NULL,
            file_type TEXT NOT NULL DEFAULT '',
            web_view_link TEXT,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (application_id) REFERENCES applications(id) ON DELETE CASCADE
        )
        "#
        .to_string(),
    )
    .await?;

    execute_sql(
        db,
        r#"CREATE INDEX IF NOT EXISTS idx_file_attachments_app ON file_attachments(application_id)"#
            .to_string(),
    )
    .await?;

    // One detail table per form, shaped by the catalog
    for kind in FormKind::ALL {
        let def = kind.definition();
        execute_sql(db, detail_table_sql(def)).await?;
        execute_sql(
            db,
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_app ON {table}(application_id)",
                table = def.table
            ),
        )
        .await?;
    }

    tracing::info!("Database tables initialized");
    Ok(())
}

/// DDL for a form's detail table.
fn detail_table_sql(def: &FormDefinition) -> String {
    let mut columns = vec![
        "id INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
        "application_id TEXT NOT NULL".to_string(),
    ];
    columns.extend(def.columns.iter().map(|mapping| match mapping.kind {
        ColumnKind::Text => format!("{} TEXT NOT NULL DEFAULT ''", mapping.column),
        ColumnKind::Real => format!("{} REAL NOT NULL DEFAULT 0", mapping.column),
    }));
    columns.extend(def.files.iter().map(|slot| format!("{} TEXT", slot.column)));
    columns.push("created_at INTEGER NOT NULL".to_string());
    columns.push(
        "FOREIGN KEY (application_id) REFERENCES applications(id) ON DELETE CASCADE".to_string(),
    );

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        def.table,
        columns.join(",\n    ")
    )
}

/// Stored value for one mapped column.
fn column_value(kind: ColumnKind, raw: Option<&str>) -> Value {
    match kind {
        ColumnKind::Text => Value::from(raw.unwrap_or_default().to_string()),
        ColumnKind::Real => Value::from(
            raw.and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(0.0),
        ),
    }
}

/// Insert the detail row for `def`, reading each mapped column through `lookup`.
pub async fn insert_detail<'a, F>(
    db: &DatabaseConnection,
    def: &FormDefinition,
    app_id: &str,
    lookup: F,
) -> Result<(), DbErr>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut columns = vec![Alias::new("application_id")];
    let mut values = vec![SimpleExpr::Value(Value::from(app_id.to_string()))];

    for mapping in def.columns {
        columns.push(Alias::new(mapping.column));
        values.push(SimpleExpr::Value(column_value(
            mapping.kind,
            lookup(mapping.source),
        )));
    }

    columns.push(Alias::new("created_at"));
    values.push(SimpleExpr::Value(Value::from(unix_now())));

    let mut insert = Query::insert();
    insert
        .into_table(Alias::new(def.table))
        .columns(columns)
        .values(values)
        .map_err(|e| DbErr::Custom(e.to_string()))?;

    db.execute(db.get_database_backend().build(&insert)).await?;
    Ok(())
}

/// Write provider ids into the detail row's file-slot columns.
/// Returns the number of rows touched (0 or 1).
pub async fn backfill_file_slots(
    db: &DatabaseConnection,
    def: &FormDefinition,
    app_id: &str,
    assignments: &[(&'static str, String)],
) -> Result<u64, DbErr> {
    if assignments.is_empty() {
        return Ok(0);
    }

    let mut update = Query::update();
    update
        .table(Alias::new(def.table))
        .and_where(Expr::col(Alias::new("application_id")).eq(app_id));
    for (column, provider_id) in assignments {
        update.value(Alias::new(*column), provider_id.clone());
    }

    let result = db.execute(db.get_database_backend().build(&update)).await?;
    Ok(result.rows_affected())
}
