//! Database initialization
//!
//! Creates the database file on first run and every table idempotently
//! (`CREATE TABLE IF NOT EXISTS`). Term deletion cascades to every record
//! scoped by the term.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Open (creating if needed) the database file and bring the schema up to date
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory database with the full schema (tests, previews)
pub async fn init_memory_database() -> Result<SqlitePool> {
    // One connection: each in-memory connection would otherwise be its own database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Create every table and index; safe to call repeatedly
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_schema_version_table(pool).await?;
    create_branches_table(pool).await?;
    create_collaborators_table(pool).await?;
    create_terms_table(pool).await?;
    create_term_milestones_table(pool).await?;
    create_members_table(pool).await?;
    create_candidates_table(pool).await?;
    create_handoff_sessions_table(pool).await?;
    create_meetings_table(pool).await?;
    create_action_plans_table(pool).await?;
    create_medical_certificates_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_branches_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS branches (
            id TEXT PRIMARY KEY,
            company_name TEXT NOT NULL,
            branch_name TEXT NOT NULL,
            cnpj TEXT NOT NULL,
            cnae TEXT NOT NULL,
            city TEXT NOT NULL DEFAULT '',
            logo_url TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_collaborators_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collaborators (
            id TEXT PRIMARY KEY,
            branch_id TEXT NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            job_title TEXT,
            email TEXT,
            active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_collaborators_branch ON collaborators(branch_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_terms_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS terms (
            id TEXT PRIMARY KEY,
            branch_id TEXT NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
            year_label TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'ELECTION',
            previous_posse_date TEXT,
            employer_representative_id TEXT REFERENCES collaborators(id) ON DELETE SET NULL,
            president_id TEXT REFERENCES collaborators(id) ON DELETE SET NULL,
            election_location TEXT,
            election_start_time TEXT,
            election_end_time TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_terms_branch ON terms(branch_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_term_milestones_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS term_milestones (
            term_id TEXT NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
            milestone_id TEXT NOT NULL,
            completed_at TEXT NOT NULL,
            PRIMARY KEY (term_id, milestone_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_members_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            id TEXT PRIMARY KEY,
            term_id TEXT NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
            collaborator_id TEXT NOT NULL REFERENCES collaborators(id) ON DELETE CASCADE,
            role TEXT NOT NULL,
            origin TEXT NOT NULL,
            votes INTEGER,
            UNIQUE (term_id, collaborator_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_candidates_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS candidates (
            id TEXT PRIMARY KEY,
            term_id TEXT NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
            collaborator_id TEXT NOT NULL REFERENCES collaborators(id) ON DELETE CASCADE,
            registered_at TEXT NOT NULL,
            signature_url TEXT,
            status TEXT NOT NULL DEFAULT 'PENDING_SIGNATURE',
            UNIQUE (term_id, collaborator_id),
            CHECK ((status = 'APPROVED') = (signature_url IS NOT NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_handoff_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS handoff_sessions (
            token TEXT PRIMARY KEY,
            candidate_id TEXT NOT NULL REFERENCES candidates(id) ON DELETE CASCADE,
            status TEXT NOT NULL DEFAULT 'OPEN',
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_meetings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meetings (
            id TEXT PRIMARY KEY,
            term_id TEXT NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            date TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_action_plans_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS action_plans (
            id TEXT PRIMARY KEY,
            meeting_id TEXT NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            deadline TEXT NOT NULL,
            responsible_id TEXT REFERENCES collaborators(id) ON DELETE SET NULL,
            status TEXT NOT NULL DEFAULT 'PENDING'
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_medical_certificates_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS medical_certificates (
            id TEXT PRIMARY KEY,
            collaborator_id TEXT NOT NULL REFERENCES collaborators(id) ON DELETE CASCADE,
            start_date TEXT NOT NULL,
            days INTEGER NOT NULL CHECK (days > 0),
            cid TEXT NOT NULL DEFAULT '',
            reason TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_certificates_collaborator ON medical_certificates(collaborator_id, start_date)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
