use sqlx::PgPool;

/// Create tables and indexes if missing
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Initializing PostgreSQL schema...");

    for (name, ddl) in [
        ("depositories", CREATE_DEPOSITORIES_TABLE),
        ("micro_deposits", CREATE_MICRO_DEPOSITS_TABLE),
        ("micro_deposits unmerged index", CREATE_MICRO_DEPOSITS_UNMERGED_INDEX),
        ("micro_deposits owner index", CREATE_MICRO_DEPOSITS_OWNER_INDEX),
        ("events", CREATE_EVENTS_TABLE),
    ] {
        sqlx::query(ddl).execute(pool).await.inspect_err(|e| {
            tracing::error!("Failed to create {}: {}", name, e);
        })?;
    }

    tracing::info!("PostgreSQL schema ready");
    Ok(())
}

const CREATE_DEPOSITORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS depositories (
    depository_id   TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL,
    bank_name       TEXT NOT NULL,
    holder          TEXT NOT NULL,
    holder_type     TEXT NOT NULL,
    type            TEXT NOT NULL,
    routing_number  TEXT NOT NULL,
    account_number  TEXT NOT NULL,
    status          TEXT NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    last_updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at      TIMESTAMPTZ
)
"#;

const CREATE_MICRO_DEPOSITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS micro_deposits (
    depository_id   TEXT NOT NULL,
    user_id         TEXT NOT NULL,
    amount          TEXT NOT NULL,
    file_id         TEXT NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL,
    merged_filename TEXT,
    deleted_at      TIMESTAMPTZ,
    PRIMARY KEY (depository_id, user_id, amount, file_id)
)
"#;

const CREATE_MICRO_DEPOSITS_UNMERGED_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS micro_deposits_unmerged_idx
    ON micro_deposits (created_at)
    WHERE merged_filename IS NULL AND deleted_at IS NULL
"#;

const CREATE_MICRO_DEPOSITS_OWNER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS micro_deposits_owner_idx
    ON micro_deposits (depository_id, user_id)
"#;

const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    event_id   TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL,
    topic      TEXT NOT NULL,
    message    TEXT NOT NULL,
    type       TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;
