//! PostgreSQL adapter: one table per entity, each row a JSONB document keyed by the canonical id string.

use super::{ListFilter, Repository};
use crate::error::AppError;
use crate::mapping::{key_space_exhausted, Entity, EntityKey};
use async_trait::async_trait;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::marker::PhantomData;
use std::str::FromStr;

pub struct PgDocumentRepository<E: Entity> {
    pool: PgPool,
    /// Quoted schema name.
    schema: String,
    /// Schema-qualified, quoted table name.
    table: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> PgDocumentRepository<E> {
    /// Repository over `schema.table`. Call [`ensure_table`](Self::ensure_table) before use.
    pub fn new(pool: PgPool, schema: &str, table: &str) -> Self {
        PgDocumentRepository {
            pool,
            schema: quote_ident(schema),
            table: format!("{}.{}", quote_ident(schema), quote_ident(table)),
            _entity: PhantomData,
        }
    }

    /// Create schema and table if missing.
    pub async fn ensure_table(&self) -> Result<(), AppError> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema))
            .execute(&self.pool)
            .await?;
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                seq BIGSERIAL NOT NULL,
                id TEXT PRIMARY KEY,
                data JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        tracing::info!(table = %self.table, "document table ready");
        Ok(())
    }

    fn decode(data: serde_json::Value) -> Result<E, AppError> {
        serde_json::from_value(data).map_err(|e| AppError::Repository(format!("corrupt document: {}", e)))
    }

    fn encode(entity: &E) -> Result<serde_json::Value, AppError> {
        serde_json::to_value(entity).map_err(|e| AppError::Repository(e.to_string()))
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for PgDocumentRepository<E> {
    async fn get(&self, id: &E::Key) -> Result<Option<E>, AppError> {
        let sql = format!("SELECT data FROM {} WHERE id = $1", self.table);
        tracing::debug!(sql = %sql, id = %id, "query");
        let row: Option<(serde_json::Value,)> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(data,)| Self::decode(data)).transpose()
    }

    /// Filters run on the decoded documents with [`ListFilter::matches`], the same
    /// comparison the in-memory adapter uses.
    async fn list(&self, filter: Option<&ListFilter>) -> Result<Vec<E>, AppError> {
        let sql = format!("SELECT data FROM {} ORDER BY seq", self.table);
        tracing::debug!(sql = %sql, filter = ?filter, "query");
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|(data,)| data)
            .filter(|data| filter.map(|f| f.matches(data)).unwrap_or(true))
            .map(Self::decode)
            .collect()
    }

    async fn insert(&self, mut entity: E) -> Result<E, AppError> {
        let mut tx = self.pool.begin().await?;
        let (seq,): (i64,) = sqlx::query_as("SELECT nextval(pg_get_serial_sequence($1, 'seq'))")
            .bind(&self.table)
            .fetch_one(&mut *tx)
            .await?;
        if entity.id().is_none() {
            let sequence = u64::try_from(seq).unwrap_or_default();
            entity.set_id(E::Key::generate(sequence).ok_or_else(|| key_space_exhausted(sequence))?);
        }
        let id = entity.id().map(ToString::to_string).unwrap_or_default();
        let sql = format!(
            "INSERT INTO {} (seq, id, data) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING RETURNING data",
            self.table
        );
        tracing::debug!(sql = %sql, id = %id, "query (tx)");
        let row: Option<(serde_json::Value,)> = sqlx::query_as(&sql)
            .bind(seq)
            .bind(&id)
            .bind(Self::encode(&entity)?)
            .fetch_optional(&mut *tx)
            .await?;
        let (data,) = row.ok_or_else(|| AppError::Conflict(format!("id {} already exists", id)))?;
        tx.commit().await?;
        Self::decode(data)
    }

    async fn replace(&self, id: &E::Key, mut entity: E) -> Result<Option<E>, AppError> {
        entity.set_id(id.clone());
        let sql = format!(
            "UPDATE {} SET data = $2, updated_at = NOW() WHERE id = $1 RETURNING data",
            self.table
        );
        tracing::debug!(sql = %sql, id = %id, "query");
        let row: Option<(serde_json::Value,)> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .bind(Self::encode(&entity)?)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(data,)| Self::decode(data)).transpose()
    }

    async fn remove(&self, id: &E::Key) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        tracing::debug!(sql = %sql, id = %id, "query");
        let done = sqlx::query(&sql).bind(id.to_string()).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await.map_err(AppError::Db)?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await
        .map_err(AppError::Db)?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await
            .map_err(AppError::Db)?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url.rfind('/').ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))? + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
