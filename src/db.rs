//! SQLite persistence for analyzed strings / 字符串记录持久化
//!
//! - One table keyed by fingerprint, `value` also unique / 以指纹为主键
//! - Filtering loads records and runs the criteria evaluator on each / 过滤在内存中求值

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use thiserror::Error;

use crate::analysis::{AnalyzedString, CharacterFrequency, Fingerprint, Properties};
use crate::filter::FilterCriteria;
use crate::models::{format_timestamp, StringRow};

/// Storage errors / 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("string already exists: {0}")]
    Duplicate(Fingerprint),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Open a connection pool / 打开连接池
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Run database migrations / 运行数据库迁移
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS string_analysis (
            id TEXT PRIMARY KEY,
            value TEXT NOT NULL UNIQUE,
            length INTEGER NOT NULL,
            is_palindrome INTEGER NOT NULL,
            unique_characters INTEGER NOT NULL,
            word_count INTEGER NOT NULL,
            character_frequency_map TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_string_analysis_is_palindrome ON string_analysis(is_palindrome)"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_string_analysis_word_count ON string_analysis(word_count)"
    )
    .execute(pool)
    .await?;

    tracing::debug!("Database migrations applied");
    Ok(())
}

/// Drop all tables (used by `db reset`) / 删除所有表
pub async fn drop_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DROP TABLE IF EXISTS string_analysis")
        .execute(pool)
        .await?;
    Ok(())
}

/// Check the connection with `SELECT 1` / 检查数据库连接
pub async fn check_connection(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    tracing::debug!("Database connection check returned {}", one);
    Ok(())
}

const SELECT_COLUMNS: &str = "SELECT id, value, length, is_palindrome, unique_characters, word_count, character_frequency_map, created_at FROM string_analysis";

/// Analyzed string repository / 字符串记录仓库
#[derive(Debug, Clone)]
pub struct StringStore {
    pool: SqlitePool,
}

impl StringStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a record, rejecting a duplicate fingerprint / 插入记录
    pub async fn insert(&self, record: &AnalyzedString) -> Result<(), StoreError> {
        let frequency = serde_json::to_string(&record.properties.character_frequency)
            .map_err(|e| StoreError::Corrupt {
                id: record.fingerprint.to_string(),
                reason: e.to_string(),
            })?;

        let result = sqlx::query(
            "INSERT INTO string_analysis (id, value, length, is_palindrome, unique_characters, word_count, character_frequency_map, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(record.fingerprint.as_str())
        .bind(&record.value)
        .bind(record.properties.length as i64)
        .bind(record.properties.is_palindrome)
        .bind(record.properties.unique_characters as i64)
        .bind(record.properties.word_count as i64)
        .bind(&frequency)
        .bind(format_timestamp(&record.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::info!("Stored string {}", record.fingerprint);
                Ok(())
            }
            // Concurrent creations of the same value race on the primary key / 主键冲突
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tracing::debug!("Duplicate string rejected: {}", record.fingerprint);
                Err(StoreError::Duplicate(record.fingerprint.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch by fingerprint / 按指纹查询
    pub async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<AnalyzedString>, StoreError> {
        let row: Option<StringRow> = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(fingerprint.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_record).transpose()
    }

    /// All records, oldest first; rowid breaks timestamp ties / 全部记录
    pub async fn list(&self) -> Result<Vec<AnalyzedString>, StoreError> {
        let rows: Vec<StringRow> = sqlx::query_as(&format!("{} ORDER BY created_at, rowid", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_record).collect()
    }

    /// Records matching the criteria / 按条件过滤
    pub async fn filter(&self, criteria: &FilterCriteria) -> Result<Vec<AnalyzedString>, StoreError> {
        let mut records = self.list().await?;
        records.retain(|r| criteria.matches(r));
        Ok(records)
    }

    /// Delete by fingerprint, returning whether a row existed / 删除记录
    pub async fn delete(&self, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM string_analysis WHERE id = ?")
            .bind(fingerprint.as_str())
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!("Deleted string {}", fingerprint);
        }
        Ok(deleted)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM string_analysis")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.0)
    }
}

fn row_to_record(row: StringRow) -> Result<AnalyzedString, StoreError> {
    let corrupt = |reason: String| StoreError::Corrupt {
        id: row.id.clone(),
        reason,
    };

    let fingerprint = Fingerprint::from_hex(&row.id)
        .ok_or_else(|| corrupt("id is not a sha256 digest".to_string()))?;
    let character_frequency: CharacterFrequency = serde_json::from_str(&row.character_frequency_map)
        .map_err(|e| corrupt(format!("character_frequency_map: {}", e)))?;
    let created_at = DateTime::parse_from_rfc3339(&row.created_at)
        .map_err(|e| corrupt(format!("created_at: {}", e)))?
        .with_timezone(&Utc);
    let count = |v: i64, name: &str| {
        usize::try_from(v).map_err(|_| corrupt(format!("{} is negative", name)))
    };

    let properties = Properties {
        length: count(row.length, "length")?,
        is_palindrome: row.is_palindrome,
        unique_characters: count(row.unique_characters, "unique_characters")?,
        word_count: count(row.word_count, "word_count")?,
        character_frequency,
    };

    Ok(AnalyzedString {
        value: row.value,
        fingerprint,
        properties,
        created_at,
    })
}
