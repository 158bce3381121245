// ==========================================
// 学校设备台账 - 导入批次日志仓储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::import::ImportBatch;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct ImportBatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ImportBatchRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询最近的导入批次
    pub fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, school_id, file_name, total_rows, imported_rows,
                   skipped_rows, error_rows, imported_at, elapsed_ms, errors_json
            FROM import_batch
            ORDER BY imported_at DESC
            LIMIT ?1
            "#,
        )?;

        let batches = stmt
            .query_map(params![limit as i64], |row| {
                Ok(ImportBatch {
                    batch_id: row.get(0)?,
                    school_id: row.get(1)?,
                    file_name: row.get(2)?,
                    total_rows: row.get(3)?,
                    imported_rows: row.get(4)?,
                    skipped_rows: row.get(5)?,
                    error_rows: row.get(6)?,
                    imported_at: chrono::DateTime::parse_from_rfc3339(&row.get::<_, String>(7)?)
                        .map(|dt| dt.with_timezone(&chrono::Utc))
                        .unwrap_or_else(|_| chrono::Utc::now()),
                    elapsed_ms: row.get(8)?,
                    errors_json: row.get(9)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(batches)
    }

    // ===== 连接级操作 =====

    pub fn insert_tx(conn: &Connection, batch: &ImportBatch) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, school_id, file_name, total_rows, imported_rows,
                skipped_rows, error_rows, imported_at, elapsed_ms, errors_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                batch.batch_id,
                batch.school_id,
                batch.file_name,
                batch.total_rows,
                batch.imported_rows,
                batch.skipped_rows,
                batch.error_rows,
                batch.imported_at.to_rfc3339(),
                batch.elapsed_ms,
                batch.errors_json,
            ],
        )?;
        Ok(())
    }
}
