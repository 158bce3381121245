// ==========================================
// 学校设备台账 - 负责人仓储
// ==========================================
// 红线: Repository 不含业务逻辑（查找或创建的判定在 DimensionResolver）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::dimension::Operator;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct OperatorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OperatorRepository {
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

    /// 按自然键 (name, position, school) 查询
    pub fn find_by_key(
        &self,
        name: &str,
        position: &str,
        school_id: i64,
    ) -> RepositoryResult<Option<Operator>> {
        let conn = self.get_conn()?;
        Self::find_by_key_tx(&conn, name, position, school_id)
    }

    /// 查询学校下全部负责人
    pub fn list_by_school(&self, school_id: i64) -> RepositoryResult<Vec<Operator>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT operator_id, name, position, school_id
            FROM operator
            WHERE school_id = ?1
            ORDER BY name ASC, position ASC
            "#,
        )?;
        let operators = stmt
            .query_map(params![school_id], map_operator)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(operators)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM operator", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ===== 连接级操作 =====

    pub fn find_by_key_tx(
        conn: &Connection,
        name: &str,
        position: &str,
        school_id: i64,
    ) -> RepositoryResult<Option<Operator>> {
        let operator = conn
            .query_row(
                r#"
                SELECT operator_id, name, position, school_id
                FROM operator
                WHERE name = ?1 AND position = ?2 AND school_id = ?3
                ORDER BY operator_id ASC
                LIMIT 1
                "#,
                params![name, position, school_id],
                map_operator,
            )
            .optional()?;
        Ok(operator)
    }

    pub fn insert_tx(
        conn: &Connection,
        name: &str,
        position: &str,
        school_id: i64,
    ) -> RepositoryResult<Operator> {
        conn.execute(
            "INSERT INTO operator (name, position, school_id) VALUES (?1, ?2, ?3)",
            params![name, position, school_id],
        )?;
        Ok(Operator {
            operator_id: conn.last_insert_rowid(),
            name: name.to_string(),
            position: position.to_string(),
            school_id: Some(school_id),
        })
    }
}

fn map_operator(row: &rusqlite::Row<'_>) -> SqliteResult<Operator> {
    Ok(Operator {
        operator_id: row.get(0)?,
        name: row.get(1)?,
        position: row.get(2)?,
        school_id: row.get(3)?,
    })
}
