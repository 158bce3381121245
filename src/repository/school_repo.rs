// ==========================================
// 学校设备台账 - 学校仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::dimension::School;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 学校仓储
/// 职责: 管理 school 表的 CRUD 操作
pub struct SchoolRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SchoolRepository {
    /// 创建新的 SchoolRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建学校
    pub fn create(&self, school_name: &str, ip: Option<i64>) -> RepositoryResult<School> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, school_name, ip)
    }

    /// 按主键查询
    pub fn find_by_id(&self, school_id: i64) -> RepositoryResult<Option<School>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, school_id)
    }

    /// 按主键查询,不存在时返回 NotFound
    pub fn get(&self, school_id: i64) -> RepositoryResult<School> {
        let conn = self.get_conn()?;
        Self::require_tx(&conn, school_id)
    }

    /// 查询全部学校（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<School>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT school_id, school_name, ip FROM school ORDER BY school_name ASC, school_id ASC",
        )?;
        let schools = stmt
            .query_map([], map_school)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(schools)
    }

    /// 删除学校（级联删除其设备/台账）
    pub fn delete(&self, school_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM school WHERE school_id = ?1", params![school_id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("School", school_id));
        }
        Ok(())
    }

    // ===== 连接级操作（可在外部事务中调用）=====

    pub fn insert_tx(conn: &Connection, school_name: &str, ip: Option<i64>) -> RepositoryResult<School> {
        let name = school_name.trim();
        if name.is_empty() {
            return Err(RepositoryError::ValidationError("学校名称不能为空".to_string()));
        }
        conn.execute(
            "INSERT INTO school (school_name, ip) VALUES (?1, ?2)",
            params![name, ip],
        )?;
        Ok(School {
            school_id: conn.last_insert_rowid(),
            school_name: name.to_string(),
            ip,
        })
    }

    pub fn find_by_id_tx(conn: &Connection, school_id: i64) -> RepositoryResult<Option<School>> {
        let school = conn
            .query_row(
                "SELECT school_id, school_name, ip FROM school WHERE school_id = ?1",
                params![school_id],
                map_school,
            )
            .optional()?;
        Ok(school)
    }

    pub fn require_tx(conn: &Connection, school_id: i64) -> RepositoryResult<School> {
        Self::find_by_id_tx(conn, school_id)?
            .ok_or_else(|| RepositoryError::not_found("School", school_id))
    }
}

fn map_school(row: &rusqlite::Row<'_>) -> SqliteResult<School> {
    Ok(School {
        school_id: row.get(0)?,
        school_name: row.get(1)?,
        ip: row.get(2)?,
    })
}
