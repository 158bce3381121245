// ==========================================
// 学校设备台账 - 唯一编号仓储
// ==========================================
// 作用域: (school_id, cate);school_id 为空时为全局 (cate),覆盖所有学校的记录
// 说明: 学校过滤统一写作 `(?1 IS NULL OR school_id = ?1)`
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::uid::Uid;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct UidRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UidRepository {
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

    /// 作用域内最后一个序号（无记录时为 0）
    pub fn last_id_number(&self, school_id: Option<i64>, cate: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::max_id_number_tx(&conn, school_id, cate)
    }

    /// 按 (school, cate, id_number) 查询;school 为空时只按 (cate, id_number)
    pub fn find(
        &self,
        school_id: Option<i64>,
        cate: &str,
        id_number: i64,
    ) -> RepositoryResult<Option<Uid>> {
        let conn = self.get_conn()?;
        Self::find_tx(&conn, school_id, cate, id_number)
    }

    pub fn find_by_id(&self, uid_id: i64) -> RepositoryResult<Option<Uid>> {
        let conn = self.get_conn()?;
        let uid = conn
            .query_row(
                "SELECT uid_id, cate, id_number, school_id, mfg_year FROM uid WHERE uid_id = ?1",
                params![uid_id],
                map_uid,
            )
            .optional()?;
        Ok(uid)
    }

    /// 学校的全部唯一编号
    pub fn list_by_school(&self, school_id: i64) -> RepositoryResult<Vec<Uid>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT uid_id, cate, id_number, school_id, mfg_year
            FROM uid
            WHERE school_id = ?1
            ORDER BY cate ASC, id_number ASC
            "#,
        )?;
        let uids = stmt
            .query_map(params![school_id], map_uid)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(uids)
    }

    /// 逐个发号（单台设备登记路径）
    ///
    /// 在一个事务内读取水位并写入 水位+1;批量导入走 SequenceAllocator
    pub fn create_next(
        &self,
        school_id: Option<i64>,
        cate: &str,
        mfg_year: Option<&str>,
    ) -> RepositoryResult<Uid> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let next = Self::max_id_number_tx(&tx, school_id, cate)? + 1;
        let uid = Self::insert_tx(&tx, school_id, cate, next, mfg_year)?;
        tx.commit()?;
        debug!(cate = %cate, id_number = next, "逐个发号完成");
        Ok(uid)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM uid", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ===== 连接级操作 =====

    /// 水位查询: MAX(id_number),无记录时为 0
    ///
    /// school 为空时取该分类在所有学校中的最大值
    pub fn max_id_number_tx(
        conn: &Connection,
        school_id: Option<i64>,
        cate: &str,
    ) -> RepositoryResult<i64> {
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(id_number) FROM uid WHERE (?1 IS NULL OR school_id = ?1) AND cate = ?2",
            params![school_id, cate],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0))
    }

    pub fn find_tx(
        conn: &Connection,
        school_id: Option<i64>,
        cate: &str,
        id_number: i64,
    ) -> RepositoryResult<Option<Uid>> {
        let uid = conn
            .query_row(
                r#"
                SELECT uid_id, cate, id_number, school_id, mfg_year
                FROM uid
                WHERE (?1 IS NULL OR school_id = ?1) AND cate = ?2 AND id_number = ?3
                LIMIT 1
                "#,
                params![school_id, cate, id_number],
                map_uid,
            )
            .optional()?;
        Ok(uid)
    }

    pub fn insert_tx(
        conn: &Connection,
        school_id: Option<i64>,
        cate: &str,
        id_number: i64,
        mfg_year: Option<&str>,
    ) -> RepositoryResult<Uid> {
        conn.execute(
            "INSERT INTO uid (cate, id_number, school_id, mfg_year) VALUES (?1, ?2, ?3, ?4)",
            params![cate, id_number, school_id, mfg_year],
        )?;
        Ok(Uid {
            uid_id: conn.last_insert_rowid(),
            cate: cate.to_string(),
            id_number,
            school_id,
            mfg_year: mfg_year.map(|s| s.to_string()),
        })
    }
}

fn map_uid(row: &rusqlite::Row<'_>) -> SqliteResult<Uid> {
    Ok(Uid {
        uid_id: row.get(0)?,
        cate: row.get(1)?,
        id_number: row.get(2)?,
        school_id: row.get(3)?,
        mfg_year: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::repository::school_repo::SchoolRepository;

    #[test]
    fn test_create_next_starts_at_one_per_scope() {
        let conn = open_in_memory().unwrap();
        let a = SchoolRepository::insert_tx(&conn, "A", None).unwrap();
        let b = SchoolRepository::insert_tx(&conn, "B", None).unwrap();
        let repo = UidRepository::from_connection(Arc::new(Mutex::new(conn)));

        assert_eq!(repo.create_next(Some(a.school_id), "DW", None).unwrap().id_number, 1);
        assert_eq!(repo.create_next(Some(a.school_id), "DW", None).unwrap().id_number, 2);
        assert_eq!(repo.create_next(Some(b.school_id), "DW", None).unwrap().id_number, 1);

        assert_eq!(repo.last_id_number(Some(a.school_id), "DW").unwrap(), 2);
        assert_eq!(repo.last_id_number(None, "MO").unwrap(), 0);
        assert_eq!(repo.last_id_number(Some(a.school_id), "MO").unwrap(), 0);
    }

    #[test]
    fn test_global_create_next_continues_after_every_school() {
        let conn = open_in_memory().unwrap();
        let a = SchoolRepository::insert_tx(&conn, "A", None).unwrap();
        let b = SchoolRepository::insert_tx(&conn, "B", None).unwrap();
        UidRepository::insert_tx(&conn, Some(a.school_id), "TV", 8, None).unwrap();
        UidRepository::insert_tx(&conn, Some(b.school_id), "TV", 2, None).unwrap();
        let repo = UidRepository::from_connection(Arc::new(Mutex::new(conn)));

        assert_eq!(repo.last_id_number(None, "TV").unwrap(), 8);
        let global = repo.create_next(None, "TV", Some("2021")).unwrap();
        assert_eq!(global.id_number, 9);
        assert_eq!(global.school_id, None);
        assert_eq!(repo.last_id_number(None, "TV").unwrap(), 9);
        // 学校作用域不受全局记录影响
        assert_eq!(repo.last_id_number(Some(b.school_id), "TV").unwrap(), 2);
        assert_eq!(repo.last_id_number(Some(a.school_id), "MO").unwrap(), 0);
    }

    #[test]
    fn test_find_by_scope() {
        let conn = open_in_memory().unwrap();
        let a = SchoolRepository::insert_tx(&conn, "A", None).unwrap();
        UidRepository::insert_tx(&conn, Some(a.school_id), "PR", 4, None).unwrap();
        let repo = UidRepository::from_connection(Arc::new(Mutex::new(conn)));

        assert!(repo.find(Some(a.school_id), "PR", 4).unwrap().is_some());
        assert!(repo.find(None, "PR", 4).unwrap().is_some());
        assert!(repo.find(None, "PR", 5).unwrap().is_none());
        assert!(repo.find(Some(a.school_id), "PR", 5).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_triple_violates_unique_index() {
        let conn = open_in_memory().unwrap();
        UidRepository::insert_tx(&conn, None, "TB", 1, None).unwrap();
        let err = UidRepository::insert_tx(&conn, None, "TB", 1, None).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_global_uid_cannot_reuse_school_number() {
        let conn = open_in_memory().unwrap();
        let a = SchoolRepository::insert_tx(&conn, "A", None).unwrap();
        UidRepository::insert_tx(&conn, Some(a.school_id), "TV", 1, None).unwrap();

        let err = UidRepository::insert_tx(&conn, None, "TV", 1, None).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
        // 其他学校仍可使用同一序号
        let b = SchoolRepository::insert_tx(&conn, "B", None).unwrap();
        assert!(UidRepository::insert_tx(&conn, Some(b.school_id), "TV", 1, None).is_ok());
    }
}
