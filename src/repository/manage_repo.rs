// ==========================================
// 学校设备台账 - 管理编号台账仓储
// ==========================================
// 自然键: (school_id, manage_cate, year, manage_num)
// 说明: year 比较统一使用 `IS`,NULL 与任何整数都不相等,自成一桶
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::dimension::ManageNumber;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct ManageRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ManageRepository {
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

    /// 学校已使用的管理分类（去重、排序）
    pub fn distinct_categories(&self, school_id: i64) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT manage_cate FROM manage
            WHERE school_id = ?1
            ORDER BY manage_cate ASC
            "#,
        )?;
        let cates = stmt
            .query_map(params![school_id], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(cates)
    }

    /// 学校 + 分类下已使用的年份（去重、排序,不含 NULL）
    pub fn distinct_years(&self, school_id: i64, cate: &str) -> RepositoryResult<Vec<i32>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT year FROM manage
            WHERE school_id = ?1 AND manage_cate = ?2 AND year IS NOT NULL
            ORDER BY year ASC
            "#,
        )?;
        let years = stmt
            .query_map(params![school_id, cate], |row| row.get::<_, i32>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(years)
    }

    /// 下一个可用管理编号（当前最大值 + 1,空桶从 1 开始）
    pub fn next_manage_num(
        &self,
        school_id: i64,
        cate: &str,
        year: Option<i32>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let max: Option<i64> = conn.query_row(
            r#"
            SELECT MAX(manage_num) FROM manage
            WHERE school_id = ?1 AND manage_cate = ?2 AND year IS ?3
            "#,
            params![school_id, cate, year],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0) + 1)
    }

    pub fn list_by_school(&self, school_id: i64) -> RepositoryResult<Vec<ManageNumber>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT manage_id, school_id, manage_cate, year, manage_num
            FROM manage
            WHERE school_id = ?1
            ORDER BY manage_cate ASC, year ASC, manage_num ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![school_id], map_manage)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM manage", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ===== 连接级操作 =====

    pub fn find_by_key_tx(
        conn: &Connection,
        school_id: i64,
        cate: &str,
        year: Option<i32>,
        num: i64,
    ) -> RepositoryResult<Option<ManageNumber>> {
        let manage = conn
            .query_row(
                r#"
                SELECT manage_id, school_id, manage_cate, year, manage_num
                FROM manage
                WHERE school_id = ?1 AND manage_cate = ?2 AND year IS ?3 AND manage_num = ?4
                LIMIT 1
                "#,
                params![school_id, cate, year, num],
                map_manage,
            )
            .optional()?;
        Ok(manage)
    }

    pub fn insert_tx(
        conn: &Connection,
        school_id: i64,
        cate: &str,
        year: Option<i32>,
        num: i64,
    ) -> RepositoryResult<ManageNumber> {
        conn.execute(
            r#"
            INSERT INTO manage (school_id, manage_cate, year, manage_num)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![school_id, cate, year, num],
        )?;
        Ok(ManageNumber {
            manage_id: conn.last_insert_rowid(),
            school_id,
            cate: cate.to_string(),
            year,
            num,
        })
    }
}

fn map_manage(row: &rusqlite::Row<'_>) -> SqliteResult<ManageNumber> {
    Ok(ManageNumber {
        manage_id: row.get(0)?,
        school_id: row.get(1)?,
        cate: row.get(2)?,
        year: row.get(3)?,
        num: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::repository::school_repo::SchoolRepository;

    fn setup() -> (ManageRepository, i64) {
        let conn = open_in_memory().unwrap();
        let school = SchoolRepository::insert_tx(&conn, "A", None).unwrap();
        ManageRepository::insert_tx(&conn, school.school_id, "DW", Some(2023), 3).unwrap();
        ManageRepository::insert_tx(&conn, school.school_id, "DW", Some(2022), 9).unwrap();
        ManageRepository::insert_tx(&conn, school.school_id, "DW", None, 5).unwrap();
        ManageRepository::insert_tx(&conn, school.school_id, "DE", None, 1).unwrap();
        (
            ManageRepository::from_connection(Arc::new(Mutex::new(conn))),
            school.school_id,
        )
    }

    #[test]
    fn test_distinct_categories_and_years() {
        let (repo, school_id) = setup();
        assert_eq!(repo.distinct_categories(school_id).unwrap(), vec!["DE", "DW"]);
        assert_eq!(repo.distinct_years(school_id, "DW").unwrap(), vec![2022, 2023]);
        assert!(repo.distinct_years(school_id, "DE").unwrap().is_empty());
    }

    #[test]
    fn test_next_manage_num_buckets_by_year() {
        let (repo, school_id) = setup();
        assert_eq!(repo.next_manage_num(school_id, "DW", Some(2023)).unwrap(), 4);
        assert_eq!(repo.next_manage_num(school_id, "DW", None).unwrap(), 6);
        assert_eq!(repo.next_manage_num(school_id, "DW", Some(2030)).unwrap(), 1);
        assert_eq!(repo.next_manage_num(school_id, "PR", None).unwrap(), 1);
    }
}
