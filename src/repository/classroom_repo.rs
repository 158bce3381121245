// ==========================================
// 学校设备台账 - 教室仓储
// ==========================================
// 说明: room_name 为全局自然键（与历史行为一致,跨校同名教室会共用一行）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::dimension::{Classroom, ClassroomLayout};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str =
    "classroom_id, room_name, school_id, x_coordinate, y_coordinate, width, height";

pub struct ClassroomRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ClassroomRepository {
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

    /// 按教室名查询
    pub fn find_by_room_name(&self, room_name: &str) -> RepositoryResult<Option<Classroom>> {
        let conn = self.get_conn()?;
        Self::find_by_room_name_tx(&conn, room_name)
    }

    /// 查询学校的全部教室
    pub fn list_by_school(&self, school_id: i64) -> RepositoryResult<Vec<Classroom>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM classroom WHERE school_id = ?1 ORDER BY room_name ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rooms = stmt
            .query_map(params![school_id], map_classroom)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rooms)
    }

    /// 更新教室平面图位置
    ///
    /// # 返回
    /// - Ok(Classroom): 更新后的教室
    /// - Err(NotFound): 教室不存在
    pub fn update_layout(
        &self,
        room_name: &str,
        layout: ClassroomLayout,
    ) -> RepositoryResult<Classroom> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE classroom
            SET x_coordinate = ?2, y_coordinate = ?3, width = ?4, height = ?5
            WHERE room_name = ?1
            "#,
            params![room_name, layout.x, layout.y, layout.width, layout.height],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Classroom", room_name));
        }
        Self::find_by_room_name_tx(&conn, room_name)?
            .ok_or_else(|| RepositoryError::not_found("Classroom", room_name))
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM classroom", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ===== 连接级操作 =====

    pub fn find_by_room_name_tx(
        conn: &Connection,
        room_name: &str,
    ) -> RepositoryResult<Option<Classroom>> {
        let sql = format!(
            "SELECT {} FROM classroom WHERE room_name = ?1 LIMIT 1",
            SELECT_COLUMNS
        );
        let room = conn
            .query_row(&sql, params![room_name], map_classroom)
            .optional()?;
        Ok(room)
    }

    pub fn insert_tx(
        conn: &Connection,
        room_name: &str,
        school_id: i64,
        layout: ClassroomLayout,
    ) -> RepositoryResult<Classroom> {
        conn.execute(
            r#"
            INSERT INTO classroom (room_name, school_id, x_coordinate, y_coordinate, width, height)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![room_name, school_id, layout.x, layout.y, layout.width, layout.height],
        )?;
        Ok(Classroom {
            classroom_id: conn.last_insert_rowid(),
            room_name: room_name.to_string(),
            school_id: Some(school_id),
            layout,
        })
    }
}

fn map_classroom(row: &rusqlite::Row<'_>) -> SqliteResult<Classroom> {
    Ok(Classroom {
        classroom_id: row.get(0)?,
        room_name: row.get(1)?,
        school_id: row.get(2)?,
        layout: ClassroomLayout {
            x: row.get(3)?,
            y: row.get(4)?,
            width: row.get(5)?,
            height: row.get(6)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::repository::school_repo::SchoolRepository;

    #[test]
    fn test_update_layout() {
        let conn = open_in_memory().unwrap();
        let school = SchoolRepository::insert_tx(&conn, "A", None).unwrap();
        ClassroomRepository::insert_tx(&conn, "101", school.school_id, ClassroomLayout::default())
            .unwrap();

        let repo = ClassroomRepository::from_connection(Arc::new(Mutex::new(conn)));
        let layout = ClassroomLayout {
            x: 10,
            y: 20,
            width: 150,
            height: 80,
        };
        let updated = repo.update_layout("101", layout).unwrap();
        assert_eq!(updated.layout, layout);

        assert!(matches!(
            repo.update_layout("999", layout),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
