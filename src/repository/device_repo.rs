// ==========================================
// 学校设备台账 - 设备仓储
// ==========================================
// 红线: Repository 不含业务逻辑,只做数据 CRUD
// 职责: device 表写入 + DeviceView 联表读模型
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::device::{Device, DeviceFilter, DeviceView, NewDevice};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, ToSql};
use std::sync::{Arc, Mutex};

const DEVICE_COLUMNS: &str = r#"
    d.device_id, d.school_id, d.type, d.manufacturer, d.model_name,
    d.purchase_date, d.ip_address, d.purpose, d.set_type, d.note, d.unused,
    d.classroom_id, d.operator_id, d.manage_id, d.uid_id
"#;

const VIEW_JOINS: &str = r#"
    FROM device d
    LEFT JOIN classroom c ON c.classroom_id = d.classroom_id
    LEFT JOIN operator o ON o.operator_id = d.operator_id
    LEFT JOIN uid u ON u.uid_id = d.uid_id
    LEFT JOIN manage m ON m.manage_id = d.manage_id
"#;

pub struct DeviceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DeviceRepository {
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

    /// 批量插入设备（事务化）
    pub fn batch_insert(&self, devices: &[NewDevice]) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let ids = Self::batch_insert_tx(&tx, devices)?;
        tx.commit()?;
        Ok(ids)
    }

    pub fn find_by_id(&self, device_id: i64) -> RepositoryResult<Option<Device>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM device d WHERE d.device_id = ?1", DEVICE_COLUMNS);
        let device = conn
            .query_row(&sql, params![device_id], |row| map_device(row, 0))
            .optional()?;
        Ok(device)
    }

    /// 按条件查询联表读模型（按 device_id 升序）
    pub fn find_views(&self, filter: &DeviceFilter) -> RepositoryResult<Vec<DeviceView>> {
        let conn = self.get_conn()?;
        Self::find_views_tx(&conn, filter, None)
    }

    /// 分页查询（page 从 0 开始）
    pub fn list_page(
        &self,
        filter: &DeviceFilter,
        page: usize,
        size: usize,
    ) -> RepositoryResult<Vec<DeviceView>> {
        if size == 0 {
            return Err(RepositoryError::FieldValueError {
                field: "size".to_string(),
                message: "分页大小必须大于 0".to_string(),
            });
        }
        let conn = self.get_conn()?;
        Self::find_views_tx(&conn, filter, Some((page, size)))
    }

    /// 满足条件的设备数
    pub fn count(&self, filter: &DeviceFilter) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let (where_sql, values) = build_where(filter);
        let sql = format!("SELECT COUNT(*) {} {}", VIEW_JOINS, where_sql);
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, params.as_slice(), |row| row.get(0))?;
        Ok(count as usize)
    }

    /// 已登记的设备类型（去重、排序）
    pub fn distinct_types(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT type FROM device ORDER BY type ASC")?;
        let types = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(types)
    }

    /// 设置/取消闲置标记
    pub fn set_unused(&self, device_id: i64, unused: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE device SET unused = ?2 WHERE device_id = ?1",
            params![device_id, unused as i32],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Device", device_id));
        }
        Ok(())
    }

    pub fn delete(&self, device_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM device WHERE device_id = ?1", params![device_id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Device", device_id));
        }
        Ok(())
    }

    // ===== 连接级操作 =====

    pub fn batch_insert_tx(conn: &Connection, devices: &[NewDevice]) -> RepositoryResult<Vec<i64>> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO device (
                school_id, type, manufacturer, model_name, purchase_date,
                ip_address, purpose, set_type, note, unused,
                classroom_id, operator_id, manage_id, uid_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )?;

        let mut ids = Vec::with_capacity(devices.len());
        for device in devices {
            stmt.execute(params![
                device.school_id,
                device.device_type,
                device.manufacturer,
                device.model_name,
                device.purchase_date.map(|d| d.format("%Y-%m-%d").to_string()),
                device.ip_address,
                device.purpose,
                device.set_type,
                device.note,
                device.unused as i32,
                device.classroom_id,
                device.operator_id,
                device.manage_id,
                device.uid_id,
            ])?;
            ids.push(conn.last_insert_rowid());
        }

        Ok(ids)
    }

    pub fn find_views_tx(
        conn: &Connection,
        filter: &DeviceFilter,
        paging: Option<(usize, usize)>,
    ) -> RepositoryResult<Vec<DeviceView>> {
        let (where_sql, values) = build_where(filter);
        let mut sql = format!(
            r#"
            SELECT {},
                c.room_name, o.name, o.position,
                u.cate, u.id_number,
                m.manage_cate, m.year, m.manage_num
            {} {}
            ORDER BY d.device_id ASC
            "#,
            DEVICE_COLUMNS, VIEW_JOINS, where_sql
        );
        if let Some((page, size)) = paging {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", size, page * size));
        }

        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let views = stmt
            .query_map(params.as_slice(), |row| {
                Ok(DeviceView {
                    device: map_device(row, 0)?,
                    room_name: row.get(15)?,
                    operator_name: row.get(16)?,
                    operator_position: row.get(17)?,
                    uid_cate: row.get(18)?,
                    uid_number: row.get(19)?,
                    manage_cate: row.get(20)?,
                    manage_year: row.get(21)?,
                    manage_num: row.get(22)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(views)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 构建 WHERE 子句（参数化）
fn build_where(filter: &DeviceFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(school_id) = filter.school_id {
        values.push(Box::new(school_id));
        clauses.push(format!("d.school_id = ?{}", values.len()));
    }
    if let Some(device_type) = filter.device_type.as_ref().filter(|t| !t.trim().is_empty()) {
        values.push(Box::new(device_type.trim().to_string()));
        clauses.push(format!("d.type = ?{}", values.len()));
    }
    if let Some(room_name) = filter.room_name.as_ref().filter(|r| !r.trim().is_empty()) {
        values.push(Box::new(room_name.trim().to_string()));
        clauses.push(format!("c.room_name = ?{}", values.len()));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), values)
    }
}

fn map_device(row: &rusqlite::Row<'_>, offset: usize) -> SqliteResult<Device> {
    Ok(Device {
        device_id: row.get(offset)?,
        school_id: row.get(offset + 1)?,
        device_type: row.get(offset + 2)?,
        manufacturer: row.get(offset + 3)?,
        model_name: row.get(offset + 4)?,
        purchase_date: row
            .get::<_, Option<String>>(offset + 5)?
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        ip_address: row.get(offset + 6)?,
        purpose: row.get(offset + 7)?,
        set_type: row.get(offset + 8)?,
        note: row.get(offset + 9)?,
        unused: row.get::<_, i32>(offset + 10)? != 0,
        classroom_id: row.get(offset + 11)?,
        operator_id: row.get(offset + 12)?,
        manage_id: row.get(offset + 13)?,
        uid_id: row.get(offset + 14)?,
    })
}
