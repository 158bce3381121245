// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、学校种子数据、原始行构造、导入器组装
// ==========================================
#![allow(dead_code)]

use rusqlite::Connection;
use school_inventory::config::ConfigManager;
use school_inventory::db::{init_schema, open_sqlite_connection};
use school_inventory::domain::RawDeviceRow;
use school_inventory::importer::DeviceImporterImpl;
use school_inventory::repository::SchoolRepository;
use std::error::Error;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接（导入器 / 仓储 / 配置共用）
pub fn open_shared(db_path: &str) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(open_sqlite_connection(db_path).unwrap()))
}

/// 写入一个学校并返回 school_id
pub fn seed_school(conn: &Arc<Mutex<Connection>>, name: &str) -> i64 {
    SchoolRepository::from_connection(conn.clone())
        .create(name, None)
        .unwrap()
        .school_id
}

pub fn create_test_importer(conn: &Arc<Mutex<Connection>>) -> DeviceImporterImpl<ConfigManager> {
    let config = ConfigManager::from_connection(conn.clone()).unwrap();
    DeviceImporterImpl::with_defaults(conn.clone(), config)
}

/// 按 13 列位置构造原始行（不足补空）
pub fn device_row(row_number: usize, values: &[&str]) -> RawDeviceRow {
    RawDeviceRow::from_strings(row_number, values)
}

pub fn count_rows(conn: &Arc<Mutex<Connection>>, table: &str) -> i64 {
    let guard = conn.lock().unwrap();
    guard
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

/// 写出临时 CSV 文件（带 .csv 后缀）
pub fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    for line in lines {
        writeln!(temp_file, "{}", line).unwrap();
    }
    temp_file.flush().unwrap();
    temp_file
}

pub const HEADER_LINE: &str =
    "고유번호,관리번호,유형,직위,취급자,제조사,모델명,도입일자,IP주소,설치장소,용도,세트분류,비고";
