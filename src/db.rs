// ==========================================
// 学校设备台账 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 / busy_timeout）
// - 提供幂等的建表入口,自然键由唯一索引兜底
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 默认数据库路径
///
/// 优先级: 环境变量 SCHOOL_INVENTORY_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("SCHOOL_INVENTORY_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./school_inventory.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("school-inventory");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("school_inventory.db");
        }
    }
    path.to_string_lossy().to_string()
}

/// 打开内存数据库并建表（测试与临时计算用）
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// 自然键唯一索引：
/// - operator(name, position, school_id)
/// - manage(school_id, cate, IFNULL(year, -1), num)：year 为空单独成桶
/// - uid(school_id, cate, id_number)：学校作用域
/// - uid 全局作用域（school 为空）：(cate, id_number) 不得与任何记录重复，由触发器拦截
/// - classroom(room_name)：全局键
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS school (
            school_id INTEGER PRIMARY KEY AUTOINCREMENT,
            school_name TEXT NOT NULL,
            ip INTEGER
        );

        CREATE TABLE IF NOT EXISTS classroom (
            classroom_id INTEGER PRIMARY KEY AUTOINCREMENT,
            room_name TEXT NOT NULL,
            school_id INTEGER REFERENCES school(school_id) ON DELETE SET NULL,
            x_coordinate INTEGER NOT NULL DEFAULT 0,
            y_coordinate INTEGER NOT NULL DEFAULT 0,
            width INTEGER NOT NULL DEFAULT 100,
            height INTEGER NOT NULL DEFAULT 100
        );
        CREATE UNIQUE INDEX IF NOT EXISTS ux_classroom_room_name ON classroom(room_name);

        CREATE TABLE IF NOT EXISTS operator (
            operator_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            position TEXT NOT NULL,
            school_id INTEGER REFERENCES school(school_id) ON DELETE CASCADE
        );
        CREATE UNIQUE INDEX IF NOT EXISTS ux_operator_natural_key
            ON operator(name, position, school_id);

        CREATE TABLE IF NOT EXISTS manage (
            manage_id INTEGER PRIMARY KEY AUTOINCREMENT,
            school_id INTEGER NOT NULL REFERENCES school(school_id) ON DELETE CASCADE,
            manage_cate TEXT NOT NULL,
            year INTEGER,
            manage_num INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS ux_manage_natural_key
            ON manage(school_id, manage_cate, IFNULL(year, -1), manage_num);

        CREATE TABLE IF NOT EXISTS uid (
            uid_id INTEGER PRIMARY KEY AUTOINCREMENT,
            cate TEXT NOT NULL,
            id_number INTEGER NOT NULL,
            mfg_year TEXT,
            school_id INTEGER REFERENCES school(school_id) ON DELETE CASCADE
        );
        DROP INDEX IF EXISTS ux_uid_scope;
        CREATE UNIQUE INDEX IF NOT EXISTS ux_uid_school_scope
            ON uid(school_id, cate, id_number) WHERE school_id IS NOT NULL;
        CREATE UNIQUE INDEX IF NOT EXISTS ux_uid_global_scope
            ON uid(cate, id_number) WHERE school_id IS NULL;
        CREATE TRIGGER IF NOT EXISTS tr_uid_global_scope
        BEFORE INSERT ON uid
        WHEN NEW.school_id IS NULL
            AND EXISTS (SELECT 1 FROM uid WHERE cate = NEW.cate AND id_number = NEW.id_number)
        BEGIN
            SELECT RAISE(ABORT, 'UNIQUE constraint failed: uid.cate, uid.id_number (global scope)');
        END;

        CREATE TABLE IF NOT EXISTS device (
            device_id INTEGER PRIMARY KEY AUTOINCREMENT,
            school_id INTEGER NOT NULL REFERENCES school(school_id) ON DELETE CASCADE,
            type TEXT NOT NULL,
            manufacturer TEXT,
            model_name TEXT,
            purchase_date TEXT,
            ip_address TEXT,
            purpose TEXT,
            set_type TEXT,
            unused INTEGER NOT NULL DEFAULT 0,
            note TEXT,
            classroom_id INTEGER REFERENCES classroom(classroom_id) ON DELETE SET NULL,
            operator_id INTEGER REFERENCES operator(operator_id) ON DELETE SET NULL,
            manage_id INTEGER REFERENCES manage(manage_id) ON DELETE SET NULL,
            uid_id INTEGER REFERENCES uid(uid_id) ON DELETE SET NULL
        );
        CREATE INDEX IF NOT EXISTS ix_device_school ON device(school_id);

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id TEXT PRIMARY KEY,
            school_id INTEGER NOT NULL,
            file_name TEXT,
            total_rows INTEGER NOT NULL,
            imported_rows INTEGER NOT NULL,
            skipped_rows INTEGER NOT NULL,
            error_rows INTEGER NOT NULL,
            imported_at TEXT NOT NULL,
            elapsed_ms INTEGER NOT NULL,
            errors_json TEXT
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
