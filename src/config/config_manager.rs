// ==========================================
// 学校设备台账 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::dimension::ClassroomLayout;
use crate::repository::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取整数配置,解析失败时回退到默认值并告警
    fn get_i32_or_default(&self, key: &str, default: i32) -> RepositoryResult<i32> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        match raw.trim().parse::<i32>() {
            Ok(v) => Ok(v),
            Err(_) => {
                warn!(config_key = key, value = %raw, default, "配置值无法解析为整数，使用默认值");
                Ok(default)
            }
        }
    }

    /// 获取所有 global 配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 导入批次日志中记录当时生效的配置
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key ASC",
        )?;
        let mut snapshot = Map::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, Value::String(value));
        }
        serde_json::to_string(&Value::Object(snapshot))
            .map_err(|e| RepositoryError::Other(anyhow::Error::new(e)))
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn is_strict_mode(&self) -> RepositoryResult<bool> {
        let value = self.get_config_or_default(config_keys::IMPORT_STRICT_MODE, "true")?;
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "y" | "yes" => Ok(true),
            "false" | "0" | "n" | "no" => Ok(false),
            other => {
                warn!(config_key = config_keys::IMPORT_STRICT_MODE, value = %other, "无法识别的开关值，按严格模式处理");
                Ok(true)
            }
        }
    }

    async fn get_header_rows(&self) -> RepositoryResult<usize> {
        let rows = self.get_i32_or_default(config_keys::IMPORT_HEADER_ROWS, 1)?;
        Ok(rows.max(0) as usize)
    }

    async fn get_default_classroom_layout(&self) -> RepositoryResult<ClassroomLayout> {
        let fallback = ClassroomLayout::default();
        Ok(ClassroomLayout {
            x: self.get_i32_or_default(config_keys::CLASSROOM_DEFAULT_X, fallback.x)?,
            y: self.get_i32_or_default(config_keys::CLASSROOM_DEFAULT_Y, fallback.y)?,
            width: self.get_i32_or_default(config_keys::CLASSROOM_DEFAULT_WIDTH, fallback.width)?,
            height: self.get_i32_or_default(config_keys::CLASSROOM_DEFAULT_HEIGHT, fallback.height)?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导入策略
    pub const IMPORT_STRICT_MODE: &str = "import_strict_mode";
    pub const IMPORT_HEADER_ROWS: &str = "import_header_rows";

    // 新建教室默认位置
    pub const CLASSROOM_DEFAULT_X: &str = "classroom_default_x";
    pub const CLASSROOM_DEFAULT_Y: &str = "classroom_default_y";
    pub const CLASSROOM_DEFAULT_WIDTH: &str = "classroom_default_width";
    pub const CLASSROOM_DEFAULT_HEIGHT: &str = "classroom_default_height";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn manager() -> ConfigManager {
        ConfigManager::from_connection(Arc::new(Mutex::new(open_in_memory().unwrap()))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_table_empty() {
        let config = manager();
        let settings = config.load_import_settings().await.unwrap();
        assert!(settings.strict_mode);
        assert_eq!(settings.header_rows, 1);
        assert_eq!(settings.default_layout, ClassroomLayout::default());
    }

    #[tokio::test]
    async fn test_overrides_and_fallbacks() {
        let config = manager();
        config.set_global_value(config_keys::IMPORT_STRICT_MODE, "false").unwrap();
        config.set_global_value(config_keys::IMPORT_HEADER_ROWS, "2").unwrap();
        config.set_global_value(config_keys::CLASSROOM_DEFAULT_WIDTH, "abc").unwrap();
        config.set_global_value(config_keys::CLASSROOM_DEFAULT_HEIGHT, "60").unwrap();

        assert!(!config.is_strict_mode().await.unwrap());
        assert_eq!(config.get_header_rows().await.unwrap(), 2);
        let layout = config.get_default_classroom_layout().await.unwrap();
        assert_eq!(layout.width, 100);
        assert_eq!(layout.height, 60);
    }

    #[test]
    fn test_snapshot_contains_values() {
        let config = manager();
        config.set_global_value(config_keys::IMPORT_STRICT_MODE, "true").unwrap();
        config.set_global_value(config_keys::IMPORT_STRICT_MODE, "false").unwrap();
        let snapshot = config.get_config_snapshot().unwrap();
        let value: Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(value[config_keys::IMPORT_STRICT_MODE], "false");
    }
}
