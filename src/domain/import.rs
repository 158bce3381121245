// ==========================================
// 学校设备台账 - 导入批次模型
// ==========================================
// 职责: 导入结果汇总 / 行级错误 / 批次日志
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ==========================================
// RowError - 行级错误
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row_number: usize,
    pub reason: String,
}

// ==========================================
// ImportBatch - 批次日志（import_batch 表）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub school_id: i64,
    pub file_name: Option<String>,
    pub total_rows: i32,
    pub imported_rows: i32,
    pub skipped_rows: i32,
    pub error_rows: i32,
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: i64,
    pub errors_json: Option<String>,
}

// ==========================================
// ImportOutcome - 导入结果
// ==========================================
// 严格模式下 errors 恒为空（首个错误即中止）
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub batch_id: String,
    pub imported_count: usize,
    pub skipped_count: usize,
    pub errors: Vec<RowError>,
    pub device_ids: Vec<i64>,
    pub elapsed_time: Duration,
}
