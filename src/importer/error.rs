// ==========================================
// 学校设备台账 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 行级错误 =====
    #[error("管理编号格式错误 (行 {row}): {value}，期望 分类[-年度]-序号")]
    ManageNoFormatError { row: usize, value: String },

    /// 严格模式下首个行级错误中止整批
    #[error("第 {row} 行导入失败，整批已回滚: {reason}")]
    RowRejected { row: usize, reason: String },

    // ===== 引用错误 =====
    #[error("学校不存在: school_id={0}")]
    SchoolNotFound(i64),

    // ===== 数据库错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 行级错误对应的行号（非行级错误返回 None）
    pub fn row_number(&self) -> Option<usize> {
        match self {
            ImportError::ManageNoFormatError { row, .. }
            | ImportError::RowRejected { row, .. } => Some(*row),
            _ => None,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>（先经仓储层分类约束错误）
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Repository(RepositoryError::from(err))
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_number_only_for_row_errors() {
        let err = ImportError::ManageNoFormatError {
            row: 4,
            value: "DW".to_string(),
        };
        assert_eq!(err.row_number(), Some(4));
        assert_eq!(ImportError::SchoolNotFound(9).row_number(), None);
    }

    #[test]
    fn test_unique_violation_classified_through_repository() {
        let sqlite_err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            Some("UNIQUE constraint failed: uid.cate".to_string()),
        );
        let err = ImportError::from(sqlite_err);
        assert!(matches!(
            err,
            ImportError::Repository(RepositoryError::UniqueConstraintViolation(_))
        ));
    }
}
