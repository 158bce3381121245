// ==========================================
// 学校设备台账 - 设备导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// ==========================================

use crate::domain::device::{NormalizedDeviceInput, RawDeviceRow};
use crate::domain::import::ImportOutcome;
use crate::domain::types::CategoryCode;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// DeviceImporter Trait
// ==========================================
// 用途: 设备导入主接口
// 实现者: DeviceImporterImpl
#[async_trait]
pub trait DeviceImporter: Send + Sync {
    /// 导入一批已解析的行
    ///
    /// # 参数
    /// - rows: 位置固定的 13 列原始行（表头已剥离）
    /// - school_id: 目标学校
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 导入数量 / 跳过数量 / 行级错误列表
    /// - Err(SchoolNotFound): 学校不存在
    /// - Err(RowRejected): 严格模式下的首个行级错误（整批回滚）
    /// - Err(Repository): 持久化失败（整批回滚）
    ///
    /// # 导入流程
    /// 1. 行标准化（空行跳过）
    /// 2. 维度查找或创建（负责人 / 教室 / 管理编号）
    /// 3. 分类代码推导（uid_hint 优先）
    /// 4. 过滤分类为空的设备
    /// 5. 整批发号（SequenceAllocator）
    /// 6. 一次性写入设备 + 批次日志
    async fn import_rows(
        &self,
        rows: Vec<RawDeviceRow>,
        school_id: i64,
    ) -> ImportResult<ImportOutcome>;

    /// 从文件导入（.xlsx / .csv）
    async fn import_from_file(&self, file_path: &Path, school_id: i64)
        -> ImportResult<ImportOutcome>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件 → 位置固定的单元格网格
// 实现者: ExcelParser, CsvParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - header_rows: 跳过的表头行数
    ///
    /// # 返回
    /// - Ok(Vec<RawDeviceRow>): 每行恰好 13 个单元格,行号为表格中的 1 基行号
    /// - Err: 文件读取错误、格式错误
    fn parse_rows(&self, file_path: &Path, header_rows: usize) -> ImportResult<Vec<RawDeviceRow>>;
}

// ==========================================
// RowNormalizer Trait
// ==========================================
// 实现者: DeviceRowNormalizer
pub trait RowNormalizer: Send + Sync {
    /// 标准化一行
    ///
    /// # 返回
    /// - Ok(Some(input)): 有效行
    /// - Ok(None): 结构上为空的行（跳过,不计错误）
    /// - Err: 行级错误（管理编号格式错误等）
    fn normalize(&self, row: &RawDeviceRow) -> ImportResult<Option<NormalizedDeviceInput>>;
}

// ==========================================
// CategoryDeriver Trait
// ==========================================
// 实现者: CategoryCodeDeriver
pub trait CategoryDeriver: Send + Sync {
    /// 由设备类型与管理分类推导分类代码（全函数,总有返回值）
    fn derive_category(&self, device_type: &str, manage_category: Option<&str>) -> CategoryCode;

    /// 计算一行最终使用的唯一编号分类
    ///
    /// uid_hint 存在时原样使用,否则走推导
    fn resolve_uid_category(&self, input: &NormalizedDeviceInput) -> String;
}
