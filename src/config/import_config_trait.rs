// ==========================================
// 学校设备台账 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::dimension::ClassroomLayout;
use crate::repository::RepositoryResult;
use async_trait::async_trait;

/// 一次导入所使用的配置快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSettings {
    pub strict_mode: bool,
    pub header_rows: usize,
    pub default_layout: ClassroomLayout,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            strict_mode: true,
            header_rows: 1,
            default_layout: ClassroomLayout::default(),
        }
    }
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 是否严格模式
    ///
    /// # 返回
    /// - true: 首个行级错误即中止整批（事务回滚）
    /// - false: 逐行隔离,错误行记入错误列表,其余行照常导入
    ///
    /// # 默认值
    /// - true
    async fn is_strict_mode(&self) -> RepositoryResult<bool>;

    /// 表头行数（解析器跳过的前导行数）
    ///
    /// # 默认值
    /// - 1
    async fn get_header_rows(&self) -> RepositoryResult<usize>;

    /// 新建教室的默认平面图位置
    ///
    /// # 默认值
    /// - x=0, y=0, width=100, height=100
    async fn get_default_classroom_layout(&self) -> RepositoryResult<ClassroomLayout>;

    /// 一次性读取导入所需全部配置
    async fn load_import_settings(&self) -> RepositoryResult<ImportSettings> {
        Ok(ImportSettings {
            strict_mode: self.is_strict_mode().await?,
            header_rows: self.get_header_rows().await?,
            default_layout: self.get_default_classroom_layout().await?,
        })
    }
}
