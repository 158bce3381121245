// ==========================================
// 学校设备台账 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 按学校批量导入设备台账,对账维度数据,分配唯一编号,导出报表
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 表格行对账与发号
pub mod importer;

// 导出层 - 分组与报表
pub mod exporter;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CategoryCode, DeviceType, ManageCategory};

// 领域实体
pub use domain::{
    Classroom, ClassroomLayout, Device, DeviceFilter, DeviceView, ImportOutcome, ManageNumber,
    NewDevice, Operator, RawDeviceRow, RowError, School, Uid,
};

// 导入
pub use importer::{DeviceImporter, DeviceImporterImpl, ImportError, ImportResult};

// 导出
pub use exporter::{export_school_report, group_by_classroom, sort_for_export, write_device_report};

// 配置
pub use config::{ConfigManager, ImportConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "学校设备台账";
