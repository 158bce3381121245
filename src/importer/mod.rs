// ==========================================
// 学校设备台账 - 导入层
// ==========================================
// 职责: 表格行 → 对账后的设备记录
// 支持: Excel (.xlsx), CSV
// ==========================================

// 模块声明
pub mod category_deriver;
pub mod device_importer_impl;
pub mod device_importer_trait;
pub mod dimension_resolver;
pub mod error;
pub mod file_parser;
pub mod row_normalizer;
pub mod sequence_allocator;

// 重导出核心类型
pub use category_deriver::{derive_category, CategoryCodeDeriver};
pub use device_importer_impl::DeviceImporterImpl;
pub use dimension_resolver::DimensionResolver;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use row_normalizer::{parse_manage_no, parse_purchase_date, DeviceRowNormalizer};
pub use sequence_allocator::{SequenceAllocator, UidRequest};

// 重导出 Trait 接口
pub use device_importer_trait::{CategoryDeriver, DeviceImporter, FileParser, RowNormalizer};
