// ==========================================
// 学校设备台账 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: `*_tx(conn, ..)` 为连接级操作,可在调用方事务内组合使用
// ==========================================

pub mod classroom_repo;
pub mod device_repo;
pub mod error;
pub mod import_batch_repo;
pub mod manage_repo;
pub mod operator_repo;
pub mod school_repo;
pub mod uid_repo;

// 重导出核心仓储
pub use classroom_repo::ClassroomRepository;
pub use device_repo::DeviceRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use import_batch_repo::ImportBatchRepository;
pub use manage_repo::ManageRepository;
pub use operator_repo::OperatorRepository;
pub use school_repo::SchoolRepository;
pub use uid_repo::UidRepository;
