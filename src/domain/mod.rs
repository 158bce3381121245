// ==========================================
// 学校设备台账 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、组合显示规则
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod device;
pub mod dimension;
pub mod import;
pub mod types;
pub mod uid;

// 重导出核心类型
pub use device::{
    Device, DeviceFilter, DeviceView, NewDevice, NormalizedDeviceInput, ParsedManageNo,
    RawDeviceRow,
};
pub use dimension::{compose_manage_no, Classroom, ClassroomLayout, ManageNumber, Operator, School};
pub use import::{ImportBatch, ImportOutcome, RowError};
pub use types::{CategoryCode, DeviceType, ManageCategory};
pub use uid::{compose_uid, Uid};
