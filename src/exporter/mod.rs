// ==========================================
// 学校设备台账 - 导出层
// ==========================================
// 职责: 设备分组展示 / 平铺报表导出
// ==========================================

pub mod grouper;
pub mod report;

pub use grouper::{
    compare_for_export, group_by_classroom, group_key, sort_for_export, DeviceGroups,
    OTHER_GROUP, SELECTED_ROOM, UNASSIGNED_OPERATOR, UNASSIGNED_ROOM,
};
pub use report::{export_school_report, write_device_report, ExportError, ExportResult};
