// ==========================================
// 学校设备台账 - 设备领域模型
// ==========================================
// 职责: 原始行 / 标准化输入 / 持久化设备 / 导出读模型
// 流向: RawDeviceRow → NormalizedDeviceInput → NewDevice → device 表 → DeviceView
// ==========================================

use crate::domain::dimension::compose_manage_no;
use crate::domain::uid::compose_uid;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// 表格列位置（按约定固定,不依赖表头文字）
// ==========================================
pub mod columns {
    pub const UID_HINT: usize = 0;
    pub const MANAGE_NO: usize = 1;
    pub const TYPE: usize = 2;
    pub const OPERATOR_POSITION: usize = 3;
    pub const OPERATOR_NAME: usize = 4;
    pub const MANUFACTURER: usize = 5;
    pub const MODEL: usize = 6;
    pub const PURCHASE_DATE: usize = 7;
    pub const IP_ADDRESS: usize = 8;
    pub const ROOM_NAME: usize = 9;
    pub const PURPOSE: usize = 10;
    pub const SET_TYPE: usize = 11;
    pub const NOTE: usize = 12;

    /// 列总数
    pub const COUNT: usize = 13;

    /// 导出报表表头（与导入列位置一一对应）
    pub const HEADERS: [&str; COUNT] = [
        "고유번호",
        "관리번호",
        "유형",
        "직위",
        "취급자",
        "제조사",
        "모델명",
        "도입일자",
        "IP주소",
        "설치장소",
        "용도",
        "세트분류",
        "비고",
    ];
}

// ==========================================
// RawDeviceRow - 原始表格行
// ==========================================
// 临时对象,标准化后即丢弃
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDeviceRow {
    pub row_number: usize, // 表格中的行号（含表头,从 1 开始）
    pub cells: Vec<Option<String>>,
}

impl RawDeviceRow {
    /// 构造原始行,不足 13 列时补空
    pub fn new(row_number: usize, mut cells: Vec<Option<String>>) -> Self {
        if cells.len() < columns::COUNT {
            cells.resize(columns::COUNT, None);
        }
        Self { row_number, cells }
    }

    /// 从字符串单元格构造（空串视为缺失）
    pub fn from_strings<S: AsRef<str>>(row_number: usize, values: &[S]) -> Self {
        let cells = values
            .iter()
            .map(|v| {
                let trimmed = v.as_ref().trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect();
        Self::new(row_number, cells)
    }

    /// 读取指定列（越界视为缺失）
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }
}

// ==========================================
// ParsedManageNo - 管理编号解析结果
// ==========================================
// 格式: CATEGORY[-YEAR]-NUMBER
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedManageNo {
    pub cate: String,
    pub year: Option<i32>,
    pub num: i64,
}

// ==========================================
// NormalizedDeviceInput - 标准化后的行
// ==========================================
// 由 RowNormalizer 逐行生成,由导入管道消费一次,不直接持久化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedDeviceInput {
    pub row_number: usize,
    pub device_type: String, // 必填,非空
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub ip_address: Option<String>,
    pub purpose: Option<String>,
    pub set_type: Option<String>,
    pub note: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub room_name: Option<String>,
    pub operator_name: Option<String>,
    pub operator_position: Option<String>,
    pub manage_no: Option<ParsedManageNo>,
    pub uid_hint: Option<String>, // 显式分类代码,存在时覆盖推导结果
}

// ==========================================
// NewDevice - 待写入的设备
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDevice {
    pub school_id: i64,
    pub device_type: String,
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub ip_address: Option<String>,
    pub purpose: Option<String>,
    pub set_type: Option<String>,
    pub note: Option<String>,
    pub unused: bool,
    pub classroom_id: Option<i64>,
    pub operator_id: Option<i64>,
    pub manage_id: Option<i64>,
    pub uid_id: Option<i64>,
}

// ==========================================
// Device - 持久化设备
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: i64,
    pub school_id: i64,
    pub device_type: String,
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub ip_address: Option<String>,
    pub purpose: Option<String>,
    pub set_type: Option<String>,
    pub note: Option<String>,
    pub unused: bool,
    pub classroom_id: Option<i64>,
    pub operator_id: Option<i64>,
    pub manage_id: Option<i64>,
    pub uid_id: Option<i64>,
}

// ==========================================
// DeviceView - 导出/展示读模型
// ==========================================
// 设备 + 教室/负责人/唯一编号/管理编号 的联表结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceView {
    pub device: Device,
    pub room_name: Option<String>,
    pub operator_name: Option<String>,
    pub operator_position: Option<String>,
    pub uid_cate: Option<String>,
    pub uid_number: Option<i64>,
    pub manage_cate: Option<String>,
    pub manage_year: Option<i32>,
    pub manage_num: Option<i64>,
}

impl DeviceView {
    /// 组合唯一编号（分类代码 + 序号）
    pub fn uid_display(&self) -> Option<String> {
        match (&self.uid_cate, self.uid_number) {
            (Some(cate), Some(num)) => Some(compose_uid(cate, num)),
            _ => None,
        }
    }

    /// 组合管理编号（`cate[-year]-num`）
    pub fn manage_display(&self) -> Option<String> {
        self.manage_cate.as_ref()?;
        let composed = compose_manage_no(
            self.manage_cate.as_deref(),
            self.manage_year,
            self.manage_num,
        );
        if composed.is_empty() {
            None
        } else {
            Some(composed)
        }
    }
}

// ==========================================
// DeviceFilter - 查询条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub school_id: Option<i64>,
    pub device_type: Option<String>,
    pub room_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_row_pads_short_rows() {
        let row = RawDeviceRow::from_strings(2, &["", "DW-1", "Desktop"]);
        assert_eq!(row.cells.len(), columns::COUNT);
        assert_eq!(row.cell(columns::UID_HINT), None);
        assert_eq!(row.cell(columns::TYPE), Some("Desktop"));
        assert_eq!(row.cell(columns::NOTE), None);
    }

    #[test]
    fn test_raw_row_cell_out_of_range() {
        let row = RawDeviceRow::from_strings(2, &["a"]);
        assert_eq!(row.cell(99), None);
    }
}
