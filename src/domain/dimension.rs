// ==========================================
// 学校设备台账 - 维度实体
// ==========================================
// 职责: 学校 / 负责人 / 教室 / 管理编号台账
// 说明: 维度实体被多个设备共享引用,按自然键查找或创建
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// School - 学校
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub school_id: i64,
    pub school_name: String,
    pub ip: Option<i64>, // 学校网段编号
}

// ==========================================
// Operator - 设备负责人
// ==========================================
// 自然键: (name, position, school_id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub operator_id: i64,
    pub name: String,
    pub position: String,
    pub school_id: Option<i64>,
}

// ==========================================
// Classroom - 教室
// ==========================================
// 自然键: room_name（全局,不按学校区分,见 DESIGN.md 待定问题）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classroom {
    pub classroom_id: i64,
    pub room_name: String,
    pub school_id: Option<i64>,
    pub layout: ClassroomLayout,
}

/// 教室在平面图上的矩形位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassroomLayout {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for ClassroomLayout {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 100,
            height: 100,
        }
    }
}

// ==========================================
// ManageNumber - 管理编号台账
// ==========================================
// 自然键: (school_id, cate, year, num),year 为空视为独立分桶
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManageNumber {
    pub manage_id: i64,
    pub school_id: i64,
    pub cate: String,
    pub year: Option<i32>,
    pub num: i64,
}

impl ManageNumber {
    /// 组合显示用管理编号: `cate[-year]-num`
    pub fn display(&self) -> String {
        compose_manage_no(Some(&self.cate), self.year, Some(self.num))
    }
}

/// 组合管理编号字符串
///
/// # 规则
/// - 按 `cate-year-num` 拼接,缺失的年份不产生连续连字符
/// - 末尾悬空的连字符被去掉（编号缺失时）
pub fn compose_manage_no(cate: Option<&str>, year: Option<i32>, num: Option<i64>) -> String {
    let mut composed = String::new();
    if let Some(c) = cate {
        composed.push_str(c.trim());
        composed.push('-');
    }
    if let Some(y) = year {
        composed.push_str(&y.to_string());
        composed.push('-');
    }
    if let Some(n) = num {
        composed.push_str(&n.to_string());
    }
    composed.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_manage_no_with_year() {
        assert_eq!(compose_manage_no(Some("DW"), Some(2023), Some(7)), "DW-2023-7");
    }

    #[test]
    fn test_compose_manage_no_without_year() {
        assert_eq!(compose_manage_no(Some("DW"), None, Some(7)), "DW-7");
    }

    #[test]
    fn test_compose_manage_no_strips_dangling_hyphen() {
        assert_eq!(compose_manage_no(Some("DW"), Some(2023), None), "DW-2023");
        assert_eq!(compose_manage_no(Some("DW"), None, None), "DW");
        assert_eq!(compose_manage_no(None, None, None), "");
    }

    #[test]
    fn test_default_layout() {
        let layout = ClassroomLayout::default();
        assert_eq!((layout.x, layout.y, layout.width, layout.height), (0, 0, 100, 100));
    }
}
