// ==========================================
// 学校设备台账 - 唯一编号 (Uid)
// ==========================================
// 红线: 同一 (school, cate) 作用域内 id_number 唯一且单调递增,从 1 开始
// 说明: school 为空时作用域退化为全局 (cate)
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uid {
    pub uid_id: i64,
    pub cate: String,
    pub id_number: i64,
    pub school_id: Option<i64>,
    pub mfg_year: Option<String>, // 制造/购入年份
}

impl Uid {
    /// 组合显示用唯一编号: 分类代码 + 序号（无分隔符）
    pub fn display(&self) -> String {
        compose_uid(&self.cate, self.id_number)
    }
}

pub fn compose_uid(cate: &str, id_number: i64) -> String {
    format!("{}{}", cate, id_number)
}
