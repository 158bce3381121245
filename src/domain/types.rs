// ==========================================
// 学校设备台账 - 领域类型定义
// ==========================================
// 职责: 设备类型 / 管理分类 / 分类代码 三个封闭枚举
// 红线: 分类体系为人工维护的固定表,新增设备类型必须新增枚举项
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 设备类型 (Device Type)
// ==========================================
// 源数据为表格中的自由文本,未识别的类型统一落到 Other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Desktop,
    Monitor,
    Printer,
    Tv,
    InteractiveBoard,
    ElectronicPodium,
    Did,
    Tablet,
    Projector,
    Other,
}

impl DeviceType {
    /// 从表格文本解析设备类型（英文名不区分大小写，同时接受常见韩文写法）
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim();
        let lower = value.to_ascii_lowercase();
        match lower.as_str() {
            "desktop" | "데스크톱" | "데스크탑" => DeviceType::Desktop,
            "monitor" | "모니터" => DeviceType::Monitor,
            "printer" | "프린터" => DeviceType::Printer,
            "tv" => DeviceType::Tv,
            "interactiveboard" | "전자칠판" => DeviceType::InteractiveBoard,
            "electronicpodium" | "전자교탁" => DeviceType::ElectronicPodium,
            "did" => DeviceType::Did,
            "tablet" | "태블릿" => DeviceType::Tablet,
            // 两种拼写都存在于历史台账中
            "projector" | "projecter" | "프로젝터" | "프로젝트" => DeviceType::Projector,
            _ => DeviceType::Other,
        }
    }
}

// ==========================================
// 管理分类 (Management Category)
// ==========================================
// 仅对台式机有意义,决定 DW/DE/DK/DC/DS/DD 细分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManageCategory {
    Business,
    Education,
    Other,
    ComputerEducation,
    SchoolPurchase,
    Donation,
}

impl ManageCategory {
    /// 解析管理分类；无法识别时返回 None（由调用方决定默认值）
    pub fn parse(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_ascii_lowercase();
        match lower.as_str() {
            "business" | "업무용" => Some(ManageCategory::Business),
            "education" | "교육용" => Some(ManageCategory::Education),
            "other" | "기타" => Some(ManageCategory::Other),
            "computereducation" | "전산교육용" => Some(ManageCategory::ComputerEducation),
            "schoolpurchase" | "학교구입" => Some(ManageCategory::SchoolPurchase),
            "donation" | "기증" => Some(ManageCategory::Donation),
            _ => None,
        }
    }
}

// ==========================================
// 分类代码 (Category Code)
// ==========================================
// 用于唯一编号 (Uid) 的分类前缀
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryCode {
    DW, // 台式机 - 业务用（台式机默认）
    DE, // 台式机 - 教育用
    DK, // 台式机 - 其他
    DC, // 台式机 - 电算教育
    DS, // 台式机 - 学校采购
    DD, // 台式机 - 捐赠
    MO, // 显示器
    PR, // 打印机
    TV, // 电视
    ID, // 电子白板
    ED, // 电子讲台
    DI, // DID
    TB, // 平板
    PJ, // 投影仪
    ET, // 其他（兜底）
}

impl CategoryCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryCode::DW => "DW",
            CategoryCode::DE => "DE",
            CategoryCode::DK => "DK",
            CategoryCode::DC => "DC",
            CategoryCode::DS => "DS",
            CategoryCode::DD => "DD",
            CategoryCode::MO => "MO",
            CategoryCode::PR => "PR",
            CategoryCode::TV => "TV",
            CategoryCode::ID => "ID",
            CategoryCode::ED => "ED",
            CategoryCode::DI => "DI",
            CategoryCode::TB => "TB",
            CategoryCode::PJ => "PJ",
            CategoryCode::ET => "ET",
        }
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
