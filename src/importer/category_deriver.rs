// ==========================================
// 学校设备台账 - 分类代码推导
// ==========================================
// 职责: (设备类型, 管理分类) → 唯一编号分类代码
// 规则:
// - 台式机: 按管理分类细分 DW/DE/DK/DC/DS/DD,缺失或无法识别 → DW
// - 其他类型: 按设备类型查表,无法识别 → ET
// - uid_hint 存在时原样覆盖推导结果
// ==========================================

use crate::domain::device::NormalizedDeviceInput;
use crate::domain::types::{CategoryCode, DeviceType, ManageCategory};
use crate::importer::device_importer_trait::CategoryDeriver;

pub struct CategoryCodeDeriver;

impl CategoryDeriver for CategoryCodeDeriver {
    fn derive_category(&self, device_type: &str, manage_category: Option<&str>) -> CategoryCode {
        derive_category(
            DeviceType::parse(device_type),
            manage_category.and_then(ManageCategory::parse),
        )
    }

    fn resolve_uid_category(&self, input: &NormalizedDeviceInput) -> String {
        if let Some(hint) = &input.uid_hint {
            return hint.clone();
        }
        // 管理分类优先取管理编号中的分类,其次取用途列
        let manage_category = input
            .manage_no
            .as_ref()
            .map(|m| m.cate.as_str())
            .filter(|c| ManageCategory::parse(c).is_some())
            .or(input.purpose.as_deref());
        self.derive_category(&input.device_type, manage_category)
            .as_str()
            .to_string()
    }
}

/// 分类代码推导（纯函数）
pub fn derive_category(
    device_type: DeviceType,
    manage_category: Option<ManageCategory>,
) -> CategoryCode {
    match device_type {
        DeviceType::Desktop => match manage_category {
            Some(ManageCategory::Business) | None => CategoryCode::DW,
            Some(ManageCategory::Education) => CategoryCode::DE,
            Some(ManageCategory::Other) => CategoryCode::DK,
            Some(ManageCategory::ComputerEducation) => CategoryCode::DC,
            Some(ManageCategory::SchoolPurchase) => CategoryCode::DS,
            Some(ManageCategory::Donation) => CategoryCode::DD,
        },
        DeviceType::Monitor => CategoryCode::MO,
        DeviceType::Printer => CategoryCode::PR,
        DeviceType::Tv => CategoryCode::TV,
        DeviceType::InteractiveBoard => CategoryCode::ID,
        DeviceType::ElectronicPodium => CategoryCode::ED,
        DeviceType::Did => CategoryCode::DI,
        DeviceType::Tablet => CategoryCode::TB,
        DeviceType::Projector => CategoryCode::PJ,
        DeviceType::Other => CategoryCode::ET,
    }
}
