// ==========================================
// 学校设备台账 - 导出分组与排序
// ==========================================
// 职责:
// (a) 两级分组: 教室 → 分组键 → 设备列表
//     分组键: "SET:"+set_type / "OP:"+负责人 / "OTHER"
// (b) 平铺导出的全序: 教室 → 有无 set_type 及其值 → 负责人 → device_id
// ==========================================

use crate::domain::device::DeviceView;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// 未分配教室
pub const UNASSIGNED_ROOM: &str = "미지정";
/// 上游已选定教室但筛选结果为空
pub const SELECTED_ROOM: &str = "선택된 교실";
/// 未分配负责人
pub const UNASSIGNED_OPERATOR: &str = "미지정";
pub const OTHER_GROUP: &str = "OTHER";

/// 教室名 → 分组键 → 设备
pub type DeviceGroups = BTreeMap<String, BTreeMap<String, Vec<DeviceView>>>;

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn room_key(view: &DeviceView) -> &str {
    non_blank(view.room_name.as_deref()).unwrap_or(UNASSIGNED_ROOM)
}

fn operator_key(view: &DeviceView) -> &str {
    non_blank(view.operator_name.as_deref()).unwrap_or(UNASSIGNED_OPERATOR)
}

/// 二级分组键
pub fn group_key(view: &DeviceView) -> String {
    if let Some(set_type) = non_blank(view.device.set_type.as_deref()) {
        return format!("SET:{}", set_type);
    }
    if let Some(operator) = non_blank(view.operator_name.as_deref()) {
        return format!("OP:{}", operator);
    }
    OTHER_GROUP.to_string()
}

/// 按教室两级分组
///
/// `classroom_selected` 为 true 时上游已按单个教室筛选,
/// 结果收敛为一个顶层条目（筛选结果为空时使用 SELECTED_ROOM）
pub fn group_by_classroom(mut devices: Vec<DeviceView>, classroom_selected: bool) -> DeviceGroups {
    sort_for_export(&mut devices);

    let mut groups = DeviceGroups::new();
    if classroom_selected {
        let top = devices
            .first()
            .map(|v| room_key(v).to_string())
            .unwrap_or_else(|| SELECTED_ROOM.to_string());
        let entry = groups.entry(top).or_default();
        for view in devices {
            entry.entry(group_key(&view)).or_default().push(view);
        }
        return groups;
    }

    for view in devices {
        groups
            .entry(room_key(&view).to_string())
            .or_default()
            .entry(group_key(&view))
            .or_default()
            .push(view);
    }
    groups
}

/// 平铺导出比较函数（严格全序）
pub fn compare_for_export(a: &DeviceView, b: &DeviceView) -> Ordering {
    room_key(a)
        .cmp(room_key(b))
        .then_with(|| {
            let sa = non_blank(a.device.set_type.as_deref());
            let sb = non_blank(b.device.set_type.as_deref());
            match (sa, sb) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
        .then_with(|| operator_key(a).cmp(operator_key(b)))
        .then_with(|| a.device.device_id.cmp(&b.device.device_id))
}

pub fn sort_for_export(devices: &mut [DeviceView]) {
    devices.sort_by(compare_for_export);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::Device;

    fn view(id: i64, room: Option<&str>, set_type: Option<&str>, operator: Option<&str>) -> DeviceView {
        DeviceView {
            device: Device {
                device_id: id,
                school_id: 1,
                device_type: "Desktop".to_string(),
                manufacturer: None,
                model_name: None,
                purchase_date: None,
                ip_address: None,
                purpose: None,
                set_type: set_type.map(str::to_string),
                note: None,
                unused: false,
                classroom_id: None,
                operator_id: None,
                manage_id: None,
                uid_id: None,
            },
            room_name: room.map(str::to_string),
            operator_name: operator.map(str::to_string),
            operator_position: None,
            uid_cate: None,
            uid_number: None,
            manage_cate: None,
            manage_year: None,
            manage_num: None,
        }
    }

    fn ids(devices: &[DeviceView]) -> Vec<i64> {
        devices.iter().map(|v| v.device.device_id).collect()
    }

    #[test]
    fn test_export_order_room_then_set_type() {
        let mut devices = vec![
            view(1, Some("B"), None, None),
            view(2, Some("A"), None, Some("김철수")),
            view(3, Some("A"), Some("Desk"), None),
        ];
        sort_for_export(&mut devices);
        assert_eq!(ids(&devices), vec![3, 2, 1]);
    }

    #[test]
    fn test_export_order_set_type_values_and_operator() {
        let mut devices = vec![
            view(1, Some("A"), Some("Z-set"), None),
            view(2, Some("A"), Some("A-set"), None),
            view(3, Some("A"), None, Some("이영희")),
            view(4, Some("A"), None, Some("김철수")),
            view(5, None, None, None),
        ];
        sort_for_export(&mut devices);
        assert_eq!(ids(&devices), vec![2, 1, 4, 3, 5]);
    }

    #[test]
    fn test_compare_is_total_on_ties() {
        let a = view(1, Some("A"), None, None);
        let b = view(2, Some("A"), None, None);
        assert_eq!(compare_for_export(&a, &b), Ordering::Less);
        assert_eq!(compare_for_export(&b, &a), Ordering::Greater);
        assert_eq!(compare_for_export(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_group_keys() {
        assert_eq!(group_key(&view(1, None, Some("Desk"), Some("김철수"))), "SET:Desk");
        assert_eq!(group_key(&view(1, None, Some(" "), Some("김철수"))), "OP:김철수");
        assert_eq!(group_key(&view(1, None, None, None)), OTHER_GROUP);
    }

    #[test]
    fn test_group_by_classroom_two_levels() {
        let devices = vec![
            view(1, Some("101호"), Some("Desk"), None),
            view(2, Some("101호"), Some("Desk"), None),
            view(3, Some("101호"), None, Some("김철수")),
            view(4, None, None, None),
        ];
        let groups = group_by_classroom(devices, false);

        assert_eq!(groups.len(), 2);
        let room = &groups["101호"];
        assert_eq!(ids(&room["SET:Desk"]), vec![1, 2]);
        assert_eq!(ids(&room["OP:김철수"]), vec![3]);
        assert_eq!(ids(&groups[UNASSIGNED_ROOM][OTHER_GROUP]), vec![4]);
    }

    #[test]
    fn test_group_by_selected_classroom() {
        let groups = group_by_classroom(vec![view(7, Some("과학실"), None, None)], true);
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["과학실"]);

        let empty = group_by_classroom(Vec::new(), true);
        assert_eq!(empty.len(), 1);
        assert!(empty[SELECTED_ROOM].is_empty());
    }
}
