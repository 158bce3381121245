// ==========================================
// 导出集成测试
// ==========================================
// 测试目标: 导入后的设备按教室分组 / 平铺报表排序与组合编号
// ==========================================

mod test_helpers;

use school_inventory::domain::DeviceFilter;
use school_inventory::exporter::{
    export_school_report, group_by_classroom, ExportError, OTHER_GROUP, SELECTED_ROOM,
};
use school_inventory::importer::DeviceImporter;
use school_inventory::repository::DeviceRepository;
use test_helpers::*;

#[tokio::test]
async fn test_export_report_order_and_composite_numbers() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let school_id = seed_school(&conn, "가나초등학교");
    let importer = create_test_importer(&conn);

    let rows = vec![
        device_row(2, &["", "", "Monitor", "", "", "Samsung", "", "", "", "B"]),
        device_row(3, &["", "교육용-5", "Desktop", "교사", "김철수", "LG", "", "2023-5-1", "", "A"]),
        device_row(4, &["", "교육용-2023-6", "Desktop", "", "", "LG", "", "", "", "A", "", "Desk"]),
    ];
    importer.import_rows(rows, school_id).await.unwrap();

    let out = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    let filter = DeviceFilter {
        school_id: Some(school_id),
        ..Default::default()
    };
    let written = {
        let guard = conn.lock().unwrap();
        export_school_report(&guard, &filter, out.path()).unwrap()
    };
    assert_eq!(written, 3);

    let content = std::fs::read_to_string(out.path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    // 教室 A 在 B 之前；A 内有 set_type 的设备在前
    assert!(lines[1].starts_with("DE2,교육용-2023-6,Desktop,"));
    assert!(lines[2].starts_with("DE1,교육용-5,Desktop,교사,김철수,"));
    assert!(lines[2].contains(",2023-05-01,"));
    assert!(lines[3].starts_with("MO1,,Monitor,"));
}

#[tokio::test]
async fn test_export_unknown_school() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let out = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    let filter = DeviceFilter {
        school_id: Some(42),
        ..Default::default()
    };

    let guard = conn.lock().unwrap();
    let err = export_school_report(&guard, &filter, out.path()).unwrap_err();
    assert!(matches!(err, ExportError::SchoolNotFound(42)));
}

#[tokio::test]
async fn test_grouping_of_imported_devices() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let school_id = seed_school(&conn, "가나초등학교");
    let importer = create_test_importer(&conn);

    let rows = vec![
        device_row(2, &["", "", "Desktop", "교사", "김철수", "LG", "", "", "", "101호", "", "1세트"]),
        device_row(3, &["", "", "Monitor", "교사", "김철수", "LG", "", "", "", "101호", "", "1세트"]),
        device_row(4, &["", "", "Printer", "교사", "김철수", "HP", "", "", "", "101호"]),
        device_row(5, &["", "", "TV", "", "", "LG"]),
    ];
    importer.import_rows(rows, school_id).await.unwrap();

    let repo = DeviceRepository::from_connection(conn.clone());
    let all = repo
        .find_views(&DeviceFilter {
            school_id: Some(school_id),
            ..Default::default()
        })
        .unwrap();
    let groups = group_by_classroom(all, false);

    assert_eq!(groups["101호"]["SET:1세트"].len(), 2);
    assert_eq!(groups["101호"]["OP:김철수"].len(), 1);
    assert_eq!(groups["미지정"][OTHER_GROUP].len(), 1);

    // 已选定教室但筛选结果为空
    let none = repo
        .find_views(&DeviceFilter {
            school_id: Some(school_id),
            room_name: Some("없는교실".to_string()),
            ..Default::default()
        })
        .unwrap();
    let selected = group_by_classroom(none, true);
    assert!(selected.contains_key(SELECTED_ROOM));
}
