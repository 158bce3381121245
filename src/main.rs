// 学校设备台账 - 命令行入口
//
// Usage:
//   school-inventory import <school_id> <file.xlsx|file.csv> [db_path]
//   school-inventory export <school_id> <out.csv> [db_path]
//
// db_path 缺省时使用 SCHOOL_INVENTORY_DB_PATH 或用户数据目录。
// SCHOOL_INVENTORY_LOG_FORMAT=json 时输出 JSON 行日志。

use school_inventory::config::ConfigManager;
use school_inventory::db::{get_default_db_path, init_schema, open_sqlite_connection};
use school_inventory::domain::DeviceFilter;
use school_inventory::exporter::export_school_report;
use school_inventory::importer::{DeviceImporter, DeviceImporterImpl};
use school_inventory::logging;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const USAGE: &str = "usage: school-inventory <import|export> <school_id> <path> [db_path]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("SCHOOL_INVENTORY_LOG_FORMAT").as_deref() == Ok("json") {
        logging::init_json();
    } else {
        logging::init();
    }

    let mut args = std::env::args().skip(1);
    let command = args.next().ok_or(USAGE)?;
    let school_id: i64 = args
        .next()
        .ok_or(USAGE)?
        .trim()
        .parse()
        .map_err(|_| format!("school_id 必须为整数\n{}", USAGE))?;
    let path = PathBuf::from(args.next().ok_or(USAGE)?);
    let db_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);

    tracing::info!(version = school_inventory::VERSION, db_path = %db_path, "{}", school_inventory::APP_NAME);

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    match command.as_str() {
        "import" => {
            let config = ConfigManager::from_connection(conn.clone())?;
            let importer = DeviceImporterImpl::with_defaults(conn.clone(), config);
            let outcome = importer.import_from_file(&path, school_id).await?;

            println!(
                "batch_id={} imported={} skipped={} errors={} elapsed_ms={}",
                outcome.batch_id,
                outcome.imported_count,
                outcome.skipped_count,
                outcome.errors.len(),
                outcome.elapsed_time.as_millis()
            );
            for error in &outcome.errors {
                println!("  row {}: {}", error.row_number, error.reason);
            }
        }
        "export" => {
            let filter = DeviceFilter {
                school_id: Some(school_id),
                ..Default::default()
            };
            let written = {
                let guard = conn.lock().map_err(|e| e.to_string())?;
                export_school_report(&guard, &filter, &path)?
            };
            println!("exported={} path={}", written, path.display());
        }
        other => return Err(format!("未知命令: {}\n{}", other, USAGE).into()),
    }

    Ok(())
}
