// ==========================================
// 学校设备台账 - 设备报表导出
// ==========================================
// 输出: CSV,列布局与导入表格一致,
//       第 0 列为组合唯一编号（分类+序号）,第 1 列为组合管理编号
// ==========================================

use crate::domain::device::{columns, DeviceFilter, DeviceView};
use crate::exporter::grouper::sort_for_export;
use crate::repository::{DeviceRepository, RepositoryError, SchoolRepository};
use csv::WriterBuilder;
use rusqlite::Connection;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// 导出模块错误类型
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("学校不存在: school_id={0}")]
    SchoolNotFound(i64),

    #[error("文件写入失败: {0}")]
    FileWriteError(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    CsvWriteError(#[from] csv::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ExportResult<T> = Result<T, ExportError>;

fn report_record(view: &DeviceView) -> [String; columns::COUNT] {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let device = &view.device;

    let mut record: [String; columns::COUNT] = Default::default();
    record[columns::UID_HINT] = view.uid_display().unwrap_or_default();
    record[columns::MANAGE_NO] = view.manage_display().unwrap_or_default();
    record[columns::TYPE] = device.device_type.clone();
    record[columns::OPERATOR_POSITION] = text(&view.operator_position);
    record[columns::OPERATOR_NAME] = text(&view.operator_name);
    record[columns::MANUFACTURER] = text(&device.manufacturer);
    record[columns::MODEL] = text(&device.model_name);
    record[columns::PURCHASE_DATE] = device
        .purchase_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    record[columns::IP_ADDRESS] = text(&device.ip_address);
    record[columns::ROOM_NAME] = text(&view.room_name);
    record[columns::PURPOSE] = text(&device.purpose);
    record[columns::SET_TYPE] = text(&device.set_type);
    record[columns::NOTE] = text(&device.note);
    record
}

/// 排序后写出报表,返回写出的设备数
pub fn write_device_report<W: Write>(devices: &[DeviceView], writer: W) -> ExportResult<usize> {
    let mut sorted = devices.to_vec();
    sort_for_export(&mut sorted);

    let mut csv_writer = WriterBuilder::new().from_writer(writer);
    csv_writer.write_record(columns::HEADERS)?;
    for view in &sorted {
        csv_writer.write_record(report_record(view))?;
    }
    csv_writer.flush()?;
    Ok(sorted.len())
}

/// 按条件查询设备并导出到文件
pub fn export_school_report(
    conn: &Connection,
    filter: &DeviceFilter,
    path: &Path,
) -> ExportResult<usize> {
    if let Some(school_id) = filter.school_id {
        if SchoolRepository::find_by_id_tx(conn, school_id)?.is_none() {
            return Err(ExportError::SchoolNotFound(school_id));
        }
    }

    let views = DeviceRepository::find_views_tx(conn, filter, None)?;
    let file = File::create(path)?;
    let written = write_device_report(&views, file)?;
    info!(path = %path.display(), devices = written, "设备报表导出完成");
    Ok(written)
}
