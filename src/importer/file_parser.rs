// ==========================================
// 学校设备台账 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx) / CSV (.csv)
// 输出: 位置固定的 13 列网格,列含义由位置约定而非表头文本
// ==========================================

use crate::domain::device::RawDeviceRow;
use crate::importer::device_importer_trait::FileParser;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_rows(&self, file_path: &Path, header_rows: usize) -> ImportResult<Vec<RawDeviceRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            // csv 的行号从 1 开始,与表格行号一致
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(rows.len() + 1);
            if row_number <= header_rows {
                continue;
            }
            let values: Vec<&str> = record.iter().collect();
            rows.push(RawDeviceRow::from_strings(row_number, &values));
        }

        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_rows(&self, file_path: &Path, header_rows: usize) -> ImportResult<Vec<RawDeviceRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook: Xlsx<_> = open_workbook(file_path)?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        // range 可能不从 A1 开始,行号按工作表绝对位置计算
        let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);

        let mut rows = Vec::new();
        for (offset, data_row) in range.rows().enumerate() {
            let row_number = first_row + offset + 1;
            if row_number <= header_rows {
                continue;
            }
            let values: Vec<String> = data_row.iter().map(cell_to_string).collect();
            rows.push(RawDeviceRow::from_strings(row_number, &values));
        }

        Ok(rows)
    }
}

/// 单元格转文本；整数值浮点去掉 ".0" 后缀,日期按 YYYY-MM-DD 输出
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

/// Excel 序列日期（1900 日期系统,基准 1899-12-30）
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .checked_add_signed(chrono::Duration::days(serial.trunc() as i64))
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_rows(&self, file_path: &Path, header_rows: usize) -> ImportResult<Vec<RawDeviceRow>> {
        match extension_of(file_path).as_str() {
            "csv" => CsvParser.parse_rows(file_path, header_rows),
            "xlsx" => ExcelParser.parse_rows(file_path, header_rows),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
