// ==========================================
// 学校设备台账 - 行标准化器实现
// ==========================================
// 职责: 原始行 → NormalizedDeviceInput
// 规则: TRIM / 空串归一为 None / 宽松日期解析 / 管理编号拆分 / 空行跳过
// ==========================================

use crate::domain::device::{columns, NormalizedDeviceInput, ParsedManageNo, RawDeviceRow};
use crate::importer::device_importer_trait::RowNormalizer;
use crate::importer::error::{ImportError, ImportResult};
use chrono::NaiveDate;

pub struct DeviceRowNormalizer;

impl RowNormalizer for DeviceRowNormalizer {
    fn normalize(&self, row: &RawDeviceRow) -> ImportResult<Option<NormalizedDeviceInput>> {
        if is_empty_row(row) {
            return Ok(None);
        }

        let row_number = row.row_number;
        let device_type = match clean(row.cell(columns::TYPE)) {
            Some(t) => t,
            None => return Ok(None),
        };

        let manage_no = clean(row.cell(columns::MANAGE_NO))
            .map(|raw| parse_manage_no(row_number, &raw))
            .transpose()?;

        Ok(Some(NormalizedDeviceInput {
            row_number,
            device_type,
            manufacturer: clean(row.cell(columns::MANUFACTURER)),
            model_name: clean(row.cell(columns::MODEL)),
            ip_address: clean(row.cell(columns::IP_ADDRESS)),
            purpose: clean(row.cell(columns::PURPOSE)),
            set_type: clean(row.cell(columns::SET_TYPE)),
            note: clean(row.cell(columns::NOTE)),
            purchase_date: row.cell(columns::PURCHASE_DATE).and_then(parse_purchase_date),
            room_name: clean(row.cell(columns::ROOM_NAME)),
            operator_name: clean(row.cell(columns::OPERATOR_NAME)),
            operator_position: clean(row.cell(columns::OPERATOR_POSITION)),
            manage_no,
            uid_hint: clean(row.cell(columns::UID_HINT)),
        }))
    }
}

/// TRIM,空白归一为 None
fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 空行判定
///
/// - 类型列为空 → 空行
/// - 类型列非空,但其余 12 列全部为空 → 空行
pub fn is_empty_row(row: &RawDeviceRow) -> bool {
    if clean(row.cell(columns::TYPE)).is_none() {
        return true;
    }
    (0..columns::COUNT)
        .filter(|&idx| idx != columns::TYPE)
        .all(|idx| clean(row.cell(idx)).is_none())
}

/// 宽松日期解析
///
/// 接受 `YYYY-M-D` / `YYYY-M`（日补 1）/ `YYYY`（月日补 1）,
/// 以及 "년"/"월"/"일" 分隔符与多余空格。其余格式返回 None,不报错。
pub fn parse_purchase_date(text: &str) -> Option<NaiveDate> {
    let normalized: String = text
        .replace('년', "-")
        .replace('월', "-")
        .replace('일', "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let normalized = normalized.trim_end_matches('-');
    if normalized.is_empty() {
        return None;
    }

    let parts: Vec<&str> = normalized.split('-').collect();
    if parts.len() > 3 {
        return None;
    }
    let year = parse_digits(parts[0], 4, 4)?;
    let month = match parts.get(1) {
        Some(m) => parse_digits(m, 1, 2)?,
        None => 1,
    };
    let day = match parts.get(2) {
        Some(d) => parse_digits(d, 1, 2)?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

fn parse_digits(part: &str, min_len: usize, max_len: usize) -> Option<u32> {
    if part.len() < min_len || part.len() > max_len || !part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// 管理编号拆分: `CATEGORY-YEAR-NUMBER` 或 `CATEGORY-NUMBER`
pub fn parse_manage_no(row_number: usize, raw: &str) -> ImportResult<ParsedManageNo> {
    let format_error = || ImportError::ManageNoFormatError {
        row: row_number,
        value: raw.to_string(),
    };

    let parts: Vec<&str> = raw.split('-').map(str::trim).collect();
    let (cate, year, num) = match parts.as_slice() {
        [cate, year, num] => {
            let year = year.parse::<i32>().map_err(|_| format_error())?;
            (*cate, Some(year), *num)
        }
        [cate, num] => (*cate, None, *num),
        _ => return Err(format_error()),
    };
    if cate.is_empty() {
        return Err(format_error());
    }
    let num = num.parse::<i64>().map_err(|_| format_error())?;

    Ok(ParsedManageNo {
        cate: cate.to_string(),
        year,
        num,
    })
}
