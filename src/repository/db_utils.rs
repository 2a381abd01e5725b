// ==========================================
// Andon 生产监控看板 - 数据库工具模块
// ==========================================
// 时间戳以 TEXT "YYYY-MM-DD HH:MM:SS" 存储（工厂本地时间）
// 解析失败一律视为未知 (None)，不报错
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::ValueRef;
use rusqlite::{Result as SqliteResult, Row};

/// 时间戳存储格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// 日期存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const ACCEPTED_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// 解析时间戳文本
///
/// 兼容 ISO 形式（T 分隔、小数秒）与仅分钟精度；纯日期视为当日 00:00:00
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim().trim_end_matches('Z');
    if trimmed.is_empty() {
        return None;
    }

    ACCEPTED_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// 读取时间戳列（NULL / 非文本 / 无法解析 → None）
pub fn read_timestamp(row: &Row<'_>, column: &str) -> SqliteResult<Option<NaiveDateTime>> {
    Ok(match row.get_ref(column)? {
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().and_then(parse_timestamp),
        _ => None,
    })
}

/// 读取文本列，兼容数字存储（如 id_product 以整数写入）
pub fn read_text(row: &Row<'_>, column: &str) -> SqliteResult<Option<String>> {
    Ok(match row.get_ref(column)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => None,
    })
}

/// 读取整数列，兼容文本存储（如 workstation 以 "3" 写入）
pub fn read_int(row: &Row<'_>, column: &str) -> SqliteResult<Option<i64>> {
    Ok(match row.get_ref(column)? {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) => Some(f as i64),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok()),
        _ => None,
    })
}
