// ==========================================
// Andon 生产监控看板 - production_progress CSV 解析
// ==========================================
// 输入: 产线数据库导出的 CSV（表头为 production_progress 列名）
// 输出: ProductionEvent（状态信号在此分类一次）
// 时间戳: 统一规范为 YYYY-MM-DD HH:MM:SS，无法解析的视为未知
// ==========================================

use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::domain::progress::ProductionEvent;
use crate::domain::types::StageSignal;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::db_utils::parse_timestamp;

/// 原始行（表头 → 单元格）
pub type RawRecord = HashMap<String, String>;

/// 读取 CSV 为原始行，跳过完全空白的行
pub fn read_raw_records<R: Read>(reader: R) -> ImportResult<Vec<RawRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // 允许行长度不一致
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row_map: RawRecord = record
            .iter()
            .enumerate()
            .filter_map(|(idx, value)| headers.get(idx).map(|h| (h.clone(), value.to_string())))
            .collect();

        if row_map.values().all(|v| v.is_empty()) {
            continue;
        }
        records.push(row_map);
    }

    Ok(records)
}

/// 从文件读取原始行
pub fn parse_file(path: &Path) -> ImportResult<Vec<RawRecord>> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    if let Some(ext) = path.extension() {
        if !ext.eq_ignore_ascii_case("csv") {
            return Err(ImportError::UnsupportedFormat(
                ext.to_string_lossy().to_string(),
            ));
        }
    }

    let file = File::open(path)?;
    read_raw_records(file)
}

/// 读取并映射事件
pub fn read_events<R: Read>(reader: R) -> ImportResult<Vec<ProductionEvent>> {
    read_raw_records(reader)?
        .iter()
        .enumerate()
        .map(|(idx, raw)| map_event(idx + 2, raw))
        .collect()
}

/// 从文件读取并映射事件
pub fn load_events(path: &Path) -> ImportResult<Vec<ProductionEvent>> {
    parse_file(path)?
        .iter()
        .enumerate()
        .map(|(idx, raw)| map_event(idx + 2, raw))
        .collect()
}

/// 原始行 → ProductionEvent
///
/// # 参数
/// - `row`: CSV 行号（含表头，从 2 开始），用于错误定位
/// - `raw`: 原始行
///
/// # 返回
/// - 数值列非空且无法解析时报 TypeConversionError
pub fn map_event(row: usize, raw: &RawRecord) -> ImportResult<ProductionEvent> {
    let status = text(raw, &["status"]);
    let signal = StageSignal::classify(status.as_deref());

    Ok(ProductionEvent {
        id_process: int(row, raw, &["id_process", "id"])?.unwrap_or(0),
        product_id: text(raw, &["id_product", "product_id"]),
        unit_id: text(raw, &["id_perproduct", "unit_id"]),
        project_name: text(raw, &["project_name"]),
        product_name: text(raw, &["product_name"]),
        line: text(raw, &["line"]),
        workshop: text(raw, &["workshop"]),
        process_name: text(raw, &["process_name"]),
        workstation: int(row, raw, &["workstation"])?.map(|v| v as i32),
        operator_rfid: int(row, raw, &["operator_actual_rfid", "operator_rfid"])?,
        operator_name: text(raw, &["operator_actual_name", "operator_name"]),
        started_at: text(raw, &["start_actual", "started_at"]).and_then(|v| parse_timestamp(&v)),
        finished_at: text(raw, &["finish_actual", "finished_at"]).and_then(|v| parse_timestamp(&v)),
        duration_seconds: int(row, raw, &["duration_sec_actual", "duration_seconds"])?,
        duration_formatted: text(raw, &["duration_time_actual", "duration_formatted"]),
        status,
        qc_note: text(raw, &["note_qc", "qc_note"]),
        signal,
    })
}

// 空字符串与 NULL 字面量视为缺失
fn text(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| raw.get(*k))
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
        .map(str::to_string)
}

fn int(row: usize, raw: &RawRecord, keys: &[&str]) -> ImportResult<Option<i64>> {
    match text(raw, keys) {
        None => Ok(None),
        Some(v) => v
            .parse::<i64>()
            .or_else(|_| v.parse::<f64>().map(|f| f as i64))
            .map(Some)
            .map_err(|e| ImportError::TypeConversionError {
                row,
                field: keys[0].to_string(),
                message: format!("{}: {}", v, e),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
id_process,id_product,id_perproduct,workstation,operator_actual_name,start_actual,finish_actual,status,note_qc
1,PNL-100,U1,1,Budi,2024-01-01T08:00:00,,Masuk WS1,
2,PNL-100,U1,5,Sari,2024-01-01 12:00:00,2024-01-01 12:30:00,Selesai WS5,Finish Good
,,,,,,,,
";

    #[test]
    fn test_read_events_maps_columns() {
        let events = read_events(SAMPLE.as_bytes()).unwrap();
        assert_eq!(events.len(), 2);

        let first = &events[0];
        assert_eq!(first.id_process, 1);
        assert_eq!(first.unit_id.as_deref(), Some("U1"));
        assert_eq!(first.workstation, Some(1));
        assert_eq!(
            first.started_at,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, 0)
        );
        assert_eq!(first.finished_at, None);
        assert_eq!(first.signal, StageSignal::Entered { workstation: Some(1) });

        assert_eq!(events[1].qc_note.as_deref(), Some("Finish Good"));
    }

    #[test]
    fn test_bad_number_reports_row() {
        let csv = "id_perproduct,workstation\nU1,satu\n";
        match read_events(csv.as_bytes()) {
            Err(ImportError::TypeConversionError { row, field, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "workstation");
            }
            other => panic!("unexpected: {:?}", other.map(|e| e.len())),
        }
    }

    #[test]
    fn test_parse_file_checks() {
        assert!(matches!(
            parse_file(Path::new("tidak_ada.csv")),
            Err(ImportError::FileNotFound(_))
        ));

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "id_perproduct,status").unwrap();
        writeln!(temp_file, "U9,Tunggu Mulai").unwrap();
        let records = parse_file(temp_file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("status"), Some(&"Tunggu Mulai".to_string()));
    }
}
