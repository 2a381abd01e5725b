// ==========================================
// Andon 生产监控看板 - 预计完工与时长格式化
// ==========================================
// 预计完工 = WS1 开始时间 + 理想总工时(HH:MM:SS)
// 时长显示: "{h}j {m}m {s}d"（单位随 locale）
// 缺失/非法输入: 显示占位符 "—"，不抛错
// ==========================================

use chrono::{Duration, NaiveDateTime};

use crate::domain::progress::ProductionEstimate;
use crate::i18n;

/// 占位符
pub const PLACEHOLDER: &str = "—";

// ==========================================
// DurationUnits - 时长单位后缀
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationUnits {
    pub hour: String,
    pub minute: String,
    pub second: String,
}

impl DurationUnits {
    /// 按语言读取单位后缀
    pub fn for_locale(locale: &str) -> Self {
        Self {
            hour: i18n::t_in(locale, "duration.hour"),
            minute: i18n::t_in(locale, "duration.minute"),
            second: i18n::t_in(locale, "duration.second"),
        }
    }
}

impl Default for DurationUnits {
    fn default() -> Self {
        Self::for_locale(i18n::DEFAULT_LOCALE)
    }
}

/// 解析时长字符串为秒
///
/// 规则（与 TIME_TO_SEC 对齐）:
/// - "HH:MM:SS"（小时可超过 24）
/// - "HH:MM"
/// - 纯数字视为秒
/// - 负数、非法格式 → 0
pub fn parse_duration_seconds(value: &str) -> i64 {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return 0;
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let numbers: Option<Vec<i64>> = parts
        .iter()
        .map(|p| p.trim().parse::<u32>().ok().map(i64::from))
        .collect();

    let numbers = match numbers {
        Some(n) => n,
        None => return 0,
    };

    match numbers.as_slice() {
        [secs] => *secs,
        [h, m] if *m < 60 => h * 3600 + m * 60,
        [h, m, s] if *m < 60 && *s < 60 => h * 3600 + m * 60 + s,
        _ => 0,
    }
}

/// 计算预计完工时间
///
/// # 返回
/// - None: 缺少 WS1 开始时间或理想工时
pub fn estimate_finish(
    first_station_start: Option<NaiveDateTime>,
    ideal_duration: Option<&str>,
) -> Option<NaiveDateTime> {
    let start = first_station_start?;
    let ideal = ideal_duration?;
    Some(start + Duration::seconds(parse_duration_seconds(ideal)))
}

/// 补全读模型返回的预计完工时间
pub fn complete_estimate(mut estimate: ProductionEstimate) -> ProductionEstimate {
    estimate.estimated_finish = estimate_finish(estimate.started_at, estimate.total_duration.as_deref());
    estimate
}

/// 超时秒数（仅实际完工晚于预计时为正）
pub fn overtime_seconds(
    finished_at: Option<NaiveDateTime>,
    estimated_finish: Option<NaiveDateTime>,
) -> Option<i64> {
    let secs = (finished_at? - estimated_finish?).num_seconds();
    (secs > 0).then_some(secs)
}

/// 超时标签: "Overtime +{h}h:{mm}m"
pub fn overtime_label(locale: &str, overtime_secs: Option<i64>) -> Option<String> {
    let secs = overtime_secs.filter(|s| *s > 0)?;
    let hours = (secs / 3600).to_string();
    let minutes = format!("{:02}", (secs % 3600) / 60);
    Some(i18n::t_in_with_args(
        locale,
        "overtime.label",
        &[("hours", &hours), ("minutes", &minutes)],
    ))
}

/// 秒数格式化（指定单位）
pub fn format_duration_with(secs: Option<i64>, units: &DurationUnits) -> String {
    match secs {
        Some(total) if total >= 0 => {
            let h = total / 3600;
            let m = (total % 3600) / 60;
            let s = total % 60;
            format!(
                "{}{} {}{} {}{}",
                h, units.hour, m, units.minute, s, units.second
            )
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// 秒数格式化（默认语言）: 3723 → "1j 2m 3d"
pub fn format_duration(secs: Option<i64>) -> String {
    format_duration_with(secs, &DurationUnits::default())
}

/// HH:MM:SS 字符串格式化（默认语言）
pub fn format_duration_text(value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => format_duration(Some(parse_duration_seconds(v))),
        None => PLACEHOLDER.to_string(),
    }
}

/// 已用时长显示（毫秒输入，负数或未知显示占位符）
pub fn format_elapsed_millis(millis: Option<i64>, units: &DurationUnits) -> String {
    match millis {
        Some(ms) if ms >= 0 => format_duration_with(Some(ms / 1000), units),
        _ => PLACEHOLDER.to_string(),
    }
}

/// since → now 的已用秒数
pub fn elapsed_seconds(since: Option<NaiveDateTime>, now: NaiveDateTime) -> Option<i64> {
    let secs = (now - since?).num_seconds();
    (secs >= 0).then_some(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_format_duration_examples() {
        assert_eq!(format_duration(Some(3723)), "1j 2m 3d");
        assert_eq!(format_duration(Some(0)), "0j 0m 0d");
        assert_eq!(format_duration(None), "—");
        assert_eq!(format_duration(Some(-5)), "—");
    }

    #[test]
    fn test_parse_then_format_normalizes() {
        assert_eq!(format_duration(Some(parse_duration_seconds("01:02:03"))), "1j 2m 3d");
        assert_eq!(format_duration(Some(parse_duration_seconds("00:00:00"))), "0j 0m 0d");
        assert_eq!(format_duration(Some(parse_duration_seconds("26:05:09"))), "26j 5m 9d");
        assert_eq!(format_duration_text(Some("02:30:00")), "2j 30m 0d");
        assert_eq!(format_duration_text(None), "—");
    }

    #[test]
    fn test_parse_malformed_is_zero() {
        assert_eq!(parse_duration_seconds("-01:00:00"), 0);
        assert_eq!(parse_duration_seconds("abc"), 0);
        assert_eq!(parse_duration_seconds("01:75:00"), 0);
        assert_eq!(parse_duration_seconds(""), 0);
        assert_eq!(parse_duration_seconds("90"), 90);
        assert_eq!(parse_duration_seconds("01:30"), 5400);
    }

    #[test]
    fn test_estimate_arithmetic() {
        assert_eq!(estimate_finish(Some(ts(8, 0, 0)), Some("02:30:00")), Some(ts(10, 30, 0)));
        assert_eq!(estimate_finish(None, Some("02:30:00")), None);
        assert_eq!(estimate_finish(Some(ts(8, 0, 0)), None), None);
        // 非法工时按 0 处理
        assert_eq!(estimate_finish(Some(ts(8, 0, 0)), Some("bad")), Some(ts(8, 0, 0)));
    }

    #[test]
    fn test_overtime() {
        assert_eq!(overtime_seconds(Some(ts(11, 15, 0)), Some(ts(10, 30, 0))), Some(2700));
        assert_eq!(overtime_seconds(Some(ts(10, 0, 0)), Some(ts(10, 30, 0))), None);
        assert_eq!(
            overtime_label("id", Some(3900)).as_deref(),
            Some("Overtime +1h:05m")
        );
        assert_eq!(overtime_label("id", None), None);
    }

    #[test]
    fn test_english_units_and_elapsed() {
        let units = DurationUnits::for_locale("en");
        assert_eq!(format_duration_with(Some(3723), &units), "1h 2m 3s");
        assert_eq!(format_elapsed_millis(Some(61_999), &units), "0h 1m 1s");
        assert_eq!(format_elapsed_millis(Some(-1), &units), "—");
        assert_eq!(elapsed_seconds(Some(ts(8, 0, 0)), ts(8, 1, 0)), Some(60));
        assert_eq!(elapsed_seconds(Some(ts(9, 0, 0)), ts(8, 0, 0)), None);
    }
}
