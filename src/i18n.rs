// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持印尼语（默认，时长单位 j/m/d）和英文（h/m/s）
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// 格式化函数一律显式传入 locale，不依赖全局 locale 状态
// ==========================================

use rust_i18n::t;

/// 默认语言
pub const DEFAULT_LOCALE: &str = "id";

/// 支持的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["id", "en"];

/// 规范化语言代码，不支持的回退到默认语言
pub fn normalize_locale(locale: &str) -> &'static str {
    let lower = locale.trim().to_lowercase();
    SUPPORTED_LOCALES
        .iter()
        .copied()
        .find(|l| lower == *l || lower.starts_with(&format!("{}-", l)))
        .unwrap_or(DEFAULT_LOCALE)
}

/// 翻译消息（指定语言）
pub fn t_in(locale: &str, key: &str) -> String {
    t!(key, locale = normalize_locale(locale)).to_string()
}

/// 翻译消息（指定语言，带参数）
pub fn t_in_with_args(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    let mut result = t_in(locale, key);
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// 回看天数下拉文案
pub fn days_back_label(locale: &str, days: u32) -> String {
    match days {
        1 => t_in(locale, "days_back.today"),
        365 => t_in(locale, "days_back.last_year"),
        n => t_in_with_args(locale, "days_back.last_days", &[("days", &n.to_string())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("id"), "id");
        assert_eq!(normalize_locale("en-US"), "en");
        assert_eq!(normalize_locale("zh-CN"), "id");
    }

    #[test]
    fn test_unit_keys_per_locale() {
        assert_eq!(t_in("id", "duration.hour"), "j");
        assert_eq!(t_in("id", "duration.second"), "d");
        assert_eq!(t_in("en", "duration.hour"), "h");
    }

    #[test]
    fn test_days_back_label() {
        assert_eq!(days_back_label("id", 1), "Hari ini");
        assert_eq!(days_back_label("id", 7), "7 hari terakhir");
        assert_eq!(days_back_label("en", 365), "Last year");
    }
}
