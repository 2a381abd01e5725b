// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use andon_monitor::domain::{IdealTime, ProductionEvent, ScheduledUnit, StageSignal};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// 固定"今天"：2024-03-11
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
}

/// 今天 h:m
pub fn at(h: u32, m: u32) -> NaiveDateTime {
    today().and_hms_opt(h, m, 0).unwrap()
}

/// N 天前 h:m
pub fn days_ago(days: i64, h: u32, m: u32) -> NaiveDateTime {
    (today() - Duration::days(days)).and_hms_opt(h, m, 0).unwrap()
}

/// 固定"现在"：今天 12:00
pub fn noon() -> NaiveDateTime {
    at(12, 0)
}

// ==========================================
// ProductionEvent 构建器
// ==========================================

pub struct EventBuilder {
    event: ProductionEvent,
}

impl EventBuilder {
    pub fn new(unit_id: &str, workstation: i32, status: &str) -> Self {
        Self {
            event: ProductionEvent {
                id_process: 0,
                product_id: Some("PRD-01".to_string()),
                unit_id: Some(unit_id.to_string()),
                project_name: Some("Proyek Panel".to_string()),
                product_name: Some("Panel LVMDP".to_string()),
                line: Some("Line A".to_string()),
                workshop: Some("Workshop 1".to_string()),
                process_name: Some(format!("WS{}", workstation)),
                workstation: Some(workstation),
                operator_rfid: Some(1000 + workstation as i64),
                operator_name: Some(format!("Operator {}", workstation)),
                started_at: None,
                finished_at: None,
                duration_seconds: None,
                duration_formatted: None,
                status: Some(status.to_string()),
                qc_note: None,
                signal: StageSignal::Unknown { raw: String::new() },
            },
        }
    }

    pub fn product(mut self, product_id: &str) -> Self {
        self.event.product_id = Some(product_id.to_string());
        self
    }

    pub fn started(mut self, at: NaiveDateTime) -> Self {
        self.event.started_at = Some(at);
        self
    }

    pub fn finished(mut self, at: NaiveDateTime) -> Self {
        self.event.finished_at = Some(at);
        if let Some(start) = self.event.started_at {
            let secs = (at - start).num_seconds();
            self.event.duration_seconds = Some(secs);
            self.event.duration_formatted = Some(format!(
                "{:02}:{:02}:{:02}",
                secs / 3600,
                (secs % 3600) / 60,
                secs % 60
            ));
        }
        self
    }

    pub fn qc(mut self, note: &str) -> Self {
        self.event.qc_note = Some(note.to_string());
        self
    }

    pub fn operator(mut self, name: &str) -> Self {
        self.event.operator_name = Some(name.to_string());
        self
    }

    pub fn line(mut self, line: &str) -> Self {
        self.event.line = Some(line.to_string());
        self
    }

    pub fn build(self) -> ProductionEvent {
        self.event
    }
}

// ==========================================
// IdealTime / ScheduledUnit
// ==========================================

/// 理想总工时（process_name = total_production_qc）
pub fn ideal_total(product_id: &str, duration: &str) -> IdealTime {
    IdealTime {
        product_id: product_id.to_string(),
        process_name: Some("total_production_qc".to_string()),
        workstation: None,
        duration_time: Some(duration.to_string()),
        percentage: None,
    }
}

/// 按工位的理想工时
pub fn ideal_station(product_id: &str, workstation: i32, duration: &str, pct: f64) -> IdealTime {
    IdealTime {
        product_id: product_id.to_string(),
        process_name: Some(format!("WS{}", workstation)),
        workstation: Some(workstation),
        duration_time: Some(duration.to_string()),
        percentage: Some(pct),
    }
}

/// 排产计划
pub fn scheduled(product_id: &str, start: NaiveDateTime) -> ScheduledUnit {
    ScheduledUnit {
        id: 0,
        project_id: Some("PRJ-01".to_string()),
        product_id: Some(product_id.to_string()),
        project: Some("Proyek Panel".to_string()),
        product: Some(format!("Panel {}", product_id)),
        workshop: Some("Workshop 1".to_string()),
        line: Some("Line A".to_string()),
        quantity: Some(3),
        start_schedule: Some(start),
        finish_schedule: None,
        qc_schedule: None,
        progress_note: None,
    }
}
