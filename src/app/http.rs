// ==========================================
// Andon 生产监控看板 - HTTP 路由
// ==========================================
// 路由:
//   GET /api/production-progress/current?daysBack=N   看板聚合
//   GET /api/production-progress?workshop&line&search&limit  进度列表
//   GET /api/notifications/kurang-komponen            当日缺料通知
//   GET /healthz
// 错误信封: {request_id, error: {code, message}}
// ==========================================

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{ApiError, ApiResult, DashboardSnapshot, ProgressList, ShortageFeed};
use crate::app::state::AppState;
use crate::domain::progress::ProgressFilter;
use crate::domain::types::DaysBack;

/// 构建路由
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/production-progress/current", get(current_dashboard))
        .route("/api/production-progress", get(progress_list))
        .route("/api/notifications/kurang-komponen", get(shortage_notifications))
        .route("/healthz", get(healthz))
        .with_state(state)
}

// ==========================================
// 查询参数
// ==========================================
// 数值参数按字符串接收，解析失败统一走 ApiError 信封

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentQuery {
    pub days_back: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgressQuery {
    pub workshop: Option<String>,
    pub line: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
}

impl CurrentQuery {
    /// daysBack 缺省取看板默认值；数值收敛到 1..=365
    fn days_back(&self, default: DaysBack) -> ApiResult<DaysBack> {
        match non_empty(self.days_back.as_deref()) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<i64>()
                .map(DaysBack::clamped)
                .map_err(|_| ApiError::InvalidInput(format!("daysBack 必须为整数: {}", raw))),
        }
    }
}

impl ProgressQuery {
    fn into_filter(self) -> ApiResult<ProgressFilter> {
        let limit = match non_empty(self.limit.as_deref()) {
            None => None,
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| ApiError::InvalidInput(format!("limit 必须为整数: {}", raw)))?,
            ),
        };

        Ok(ProgressFilter {
            workshop: non_empty(self.workshop.as_deref()).map(str::to_string),
            line: non_empty(self.line.as_deref()).map(str::to_string),
            search: non_empty(self.search.as_deref()).map(str::to_string),
            limit: ProgressFilter::clamp_limit(limit),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn local_now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

// ==========================================
// 处理函数
// ==========================================

async fn current_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CurrentQuery>,
) -> ApiResult<Json<DashboardSnapshot>> {
    let api = &state.progress_api;
    let days_back = query.days_back(api.current_settings().await.default_days_back)?;
    let snapshot = api.load_dashboard(days_back, local_now()).await?;
    Ok(Json(snapshot))
}

async fn progress_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProgressQuery>,
) -> ApiResult<Json<ProgressList>> {
    let filter = query.into_filter()?;
    let list = state.progress_api.list_progress(filter).await?;
    Ok(Json(list))
}

async fn shortage_notifications(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ShortageFeed>> {
    let feed = state.progress_api.shortage_feed(local_now()).await?;
    Ok(Json(feed))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub store: String,
    pub version: String,
}

async fn healthz(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        store: state.store.label().to_string(),
        version: crate::VERSION.to_string(),
    })
}

// ==========================================
// 错误信封
// ==========================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub request_id: String,
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(request_id = %request_id, code = self.code(), error = %self, "请求失败");
        } else {
            tracing::warn!(request_id = %request_id, code = self.code(), error = %self, "请求被拒绝");
        }

        let envelope = ErrorEnvelope {
            request_id,
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_back_parsing() {
        let default = DaysBack::default();
        let q = CurrentQuery { days_back: None };
        assert_eq!(q.days_back(default).unwrap(), default);

        let q = CurrentQuery {
            days_back: Some("0".to_string()),
        };
        assert_eq!(q.days_back(default).unwrap().get(), 1);

        let q = CurrentQuery {
            days_back: Some("tujuh".to_string()),
        };
        assert!(matches!(q.days_back(default), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_progress_filter_limit_clamped() {
        let filter = ProgressQuery {
            limit: Some("1000".to_string()),
            search: Some("  ".to_string()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.limit, ProgressFilter::MAX_LIMIT);
        assert!(filter.search.is_none());

        let filter = ProgressQuery::default().into_filter().unwrap();
        assert_eq!(filter.limit, ProgressFilter::DEFAULT_LIMIT);
    }
}
