// ==========================================
// Andon 生产监控看板 - 看板数据源
// ==========================================
// DashboardSource: 轮询客户端的数据来源接口
// HttpDashboardSource: GET /api/production-progress/current（带请求超时）
// ==========================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::DashboardSnapshot;
use crate::app::http::ErrorEnvelope;
use crate::client::error::{ClientError, ClientResult};
use crate::domain::types::DaysBack;

/// 看板数据源
#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// 拉取一次看板聚合
    async fn fetch(&self, days_back: DaysBack) -> ClientResult<DashboardSnapshot>;
}

/// 基于 HTTP 的看板数据源
pub struct HttpDashboardSource {
    base_url: String,
    client: reqwest::Client,
}

impl fmt::Debug for HttpDashboardSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpDashboardSource")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpDashboardSource {
    /// # 参数
    /// - base_url: 服务地址，如 http://127.0.0.1:3000
    /// - timeout: 单次请求超时
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("andon-monitor/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("HTTP 客户端初始化失败: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn current_url(&self) -> String {
        format!("{}/api/production-progress/current", self.base_url)
    }
}

#[async_trait]
impl DashboardSource for HttpDashboardSource {
    async fn fetch(&self, days_back: DaysBack) -> ClientResult<DashboardSnapshot> {
        let response = self
            .client
            .get(self.current_url())
            .query(&[("daysBack", days_back.get())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // 优先取错误信封中的 message
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| truncate_for_error(&body));
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn truncate_for_error(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX_CHARS).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let source =
            HttpDashboardSource::new("http://127.0.0.1:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            source.current_url(),
            "http://127.0.0.1:3000/api/production-progress/current"
        );
    }

    #[test]
    fn test_truncate_for_error() {
        let long = "x".repeat(500);
        assert_eq!(truncate_for_error(&long).chars().count(), 201);
        assert_eq!(truncate_for_error("  oops "), "oops");
    }
}
