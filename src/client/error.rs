// ==========================================
// Andon 生产监控看板 - 轮询客户端错误类型
// ==========================================

use thiserror::Error;

/// 轮询客户端错误
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("请求超时: {0}")]
    Timeout(String),

    #[error("网络错误: {0}")]
    Transport(String),

    #[error("服务端返回 HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("响应解析失败: {0}")]
    Decode(String),

    #[error("回看天数不在可选范围内: {0}")]
    InvalidDaysBack(u32),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

/// Result 类型别名
pub type ClientResult<T> = Result<T, ClientError>;
