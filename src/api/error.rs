// ==========================================
// Andon 生产监控看板 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为用户可读的错误消息
// HTTP 映射: code() / status_code()，响应信封见 app::http
// ==========================================

use axum::http::StatusCode;
use thiserror::Error;

use crate::repository::error::RepositoryError;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    /// 聚合请求的全部查询均失败
    #[error("数据不可用: {failed} 个查询全部失败")]
    DataUnavailable { failed: usize },

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 机器可读错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_UNAVAILABLE",
            ApiError::DataUnavailable { .. } => "DATA_UNAVAILABLE",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DatabaseConnectionError(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::DatabaseError(_)
            | ApiError::DataUnavailable { .. }
            | ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let api_err: ApiError = RepositoryError::NotFound {
            entity: "ProductionEvent".to_string(),
            id: "42".to_string(),
        }
        .into();
        match &api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("ProductionEvent"));
                assert!(msg.contains("42"));
            }
            _ => panic!("Expected NotFound"),
        }
        assert_eq!(api_err.status_code(), StatusCode::NOT_FOUND);

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(api_err.code(), "DATABASE_UNAVAILABLE");
        assert_eq!(api_err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_query_errors_map_to_database_error() {
        for err in [
            RepositoryError::DatabaseQueryError("no such table".to_string()),
            RepositoryError::UniqueConstraintViolation("id_process".to_string()),
        ] {
            let api_err: ApiError = err.into();
            assert_eq!(api_err.code(), "DATABASE_ERROR");
            assert_eq!(api_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_data_unavailable_is_500() {
        let err = ApiError::DataUnavailable { failed: 10 };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "DATA_UNAVAILABLE");
        assert!(err.to_string().contains("10"));
    }
}
