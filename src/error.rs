//! 全局错误定义
//!
//! 本模块定义 mindcell 库层的统一错误类型和结果别名。
//! 所有可失败操作返回 `Result<T, AppError>`，不做静默降级。

use serde::Serialize;
use thiserror::Error;

/// mindcell 错误类型
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    /// 路径格式错误（空段、非法字符等）
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// 参数错误
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 资源不存在
    #[error("Not found: {0}")]
    NotFound(String),

    /// 资源已存在
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// 持久化层错误
    #[error("Database error: {0}")]
    Database(String),

    /// 调度引擎（oracle）错误
    #[error("Scheduling error: {0}")]
    Scheduling(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// 统一结果别名
pub type Result<T> = std::result::Result<T, AppError>;
