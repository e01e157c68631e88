//! MindCell —— 笔记即卡片的间隔复习引擎
//!
//! 数据模型围绕三层展开：用户文件（路径即层级）、文件内的单元格、
//! 单元格派生的复习记录。在此之上提供两块核心能力：
//!
//! - `catalog`：把扁平路径清单构建成聚合了复习计数的目录树，并
//!   支持按文件名做可见性过滤；
//! - `review`：复习记录与调度器卡片之间的无损换算，以及冻结
//!   到期集、单飞提交的复习会话引擎。
//!
//! 服务层（`file_service` / `cell_service` / `repetition_service` /
//! `review_service`）以 SQLite 为底座串起以上各块。

pub mod catalog;
pub mod cell_service;
pub mod database;
pub mod error;
pub mod file_service;
pub mod models;
pub mod repetition_service;
pub mod review;
pub mod review_service;

pub use database::Database;
pub use error::{AppError, Result};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// 初始化日志；重复调用安全（后续调用为空操作）
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()))
        .try_init();
}
