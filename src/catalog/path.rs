//! 路径工具与校验
//!
//! 路径以 `/` 分隔、不带前导斜杠，段即名字。

use crate::error::{AppError, Result};

/// 路径的最后一段（名字）
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// 去掉最后一段后的父路径；顶层条目返回空串
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..index],
        None => "",
    }
}

/// 用新名字替换路径的最后一段
pub fn apply_new_name(path: &str, new_name: &str) -> String {
    let parent = parent_path(path);
    if parent.is_empty() {
        new_name.to_string()
    } else {
        format!("{parent}/{new_name}")
    }
}

/// 校验路径：非空、无空段、无控制字符
pub fn validate_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(AppError::InvalidPath("path cannot be empty".into()));
    }
    if path.split('/').any(|segment| segment.trim().is_empty()) {
        return Err(AppError::InvalidPath(format!(
            "path contains an empty segment: {path}"
        )));
    }
    if path.chars().any(|c| c.is_control()) {
        return Err(AppError::InvalidPath(
            "path contains control characters".into(),
        ));
    }
    Ok(())
}

/// 校验单段名字：非空且不含分隔符
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidArgument("name cannot be empty".into()));
    }
    if name.contains('/') {
        return Err(AppError::InvalidArgument(format!(
            "name cannot contain '/': {name}"
        )));
    }
    Ok(())
}
