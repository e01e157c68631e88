//! 搜索可见性标注
//!
//! 对树做结构同构的标注：文件按名字大小写不敏感包含匹配；文件夹
//! 的可见性严格自下而上传播——只要有可见的直属文件或可见的子文件
//! 夹就可见。文件夹自己的名字命中查询但内容全不命中时**不可见**，
//! 这是既有的、被测试固定的行为，不是缺陷。

use serde::{Deserialize, Serialize};

use crate::models::RepetitionCounts;

use super::tree::Folder;

/// 标注了可见性的文件叶子
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileView {
    pub id: i32,
    pub name: String,
    pub repetition_counts: RepetitionCounts,
    pub is_visible: bool,
}

/// 标注了可见性的文件夹节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderView {
    pub id: Option<i32>,
    pub name: String,
    pub sub_folders: Vec<FolderView>,
    pub files: Vec<FileView>,
    pub repetition_counts: RepetitionCounts,
    pub is_visible: bool,
}

/// 深度优先标注整棵树，子节点先于父节点求值
pub fn search_tree(folder: &Folder, query: &str) -> FolderView {
    let query_lower = query.to_lowercase();
    annotate(folder, &query_lower)
}

fn annotate(folder: &Folder, query_lower: &str) -> FolderView {
    let sub_folders: Vec<FolderView> = folder
        .sub_folders
        .iter()
        .map(|f| annotate(f, query_lower))
        .collect();
    let files: Vec<FileView> = folder
        .files
        .iter()
        .map(|f| FileView {
            id: f.id,
            name: f.name.clone(),
            repetition_counts: f.repetition_counts,
            is_visible: query_lower.is_empty() || f.name.to_lowercase().contains(query_lower),
        })
        .collect();

    let is_visible = query_lower.is_empty()
        || files.iter().any(|f| f.is_visible)
        || sub_folders.iter().any(|f| f.is_visible);

    FolderView {
        id: folder.id,
        name: folder.name.clone(),
        sub_folders,
        files,
        repetition_counts: folder.repetition_counts,
        is_visible,
    }
}
