//! 树构建与计数聚合
//!
//! `build_tree` 把扁平实体列表递归折叠成文件夹树：按首个路径段分组，
//! 剥掉该段后递归，子树的聚合计数逐层上卷。文件夹可以只被后代路径
//! 隐式引用；这类节点没有自己的记录，id 为 `None`。
//!
//! 前置条件：实体的 `(path, is_folder)` 对唯一（由 user_file 表的
//! 唯一约束保证），路径无空段。违规输入不在此处防御。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{FileEntry, RepetitionCounts};

/// 树中的文件叶子
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: i32,
    pub name: String,
    pub repetition_counts: RepetitionCounts,
}

/// 树中的文件夹节点
///
/// `repetition_counts` 恒等于直属文件计数与各子文件夹聚合计数的
/// 逐元素之和（聚合律，传递到根）。`id` 为 `None` 表示合成节点：
/// 根节点，或仅被隐式引用、没有自己记录的文件夹。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Option<i32>,
    pub name: String,
    pub sub_folders: Vec<Folder>,
    pub files: Vec<File>,
    pub repetition_counts: RepetitionCounts,
}

impl Folder {
    pub fn empty_root() -> Self {
        Self {
            id: None,
            name: String::new(),
            sub_folders: Vec::new(),
            files: Vec::new(),
            repetition_counts: RepetitionCounts::default(),
        }
    }
}

/// 扁平实体列表 → 聚合树
pub fn build_tree(entities: &[FileEntry]) -> Folder {
    build_level(entities.to_vec(), String::new(), None)
}

fn build_level(entities: Vec<FileEntry>, folder_name: String, id: Option<i32>) -> Folder {
    // 子文件夹名 → 剥掉首段后的实体；BTreeMap 保证名字升序
    let mut sub_entities: BTreeMap<String, Vec<FileEntry>> = BTreeMap::new();
    let mut sub_folder_ids: BTreeMap<String, i32> = BTreeMap::new();
    let mut folder = Folder {
        id,
        name: folder_name,
        sub_folders: Vec::new(),
        files: Vec::new(),
        repetition_counts: RepetitionCounts::default(),
    };

    for entity in entities {
        if let Some(split_at) = entity.path.find('/') {
            let sub_folder_name = entity.path[..split_at].to_string();
            let rest = entity.path[split_at + 1..].to_string();
            sub_entities.entry(sub_folder_name).or_default().push(FileEntry {
                path: rest,
                ..entity
            });
        } else if entity.path.starts_with('.') {
            // 隐藏标记段是元数据（历史上充当文件夹自身的 id 记录），
            // 不作为可见子节点
            continue;
        } else if entity.is_folder {
            sub_folder_ids.insert(entity.path, entity.id);
        } else {
            let counts = entity.repetition_counts.unwrap_or_default();
            folder.files.push(File {
                id: entity.id,
                name: entity.path,
                repetition_counts: counts,
            });
            folder.repetition_counts += counts;
        }
    }

    for (sub_folder_name, sub_folder_entities) in sub_entities {
        let sub_folder_id = sub_folder_ids.remove(&sub_folder_name);
        let sub_folder = build_level(sub_folder_entities, sub_folder_name, sub_folder_id);
        folder.repetition_counts += sub_folder.repetition_counts;
        folder.sub_folders.push(sub_folder);
    }

    // 只有显式记录、没有任何内容的空文件夹
    for (sub_folder_name, sub_folder_id) in sub_folder_ids {
        folder.sub_folders.push(Folder {
            id: Some(sub_folder_id),
            name: sub_folder_name,
            sub_folders: Vec::new(),
            files: Vec::new(),
            repetition_counts: RepetitionCounts::default(),
        });
    }

    folder
        .sub_folders
        .sort_by(|a, b| a.name.cmp(&b.name));
    folder.files.sort_by(|a, b| a.name.cmp(&b.name));
    folder
}

/// 收集 `folder` 下（含所有后代）全部文件 id，供文件夹范围的复习会话使用
pub fn collect_file_ids(folder: &Folder) -> Vec<i32> {
    let mut ids: Vec<i32> = folder.files.iter().map(|f| f.id).collect();
    for sub_folder in &folder.sub_folders {
        ids.extend(collect_file_ids(sub_folder));
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: i32, path: &str, new: i32) -> FileEntry {
        FileEntry {
            id,
            path: path.into(),
            is_folder: false,
            repetition_counts: Some(RepetitionCounts {
                new,
                ..Default::default()
            }),
        }
    }

    fn folder(id: i32, path: &str) -> FileEntry {
        FileEntry {
            id,
            path: path.into(),
            is_folder: true,
            repetition_counts: None,
        }
    }

    fn assert_aggregation_law(node: &Folder) {
        let mut expected = RepetitionCounts::default();
        for f in &node.files {
            expected += f.repetition_counts;
        }
        for sub in &node.sub_folders {
            assert_aggregation_law(sub);
            expected += sub.repetition_counts;
        }
        assert_eq!(node.repetition_counts, expected, "folder {}", node.name);
    }

    #[test]
    fn test_build_tree_empty_input() {
        let root = build_tree(&[]);
        assert_eq!(root, Folder::empty_root());
    }

    #[test]
    fn test_build_tree_root_file_and_nested_file() {
        // spec 场景 A
        let root = build_tree(&[file(1, "f1", 1), file(2, "folder/f2", 5)]);

        assert_eq!(root.files.len(), 1);
        assert_eq!(root.files[0].name, "f1");
        assert_eq!(root.sub_folders.len(), 1);
        assert_eq!(root.sub_folders[0].name, "folder");
        assert_eq!(root.sub_folders[0].files[0].name, "f2");
        assert_eq!(root.repetition_counts.new, 6);
        assert_aggregation_law(&root);
    }

    #[test]
    fn test_build_tree_implied_folder_has_no_id() {
        // "a/b/f" 没有 "a" 和 "a/b" 的文件夹记录，节点仍要出现
        let root = build_tree(&[file(7, "a/b/f", 2)]);

        let a = &root.sub_folders[0];
        assert_eq!(a.name, "a");
        assert_eq!(a.id, None);
        let b = &a.sub_folders[0];
        assert_eq!(b.name, "b");
        assert_eq!(b.id, None);
        assert_eq!(b.files[0].name, "f");
        assert_eq!(root.repetition_counts.new, 2);
    }

    #[test]
    fn test_build_tree_explicit_folder_id_attached() {
        let root = build_tree(&[folder(3, "math"), file(4, "math/algebra", 1)]);
        assert_eq!(root.sub_folders[0].id, Some(3));
        assert_eq!(root.sub_folders[0].name, "math");
    }

    #[test]
    fn test_build_tree_explicit_empty_folder_kept() {
        let root = build_tree(&[folder(9, "empty")]);
        assert_eq!(root.sub_folders.len(), 1);
        assert_eq!(root.sub_folders[0].id, Some(9));
        assert_eq!(root.sub_folders[0].repetition_counts, RepetitionCounts::default());
    }

    #[test]
    fn test_build_tree_children_sorted_by_name() {
        let root = build_tree(&[
            file(1, "b", 0),
            file(2, "a", 0),
            file(3, "z/x", 0),
            file(4, "c/x", 0),
            folder(5, "c"),
        ]);
        let file_names: Vec<&str> = root.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(file_names, vec!["a", "b"]);
        let folder_names: Vec<&str> =
            root.sub_folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(folder_names, vec!["c", "z"]);
    }

    #[test]
    fn test_build_tree_hidden_marker_not_listed() {
        let root = build_tree(&[file(1, "math/.folder", 3), file(2, "math/algebra", 1)]);
        let math = &root.sub_folders[0];
        assert_eq!(math.files.len(), 1);
        assert_eq!(math.files[0].name, "algebra");
        // 元数据记录的计数也不参与聚合
        assert_eq!(root.repetition_counts.new, 1);
    }

    #[test]
    fn test_build_tree_aggregation_law_deep() {
        let root = build_tree(&[
            file(1, "a/f1", 1),
            file(2, "a/b/f2", 2),
            file(3, "a/b/c/f3", 4),
            file(4, "top", 8),
            folder(5, "a"),
            folder(6, "a/b"),
        ]);
        assert_aggregation_law(&root);
        assert_eq!(root.repetition_counts.new, 15);
    }

    #[test]
    fn test_collect_file_ids_recursive() {
        let root = build_tree(&[
            file(1, "a/f1", 0),
            file(2, "a/b/f2", 0),
            file(3, "top", 0),
        ]);
        let mut ids = collect_file_ids(&root);
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
