//! 树缓存
//!
//! 当前树的唯一持有者，由应用上下文拥有。任何目录变更后用新的
//! 实体快照整棵重建；树从不被原地修补。

use crate::models::FileEntry;

use super::tree::{build_tree, Folder};

#[derive(Debug, Clone)]
pub struct TreeCache {
    tree: Folder,
}

impl TreeCache {
    pub fn empty() -> Self {
        Self {
            tree: Folder::empty_root(),
        }
    }

    /// 用新的实体快照整棵重建
    pub fn rebuild(&mut self, entities: &[FileEntry]) -> &Folder {
        self.tree = build_tree(entities);
        &self.tree
    }

    pub fn tree(&self) -> &Folder {
        &self.tree
    }
}

impl Default for TreeCache {
    fn default() -> Self {
        Self::empty()
    }
}
