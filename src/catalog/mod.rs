//! 目录层级子系统
//!
//! 把扁平的路径寻址实体表投影成带聚合计数的文件夹树，并提供
//! 搜索可见性标注与树缓存。树是派生的一次性投影：任何目录
//! 变更后整棵重建，从不原地修补。
//!
//! ## 模块结构
//! - `tree` - 树构建与计数聚合
//! - `search` - 搜索可见性标注
//! - `path` - 路径工具与校验
//! - `cache` - 当前树的持有者

pub mod cache;
pub mod path;
pub mod search;
pub mod tree;

pub use cache::TreeCache;
pub use search::{search_tree, FileView, FolderView};
pub use tree::{build_tree, collect_file_ids, File, Folder};
