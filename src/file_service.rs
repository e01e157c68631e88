//! 文件目录服务
//!
//! user_file 表上的目录操作：列表（含文件级复习计数）、创建、删除、
//! 重命名、移动。中间文件夹按需递归补建。每次变更后调用方应当用
//! `get_files` 的新快照重建树缓存。

use tracing::info;

use crate::catalog::path;
use crate::database::Database;
use crate::error::{AppError, Result};
use crate::models::FileEntry;

/// 全量实体快照，树构建器的输入
///
/// 文件级计数在这里附上；文件级以上的聚合是 `catalog::tree` 的职责。
pub async fn get_files(db: &Database) -> Result<Vec<FileEntry>> {
    let user_files = db.list_user_files()?;
    let mut entries = Vec::with_capacity(user_files.len());
    for file in user_files {
        let repetition_counts = if file.is_folder {
            None
        } else {
            Some(db.study_repetition_counts(file.id)?)
        };
        entries.push(FileEntry {
            id: file.id,
            path: file.path,
            is_folder: file.is_folder,
            repetition_counts,
        });
    }
    Ok(entries)
}

pub async fn create_file(db: &Database, file_path: &str) -> Result<i32> {
    path::validate_path(file_path)?;
    if db.user_file_exists(file_path, false)? {
        return Err(AppError::AlreadyExists(format!("file {file_path}")));
    }
    let parent = path::parent_path(file_path);
    if !parent.is_empty() {
        create_folder_recursively(db, parent).await?;
    }
    let id = db.insert_user_file(file_path, false)?;
    info!("[FileService] create_file: {file_path} (id {id})");
    Ok(id)
}

pub async fn create_folder(db: &Database, folder_path: &str) -> Result<i32> {
    path::validate_path(folder_path)?;
    if db.user_file_exists(folder_path, true)? {
        return Err(AppError::AlreadyExists(format!("folder {folder_path}")));
    }
    let id = create_folder_recursively(db, folder_path).await?;
    info!("[FileService] create_folder: {folder_path} (id {id})");
    Ok(id)
}

/// 自上而下补建缺失的文件夹记录，返回最深一层的 id
async fn create_folder_recursively(db: &Database, folder_path: &str) -> Result<i32> {
    let mut current = String::new();
    let mut last_id = 0;
    for segment in folder_path.split('/') {
        if current.is_empty() {
            current = segment.to_string();
        } else {
            current = format!("{current}/{segment}");
        }
        last_id = match db.get_user_file_by_path(&current, true)? {
            Some(existing) => existing.id,
            None => db.insert_user_file(&current, true)?,
        };
    }
    Ok(last_id)
}

pub async fn delete_file(db: &Database, file_id: i32) -> Result<()> {
    let file = db.get_user_file(file_id)?;
    if file.is_folder {
        return Err(AppError::InvalidArgument(format!(
            "{} is a folder, not a file",
            file.path
        )));
    }
    db.delete_user_file(file_id)?;
    info!("[FileService] delete_file: {} (id {file_id})", file.path);
    Ok(())
}

/// 删除文件夹及其全部后代（记录、单元格、复习数据随之级联）
pub async fn delete_folder(db: &Database, folder_id: i32) -> Result<()> {
    let folder = db.get_user_file(folder_id)?;
    if !folder.is_folder {
        return Err(AppError::InvalidArgument(format!(
            "{} is a file, not a folder",
            folder.path
        )));
    }
    for descendant in db.get_folder_descendants(&folder.path)? {
        db.delete_user_file(descendant.id)?;
    }
    db.delete_user_file(folder_id)?;
    info!("[FileService] delete_folder: {} (id {folder_id})", folder.path);
    Ok(())
}

pub async fn rename_file(db: &Database, file_id: i32, new_name: &str) -> Result<()> {
    path::validate_name(new_name)?;
    let file = db.get_user_file(file_id)?;
    let new_path = path::apply_new_name(&file.path, new_name);
    if new_path == file.path {
        return Ok(());
    }
    if db.user_file_exists(&new_path, false)? {
        return Err(AppError::AlreadyExists(format!("file {new_path}")));
    }
    db.update_user_file_path(file_id, &new_path)?;
    info!("[FileService] rename_file: {} -> {new_path}", file.path);
    Ok(())
}

pub async fn rename_folder(db: &Database, folder_id: i32, new_name: &str) -> Result<()> {
    path::validate_name(new_name)?;
    let folder = db.get_user_file(folder_id)?;
    let new_path = path::apply_new_name(&folder.path, new_name);
    if new_path == folder.path {
        return Ok(());
    }
    if db.user_file_exists(&new_path, true)? {
        return Err(AppError::AlreadyExists(format!("folder {new_path}")));
    }
    rewrite_subtree_paths(db, folder_id, &folder.path, &new_path)?;
    info!("[FileService] rename_folder: {} -> {new_path}", folder.path);
    Ok(())
}

/// 移动文件到目标文件夹（空串为根），返回新路径
pub async fn move_file(db: &Database, file_id: i32, destination: &str) -> Result<String> {
    let file = db.get_user_file(file_id)?;
    if destination == path::parent_path(&file.path) {
        return Ok(file.path);
    }
    let name = path::file_name(&file.path);
    let new_path = join(destination, name);
    if db.user_file_exists(&new_path, false)? {
        return Err(AppError::AlreadyExists(format!("file {new_path}")));
    }
    db.update_user_file_path(file_id, &new_path)?;
    info!("[FileService] move_file: {} -> {new_path}", file.path);
    Ok(new_path)
}

/// 移动文件夹（连同整棵子树）到目标文件夹，返回新路径
pub async fn move_folder(db: &Database, folder_id: i32, destination: &str) -> Result<String> {
    let folder = db.get_user_file(folder_id)?;
    if destination == folder.path || destination == path::parent_path(&folder.path) {
        return Ok(folder.path);
    }
    if destination.starts_with(&format!("{}/", folder.path)) {
        return Err(AppError::InvalidArgument(format!(
            "cannot move folder {} into its own subtree",
            folder.path
        )));
    }
    let name = path::file_name(&folder.path);
    let new_path = join(destination, name);
    if db.user_file_exists(&new_path, true)? {
        return Err(AppError::AlreadyExists(format!("folder {new_path}")));
    }
    rewrite_subtree_paths(db, folder_id, &folder.path, &new_path)?;
    info!("[FileService] move_folder: {} -> {new_path}", folder.path);
    Ok(new_path)
}

fn join(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

fn rewrite_subtree_paths(
    db: &Database,
    folder_id: i32,
    old_path: &str,
    new_path: &str,
) -> Result<()> {
    let descendants = db.get_folder_descendants(old_path)?;
    db.update_user_file_path(folder_id, new_path)?;
    for descendant in descendants {
        let rewritten = format!("{new_path}{}", &descendant.path[old_path.len()..]);
        db.update_user_file_path(descendant.id, &rewritten)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::new_in_memory().unwrap()
    }

    fn paths(entries: &[FileEntry]) -> Vec<(String, bool)> {
        entries
            .iter()
            .map(|e| (e.path.clone(), e.is_folder))
            .collect()
    }

    #[tokio::test]
    async fn test_create_file_materializes_intermediate_folders() {
        let db = db();
        create_file(&db, "math/algebra/linear").await.unwrap();

        let entries = get_files(&db).await.unwrap();
        assert_eq!(
            paths(&entries),
            vec![
                ("math".to_string(), true),
                ("math/algebra".to_string(), true),
                ("math/algebra/linear".to_string(), false),
            ]
        );
        // 文件夹不携带文件级计数
        assert!(entries[0].repetition_counts.is_none());
        assert!(entries[2].repetition_counts.is_some());
    }

    #[tokio::test]
    async fn test_create_file_duplicate_rejected() {
        let db = db();
        create_file(&db, "notes").await.unwrap();
        let err = create_file(&db, "notes").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_create_file_invalid_path_rejected() {
        let db = db();
        assert!(matches!(
            create_file(&db, "").await.unwrap_err(),
            AppError::InvalidPath(_)
        ));
        assert!(matches!(
            create_file(&db, "a//b").await.unwrap_err(),
            AppError::InvalidPath(_)
        ));
    }

    #[tokio::test]
    async fn test_create_folder_reuses_existing_prefix() {
        let db = db();
        create_folder(&db, "a/b").await.unwrap();
        create_folder(&db, "a/b/c").await.unwrap();

        let entries = get_files(&db).await.unwrap();
        // "a" 与 "a/b" 不重复创建
        assert_eq!(entries.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_folder_removes_descendants() {
        let db = db();
        let folder_id = create_folder(&db, "math").await.unwrap();
        create_file(&db, "math/algebra").await.unwrap();
        create_file(&db, "math/deep/calculus").await.unwrap();
        create_file(&db, "physics").await.unwrap();

        delete_folder(&db, folder_id).await.unwrap();

        let entries = get_files(&db).await.unwrap();
        assert_eq!(paths(&entries), vec![("physics".to_string(), false)]);
    }

    #[tokio::test]
    async fn test_rename_folder_rewrites_subtree() {
        let db = db();
        let folder_id = create_folder(&db, "math").await.unwrap();
        create_file(&db, "math/algebra").await.unwrap();
        create_file(&db, "math/geo/triangles").await.unwrap();

        rename_folder(&db, folder_id, "maths").await.unwrap();

        let entries = get_files(&db).await.unwrap();
        let all: Vec<String> = entries.iter().map(|e| e.path.clone()).collect();
        assert!(all.contains(&"maths".to_string()));
        assert!(all.contains(&"maths/algebra".to_string()));
        assert!(all.contains(&"maths/geo/triangles".to_string()));
        assert!(!all.iter().any(|p| p.starts_with("math/")));
    }

    #[tokio::test]
    async fn test_move_file_to_root_and_into_folder() {
        let db = db();
        create_folder(&db, "inbox").await.unwrap();
        let file_id = create_file(&db, "inbox/note").await.unwrap();

        let new_path = move_file(&db, file_id, "").await.unwrap();
        assert_eq!(new_path, "note");

        let new_path = move_file(&db, file_id, "inbox").await.unwrap();
        assert_eq!(new_path, "inbox/note");
    }

    #[tokio::test]
    async fn test_move_folder_into_own_subtree_rejected() {
        let db = db();
        let folder_id = create_folder(&db, "a").await.unwrap();
        create_folder(&db, "a/b").await.unwrap();

        let err = move_folder(&db, folder_id, "a/b").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_move_folder_rewrites_subtree() {
        let db = db();
        create_folder(&db, "archive").await.unwrap();
        let folder_id = create_folder(&db, "math").await.unwrap();
        create_file(&db, "math/algebra").await.unwrap();

        let new_path = move_folder(&db, folder_id, "archive").await.unwrap();
        assert_eq!(new_path, "archive/math");

        let entries = get_files(&db).await.unwrap();
        let all: Vec<String> = entries.iter().map(|e| e.path.clone()).collect();
        assert!(all.contains(&"archive/math/algebra".to_string()));
    }

    #[tokio::test]
    async fn test_rename_file_collision_rejected() {
        let db = db();
        create_file(&db, "a").await.unwrap();
        let file_id = create_file(&db, "b").await.unwrap();
        let err = rename_file(&db, file_id, "a").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }
}
