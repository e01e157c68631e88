//! 单元格服务
//!
//! 文件内单元格的增删改移。`index` 必须始终是文件内从 0 开始的
//! 稠密连续序列：插入前整体后移，删除后整体前移，移动时先抽出再
//! 插回。内容或类型变化会同步触发复习记录的补建/清理。

use tracing::info;

use crate::database::Database;
use crate::error::Result;
use crate::models::{Cell, CellType};
use crate::repetition_service;

pub async fn get_file_cells(db: &Database, file_id: i32) -> Result<Vec<Cell>> {
    db.get_file_cells(file_id)
}

/// 多文件的单元格，按 (文件, index) 顺序拼接
pub async fn get_cells_for_files(db: &Database, file_ids: &[i32]) -> Result<Vec<Cell>> {
    let mut cells = Vec::new();
    for &file_id in file_ids {
        cells.extend(db.get_file_cells(file_id)?);
    }
    Ok(cells)
}

pub async fn create_cell(
    db: &Database,
    file_id: i32,
    content: &str,
    cell_type: CellType,
    index: i32,
) -> Result<i32> {
    db.shift_cell_indices(file_id, index, 1)?;
    let cell_id = db.insert_cell(file_id, content, cell_type, index)?;
    repetition_service::update_repetitions_for_cell(db, file_id, cell_id, cell_type, content)
        .await?;
    info!("[CellService] create_cell: file {file_id} index {index} (id {cell_id})");
    Ok(cell_id)
}

pub async fn delete_cell(db: &Database, cell_id: i32) -> Result<()> {
    let cell = db.get_cell(cell_id)?;
    db.delete_cell(cell_id)?;
    db.shift_cell_indices(cell.file_id, cell.index, -1)?;
    info!("[CellService] delete_cell: id {cell_id}");
    Ok(())
}

/// 把单元格移到 `new_index`（按移除自身前的序号计）
pub async fn move_cell(db: &Database, cell_id: i32, new_index: i32) -> Result<()> {
    let cell = db.get_cell(cell_id)?;
    let new_index = if new_index > cell.index {
        new_index - 1
    } else {
        new_index
    };
    db.shift_cell_indices(cell.file_id, cell.index + 1, -1)?;
    db.shift_cell_indices(cell.file_id, new_index, 1)?;
    db.update_cell_index(cell_id, new_index)?;
    Ok(())
}

pub async fn update_cell_content(db: &Database, cell_id: i32, content: &str) -> Result<()> {
    let cell = db.get_cell(cell_id)?;
    db.update_cell_content(cell_id, content)?;
    repetition_service::update_repetitions_for_cell(
        db,
        cell.file_id,
        cell_id,
        cell.cell_type,
        content,
    )
    .await
}

#[cfg(test)]
mod tests {
    use crate::file_service;

    use super::*;

    async fn file(db: &Database) -> i32 {
        file_service::create_file(db, "file 1").await.unwrap()
    }

    fn assert_dense_indices(cells: &[Cell]) {
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(cell.index, i as i32, "cell {} out of place", cell.id);
        }
    }

    #[tokio::test]
    async fn test_create_cell_shifts_following_indices() {
        let db = Database::new_in_memory().unwrap();
        let file_id = file(&db).await;
        create_cell(&db, file_id, "first", CellType::Note, 0).await.unwrap();
        create_cell(&db, file_id, "last", CellType::Note, 1).await.unwrap();

        create_cell(&db, file_id, "inserted", CellType::Note, 1).await.unwrap();

        let cells = get_file_cells(&db, file_id).await.unwrap();
        let contents: Vec<&str> = cells.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "inserted", "last"]);
        assert_dense_indices(&cells);
    }

    #[tokio::test]
    async fn test_delete_cell_renumbers() {
        let db = Database::new_in_memory().unwrap();
        let file_id = file(&db).await;
        create_cell(&db, file_id, "0", CellType::Note, 0).await.unwrap();
        let victim = create_cell(&db, file_id, "1", CellType::Note, 1).await.unwrap();
        create_cell(&db, file_id, "2", CellType::Note, 2).await.unwrap();

        delete_cell(&db, victim).await.unwrap();

        let cells = get_file_cells(&db, file_id).await.unwrap();
        let contents: Vec<&str> = cells.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["0", "2"]);
        assert_dense_indices(&cells);
    }

    #[tokio::test]
    async fn test_move_cell_forward() {
        let db = Database::new_in_memory().unwrap();
        let file_id = file(&db).await;
        create_cell(&db, file_id, "0", CellType::FlashCard, 0).await.unwrap();
        let cell_id = create_cell(&db, file_id, "1", CellType::FlashCard, 1).await.unwrap();
        create_cell(&db, file_id, "2", CellType::FlashCard, 2).await.unwrap();
        create_cell(&db, file_id, "3", CellType::Note, 3).await.unwrap();

        move_cell(&db, cell_id, 3).await.unwrap();

        let cells = get_file_cells(&db, file_id).await.unwrap();
        let contents: Vec<&str> = cells.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["0", "2", "1", "3"]);
        assert_dense_indices(&cells);
    }

    #[tokio::test]
    async fn test_move_cell_backward() {
        let db = Database::new_in_memory().unwrap();
        let file_id = file(&db).await;
        create_cell(&db, file_id, "0", CellType::FlashCard, 0).await.unwrap();
        create_cell(&db, file_id, "1", CellType::FlashCard, 1).await.unwrap();
        let cell_id = create_cell(&db, file_id, "2", CellType::FlashCard, 2).await.unwrap();
        create_cell(&db, file_id, "3", CellType::Note, 3).await.unwrap();

        move_cell(&db, cell_id, 1).await.unwrap();

        let cells = get_file_cells(&db, file_id).await.unwrap();
        let contents: Vec<&str> = cells.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["0", "2", "1", "3"]);
        assert_dense_indices(&cells);
    }

    #[tokio::test]
    async fn test_update_cell_content() {
        let db = Database::new_in_memory().unwrap();
        let file_id = file(&db).await;
        let cell_id = create_cell(&db, file_id, "old", CellType::FlashCard, 0)
            .await
            .unwrap();

        update_cell_content(&db, cell_id, "new").await.unwrap();

        let cells = get_file_cells(&db, file_id).await.unwrap();
        assert_eq!(cells[0].content, "new");
    }

    #[tokio::test]
    async fn test_get_cells_for_files_spans_files_in_order() {
        let db = Database::new_in_memory().unwrap();
        let file1 = file_service::create_file(&db, "f1").await.unwrap();
        let file2 = file_service::create_file(&db, "f2").await.unwrap();
        for i in 0..2 {
            create_cell(&db, file1, "a", CellType::Note, i).await.unwrap();
        }
        for i in 0..3 {
            create_cell(&db, file2, "b", CellType::Note, i).await.unwrap();
        }

        let cells = get_cells_for_files(&db, &[file1, file2]).await.unwrap();
        assert_eq!(cells.len(), 5);
        assert!(cells[..2].iter().all(|c| c.file_id == file1));
        assert!(cells[2..].iter().all(|c| c.file_id == file2));
    }
}
