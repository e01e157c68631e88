//! 复习记录服务
//!
//! 复习记录由单元格内容派生：Note 不产生记录，FlashCard 和
//! TrueFalse 各一条，Cloze 每个空位一条。内容更新时按目标键集
//! 做差量同步，已存在的记录保留其调度进度不动。

use chrono::Utc;
use tracing::info;

use crate::database::Database;
use crate::error::Result;
use crate::models::{CellType, Repetition, RepetitionCounts};
use crate::review::cloze::extract_blank_keys;

/// 单元格应持有的记录键集（`additional_content` 的取值）
fn desired_keys(cell_type: CellType, content: &str) -> Vec<String> {
    match cell_type {
        CellType::Note => Vec::new(),
        CellType::FlashCard | CellType::TrueFalse => vec![String::new()],
        CellType::Cloze => extract_blank_keys(content),
    }
}

/// 把单元格的复习记录同步到当前内容：补建缺失的键，删除多余的键
pub async fn update_repetitions_for_cell(
    db: &Database,
    file_id: i32,
    cell_id: i32,
    cell_type: CellType,
    content: &str,
) -> Result<()> {
    let desired = desired_keys(cell_type, content);
    let existing = db.get_repetitions_by_cell(cell_id)?;

    let now = Utc::now();
    for key in &desired {
        if !existing.iter().any(|r| &r.additional_content == key) {
            db.insert_repetition(file_id, cell_id, key, now)?;
        }
    }
    for repetition in &existing {
        if !desired.contains(&repetition.additional_content) {
            db.delete_repetition(repetition.id)?;
            info!(
                "[RepetitionService] update_repetitions_for_cell: dropped stale blank {:?} of cell {cell_id}",
                repetition.additional_content
            );
        }
    }
    Ok(())
}

pub async fn get_repetitions_for_files(db: &Database, file_ids: &[i32]) -> Result<Vec<Repetition>> {
    let mut repetitions = Vec::new();
    for &file_id in file_ids {
        repetitions.extend(db.get_file_repetitions(file_id)?);
    }
    Ok(repetitions)
}

pub async fn get_study_repetition_counts(db: &Database, file_id: i32) -> Result<RepetitionCounts> {
    db.study_repetition_counts(file_id)
}
