//! SQLite 持久化层
//!
//! 所有 SQL 集中在 `Database` 的方法里，服务层只做编排与校验。
//! 连接使用 `Mutex<Connection>` 串行化访问；时间戳以 RFC3339 文本存储
//! （rusqlite 的 chrono 特性），毫秒精度。

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{
    Cell, CellType, Grade, Repetition, RepetitionCounts, RepetitionState, ReviewStatistics,
    UserFile,
};

pub struct Database {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl Database {
    /// 打开（或创建）磁盘数据库并初始化 schema
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Database(format!("failed to create database directory: {e}"))
            })?;
        }
        let conn = Connection::open(db_path)?;
        let db = Database {
            conn: Mutex::new(conn),
            db_path: Some(db_path.to_path_buf()),
        };
        db.initialize_schema()?;
        info!("[Database] opened at {:?}", db_path);
        Ok(db)
    }

    /// 内存数据库，供测试使用
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database {
            conn: Mutex::new(conn),
            db_path: None,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS user_file (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL,
                is_folder INTEGER NOT NULL,
                UNIQUE(path, is_folder)
            );
            CREATE TABLE IF NOT EXISTS cell (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                cell_type TEXT NOT NULL,
                idx INTEGER NOT NULL,
                FOREIGN KEY(file_id) REFERENCES user_file(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS repetition (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_id INTEGER NOT NULL,
                cell_id INTEGER NOT NULL,
                due TEXT NOT NULL,
                stability REAL NOT NULL DEFAULT 0,
                difficulty REAL NOT NULL DEFAULT 0,
                elapsed_days INTEGER NOT NULL DEFAULT 0,
                scheduled_days INTEGER NOT NULL DEFAULT 0,
                reps INTEGER NOT NULL DEFAULT 0,
                lapses INTEGER NOT NULL DEFAULT 0,
                state TEXT NOT NULL DEFAULT 'New',
                last_review TEXT NOT NULL,
                additional_content TEXT NOT NULL DEFAULT '',
                FOREIGN KEY(cell_id) REFERENCES cell(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS review (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cell_id INTEGER NOT NULL,
                rating TEXT NOT NULL,
                study_time INTEGER NOT NULL,
                date TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_cell_file_idx ON cell(file_id, idx);
            CREATE INDEX IF NOT EXISTS idx_repetition_file ON repetition(file_id);
            CREATE INDEX IF NOT EXISTS idx_repetition_cell ON repetition(cell_id);
            CREATE INDEX IF NOT EXISTS idx_review_date ON review(date);
            COMMIT;",
        )?;
        Ok(())
    }

    // ========================================================================
    // user_file
    // ========================================================================

    pub fn list_user_files(&self) -> Result<Vec<UserFile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, path, is_folder FROM user_file ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(UserFile {
                id: row.get(0)?,
                path: row.get(1)?,
                is_folder: row.get(2)?,
            })
        })?;
        let mut files = Vec::new();
        for row in rows {
            files.push(row?);
        }
        Ok(files)
    }

    pub fn insert_user_file(&self, path: &str, is_folder: bool) -> Result<i32> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_file (path, is_folder) VALUES (?1, ?2)",
            params![path, is_folder],
        )?;
        Ok(conn.last_insert_rowid() as i32)
    }

    pub fn user_file_exists(&self, path: &str, is_folder: bool) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM user_file WHERE path = ?1 AND is_folder = ?2",
            params![path, is_folder],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn get_user_file_by_path(&self, path: &str, is_folder: bool) -> Result<Option<UserFile>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT id, path, is_folder FROM user_file WHERE path = ?1 AND is_folder = ?2",
            params![path, is_folder],
            |row| {
                Ok(UserFile {
                    id: row.get(0)?,
                    path: row.get(1)?,
                    is_folder: row.get(2)?,
                })
            },
        );
        match result {
            Ok(file) => Ok(Some(file)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_user_file(&self, id: i32) -> Result<UserFile> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, path, is_folder FROM user_file WHERE id = ?1",
            params![id],
            |row| {
                Ok(UserFile {
                    id: row.get(0)?,
                    path: row.get(1)?,
                    is_folder: row.get(2)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                AppError::NotFound(format!("user file {id} not found"))
            }
            other => other.into(),
        })
    }

    pub fn update_user_file_path(&self, id: i32, new_path: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE user_file SET path = ?1 WHERE id = ?2",
            params![new_path, id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("user file {id} not found")));
        }
        Ok(())
    }

    pub fn delete_user_file(&self, id: i32) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM user_file WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// 返回 `path` 下的全部后代记录（文件与文件夹）
    pub fn get_folder_descendants(&self, path: &str) -> Result<Vec<UserFile>> {
        let conn = self.conn.lock().unwrap();
        let prefix = format!("{path}/%");
        let mut stmt = conn
            .prepare("SELECT id, path, is_folder FROM user_file WHERE path LIKE ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![prefix], |row| {
            Ok(UserFile {
                id: row.get(0)?,
                path: row.get(1)?,
                is_folder: row.get(2)?,
            })
        })?;
        let mut files = Vec::new();
        for row in rows {
            files.push(row?);
        }
        Ok(files)
    }

    // ========================================================================
    // cell
    // ========================================================================

    pub fn insert_cell(
        &self,
        file_id: i32,
        content: &str,
        cell_type: CellType,
        index: i32,
    ) -> Result<i32> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO cell (file_id, content, cell_type, idx) VALUES (?1, ?2, ?3, ?4)",
            params![file_id, content, cell_type.as_str(), index],
        )?;
        Ok(conn.last_insert_rowid() as i32)
    }

    pub fn get_cell(&self, id: i32) -> Result<Cell> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, file_id, content, cell_type, idx FROM cell WHERE id = ?1",
            params![id],
            map_cell_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                AppError::NotFound(format!("cell {id} not found"))
            }
            other => other.into(),
        })
    }

    pub fn delete_cell(&self, id: i32) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM repetition WHERE cell_id = ?1", params![id])?;
        conn.execute("DELETE FROM cell WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn get_file_cells(&self, file_id: i32) -> Result<Vec<Cell>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, file_id, content, cell_type, idx FROM cell
             WHERE file_id = ?1 ORDER BY idx",
        )?;
        let rows = stmt.query_map(params![file_id], map_cell_row)?;
        let mut cells = Vec::new();
        for row in rows {
            cells.push(row?);
        }
        Ok(cells)
    }

    /// 将 `file_id` 内 idx >= start_index 的单元格序号整体平移
    pub fn shift_cell_indices(&self, file_id: i32, start_index: i32, delta: i32) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE cell SET idx = idx + ?1 WHERE file_id = ?2 AND idx >= ?3",
            params![delta, file_id, start_index],
        )?;
        Ok(())
    }

    pub fn update_cell_content(&self, id: i32, content: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE cell SET content = ?1 WHERE id = ?2",
            params![content, id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("cell {id} not found")));
        }
        Ok(())
    }

    pub fn update_cell_index(&self, id: i32, index: i32) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("UPDATE cell SET idx = ?1 WHERE id = ?2", params![index, id])?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("cell {id} not found")));
        }
        Ok(())
    }

    // ========================================================================
    // repetition
    // ========================================================================

    /// 为单元格补建一条全新（New 状态）的复习记录
    pub fn insert_repetition(
        &self,
        file_id: i32,
        cell_id: i32,
        additional_content: &str,
        now: DateTime<Utc>,
    ) -> Result<i32> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO repetition (file_id, cell_id, due, last_review, additional_content)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![file_id, cell_id, now, now, additional_content],
        )?;
        Ok(conn.last_insert_rowid() as i32)
    }

    pub fn get_repetitions_by_cell(&self, cell_id: i32) -> Result<Vec<Repetition>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "{REPETITION_SELECT} WHERE cell_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![cell_id], map_repetition_row)?;
        let mut repetitions = Vec::new();
        for row in rows {
            repetitions.push(row?);
        }
        Ok(repetitions)
    }

    pub fn get_file_repetitions(&self, file_id: i32) -> Result<Vec<Repetition>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "{REPETITION_SELECT} WHERE file_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![file_id], map_repetition_row)?;
        let mut repetitions = Vec::new();
        for row in rows {
            repetitions.push(row?);
        }
        Ok(repetitions)
    }

    pub fn delete_repetition(&self, id: i32) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM repetition WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// 文件级分状态计数，树聚合的输入
    pub fn study_repetition_counts(&self, file_id: i32) -> Result<RepetitionCounts> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT state, COUNT(*) FROM repetition WHERE file_id = ?1 GROUP BY state",
        )?;
        let rows = stmt.query_map(params![file_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?))
        })?;
        let mut counts = RepetitionCounts::default();
        for row in rows {
            let (state, count) = row?;
            match RepetitionState::parse(&state)? {
                RepetitionState::New => counts.new = count,
                RepetitionState::Learning => counts.learning = count,
                RepetitionState::Relearning => counts.relearning = count,
                RepetitionState::Review => counts.review = count,
            }
        }
        Ok(counts)
    }

    pub fn update_repetition(&self, repetition: &Repetition) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE repetition SET
                file_id = ?1, cell_id = ?2, due = ?3, stability = ?4, difficulty = ?5,
                elapsed_days = ?6, scheduled_days = ?7, reps = ?8, lapses = ?9,
                state = ?10, last_review = ?11, additional_content = ?12
             WHERE id = ?13",
            params![
                repetition.file_id,
                repetition.cell_id,
                repetition.due,
                repetition.stability,
                repetition.difficulty,
                repetition.elapsed_days,
                repetition.scheduled_days,
                repetition.reps,
                repetition.lapses,
                repetition.state.as_str(),
                repetition.last_review,
                repetition.additional_content,
                repetition.id,
            ],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!(
                "repetition {} not found",
                repetition.id
            )));
        }
        Ok(())
    }

    // ========================================================================
    // review 日志与统计
    // ========================================================================

    /// 原子提交一次复习结果：更新复习记录并追加日志行
    ///
    /// 复习记录不存在时整个事务失败回滚，不会留下孤儿日志。
    pub fn register_review(
        &self,
        updated: &Repetition,
        rating: Grade,
        study_time: i32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE repetition SET
                file_id = ?1, cell_id = ?2, due = ?3, stability = ?4, difficulty = ?5,
                elapsed_days = ?6, scheduled_days = ?7, reps = ?8, lapses = ?9,
                state = ?10, last_review = ?11, additional_content = ?12
             WHERE id = ?13",
            params![
                updated.file_id,
                updated.cell_id,
                updated.due,
                updated.stability,
                updated.difficulty,
                updated.elapsed_days,
                updated.scheduled_days,
                updated.reps,
                updated.lapses,
                updated.state.as_str(),
                updated.last_review,
                updated.additional_content,
                updated.id,
            ],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!(
                "repetition {} not found",
                updated.id
            )));
        }
        tx.execute(
            "INSERT INTO review (cell_id, rating, study_time, date) VALUES (?1, ?2, ?3, ?4)",
            params![updated.cell_id, rating.as_str(), study_time, now],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn review_statistics_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ReviewStatistics> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(study_time), 0) FROM review
             WHERE date >= ?1 AND date <= ?2",
            params![start, end],
            |row| {
                Ok(ReviewStatistics {
                    number_of_reviews: row.get::<_, i64>(0)? as u64,
                    total_time: row.get(1)?,
                })
            },
        )
        .map_err(Into::into)
    }

    /// 按天统计历史复习量
    pub fn review_counts_by_day(&self) -> Result<Vec<(NaiveDate, i32)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT date(date), COUNT(*) FROM review GROUP BY date(date)")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, i32>(1)?))
        })?;
        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// 按天统计将到期的复习量
    pub fn due_counts_by_day(&self) -> Result<Vec<(NaiveDate, i32)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT date(due), COUNT(*) FROM repetition GROUP BY date(due)")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, i32>(1)?))
        })?;
        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }
}

const REPETITION_SELECT: &str = "SELECT id, file_id, cell_id, due, stability, difficulty,
        elapsed_days, scheduled_days, reps, lapses, state, last_review, additional_content
     FROM repetition";

fn map_cell_row(row: &Row<'_>) -> rusqlite::Result<Cell> {
    let cell_type: String = row.get(3)?;
    Ok(Cell {
        id: row.get(0)?,
        file_id: row.get(1)?,
        content: row.get(2)?,
        cell_type: CellType::parse(&cell_type).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        index: row.get(4)?,
    })
}

fn map_repetition_row(row: &Row<'_>) -> rusqlite::Result<Repetition> {
    let state: String = row.get(10)?;
    Ok(Repetition {
        id: row.get(0)?,
        file_id: row.get(1)?,
        cell_id: row.get(2)?,
        due: row.get(3)?,
        stability: row.get(4)?,
        difficulty: row.get(5)?,
        elapsed_days: row.get(6)?,
        scheduled_days: row.get(7)?,
        reps: row.get(8)?,
        lapses: row.get(9)?,
        state: RepetitionState::parse(&state).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
        })?,
        last_review: row.get(11)?,
        additional_content: row.get(12)?,
    })
}
