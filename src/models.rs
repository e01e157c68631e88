//! 核心数据模型
//!
//! 定义文件目录、单元格（cell）、复习记录（repetition）与复习日志相关的
//! 数据结构。所有对外可见结构统一使用 camelCase 序列化。

use std::collections::HashMap;
use std::ops::{Add, AddAssign};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ============================================================================
// 复习状态计数
// ============================================================================

/// 按复习状态分桶的计数（单个文件或聚合后的文件夹）
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepetitionCounts {
    pub new: i32,
    pub learning: i32,
    pub relearning: i32,
    pub review: i32,
}

impl Add for RepetitionCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            new: self.new + other.new,
            learning: self.learning + other.learning,
            relearning: self.relearning + other.relearning,
            review: self.review + other.review,
        }
    }
}

impl AddAssign for RepetitionCounts {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

// ============================================================================
// 文件目录实体
// ============================================================================

/// user_file 表记录：以 `/` 分隔的路径寻址文件或文件夹
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFile {
    pub id: i32,
    pub path: String,
    pub is_folder: bool,
}

/// 扁平实体 + 文件级复习计数，树构建器的输入
///
/// 文件夹记录不携带计数（`None`），文件级计数由上游
/// `repetition_service::get_study_repetition_counts` 提供。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: i32,
    pub path: String,
    pub is_folder: bool,
    pub repetition_counts: Option<RepetitionCounts>,
}

// ============================================================================
// 单元格
// ============================================================================

/// 单元格类型
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    FlashCard,
    Note,
    Cloze,
    TrueFalse,
}

impl CellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashCard => "FlashCard",
            Self::Note => "Note",
            Self::Cloze => "Cloze",
            Self::TrueFalse => "TrueFalse",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "FlashCard" => Ok(Self::FlashCard),
            "Note" => Ok(Self::Note),
            "Cloze" => Ok(Self::Cloze),
            "TrueFalse" => Ok(Self::TrueFalse),
            other => Err(AppError::InvalidArgument(format!(
                "unknown cell type: {other}"
            ))),
        }
    }
}

/// 文件内的一个内容单元
///
/// `index` 为文件内顺序，必须保持从 0 开始的稠密连续序列，
/// 由 cell_service 的插入/删除/移动操作维护。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub id: i32,
    pub file_id: i32,
    pub content: String,
    pub cell_type: CellType,
    pub index: i32,
}

/// FlashCard 单元格的内容载荷（content 字段内的 JSON）
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashCard {
    pub question: String,
    pub answer: String,
}

/// TrueFalse 单元格的内容载荷
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrueFalse {
    pub question: String,
    pub is_true: bool,
}

// ============================================================================
// 复习记录
// ============================================================================

/// 复习记录的调度状态
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepetitionState {
    #[default]
    New,
    Learning,
    Relearning,
    Review,
}

impl RepetitionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Learning => "Learning",
            Self::Relearning => "Relearning",
            Self::Review => "Review",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "New" => Ok(Self::New),
            "Learning" => Ok(Self::Learning),
            "Relearning" => Ok(Self::Relearning),
            "Review" => Ok(Self::Review),
            other => Err(AppError::InvalidArgument(format!(
                "unknown repetition state: {other}"
            ))),
        }
    }
}

/// 单元格级的持久化调度记录
///
/// 一个单元格可以拥有多条记录（如 Cloze 的每个空位一条），
/// 由 `additional_content` 区分；该字段对调度器不透明。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repetition {
    pub id: i32,
    pub file_id: i32,
    pub cell_id: i32,
    pub due: DateTime<Utc>,
    pub stability: f32,
    pub difficulty: f32,
    pub elapsed_days: i32,
    pub scheduled_days: i32,
    pub reps: i32,
    pub lapses: i32,
    pub state: RepetitionState,
    pub last_review: DateTime<Utc>,
    pub additional_content: String,
}

// ============================================================================
// 评分与统计
// ============================================================================

/// 复习评分（用户在看到答案后的四选一）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Again => "Again",
            Self::Hard => "Hard",
            Self::Good => "Good",
            Self::Easy => "Easy",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "Again" => Ok(Self::Again),
            "Hard" => Ok(Self::Hard),
            "Good" => Ok(Self::Good),
            "Easy" => Ok(Self::Easy),
            other => Err(AppError::InvalidArgument(format!("unknown grade: {other}"))),
        }
    }
}

/// 当日复习统计
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStatistics {
    pub number_of_reviews: u64,
    pub total_time: i32,
}

/// 首页统计：当日数据 + 按天分布的历史复习量与未来到期量
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeStatistics {
    pub number_of_reviews: u64,
    pub total_time: i32,
    pub review_counts: HashMap<NaiveDate, i32>,
    pub due_counts: HashMap<NaiveDate, i32>,
}
