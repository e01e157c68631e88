//! 复习记录 ↔ 调度卡片的双向映射
//!
//! 枚举与状态转换只发生在这一处。映射是全函数：四个状态一一对应，
//! 数值与时间戳字段原样搬运，不丢弃、不静默取默认值。对任意合法
//! 记录 r，`from_oracle_card(to_oracle_card(r), r.id, ...) == r`。

use crate::models::{Repetition, RepetitionState};

use super::oracle::{CardState, OracleCard};

/// 持久化记录 → 调度器卡片
pub fn to_oracle_card(repetition: &Repetition) -> OracleCard {
    OracleCard {
        due: repetition.due,
        stability: repetition.stability,
        difficulty: repetition.difficulty,
        elapsed_days: repetition.elapsed_days,
        scheduled_days: repetition.scheduled_days,
        reps: repetition.reps,
        lapses: repetition.lapses,
        state: match repetition.state {
            RepetitionState::New => CardState::New,
            RepetitionState::Learning => CardState::Learning,
            RepetitionState::Relearning => CardState::Relearning,
            RepetitionState::Review => CardState::Review,
        },
        last_review: repetition.last_review,
    }
}

/// 调度器卡片 → 持久化记录（身份字段由调用方补齐）
pub fn from_oracle_card(
    card: OracleCard,
    id: i32,
    file_id: i32,
    cell_id: i32,
    additional_content: String,
) -> Repetition {
    Repetition {
        id,
        file_id,
        cell_id,
        due: card.due,
        stability: card.stability,
        difficulty: card.difficulty,
        elapsed_days: card.elapsed_days,
        scheduled_days: card.scheduled_days,
        reps: card.reps,
        lapses: card.lapses,
        state: match card.state {
            CardState::New => RepetitionState::New,
            CardState::Learning => RepetitionState::Learning,
            CardState::Relearning => RepetitionState::Relearning,
            CardState::Review => RepetitionState::Review,
        },
        last_review: card.last_review,
        additional_content,
    }
}
