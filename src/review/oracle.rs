//! 调度器边界
//!
//! `SchedulingOracle` 对一张卡片给出四种评分各自的完整下一状态，
//! 引擎只取用户选中的那个。真实实现（FSRS 一类的公式）在库外；
//! 本模块只固定契约，并提供一个确定性的固定步长实现供测试与
//! 离线场景使用。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Grade;

/// 卡片在调度器侧的状态
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardState {
    #[default]
    New,
    Learning,
    Relearning,
    Review,
}

/// 调度器的瞬态卡片表示
///
/// 字段与持久化的复习记录一一对应（身份字段除外）；两者之间的
/// 转换只发生在 `review::adapter`。
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleCard {
    pub due: DateTime<Utc>,
    pub stability: f32,
    pub difficulty: f32,
    pub elapsed_days: i32,
    pub scheduled_days: i32,
    pub reps: i32,
    pub lapses: i32,
    pub state: CardState,
    pub last_review: DateTime<Utc>,
}

/// 四种评分各自的完整下一状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingOutcomes {
    pub again: OracleCard,
    pub hard: OracleCard,
    pub good: OracleCard,
    pub easy: OracleCard,
}

impl SchedulingOutcomes {
    pub fn for_grade(&self, grade: Grade) -> &OracleCard {
        match grade {
            Grade::Again => &self.again,
            Grade::Hard => &self.hard,
            Grade::Good => &self.good,
            Grade::Easy => &self.easy,
        }
    }
}

/// 外部可替换的调度算法
pub trait SchedulingOracle: Send + Sync {
    /// 以 `now` 为当前时刻对 `card` 做一次调度，返回四个候选结果
    fn schedule(&self, card: &OracleCard, now: DateTime<Utc>) -> Result<SchedulingOutcomes>;
}

/// 固定步长调度器
///
/// Again 十分钟后重来，Hard/Good/Easy 按既定天数递增。没有任何
/// 稳定度/难度数学，只用于测试和无真实调度器的降级场景。
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedIntervalOracle;

impl FixedIntervalOracle {
    fn outcome(card: &OracleCard, now: DateTime<Utc>, grade: Grade) -> OracleCard {
        let (state, interval, lapse) = match grade {
            Grade::Again => (CardState::Relearning, Duration::minutes(10), true),
            Grade::Hard => (CardState::Review, Duration::days(1), false),
            Grade::Good => (CardState::Review, Duration::days(3), false),
            Grade::Easy => (CardState::Review, Duration::days(7), false),
        };
        let state = match (card.state, state) {
            // 首次遇到的卡片先进入学习阶段
            (CardState::New, CardState::Relearning) => CardState::Learning,
            (_, next) => next,
        };
        OracleCard {
            due: now + interval,
            stability: card.stability,
            difficulty: card.difficulty,
            elapsed_days: (now - card.last_review).num_days().max(0) as i32,
            scheduled_days: interval.num_days() as i32,
            reps: card.reps + 1,
            lapses: card.lapses + i32::from(lapse),
            state,
            last_review: now,
        }
    }
}

impl SchedulingOracle for FixedIntervalOracle {
    fn schedule(&self, card: &OracleCard, now: DateTime<Utc>) -> Result<SchedulingOutcomes> {
        Ok(SchedulingOutcomes {
            again: Self::outcome(card, now, Grade::Again),
            hard: Self::outcome(card, now, Grade::Hard),
            good: Self::outcome(card, now, Grade::Good),
            easy: Self::outcome(card, now, Grade::Easy),
        })
    }
}
