//! 复习调度子系统
//!
//! 会话引擎在冻结的到期集合上推进游标，把持久化的复习记录映射成
//! 调度器（oracle）的瞬态卡片表示，并把选中评分对应的结果写回。
//! 间隔/稳定度公式本身是外部可替换依赖，这里从不计算。
//!
//! ## 模块结构
//! - `oracle` - 调度器边界（`SchedulingOracle` 与卡片类型）
//! - `adapter` - 复习记录 ↔ 卡片的双向映射
//! - `cloze` - 填空单元格的空位提取
//! - `session` - 复习会话状态机

pub mod adapter;
pub mod cloze;
pub mod oracle;
pub mod session;

pub use oracle::{CardState, FixedIntervalOracle, OracleCard, SchedulingOracle, SchedulingOutcomes};
pub use session::{RemainingCounts, ReviewSession, ReviewStore, SubmitOutcome};
