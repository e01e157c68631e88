//! 复习会话状态机
//!
//! 会话构造时对候选记录做一次到期筛选（`due <= T0`），此后集合与
//! 顺序全程冻结：会话中途到期的记录不会加入，已评分的记录也不从
//! 集合移除，引擎只推进游标。每次评分提交走
//! 适配器 → 调度器 → 持久化 三步；持久化失败时游标停在原地，错误
//! 原样上抛，用户可重试。提交是单飞的：前一次还在途时的并发提交
//! 被丢弃而不是排队（见 DESIGN.md 的取舍记录）。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{Grade, Repetition, RepetitionState};

use super::adapter;
use super::oracle::SchedulingOracle;

/// 评分结果的持久化协作方（单一写路径）
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn persist_review(
        &self,
        updated: &Repetition,
        rating: Grade,
        study_time: i32,
    ) -> Result<()>;
}

/// 一次提交的结局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 已提交并推进到下一条
    Advanced,
    /// 已提交且会话就此结束
    Finished,
    /// 上一次提交还在途，本次被丢弃
    InFlight,
    /// 会话早已结束，本次为空操作
    Ended,
}

/// 当前及之后条目的分桶剩余量（展示用，每次推进后重算）
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RemainingCounts {
    pub new: i32,
    pub learning: i32,
    pub review: i32,
}

pub struct ReviewSession {
    due_today: Vec<Repetition>,
    started_at: DateTime<Utc>,
    cursor: Mutex<usize>,
    item_started_at: Mutex<DateTime<Utc>>,
    in_flight: AtomicBool,
    oracle: Arc<dyn SchedulingOracle>,
    store: Arc<dyn ReviewStore>,
}

impl ReviewSession {
    /// 以 `started_at` 为 T0 冻结到期集合并开始会话
    ///
    /// 到期集合为空时会话直接处于结束态，调用方据此退出而不展示卡片。
    pub fn new(
        candidates: Vec<Repetition>,
        started_at: DateTime<Utc>,
        oracle: Arc<dyn SchedulingOracle>,
        store: Arc<dyn ReviewStore>,
    ) -> Self {
        let due_today: Vec<Repetition> = candidates
            .into_iter()
            .filter(|r| r.due <= started_at)
            .collect();
        debug!(
            "[ReviewSession] new: {} item(s) due at session start",
            due_today.len()
        );
        Self {
            due_today,
            started_at,
            cursor: Mutex::new(0),
            item_started_at: Mutex::new(started_at),
            in_flight: AtomicBool::new(false),
            oracle,
            store,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// 当前条目的开始时刻（不同于 T0，每次推进后重置）
    pub fn item_started_at(&self) -> DateTime<Utc> {
        *self.item_started_at.lock().unwrap()
    }

    /// 冻结的到期集合（顺序即会话顺序）
    pub fn due_items(&self) -> &[Repetition] {
        &self.due_today
    }

    pub fn due_count(&self) -> usize {
        self.due_today.len()
    }

    /// 游标位置；等于集合长度表示已结束
    pub fn position(&self) -> usize {
        *self.cursor.lock().unwrap()
    }

    pub fn is_ended(&self) -> bool {
        self.position() >= self.due_today.len()
    }

    pub fn current(&self) -> Option<&Repetition> {
        self.due_today.get(self.position())
    }

    pub fn is_current_new(&self) -> bool {
        matches!(self.current().map(|r| r.state), Some(RepetitionState::New))
    }

    pub fn is_current_learning(&self) -> bool {
        matches!(
            self.current().map(|r| r.state),
            Some(RepetitionState::Learning) | Some(RepetitionState::Relearning)
        )
    }

    pub fn is_current_review(&self) -> bool {
        matches!(
            self.current().map(|r| r.state),
            Some(RepetitionState::Review)
        )
    }

    /// 从当前条目起按展示桶统计剩余量
    pub fn remaining_counts(&self) -> RemainingCounts {
        let mut counts = RemainingCounts::default();
        for repetition in &self.due_today[self.position()..] {
            match repetition.state {
                RepetitionState::New => counts.new += 1,
                RepetitionState::Learning | RepetitionState::Relearning => counts.learning += 1,
                RepetitionState::Review => counts.review += 1,
            }
        }
        counts
    }

    /// 提交当前条目的评分
    ///
    /// `study_time` 为该条目的学习秒数，随日志落库。
    pub async fn submit_grade(&self, grade: Grade, study_time: i32) -> Result<SubmitOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("[ReviewSession] submit_grade: previous submission still in flight, dropping");
            return Ok(SubmitOutcome::InFlight);
        }
        let result = self.submit_guarded(grade, study_time).await;
        self.in_flight.store(false, Ordering::Release);
        result
    }

    async fn submit_guarded(&self, grade: Grade, study_time: i32) -> Result<SubmitOutcome> {
        let index = self.position();
        if index >= self.due_today.len() {
            return Ok(SubmitOutcome::Ended);
        }
        let current = &self.due_today[index];

        // 调度以提交时刻的墙钟为准，不复用 T0
        let now = Utc::now();
        let card = adapter::to_oracle_card(current);
        let outcomes = self.oracle.schedule(&card, now)?;
        let chosen = outcomes.for_grade(grade).clone();
        let updated = adapter::from_oracle_card(
            chosen,
            current.id,
            current.file_id,
            current.cell_id,
            current.additional_content.clone(),
        );

        // 失败时不推进游标，错误上抛供重试
        self.store.persist_review(&updated, grade, study_time).await?;

        let mut cursor = self.cursor.lock().unwrap();
        *cursor += 1;
        if *cursor == self.due_today.len() {
            debug!("[ReviewSession] submit_grade: session finished");
            Ok(SubmitOutcome::Finished)
        } else {
            *self.item_started_at.lock().unwrap() = Utc::now();
            Ok(SubmitOutcome::Advanced)
        }
    }
}
