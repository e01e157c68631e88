//! 复习提交与统计服务
//!
//! `SqliteReviewStore` 把会话引擎的持久化口接到 SQLite：更新
//! 记录与追加复习日志在同一事务里完成。统计口按本地日界换算
//! UTC 区间。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveTime, Utc};
use tracing::info;

use crate::database::Database;
use crate::error::Result;
use crate::models::{Grade, HomeStatistics, Repetition, ReviewStatistics};
use crate::review::session::ReviewStore;

/// 更新复习记录并写入一条复习日志，二者原子生效
pub async fn register_review(
    db: &Database,
    updated: &Repetition,
    rating: Grade,
    study_time: i32,
) -> Result<()> {
    db.register_review(updated, rating, study_time, Utc::now())?;
    info!(
        "[ReviewService] register_review: repetition {} rated {:?}",
        updated.id,
        rating
    );
    Ok(())
}

/// 今日（UTC 日界）的复习次数与总耗时
pub async fn get_todays_review_statistics(db: &Database) -> Result<ReviewStatistics> {
    let today = Utc::now().date_naive();
    let start = today.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1) - Duration::nanoseconds(1);
    db.review_statistics_between(start, end)
}

/// 首页统计：今日数据加按天的历史复习量与到期量
pub async fn get_home_statistics(db: &Database) -> Result<HomeStatistics> {
    let today = get_todays_review_statistics(db).await?;
    let review_counts = db.review_counts_by_day()?.into_iter().collect();
    let due_counts = db.due_counts_by_day()?.into_iter().collect();
    Ok(HomeStatistics {
        number_of_reviews: today.number_of_reviews,
        total_time: today.total_time,
        review_counts,
        due_counts,
    })
}

/// 会话引擎的 SQLite 落盘实现
pub struct SqliteReviewStore {
    db: Arc<Database>,
}

impl SqliteReviewStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn persist_review(
        &self,
        updated: &Repetition,
        rating: Grade,
        study_time: i32,
    ) -> Result<()> {
        register_review(&self.db, updated, rating, study_time).await
    }
}

#[cfg(test)]
mod tests {
    use crate::cell_service;
    use crate::error::AppError;
    use crate::file_service;
    use crate::models::{CellType, RepetitionState};

    use super::*;

    async fn seeded_repetition(db: &Database) -> Repetition {
        let file_id = file_service::create_file(db, "f").await.unwrap();
        let cell_id = cell_service::create_cell(db, file_id, "Q", CellType::FlashCard, 0)
            .await
            .unwrap();
        db.get_repetitions_by_cell(cell_id).unwrap().remove(0)
    }

    #[tokio::test]
    async fn test_register_review_updates_and_logs() {
        let db = Database::new_in_memory().unwrap();
        let mut repetition = seeded_repetition(&db).await;
        repetition.reps = 1;
        repetition.state = RepetitionState::Learning;
        repetition.last_review = Utc::now();

        register_review(&db, &repetition, Grade::Good, 4200)
            .await
            .unwrap();

        let stored = db
            .get_repetitions_by_cell(repetition.cell_id)
            .unwrap()
            .remove(0);
        assert_eq!(stored.reps, 1);
        assert_eq!(stored.state, RepetitionState::Learning);

        let stats = get_todays_review_statistics(&db).await.unwrap();
        assert_eq!(stats.number_of_reviews, 1);
        assert_eq!(stats.total_time, 4200);
    }

    #[tokio::test]
    async fn test_register_review_unknown_repetition() {
        let db = Database::new_in_memory().unwrap();
        let mut repetition = seeded_repetition(&db).await;
        repetition.id = 9999;

        let err = register_review(&db, &repetition, Grade::Good, 100)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let stats = get_todays_review_statistics(&db).await.unwrap();
        assert_eq!(stats.number_of_reviews, 0);
    }

    #[tokio::test]
    async fn test_home_statistics_aggregates_by_day() {
        let db = Database::new_in_memory().unwrap();
        let repetition = seeded_repetition(&db).await;

        register_review(&db, &repetition, Grade::Good, 1000)
            .await
            .unwrap();
        register_review(&db, &repetition, Grade::Easy, 2000)
            .await
            .unwrap();

        let home = get_home_statistics(&db).await.unwrap();
        assert_eq!(home.number_of_reviews, 2);
        assert_eq!(home.total_time, 3000);
        let today = Utc::now().date_naive();
        assert_eq!(home.review_counts.get(&today), Some(&2));
        assert_eq!(home.due_counts.values().sum::<i32>(), 1);
    }

    #[tokio::test]
    async fn test_store_persists_through_trait() {
        let db = Arc::new(Database::new_in_memory().unwrap());
        let repetition = seeded_repetition(&db).await;
        let store = SqliteReviewStore::new(Arc::clone(&db));

        store
            .persist_review(&repetition, Grade::Again, 500)
            .await
            .unwrap();

        let stats = get_todays_review_statistics(&db).await.unwrap();
        assert_eq!(stats.number_of_reviews, 1);
    }
}
