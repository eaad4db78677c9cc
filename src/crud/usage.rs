use anyhow::Result;
use chrono::{DateTime, NaiveTime, Utc};

use crate::pipeline::CardSource;

use super::DB;

impl DB {
    pub async fn record_generation(
        &self,
        user_id: &str,
        topic: &str,
        source: &CardSource,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO generations (user_id, topic, source, generated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(topic)
        .bind(source.label())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn generations_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<u32> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(1) FROM generations WHERE user_id = ? AND generated_at >= ?"#,
        )
        .bind(user_id)
        .bind(since.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    pub async fn generations_today(&self, user_id: &str) -> Result<u32> {
        self.generations_since(user_id, start_of_day(Utc::now())).await
    }
}

pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}
