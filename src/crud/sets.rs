use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use tracing::info;

use crate::card::FlashcardSet;

use super::DB;

/// A deck saved by a user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedSet {
    pub id: i64,
    pub user_id: String,
    pub topic: String,
    pub cards: FlashcardSet,
    pub set_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A row of `flashgen history`; cards are not decoded.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct SavedSetSummary {
    pub id: i64,
    pub topic: String,
    pub card_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SavedSetRow {
    id: i64,
    user_id: String,
    topic: String,
    set_hash: String,
    cards: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SavedSetRow> for SavedSet {
    type Error = anyhow::Error;

    fn try_from(row: SavedSetRow) -> Result<Self> {
        let cards: FlashcardSet = serde_json::from_str(&row.cards)
            .with_context(|| format!("Stored cards for set {} are corrupt", row.id))?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            topic: row.topic,
            cards,
            set_hash: row.set_hash,
            created_at: row.created_at,
        })
    }
}

impl DB {
    /// Stores `cards` under `topic` for `user_id`, stamped with the current
    /// time. Returns the new set's id.
    pub async fn save_set(&self, user_id: &str, topic: &str, cards: &FlashcardSet) -> Result<i64> {
        if cards.is_empty() {
            bail!("Refusing to save an empty flashcard set");
        }

        let now = Utc::now().to_rfc3339();
        let set_hash = cards.content_hash();
        let serialized = serde_json::to_string(cards)?;

        let result = sqlx::query(
            r#"
            INSERT INTO flashcard_sets (user_id, topic, set_hash, cards, card_count, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(topic)
        .bind(&set_hash)
        .bind(&serialized)
        .bind(cards.len() as i64)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(id, topic, cards = cards.len(), "saved flashcard set");
        Ok(id)
    }

    /// Id of an earlier save of the same topic with identical cards.
    pub async fn find_duplicate(
        &self,
        user_id: &str,
        topic: &str,
        cards: &FlashcardSet,
    ) -> Result<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM flashcard_sets
            WHERE user_id = ? AND topic = ? AND set_hash = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(topic)
        .bind(cards.content_hash())
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    /// Most recent first.
    pub async fn list_sets(&self, user_id: &str, limit: u32) -> Result<Vec<SavedSetSummary>> {
        let mut rows = sqlx::query_as::<_, SavedSetSummary>(
            r#"
            SELECT id, topic, card_count, created_at
            FROM flashcard_sets
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch(&self.pool);

        let mut summaries = Vec::new();
        while let Some(row) = rows.try_next().await? {
            summaries.push(row);
        }
        Ok(summaries)
    }

    pub async fn get_set(&self, user_id: &str, id: i64) -> Result<Option<SavedSet>> {
        let row = sqlx::query_as::<_, SavedSetRow>(
            r#"
            SELECT id, user_id, topic, set_hash, cards, created_at
            FROM flashcard_sets
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SavedSet::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Flashcard;

    fn deck(pairs: &[(&str, &str)]) -> FlashcardSet {
        FlashcardSet::new(
            pairs
                .iter()
                .map(|(q, a)| Flashcard::new(q, a).unwrap())
                .collect(),
        )
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let db = DB::new_in_memory().await.unwrap();
        let cards = deck(&[("When did WWII end?", "1945"), ("Who led the UK?", "Churchill")]);

        let before = Utc::now();
        let id = db.save_set("user_1", "World War II", &cards).await.unwrap();
        let saved = db.get_set("user_1", id).await.unwrap().unwrap();

        assert_eq!(saved.id, id);
        assert_eq!(saved.topic, "World War II");
        assert_eq!(saved.cards, cards);
        assert_eq!(saved.set_hash, cards.content_hash());
        assert!(saved.created_at >= before - chrono::Duration::seconds(1));
    }

    #[tokio::test]
    async fn sets_are_scoped_to_user() {
        let db = DB::new_in_memory().await.unwrap();
        let id = db
            .save_set("alice", "Rust", &deck(&[("Q", "A")]))
            .await
            .unwrap();

        assert!(db.get_set("bob", id).await.unwrap().is_none());
        assert!(db.list_sets("bob", 10).await.unwrap().is_empty());
        assert_eq!(db.list_sets("alice", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_limited() {
        let db = DB::new_in_memory().await.unwrap();
        for topic in ["one", "two", "three"] {
            db.save_set("u", topic, &deck(&[(topic, "A")])).await.unwrap();
        }

        let listed = db.list_sets("u", 2).await.unwrap();
        let topics: Vec<_> = listed.iter().map(|s| s.topic.as_str()).collect();
        assert_eq!(topics, vec!["three", "two"]);
        assert_eq!(listed[0].card_count, 1);
    }

    #[tokio::test]
    async fn empty_set_is_not_saved() {
        let db = DB::new_in_memory().await.unwrap();
        assert!(db.save_set("u", "t", &FlashcardSet::default()).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_detection() {
        let db = DB::new_in_memory().await.unwrap();
        let cards = deck(&[("Q", "A")]);
        assert_eq!(db.find_duplicate("u", "t", &cards).await.unwrap(), None);

        let id = db.save_set("u", "t", &cards).await.unwrap();
        let same_but_shouted = deck(&[("q", "a")]);
        assert_eq!(
            db.find_duplicate("u", "t", &same_but_shouted).await.unwrap(),
            Some(id)
        );
        assert_eq!(db.find_duplicate("u", "other", &cards).await.unwrap(), None);
    }
}
