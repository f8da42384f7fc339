//! Topic repository for Boards.

use super::topic::{NewTopic, Topic, TopicSummary};
use crate::db::DbPool;
use crate::{BoardsError, Result};

/// Repository for topic CRUD operations.
pub struct TopicRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> TopicRepository<'a> {
    /// Create a new TopicRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new topic in the database.
    pub async fn create(&self, new_topic: &NewTopic) -> Result<Topic> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO topics (subject, board_id, starter_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&new_topic.subject)
        .bind(new_topic.board_id)
        .bind(new_topic.starter_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| BoardsError::NotFound("topic".to_string()))
    }

    /// Get a topic by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Topic>> {
        let result = sqlx::query_as::<_, Topic>(
            "SELECT id, subject, board_id, starter_id, views, last_updated
             FROM topics WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get a topic only if it belongs to the given board.
    pub async fn get_in_board(&self, board_id: i64, topic_id: i64) -> Result<Option<Topic>> {
        let result = sqlx::query_as::<_, Topic>(
            "SELECT id, subject, board_id, starter_id, views, last_updated
             FROM topics WHERE id = ? AND board_id = ?",
        )
        .bind(topic_id)
        .bind(board_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(result)
    }

    /// List topics of a board, most recently active first.
    pub async fn list_by_board_paginated(
        &self,
        board_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TopicSummary>> {
        let topics = sqlx::query_as::<_, TopicSummary>(
            "SELECT t.id, t.subject, t.board_id, t.starter_id, t.views, t.last_updated,
                    u.username AS starter_username,
                    MAX((SELECT COUNT(*) FROM posts p WHERE p.topic_id = t.id) - 1, 0) AS replies
             FROM topics t JOIN users u ON u.id = t.starter_id
             WHERE t.board_id = ?
             ORDER BY t.last_updated DESC, t.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(board_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(topics)
    }

    /// Count topics in a board.
    pub async fn count_by_board(&self, board_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM topics WHERE board_id = ?")
            .bind(board_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;
        Ok(count.0)
    }

    /// Add one to the view counter.
    pub async fn increment_views(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE topics SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a topic and its posts.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM topics WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardRepository, NewBoard, NewPost, PostRepository};
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    async fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let board = BoardRepository::new(db.pool())
            .create(&NewBoard::new("Django", ""))
            .await
            .unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("john", "john@doe.com", "pw"))
            .await
            .unwrap();
        (db, board.id, user.id)
    }

    #[tokio::test]
    async fn test_create_topic() {
        let (db, board_id, user_id) = setup().await;
        let repo = TopicRepository::new(db.pool());

        let topic = repo
            .create(&NewTopic::new(board_id, "Hello", user_id))
            .await
            .unwrap();
        assert_eq!(topic.subject, "Hello");
        assert_eq!(topic.views, 0);
        assert_eq!(topic.board_id, board_id);
    }

    #[tokio::test]
    async fn test_get_in_board() {
        let (db, board_id, user_id) = setup().await;
        let other = BoardRepository::new(db.pool())
            .create(&NewBoard::new("Other", ""))
            .await
            .unwrap();
        let repo = TopicRepository::new(db.pool());
        let topic = repo
            .create(&NewTopic::new(board_id, "Hello", user_id))
            .await
            .unwrap();

        assert!(repo.get_in_board(board_id, topic.id).await.unwrap().is_some());
        assert!(repo.get_in_board(other.id, topic.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let (db, board_id, user_id) = setup().await;
        let repo = TopicRepository::new(db.pool());
        let posts = PostRepository::new(db.pool());

        for i in 0..3 {
            let topic = repo
                .create(&NewTopic::new(board_id, format!("Topic {i}"), user_id))
                .await
                .unwrap();
            posts.create(&NewPost::new(topic.id, user_id, "first")).await.unwrap();
        }

        assert_eq!(repo.count_by_board(board_id).await.unwrap(), 3);
        let page = repo.list_by_board_paginated(board_id, 0, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].subject, "Topic 2");
        assert_eq!(page[0].starter_username, "john");
        assert_eq!(page[0].replies, 0);

        let rest = repo.list_by_board_paginated(board_id, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
    }

    #[tokio::test]
    async fn test_increment_views() {
        let (db, board_id, user_id) = setup().await;
        let repo = TopicRepository::new(db.pool());
        let topic = repo
            .create(&NewTopic::new(board_id, "Hello", user_id))
            .await
            .unwrap();

        repo.increment_views(topic.id).await.unwrap();
        repo.increment_views(topic.id).await.unwrap();
        assert_eq!(repo.get_by_id(topic.id).await.unwrap().unwrap().views, 2);
    }
}
