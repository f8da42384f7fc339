//! Post repository for Boards.
//!
//! This module provides CRUD operations for posts in the database.

use super::post::{NewPost, Post, PostView};
use crate::db::DbPool;
use crate::{BoardsError, Result};

const POST_COLUMNS: &str = "id, message, topic_id, created_by, created_at, updated_by, updated_at";

/// Repository for post CRUD operations.
pub struct PostRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new PostRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post.
    ///
    /// Returns the created post with the assigned ID.
    pub async fn create(&self, new_post: &NewPost) -> Result<Post> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (message, topic_id, created_by) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&new_post.message)
        .bind(new_post.topic_id)
        .bind(new_post.created_by)
        .fetch_one(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| BoardsError::NotFound("post".to_string()))
    }

    /// Get a post by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?");
        let result = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get a post only if it belongs to the given topic of the given board.
    pub async fn get_in_topic(
        &self,
        board_id: i64,
        topic_id: i64,
        post_id: i64,
    ) -> Result<Option<Post>> {
        let result = sqlx::query_as::<_, Post>(
            "SELECT p.id, p.message, p.topic_id, p.created_by, p.created_at,
                    p.updated_by, p.updated_at
             FROM posts p JOIN topics t ON t.id = p.topic_id
             WHERE p.id = ? AND p.topic_id = ? AND t.board_id = ?",
        )
        .bind(post_id)
        .bind(topic_id)
        .bind(board_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(result)
    }

    /// List posts of a topic in creation order, with author details.
    pub async fn list_by_topic_paginated(
        &self,
        topic_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostView>> {
        let posts = sqlx::query_as::<_, PostView>(
            "SELECT p.id, p.message, p.topic_id, p.created_by, p.created_at,
                    p.updated_by, p.updated_at,
                    u.username AS author_username,
                    (SELECT COUNT(*) FROM posts x WHERE x.created_by = p.created_by) AS author_posts
             FROM posts p JOIN users u ON u.id = p.created_by
             WHERE p.topic_id = ?
             ORDER BY p.created_at ASC, p.id ASC
             LIMIT ? OFFSET ?",
        )
        .bind(topic_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(posts)
    }

    /// Count posts in a topic.
    pub async fn count_by_topic(&self, topic_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE topic_id = ?")
            .bind(topic_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;
        Ok(count.0)
    }

    /// Replace a post's message and record who edited it.
    ///
    /// Returns the updated post, or None if not found.
    pub async fn update_message(
        &self,
        id: i64,
        message: &str,
        updated_by: i64,
    ) -> Result<Option<Post>> {
        let result = sqlx::query(
            "UPDATE posts SET message = ?, updated_by = ?, updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(message)
        .bind(updated_by)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete a post by ID.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
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
    use crate::board::{BoardRepository, NewBoard, NewTopic, TopicRepository};
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    struct Fixture {
        db: Database,
        board_id: i64,
        topic_id: i64,
        user_id: i64,
    }

    async fn setup() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let board = BoardRepository::new(db.pool())
            .create(&NewBoard::new("Django", ""))
            .await
            .unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("john", "john@doe.com", "pw"))
            .await
            .unwrap();
        let topic = TopicRepository::new(db.pool())
            .create(&NewTopic::new(board.id, "Hello", user.id))
            .await
            .unwrap();
        Fixture {
            db,
            board_id: board.id,
            topic_id: topic.id,
            user_id: user.id,
        }
    }

    #[tokio::test]
    async fn test_create_post() {
        let fx = setup().await;
        let repo = PostRepository::new(fx.db.pool());

        let post = repo
            .create(&NewPost::new(fx.topic_id, fx.user_id, "Lorem ipsum"))
            .await
            .unwrap();
        assert_eq!(post.message, "Lorem ipsum");
        assert_eq!(post.created_by, fx.user_id);
        assert!(post.updated_by.is_none());
        assert!(!post.is_edited());
    }

    #[tokio::test]
    async fn test_get_in_topic_requires_full_match() {
        let fx = setup().await;
        let repo = PostRepository::new(fx.db.pool());
        let post = repo
            .create(&NewPost::new(fx.topic_id, fx.user_id, "Lorem ipsum"))
            .await
            .unwrap();

        assert!(repo
            .get_in_topic(fx.board_id, fx.topic_id, post.id)
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .get_in_topic(fx.board_id + 1, fx.topic_id, post.id)
            .await
            .unwrap()
            .is_none());
        assert!(repo
            .get_in_topic(fx.board_id, fx.topic_id + 1, post.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_by_topic() {
        let fx = setup().await;
        let repo = PostRepository::new(fx.db.pool());
        for i in 0..3 {
            repo.create(&NewPost::new(fx.topic_id, fx.user_id, format!("post {i}")))
                .await
                .unwrap();
        }

        let posts = repo
            .list_by_topic_paginated(fx.topic_id, 0, 10)
            .await
            .unwrap();
        let messages: Vec<&str> = posts.iter().map(|p| p.message.as_str()).collect();
        assert_eq!(messages, vec!["post 0", "post 1", "post 2"]);
        assert_eq!(posts[0].author_username, "john");
        assert_eq!(posts[0].author_posts, 3);
        assert_eq!(repo.count_by_topic(fx.topic_id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_message() {
        let fx = setup().await;
        let repo = PostRepository::new(fx.db.pool());
        let post = repo
            .create(&NewPost::new(fx.topic_id, fx.user_id, "before"))
            .await
            .unwrap();

        let updated = repo
            .update_message(post.id, "after", fx.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.message, "after");
        assert_eq!(updated.updated_by, Some(fx.user_id));
        assert!(updated.updated_at.is_some());

        assert!(repo.update_message(999, "x", fx.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_topic_delete_cascades() {
        let fx = setup().await;
        let repo = PostRepository::new(fx.db.pool());
        let post = repo
            .create(&NewPost::new(fx.topic_id, fx.user_id, "bye"))
            .await
            .unwrap();

        TopicRepository::new(fx.db.pool())
            .delete(fx.topic_id)
            .await
            .unwrap();
        assert!(repo.get_by_id(post.id).await.unwrap().is_none());
    }
}
