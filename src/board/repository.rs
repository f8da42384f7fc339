//! Board repository for Boards.
//!
//! This module provides CRUD operations for boards in the database.

use super::types::{Board, BoardSummary, NewBoard};
use crate::db::DbPool;
use crate::{BoardsError, Result};

/// Repository for board CRUD operations.
pub struct BoardRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> BoardRepository<'a> {
    /// Create a new BoardRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new board in the database.
    ///
    /// Returns the created board with the assigned ID.
    pub async fn create(&self, new_board: &NewBoard) -> Result<Board> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO boards (name, description) VALUES (?, ?) RETURNING id",
        )
        .bind(&new_board.name)
        .bind(&new_board.description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| BoardsError::NotFound("board".to_string()))
    }

    /// Get a board by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Board>> {
        let result = sqlx::query_as::<_, Board>(
            "SELECT id, name, description FROM boards WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get a board by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Board>> {
        let result = sqlx::query_as::<_, Board>(
            "SELECT id, name, description FROM boards WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(result)
    }

    /// List all boards in creation order.
    pub async fn list(&self) -> Result<Vec<Board>> {
        let boards = sqlx::query_as::<_, Board>(
            "SELECT id, name, description FROM boards ORDER BY id",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(boards)
    }

    /// List all boards with topic/post counts and their newest post.
    pub async fn list_with_stats(&self) -> Result<Vec<BoardSummary>> {
        let boards = sqlx::query_as::<_, BoardSummary>(
            "SELECT b.id, b.name, b.description,
                    (SELECT COUNT(*) FROM topics t WHERE t.board_id = b.id) AS topics_count,
                    (SELECT COUNT(*) FROM posts p JOIN topics t ON t.id = p.topic_id
                      WHERE t.board_id = b.id) AS posts_count,
                    (SELECT p.created_at FROM posts p JOIN topics t ON t.id = p.topic_id
                      WHERE t.board_id = b.id
                      ORDER BY p.created_at DESC, p.id DESC LIMIT 1) AS last_post_at,
                    (SELECT u.username FROM posts p
                       JOIN topics t ON t.id = p.topic_id
                       JOIN users u ON u.id = p.created_by
                      WHERE t.board_id = b.id
                      ORDER BY p.created_at DESC, p.id DESC LIMIT 1) AS last_post_by
             FROM boards b ORDER BY b.id",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        Ok(boards)
    }

    /// Delete a board by ID.
    ///
    /// Topics and posts of the board are removed with it.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM boards WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all boards.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM boards")
            .fetch_one(self.pool)
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;
        Ok(count.0)
    }
}
