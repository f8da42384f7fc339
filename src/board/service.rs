//! Board service for Boards.
//!
//! This module provides high-level operations for boards, topics and posts
//! with ownership checks and pagination support.

use tracing::info;

use crate::db::{Database, User};
use crate::{BoardsError, Result};

use super::post::{Post, PostView, MAX_MESSAGE_LENGTH};
use super::post_repository::PostRepository;
use super::repository::BoardRepository;
use super::topic::{Topic, TopicSummary, MAX_SUBJECT_LENGTH};
use super::topic_repository::TopicRepository;
use super::types::{Board, BoardSummary, NewBoard, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH};

/// Validate a topic subject.
pub fn validate_subject(subject: &str) -> std::result::Result<(), String> {
    if subject.trim().is_empty() {
        return Err("This field is required.".to_string());
    }
    if subject.chars().count() > MAX_SUBJECT_LENGTH {
        return Err(format!(
            "Ensure this value has at most {MAX_SUBJECT_LENGTH} characters."
        ));
    }
    Ok(())
}

/// Validate a post message.
pub fn validate_message(message: &str) -> std::result::Result<(), String> {
    if message.trim().is_empty() {
        return Err("This field is required.".to_string());
    }
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(format!(
            "Ensure this value has at most {MAX_MESSAGE_LENGTH} characters."
        ));
    }
    Ok(())
}

/// A page of results, addressed by 1-based page number.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Total number of items (across all pages).
    pub total: i64,
    /// Current page number, starting at 1.
    pub page: i64,
    pub per_page: i64,
}

impl<T> PaginatedResult<T> {
    /// Number of pages; an empty result still has one page.
    pub fn num_pages(&self) -> i64 {
        if self.total == 0 {
            1
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Check if there are more items after this page.
    pub fn has_more(&self) -> bool {
        self.page < self.num_pages()
    }
}

/// Clamp a requested page number into `1..=num_pages`.
///
/// Missing or out-of-range numbers land on the first or last page.
pub fn clamp_page(requested: Option<i64>, total: i64, per_page: i64) -> i64 {
    let per_page = per_page.max(1);
    let num_pages = if total == 0 {
        1
    } else {
        (total + per_page - 1) / per_page
    };
    requested.unwrap_or(1).clamp(1, num_pages)
}

/// Service for forum operations.
pub struct BoardService<'a> {
    db: &'a Database,
}

impl<'a> BoardService<'a> {
    /// Create a new BoardService with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a board.
    pub async fn create_board(&self, name: &str, description: &str) -> Result<Board> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(BoardsError::Validation(format!(
                "board name must be 1-{MAX_NAME_LENGTH} characters"
            )));
        }
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(BoardsError::Validation(format!(
                "board description must be at most {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }

        let repo = BoardRepository::new(self.db.pool());
        if repo.get_by_name(name).await?.is_some() {
            return Err(BoardsError::Validation(format!(
                "board '{name}' already exists"
            )));
        }

        let board = repo.create(&NewBoard::new(name, description)).await?;
        info!(board_id = board.id, name = %board.name, "Board created");
        Ok(board)
    }

    /// List all boards with their counts.
    pub async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
        BoardRepository::new(self.db.pool()).list_with_stats().await
    }

    /// Get a board by ID.
    pub async fn get_board(&self, board_id: i64) -> Result<Board> {
        BoardRepository::new(self.db.pool())
            .get_by_id(board_id)
            .await?
            .ok_or_else(|| BoardsError::NotFound("board".to_string()))
    }

    /// List topics of a board, most recently active first.
    pub async fn list_topics(
        &self,
        board_id: i64,
        page: Option<i64>,
        per_page: i64,
    ) -> Result<PaginatedResult<TopicSummary>> {
        let per_page = per_page.max(1);
        let repo = TopicRepository::new(self.db.pool());
        let total = repo.count_by_board(board_id).await?;
        let page = clamp_page(page, total, per_page);
        let items = repo
            .list_by_board_paginated(board_id, (page - 1) * per_page, per_page)
            .await?;

        Ok(PaginatedResult {
            items,
            total,
            page,
            per_page,
        })
    }

    /// Get a topic that belongs to `board_id`.
    pub async fn get_topic(&self, board_id: i64, topic_id: i64) -> Result<Topic> {
        TopicRepository::new(self.db.pool())
            .get_in_board(board_id, topic_id)
            .await?
            .ok_or_else(|| BoardsError::NotFound("topic".to_string()))
    }

    /// Get a topic for display and count the view.
    pub async fn view_topic(&self, board_id: i64, topic_id: i64) -> Result<Topic> {
        let mut topic = self.get_topic(board_id, topic_id).await?;
        TopicRepository::new(self.db.pool())
            .increment_views(topic.id)
            .await?;
        topic.views += 1;
        Ok(topic)
    }

    /// List posts of a topic in creation order.
    pub async fn list_posts(
        &self,
        topic_id: i64,
        page: Option<i64>,
        per_page: i64,
    ) -> Result<PaginatedResult<PostView>> {
        let per_page = per_page.max(1);
        let repo = PostRepository::new(self.db.pool());
        let total = repo.count_by_topic(topic_id).await?;
        let page = clamp_page(page, total, per_page);
        let items = repo
            .list_by_topic_paginated(topic_id, (page - 1) * per_page, per_page)
            .await?;

        Ok(PaginatedResult {
            items,
            total,
            page,
            per_page,
        })
    }

    /// Start a topic with its first post.
    ///
    /// The topic and the post are written in one transaction.
    pub async fn create_topic(
        &self,
        board_id: i64,
        starter: &User,
        subject: &str,
        message: &str,
    ) -> Result<Topic> {
        validate_subject(subject).map_err(BoardsError::Validation)?;
        validate_message(message).map_err(BoardsError::Validation)?;
        self.get_board(board_id).await?;

        let mut tx = self.db.begin().await?;

        let topic_id: i64 = sqlx::query_scalar(
            "INSERT INTO topics (subject, board_id, starter_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(subject.trim())
        .bind(board_id)
        .bind(starter.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        sqlx::query("INSERT INTO posts (message, topic_id, created_by) VALUES (?, ?, ?)")
            .bind(message)
            .bind(topic_id)
            .bind(starter.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;

        info!(
            topic_id,
            board_id,
            user_id = starter.id,
            "Topic created"
        );
        self.get_topic(board_id, topic_id).await
    }

    /// Reply to a topic.
    ///
    /// The post insert and the topic's `last_updated` bump share a
    /// transaction.
    pub async fn reply(
        &self,
        board_id: i64,
        topic_id: i64,
        author: &User,
        message: &str,
    ) -> Result<Post> {
        validate_message(message).map_err(BoardsError::Validation)?;
        let topic = self.get_topic(board_id, topic_id).await?;

        let mut tx = self.db.begin().await?;

        let post_id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (message, topic_id, created_by) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(message)
        .bind(topic.id)
        .bind(author.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| BoardsError::Database(e.to_string()))?;

        sqlx::query("UPDATE topics SET last_updated = datetime('now') WHERE id = ?")
            .bind(topic.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| BoardsError::Database(e.to_string()))?;

        info!(post_id, topic_id = topic.id, user_id = author.id, "Reply posted");
        PostRepository::new(self.db.pool())
            .get_by_id(post_id)
            .await?
            .ok_or_else(|| BoardsError::NotFound("post".to_string()))
    }

    /// Get a post for editing.
    ///
    /// The post must belong to the topic, the topic to the board, and the
    /// editor must be the author. Every failure is reported as not found so
    /// other users' posts are indistinguishable from missing ones.
    pub async fn get_editable_post(
        &self,
        board_id: i64,
        topic_id: i64,
        post_id: i64,
        editor: &User,
    ) -> Result<Post> {
        let post = PostRepository::new(self.db.pool())
            .get_in_topic(board_id, topic_id, post_id)
            .await?
            .ok_or_else(|| BoardsError::NotFound("post".to_string()))?;

        if crate::auth::permission::can_modify_resource(Some(editor), post.created_by).is_err() {
            return Err(BoardsError::NotFound("post".to_string()));
        }
        Ok(post)
    }

    /// Edit a post owned by `editor`.
    pub async fn edit_post(
        &self,
        board_id: i64,
        topic_id: i64,
        post_id: i64,
        editor: &User,
        message: &str,
    ) -> Result<Post> {
        let post = self
            .get_editable_post(board_id, topic_id, post_id, editor)
            .await?;
        validate_message(message).map_err(BoardsError::Validation)?;

        let updated = PostRepository::new(self.db.pool())
            .update_message(post.id, message, editor.id)
            .await?
            .ok_or_else(|| BoardsError::NotFound("post".to_string()))?;

        info!(post_id = post.id, user_id = editor.id, "Post edited");
        Ok(updated)
    }
}
