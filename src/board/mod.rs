//! Board module for Boards.
//!
//! This module provides the forum hierarchy:
//! - Boards (categories)
//! - Topics within a board
//! - Posts within a topic, editable by their author

mod post;
mod post_repository;
mod repository;
mod service;
mod topic;
mod topic_repository;
mod types;

pub use post::{NewPost, Post, PostView, MAX_MESSAGE_LENGTH};
pub use post_repository::PostRepository;
pub use repository::BoardRepository;
pub use service::{
    clamp_page, validate_message, validate_subject, BoardService, PaginatedResult,
};
pub use topic::{NewTopic, Topic, TopicSummary, MAX_SUBJECT_LENGTH};
pub use topic_repository::TopicRepository;
pub use types::{Board, BoardSummary, NewBoard};
