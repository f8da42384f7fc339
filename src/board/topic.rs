//! Topic model for Boards.

/// Maximum length of a topic subject (in characters).
pub const MAX_SUBJECT_LENGTH: usize = 255;

/// Topic entity representing a discussion in a board.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Topic {
    /// Unique topic ID.
    pub id: i64,
    pub subject: String,
    /// ID of the board this topic belongs to.
    pub board_id: i64,
    /// ID of the user who started the topic.
    pub starter_id: i64,
    /// Number of times the post list was viewed.
    pub views: i64,
    /// Time of the latest post.
    pub last_updated: String,
}

/// Topic row for the board page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopicSummary {
    pub id: i64,
    pub subject: String,
    pub board_id: i64,
    pub starter_id: i64,
    pub views: i64,
    pub last_updated: String,
    /// Username of the starter.
    pub starter_username: String,
    /// Number of posts after the first one.
    pub replies: i64,
}

/// Data for creating a new topic.
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub board_id: i64,
    pub subject: String,
    pub starter_id: i64,
}

impl NewTopic {
    /// Create a new topic with required fields.
    pub fn new(board_id: i64, subject: impl Into<String>, starter_id: i64) -> Self {
        Self {
            board_id,
            subject: subject.into(),
            starter_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_topic() {
        let topic = NewTopic::new(1, "Hello, everyone!", 42);
        assert_eq!(topic.board_id, 1);
        assert_eq!(topic.subject, "Hello, everyone!");
        assert_eq!(topic.starter_id, 42);
    }
}
