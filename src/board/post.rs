//! Post model for Boards.

/// Maximum length for a post message (in characters).
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Post entity representing a message in a topic.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    /// Unique post ID.
    pub id: i64,
    pub message: String,
    /// ID of the topic this post belongs to.
    pub topic_id: i64,
    /// ID of the author.
    pub created_by: i64,
    pub created_at: String,
    /// ID of the user who last edited the post.
    pub updated_by: Option<i64>,
    pub updated_at: Option<String>,
}

impl Post {
    /// Check if the post has been edited.
    pub fn is_edited(&self) -> bool {
        self.updated_at.is_some()
    }
}

/// Post joined with author names for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostView {
    pub id: i64,
    pub message: String,
    pub topic_id: i64,
    pub created_by: i64,
    pub created_at: String,
    pub updated_by: Option<i64>,
    pub updated_at: Option<String>,
    /// Author username.
    pub author_username: String,
    /// Number of posts written by the author.
    pub author_posts: i64,
}

/// Data for creating a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub topic_id: i64,
    pub created_by: i64,
    pub message: String,
}

impl NewPost {
    /// Create a new post with required fields.
    pub fn new(topic_id: i64, created_by: i64, message: impl Into<String>) -> Self {
        Self {
            topic_id,
            created_by,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post() {
        let post = NewPost::new(3, 7, "Lorem ipsum");
        assert_eq!(post.topic_id, 3);
        assert_eq!(post.created_by, 7);
        assert_eq!(post.message, "Lorem ipsum");
    }

    #[test]
    fn test_is_edited() {
        let mut post = Post {
            id: 1,
            message: "hi".to_string(),
            topic_id: 1,
            created_by: 1,
            created_at: "2024-01-01 00:00:00".to_string(),
            updated_by: None,
            updated_at: None,
        };
        assert!(!post.is_edited());

        post.updated_by = Some(1);
        post.updated_at = Some("2024-01-02 00:00:00".to_string());
        assert!(post.is_edited());
    }
}
