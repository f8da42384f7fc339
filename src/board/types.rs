//! Board model for Boards.

/// Maximum board name length.
pub const MAX_NAME_LENGTH: usize = 30;

/// Maximum board description length.
pub const MAX_DESCRIPTION_LENGTH: usize = 100;

/// Board entity representing a forum category.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Board {
    /// Unique board ID.
    pub id: i64,
    /// Board name (unique).
    pub name: String,
    pub description: String,
}

/// Board with aggregate figures for the home page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BoardSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Number of topics in the board.
    pub topics_count: i64,
    /// Number of posts across all topics of the board.
    pub posts_count: i64,
    /// Creation time of the newest post.
    pub last_post_at: Option<String>,
    /// Author of the newest post.
    pub last_post_by: Option<String>,
}

/// Data for creating a new board.
#[derive(Debug, Clone)]
pub struct NewBoard {
    pub name: String,
    pub description: String,
}

impl NewBoard {
    /// Create a new board.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board() {
        let board = NewBoard::new("Django", "This is a django board.");
        assert_eq!(board.name, "Django");
        assert_eq!(board.description, "This is a django board.");
    }
}
