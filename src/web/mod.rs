//! Web UI for Boards.
//!
//! Server-rendered HTML pages over axum: accounts, boards, topics and
//! posts. Sessions live in the database and are identified by a cookie;
//! every form is protected by a CSRF token.

pub mod error;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::WebError;
pub use handlers::AppState;
pub use middleware::RateLimitState;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
