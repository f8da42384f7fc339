//! Board pages: board list, topics, posts, new topics, replies and post
//! editing.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;

use crate::auth::permission::can_modify_resource;
use crate::auth::FieldErrors;
use crate::board::{
    clamp_page, validate_message, validate_subject, Board, BoardSummary, PostRepository,
    PostView, Topic, TopicSummary,
};
use crate::datetime::natural_time;
use crate::db::User;
use crate::template::{TemplateContext, Value};
use crate::web::error::WebError;
use crate::web::forms::{NewTopicForm, PageQuery, PostForm};
use crate::web::middleware::{CsrfToken, CurrentUser, RequireLogin};

use super::{errors_value, pagination_value, AppState, Ids};

type Page = Result<Html<String>, WebError>;

fn topic_url(board_id: i64, topic_id: i64) -> String {
    format!("/boards/{board_id}/topics/{topic_id}/")
}

fn board_value(board: &Board) -> Value {
    Value::object([
        ("id", Value::from(board.id)),
        ("name", Value::from(&board.name)),
        ("description", Value::from(&board.description)),
    ])
}

fn topic_value(topic: &Topic) -> Value {
    Value::object([
        ("id", Value::from(topic.id)),
        ("subject", Value::from(&topic.subject)),
        ("views", Value::from(topic.views)),
    ])
}

fn board_summary_value(board: &BoardSummary) -> Value {
    let now = Utc::now();
    Value::object([
        ("id", Value::from(board.id)),
        ("name", Value::from(&board.name)),
        ("description", Value::from(&board.description)),
        ("topics_count", Value::from(board.topics_count)),
        ("posts_count", Value::from(board.posts_count)),
        (
            "last_post_at",
            Value::from(board.last_post_at.as_deref().map(|ts| natural_time(ts, now))),
        ),
        ("last_post_by", Value::from(board.last_post_by.clone())),
    ])
}

fn topic_summary_value(topic: &TopicSummary) -> Value {
    Value::object([
        ("id", Value::from(topic.id)),
        ("subject", Value::from(&topic.subject)),
        ("starter_username", Value::from(&topic.starter_username)),
        ("replies", Value::from(topic.replies)),
        ("views", Value::from(topic.views)),
        (
            "last_updated",
            Value::from(natural_time(&topic.last_updated, Utc::now())),
        ),
    ])
}

fn post_value(state: &AppState, post: &PostView, viewer: Option<&User>) -> Value {
    Value::object([
        ("id", Value::from(post.id)),
        ("message", Value::from(&post.message)),
        ("author_username", Value::from(&post.author_username)),
        ("author_posts", Value::from(post.author_posts)),
        ("created_at", Value::from(state.local_time(&post.created_at))),
        ("edited", Value::from(post.updated_at.is_some())),
        (
            "editable",
            Value::from(can_modify_resource(viewer, post.created_by).is_ok()),
        ),
    ])
}

/// GET /
pub async fn home(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Page {
    let boards = state.boards().list_boards().await?;
    let context = state
        .page_context("Boards", user.as_ref(), None)
        .with(
            "boards",
            boards.iter().map(board_summary_value).collect::<Vec<_>>(),
        );
    state.render("home", &context)
}

/// GET /boards/:id/
pub async fn board_topics(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Ids(board_id): Ids<i64>,
    Query(query): Query<PageQuery>,
) -> Page {
    let service = state.boards();
    let board = service.get_board(board_id).await?;
    let topics = service
        .list_topics(board.id, query.number(), state.config.web.topics_per_page)
        .await?;

    let context = state
        .page_context(&board.name, user.as_ref(), None)
        .with("board", board_value(&board))
        .with(
            "topics",
            topics.items.iter().map(topic_summary_value).collect::<Vec<_>>(),
        )
        .with("pagination", pagination_value(&topics));
    state.render("topics", &context)
}

fn new_topic_context(
    state: &AppState,
    user: &User,
    csrf: &CsrfToken,
    board: &Board,
    form: &NewTopicForm,
    errors: &FieldErrors,
) -> TemplateContext {
    state
        .page_context("Start a New Topic", Some(user), Some(csrf))
        .with("board", board_value(board))
        .with(
            "form",
            Value::object([("subject", &form.subject), ("message", &form.message)]),
        )
        .with("errors", errors_value(errors))
}

/// GET /boards/:id/new/
pub async fn new_topic_page(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    csrf: CsrfToken,
    Ids(board_id): Ids<i64>,
) -> Page {
    let board = state.boards().get_board(board_id).await?;
    let context = new_topic_context(
        &state,
        &user,
        &csrf,
        &board,
        &NewTopicForm::default(),
        &FieldErrors::new(),
    );
    state.render("new_topic", &context)
}

/// POST /boards/:id/new/
///
/// Creates the topic with its first post.
pub async fn new_topic(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    csrf: CsrfToken,
    Ids(board_id): Ids<i64>,
    Form(form): Form<NewTopicForm>,
) -> Result<Response, WebError> {
    let service = state.boards();
    let board = service.get_board(board_id).await?;

    let mut errors = FieldErrors::new();
    errors.check("subject", validate_subject(&form.subject));
    errors.check("message", validate_message(&form.message));
    if !errors.is_empty() {
        let context = new_topic_context(&state, &user, &csrf, &board, &form, &errors);
        return Ok(state.render("new_topic", &context)?.into_response());
    }

    let topic = service
        .create_topic(board.id, &user, &form.subject, &form.message)
        .await?;
    Ok(Redirect::to(&topic_url(board.id, topic.id)).into_response())
}

/// GET /boards/:id/topics/:topic_id/
///
/// Every visit counts as a view.
pub async fn topic_posts(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Ids((board_id, topic_id)): Ids<(i64, i64)>,
    Query(query): Query<PageQuery>,
) -> Page {
    let service = state.boards();
    let board = service.get_board(board_id).await?;
    let topic = service.view_topic(board.id, topic_id).await?;
    let posts = service
        .list_posts(topic.id, query.number(), state.config.web.posts_per_page)
        .await?;

    let context = state
        .page_context(&topic.subject, user.as_ref(), None)
        .with("board", board_value(&board))
        .with("topic", topic_value(&topic))
        .with(
            "posts",
            posts
                .items
                .iter()
                .map(|post| post_value(&state, post, user.as_ref()))
                .collect::<Vec<_>>(),
        )
        .with("pagination", pagination_value(&posts));
    state.render("topic_posts", &context)
}

fn reply_context(
    state: &AppState,
    user: &User,
    csrf: &CsrfToken,
    board: &Board,
    topic: &Topic,
    message: &str,
    errors: &FieldErrors,
) -> TemplateContext {
    state
        .page_context("Post a reply", Some(user), Some(csrf))
        .with("board", board_value(board))
        .with("topic", topic_value(topic))
        .with("form", Value::object([("message", message)]))
        .with("errors", errors_value(errors))
}

/// GET /boards/:id/topics/:topic_id/reply/
pub async fn reply_topic_page(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    csrf: CsrfToken,
    Ids((board_id, topic_id)): Ids<(i64, i64)>,
) -> Page {
    let service = state.boards();
    let board = service.get_board(board_id).await?;
    let topic = service.get_topic(board.id, topic_id).await?;
    let context = reply_context(&state, &user, &csrf, &board, &topic, "", &FieldErrors::new());
    state.render("reply_topic", &context)
}

/// POST /boards/:id/topics/:topic_id/reply/
///
/// Redirects to the last page of the topic, anchored at the new post.
pub async fn reply_topic(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    csrf: CsrfToken,
    Ids((board_id, topic_id)): Ids<(i64, i64)>,
    Form(form): Form<PostForm>,
) -> Result<Response, WebError> {
    let service = state.boards();
    let board = service.get_board(board_id).await?;
    let topic = service.get_topic(board.id, topic_id).await?;

    if let Err(e) = validate_message(&form.message) {
        let mut errors = FieldErrors::new();
        errors.add("message", e);
        let context = reply_context(&state, &user, &csrf, &board, &topic, &form.message, &errors);
        return Ok(state.render("reply_topic", &context)?.into_response());
    }

    let post = service
        .reply(board.id, topic.id, &user, &form.message)
        .await?;

    let total = PostRepository::new(state.db.pool())
        .count_by_topic(topic.id)
        .await?;
    let per_page = state.config.web.posts_per_page;
    let last_page = clamp_page(Some(i64::MAX), total, per_page);

    Ok(Redirect::to(&format!(
        "{}?page={last_page}#post-{}",
        topic_url(board.id, topic.id),
        post.id
    ))
    .into_response())
}

fn edit_post_context(
    state: &AppState,
    user: &User,
    csrf: &CsrfToken,
    (board, topic, post_id): (&Board, &Topic, i64),
    message: &str,
    errors: &FieldErrors,
) -> TemplateContext {
    state
        .page_context("Edit post", Some(user), Some(csrf))
        .with("board", board_value(board))
        .with("topic", topic_value(topic))
        .with("post_id", post_id)
        .with("form", Value::object([("message", message)]))
        .with("errors", errors_value(errors))
}

/// GET /boards/:id/topics/:topic_id/posts/:post_id/edit/
///
/// Only the author may edit; anyone else gets the same 404 as for a post
/// that does not exist.
pub async fn edit_post_page(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    csrf: CsrfToken,
    Ids((board_id, topic_id, post_id)): Ids<(i64, i64, i64)>,
) -> Page {
    let service = state.boards();
    let post = service
        .get_editable_post(board_id, topic_id, post_id, &user)
        .await?;
    let board = service.get_board(board_id).await?;
    let topic = service.get_topic(board_id, topic_id).await?;

    let context = edit_post_context(
        &state,
        &user,
        &csrf,
        (&board, &topic, post.id),
        &post.message,
        &FieldErrors::new(),
    );
    state.render("edit_post", &context)
}

/// POST /boards/:id/topics/:topic_id/posts/:post_id/edit/
pub async fn edit_post(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    csrf: CsrfToken,
    Ids((board_id, topic_id, post_id)): Ids<(i64, i64, i64)>,
    Form(form): Form<PostForm>,
) -> Result<Response, WebError> {
    let service = state.boards();
    let post = service
        .get_editable_post(board_id, topic_id, post_id, &user)
        .await?;

    if let Err(e) = validate_message(&form.message) {
        let board = service.get_board(board_id).await?;
        let topic = service.get_topic(board_id, topic_id).await?;
        let mut errors = FieldErrors::new();
        errors.add("message", e);
        let context = edit_post_context(
            &state,
            &user,
            &csrf,
            (&board, &topic, post.id),
            &form.message,
            &errors,
        );
        return Ok(state.render("edit_post", &context)?.into_response());
    }

    service
        .edit_post(board_id, topic_id, post.id, &user, &form.message)
        .await?;
    Ok(Redirect::to(&topic_url(board_id, topic_id)).into_response())
}
