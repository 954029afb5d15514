use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::members::handlers::{list_members, submit_member};
use crate::features::members::services::MemberService;

/// Create routes for the members feature
///
/// `max_body_size` bounds the whole multipart body of a submission.
pub fn routes(member_service: Arc<MemberService>, max_body_size: usize) -> Router {
    Router::new()
        .route(
            "/api/members",
            post(submit_member).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/api/users", get(list_members))
        .with_state(member_service)
}
