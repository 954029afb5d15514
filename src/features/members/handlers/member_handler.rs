use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::members::dtos::{MemberResponseDto, SubmitMemberDto};
use crate::features::members::intake::read_submission;
use crate::features::members::services::MemberService;
use crate::shared::types::ApiResponse;

/// Submit a membership form
///
/// Accepts multipart/form-data with the profile text fields plus optional
/// `cvPortfolio` and `image` file parts. Both files are uploaded to the media
/// host before anything is stored; if either upload fails nothing is stored.
#[utoipa::path(
    post,
    path = "/api/members",
    tag = "members",
    request_body(
        content = SubmitMemberDto,
        content_type = "multipart/form-data",
        description = "Membership form with optional CV/portfolio and photo",
    ),
    responses(
        (status = 201, description = "Member created", body = ApiResponse<MemberResponseDto>),
        (status = 500, description = "Upload, storage or intake failure", body = ApiResponse<String>)
    )
)]
pub async fn submit_member(
    State(service): State<Arc<MemberService>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MemberResponseDto>>)> {
    let mut multipart = multipart
        .map_err(|e| AppError::Intake(format!("Expected a multipart form: {}", e)))?;

    let submission = read_submission(&mut multipart, service.intake_options()).await?;
    let member = service.submit(submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(member),
            "Member created successfully!",
        )),
    ))
}

/// List every member
///
/// Returns all stored submissions as a bare array, unpaginated.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "members",
    responses(
        (status = 200, description = "All members", body = Vec<MemberResponseDto>),
        (status = 500, description = "Listing failed", body = ApiResponse<String>)
    )
)]
pub async fn list_members(
    State(service): State<Arc<MemberService>>,
) -> Result<Json<Vec<MemberResponseDto>>> {
    Ok(Json(service.list().await?))
}
