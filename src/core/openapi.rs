use utoipa::{Modify, OpenApi};

use crate::features::members::{
    dtos as members_dtos, handlers as members_handlers, models as members_models,
};
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Members (public)
        members_handlers::submit_member,
        members_handlers::list_members,
    ),
    components(
        schemas(
            // Members
            members_models::SocialMedia,
            members_dtos::SubmitMemberDto,
            members_dtos::MemberResponseDto,
            ApiResponse<members_dtos::MemberResponseDto>,
        )
    ),
    tags(
        (name = "members", description = "Membership form submissions and listing (public)"),
    ),
    info(
        title = "Membership API",
        version = "0.1.0",
        description = "API documentation for the membership intake service",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
