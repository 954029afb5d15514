use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::members::models::{Member, SocialMedia};

/// Membership form fields for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler reads the multipart stream directly.
#[derive(Debug, Deserialize, ToSchema)]
#[allow(dead_code)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMemberDto {
    pub full_name: Option<String>,
    #[serde(rename = "UID")]
    pub uid: Option<String>,
    pub department: Option<String>,
    pub year: Option<String>,
    pub semester: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub technical_skills: Option<String>,
    pub soft_skills: Option<String>,
    pub certifications: Option<String>,
    pub extracurricular_activities: Option<String>,
    pub previous_positions: Option<String>,
    pub achievements: Option<String>,
    /// JSON-encoded list, or repeated `interests` fields
    #[schema(example = r#"["Robotics","AI"]"#)]
    pub interests: Option<String>,
    pub preferred_role: Option<String>,
    /// JSON object with `linkedIn` and `github`, or `socialMedia[linkedIn]` style fields
    #[schema(example = r#"{"linkedIn":"https://linkedin.com/in/ada","github":"https://github.com/ada"}"#)]
    pub social_media: Option<String>,
    /// JSON-encoded list of languages; malformed input is stored as an empty list
    #[schema(example = r#"["Spanish","French"]"#)]
    pub languages: Option<String>,
    pub special_skills: Option<String>,
    pub suggestions: Option<String>,
    pub feedback: Option<String>,
    /// CV or portfolio document, any type
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub cv_portfolio: Option<String>,
    /// Profile photo, any type
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: Option<String>,
}

/// Stored member as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponseDto {
    pub id: Uuid,
    pub full_name: Option<String>,
    #[serde(rename = "UID")]
    pub uid: Option<String>,
    pub department: Option<String>,
    pub year: Option<String>,
    pub semester: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub technical_skills: Option<String>,
    pub soft_skills: Option<String>,
    pub certifications: Option<String>,
    pub extracurricular_activities: Option<String>,
    pub previous_positions: Option<String>,
    pub achievements: Option<String>,
    pub interests: Vec<String>,
    pub preferred_role: Option<String>,
    pub social_media: Option<SocialMedia>,
    pub languages: Vec<String>,
    pub special_skills: Option<String>,
    pub suggestions: Option<String>,
    pub feedback: Option<String>,
    /// Public URL of the uploaded CV/portfolio, absent when none was sent
    pub cv_portfolio_url: Option<String>,
    /// Public URL of the uploaded photo, absent when none was sent
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Member> for MemberResponseDto {
    fn from(m: Member) -> Self {
        Self {
            id: m.id,
            full_name: m.full_name,
            uid: m.uid,
            department: m.department,
            year: m.year,
            semester: m.semester,
            email: m.email,
            phone_number: m.phone_number,
            technical_skills: m.technical_skills,
            soft_skills: m.soft_skills,
            certifications: m.certifications,
            extracurricular_activities: m.extracurricular_activities,
            previous_positions: m.previous_positions,
            achievements: m.achievements,
            interests: m.interests,
            preferred_role: m.preferred_role,
            social_media: m.social_media.map(|json| json.0),
            languages: m.languages,
            special_skills: m.special_skills,
            suggestions: m.suggestions,
            feedback: m.feedback,
            cv_portfolio_url: m.cv_portfolio_url,
            image_url: m.image_url,
            created_at: m.created_at,
        }
    }
}
