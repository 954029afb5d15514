use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Social profile links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SocialMedia {
    #[serde(default)]
    pub linked_in: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
}

impl SocialMedia {
    pub fn is_empty(&self) -> bool {
        self.linked_in.is_none() && self.github.is_none()
    }
}

/// Profile fields of one submission, after type coercion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFields {
    pub full_name: Option<String>,
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
}

/// A member record ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub profile: MemberFields,
    pub cv_portfolio_url: Option<String>,
    pub image_url: Option<String>,
}

impl NewMember {
    /// Merge profile fields with the upload URLs
    pub fn assemble(
        profile: MemberFields,
        cv_portfolio_url: Option<String>,
        image_url: Option<String>,
    ) -> Self {
        Self {
            profile,
            cv_portfolio_url,
            image_url,
        }
    }
}

/// Database model for members
#[derive(Debug, Clone, FromRow)]
pub struct Member {
    pub id: Uuid,
    pub full_name: Option<String>,
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
    pub social_media: Option<Json<SocialMedia>>,
    pub languages: Vec<String>,
    pub special_skills: Option<String>,
    pub suggestions: Option<String>,
    pub feedback: Option<String>,
    pub cv_portfolio_url: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Row as the database would return it for `new`
    #[cfg(test)]
    pub fn from_new(new: NewMember) -> Self {
        let NewMember {
            profile,
            cv_portfolio_url,
            image_url,
        } = new;

        Self {
            id: Uuid::now_v7(),
            full_name: profile.full_name,
            uid: profile.uid,
            department: profile.department,
            year: profile.year,
            semester: profile.semester,
            email: profile.email,
            phone_number: profile.phone_number,
            technical_skills: profile.technical_skills,
            soft_skills: profile.soft_skills,
            certifications: profile.certifications,
            extracurricular_activities: profile.extracurricular_activities,
            previous_positions: profile.previous_positions,
            achievements: profile.achievements,
            interests: profile.interests,
            preferred_role: profile.preferred_role,
            social_media: profile.social_media.map(Json),
            languages: profile.languages,
            special_skills: profile.special_skills,
            suggestions: profile.suggestions,
            feedback: profile.feedback,
            cv_portfolio_url,
            image_url,
            created_at: Utc::now(),
        }
    }
}
