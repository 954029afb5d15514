//! Persistence gateway for member records

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::core::error::Result;
use crate::features::members::models::{Member, NewMember};

/// Durable storage for member records
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Write a record and return it as stored, id included
    async fn insert(&self, member: NewMember) -> Result<Member>;

    /// Every stored record, oldest first
    async fn list(&self) -> Result<Vec<Member>>;
}

/// Postgres-backed [`MemberStore`]
pub struct PgMemberStore {
    pool: PgPool,
}

impl PgMemberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberStore for PgMemberStore {
    async fn insert(&self, member: NewMember) -> Result<Member> {
        let NewMember {
            profile,
            cv_portfolio_url,
            image_url,
        } = member;

        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (
                full_name, uid, department, year, semester, email, phone_number,
                technical_skills, soft_skills, certifications, extracurricular_activities,
                previous_positions, achievements, interests, preferred_role, social_media,
                languages, special_skills, suggestions, feedback,
                cv_portfolio_url, image_url
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                $8, $9, $10, $11,
                $12, $13, $14, $15, $16,
                $17, $18, $19, $20,
                $21, $22
            )
            RETURNING *
            "#,
        )
        .bind(profile.full_name)
        .bind(profile.uid)
        .bind(profile.department)
        .bind(profile.year)
        .bind(profile.semester)
        .bind(profile.email)
        .bind(profile.phone_number)
        .bind(profile.technical_skills)
        .bind(profile.soft_skills)
        .bind(profile.certifications)
        .bind(profile.extracurricular_activities)
        .bind(profile.previous_positions)
        .bind(profile.achievements)
        .bind(profile.interests)
        .bind(profile.preferred_role)
        .bind(profile.social_media.map(Json))
        .bind(profile.languages)
        .bind(profile.special_skills)
        .bind(profile.suggestions)
        .bind(profile.feedback)
        .bind(cv_portfolio_url)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert member: {:?}", e);
            e
        })?;

        Ok(member)
    }

    async fn list(&self) -> Result<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT * FROM members
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }
}
