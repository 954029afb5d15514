//! Membership form intake
//!
//! Reads the multipart stream once, in order. Text parts are coerced into
//! [`MemberFields`]; the `cvPortfolio` and `image` file parts become
//! [`Attachment`]s, buffered or staged depending on [`UploadStrategy`].

use std::fmt;
use std::path::PathBuf;

use axum::extract::multipart::{Field, Multipart, MultipartError};
use tracing::debug;

use crate::core::config::UploadStrategy;
use crate::core::error::{AppError, Result};
use crate::features::members::models::{MemberFields, SocialMedia};
use crate::modules::storage::{ObjectUpload, Payload, ResourceKind, StagingWriter, StorageError};

/// Content type assumed when a file part carries none
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// The two file parts the form may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentField {
    CvPortfolio,
    Image,
}

impl AttachmentField {
    pub fn form_name(&self) -> &'static str {
        match self {
            AttachmentField::CvPortfolio => "cvPortfolio",
            AttachmentField::Image => "image",
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            AttachmentField::CvPortfolio => ResourceKind::Raw,
            AttachmentField::Image => ResourceKind::Image,
        }
    }

    fn from_form_name(name: &str) -> Option<Self> {
        match name {
            "cvPortfolio" => Some(AttachmentField::CvPortfolio),
            "image" => Some(AttachmentField::Image),
            _ => None,
        }
    }
}

impl fmt::Display for AttachmentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_name())
    }
}

/// One file part pulled out of the form
#[derive(Debug)]
pub struct Attachment {
    pub field: AttachmentField,
    pub file_name: Option<String>,
    pub content_type: String,
    pub payload: Payload,
}

impl Attachment {
    pub fn into_upload(self) -> ObjectUpload {
        ObjectUpload {
            kind: self.field.kind(),
            payload: self.payload,
            content_type: self.content_type,
            file_name: self.file_name,
        }
    }
}

/// Everything a membership form submission carried
#[derive(Debug, Default)]
pub struct MemberSubmission {
    pub fields: MemberFields,
    pub cv_portfolio: Option<Attachment>,
    pub image: Option<Attachment>,
}

/// How attachment bytes are held between intake and upload
#[derive(Debug, Clone, Default)]
pub struct IntakeOptions {
    pub strategy: UploadStrategy,
    pub temp_dir: Option<PathBuf>,
}

/// Read a whole membership form from the multipart stream
pub async fn read_submission(
    multipart: &mut Multipart,
    options: &IntakeOptions,
) -> Result<MemberSubmission> {
    let mut text_fields: Vec<(String, String)> = Vec::new();
    let mut submission = MemberSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::Intake(format!("Failed to read multipart data: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        if let Some(attachment_field) = AttachmentField::from_form_name(&name) {
            let Some(attachment) = read_attachment(attachment_field, field, options).await? else {
                debug!("Empty {} part treated as absent", attachment_field);
                continue;
            };

            let slot = match attachment_field {
                AttachmentField::CvPortfolio => &mut submission.cv_portfolio,
                AttachmentField::Image => &mut submission.image,
            };
            if slot.replace(attachment).is_some() {
                debug!("Repeated {} part, keeping the last one", attachment_field);
            }
        } else if field.file_name().is_some() {
            debug!("Ignoring unexpected file part: {}", name);
        } else {
            let value = field.text().await.map_err(|e| {
                AppError::Intake(format!("Failed to read field '{}': {}", name, e))
            })?;
            text_fields.push((name, value));
        }
    }

    submission.fields = MemberFields::from_form(&text_fields);
    Ok(submission)
}

/// Read one file part; `None` for the empty part of an untouched file input
async fn read_attachment(
    field_kind: AttachmentField,
    mut field: Field<'_>,
    options: &IntakeOptions,
) -> Result<Option<Attachment>> {
    let file_name = field
        .file_name()
        .map(str::to_string)
        .filter(|n| !n.is_empty());
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let read_error = |e: MultipartError| {
        AppError::Intake(format!("Failed to read {} data: {}", field_kind, e))
    };

    let payload = match options.strategy {
        UploadStrategy::Buffer => Payload::Buffered(field.bytes().await.map_err(read_error)?),
        UploadStrategy::Stream => {
            let staging_error = |e: StorageError| {
                AppError::Intake(format!("Failed to stage {}: {}", field_kind, e))
            };

            let mut writer =
                StagingWriter::create(options.temp_dir.as_deref()).map_err(staging_error)?;
            while let Some(chunk) = field.chunk().await.map_err(read_error)? {
                writer.write_chunk(&chunk).await.map_err(staging_error)?;
            }
            Payload::Staged(writer.finish().await.map_err(staging_error)?)
        }
    };

    if payload.is_empty() && file_name.is_none() {
        return Ok(None);
    }

    debug!(
        "Received {} part: {} bytes, {}",
        field_kind,
        payload.len(),
        content_type
    );

    Ok(Some(Attachment {
        field: field_kind,
        file_name,
        content_type,
        payload,
    }))
}

impl MemberFields {
    /// Coerce raw form text fields; later duplicates win for single-valued fields
    pub fn from_form(pairs: &[(String, String)]) -> Self {
        let mut fields = MemberFields::default();
        let mut social_media = SocialMedia::default();
        let mut languages_raw: Option<&str> = None;

        for (name, value) in pairs {
            let text = Some(value.clone());
            match name.as_str() {
                "fullName" => fields.full_name = text,
                "UID" => fields.uid = text,
                "department" => fields.department = text,
                "year" => fields.year = text,
                "semester" => fields.semester = text,
                "email" => fields.email = text,
                "phoneNumber" => fields.phone_number = text,
                "technicalSkills" => fields.technical_skills = text,
                "softSkills" => fields.soft_skills = text,
                "certifications" => fields.certifications = text,
                "extracurricularActivities" => fields.extracurricular_activities = text,
                "previousPositions" => fields.previous_positions = text,
                "achievements" => fields.achievements = text,
                "preferredRole" => fields.preferred_role = text,
                "specialSkills" => fields.special_skills = text,
                "suggestions" => fields.suggestions = text,
                "feedback" => fields.feedback = text,
                "languages" => languages_raw = Some(value.as_str()),
                "interests" | "interests[]" => fields.interests.extend(parse_list_entry(value)),
                "socialMedia" => {
                    if let Some(parsed) = parse_social_media(value) {
                        social_media = parsed;
                    }
                }
                "socialMedia[linkedIn]" => social_media.linked_in = non_blank(value),
                "socialMedia[github]" => social_media.github = non_blank(value),
                other => debug!("Ignoring unknown field: {}", other),
            }
        }

        fields.languages = parse_string_list(languages_raw);
        if !social_media.is_empty() {
            fields.social_media = Some(social_media);
        }
        fields
    }
}

/// Decode a JSON-encoded list of strings; absent or malformed input yields `[]`
pub fn parse_string_list(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Vec::new();
    };

    serde_json::from_str::<Vec<String>>(raw).unwrap_or_else(|e| {
        debug!("Unparsable list field {:?}: {}", raw, e);
        Vec::new()
    })
}

/// One `interests` value: a JSON list, or a single plain entry
fn parse_list_entry(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        return parse_string_list(Some(trimmed));
    }
    non_blank(trimmed).into_iter().collect()
}

fn parse_social_media(raw: &str) -> Option<SocialMedia> {
    let parsed = serde_json::from_str::<SocialMedia>(raw.trim())
        .map_err(|e| debug!("Unparsable socialMedia field: {}", e))
        .ok()?;
    (!parsed.is_empty()).then_some(parsed)
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
