//! Member submission pipeline
//!
//! Uploads both attachments concurrently, waits for both to settle, and only
//! then assembles and persists the record. Any failed upload aborts the whole
//! submission; uploads that did land are removed again so nothing is orphaned.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::core::error::{AppError, Result};
use crate::features::members::dtos::MemberResponseDto;
use crate::features::members::intake::{
    Attachment, AttachmentField, IntakeOptions, MemberSubmission,
};
use crate::features::members::models::NewMember;
use crate::features::members::services::MemberStore;
use crate::modules::storage::{ObjectStore, StorageError, StoredObject};

/// Settled outcome of one attachment; `None` when the part was absent
type UploadOutcome = Option<std::result::Result<StoredObject, StorageError>>;

/// Service for membership submissions and the member listing
pub struct MemberService {
    store: Arc<dyn MemberStore>,
    object_store: Arc<dyn ObjectStore>,
    intake: IntakeOptions,
    upload_timeout: Duration,
}

impl MemberService {
    pub fn new(
        store: Arc<dyn MemberStore>,
        object_store: Arc<dyn ObjectStore>,
        intake: IntakeOptions,
        upload_timeout: Duration,
    ) -> Self {
        Self {
            store,
            object_store,
            intake,
            upload_timeout,
        }
    }

    /// How the handler should hold attachment bytes
    pub fn intake_options(&self) -> &IntakeOptions {
        &self.intake
    }

    /// Upload attachments, then persist the member record
    pub async fn submit(&self, submission: MemberSubmission) -> Result<MemberResponseDto> {
        let MemberSubmission {
            fields,
            cv_portfolio,
            image,
        } = submission;

        // Both futures are polled together; neither outcome is looked at until both settle
        let (cv_outcome, image_outcome) = tokio::join!(
            self.upload_attachment(cv_portfolio),
            self.upload_attachment(image),
        );

        let (cv_object, image_object) = self.settle(cv_outcome, image_outcome).await?;

        let record = NewMember::assemble(
            fields,
            cv_object.as_ref().map(|o| o.url.clone()),
            image_object.as_ref().map(|o| o.url.clone()),
        );

        match self.store.insert(record).await {
            Ok(member) => {
                info!(
                    "Member created: id={}, cv_portfolio={}, image={}",
                    member.id,
                    member.cv_portfolio_url.is_some(),
                    member.image_url.is_some()
                );
                Ok(member.into())
            }
            Err(e) => {
                let uploaded: Vec<StoredObject> =
                    cv_object.into_iter().chain(image_object).collect();
                self.discard(&uploaded).await;
                Err(e)
            }
        }
    }

    /// Every stored member, unfiltered
    pub async fn list(&self) -> Result<Vec<MemberResponseDto>> {
        let members = self
            .store
            .list()
            .await
            .map_err(|e| AppError::Listing(e.to_string()))?;

        Ok(members.into_iter().map(Into::into).collect())
    }

    /// Upload one attachment under the configured time bound
    async fn upload_attachment(&self, attachment: Option<Attachment>) -> UploadOutcome {
        let attachment = attachment?;
        let field = attachment.field;
        let size = attachment.payload.len();

        info!(
            "Uploading {} ({} bytes, {}) to {}",
            field,
            size,
            field.kind(),
            self.object_store.provider()
        );

        let result = match timeout(
            self.upload_timeout,
            self.object_store.upload(attachment.into_upload()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(self.upload_timeout)),
        };

        match &result {
            Ok(object) => info!("Uploaded {}: {}", field, object.url),
            Err(e) => warn!("Upload of {} failed: {}", field, e),
        }

        Some(result)
    }

    /// Inspect both outcomes at once: all uploads succeed, or none are kept
    async fn settle(
        &self,
        cv_outcome: UploadOutcome,
        image_outcome: UploadOutcome,
    ) -> Result<(Option<StoredObject>, Option<StoredObject>)> {
        let mut failures = Vec::new();
        let mut uploaded = Vec::new();

        let mut keep = |field: AttachmentField, outcome: UploadOutcome| match outcome {
            Some(Ok(object)) => {
                uploaded.push(object.clone());
                Some(object)
            }
            Some(Err(e)) => {
                failures.push(format!("{}: {}", field, e));
                None
            }
            None => None,
        };

        let cv_object = keep(AttachmentField::CvPortfolio, cv_outcome);
        let image_object = keep(AttachmentField::Image, image_outcome);

        if failures.is_empty() {
            return Ok((cv_object, image_object));
        }

        self.discard(&uploaded).await;
        Err(AppError::Upload(failures.join("; ")))
    }

    /// Best-effort removal of uploads whose record will never exist
    ///
    /// Deletes run together, each under the upload timeout, so a hung media
    /// host cannot hold back the failure response.
    async fn discard(&self, objects: &[StoredObject]) {
        let removals = objects.iter().map(|object| async move {
            match timeout(self.upload_timeout, self.object_store.delete(object)).await {
                Ok(Ok(())) => info!("Removed orphaned upload {}", object.url),
                Ok(Err(e)) => warn!("Failed to remove orphaned upload {}: {}", object.url, e),
                Err(_) => warn!(
                    "Gave up removing orphaned upload {} after {:?}",
                    object.url, self.upload_timeout
                ),
            }
        });

        join_all(removals).await;
    }
}
