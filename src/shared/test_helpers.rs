use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::Barrier;

use crate::core::error::{AppError, Result};
use crate::features::members::models::{Member, NewMember};
use crate::features::members::services::MemberStore;
use crate::modules::storage::{ObjectStore, ObjectUpload, ResourceKind, StorageError, StoredObject};

/// URL the fake media host hands out for `data` uploaded as `kind`
pub fn media_url(kind: ResourceKind, data: &[u8]) -> String {
    format!(
        "https://media.test/{}/{}",
        kind,
        hex::encode(Sha256::digest(data))
    )
}

/// [`MemberStore`] keeping rows in memory
#[derive(Default)]
pub struct InMemoryMemberStore {
    members: Mutex<Vec<Member>>,
    fail: bool,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails like an unreachable database
    pub fn failing() -> Self {
        Self {
            members: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn len(&self) -> usize {
        self.members.lock().unwrap().len()
    }

    pub fn members(&self) -> Vec<Member> {
        self.members.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemberStore for InMemoryMemberStore {
    async fn insert(&self, member: NewMember) -> Result<Member> {
        if self.fail {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        let member = Member::from_new(member);
        self.members.lock().unwrap().push(member.clone());
        Ok(member)
    }

    async fn list(&self) -> Result<Vec<Member>> {
        if self.fail {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.members())
    }
}

/// [`ObjectStore`] that hashes payloads into URLs instead of storing them
#[derive(Default)]
pub struct FakeObjectStore {
    failing_kinds: HashSet<ResourceKind>,
    delay: Option<Duration>,
    rendezvous: Option<Arc<Barrier>>,
    hang_on_delete: bool,
    uploads: AtomicUsize,
    deleted: Mutex<Vec<String>>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every upload of `kind`
    pub fn failing(mut self, kind: ResourceKind) -> Self {
        self.failing_kinds.insert(kind);
        self
    }

    /// Sleep before answering each upload
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make two uploads wait for each other before either completes
    pub fn with_rendezvous(mut self) -> Self {
        self.rendezvous = Some(Arc::new(Barrier::new(2)));
        self
    }

    /// Never answer delete calls, like a media host that stopped responding
    pub fn with_hanging_delete(mut self) -> Self {
        self.hang_on_delete = true;
        self
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn deleted_urls(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    fn provider(&self) -> &'static str {
        "fake"
    }

    async fn upload(
        &self,
        upload: ObjectUpload,
    ) -> std::result::Result<StoredObject, StorageError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);

        if let Some(barrier) = &self.rendezvous {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_kinds.contains(&upload.kind) {
            return Err(StorageError::Rejected {
                provider: "fake",
                status: 500,
                message: format!("{} uploads are failing", upload.kind),
            });
        }

        let kind = upload.kind;
        let data = upload.payload.into_bytes().await?;
        let url = media_url(kind, &data);

        Ok(StoredObject {
            key: url.clone(),
            url,
            kind,
        })
    }

    async fn delete(&self, object: &StoredObject) -> std::result::Result<(), StorageError> {
        if self.hang_on_delete {
            std::future::pending::<()>().await;
        }
        self.deleted.lock().unwrap().push(object.url.clone());
        Ok(())
    }
}
