use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Payload, StorageError};

/// Media host classification for an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Documents and other non-image files
    Raw,
    Image,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Raw => "raw",
            ResourceKind::Image => "image",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attachment on its way to the media host
#[derive(Debug)]
pub struct ObjectUpload {
    pub payload: Payload,
    pub kind: ResourceKind,
    pub content_type: String,
    pub file_name: Option<String>,
}

/// Where an uploaded attachment ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Absolute public URL
    pub url: String,
    /// Provider-side identifier, used for deletion
    pub key: String,
    pub kind: ResourceKind,
}

/// A media host that stores bytes and hands back a public URL
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short provider name for logs and error messages
    fn provider(&self) -> &'static str;

    async fn upload(&self, upload: ObjectUpload) -> Result<StoredObject, StorageError>;

    async fn delete(&self, object: &StoredObject) -> Result<(), StorageError>;
}

/// File extension for an upload, preferring the submitted file name
pub fn extension_for(file_name: Option<&str>, content_type: &str) -> Option<String> {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    from_name.or_else(|| {
        match content_type {
            "image/jpeg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/gif" => Some("gif"),
            "image/webp" => Some("webp"),
            "application/pdf" => Some("pdf"),
            "application/msword" => Some("doc"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some("docx")
            }
            _ => None,
        }
        .map(str::to_string)
    })
}
