//! Attachment bytes, either held in memory or staged on disk

use std::path::Path;

use bytes::Bytes;
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::StorageError;

/// Bytes of one attachment as they leave the request
#[derive(Debug)]
pub enum Payload {
    /// Whole part held in memory
    Buffered(Bytes),
    /// Part written to a temp file, streamed on upload
    Staged(StagedFile),
}

impl Payload {
    /// Size in bytes
    pub fn len(&self) -> u64 {
        match self {
            Payload::Buffered(bytes) => bytes.len() as u64,
            Payload::Staged(file) => file.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialize the payload in memory
    #[cfg(test)]
    pub async fn into_bytes(self) -> Result<Bytes, StorageError> {
        match self {
            Payload::Buffered(bytes) => Ok(bytes),
            Payload::Staged(file) => Ok(Bytes::from(tokio::fs::read(file.path()).await?)),
        }
    }
}

/// A temp file holding one attachment
///
/// The file is removed when this value drops, whichever way the request ends.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    len: u64,
}

impl StagedFile {
    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    /// Open the staged bytes for reading
    pub async fn open(&self) -> Result<File, StorageError> {
        Ok(File::open(&self.path).await?)
    }
}

/// Incremental writer producing a [`StagedFile`]
pub struct StagingWriter {
    file: File,
    path: TempPath,
    len: u64,
}

impl StagingWriter {
    /// Create an empty temp file in `dir`, or the system temp dir
    pub fn create(dir: Option<&Path>) -> Result<Self, StorageError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("member-upload-");

        let named = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let (file, path) = named.into_parts();

        Ok(Self {
            file: File::from_std(file),
            path,
            len: 0,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        self.file.write_all(chunk).await?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<StagedFile, StorageError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        debug!("Staged {} bytes at {}", self.len, self.path.display());

        Ok(StagedFile {
            path: self.path,
            len: self.len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_staged_file_collects_chunks() {
        let mut writer = StagingWriter::create(None).unwrap();
        writer.write_chunk(b"hello ").await.unwrap();
        writer.write_chunk(b"world").await.unwrap();
        let staged = writer.finish().await.unwrap();

        assert_eq!(staged.len(), 11);
        let payload = Payload::Staged(staged);
        assert_eq!(payload.len(), 11);
        assert_eq!(payload.into_bytes().await.unwrap(), Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn test_staged_file_removed_on_drop() {
        let mut writer = StagingWriter::create(None).unwrap();
        writer.write_chunk(b"cv").await.unwrap();
        let staged = writer.finish().await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn test_buffered_payload_len() {
        let payload = Payload::Buffered(Bytes::from_static(b"abc"));
        assert_eq!(payload.len(), 3);
        assert!(!payload.is_empty());
        assert!(Payload::Buffered(Bytes::new()).is_empty());
    }
}
