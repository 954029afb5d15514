//! MinIO/S3-compatible storage client
//!
//! Objects land under a publicly readable prefix so the returned URL can be
//! fetched directly. Object calls go through rust-s3; the bucket policy is a
//! hand-signed request since rust-s3 has no call for it.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::sigv4::{CanonicalRequest, Signer};
use super::{
    extension_for, ObjectStore, ObjectUpload, Payload, ResourceKind, StorageError, StoredObject,
};
use crate::core::config::MinIOConfig;

const PROVIDER: &str = "minio";

/// Key scheme and public addressing of member uploads
#[derive(Debug, Clone)]
struct ObjectLayout {
    public_endpoint: String,
    bucket: String,
    public_prefix: String,
}

impl ObjectLayout {
    /// `{public_prefix}/members/{kind}/{uuid}[.ext]`
    fn key_for(&self, kind: ResourceKind, extension: Option<&str>) -> String {
        let id = Uuid::new_v4();
        match extension {
            Some(ext) => format!("{}/members/{}/{}.{}", self.public_prefix, kind, id, ext),
            None => format!("{}/members/{}/{}", self.public_prefix, kind, id),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_endpoint.trim_end_matches('/'),
            self.bucket,
            key
        )
    }

    /// Anonymous `GetObject` on everything under the public prefix
    fn read_policy(&self) -> Value {
        json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": {"AWS": "*"},
                    "Action": ["s3:GetObject"],
                    "Resource": [format!("arn:aws:s3:::{}/{}/*", self.bucket, self.public_prefix)]
                }
            ]
        })
    }
}

/// rust-s3 is built without `fail-on-err`, so statuses are checked here
fn check_status(action: &str, key: &str, status: u16) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(StorageError::Rejected {
            provider: PROVIDER,
            status,
            message: format!("Failed to {} '{}'", action, key),
        })
    }
}

/// URL and `Host` header value for the `?policy` call on `bucket`
fn policy_target(endpoint: &str, bucket: &str) -> Result<(String, String), StorageError> {
    let endpoint = endpoint.trim_end_matches('/');
    let parsed = Url::parse(endpoint)
        .map_err(|e| StorageError::Config(format!("Invalid endpoint URL: {}", e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| StorageError::Config("Endpoint URL has no host".to_string()))?;
    let host = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    Ok((format!("{}/{}?policy", endpoint, bucket), host))
}

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    layout: ObjectLayout,
    endpoint: String,
    access_key: String,
    secret_key: String,
    region_name: String,
    /// For the signed bucket policy call
    http_client: Client,
}

impl MinIOClient {
    /// Connect, create the bucket if needed, and open the public prefix for reads
    pub async fn new(config: MinIOConfig) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| StorageError::Config(format!("Failed to create MinIO bucket: {}", e)))?;
        // http://endpoint/bucket/key rather than http://bucket.endpoint/key
        bucket.set_path_style();

        let http_client = Client::builder()
            .build()
            .map_err(|e| StorageError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let client = Self {
            bucket,
            region,
            credentials,
            layout: ObjectLayout {
                public_endpoint: config.public_endpoint,
                bucket: config.bucket,
                public_prefix: config.public_prefix,
            },
            endpoint: config.endpoint,
            access_key: config.access_key,
            secret_key: config.secret_key,
            region_name: config.region,
            http_client,
        };

        client.ensure_bucket().await;
        if let Err(e) = client.put_read_policy().await {
            // Uploads still work; only anonymous reads of the returned URLs are affected
            warn!(
                "Failed to set bucket policy for '{}': {}. Set it manually with: \
                mc anonymous set download <alias>/{}/{}",
                client.layout.bucket, e, client.layout.bucket, client.layout.public_prefix
            );
        }

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}, public_prefix: {}",
            client.endpoint, client.layout.bucket, client.layout.public_prefix
        );

        Ok(client)
    }

    /// Create the bucket; an existing one is fine
    async fn ensure_bucket(&self) {
        let created = Bucket::create_with_path_style(
            &self.layout.bucket,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match created {
            Ok(response) if response.success() => {
                info!("Bucket '{}' created", self.layout.bucket)
            }
            Ok(response)
                if response.response_text.contains("BucketAlreadyOwnedByYou")
                    || response.response_text.contains("BucketAlreadyExists") =>
            {
                debug!("Bucket '{}' already exists", self.layout.bucket)
            }
            Ok(response) => warn!(
                "Could not create bucket '{}' (status {}). Assuming it exists.",
                self.layout.bucket, response.response_code
            ),
            Err(e) => warn!(
                "Could not create bucket '{}': {}. Assuming it exists.",
                self.layout.bucket, e
            ),
        }
    }

    async fn put_read_policy(&self) -> Result<(), StorageError> {
        let policy = self.layout.read_policy().to_string();
        let (url, host) = policy_target(&self.endpoint, &self.layout.bucket)?;
        let path = format!("/{}", self.layout.bucket);

        let signer = Signer {
            access_key: &self.access_key,
            secret_key: &self.secret_key,
            region: &self.region_name,
            service: "s3",
        };
        let signed = signer.sign(
            &CanonicalRequest {
                method: "PUT",
                host: &host,
                path: &path,
                query: "policy=",
                body: policy.as_bytes(),
            },
            Utc::now(),
        )?;

        let response = self
            .http_client
            .put(&url)
            .header("Host", &host)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &signed.content_sha256)
            .header("Authorization", &signed.authorization)
            .header("Content-Type", "application/json")
            .body(policy)
            .send()
            .await
            .map_err(|e| StorageError::Request {
                provider: PROVIDER,
                message: format!("Failed to send policy request: {}", e),
            })?;

        check_status("set policy on", &self.layout.bucket, response.status().as_u16())?;
        info!(
            "Set public read policy for {}/{}/*",
            self.layout.bucket, self.layout.public_prefix
        );
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MinIOClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn upload(&self, upload: ObjectUpload) -> Result<StoredObject, StorageError> {
        let extension = extension_for(upload.file_name.as_deref(), &upload.content_type);
        let key = self.layout.key_for(upload.kind, extension.as_deref());

        let request_error = |e: s3::error::S3Error| StorageError::Request {
            provider: PROVIDER,
            message: format!("Failed to upload '{}': {}", key, e),
        };

        let status = match &upload.payload {
            Payload::Buffered(bytes) => self
                .bucket
                .put_object_with_content_type(&key, bytes, &upload.content_type)
                .await
                .map_err(request_error)?
                .status_code(),
            Payload::Staged(staged) => {
                let mut file = staged.open().await?;
                self.bucket
                    .put_object_stream_with_content_type(&mut file, &key, &upload.content_type)
                    .await
                    .map_err(request_error)?
                    .status_code()
            }
        };
        check_status("store", &key, status)?;

        debug!(
            "Uploaded {} bytes to '{}' in bucket '{}'",
            upload.payload.len(),
            key,
            self.layout.bucket
        );

        Ok(StoredObject {
            url: self.layout.public_url(&key),
            key,
            kind: upload.kind,
        })
    }

    async fn delete(&self, object: &StoredObject) -> Result<(), StorageError> {
        let response = self
            .bucket
            .delete_object(&object.key)
            .await
            .map_err(|e| StorageError::Request {
                provider: PROVIDER,
                message: format!("Failed to delete '{}': {}", object.key, e),
            })?;
        check_status("delete", &object.key, response.status_code())?;

        debug!("Deleted '{}' from bucket '{}'", object.key, self.layout.bucket);
        Ok(())
    }
}
