//! Cloudinary media host client
//!
//! Talks to the signed upload API directly over reqwest. Buffered payloads
//! go out as a single multipart body; staged payloads are streamed from
//! their temp file.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{ObjectStore, ObjectUpload, Payload, ResourceKind, StorageError, StoredObject};
use crate::core::config::CloudinaryConfig;

const PROVIDER: &str = "cloudinary";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Cloudinary upload client
pub struct CloudinaryClient {
    config: CloudinaryConfig,
    http_client: Client,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Result<Self, StorageError> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| StorageError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Cloudinary client initialized for cloud: {}, folder: {}",
            config.cloud_name, config.folder
        );

        Ok(Self {
            config,
            http_client,
        })
    }

    /// `{api_base}/{cloud}/{kind}/{action}`
    fn endpoint(&self, kind: ResourceKind, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.api_base, self.config.cloud_name, kind, action
        )
    }

    /// SHA-256 request signature over the sorted, `&`-joined params followed by the secret
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        hex::encode(Sha256::digest(
            format!("{}{}", to_sign, self.config.api_secret).as_bytes(),
        ))
    }

    /// Signed params plus the unsigned credentials every call carries
    fn signed_params(&self, params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let signature = self.sign(&params);
        let mut all = params;
        all.push(("api_key", self.config.api_key.clone()));
        all.push(("signature", signature));
        all.push(("signature_algorithm", "sha256".to_string()));
        all
    }

    async fn file_part(
        payload: &Payload,
        content_type: &str,
        file_name: Option<&str>,
    ) -> Result<Part, StorageError> {
        let part = match payload {
            Payload::Buffered(bytes) => {
                Part::stream_with_length(Body::from(bytes.clone()), bytes.len() as u64)
            }
            Payload::Staged(staged) => {
                let file = staged.open().await?;
                Part::stream_with_length(Body::from(file), staged.len())
            }
        };

        part.file_name(file_name.unwrap_or("upload").to_string())
            .mime_str(content_type)
            .map_err(|e| StorageError::Request {
                provider: PROVIDER,
                message: format!("Invalid content type '{}': {}", content_type, e),
            })
    }

    /// Turn a non-2xx response into [`StorageError::Rejected`]
    async fn rejection(response: Response) -> StorageError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        StorageError::Rejected {
            provider: PROVIDER,
            status,
            message,
        }
    }
}

#[async_trait]
impl ObjectStore for CloudinaryClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn upload(&self, upload: ObjectUpload) -> Result<StoredObject, StorageError> {
        let ObjectUpload {
            payload,
            kind,
            content_type,
            file_name,
        } = upload;

        let params = self.signed_params(vec![
            ("folder", self.config.folder.clone()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ]);

        let mut form = Form::new();
        for (key, value) in params {
            form = form.text(key, value);
        }
        form = form.part(
            "file",
            Self::file_part(&payload, &content_type, file_name.as_deref()).await?,
        );

        let response = self
            .http_client
            .post(self.endpoint(kind, "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::Request {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: UploadResponse =
            response
                .json()
                .await
                .map_err(|e| StorageError::InvalidResponse {
                    provider: PROVIDER,
                    message: e.to_string(),
                })?;

        debug!(
            "Uploaded {} bytes to cloudinary as {} ({})",
            payload.len(),
            body.public_id,
            kind
        );

        Ok(StoredObject {
            url: body.secure_url,
            key: body.public_id,
            kind,
        })
    }

    async fn delete(&self, object: &StoredObject) -> Result<(), StorageError> {
        let params = self.signed_params(vec![
            ("public_id", object.key.clone()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ]);

        let response = self
            .http_client
            .post(self.endpoint(object.kind, "destroy"))
            .form(&params)
            .send()
            .await
            .map_err(|e| StorageError::Request {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: DestroyResponse =
            response
                .json()
                .await
                .map_err(|e| StorageError::InvalidResponse {
                    provider: PROVIDER,
                    message: e.to_string(),
                })?;

        // "not found" means there is nothing left to remove
        match body.result.as_str() {
            "ok" | "not found" => {
                debug!("Deleted cloudinary object {}", object.key);
                Ok(())
            }
            other => Err(StorageError::InvalidResponse {
                provider: PROVIDER,
                message: format!("destroy returned '{}'", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Multipart, Path, State};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response as AxumResponse};
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use bytes::Bytes;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use crate::modules::storage::StagingWriter;

    fn client_with(api_base: &str, cloud_name: &str) -> CloudinaryClient {
        CloudinaryClient::new(CloudinaryConfig {
            cloud_name: cloud_name.to_string(),
            api_key: "1234".to_string(),
            api_secret: "abcd".to_string(),
            api_base: api_base.to_string(),
            folder: "members".to_string(),
        })
        .unwrap()
    }

    fn client() -> CloudinaryClient {
        client_with("https://api.cloudinary.com/v1_1", "demo")
    }

    /// What the local upload API saw for one request
    #[derive(Debug, Clone, Default)]
    struct ReceivedUpload {
        kind: String,
        fields: HashMap<String, String>,
        file_name: Option<String>,
        content_type: Option<String>,
        file: Vec<u8>,
    }

    #[derive(Clone, Default)]
    struct UploadApi {
        uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
        destroyed: Arc<Mutex<Vec<HashMap<String, String>>>>,
    }

    /// Behaves per cloud name: `rejecting` answers 400, `garbled` answers non-JSON
    async fn upload_endpoint(
        State(api): State<UploadApi>,
        Path((cloud, kind)): Path<(String, String)>,
        mut multipart: Multipart,
    ) -> AxumResponse {
        let mut received = ReceivedUpload {
            kind: kind.clone(),
            ..Default::default()
        };
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                received.file_name = field.file_name().map(str::to_string);
                received.content_type = field.content_type().map(str::to_string);
                received.file = field.bytes().await.unwrap().to_vec();
            } else {
                received.fields.insert(name, field.text().await.unwrap());
            }
        }
        api.uploads.lock().unwrap().push(received);

        match cloud.as_str() {
            "rejecting" => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "message": "Invalid Signature" } })),
            )
                .into_response(),
            "garbled" => (StatusCode::OK, "<html>gateway</html>").into_response(),
            _ => Json(json!({
                "secure_url": format!(
                    "https://res.cloudinary.test/{}/{}/upload/members/abc123",
                    cloud, kind
                ),
                "public_id": "members/abc123",
            }))
            .into_response(),
        }
    }

    async fn destroy_endpoint(
        State(api): State<UploadApi>,
        Form(params): Form<HashMap<String, String>>,
    ) -> Json<Value> {
        let result = match params.get("public_id").map(String::as_str) {
            Some("members/gone") => "not found",
            Some("members/locked") => "error",
            _ => "ok",
        };
        api.destroyed.lock().unwrap().push(params);
        Json(json!({ "result": result }))
    }

    async fn spawn_upload_api() -> (String, UploadApi) {
        let api = UploadApi::default();
        let app = Router::new()
            .route("/v1_1/{cloud}/{kind}/upload", post(upload_endpoint))
            .route("/v1_1/{cloud}/{kind}/destroy", post(destroy_endpoint))
            .with_state(api.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/v1_1", addr), api)
    }

    fn buffered(
        data: &'static [u8],
        kind: ResourceKind,
        file_name: &str,
        mime: &str,
    ) -> ObjectUpload {
        ObjectUpload {
            payload: Payload::Buffered(Bytes::from_static(data)),
            kind,
            content_type: mime.to_string(),
            file_name: Some(file_name.to_string()),
        }
    }

    #[test]
    fn test_endpoint_includes_resource_kind() {
        let client = client();
        assert_eq!(
            client.endpoint(ResourceKind::Raw, "upload"),
            "https://api.cloudinary.com/v1_1/demo/raw/upload"
        );
        assert_eq!(
            client.endpoint(ResourceKind::Image, "destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }

    #[test]
    fn test_sign_sorts_params_and_appends_secret() {
        let client = client();
        let signature = client.sign(&[
            ("timestamp", "1315060510".to_string()),
            ("folder", "members".to_string()),
        ]);
        let expected = hex::encode(Sha256::digest(b"folder=members&timestamp=1315060510abcd"));
        assert_eq!(signature, expected);
    }

    #[test]
    fn test_signed_params_carry_credentials() {
        let client = client();
        let params = client.signed_params(vec![("timestamp", "1".to_string())]);
        let keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec!["timestamp", "api_key", "signature", "signature_algorithm"]
        );
        assert_eq!(params[1].1, "1234");
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url_and_public_id() {
        let (api_base, api) = spawn_upload_api().await;
        let client = client_with(&api_base, "demo");

        let stored = client
            .upload(buffered(
                b"%PDF-1.7 resume",
                ResourceKind::Raw,
                "resume.pdf",
                "application/pdf",
            ))
            .await
            .unwrap();

        assert_eq!(
            stored.url,
            "https://res.cloudinary.test/demo/raw/upload/members/abc123"
        );
        assert_eq!(stored.key, "members/abc123");
        assert_eq!(stored.kind, ResourceKind::Raw);

        let uploads = api.uploads.lock().unwrap().clone();
        assert_eq!(uploads.len(), 1);
        let received = &uploads[0];
        assert_eq!(received.kind, "raw");
        assert_eq!(received.file, b"%PDF-1.7 resume");
        assert_eq!(received.file_name.as_deref(), Some("resume.pdf"));
        assert_eq!(received.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(received.fields["folder"], "members");
        assert_eq!(received.fields["api_key"], "1234");
        assert_eq!(received.fields["signature_algorithm"], "sha256");

        let expected_signature = client.sign(&[
            ("folder", "members".to_string()),
            ("timestamp", received.fields["timestamp"].clone()),
        ]);
        assert_eq!(received.fields["signature"], expected_signature);
    }

    #[tokio::test]
    async fn test_staged_payload_is_streamed_intact() {
        let (api_base, api) = spawn_upload_api().await;
        let client = client_with(&api_base, "demo");

        let first: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let second = vec![0xAB; 100_000];
        let mut writer = StagingWriter::create(None).unwrap();
        writer.write_chunk(&first).await.unwrap();
        writer.write_chunk(&second).await.unwrap();
        let staged = writer.finish().await.unwrap();

        let stored = client
            .upload(ObjectUpload {
                payload: Payload::Staged(staged),
                kind: ResourceKind::Image,
                content_type: "image/png".to_string(),
                file_name: Some("photo.png".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(stored.kind, ResourceKind::Image);
        let uploads = api.uploads.lock().unwrap().clone();
        assert_eq!(uploads[0].kind, "image");
        assert_eq!(uploads[0].file, [first, second].concat());
    }

    #[tokio::test]
    async fn test_rejected_upload_carries_provider_message() {
        let (api_base, _api) = spawn_upload_api().await;
        let client = client_with(&api_base, "rejecting");

        let result = client
            .upload(buffered(b"png", ResourceKind::Image, "me.png", "image/png"))
            .await;

        match result {
            Err(StorageError::Rejected {
                provider,
                status,
                message,
            }) => {
                assert_eq!(provider, "cloudinary");
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_upload_response() {
        let (api_base, _api) = spawn_upload_api().await;
        let client = client_with(&api_base, "garbled");

        let result = client
            .upload(buffered(b"png", ResourceKind::Image, "me.png", "image/png"))
            .await;

        assert!(matches!(result, Err(StorageError::InvalidResponse { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_request_error() {
        let client = client_with("http://127.0.0.1:1/v1_1", "demo");

        let result = client
            .upload(buffered(b"png", ResourceKind::Image, "me.png", "image/png"))
            .await;

        assert!(matches!(result, Err(StorageError::Request { .. })));
    }

    #[tokio::test]
    async fn test_destroy_treats_not_found_as_removed() {
        let (api_base, api) = spawn_upload_api().await;
        let client = client_with(&api_base, "demo");
        let object = |key: &str| StoredObject {
            url: format!("https://res.cloudinary.test/{}", key),
            key: key.to_string(),
            kind: ResourceKind::Raw,
        };

        client.delete(&object("members/abc123")).await.unwrap();
        client.delete(&object("members/gone")).await.unwrap();
        assert!(matches!(
            client.delete(&object("members/locked")).await,
            Err(StorageError::InvalidResponse { .. })
        ));

        let destroyed = api.destroyed.lock().unwrap().clone();
        assert_eq!(destroyed.len(), 3);
        assert_eq!(destroyed[0]["public_id"], "members/abc123");
        assert_eq!(destroyed[0]["api_key"], "1234");
        assert_eq!(
            destroyed[0]["signature"],
            client.sign(&[
                ("public_id", "members/abc123".to_string()),
                ("timestamp", destroyed[0]["timestamp"].clone()),
            ])
        );
    }
}
