use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

/// Methods the browser clients may use
pub const CORS_ALLOWED_METHODS: [Method; 4] =
    [Method::GET, Method::POST, Method::PATCH, Method::OPTIONS];

/// Credentialed CORS for the configured origins
///
/// A `*` entry mirrors the request origin, since credentials rule out a literal wildcard.
pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let allowed_headers: [HeaderName; 2] = [header::CONTENT_TYPE, header::AUTHORIZATION];

    let cors = CorsLayer::new()
        .allow_methods(CORS_ALLOWED_METHODS.to_vec())
        .allow_headers(allowed_headers.to_vec())
        .allow_credentials(true);

    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(AllowOrigin::mirror_request())
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Answer every `OPTIONS` request with an empty 200
///
/// Sits inside the CORS layer, so real preflights still get their CORS headers.
pub async fn preflight_middleware(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(req).await
}

pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let auth_header = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok());

            if let Some(auth_header) = auth_header {
                if let Some(encoded) = auth_header.strip_prefix("Basic ") {
                    if let Ok(decoded) = BASE64_STANDARD.decode(encoded) {
                        if let Ok(creds) = String::from_utf8(decoded) {
                            if creds == *credentials {
                                return Ok(next.run(req).await);
                            }
                        }
                    }
                }
            }

            let mut response = Response::new(Body::from("Unauthorized"));
            *response.status_mut() = StatusCode::UNAUTHORIZED;
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"Swagger UI\""),
            );

            Err(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware::from_fn, routing::get, Router};
    use axum_test::TestServer;

    const FORM_ORIGIN: &str = "https://membershipform-omega.vercel.app";

    fn app() -> Router {
        Router::new()
            .route("/api/users", get(|| async { "[]" }))
            .layer(from_fn(preflight_middleware))
            .layer(cors_layer(vec![
                FORM_ORIGIN.to_string(),
                "https://dashboard-three-lilac-57.vercel.app".to_string(),
            ]))
    }

    #[tokio::test]
    async fn test_preflight_from_allowed_origin() {
        let server = TestServer::new(app()).unwrap();

        let response = server
            .method(Method::OPTIONS, "/api/users")
            .add_header(header::ORIGIN, HeaderValue::from_static(FORM_ORIGIN))
            .add_header(
                header::ACCESS_CONTROL_REQUEST_METHOD,
                HeaderValue::from_static("POST"),
            )
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            HeaderValue::from_static(FORM_ORIGIN)
        );
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            HeaderValue::from_static("true")
        );
        assert!(response.text().is_empty());
    }

    #[tokio::test]
    async fn test_bare_options_gets_empty_ok() {
        let server = TestServer::new(app()).unwrap();

        let response = server.method(Method::OPTIONS, "/api/users").await;

        response.assert_status_ok();
        assert!(response.text().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_origin_gets_no_allow_header() {
        let server = TestServer::new(app()).unwrap();

        let response = server
            .get("/api/users")
            .add_header(
                header::ORIGIN,
                HeaderValue::from_static("https://evil.example"),
            )
            .await;

        response.assert_status_ok();
        assert!(response
            .maybe_header(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
