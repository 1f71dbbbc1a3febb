//! Rejection of over-limit requests.

use axum::body::Body;
use axum::response::Response;
use http::{header, HeaderValue, Request, StatusCode};

/// Body sent by the built-in rejection handler.
const LIMIT_MESSAGE: &str = "You have reached maximum request limit.";

/// Answers a request that exceeded its rate limit.
///
/// The handler consumes the request and builds the response returned to
/// the client; the wrapped service is never invoked for a denied request.
/// Closures of the shape `Fn(Request<Body>) -> Response` implement this
/// automatically.
pub trait RejectionHandler: Send + Sync {
    /// Build the response for the denied `req`.
    fn reject(&self, req: Request<Body>) -> Response;
}

impl<F> RejectionHandler for F
where
    F: Fn(Request<Body>) -> Response + Send + Sync,
{
    fn reject(&self, req: Request<Body>) -> Response {
        self(req)
    }
}

/// The built-in rejection handler: `429 Too Many Requests` with a short
/// plain text body.
#[derive(Debug, Clone, Copy, Default)]
pub struct TooManyRequests;

impl RejectionHandler for TooManyRequests {
    fn reject(&self, _req: Request<Body>) -> Response {
        let mut res = Response::new(Body::from(LIMIT_MESSAGE));
        *res.status_mut() = StatusCode::TOO_MANY_REQUESTS;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn request() -> Request<Body> {
        Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_default_rejection_response() {
        let res = TooManyRequests.reject(request());

        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            res.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );

        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), LIMIT_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn test_closures_act_as_handlers() {
        let teapot = |_req: Request<Body>| {
            let mut res = Response::new(Body::empty());
            *res.status_mut() = StatusCode::IM_A_TEAPOT;
            res
        };

        assert_eq!(teapot.reject(request()).status(), StatusCode::IM_A_TEAPOT);
    }
}
