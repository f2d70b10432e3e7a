//! HTTP side: Turbo Stream responses and request extractors.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use turbo_core::{prefers_stream_format, Payload, STREAM_MIME_TYPE};

/// Header carrying the id of the `<turbo-frame>` that issued the request.
pub const TURBO_FRAME_HEADER: &str = "turbo-frame";

/// A `text/vnd.turbo-stream.html` response whose body is one or more instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurboStream(pub String);

impl TurboStream {
    pub fn new(payload: impl Into<Payload>) -> Self {
        Self(payload.into().into_body())
    }
}

impl From<Payload> for TurboStream {
    fn from(payload: Payload) -> Self {
        Self(payload.into_body())
    }
}

impl IntoResponse for TurboStream {
    fn into_response(self) -> Response {
        (
            [(CONTENT_TYPE, HeaderValue::from_static(STREAM_MIME_TYPE))],
            self.0,
        )
            .into_response()
    }
}

/// Whether the request prefers a Turbo Stream over a full page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcceptsTurboStream(pub bool);

impl<S: Send + Sync> FromRequestParts<S> for AcceptsTurboStream {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept = parts.headers.get(ACCEPT).and_then(|v| v.to_str().ok());
        Ok(Self(prefers_stream_format(accept)))
    }
}

/// The frame the client expects to be replaced, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurboFrame(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for TurboFrame {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let frame = parts
            .headers
            .get(TURBO_FRAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        Ok(Self(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;
    use turbo_core::stream;

    async fn body_string(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn stream_response_sets_media_type() {
        let resp = TurboStream::new(stream::update("<p>hi</p>", "greeting")).into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).unwrap(),
            "text/vnd.turbo-stream.html"
        );
        assert_eq!(
            body_string(resp).await,
            r#"<turbo-stream action="update" target="greeting"><template><p>hi</p></template></turbo-stream>"#
        );
    }

    #[tokio::test]
    async fn stream_body_is_literal_concatenation() {
        let parts = vec![
            stream::append("<li>1</li>", "list"),
            stream::prepend("<li>0</li>", "list"),
            stream::remove("gone"),
        ];
        let expected: String = parts.iter().map(|i| i.render()).collect();
        let resp = TurboStream::new(parts).into_response();
        assert_eq!(body_string(resp).await, expected);
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/negotiate",
                get(|AcceptsTurboStream(stream): AcceptsTurboStream| async move {
                    if stream { "stream" } else { "html" }
                }),
            )
            .route(
                "/frame",
                get(|TurboFrame(frame): TurboFrame| async move {
                    frame.unwrap_or_else(|| "none".into())
                }),
            )
    }

    async fn get_with(uri: &str, header: Option<(&str, &str)>) -> String {
        let mut req = Request::builder().uri(uri);
        if let Some((name, value)) = header {
            req = req.header(name, value);
        }
        let resp = app().oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        body_string(resp).await
    }

    #[tokio::test]
    async fn accepts_turbo_stream_extractor() {
        assert_eq!(
            get_with("/negotiate", Some(("accept", "text/vnd.turbo-stream.html"))).await,
            "stream"
        );
        assert_eq!(get_with("/negotiate", Some(("accept", "text/html"))).await, "html");
        assert_eq!(get_with("/negotiate", None).await, "html");
    }

    #[tokio::test]
    async fn turbo_frame_extractor() {
        assert_eq!(get_with("/frame", Some(("Turbo-Frame", "foo"))).await, "foo");
        assert_eq!(get_with("/frame", None).await, "none");
    }
}
