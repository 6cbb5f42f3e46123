//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it. The emitter takes it
//! from there: status line, header fields, then the body in bounded chunks.

use std::fmt;

use bytes::Bytes;
use http::StatusCode;

use crate::body::{Body, BytesBody};
use crate::headers::Headers;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
#[derive(Clone, Copy, Debug)]
pub enum ContentType {
    Csv,          // text/csv
    EventStream,  // text/event-stream  (SSE)
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream  (binary / file download)
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::EventStream => "text/event-stream",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use spout::{Response, StatusCode};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status, headers, or a streaming body)
///
/// ```rust
/// use spout::{ContentType, ReaderBody, Response, StatusCode};
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
///
/// Response::builder()
///     .header("content-type", ContentType::OctetStream.as_str())
///     .body(ReaderBody::new(std::io::empty()));
/// ```
pub struct Response {
    version: String,
    status: StatusCode,
    reason: Option<String>,
    headers: Headers,
    body: Box<dyn Body>,
}

impl Response {
    /// `200 OK` with `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` with `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self::builder().status(code).no_body()
    }

    /// Builder for responses that need a custom status, extra headers, or a
    /// non-buffered body.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder {
            version: "1.1".to_owned(),
            status: StatusCode::OK,
            reason: None,
            headers: Headers::new(),
        }
    }

    /// Protocol version without the `HTTP/` prefix, e.g. `"1.1"`.
    pub fn protocol_version(&self) -> &str {
        &self.version
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// The custom reason phrase, or the canonical one for the status code.
    pub fn reason_phrase(&self) -> &str {
        self.reason.as_deref()
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("")
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Comma-joined values of `name`, empty when absent.
    pub fn header_line(&self, name: &str) -> String {
        self.headers.line(name)
    }

    pub fn body(&self) -> &dyn Body {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> &mut dyn Body {
        self.body.as_mut()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("version", &self.version)
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("headers", &self.headers)
            .field("body_size", &self.body.size())
            .finish()
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `HTTP/1.1 200 OK`.
/// Terminated by a body method, so the body is always chosen explicitly.
#[derive(Debug)]
pub struct ResponseBuilder {
    version: String,
    status: StatusCode,
    reason: Option<String>,
    headers: Headers,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Overrides the canonical reason phrase of the status line.
    pub fn reason(mut self, phrase: impl Into<String>) -> Self {
        self.reason = Some(phrase.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Appends a header value. Repeated names accumulate.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.finish(ContentType::Json, body.into())
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(ContentType::Text, Bytes::from(body.into()))
    }

    /// Terminate with a typed in-memory body.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(content_type, body.into())
    }

    /// Terminate with any [`Body`] implementation. No content type is added.
    pub fn body(self, body: impl Body + 'static) -> Response {
        Response {
            version: self.version,
            status: self.status,
            reason: self.reason,
            headers: self.headers,
            body: Box::new(body),
        }
    }

    /// Terminate with no body (e.g. `204 No Content`, redirects).
    pub fn no_body(self) -> Response {
        self.body(BytesBody::empty())
    }

    fn finish(mut self, content_type: ContentType, body: Bytes) -> Response {
        if !self.headers.contains("content-type") {
            self.headers.insert("Content-Type", content_type.as_str());
        }
        self.body(BytesBody::new(body))
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`StatusCode`] directly from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}
