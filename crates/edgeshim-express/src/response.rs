use bytes::Bytes;
use serde_json::Value;

use edgeshim_core::body::Body;
use edgeshim_core::http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    HeaderMap, HeaderName, HeaderValue, Response, StatusCode,
};

const JSON_CONTENT_TYPE: &str = "application/json";
const HTML_CONTENT_TYPE: &str = "text/html";
const EMPTY_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Mutable Express-style response surface handed to route handlers. Every method returns the
/// writer so calls can be chained: `res.status(StatusCode::CREATED).json(value)`.
pub trait ResponseWriter {
    fn status(&mut self, code: StatusCode) -> &mut dyn ResponseWriter;

    /// Serialize `value` as the body with an `application/json` content type.
    fn json(&mut self, value: Value) -> &mut dyn ResponseWriter;

    /// Objects, arrays and `null` go out as JSON; anything else is sent as `text/html`.
    fn send(&mut self, value: Value) -> &mut dyn ResponseWriter;

    /// Finish the response, optionally with raw bytes and no content type.
    fn end(&mut self, data: Option<Bytes>) -> &mut dyn ResponseWriter;

    fn set_header(&mut self, name: &str, value: &str) -> &mut dyn ResponseWriter;

    /// Set the status and merge `headers` over the existing ones.
    fn write_head(&mut self, code: StatusCode, headers: &[(&str, &str)])
        -> &mut dyn ResponseWriter;

    fn is_finished(&self) -> bool;

    fn status_code(&self) -> StatusCode;

    fn send_text(&mut self, text: &str) -> &mut dyn ResponseWriter {
        self.send(Value::String(text.to_string()))
    }
}

/// Accumulates status, headers and body until the handler returns. The first terminal write
/// (`json`, `send` or `end`) wins; later ones are ignored.
#[derive(Debug)]
pub struct ResponseBuilder {
    body: Option<Bytes>,
    status: StatusCode,
    headers: HeaderMap,
    finished: bool,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self {
            body: None,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            finished: false,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    fn finish(&mut self, data: Option<Bytes>, content_type: Option<&'static str>) {
        if self.finished {
            log::debug!("response already finished; ignoring additional write");
            return;
        }
        if let Some(content_type) = content_type {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        self.body = data.filter(|bytes| !bytes.is_empty());
        self.finished = true;
    }

    fn insert_header(&mut self, name: &str, value: &str) {
        let name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(name) => name,
            Err(err) => {
                log::warn!("ignoring invalid response header name `{name}`: {err}");
                return;
            }
        };
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(err) => log::warn!("ignoring invalid value for response header `{name}`: {err}"),
        }
    }

    /// Materialize the accumulated state into exactly one native response.
    ///
    /// A handler that never wrote anything yields an empty plain-text response carrying only
    /// the status; headers set without a terminal write are not emitted.
    pub fn into_response(self) -> Response {
        match self.body {
            None if !self.finished => {
                let mut response = Response::new(Body::empty());
                *response.status_mut() = self.status;
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(EMPTY_CONTENT_TYPE));
                response
            }
            body => {
                let body = body.unwrap_or_default();
                let length = body.len();
                let mut response = Response::new(Body::from_bytes(body));
                *response.status_mut() = self.status;
                *response.headers_mut() = self.headers;
                response
                    .headers_mut()
                    .insert(CONTENT_LENGTH, HeaderValue::from(length));
                response
            }
        }
    }
}

impl ResponseWriter for ResponseBuilder {
    fn status(&mut self, code: StatusCode) -> &mut dyn ResponseWriter {
        self.status = code;
        self
    }

    fn json(&mut self, value: Value) -> &mut dyn ResponseWriter {
        match serde_json::to_vec(&value) {
            Ok(bytes) => self.finish(Some(Bytes::from(bytes)), Some(JSON_CONTENT_TYPE)),
            Err(err) => log::error!("failed to serialize JSON response: {err}"),
        }
        self
    }

    fn send(&mut self, value: Value) -> &mut dyn ResponseWriter {
        match value {
            structured @ (Value::Object(_) | Value::Array(_) | Value::Null) => self.json(structured),
            Value::String(text) => {
                self.finish(Some(Bytes::from(text)), Some(HTML_CONTENT_TYPE));
                self
            }
            other => {
                self.finish(Some(Bytes::from(other.to_string())), Some(HTML_CONTENT_TYPE));
                self
            }
        }
    }

    fn end(&mut self, data: Option<Bytes>) -> &mut dyn ResponseWriter {
        self.finish(data, None);
        self
    }

    fn set_header(&mut self, name: &str, value: &str) -> &mut dyn ResponseWriter {
        self.insert_header(name, value);
        self
    }

    fn write_head(
        &mut self,
        code: StatusCode,
        headers: &[(&str, &str)],
    ) -> &mut dyn ResponseWriter {
        self.status = code;
        for (name, value) in headers {
            self.insert_header(name, value);
        }
        self
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn status_code(&self) -> StatusCode {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body_of(response: &Response) -> &[u8] {
        response.body().as_bytes().expect("buffered body")
    }

    fn content_type(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    #[test]
    fn status_then_json_produces_json_response() {
        let mut builder = ResponseBuilder::new();
        builder
            .status(StatusCode::CREATED)
            .json(json!({ "id": 7 }));
        let response = builder.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(content_type(&response), Some("application/json"));
        let value: Value = serde_json::from_slice(body_of(&response)).expect("json");
        assert_eq!(value, json!({ "id": 7 }));
    }

    #[test]
    fn send_string_is_html() {
        let mut builder = ResponseBuilder::new();
        builder.send_text("<h1>hi</h1>");
        let response = builder.into_response();
        assert_eq!(content_type(&response), Some("text/html"));
        assert_eq!(body_of(&response), b"<h1>hi</h1>");
    }

    #[test]
    fn send_object_and_null_are_json() {
        let mut builder = ResponseBuilder::new();
        builder.send(json!({ "ok": true }));
        assert_eq!(content_type(&builder.into_response()), Some("application/json"));

        let mut builder = ResponseBuilder::new();
        builder.send(Value::Null);
        let response = builder.into_response();
        assert_eq!(content_type(&response), Some("application/json"));
        assert_eq!(body_of(&response), b"null");
    }

    #[test]
    fn send_number_is_stringified_html() {
        let mut builder = ResponseBuilder::new();
        builder.send(json!(42));
        let response = builder.into_response();
        assert_eq!(content_type(&response), Some("text/html"));
        assert_eq!(body_of(&response), b"42");
    }

    #[test]
    fn first_terminal_write_wins() {
        let mut builder = ResponseBuilder::new();
        builder.json(json!({ "first": 1 })).send_text("second");
        builder.end(Some(Bytes::from_static(b"third")));
        let response = builder.into_response();
        assert_eq!(content_type(&response), Some("application/json"));
        assert_eq!(body_of(&response), br#"{"first":1}"#);
    }

    #[test]
    fn untouched_builder_is_empty_200() {
        let response = ResponseBuilder::new().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_of(&response).is_empty());
        assert_eq!(content_type(&response), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn headers_without_terminal_write_are_not_emitted() {
        let mut builder = ResponseBuilder::new();
        builder
            .status(StatusCode::ACCEPTED)
            .set_header("x-trace", "abc");
        let response = builder.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(response.headers().get("x-trace").is_none());
    }

    #[test]
    fn end_without_data_keeps_headers() {
        let mut builder = ResponseBuilder::new();
        builder
            .status(StatusCode::NO_CONTENT)
            .set_header("x-trace", "abc")
            .end(None);
        let response = builder.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["x-trace"], "abc");
        assert!(body_of(&response).is_empty());
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn end_with_bytes_sets_no_content_type() {
        let mut builder = ResponseBuilder::new();
        builder
            .set_header("content-type", "image/png")
            .end(Some(Bytes::from_static(&[0x89, b'P', b'N', b'G'])));
        let response = builder.into_response();
        assert_eq!(content_type(&response), Some("image/png"));
        assert_eq!(body_of(&response), &[0x89, b'P', b'N', b'G']);
        assert_eq!(response.headers()[CONTENT_LENGTH], "4");
    }

    #[test]
    fn write_head_merges_headers() {
        let mut builder = ResponseBuilder::new();
        builder
            .set_header("x-one", "1")
            .set_header("x-two", "old")
            .write_head(StatusCode::MOVED_PERMANENTLY, &[("x-two", "new"), ("location", "/")]);
        builder.send_text("moved");
        let response = builder.into_response();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()["x-one"], "1");
        assert_eq!(response.headers()["x-two"], "new");
        assert_eq!(response.headers()["location"], "/");
    }

    #[test]
    fn invalid_header_names_are_ignored() {
        let mut builder = ResponseBuilder::new();
        builder.set_header("bad header", "x").set_header("x-ok", "bad\nvalue");
        assert!(builder.headers().is_empty());
        assert!(!builder.is_finished());
        assert_eq!(builder.status_code(), StatusCode::OK);
    }
}
