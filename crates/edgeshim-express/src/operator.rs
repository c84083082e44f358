use bytes::Bytes;
use serde_json::{Map, Value};

use edgeshim_core::http::StatusCode;

use crate::response::ResponseWriter;

/// Wraps a writer so every `json` call carries the configured operator name.
///
/// Only `json` is intercepted. `send` with an object goes straight to the inner writer.
pub struct OperatorJson<W> {
    inner: W,
    operator: String,
}

impl<W> OperatorJson<W>
where
    W: ResponseWriter,
{
    pub fn new(inner: W, operator: impl Into<String>) -> Self {
        Self {
            inner,
            operator: operator.into(),
        }
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Merge the operator into an object payload: `status` first when present, then `operator`,
/// then the payload's own keys, which override both. Non-object payloads are returned as-is.
pub fn inject_operator(value: Value, operator: &str) -> Value {
    let payload = match value {
        Value::Object(payload) => payload,
        other => return other,
    };

    let mut merged = Map::with_capacity(payload.len() + 1);
    if let Some(status) = payload.get("status") {
        merged.insert("status".to_string(), status.clone());
    }
    merged.insert("operator".to_string(), Value::String(operator.to_string()));
    for (key, value) in payload {
        merged.insert(key, value);
    }
    Value::Object(merged)
}

impl<W> ResponseWriter for OperatorJson<W>
where
    W: ResponseWriter,
{
    fn status(&mut self, code: StatusCode) -> &mut dyn ResponseWriter {
        self.inner.status(code);
        self
    }

    fn json(&mut self, value: Value) -> &mut dyn ResponseWriter {
        self.inner.json(inject_operator(value, &self.operator));
        self
    }

    fn send(&mut self, value: Value) -> &mut dyn ResponseWriter {
        self.inner.send(value);
        self
    }

    fn end(&mut self, data: Option<Bytes>) -> &mut dyn ResponseWriter {
        self.inner.end(data);
        self
    }

    fn set_header(&mut self, name: &str, value: &str) -> &mut dyn ResponseWriter {
        self.inner.set_header(name, value);
        self
    }

    fn write_head(
        &mut self,
        code: StatusCode,
        headers: &[(&str, &str)],
    ) -> &mut dyn ResponseWriter {
        self.inner.write_head(code, headers);
        self
    }

    fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    fn status_code(&self) -> StatusCode {
        self.inner.status_code()
    }
}
