use std::fmt;

use bytes::{Bytes, BytesMut};
use futures_util::stream::{LocalBoxStream, Stream, StreamExt};
use serde::Serialize;

/// HTTP body as seen by the shim: either a buffered payload or a chunk stream handed over by the
/// runtime. Streams use `LocalBoxStream` because worker runtimes are single-threaded `wasm32`.
pub enum Body {
    Once(Bytes),
    Stream(LocalBoxStream<'static, Result<Bytes, anyhow::Error>>),
}

impl Body {
    pub fn empty() -> Self {
        Self::Once(Bytes::new())
    }

    pub fn from_bytes<B>(bytes: B) -> Self
    where
        B: Into<Bytes>,
    {
        Self::Once(bytes.into())
    }

    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + 'static,
        anyhow::Error: From<E>,
    {
        Self::Stream(
            stream
                .map(|chunk| chunk.map_err(anyhow::Error::from))
                .boxed_local(),
        )
    }

    pub fn text<S>(text: S) -> Self
    where
        S: Into<String>,
    {
        Self::from_bytes(text.into().into_bytes())
    }

    pub fn json<T>(value: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize,
    {
        serde_json::to_vec(value).map(Self::from_bytes)
    }

    /// Buffered bytes, or `None` while the body is still a stream.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Once(bytes) => Some(bytes.as_ref()),
            Body::Stream(_) => None,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Body::Stream(_))
    }

    /// Drain the body into a single buffer. Buffered bodies are returned as-is.
    pub async fn collect(self) -> Result<Bytes, anyhow::Error> {
        match self {
            Body::Once(bytes) => Ok(bytes),
            Body::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Once(bytes) => f.debug_struct("Body::Once").field("len", &bytes.len()).finish(),
            Body::Stream(_) => f.debug_tuple("Body::Stream").finish(),
        }
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Once(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::from_bytes(value)
    }
}

impl From<&[u8]> for Body {
    fn from(value: &[u8]) -> Self {
        Body::from_bytes(Bytes::copy_from_slice(value))
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::text(value)
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::io;

    #[test]
    fn collect_concatenates_stream_chunks() {
        let body = Body::from_stream(futures_util::stream::iter(vec![
            Ok::<_, io::Error>(Bytes::from_static(b"a")),
            Ok(Bytes::from_static(b"b")),
        ]));
        assert!(body.is_stream());
        assert!(body.as_bytes().is_none());
        let collected = block_on(body.collect()).expect("collect");
        assert_eq!(collected.as_ref(), b"ab");
    }

    #[test]
    fn collect_surfaces_stream_errors() {
        let body = Body::from_stream(futures_util::stream::iter(vec![
            Ok(Bytes::from_static(b"ok")),
            Err(io::Error::other("boom")),
        ]));
        let err = block_on(body.collect()).expect_err("error");
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn buffered_body_exposes_bytes() {
        let body = Body::from("payload");
        assert_eq!(body.as_bytes(), Some(&b"payload"[..]));
        assert_eq!(block_on(body.collect()).expect("collect").as_ref(), b"payload");
    }

    #[test]
    fn json_body_serialises_value() {
        let body = Body::json(&serde_json::json!({"ok": true})).expect("json");
        assert_eq!(body.as_bytes(), Some(&br#"{"ok":true}"#[..]));
    }

    #[test]
    fn debug_formats_both_variants() {
        assert!(format!("{:?}", Body::from("x")).contains("Body::Once"));
        let stream = Body::from_stream(futures_util::stream::iter(vec![Ok::<_, io::Error>(
            Bytes::from_static(b"x"),
        )]));
        assert!(format!("{:?}", stream).contains("Body::Stream"));
    }
}
