use std::net::SocketAddr;

use anyhow::Context as _;
use axum::body::Body as AxumBody;
use axum::extract::connect_info::ConnectInfo;
use axum::http::Request;
use http::header::CONTENT_TYPE;
use http::HeaderValue;

use edgeshim_core::body::Body;
use edgeshim_core::context::ClientAddr;
use edgeshim_core::http::Request as CoreRequest;

/// Convert an Axum/Hyper request into a core request.
///
/// JSON and form bodies are buffered up front; everything else stays a stream until a handler
/// drains it. The peer address moves from `ConnectInfo` into a [`ClientAddr`] extension.
pub async fn into_core_request(request: Request<AxumBody>) -> anyhow::Result<CoreRequest> {
    let (parts, body) = request.into_parts();

    let body = match parts.headers.get(CONTENT_TYPE) {
        Some(value) if is_buffered_content_type(value) => {
            let bytes = axum::body::to_bytes(body, usize::MAX)
                .await
                .context("failed to read request body")?;
            Body::from_bytes(bytes)
        }
        _ => Body::from_stream(body.into_data_stream()),
    };

    let mut core_request = CoreRequest::from_parts(parts, body);

    if let Some(remote_addr) = core_request
        .extensions_mut()
        .remove::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr)
    {
        core_request.extensions_mut().insert(ClientAddr(remote_addr));
    }

    Ok(core_request)
}

fn is_buffered_content_type(value: &HeaderValue) -> bool {
    let Ok(raw) = value.to_str() else {
        return false;
    };

    let media_type = raw.split(';').next().map(str::trim).unwrap_or("");
    media_type.eq_ignore_ascii_case("application/json")
        || media_type.eq_ignore_ascii_case("application/x-www-form-urlencoded")
        || media_type
            .rsplit_once('+')
            .is_some_and(|(ty, suffix)| {
                ty.to_ascii_lowercase().starts_with("application/")
                    && suffix.eq_ignore_ascii_case("json")
            })
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeshim_core::http::Method;

    #[tokio::test]
    async fn converts_request_and_records_connect_info() {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header("x-test", "1")
            .body(AxumBody::from("payload"))
            .expect("request");
        request
            .extensions_mut()
            .insert(ConnectInfo::<SocketAddr>("127.0.0.1:4000".parse().unwrap()));

        let core_request = into_core_request(request).await.expect("conversion");
        assert_eq!(core_request.method(), &Method::POST);
        assert_eq!(core_request.uri().path(), "/api/upload");
        assert_eq!(core_request.headers()["x-test"], "1");
        assert!(core_request.body().is_stream());

        let client = core_request.extensions().get::<ClientAddr>().expect("client");
        assert_eq!(client.0, "127.0.0.1:4000".parse::<SocketAddr>().unwrap());
        assert!(core_request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .is_none());
    }

    #[tokio::test]
    async fn json_and_form_bodies_are_buffered() {
        for (content_type, payload) in [
            ("application/json", r#"{"name":"test"}"#),
            ("application/x-www-form-urlencoded", "name=test"),
        ] {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/echo")
                .header("content-type", content_type)
                .body(AxumBody::from(payload))
                .expect("request");

            let core_request = into_core_request(request).await.expect("conversion");
            assert_eq!(core_request.body().as_bytes(), Some(payload.as_bytes()));
        }
    }

    #[tokio::test]
    async fn missing_connect_info_is_handled() {
        let request = Request::builder()
            .uri("/")
            .body(AxumBody::empty())
            .expect("request");
        let core_request = into_core_request(request).await.expect("conversion");
        assert!(core_request.extensions().get::<ClientAddr>().is_none());
    }

    #[test]
    fn buffered_content_types() {
        assert!(is_buffered_content_type(&HeaderValue::from_static(
            "application/json; charset=utf-8"
        )));
        assert!(is_buffered_content_type(&HeaderValue::from_static(
            "APPLICATION/VND.API+JSON"
        )));
        assert!(is_buffered_content_type(&HeaderValue::from_static(
            "application/x-www-form-urlencoded"
        )));
        assert!(!is_buffered_content_type(&HeaderValue::from_static(
            "text/json"
        )));
        assert!(!is_buffered_content_type(&HeaderValue::from_static(
            "multipart/form-data; boundary=x"
        )));
    }
}
