use std::collections::HashMap;
use std::convert::Infallible;

use bytes::Bytes;

use serde_json::{Map, Value};

use edgeshim_core::body::Body;
use edgeshim_core::context::{ClientAddr, RequestContext};
use edgeshim_core::http::{header::CONTENT_TYPE, HeaderMap, Method, Uri};

/// Express-shaped, read-only view of an incoming request.
#[derive(Clone, Debug)]
pub struct CompatRequest {
    query: HashMap<String, String>,
    body: Value,
    params: HashMap<String, String>,
    uri: Uri,
    url: String,
    method: Method,
    headers: HashMap<String, String>,
    protocol: String,
    original_url: String,
    ip: Option<String>,
}

impl CompatRequest {
    /// Search parameters; for duplicated keys the last occurrence wins.
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Parsed body. Always an empty mapping for `GET`/`HEAD` and for unparsable payloads.
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn body_field(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Headers keyed by lower-cased name.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// URL scheme without the trailing `:`.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Host and non-default port, derived from the URL on every call.
    pub fn host(&self) -> String {
        let Some(authority) = self.uri.authority() else {
            return String::new();
        };
        let host = authority.host();
        match authority.port_u16() {
            Some(port) if Some(port) != default_port(&self.protocol) => format!("{host}:{port}"),
            _ => host.to_string(),
        }
    }

    /// Client address: the first `x-forwarded-for` entry, then `cf-connecting-ip`, then the
    /// peer address recorded by the runtime.
    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    /// Path plus search string, e.g. `/api/search?q=rust`.
    pub fn original_url(&self) -> &str {
        &self.original_url
    }
}

/// Build the Express-style view for a routed request. Parse failures never escape: they
/// degrade to an empty body.
pub async fn adapt_request(ctx: RequestContext) -> CompatRequest {
    let (request, params) = ctx.into_parts();
    let (parts, body) = request.into_parts();

    let uri = absolute_uri(&parts.uri, &parts.headers);
    let protocol = uri.scheme_str().unwrap_or("http").to_string();
    let query = uri.query().map(parse_query).unwrap_or_default();
    let original_url = match uri.query() {
        Some(search) if !search.is_empty() => format!("{}?{}", uri.path(), search),
        _ => uri.path().to_string(),
    };
    let ip = client_ip(&parts.headers, parts.extensions.get::<ClientAddr>());
    let body = read_body(&parts.method, &parts.headers, body).await;

    CompatRequest {
        query,
        body,
        params: params.into_map(),
        url: uri.to_string(),
        method: parts.method,
        headers: flatten_headers(&parts.headers),
        protocol,
        original_url,
        ip,
        uri,
    }
}

fn default_port(protocol: &str) -> Option<u16> {
    match protocol {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        _ => None,
    }
}

/// Origin-form URIs (`/path?query`) are rebuilt against the `Host` header.
fn absolute_uri(uri: &Uri, headers: &HeaderMap) -> Uri {
    if uri.scheme().is_some() && uri.authority().is_some() {
        return uri.clone();
    }

    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
    let scheme = header("x-forwarded-proto")
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("http");
    let host = header("host").unwrap_or("localhost");
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    Uri::builder()
        .scheme(scheme)
        .authority(host)
        .path_and_query(path_and_query)
        .build()
        .unwrap_or_else(|_| uri.clone())
}

fn client_ip(headers: &HeaderMap, peer: Option<&ClientAddr>) -> Option<String> {
    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
    header("x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .or_else(|| header("cf-connecting-ip"))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|ClientAddr(addr)| addr.ip().to_string()))
}

fn parse_query(search: &str) -> HashMap<String, String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(search)
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flattened: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        flattened
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    flattened
}

async fn read_body(method: &Method, headers: &HeaderMap, body: Body) -> Value {
    if *method == Method::GET || *method == Method::HEAD {
        return empty_mapping();
    }

    let bytes = match body.collect().await {
        Ok(bytes) => bytes,
        Err(err) => {
            log::debug!("request body could not be read: {err}");
            return empty_mapping();
        }
    };

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let parsed = parse_form_body(content_type, bytes.clone())
        .await
        .map(Value::Object)
        .unwrap_or_else(empty_mapping);

    if is_empty_mapping(&parsed)
        && content_type
            .to_ascii_lowercase()
            .contains("application/json")
    {
        if let Some(json) = parse_json_body(&bytes) {
            return json;
        }
    }

    parsed
}

/// Generic body parse. Form-encoded and multipart payloads become a string mapping; any other
/// content type yields an empty mapping so JSON can be handled by the dedicated fallback.
/// Malformed form payloads yield `None`.
pub async fn parse_form_body(content_type: &str, bytes: Bytes) -> Option<Map<String, Value>> {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match media_type.as_str() {
        "application/x-www-form-urlencoded" => {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes).ok()?;
            Some(
                pairs
                    .into_iter()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect(),
            )
        }
        "multipart/form-data" => match parse_multipart(content_type, bytes).await {
            Ok(fields) => Some(fields),
            Err(err) => {
                log::debug!("multipart body could not be decoded: {err}");
                None
            }
        },
        _ => Some(Map::new()),
    }
}

/// Text fields of a multipart body, last duplicate winning. File parts are skipped.
async fn parse_multipart(content_type: &str, bytes: Bytes) -> multer::Result<Map<String, Value>> {
    let boundary = multer::parse_boundary(content_type)?;
    let stream = futures::stream::once(async move { Ok::<Bytes, Infallible>(bytes) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = Map::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if field.file_name().is_some() {
            log::debug!("skipping multipart file field `{name}`");
            continue;
        }
        let text = field.text().await?;
        fields.insert(name, Value::String(text));
    }
    Ok(fields)
}

pub fn parse_json_body(bytes: &[u8]) -> Option<Value> {
    serde_json::from_slice(bytes).ok()
}

fn empty_mapping() -> Value {
    Value::Object(Map::new())
}

fn is_empty_mapping(value: &Value) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}
