use edgeshim_core::body::Body;
use edgeshim_core::error::ShimError;
use edgeshim_core::http::Response;
use futures_util::StreamExt;
use worker::{Error as WorkerError, Response as CfResponse};

/// Convert a core response into a Worker response, forwarding streams without buffering.
pub fn from_core_response(response: Response) -> Result<CfResponse, ShimError> {
    let (parts, body) = response.into_parts();

    let cf_response = match body {
        Body::Once(bytes) if bytes.is_empty() => CfResponse::empty().map_err(worker_error)?,
        Body::Once(bytes) => CfResponse::from_bytes(bytes.to_vec()).map_err(worker_error)?,
        Body::Stream(stream) => {
            let worker_stream = stream
                .map(|res| match res {
                    Ok(bytes) => Ok::<Vec<u8>, WorkerError>(bytes.to_vec()),
                    Err(err) => Err(WorkerError::RustError(err.to_string())),
                })
                .boxed_local();
            CfResponse::from_stream(worker_stream).map_err(worker_error)?
        }
    };

    let mut cf_response = cf_response.with_status(parts.status.as_u16());
    let headers = cf_response.headers_mut();
    for name in parts.headers.keys() {
        // The first value replaces any default; repeats such as `set-cookie` are appended.
        let mut replaced = false;
        for value in parts.headers.get_all(name) {
            let Ok(value) = value.to_str() else {
                log::warn!("dropping non-text response header {name}");
                continue;
            };
            if replaced {
                headers.append(name.as_str(), value).map_err(worker_error)?;
            } else {
                headers.set(name.as_str(), value).map_err(worker_error)?;
                replaced = true;
            }
        }
    }
    Ok(cf_response)
}

fn worker_error(err: WorkerError) -> ShimError {
    ShimError::internal(anyhow::anyhow!(err.to_string()))
}
