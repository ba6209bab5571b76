use std::net::SocketAddr;

use axum::extract::connect_info::ConnectInfo;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use vitrina_core::{format_access_stamp, format_rfc3339, now_utc};

use crate::app::ServiceState;

/// Client address and write timestamps captured before the handler runs.
///
/// `created_at` is only set for POST and `updated_at` only for PUT; the
/// create and update handlers copy them into the record under construction.
#[derive(Debug, Clone)]
pub struct RequestStamp {
    pub ip_address: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

pub async fn annotate_request(mut request: Request, next: Next) -> Response {
    let ip_address = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| String::from("unknown"), |info| info.0.ip().to_string());
    let instant = format_rfc3339(now_utc()).unwrap_or_default();

    let stamp = RequestStamp {
        ip_address,
        created_at: (request.method() == Method::POST).then(|| instant.clone()),
        updated_at: (request.method() == Method::PUT).then(|| instant.clone()),
    };
    request.extensions_mut().insert(stamp);

    next.run(request).await
}

/// Appends one line per request to the access log without ever blocking or
/// failing the response; append errors only reach the operator console.
pub async fn access_log(
    State(state): State<ServiceState>,
    request: Request,
    next: Next,
) -> Response {
    let line = format_access_line(request.method(), request.uri(), request.headers());
    let path = state.access_log_path.clone();
    tokio::spawn(async move {
        if let Err(err) = append_line(&path, &line).await {
            tracing::error!(
                error = %err,
                path = %path.display(),
                "failed to append to the access log"
            );
        }
    });

    next.run(request).await
}

#[must_use]
pub fn format_access_line(method: &Method, uri: &Uri, headers: &HeaderMap) -> String {
    let timestamp = format_access_stamp(now_utc()).unwrap_or_default();
    let mut rendered = Map::new();
    for (name, value) in headers {
        let text = value.to_str().unwrap_or("<binary>").to_string();
        rendered.insert(name.as_str().to_string(), Value::String(text));
    }
    let headers_json = serde_json::to_string(&rendered).unwrap_or_else(|_| String::from("{}"));
    format!("{timestamp} [{method}] [{uri}] [{headers_json}]\n")
}

async fn append_line(path: &std::path::Path, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn must_ok<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => panic!("expected Ok(..), got error: {err}"),
        }
    }

    #[test]
    fn access_line_carries_method_path_and_headers_json() {
        let uri: Uri = must_ok("/api/v1/file/modelos?limit=1".parse());
        let mut headers = HeaderMap::new();
        headers.insert("host", must_ok("localhost:3000".parse()));

        let line = format_access_line(&Method::GET, &uri, &headers);

        assert!(line.contains(" [GET] "));
        assert!(line.contains("[/api/v1/file/modelos?limit=1]"));
        assert!(line.contains("{\"host\":\"localhost:3000\"}"));
        assert!(line.ends_with("]\n"));
    }

    #[test]
    fn access_line_timestamp_is_day_first() {
        let line = format_access_line(&Method::GET, &Uri::default(), &HeaderMap::new());
        // DD-MM-YYYY HH:mm:ss
        let stamp = &line[..19];
        let bytes = stamp.as_bytes();
        assert_eq!(bytes[2], b'-');
        assert_eq!(bytes[5], b'-');
        assert_eq!(bytes[10], b' ');
        assert_eq!(bytes[13], b':');
        assert_eq!(bytes[16], b':');
    }
}
