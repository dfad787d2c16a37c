use super::error::bad_json;
use super::router;
use super::types::{ApiRequest, ApiResponse, Method};
use rusqlite::Connection;
use std::collections::HashMap;
use std::io::Read;

/// Blocking accept loop. One request at a time against the single workspace
/// connection; SQLite's own transaction discipline is the only coordination
/// the ledger needs.
pub fn serve(server: &tiny_http::Server, conn: &Connection) -> anyhow::Result<()> {
    loop {
        let mut request = match server.recv() {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(error = %e, "listener recv failed");
                return Err(e.into());
            }
        };

        let response = match decode(&mut request) {
            Ok(api_req) => {
                let resp = router::dispatch(conn, &api_req);
                tracing::info!(
                    method = %request.method(),
                    url = %request.url(),
                    status = resp.status,
                    "request served"
                );
                resp
            }
            Err(message) => bad_json(message),
        };

        respond(request, response);
    }
}

fn decode(request: &mut tiny_http::Request) -> Result<ApiRequest, String> {
    let method = match request.method() {
        tiny_http::Method::Get => Method::Get,
        tiny_http::Method::Post => Method::Post,
        tiny_http::Method::Put => Method::Put,
        tiny_http::Method::Delete => Method::Delete,
        _ => Method::Other,
    };

    let url = request.url().to_string();
    let (path_part, query_part) = match url.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (url.as_str(), None),
    };
    let path: Vec<String> = path_part
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();

    let mut query = HashMap::new();
    if let Some(q) = query_part {
        for pair in q.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                query.insert(key.to_string(), value.to_string());
            }
        }
    }

    let bearer = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Authorization"))
        .map(|h| h.value.as_str().to_string())
        .and_then(|v| v.strip_prefix("Bearer ").map(|t| t.trim().to_string()));

    let mut raw_body = String::new();
    request
        .as_reader()
        .read_to_string(&mut raw_body)
        .map_err(|e| format!("failed to read body: {}", e))?;
    let body = if raw_body.trim().is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_str(&raw_body).map_err(|e| format!("invalid JSON body: {}", e))?
    };

    Ok(ApiRequest {
        method,
        path,
        query,
        body,
        bearer,
    })
}

fn respond(request: tiny_http::Request, response: ApiResponse) {
    let http_response = tiny_http::Response::from_string(response.body.to_string())
        .with_status_code(response.status)
        .with_header(
            tiny_http::Header::from_bytes("Content-Type", "application/json")
                .expect("static header"),
        );
    if let Err(e) = request.respond(http_response) {
        tracing::warn!(error = %e, "failed to write response");
    }
}
