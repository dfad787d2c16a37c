use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Other,
}

/// A decoded HTTP request, independent of the transport so the router can be
/// exercised in tests without sockets.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Non-empty path segments, e.g. `/reports/student/abc` -> ["reports", "student", "abc"].
    pub path: Vec<String>,
    pub query: HashMap<String, String>,
    /// Parsed JSON body; `Null` when the request carried none.
    pub body: serde_json::Value,
    /// Token from `Authorization: Bearer <token>`, if present.
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn segment(&self, idx: usize) -> Option<&str> {
        self.path.get(idx).map(String::as_str)
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        ApiResponse { status, body }
    }
}
