pub mod attendance;
pub mod directory;
pub mod reports;

use crate::error::{ApiError, ApiResult};
use crate::http::types::ApiRequest;
use chrono::NaiveDate;

pub(crate) fn parse_date(s: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("invalid date {:?}, expected YYYY-MM-DD", s)))
}

pub(crate) fn optional_date_param(req: &ApiRequest, key: &str) -> ApiResult<Option<NaiveDate>> {
    match req.query_param(key) {
        Some(raw) if !raw.is_empty() => Ok(Some(parse_date(raw)?)),
        _ => Ok(None),
    }
}

pub(crate) fn required_query_param<'a>(req: &'a ApiRequest, key: &str) -> ApiResult<&'a str> {
    req.query_param(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(format!("missing {}", key)))
}
