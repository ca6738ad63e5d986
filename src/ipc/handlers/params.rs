//! Small param-plumbing helpers shared by the handler modules.

use chrono::NaiveDate;

use crate::ipc::error::HandlerErr;
use crate::ipc::types::Request;

pub fn required_str(req: &Request, key: &str) -> Result<String, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Case-insensitive search term, normalized the way list filters expect it.
pub fn search_term(params: &serde_json::Value) -> Option<String> {
    optional_str(params, "search").map(|s| s.to_ascii_lowercase())
}

pub fn parse_date(raw: &str, key: &str) -> Result<NaiveDate, HandlerErr> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        HandlerErr::with_details(
            "bad_params",
            format!("{} must be a YYYY-MM-DD date", key),
            serde_json::json!({ "value": raw }),
        )
    })
}

/// Strings collected from an optional JSON array param.
pub fn string_list(params: &serde_json::Value, key: &str) -> Vec<String> {
    params
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
