//! Canonical values from arbitrarily shaped provider responses.
//!
//! Every lookup goes through one table of key paths per [`FieldKind`],
//! evaluated first-match-wins by [`extract_field`]. All functions here are
//! pure and total: a missing or mismatched shape yields `None`.

use serde_json::Value;

/// A key path into a JSON body, outermost key first.
pub type FieldPath = &'static [&'static str];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Finished video URL returned directly or during polling.
    AssetUrl,
    JobId,
    Status,
    /// Alternate URL fields consulted once a terminal-success status is seen.
    TerminalAssetUrl,
    ErrorDetail,
}

impl FieldKind {
    pub fn paths(self) -> &'static [FieldPath] {
        match self {
            FieldKind::AssetUrl => &[
                &["video_url"],
                &["data", "video_url"],
                &["result", "video_url"],
            ],
            FieldKind::JobId => &[
                &["video_id"],
                &["id"],
                &["job_id"],
                &["data", "video_id"],
                &["data", "id"],
                &["data", "job_id"],
            ],
            FieldKind::Status => &[
                &["status"],
                &["data", "status"],
                &["state"],
                &["data", "state"],
            ],
            FieldKind::TerminalAssetUrl => &[
                &["asset_url"],
                &["data", "asset_url"],
                &["download_url"],
                &["data", "download_url"],
                &["url"],
                &["data", "url"],
            ],
            FieldKind::ErrorDetail => &[
                &["error", "message"],
                &["data", "error", "message"],
                &["error"],
                &["data", "error"],
                &["message"],
                &["data", "message"],
                &["detail"],
                &["data", "detail"],
            ],
        }
    }
}

/// First non-empty string found along `paths`.
pub fn extract_field(body: &Value, paths: &[FieldPath]) -> Option<String> {
    find(body, paths, text)
}

/// Like [`extract_field`] over the paths of `kind`. Job ids also accept numbers.
pub fn extract(body: &Value, kind: FieldKind) -> Option<String> {
    match kind {
        FieldKind::JobId => find(body, kind.paths(), identifier),
        _ => extract_field(body, kind.paths()),
    }
}

fn find(body: &Value, paths: &[FieldPath], read: fn(&Value) -> Option<String>) -> Option<String> {
    paths.iter().find_map(|path| lookup(body, path).and_then(read))
}

fn lookup<'a>(body: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(body, |node, key| node.as_object()?.get(*key))
}

fn text(value: &Value) -> Option<String> {
    let trimmed = value.as_str()?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        other => text(other),
    }
}

/// How a provider status string should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Succeeded,
    Failed,
    Pending,
}

const SUCCESS_STATUSES: &[&str] = &["completed", "succeeded", "done", "ready", "success"];
const FAILURE_STATUSES: &[&str] = &[
    "failed", "failure", "error", "errored", "cancelled", "canceled", "rejected",
];

pub fn classify_status(status: &str) -> StatusClass {
    let status = status.trim().to_ascii_lowercase();
    if SUCCESS_STATUSES.contains(&status.as_str()) {
        StatusClass::Succeeded
    } else if FAILURE_STATUSES.contains(&status.as_str()) {
        StatusClass::Failed
    } else {
        StatusClass::Pending
    }
}

const MAX_RAW_DETAIL_CHARS: usize = 500;

/// Best-effort human-readable detail from an error response.
///
/// Falls back to the raw body text, truncated.
pub fn error_detail(body: Option<&Value>, raw: &str) -> String {
    if let Some(detail) = body.and_then(|b| extract(b, FieldKind::ErrorDetail)) {
        return detail;
    }
    let raw = raw.trim();
    if raw.is_empty() {
        return "empty response body".to_string();
    }
    if raw.chars().count() > MAX_RAW_DETAIL_CHARS {
        let truncated: String = raw.chars().take(MAX_RAW_DETAIL_CHARS).collect();
        format!("{truncated}...")
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_top_level_wins_over_wrapped() {
        let body = json!({ "video_url": "https://a/top.mp4", "data": { "video_url": "https://a/nested.mp4" } });
        assert_eq!(extract(&body, FieldKind::AssetUrl).as_deref(), Some("https://a/top.mp4"));
    }

    #[test]
    fn test_wrapped_fields_are_found() {
        let body = json!({ "data": { "video_url": "https://x/y.mp4" } });
        assert_eq!(extract(&body, FieldKind::AssetUrl).as_deref(), Some("https://x/y.mp4"));

        let body = json!({ "code": 100, "data": { "video_id": "abc123xyz" } });
        assert_eq!(extract(&body, FieldKind::JobId).as_deref(), Some("abc123xyz"));
        assert_eq!(extract(&body, FieldKind::AssetUrl), None);
    }

    #[test]
    fn test_job_id_aliases_in_order() {
        assert_eq!(extract(&json!({ "id": "j1" }), FieldKind::JobId).as_deref(), Some("j1"));
        assert_eq!(
            extract(&json!({ "id": "j1", "video_id": "v1" }), FieldKind::JobId).as_deref(),
            Some("v1")
        );
        assert_eq!(extract(&json!({ "id": 4217 }), FieldKind::JobId).as_deref(), Some("4217"));
    }

    #[test]
    fn test_numbers_only_count_as_job_ids() {
        let body = json!({ "video_url": 5, "video_id": 99, "error": 500, "message": "quota exceeded" });
        assert_eq!(extract(&body, FieldKind::AssetUrl), None);
        assert_eq!(extract(&body, FieldKind::JobId).as_deref(), Some("99"));
        assert_eq!(extract(&body, FieldKind::ErrorDetail).as_deref(), Some("quota exceeded"));
        assert_eq!(extract_field(&body, FieldKind::JobId.paths()), None);
    }

    #[test]
    fn test_mismatched_shapes_yield_none() {
        let bodies = [
            json!({}),
            json!(null),
            json!([1, 2, 3]),
            json!("completed"),
            json!({ "video_url": null }),
            json!({ "video_url": "" }),
            json!({ "video_url": { "href": "https://x" } }),
            json!({ "data": null }),
            json!({ "data": "video_url" }),
            json!({ "data": [{ "video_url": "https://x" }] }),
            json!({ "data": { "data": { "video_url": "https://too/deep.mp4" } } }),
            json!({ "video_url": 5, "status": 2, "url": 7.5 }),
        ];
        for body in &bodies {
            for kind in [
                FieldKind::AssetUrl,
                FieldKind::JobId,
                FieldKind::Status,
                FieldKind::TerminalAssetUrl,
            ] {
                assert_eq!(extract(body, kind), None, "{kind:?} in {body}");
            }
        }
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let body = json!({ "status": "processing", "data": { "asset_url": "https://x/z.mp4" } });
        let first = (extract(&body, FieldKind::Status), extract(&body, FieldKind::TerminalAssetUrl));
        let second = (extract(&body, FieldKind::Status), extract(&body, FieldKind::TerminalAssetUrl));
        assert_eq!(first, second);
    }

    #[test]
    fn test_status_classification() {
        for status in ["completed", "SUCCEEDED", " Done ", "ready", "success"] {
            assert_eq!(classify_status(status), StatusClass::Succeeded, "{status}");
        }
        for status in ["failed", "Error", "cancelled"] {
            assert_eq!(classify_status(status), StatusClass::Failed, "{status}");
        }
        for status in ["processing", "pending", "waiting", "queued", "something-new"] {
            assert_eq!(classify_status(status), StatusClass::Pending, "{status}");
        }
    }

    #[test]
    fn test_error_detail_preference() {
        let body = json!({ "error": { "code": "invalid_parameter", "message": "avatar not found" } });
        assert_eq!(error_detail(Some(&body), "ignored"), "avatar not found");

        let body = json!({ "error": "unauthorized" });
        assert_eq!(error_detail(Some(&body), "ignored"), "unauthorized");

        let body = json!({ "data": null, "message": "Too many requests" });
        assert_eq!(error_detail(Some(&body), "ignored"), "Too many requests");

        assert_eq!(error_detail(None, "  <html>Not Found</html> "), "<html>Not Found</html>");
        assert_eq!(error_detail(None, ""), "empty response body");

        let long = "x".repeat(600);
        let detail = error_detail(None, &long);
        assert_eq!(detail.len(), MAX_RAW_DETAIL_CHARS + 3);
        assert!(detail.ends_with("..."));
    }
}
