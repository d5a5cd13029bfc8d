use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Object id → URN used by the viewer and the Model Derivative API.
///
/// Uses the URL-safe alphabet without `=` padding so the URN can be placed
/// directly in a path segment.
pub fn urn_from_object_id(object_id: &str) -> String {
    URL_SAFE_NO_PAD.encode(object_id.as_bytes())
}
