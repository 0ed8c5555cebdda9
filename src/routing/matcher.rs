//! Resource identifier extraction.
//!
//! # Responsibilities
//! - Locate the `{id}` segment of a route template
//! - Return the matching segment of a concrete request path
//!
//! # Design Decisions
//! - Segment-wise comparison, no regex
//! - Literal segments must match exactly; otherwise no id is returned

/// Returns the path segment bound to the template's `{...}` placeholder.
///
/// `None` when the template has no placeholder or the path does not fit it.
pub fn resource_id<'a>(template: &str, path: &'a str) -> Option<&'a str> {
    let template_segments: Vec<&str> = template.trim_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    if template_segments.len() != path_segments.len() {
        return None;
    }

    let mut id = None;
    for (expected, actual) in template_segments.iter().zip(&path_segments) {
        if expected.starts_with('{') && expected.ends_with('}') {
            if actual.is_empty() {
                return None;
            }
            id = Some(*actual);
        } else if expected != actual {
            return None;
        }
    }
    id
}
