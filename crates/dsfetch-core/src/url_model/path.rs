//! Filename extraction from a URL string.

/// Returns the final path segment of `url` with any `?query` or `#fragment` removed.
///
/// This is a plain string operation: the URL is not parsed or percent-decoded,
/// so the local name matches what other tools derive from the same URL.
/// Returns `None` when the segment is empty, `.` or `..`.
pub fn final_segment(url: &str) -> Option<&str> {
    let end = url.find(|c: char| c == '?' || c == '#').unwrap_or(url.len());
    let without_query = &url[..end];
    let segment = without_query.rsplit('/').next().unwrap_or(without_query);
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(segment)
}
