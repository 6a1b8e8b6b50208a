//! Log redaction for headers that might carry secrets.

const MASK: &str = "***";

/// Whether `header_name` (case-insensitive) should never appear unmasked in
/// a log line: anything matching `authorization`, `token`, or `key`.
pub fn is_sensitive_header(header_name: &str) -> bool {
    let lower = header_name.to_ascii_lowercase();
    lower.contains("authorization") || lower.contains("token") || lower.contains("key")
}

/// Returns `value` unchanged unless `header_name` is sensitive, in which
/// case a fixed mask is returned instead.
pub fn masked_value<'a>(header_name: &str, value: &'a str) -> &'a str {
    if is_sensitive_header(header_name) { MASK } else { value }
}
