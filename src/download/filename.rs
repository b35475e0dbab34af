//! Filename extraction and sanitization for downloads and job folders.
//!
//! This module derives safe filenames from `Content-Disposition` headers and
//! URLs, and sanitizes path segments built from catalog metadata.

use std::path::{Component, Path};

use tracing::debug;
use url::Url;

/// Name used when neither the header nor the URL yields anything.
const FALLBACK_FILENAME: &str = "download";

/// Resolves the local filename for a response.
///
/// Resolution order:
/// 1. `filename*=` (RFC 5987, decoded with its declared charset)
/// 2. `filename=` (quoted or bare, taken verbatim)
/// 3. last non-empty path segment of `final_url`
/// 4. host of `final_url`, then a fixed fallback
///
/// The result is always sanitized and never empty.
#[must_use]
pub fn resolve_filename(content_disposition: Option<&str>, final_url: &Url) -> String {
    let name = content_disposition
        .and_then(parse_content_disposition)
        .filter(|name| !name.is_empty())
        .or_else(|| filename_from_url(final_url))
        .or_else(|| final_url.host_str().map(str::to_string))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
    sanitize_path_segment(&name)
}

/// Parses Content-Disposition header to extract filename.
///
/// Handles:
/// - `attachment; filename="example.pdf"`
/// - `attachment; filename=example.pdf`
/// - `attachment; filename*=UTF-8''example%20file.pdf` (RFC 5987)
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    // Try filename*= first (RFC 5987 encoded)
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + 10..].trim_start();
        let end = value.find(';').unwrap_or(value.len());
        if let Some(decoded) = decode_extended_value(value[..end].trim()) {
            return Some(decoded);
        }
    }

    // Regular filename=, verbatim
    let pos = header.find("filename=")?;
    let value = header[pos + 9..].trim();
    if let Some(stripped) = value.strip_prefix('"') {
        let end = stripped.find('"').unwrap_or(stripped.len());
        let filename = &stripped[..end];
        return (!filename.is_empty()).then(|| filename.to_string());
    }
    let end = value.find(';').unwrap_or(value.len());
    let filename = value[..end].trim();
    (!filename.is_empty()).then(|| filename.to_string())
}

/// Decodes an RFC 5987 `charset'language'percent-encoded` value.
fn decode_extended_value(value: &str) -> Option<String> {
    let mut parts = value.trim_matches('"').splitn(3, '\'');
    let charset = parts.next()?.trim();
    let _language = parts.next()?;
    let encoded = parts.next()?;
    if charset.is_empty() || encoded.is_empty() {
        return None;
    }

    let bytes = urlencoding::decode_binary(encoded.as_bytes());
    let decoded = match charset.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => String::from_utf8(bytes.into_owned()).ok()?,
        // Latin-1 code points map one-to-one onto the first 256 chars.
        "iso-8859-1" | "latin1" | "latin-1" => bytes.iter().map(|&b| char::from(b)).collect(),
        other => {
            debug!(charset = other, "unknown filename* charset, decoding lossily");
            String::from_utf8_lossy(&bytes).into_owned()
        }
    };
    (!decoded.is_empty()).then_some(decoded)
}

fn filename_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last).map_or_else(
        |e| {
            debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
            last.to_string()
        },
        std::borrow::Cow::into_owned,
    );
    Some(decoded)
}

/// Replaces characters that are invalid on common filesystems with `_`.
///
/// Covers `/ \ : * ? " < > |` and control characters. The output has
/// exactly as many characters as the input.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Sanitizes `name` for use as a single path component.
///
/// On top of [`sanitize_filename`], empty names and pure dot segments
/// (`.`, `..`) are rewritten so the component can never climb out of the
/// directory it is joined onto.
#[must_use]
pub fn sanitize_path_segment(name: &str) -> String {
    let sanitized = sanitize_filename(name);
    if sanitized.is_empty() {
        return "_".to_string();
    }
    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_sanitize_filename_removes_invalid_chars() {
        assert_eq!(sanitize_filename("file/name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file\\name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file:name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file*name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file?name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file\"name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file<name>.pdf"), "file_name_.pdf");
        assert_eq!(sanitize_filename("file|name.pdf"), "file_name.pdf");
    }

    #[test]
    fn test_sanitize_filename_preserves_length() {
        let inputs = [
            "a/b:c*d?e\"f<g>h|i",
            "////",
            "réseau: bus & tram?.zip",
            "日本語/路線.gtfs",
        ];
        for input in inputs {
            let output = sanitize_filename(input);
            assert_eq!(output.chars().count(), input.chars().count(), "input: {input}");
            assert!(
                !output.contains(['/', ':', '*', '?', '"', '<', '>', '|']),
                "unsafe char left in {output}"
            );
        }
    }

    #[test]
    fn test_sanitize_filename_preserves_valid_chars() {
        assert_eq!(sanitize_filename("valid-file_name.pdf"), "valid-file_name.pdf");
        assert_eq!(sanitize_filename("file (1).pdf"), "file (1).pdf");
        assert_eq!(sanitize_filename("Réseau urbain.zip"), "Réseau urbain.zip");
    }

    #[test]
    fn test_sanitize_path_segment_rewrites_dot_segments() {
        assert_eq!(sanitize_path_segment("."), "_");
        assert_eq!(sanitize_path_segment(".."), "__");
        assert_eq!(sanitize_path_segment(""), "_");
        assert_eq!(sanitize_path_segment("../etc"), ".._etc");
    }

    #[test]
    fn test_parse_content_disposition_quoted() {
        let header = r#"attachment; filename="example.pdf""#;
        assert_eq!(parse_content_disposition(header), Some("example.pdf".to_string()));
    }

    #[test]
    fn test_parse_content_disposition_unquoted() {
        let header = "attachment; filename=example.pdf";
        assert_eq!(parse_content_disposition(header), Some("example.pdf".to_string()));
    }

    #[test]
    fn test_parse_content_disposition_with_semicolon() {
        let header = r#"attachment; filename="example.pdf"; size=1234"#;
        assert_eq!(parse_content_disposition(header), Some("example.pdf".to_string()));
    }

    #[test]
    fn test_parse_content_disposition_plain_value_is_not_decoded() {
        let header = r#"attachment; filename="x%20y.zip""#;
        assert_eq!(parse_content_disposition(header), Some("x%20y.zip".to_string()));
    }

    #[test]
    fn test_parse_content_disposition_rfc5987() {
        let header = "attachment; filename*=UTF-8''x%20y.zip";
        assert_eq!(parse_content_disposition(header), Some("x y.zip".to_string()));
    }

    #[test]
    fn test_parse_content_disposition_rfc5987_with_language() {
        let header = "attachment; filename*=UTF-8'fr'r%C3%A9seau.zip";
        assert_eq!(parse_content_disposition(header), Some("réseau.zip".to_string()));
    }

    #[test]
    fn test_parse_content_disposition_rfc5987_latin1() {
        let header = "attachment; filename*=ISO-8859-1''r%E9seau.zip";
        assert_eq!(parse_content_disposition(header), Some("réseau.zip".to_string()));
    }

    #[test]
    fn test_parse_content_disposition_prefers_extended_over_plain() {
        let header = r#"attachment; filename="fallback.zip"; filename*=UTF-8''real%20name.zip"#;
        assert_eq!(parse_content_disposition(header), Some("real name.zip".to_string()));
    }

    #[test]
    fn test_parse_content_disposition_bad_extended_falls_back_to_plain() {
        let header = r#"attachment; filename*=garbage; filename="plain.zip""#;
        assert_eq!(parse_content_disposition(header), Some("plain.zip".to_string()));
    }

    #[test]
    fn test_parse_content_disposition_missing() {
        assert_eq!(parse_content_disposition("attachment"), None);
        assert_eq!(parse_content_disposition(r#"attachment; filename="""#), None);
    }

    #[test]
    fn test_resolve_filename_decodes_and_sanitizes_extended_value() {
        let name = resolve_filename(
            Some("attachment; filename*=UTF-8''a%2Fb%20c.zip"),
            &url("https://files.example/download"),
        );
        assert_eq!(name, "a_b c.zip");
    }

    #[test]
    fn test_resolve_filename_uses_url_segment_without_header() {
        let name = resolve_filename(None, &url("https://files.example/gtfs/lines%20A.zip?v=2"));
        assert_eq!(name, "lines A.zip");
    }

    #[test]
    fn test_resolve_filename_header_without_filename_uses_url() {
        let name = resolve_filename(Some("inline"), &url("https://files.example/stops.csv"));
        assert_eq!(name, "stops.csv");
    }

    #[test]
    fn test_resolve_filename_trailing_slash_falls_back_to_host() {
        let name = resolve_filename(None, &url("https://files.example/feeds/"));
        assert_eq!(name, "files.example");
    }

    #[test]
    fn test_resolve_filename_sanitizes_url_segment() {
        let name = resolve_filename(None, &url("https://files.example/a%3Ab.zip"));
        assert_eq!(name, "a_b.zip");
    }
}
