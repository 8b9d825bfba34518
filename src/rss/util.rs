//! Utility functions for RSS feed processing.

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use tracing::debug;

use crate::TARGET_WEB_REQUEST;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static XML_ENCODING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*encoding\s*=\s*["']([A-Za-z0-9._-]+)["']"#)
        .expect("valid encoding regex")
});

/// Helper function to validate a URL
pub fn is_valid_url(url: &str) -> bool {
    if let Ok(parsed) = url::Url::parse(url) {
        parsed.scheme() == "http" || parsed.scheme() == "https"
    } else {
        false
    }
}

/// Parse a date string in various formats
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let date_str = date_str.trim();

    // Try RFC3339
    if let Ok(date) = DateTime::parse_from_rfc3339(date_str) {
        return Some(date.with_timezone(&Utc));
    }

    // Try RFC2822
    if let Ok(date) = DateTime::parse_from_rfc2822(date_str) {
        return Some(date.with_timezone(&Utc));
    }

    // Try ISO 8601 with a numeric offset
    if let Ok(date) = DateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(date.with_timezone(&Utc));
    }

    // Formats without an offset are taken as UTC
    for format in &["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(date_str, format) {
            return Some(date.and_utc());
        }
    }
    for format in &["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, format) {
            return date.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
        }
    }

    None
}

/// Clean up malformed XML
pub fn cleanup_xml(xml: &str) -> String {
    let mut cleaned = xml.trim().trim_start_matches('\u{FEFF}').to_string();

    // Remove any leading whitespace or invalid characters before <?xml or <rss
    if let Some(xml_start) = cleaned.find("<?xml") {
        cleaned = cleaned[xml_start..].to_string();
    } else if let Some(rss_start) = cleaned.find("<rss") {
        cleaned = cleaned[rss_start..].to_string();
    } else if let Some(feed_start) = cleaned.find("<feed") {
        cleaned = cleaned[feed_start..].to_string();
    }

    // Replace common problematic entities
    cleaned = cleaned
        .replace("&nbsp;", "&#160;")
        .replace("&ndash;", "&#8211;")
        .replace("&mdash;", "&#8212;")
        .replace("&rsquo;", "&#8217;")
        .replace("&lsquo;", "&#8216;")
        .replace("&rdquo;", "&#8221;")
        .replace("&ldquo;", "&#8220;")
        .replace("&hellip;", "&#8230;")
        .replace("&amp;amp;", "&amp;")
        .replace("&apos;", "&#39;");

    // Remove any invalid XML characters
    cleaned = cleaned
        .chars()
        .filter(|&c| {
            matches!(c,
                '\u{0009}' | // tab
                '\u{000A}' | // newline
                '\u{000D}' | // carriage return
                '\u{0020}'..='\u{D7FF}' |
                '\u{E000}'..='\u{FFFD}' |
                '\u{10000}'..='\u{10FFFF}'
            )
        })
        .collect();

    // Ensure proper XML declaration if missing
    if !cleaned.starts_with("<?xml") {
        cleaned = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", cleaned);
    }

    cleaned
}

/// Try gzip, zlib and deflate in turn.
///
/// Returns the decoded bytes and the method that worked, or the original
/// bytes and `None` when the body was not compressed.
pub fn try_decompressions(bytes: &[u8], rss_url: &str) -> (Vec<u8>, Option<&'static str>) {
    // Markup or JSON is already plain; raw deflate would happily mangle it.
    if matches!(
        bytes.iter().find(|b| !b.is_ascii_whitespace()),
        Some(b'<') | Some(b'{')
    ) || bytes.starts_with(&[0xEF, 0xBB, 0xBF])
    {
        return (bytes.to_vec(), None);
    }

    let mut decoded = Vec::new();
    if flate2::read::GzDecoder::new(bytes)
        .read_to_end(&mut decoded)
        .is_ok()
        && !decoded.is_empty()
    {
        debug!(target: TARGET_WEB_REQUEST, "Successfully decompressed with gzip from {}", rss_url);
        return (decoded, Some("gzip"));
    }

    let mut decoded = Vec::new();
    if flate2::read::ZlibDecoder::new(bytes)
        .read_to_end(&mut decoded)
        .is_ok()
        && !decoded.is_empty()
    {
        debug!(target: TARGET_WEB_REQUEST, "Successfully decompressed with zlib from {}", rss_url);
        return (decoded, Some("zlib"));
    }

    let mut decoded = Vec::new();
    if flate2::read::DeflateDecoder::new(bytes)
        .read_to_end(&mut decoded)
        .is_ok()
        && !decoded.is_empty()
    {
        debug!(target: TARGET_WEB_REQUEST, "Successfully decompressed with deflate from {}", rss_url);
        return (decoded, Some("deflate"));
    }

    debug!(target: TARGET_WEB_REQUEST, "No decompression method worked for {}, using original bytes", rss_url);
    (bytes.to_vec(), None)
}

/// Undo any transfer compression, honouring `Content-Encoding: br` first.
pub fn decompress_body(
    bytes: &[u8],
    content_encoding: Option<&str>,
    rss_url: &str,
) -> (Vec<u8>, Option<&'static str>) {
    if content_encoding == Some("br") {
        let mut decoded = Vec::new();
        let mut reader = brotli::Decompressor::new(bytes, 4096);
        if reader.read_to_end(&mut decoded).is_ok() && !decoded.is_empty() {
            debug!(target: TARGET_WEB_REQUEST, "Successfully decompressed brotli content from {}", rss_url);
            return (decoded, Some("brotli"));
        }
        debug!(target: TARGET_WEB_REQUEST, "Brotli decompression failed for {}, trying other methods", rss_url);
    }
    try_decompressions(bytes, rss_url)
}

/// The `charset=` parameter of a Content-Type header.
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(str::trim)
        .find(|part| part.to_lowercase().starts_with("charset="))
        .and_then(|part| part.split('=').nth(1))
        .map(|charset| charset.trim().trim_matches('"').to_string())
}

/// The encoding named in an `<?xml ... encoding="..."?>` declaration.
fn charset_from_xml_declaration(bytes: &[u8]) -> Option<String> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(200)]);
    XML_ENCODING_RE
        .captures(&head)
        .map(|caps| caps[1].to_string())
}

/// Decode a feed body into text.
///
/// UTF-8 is used when valid. Otherwise the charset comes from the
/// Content-Type header, then the XML declaration, then a windows-1252 or
/// Shift_JIS guess. Returns the text and the encoding used when it was not
/// UTF-8.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Result<(String, Option<String>)> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok((text.to_string(), None));
    }

    let declared = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_xml_declaration(bytes));

    if let Some(label) = declared {
        return match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => {
                let (decoded, _, _) = encoding.decode(bytes);
                Ok((decoded.into_owned(), Some(encoding.name().to_string())))
            }
            None => Err(anyhow!("Unsupported encoding: {}", label)),
        };
    }

    for encoding in [encoding_rs::WINDOWS_1252, encoding_rs::SHIFT_JIS] {
        let (decoded, _, had_errors) = encoding.decode(bytes);
        if !had_errors {
            return Ok((decoded.into_owned(), Some(encoding.name().to_string())));
        }
    }

    Err(anyhow!("Could not determine character encoding"))
}

/// Plain text from an HTML fragment: tags removed, common entities decoded,
/// whitespace collapsed.
pub fn strip_html(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&rsquo;", "\u{2019}")
        .replace("&lsquo;", "\u{2018}")
        .replace("&hellip;", "\u{2026}")
        .replace("&amp;", "&");
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

/// The first `max` characters of `text`, cut on a character boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("https://feeds.bbci.co.uk/news/rss.xml"));
        assert!(is_valid_url("http://example.com"));
        assert!(!is_valid_url("ftp://example.com/feed"));
        assert!(!is_valid_url("not a url"));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_date("2024-05-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_date("Wed, 01 May 2024 12:30:00 +0000"), Some(expected));
        assert_eq!(parse_date("2024-05-01 12:30:00"), Some(expected));
        assert_eq!(
            parse_date("2024-05-01"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_cleanup_xml() {
        let messy = "\u{FEFF}  junk<rss version=\"2.0\"><channel><title>A&nbsp;B</title></channel></rss>";
        let cleaned = cleanup_xml(messy);
        assert!(cleaned.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss"));
        assert!(cleaned.contains("A&#160;B"));
    }

    #[test]
    fn test_decompress_gzip_and_plain() {
        let body = b"<rss version=\"2.0\"></rss>";
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body).unwrap();
        let compressed = encoder.finish().unwrap();

        let (decoded, method) = decompress_body(&compressed, Some("gzip"), "test");
        assert_eq!(decoded, body);
        assert_eq!(method, Some("gzip"));

        let (plain, method) = decompress_body(body, None, "test");
        assert_eq!(plain, body);
        assert_eq!(method, None);
    }

    #[test]
    fn test_decode_body_charsets() {
        let (text, encoding) = decode_body("<rss>héllo</rss>".as_bytes(), None).unwrap();
        assert_eq!(text, "<rss>héllo</rss>");
        assert_eq!(encoding, None);

        let (euc_kr, _, _) = encoding_rs::EUC_KR.encode("<title>한국</title>");
        let (text, encoding) =
            decode_body(&euc_kr, Some("text/xml; charset=EUC-KR")).unwrap();
        assert_eq!(text, "<title>한국</title>");
        assert_eq!(encoding.as_deref(), Some("EUC-KR"));

        let mut declared = b"<?xml version=\"1.0\" encoding=\"euc-kr\"?>".to_vec();
        declared.extend_from_slice(&euc_kr);
        let (text, _) = decode_body(&declared, Some("text/xml")).unwrap();
        assert!(text.ends_with("<title>한국</title>"));

        assert!(decode_body(&euc_kr, Some("text/xml; charset=klingon")).is_err());
    }

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(
            charset_from_content_type("application/rss+xml; charset=\"ISO-8859-1\""),
            Some("ISO-8859-1".to_string())
        );
        assert_eq!(charset_from_content_type("text/xml"), None);
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Hello&nbsp;<b>world</b></p>\n<img src=\"x\"/> &amp; more"),
            "Hello world & more"
        );
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("한국어", 5), "한국어");
    }
}
