//! Multipart bodies returned by batched content retrieval

use crate::error::SyncError;

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Extract the `boundary` parameter of a multipart content type.
pub fn boundary(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// Split a multipart body into the bodies of its parts, in order.
pub fn parse_parts(body: &[u8], boundary: &str) -> Result<Vec<Vec<u8>>, SyncError> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let positions = find_delimiters(body, &delimiter);
    if positions.is_empty() {
        return Err(SyncError::Protocol(
            "multipart body contains no boundary".to_string(),
        ));
    }

    let mut parts = Vec::with_capacity(positions.len().saturating_sub(1));
    for window in positions.windows(2) {
        let segment = &body[window[0] + delimiter.len()..window[1]];
        if segment.starts_with(b"--") {
            break;
        }
        let header_end = find(segment, HEADER_END).ok_or_else(|| {
            SyncError::Protocol("multipart part has no header terminator".to_string())
        })?;
        let content = &segment[header_end + HEADER_END.len()..];
        let content = content.strip_suffix(CRLF).unwrap_or(content);
        parts.push(content.to_vec());
    }

    let last = positions[positions.len() - 1];
    if !body[last + delimiter.len()..].starts_with(b"--") {
        return Err(SyncError::Protocol(
            "multipart body is not terminated".to_string(),
        ));
    }
    Ok(parts)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Positions of `delimiter` lines: at the start of the body or right after a
/// CRLF, and followed by CRLF, the closing `--`, or transport padding.
fn find_delimiters(body: &[u8], delimiter: &[u8]) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut offset = 0;
    while let Some(found) = find(&body[offset..], delimiter) {
        let start = offset + found;
        let rest = &body[start + delimiter.len()..];
        let line_start = start == 0 || body[..start].ends_with(CRLF);
        let line_end = rest.is_empty()
            || rest.starts_with(CRLF)
            || rest.starts_with(b"--")
            || rest.starts_with(b" ")
            || rest.starts_with(b"\t");
        if line_start && line_end {
            positions.push(start);
        }
        offset = start + delimiter.len();
    }
    positions
}
