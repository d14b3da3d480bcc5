//! Change-set response shape verification.
//!
//! A conforming service wraps each change-set sub-response as
//! `application/http` with `Content-Transfer-Encoding: binary`. The raw
//! batch response is normalized down to the four checked lines and compared
//! byte-for-byte against the canonical shape; headers outside the checked
//! set (Date, Content-Length, boundary tails) carry no structural meaning
//! and are dropped before the comparison.

/// Delimiter that introduces a change-set response section.
pub const CHANGESET_RESPONSE_DELIMITER: &str = "--changesetresponse";

/// Canonical normalized shape of a conforming change-set response.
pub const EXPECTED_SHAPE: &str = "Content-Type: application/http\n\
                                  Content-Transfer-Encoding: binary\n\
                                  Content-ID: 1\n\
                                  HTTP/1.1 204 No Content";

/// Line prefixes that participate in the shape comparison, in the order a
/// conforming response emits them.
const CHECKED_PREFIXES: [&str; 4] = [
    "Content-Type:",
    "Content-Transfer-Encoding:",
    "Content-ID:",
    "HTTP/1.1 ",
];

/// Result of comparing a batch response against the canonical shape.
#[derive(Debug, PartialEq, Eq)]
pub enum ShapeCheck {
    /// The change-set response matches the canonical shape.
    Match,
    /// The change-set response was found but differs from the canonical
    /// shape; `normalized` is the shape that was observed.
    Mismatch {
        /// Normalized text of the observed change-set response.
        normalized: String,
    },
    /// The response contains no change-set response delimiter at all.
    MissingDelimiter,
}

/// Locates the change-set response inside a raw batch response body and
/// compares its normalized shape against [`EXPECTED_SHAPE`].
#[must_use]
pub fn verify_shape(raw_batch_body: &str) -> ShapeCheck {
    let Some(index) = raw_batch_body.find(CHANGESET_RESPONSE_DELIMITER) else {
        return ShapeCheck::MissingDelimiter;
    };

    let normalized = normalize(&raw_batch_body[index..]);
    if normalized == EXPECTED_SHAPE {
        ShapeCheck::Match
    } else {
        ShapeCheck::Mismatch { normalized }
    }
}

/// Reduces a change-set response section to the checked lines.
///
/// Keeps, in order, only lines starting with one of the checked prefixes,
/// trimmed of trailing whitespace, and stops after the status line — inner
/// response headers behind the status line are not part of the shape.
/// Normalization is idempotent: its output contains only checked lines, so
/// running it twice yields the same text.
#[must_use]
pub fn normalize(section: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for line in section.lines() {
        let line = line.trim_end();
        if CHECKED_PREFIXES.iter().any(|p| line.starts_with(p)) {
            kept.push(line);
            if line.starts_with("HTTP/1.1 ") {
                break;
            }
        }
    }
    kept.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFORMING: &str = "--batchresponse_1234\r\n\
        Content-Type: multipart/mixed; boundary=changesetresponse_5678\r\n\
        \r\n\
        --changesetresponse_5678\r\n\
        Content-Type: application/http\r\n\
        Content-Transfer-Encoding: binary\r\n\
        Content-ID: 1\r\n\
        \r\n\
        HTTP/1.1 204 No Content\r\n\
        OData-Version: 4.0\r\n\
        \r\n\
        --changesetresponse_5678--\r\n\
        --batchresponse_1234--\r\n";

    #[test]
    fn conforming_response_matches() {
        assert_eq!(verify_shape(CONFORMING), ShapeCheck::Match);
    }

    #[test]
    fn unchecked_headers_do_not_affect_the_shape() {
        let with_noise = CONFORMING.replace(
            "Content-ID: 1\r\n",
            "Content-ID: 1\r\nDate: Thu, 26 Jun 2014 12:00:00 GMT\r\nContent-Length: 0\r\n",
        );
        assert_eq!(verify_shape(&with_noise), ShapeCheck::Match);
    }

    #[test]
    fn multipart_mixed_inner_part_is_a_mismatch() {
        let nonconforming = CONFORMING.replace(
            "Content-Type: application/http\r\nContent-Transfer-Encoding: binary\r\n",
            "Content-Type: multipart/mixed; boundary=inner_9\r\n",
        );
        let check = verify_shape(&nonconforming);
        assert!(
            matches!(&check, ShapeCheck::Mismatch { normalized }
                if normalized.starts_with("Content-Type: multipart/mixed")),
            "expected a mismatch carrying the observed shape, got {check:?}"
        );
    }

    #[test]
    fn missing_delimiter_is_its_own_outcome() {
        let body = "--batchresponse_1234\r\nContent-Type: application/http\r\n";
        assert_eq!(verify_shape(body), ShapeCheck::MissingDelimiter);
    }

    #[test]
    fn normalization_is_idempotent() {
        let index = CONFORMING.find(CHANGESET_RESPONSE_DELIMITER).unwrap_or(0);
        let once = normalize(&CONFORMING[index..]);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn trailing_inner_headers_are_ignored_after_the_status_line() {
        // OData-Version after the 204 must not leak into the shape.
        let index = CONFORMING.find(CHANGESET_RESPONSE_DELIMITER).unwrap_or(0);
        assert_eq!(normalize(&CONFORMING[index..]), EXPECTED_SHAPE);
    }
}
