//! Multipart batch request body for the change-set probe.
//!
//! Renders the exact wire format of a `$batch` request holding one
//! change-set with one PATCH operation. Boundary tokens are fixed so the
//! request and its `Content-Type` header always agree; pairing of the open
//! and close markers is covered by unit tests, not by the service verdict.

/// Boundary of the outer batch envelope (also sent in `Content-Type`).
pub const BATCH_BOUNDARY: &str = "batch_36522ad7-fc75-4b56-8c71-56071383e77b";
/// Boundary of the single change-set inside the envelope.
pub const CHANGESET_BOUNDARY: &str = "changeset_77162fcd-b8da-41ac-a9f8-9357efbbd621";
/// `Content-ID` of the single operation inside the change-set.
pub const CONTENT_ID: &str = "1";

/// Renders the batch body for a single-operation change-set that PATCHes
/// `entity_id` with `update_document`.
///
/// `If-Match: *` is emitted exactly when the entity carries a concurrency
/// token. Lines use CRLF endings throughout, as multipart framing requires.
#[must_use]
pub fn build_update_batch(entity_id: &str, update_document: &str, has_etag: bool) -> String {
    let mut body = String::with_capacity(512 + update_document.len());

    body.push_str(&format!("--{BATCH_BOUNDARY}\r\n"));
    body.push_str(&format!(
        "Content-Type: multipart/mixed; boundary={CHANGESET_BOUNDARY}\r\n"
    ));
    body.push_str("\r\n");
    body.push_str(&format!("--{CHANGESET_BOUNDARY}\r\n"));
    body.push_str("Content-Type: application/http\r\n");
    body.push_str("Content-Transfer-Encoding: binary\r\n");
    body.push_str(&format!("Content-ID: {CONTENT_ID}\r\n"));
    body.push_str("\r\n");
    body.push_str(&format!("PATCH {entity_id} HTTP/1.1\r\n"));
    body.push_str("Content-Type: application/json\r\n");
    if has_etag {
        body.push_str("If-Match: *\r\n");
    }
    body.push_str("\r\n");
    body.push_str(update_document);
    body.push_str("\r\n");
    body.push_str(&format!("--{CHANGESET_BOUNDARY}--\r\n"));
    body.push_str("\r\n");
    body.push_str(&format!("--{BATCH_BOUNDARY}--\r\n"));

    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_occurrences(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn boundaries_open_and_close_in_matched_pairs() {
        let body = build_update_batch("http://host/svc/Products(1)", "{}", false);

        let batch_open = format!("--{BATCH_BOUNDARY}\r\n");
        let batch_close = format!("--{BATCH_BOUNDARY}--");
        let changeset_open = format!("--{CHANGESET_BOUNDARY}\r\n");
        let changeset_close = format!("--{CHANGESET_BOUNDARY}--");

        assert_eq!(count_occurrences(&body, &batch_open), 1);
        assert_eq!(count_occurrences(&body, &batch_close), 1);
        assert_eq!(count_occurrences(&body, &changeset_open), 1);
        assert_eq!(count_occurrences(&body, &changeset_close), 1);
        assert!(body.ends_with(&format!("--{BATCH_BOUNDARY}--\r\n")));
    }

    #[test]
    fn if_match_is_present_exactly_when_entity_has_etag() {
        let with = build_update_batch("id", "{}", true);
        let without = build_update_batch("id", "{}", false);
        assert!(with.contains("If-Match: *\r\n"));
        assert!(!without.contains("If-Match"));
    }

    #[test]
    fn request_line_uses_the_entity_id_verbatim() {
        let id = "http://host/svc/Products('a%20b')";
        let body = build_update_batch(id, "{\"Name\":\"x\"}", false);
        assert!(body.contains(&format!("PATCH {id} HTTP/1.1\r\n")));
    }

    #[test]
    fn inner_operation_headers_precede_the_request_line() {
        let body = build_update_batch("id", "{}", true);
        let inner = format!(
            "Content-Type: application/http\r\n\
             Content-Transfer-Encoding: binary\r\n\
             Content-ID: {CONTENT_ID}\r\n\
             \r\n\
             PATCH id HTTP/1.1\r\n"
        );
        assert!(body.contains(&inner));
    }

    #[test]
    fn update_document_follows_a_blank_line() {
        let body = build_update_batch("id", "{\"Name\":\"new\"}", false);
        assert!(body.contains("\r\n\r\n{\"Name\":\"new\"}\r\n"));
    }
}
